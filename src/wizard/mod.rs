// ABOUTME: The wizard engine core - controller, session aggregate, step registry

mod controller;
mod session;
mod step;


pub use controller::{SubmitBlocked, SubmitOutcome, Transition, WizardController};
pub use session::{DraftRecord, WizardPhase, WizardSession};
pub use step::{
    ErrorMap, FormData, RegistryError, StepDescriptor, StepKind, StepRegistry, Validator,
};

// ABOUTME: Wizard controller - orchestrates step transitions over one session
// Sync navigation/validation operations; async edges only for generate and submit

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::session::{WizardPhase, WizardSession};
use super::step::{ErrorMap, FormData, StepDescriptor, StepKind, StepRegistry};
use crate::assist::{AssistAdapter, AssistOutcome, GenerationBackend, GenerationContext};
use crate::backend::{ListingBackend, SubmitError, SubmitReceipt};
use crate::branding::{self, BrandingProfile};
use crate::config::EngineConfig;
use crate::draft::{DraftError, DraftStore, DraftWriter};

/// Outcome of a `go_next` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Validation passed and the wizard moved to step `to`
    Advanced { to: usize },
    /// Validation failed; `errors` holds the messages, the index is unchanged
    Blocked,
    /// Validation passed on the last step; submit may now be called
    ReadyToSubmit,
}

/// Why `begin_submit` refused to hand out a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlocked {
    /// A submission is already in flight; this gesture is dropped
    InFlight,
    /// The last step has not passed validation yet
    NotReady,
}

/// Outcome of a full `submit` round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The backend accepted the listing; the draft has been cleared
    Submitted { listing_id: String },
    /// The backend refused; `errors` and/or the submit banner are populated
    Failed,
    /// Dropped duplicate gesture: a submission was already in flight
    InFlight,
    /// The review step has not signalled ready-to-submit
    NotReady,
}

/// Orchestrates one wizard flow: owns the session aggregate, consults the
/// step registry, derives branding, and drives draft persistence.
///
/// Navigation and editing are synchronous; only `submit` (and generation via
/// the [`AssistAdapter`] handle) suspend.
pub struct WizardController {
    session: WizardSession,
    registry: StepRegistry,
    branding: Option<BrandingProfile>,
    primary_color_field: String,
    writer: DraftWriter,
    assist: AssistAdapter,
    backend: Arc<dyn ListingBackend>,
    ready_to_submit: bool,
    submitting: bool,
    submit_banner: Option<String>,
}

impl WizardController {
    /// Start a fresh flow with a new draft id
    pub fn new(
        registry: StepRegistry,
        config: &EngineConfig,
        draft_store: Arc<dyn DraftStore>,
        generation: Arc<dyn GenerationBackend>,
        backend: Arc<dyn ListingBackend>,
    ) -> Self {
        Self::assemble(
            WizardSession::new(),
            registry,
            config,
            draft_store,
            generation,
            backend,
        )
    }

    /// Resume the flow persisted under `draft_id`, or start fresh under that
    /// id when no draft exists. A corrupt draft is an error, never silently
    /// discarded.
    pub fn resume(
        draft_id: Uuid,
        registry: StepRegistry,
        config: &EngineConfig,
        draft_store: Arc<dyn DraftStore>,
        generation: Arc<dyn GenerationBackend>,
        backend: Arc<dyn ListingBackend>,
    ) -> Result<Self, DraftError> {
        let session = match draft_store.load(draft_id)? {
            Some(record) => {
                info!("Resuming wizard draft {}", draft_id);
                WizardSession::from_record(record)
            }
            None => {
                debug!("No draft under {}; starting fresh", draft_id);
                WizardSession::with_draft_id(draft_id)
            }
        };
        Ok(Self::assemble(
            session,
            registry,
            config,
            draft_store,
            generation,
            backend,
        ))
    }

    fn assemble(
        mut session: WizardSession,
        registry: StepRegistry,
        config: &EngineConfig,
        draft_store: Arc<dyn DraftStore>,
        generation: Arc<dyn GenerationBackend>,
        backend: Arc<dyn ListingBackend>,
    ) -> Self {
        if session.current_index >= registry.len() {
            warn!(
                "Draft index {} outside the {}-step flow; clamping",
                session.current_index,
                registry.len()
            );
            session.current_index = registry.len() - 1;
        }

        let primary_color_field = config.primary_color_field.clone();
        let branding = session
            .field(&primary_color_field)
            .and_then(Value::as_str)
            .and_then(|hex| branding::derive(hex).ok());

        Self {
            session,
            registry,
            branding,
            primary_color_field,
            writer: DraftWriter::spawn(draft_store, config.draft_debounce()),
            assist: AssistAdapter::new(generation, config.generation_timeout()),
            backend,
            ready_to_submit: false,
            submitting: false,
            submit_banner: None,
        }
    }

    // === The five operations ===

    /// Write a field value. Never touches the index, errors, or completed
    /// set; schedules a debounced draft write. Writing the primary-color
    /// field re-derives branding synchronously.
    pub fn update_field(&mut self, key: &str, value: Value) {
        if key == self.primary_color_field {
            match value.as_str().map(branding::derive) {
                Some(Ok(profile)) => self.branding = Some(profile),
                Some(Err(e)) => debug!("Keeping previous branding: {}", e),
                None => {}
            }
        }
        self.session.set_field(key, value);
        self.writer.schedule_save(self.session.snapshot());
    }

    /// Validate the current step and advance past it if clean
    pub fn go_next(&mut self) -> Transition {
        let step = self
            .registry
            .get(self.session.current_index)
            .expect("current index within registry bounds");
        let step_id = step.id.clone();
        let errors = step.validate(&self.session.form_data);

        if !errors.is_empty() {
            debug!("Step {} blocked by {} field error(s)", step_id, errors.len());
            self.session.errors.insert(step_id, errors);
            return Transition::Blocked;
        }

        self.session.errors.remove(&step_id);
        self.session.completed_steps.insert(step_id.clone());

        let transition = if self.session.current_index + 1 < self.registry.len() {
            self.session.current_index += 1;
            debug!("Advanced from {} to index {}", step_id, self.session.current_index);
            Transition::Advanced {
                to: self.session.current_index,
            }
        } else {
            info!("Review step {} validated; ready to submit", step_id);
            self.ready_to_submit = true;
            Transition::ReadyToSubmit
        };

        self.writer.schedule_save(self.session.snapshot());
        transition
    }

    /// Step back one position. Never validates, never touches form data or
    /// errors. Returns false only when already on step 0.
    pub fn go_back(&mut self) -> bool {
        if self.session.current_index == 0 {
            return false;
        }
        self.session.current_index -= 1;
        true
    }

    /// Jump to `index` when it is a previously completed step or the one
    /// immediately after the furthest completed step. Otherwise a no-op
    /// returning false.
    pub fn go_to_step(&mut self, index: usize) -> bool {
        if index >= self.registry.len() {
            return false;
        }

        let furthest_completed = self
            .registry
            .iter()
            .enumerate()
            .filter(|(_, step)| self.session.completed_steps.contains(&step.id))
            .map(|(i, _)| i)
            .max();
        let reachable = furthest_completed.map_or(0, |i| i + 1);

        if index > reachable {
            debug!("Rejected jump to step {} (reachable up to {})", index, reachable);
            return false;
        }

        self.session.current_index = index;
        true
    }

    /// Post the listing: `begin_submit` + backend call + `complete_submit`.
    ///
    /// Re-invoking while a submission is in flight is a no-op; exactly one
    /// POST happens per accepted gesture.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let payload = match self.begin_submit() {
            Ok(payload) => payload,
            Err(SubmitBlocked::InFlight) => return SubmitOutcome::InFlight,
            Err(SubmitBlocked::NotReady) => return SubmitOutcome::NotReady,
        };
        let backend = self.backend.clone();
        let result = backend.submit_listing(&payload).await;
        self.complete_submit(result)
    }

    // === Split submission path for hosts that drive the POST themselves ===

    /// Flip the submitting guard and hand out the payload to post.
    ///
    /// Errors when a submission is already in flight or the flow never
    /// reached ready-to-submit.
    pub fn begin_submit(&mut self) -> Result<FormData, SubmitBlocked> {
        if self.submitting {
            debug!("Dropping duplicate submit gesture");
            return Err(SubmitBlocked::InFlight);
        }
        if !self.ready_to_submit {
            return Err(SubmitBlocked::NotReady);
        }
        self.submitting = true;
        self.submit_banner = None;
        self.session.phase = WizardPhase::Submitting;
        Ok(self.session.form_data.clone())
    }

    /// Fold the backend's verdict back into the session
    pub fn complete_submit(
        &mut self,
        result: Result<SubmitReceipt, SubmitError>,
    ) -> SubmitOutcome {
        self.submitting = false;
        match result {
            Ok(receipt) => {
                info!("Wizard flow submitted as listing {}", receipt.id);
                self.session.phase = WizardPhase::Submitted;
                self.writer.delete(self.session.draft_id);
                SubmitOutcome::Submitted {
                    listing_id: receipt.id,
                }
            }
            Err(SubmitError::Rejected(issues)) => {
                warn!("Backend rejected listing with {} issue(s)", issues.len());
                self.session.phase = WizardPhase::SubmitFailed;
                let mut unmapped = Vec::new();
                for issue in issues {
                    match self.registry.step_for_field(&issue.field) {
                        Some(step) => {
                            self.session
                                .errors
                                .entry(step.id.clone())
                                .or_default()
                                .insert(issue.field, issue.message);
                        }
                        None => unmapped.push(format!("{}: {}", issue.field, issue.message)),
                    }
                }
                if !unmapped.is_empty() {
                    self.submit_banner = Some(unmapped.join("; "));
                }
                SubmitOutcome::Failed
            }
            Err(e) => {
                warn!("Submission failed: {}", e);
                self.session.phase = WizardPhase::SubmitFailed;
                self.submit_banner = Some(e.to_string());
                SubmitOutcome::Failed
            }
        }
    }

    // === AI assist ===

    /// Handle for driving generation futures without holding the controller.
    /// Clones share token state, so results applied later are still checked
    /// against the latest request.
    pub fn assist(&self) -> AssistAdapter {
        self.assist.clone()
    }

    /// Generation target of the current step, when it is an AI-assist step
    pub fn assist_target(&self) -> Option<&str> {
        match &self.current_step().kind {
            StepKind::AiAssist { target_field } => Some(target_field),
            _ => None,
        }
    }

    /// Structured context for generating the current step's target field,
    /// built from everything entered so far
    pub fn assist_context(&self) -> GenerationContext {
        GenerationContext::from_fields(self.session.form_data.clone())
    }

    /// True when the current step carries the media attachment slot
    pub fn has_media_slot(&self) -> bool {
        matches!(self.current_step().kind, StepKind::Media)
    }

    /// Apply a finished generation outcome to its target field.
    ///
    /// Only a still-authoritative `Generated` outcome writes anything;
    /// timeouts, service errors, and superseded results leave whatever the
    /// user typed untouched. Returns true when the field was written.
    pub fn apply_assist(&mut self, field_key: &str, outcome: &AssistOutcome) -> bool {
        match outcome {
            AssistOutcome::Generated { text, token, .. }
                if self.assist.is_current(field_key, *token) =>
            {
                self.update_field(field_key, Value::String(text.clone()));
                true
            }
            AssistOutcome::Generated { .. } => {
                debug!("Ignoring stale generation result for {}", field_key);
                false
            }
            _ => false,
        }
    }

    // === Exposed read state ===

    pub fn current_step(&self) -> &StepDescriptor {
        self.registry
            .get(self.session.current_index)
            .expect("current index within registry bounds")
    }

    pub fn current_index(&self) -> usize {
        self.session.current_index
    }

    pub fn step_count(&self) -> usize {
        self.registry.len()
    }

    pub fn form_data(&self) -> &FormData {
        &self.session.form_data
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.session.field(key)
    }

    pub fn errors(&self) -> &HashMap<String, ErrorMap> {
        &self.session.errors
    }

    pub fn step_errors(&self, step_id: &str) -> Option<&ErrorMap> {
        self.session.errors.get(step_id)
    }

    /// Fraction of steps completed, in [0, 1]. Monotonically non-decreasing
    /// for the lifetime of a session.
    pub fn progress(&self) -> f64 {
        let completed = self
            .registry
            .iter()
            .filter(|step| self.session.completed_steps.contains(&step.id))
            .count();
        completed as f64 / self.registry.len() as f64
    }

    pub fn branding(&self) -> Option<&BrandingProfile> {
        self.branding.as_ref()
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.session.phase
    }

    /// Step-agnostic message from the last failed submission, if any
    pub fn submit_banner(&self) -> Option<&str> {
        self.submit_banner.as_deref()
    }

    pub fn draft_id(&self) -> Uuid {
        self.session.draft_id
    }

    /// Force any pending draft snapshot to storage now
    pub async fn flush_draft(&self) -> Result<(), DraftError> {
        self.writer.flush().await
    }
}

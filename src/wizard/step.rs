// ABOUTME: Declarative step descriptors and the ordered step registry
// Steps are data; all mutable session state lives on the controller

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Field-keyed validation messages for one step. Empty means the step passes.
pub type ErrorMap = BTreeMap<String, String>;

/// Accumulated form data shared by every step
pub type FormData = serde_json::Map<String, Value>;

/// Custom validation hook run against the whole form-data aggregate
pub type Validator = Box<dyn Fn(&FormData) -> ErrorMap + Send + Sync>;

/// What a step is, beyond its fields
///
/// Consumed uniformly by the controller; per-screen branching lives here
/// instead of in the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// Plain form fields only
    Form,
    /// Form fields plus AI-assisted generation targeting one field
    AiAssist {
        /// Field the generation result lands in
        target_field: String,
    },
    /// Step carrying the media attachment slot
    Media,
    /// Final review step; `go_next` here signals ready-to-submit
    Review,
}

/// One unit of the wizard flow: id, title, required fields, optional
/// custom validator, and its kind
pub struct StepDescriptor {
    pub id: String,
    pub title: String,
    pub required_fields: BTreeSet<String>,
    pub kind: StepKind,
    validator: Option<Validator>,
}

impl fmt::Debug for StepDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("required_fields", &self.required_fields)
            .field("kind", &self.kind)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

impl StepDescriptor {
    /// Create a plain form step
    pub fn form<I, S>(id: &str, title: &str, required_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            required_fields: required_fields.into_iter().map(Into::into).collect(),
            kind: StepKind::Form,
            validator: None,
        }
    }

    /// Create an AI-assist step whose generation result targets `target_field`
    pub fn ai_assist<I, S>(id: &str, title: &str, required_fields: I, target_field: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut step = Self::form(id, title, required_fields);
        step.kind = StepKind::AiAssist {
            target_field: target_field.to_string(),
        };
        step
    }

    /// Create the media attachment step
    pub fn media(id: &str, title: &str) -> Self {
        let mut step = Self::form(id, title, Vec::<String>::new());
        step.kind = StepKind::Media;
        step
    }

    /// Create the final review step
    pub fn review(id: &str, title: &str) -> Self {
        let mut step = Self::form(id, title, Vec::<String>::new());
        step.kind = StepKind::Review;
        step
    }

    /// Attach a custom validator, run after the required-field check
    #[must_use]
    pub fn with_validator(
        mut self,
        validator: impl Fn(&FormData) -> ErrorMap + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Run this step's validation against the form data.
    ///
    /// Required fields that are absent, null, or blank strings report
    /// `"required"`; the custom validator's messages are merged on top.
    pub fn validate(&self, form_data: &FormData) -> ErrorMap {
        let mut errors = ErrorMap::new();

        for field in &self.required_fields {
            let present = match form_data.get(field) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.trim().is_empty(),
                Some(_) => true,
            };
            if !present {
                errors.insert(field.clone(), "required".to_string());
            }
        }

        if let Some(validator) = &self.validator {
            for (field, message) in validator(form_data) {
                errors.entry(field).or_insert(message);
            }
        }

        errors
    }
}

/// Error raised when a step list cannot form a valid registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("A wizard needs at least one step")]
    Empty,
    #[error("Duplicate step id: {0}")]
    DuplicateStepId(String),
    #[error("Field {field} appears in steps {first} and {second}; field keys are global")]
    DuplicateField {
        field: String,
        first: String,
        second: String,
    },
}

/// Ordered, immutable sequence of step descriptors for one wizard flow
#[derive(Debug)]
pub struct StepRegistry {
    steps: Vec<StepDescriptor>,
}

impl StepRegistry {
    /// Build a registry, rejecting duplicate step ids and duplicate field
    /// keys across steps
    pub fn new(steps: Vec<StepDescriptor>) -> Result<Self, RegistryError> {
        if steps.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen_ids = BTreeSet::new();
        let mut field_owner: BTreeMap<&str, &str> = BTreeMap::new();

        for step in &steps {
            if !seen_ids.insert(step.id.as_str()) {
                return Err(RegistryError::DuplicateStepId(step.id.clone()));
            }
            for field in &step.required_fields {
                if let Some(first) = field_owner.insert(field.as_str(), step.id.as_str()) {
                    return Err(RegistryError::DuplicateField {
                        field: field.clone(),
                        first: first.to_string(),
                        second: step.id.clone(),
                    });
                }
            }
        }

        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StepDescriptor> {
        self.steps.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDescriptor> {
        self.steps.iter()
    }

    /// Index of the step with the given id
    pub fn index_of(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    /// The step that declares `field` among its required fields
    pub fn step_for_field(&self, field: &str) -> Option<&StepDescriptor> {
        self.steps.iter().find(|s| s.required_fields.contains(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn form_data(pairs: &[(&str, Value)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_required_fields_reported_missing() {
        let step = StepDescriptor::form(
            "personal_info",
            "Personal info",
            ["first_name", "last_name", "phone"],
        );

        let data = form_data(&[
            ("first_name", json!("John")),
            ("last_name", json!("Doe")),
        ]);
        let errors = step.validate(&data);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("phone").map(String::as_str), Some("required"));
    }

    #[test]
    fn test_blank_string_counts_as_missing() {
        let step = StepDescriptor::form("s", "S", ["phone"]);
        let data = form_data(&[("phone", json!("   "))]);
        assert_eq!(
            step.validate(&data).get("phone").map(String::as_str),
            Some("required")
        );
    }

    #[test]
    fn test_custom_validator_merged_after_required() {
        let step = StepDescriptor::form("s", "S", ["price"]).with_validator(|data| {
            let mut errors = ErrorMap::new();
            if let Some(price) = data.get("price").and_then(Value::as_f64) {
                if price <= 0.0 {
                    errors.insert("price".to_string(), "must be positive".to_string());
                }
            }
            errors
        });

        let data = form_data(&[("price", json!(-5.0))]);
        assert_eq!(
            step.validate(&data).get("price").map(String::as_str),
            Some("must be positive")
        );

        // Required check wins when the field is absent entirely
        assert_eq!(
            step.validate(&FormData::new())
                .get("price")
                .map(String::as_str),
            Some("required")
        );
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert!(matches!(StepRegistry::new(vec![]), Err(RegistryError::Empty)));
    }

    #[test]
    fn test_duplicate_step_id_rejected() {
        let result = StepRegistry::new(vec![
            StepDescriptor::form("a", "A", Vec::<String>::new()),
            StepDescriptor::form("a", "Again", Vec::<String>::new()),
        ]);
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateStepId(ref id)) if id == "a"
        ));
    }

    #[test]
    fn test_duplicate_field_across_steps_rejected() {
        let result = StepRegistry::new(vec![
            StepDescriptor::form("a", "A", ["title"]),
            StepDescriptor::form("b", "B", ["title"]),
        ]);
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateField { ref field, .. }) if field == "title"
        ));
    }

    #[test]
    fn test_step_for_field() {
        let registry = StepRegistry::new(vec![
            StepDescriptor::form("a", "A", ["title"]),
            StepDescriptor::form("b", "B", ["price"]),
        ])
        .unwrap();

        assert_eq!(registry.step_for_field("price").map(|s| s.id.as_str()), Some("b"));
        assert_eq!(registry.step_for_field("nope").map(|s| s.id.as_str()), None);
    }
}

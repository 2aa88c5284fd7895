//! Validation gate guarding forward transitions.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use stepwise_core::{FieldName, FormBinding, FormData, Step};
use tracing::debug;

/// Result of running the gate for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Passed,
    /// The form binding reported at least one declared field invalid.
    FieldsInvalid,
    /// The step's own validator returned `false`.
    Rejected,
}

impl GateOutcome {
    pub fn passed(self) -> bool {
        self == GateOutcome::Passed
    }
}

/// Composes field-level validation with a step's own validator.
///
/// Fields are checked first; the validator only runs when they pass.
#[derive(Clone, Default)]
pub struct ValidationGate {
    binding: Option<Arc<dyn FormBinding>>,
}

impl fmt::Debug for ValidationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationGate")
            .field("has_binding", &self.binding.is_some())
            .finish()
    }
}

impl ValidationGate {
    pub fn new(binding: Option<Arc<dyn FormBinding>>) -> Self {
        Self { binding }
    }

    pub fn has_binding(&self) -> bool {
        self.binding.is_some()
    }

    pub async fn evaluate(&self, step: &Step, data: &FormData) -> GateOutcome {
        if !step.field_names().is_empty() {
            // Builder guarantees a binding whenever fields are declared.
            if let Some(binding) = &self.binding {
                if !binding.validate_fields(step.field_names(), data).await {
                    debug!("Step '{}' has invalid fields", step.id());
                    return GateOutcome::FieldsInvalid;
                }
            }
        }

        if let Some(validator) = step.validator_ref() {
            if !validator.validate(data).await {
                debug!("Step '{}' rejected by its validator", step.id());
                return GateOutcome::Rejected;
            }
        }

        GateOutcome::Passed
    }
}

/// Form binding that requires every named field to hold a non-empty value.
///
/// Missing keys, `null`, blank strings, and empty arrays or objects are invalid.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredFields;

impl RequiredFields {
    fn is_filled(value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
            Value::Bool(_) | Value::Number(_) => true,
        }
    }
}

#[async_trait]
impl FormBinding for RequiredFields {
    async fn validate_fields(&self, fields: &[FieldName], data: &FormData) -> bool {
        fields
            .iter()
            .all(|field| data.get(field.as_str()).is_some_and(Self::is_filled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn gate() -> ValidationGate {
        ValidationGate::new(Some(Arc::new(RequiredFields)))
    }

    #[tokio::test]
    async fn test_bare_step_passes() {
        let step = Step::new("welcome", "Welcome");
        assert_eq!(
            ValidationGate::default()
                .evaluate(&step, &FormData::new())
                .await,
            GateOutcome::Passed
        );
    }

    #[tokio::test]
    async fn test_fields_checked_before_validator() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let step = Step::new("profile", "Profile")
            .fields(["name"])
            .validate_with(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            });

        let outcome = gate().evaluate(&step, &FormData::new()).await;
        assert_eq!(outcome, GateOutcome::FieldsInvalid);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let outcome = gate()
            .evaluate(&step, &FormData::new().with("name", "Alice"))
            .await;
        assert_eq!(outcome, GateOutcome::Passed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_validator_rejects() {
        let step = Step::new("terms", "Terms").validate_async(|_| async { false });
        let outcome = gate().evaluate(&step, &FormData::new()).await;
        assert_eq!(outcome, GateOutcome::Rejected);
        assert!(!outcome.passed());
    }

    async fn check(value: Value) -> bool {
        let data = FormData::new().with("value", value);
        RequiredFields
            .validate_fields(&[FieldName::new("value")], &data)
            .await
    }

    #[tokio::test]
    async fn test_required_fields_values() {
        let missing = RequiredFields
            .validate_fields(&[FieldName::new("other")], &FormData::new().with("value", "x"))
            .await;
        assert!(!missing);

        assert!(!check(json!(null)).await);
        assert!(!check(json!("   ")).await);
        assert!(!check(json!([])).await);
        assert!(!check(json!({})).await);
        assert!(check(json!("x")).await);
        assert!(check(json!(0)).await);
        assert!(check(json!(false)).await);
        assert!(check(json!(["a"])).await);
    }
}

//! Workflow error types.

use crate::step::StepId;
use thiserror::Error;

/// Error type returned by caller-supplied validators, hooks and handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The type of lifecycle hook that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookType {
    /// The `before_next` hook, run before leaving a step forwards.
    BeforeNext,
    /// The `before_previous` hook, run before leaving a step backwards.
    BeforePrevious,
    /// The completion handler, run when the last step is left forwards.
    Complete,
}

impl std::fmt::Display for HookType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookType::BeforeNext => write!(f, "before_next"),
            HookType::BeforePrevious => write!(f, "before_previous"),
            HookType::Complete => write!(f, "on_complete"),
        }
    }
}

/// Errors surfaced to the caller of a wizard.
///
/// Validation failures are not errors: they block the transition and are
/// reported through the transition outcome instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WorkflowError {
    /// A lifecycle hook or the completion handler failed.
    ///
    /// The wizard state is left as it was before the transition was attempted.
    #[error("Hook '{hook_type}' failed in step '{step_id}': {source}")]
    HookError {
        /// The step being left when the hook ran.
        step_id: StepId,
        /// Which hook failed.
        hook_type: HookType,
        /// The error returned by the hook.
        #[source]
        source: BoxError,
    },

    /// Two steps share the same id.
    #[error("Duplicate step id: {0}")]
    DuplicateStep(StepId),

    /// The wizard configuration is invalid.
    #[error("Invalid workflow configuration: {0}")]
    Configuration(String),
}

/// Errors raised by a persistence adapter.
///
/// The wizard never propagates these; persistence is best effort.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// A write carried a revision older than (or equal to) the stored one.
    #[error("stale write for key '{key}': revision {revision} <= stored {stored}")]
    StaleRevision {
        key: String,
        revision: u64,
        stored: u64,
    },

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_hook_error_display() {
        let error = WorkflowError::HookError {
            step_id: StepId::new("payment"),
            hook_type: HookType::BeforeNext,
            source: "card declined".into(),
        };
        assert_eq!(
            error.to_string(),
            "Hook 'before_next' failed in step 'payment': card declined"
        );
        assert_eq!(
            error.source().map(|s| s.to_string()),
            Some("card declined".to_string())
        );
    }

    #[test]
    fn test_hook_type_display() {
        assert_eq!(HookType::BeforeNext.to_string(), "before_next");
        assert_eq!(HookType::BeforePrevious.to_string(), "before_previous");
        assert_eq!(HookType::Complete.to_string(), "on_complete");
    }

    #[test]
    fn test_stale_revision_display() {
        let error = PersistenceError::StaleRevision {
            key: "wizard".to_string(),
            revision: 2,
            stored: 5,
        };
        assert_eq!(
            error.to_string(),
            "stale write for key 'wizard': revision 2 <= stored 5"
        );
    }
}

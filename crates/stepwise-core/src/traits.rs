//! Capability traits the wizard consumes from its callers.
//!
//! Each trait has closure adapters so simple cases do not need a named type.

use crate::error::{BoxError, PersistenceError};
use crate::form::{FieldName, FormData, Snapshot};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;

/// Step-level predicate deciding whether a step's content may be left forwards.
///
/// # Examples
///
/// ```
/// use stepwise_core::{FormData, Validator};
/// use async_trait::async_trait;
///
/// struct AcceptedTerms;
///
/// #[async_trait]
/// impl Validator for AcceptedTerms {
///     async fn validate(&self, data: &FormData) -> bool {
///         data.get("terms").and_then(|v| v.as_bool()).unwrap_or(false)
///     }
/// }
/// ```
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, data: &FormData) -> bool;
}

/// Lifecycle hook run immediately before leaving a step.
///
/// Returning an error aborts the transition and is surfaced to the caller.
#[async_trait]
pub trait StepHook: Send + Sync {
    async fn run(&self, data: &FormData) -> Result<(), BoxError>;
}

/// Called once when the last step is left forwards.
#[async_trait]
pub trait CompletionHandler: Send + Sync {
    async fn on_complete(&self, data: &FormData) -> Result<(), BoxError>;
}

/// Field-level validation delegated to an external form binding.
///
/// Implementations validate exactly the named fields and return `false` if any
/// of them is invalid. `data` is the wizard's accumulated form data; bindings
/// that track their own field state may ignore it.
#[async_trait]
pub trait FormBinding: Send + Sync {
    async fn validate_fields(&self, fields: &[FieldName], data: &FormData) -> bool;
}

/// Key/value storage for a wizard's form data.
///
/// A wizard only ever touches its own configured key. Implementations should
/// refuse a `save` whose revision is not newer than the stored one with
/// [`PersistenceError::StaleRevision`].
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), PersistenceError>;

    async fn load(&self, key: &str) -> Result<Option<Snapshot>, PersistenceError>;

    async fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Adapts a synchronous closure into a [`Validator`].
pub struct FnValidator<F>(pub F);

#[async_trait]
impl<F> Validator for FnValidator<F>
where
    F: Fn(&FormData) -> bool + Send + Sync,
{
    async fn validate(&self, data: &FormData) -> bool {
        (self.0)(data)
    }
}

/// Adapts an async closure into a [`Validator`].
///
/// The closure receives its own copy of the form data so the returned future
/// does not borrow from the wizard.
pub struct AsyncFnValidator<F>(pub F);

#[async_trait]
impl<F, Fut> Validator for AsyncFnValidator<F>
where
    F: Fn(FormData) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send + 'static,
{
    async fn validate(&self, data: &FormData) -> bool {
        (self.0)(data.clone()).await
    }
}

/// Adapts an async closure into a [`StepHook`].
pub struct FnHook<F>(pub F);

#[async_trait]
impl<F, Fut> StepHook for FnHook<F>
where
    F: Fn(FormData) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn run(&self, data: &FormData) -> Result<(), BoxError> {
        (self.0)(data.clone()).await
    }
}

/// Adapts an async closure into a [`CompletionHandler`].
pub struct FnCompletion<F>(pub F);

#[async_trait]
impl<F, Fut> CompletionHandler for FnCompletion<F>
where
    F: Fn(FormData) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn on_complete(&self, data: &FormData) -> Result<(), BoxError> {
        (self.0)(data.clone()).await
    }
}

macro_rules! opaque_debug {
    ($($ty:ident),*) => {
        $(
            impl<F> fmt::Debug for $ty<F> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_struct(stringify!($ty)).finish_non_exhaustive()
                }
            }
        )*
    };
}

opaque_debug!(FnValidator, AsyncFnValidator, FnHook, FnCompletion);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_validator() {
        let validator = FnValidator(|data: &FormData| data.contains("email"));

        assert!(!validator.validate(&FormData::new()).await);
        assert!(validator.validate(&FormData::new().with("email", "a@b.c")).await);
    }

    #[tokio::test]
    async fn test_async_fn_validator() {
        let validator = AsyncFnValidator(|data: FormData| async move {
            data.get("age").and_then(|v| v.as_u64()).is_some_and(|age| age >= 18)
        });

        assert!(validator.validate(&FormData::new().with("age", json!(30))).await);
        assert!(!validator.validate(&FormData::new().with("age", json!(12))).await);
    }

    #[tokio::test]
    async fn test_fn_hook_error() {
        let hook = FnHook(|_data: FormData| async { Err::<(), BoxError>("rejected".into()) });

        let result = hook.run(&FormData::new()).await;
        assert_eq!(result.map_err(|e| e.to_string()), Err("rejected".to_string()));
    }
}

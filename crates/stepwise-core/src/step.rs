//! Step definitions.

use crate::error::BoxError;
use crate::form::{FieldName, FormData};
use crate::traits::{AsyncFnValidator, FnHook, FnValidator, StepHook, Validator};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Type-safe step id wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepId(String);

impl StepId {
    /// Creates a new StepId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the step id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StepId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for StepId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

type VisibilityFn = dyn Fn(&FormData) -> bool + Send + Sync;

/// One stage of a wizard.
///
/// A step is a passive descriptor: the wizard reads it, never mutates it.
/// Title and description are display metadata the engine does not interpret.
///
/// # Examples
///
/// ```
/// use stepwise_core::{BoxError, FormData, Step};
///
/// let profile = Step::new("profile", "Your profile")
///     .description("Tell buyers who you are")
///     .fields(["display_name", "email"])
///     .validate_with(|data: &FormData| data.contains("email"))
///     .on_before_next_with(|_data: FormData| async { Ok::<(), BoxError>(()) });
///
/// let newsletter = Step::new("newsletter", "Newsletter").optional();
///
/// assert_eq!(profile.id().as_str(), "profile");
/// assert_eq!(profile.field_names().len(), 2);
/// assert!(newsletter.is_optional());
/// ```
#[derive(Clone)]
pub struct Step {
    id: StepId,
    title: String,
    description: Option<String>,
    optional: bool,
    fields: Vec<FieldName>,
    validator: Option<Arc<dyn Validator>>,
    before_next: Option<Arc<dyn StepHook>>,
    before_previous: Option<Arc<dyn StepHook>>,
    visible_when: Option<Arc<VisibilityFn>>,
}

impl Step {
    pub fn new(id: impl Into<StepId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            optional: false,
            fields: Vec::new(),
            validator: None,
            before_next: None,
            before_previous: None,
            visible_when: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the step as skippable.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Fields this step is responsible for, checked through the form binding.
    pub fn fields<I, N>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<FieldName>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn validate_with<F>(self, f: F) -> Self
    where
        F: Fn(&FormData) -> bool + Send + Sync + 'static,
    {
        self.validator(FnValidator(f))
    }

    pub fn validate_async<F, Fut>(self, f: F) -> Self
    where
        F: Fn(FormData) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.validator(AsyncFnValidator(f))
    }

    pub fn on_before_next(mut self, hook: impl StepHook + 'static) -> Self {
        self.before_next = Some(Arc::new(hook));
        self
    }

    pub fn on_before_next_with<F, Fut>(self, f: F) -> Self
    where
        F: Fn(FormData) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.on_before_next(FnHook(f))
    }

    pub fn on_before_previous(mut self, hook: impl StepHook + 'static) -> Self {
        self.before_previous = Some(Arc::new(hook));
        self
    }

    pub fn on_before_previous_with<F, Fut>(self, f: F) -> Self
    where
        F: Fn(FormData) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.on_before_previous(FnHook(f))
    }

    /// Render-time visibility predicate.
    ///
    /// Visibility never changes the step's index; a hidden step still counts
    /// toward the wizard's step total.
    pub fn visible_when<F>(mut self, f: F) -> Self
    where
        F: Fn(&FormData) -> bool + Send + Sync + 'static,
    {
        self.visible_when = Some(Arc::new(f));
        self
    }

    pub fn id(&self) -> &StepId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn field_names(&self) -> &[FieldName] {
        &self.fields
    }

    pub fn validator_ref(&self) -> Option<&dyn Validator> {
        self.validator.as_deref()
    }

    pub fn before_next(&self) -> Option<&dyn StepHook> {
        self.before_next.as_deref()
    }

    pub fn before_previous(&self) -> Option<&dyn StepHook> {
        self.before_previous.as_deref()
    }

    /// Evaluates the visibility predicate; steps without one are always visible.
    pub fn is_visible(&self, data: &FormData) -> bool {
        self.visible_when.as_ref().map_or(true, |f| f(data))
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("optional", &self.optional)
            .field("fields", &self.fields)
            .field("has_validator", &self.validator.is_some())
            .field("has_before_next", &self.before_next.is_some())
            .field("has_before_previous", &self.before_previous.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_id() {
        let id = StepId::new("shipping");
        assert_eq!(id.as_str(), "shipping");

        let id: StepId = "shipping".into();
        assert_eq!(id.to_string(), "shipping");
    }

    #[test]
    fn test_step_defaults() {
        let step = Step::new("welcome", "Welcome");
        assert!(!step.is_optional());
        assert!(step.field_names().is_empty());
        assert!(step.validator_ref().is_none());
        assert!(step.before_next().is_none());
        assert!(step.before_previous().is_none());
        assert!(step.is_visible(&FormData::new()));
    }

    #[test]
    fn test_visibility_predicate() {
        let step = Step::new("store", "Store setup")
            .visible_when(|data| data.get("role") == Some(&json!("seller")));

        assert!(!step.is_visible(&FormData::new().with("role", "buyer")));
        assert!(step.is_visible(&FormData::new().with("role", "seller")));
    }

    #[tokio::test]
    async fn test_validate_with_closure() {
        let step = Step::new("terms", "Terms").validate_with(|data: &FormData| {
            data.get("accepted").and_then(|v| v.as_bool()).unwrap_or(false)
        });

        let validator = step.validator_ref().expect("validator set");
        assert!(!validator.validate(&FormData::new()).await);
        assert!(validator.validate(&FormData::new().with("accepted", true)).await);
    }
}

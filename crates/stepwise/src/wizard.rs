//! Wizard controller: runs validation, hooks and persistence around the pure
//! transitions of [`WizardState`].

use crate::config::WizardConfig;
use crate::gate::{GateOutcome, ValidationGate};
use crate::state::{Ignored, Ticket, WizardState};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use stepwise_core::{
    BoxError, CompletionHandler, FnCompletion, FormBinding, FormData, HookType,
    PersistenceAdapter, PersistenceError, Snapshot, Step, WorkflowError,
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Outcome of a navigation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The current step changed.
    Moved { from: usize, to: usize },
    /// The last step was left forwards and the completion handler succeeded.
    Completed,
    /// The validation gate failed; the current step did not change.
    Blocked(GateOutcome),
    /// The action did not apply to the current state.
    Ignored(Ignored),
    /// Another navigation happened while this one was awaiting; its result was
    /// discarded.
    Superseded,
}

impl Transition {
    pub fn is_moved(&self) -> bool {
        matches!(self, Transition::Moved { .. })
    }
}

/// A multi-step wizard.
///
/// Cheap to clone; every clone drives the same state, so several UI callbacks
/// can hold one. Forward and backward transitions are guarded by
/// [`WizardState::is_loading`]: a second call while one is awaiting returns
/// [`Ignored::Busy`].
///
/// # Examples
///
/// ```rust
/// use stepwise::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), WorkflowError> {
/// let wizard = Wizard::builder()
///     .step(Step::new("account", "Account").validate_with(|data: &FormData| data.contains("email")))
///     .step(Step::new("done", "All set"))
///     .build()
///     .await?;
///
/// assert_eq!(wizard.next_step().await?, Transition::Blocked(GateOutcome::Rejected));
///
/// wizard.update_form_data(FormData::new().with("email", "a@example.com")).await;
/// assert_eq!(wizard.next_step().await?, Transition::Moved { from: 0, to: 1 });
/// assert_eq!(wizard.next_step().await?, Transition::Completed);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Wizard {
    inner: Arc<Inner>,
}

struct Inner {
    steps: Vec<Step>,
    config: WizardConfig,
    gate: ValidationGate,
    store: Option<Arc<dyn PersistenceAdapter>>,
    on_complete: Option<Arc<dyn CompletionHandler>>,
    state: watch::Sender<WizardState>,
    // Serializes storage writes so they land in call order.
    writes: Mutex<()>,
}

impl fmt::Debug for Wizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wizard")
            .field(
                "steps",
                &self.inner.steps.iter().map(Step::id).collect::<Vec<_>>(),
            )
            .field("config", &self.inner.config)
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl Wizard {
    /// Creates a new wizard builder.
    pub fn builder() -> WizardBuilder {
        WizardBuilder::new()
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> WizardState {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state changes, for renderers that redraw on every update.
    pub fn subscribe(&self) -> watch::Receiver<WizardState> {
        self.inner.state.subscribe()
    }

    pub fn current_step(&self) -> usize {
        self.inner.state.borrow().current_step
    }

    pub fn total_steps(&self) -> usize {
        self.inner.steps.len()
    }

    pub fn steps(&self) -> &[Step] {
        &self.inner.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.inner.steps.get(index)
    }

    /// The step at the current position.
    pub fn current(&self) -> &Step {
        &self.inner.steps[self.current_step()]
    }

    pub fn config(&self) -> &WizardConfig {
        &self.inner.config
    }

    pub fn form_data(&self) -> FormData {
        self.inner.state.borrow().form_data.clone()
    }

    /// Evaluates a step's visibility predicate against the current form data.
    ///
    /// Hidden steps keep their index; this is for renderers only.
    pub fn is_step_visible(&self, index: usize) -> bool {
        let state = self.inner.state.borrow();
        self.inner
            .steps
            .get(index)
            .is_some_and(|step| step.is_visible(&state.form_data))
    }

    /// Indices of the steps currently visible.
    pub fn visible_steps(&self) -> Vec<usize> {
        let state = self.inner.state.borrow();
        self.inner
            .steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.is_visible(&state.form_data))
            .map(|(index, _)| index)
            .collect()
    }

    /// Jumps to `target` without validation.
    ///
    /// Ignored when out of range, or when skipping is disabled and `target` is
    /// ahead of the current step and was never visited.
    pub fn go_to_step(&self, target: usize) -> Transition {
        let allow_skipping = self.inner.config.allow_step_skipping;
        let mut result = Err(Ignored::OutOfRange);
        self.inner.state.send_if_modified(|state| {
            result = state.jump(target, allow_skipping);
            result.is_ok()
        });

        match result {
            Ok(from) => {
                info!("Jumped from step {} to step {}", from, target);
                Transition::Moved { from, to: target }
            }
            Err(reason) => self.ignored("go_to_step", reason),
        }
    }

    /// Advances to the next step once the gate and `before_next` pass.
    ///
    /// On the last step this runs the completion handler instead. Hook and
    /// handler errors are returned and leave the state unchanged.
    pub async fn next_step(&self) -> Result<Transition, WorkflowError> {
        let ticket = match self.start(WizardState::begin) {
            Ok(ticket) => ticket,
            Err(reason) => return Ok(self.ignored("next_step", reason)),
        };
        let step = &self.inner.steps[ticket.from];

        let outcome = self.inner.gate.evaluate(step, &ticket.data).await;
        let mut current = false;
        self.inner.state.send_if_modified(|state| {
            current = state.is_current(&ticket);
            if !current || !outcome.passed() {
                state.end();
            }
            if current {
                state.can_go_next = outcome.passed();
            }
            true
        });
        if !current {
            return Ok(self.superseded(step));
        }
        if !outcome.passed() {
            debug!("Step '{}' blocked: {:?}", step.id(), outcome);
            return Ok(Transition::Blocked(outcome));
        }

        if let Some(hook) = step.before_next() {
            if let Err(source) = hook.run(&ticket.data).await {
                self.end();
                return Err(self.hook_failed(step, HookType::BeforeNext, source));
            }
        }

        if ticket.from + 1 >= self.total_steps() {
            return self.complete(step, &ticket).await;
        }
        Ok(self.settle_move(step, &ticket, ticket.from + 1))
    }

    /// Goes back one step after `before_previous` passes. Never validates.
    pub async fn previous_step(&self) -> Result<Transition, WorkflowError> {
        let ticket = match self.start(WizardState::begin_backward) {
            Ok(ticket) => ticket,
            Err(reason) => return Ok(self.ignored("previous_step", reason)),
        };
        let step = &self.inner.steps[ticket.from];

        if let Some(hook) = step.before_previous() {
            if let Err(source) = hook.run(&ticket.data).await {
                self.end();
                return Err(self.hook_failed(step, HookType::BeforePrevious, source));
            }
        }

        Ok(self.settle_move(step, &ticket, ticket.from - 1))
    }

    /// Leaves an optional step forwards without running the gate or `before_next`.
    ///
    /// Skipping the last step completes the wizard.
    pub async fn skip_step(&self) -> Result<Transition, WorkflowError> {
        let steps = &self.inner.steps;
        let ticket = match self.start(|state| {
            state.begin_skip(|index| steps.get(index).is_some_and(Step::is_optional))
        }) {
            Ok(ticket) => ticket,
            Err(reason) => return Ok(self.ignored("skip_step", reason)),
        };
        let step = &steps[ticket.from];
        info!("Skipping optional step '{}'", step.id());

        if ticket.from + 1 >= self.total_steps() {
            return self.complete(step, &ticket).await;
        }
        Ok(self.settle_move(step, &ticket, ticket.from + 1))
    }

    /// Shallow-merges `patch` into the form data and persists the result.
    ///
    /// Storage failures are logged and otherwise ignored.
    pub async fn update_form_data(&self, patch: FormData) {
        let _write = self.inner.writes.lock().await;
        let mut snapshot = Snapshot::default();
        self.inner
            .state
            .send_modify(|state| snapshot = state.merge(patch));
        self.persist(&snapshot).await;
    }

    /// Lets the current step's content report its validity directly.
    pub fn set_can_go_next(&self, value: bool) {
        self.inner.state.send_if_modified(|state| {
            let changed = state.can_go_next != value;
            state.can_go_next = value;
            changed
        });
    }

    /// Runs the gate for the current step and records the result in
    /// [`WizardState::can_go_next`].
    pub async fn revalidate(&self) -> GateOutcome {
        let ticket = self.inner.state.borrow().observe();
        let step = &self.inner.steps[ticket.from];
        let outcome = self.inner.gate.evaluate(step, &ticket.data).await;

        self.inner.state.send_if_modified(|state| {
            if !state.is_current(&ticket) || state.can_go_next == outcome.passed() {
                return false;
            }
            state.can_go_next = outcome.passed();
            true
        });
        outcome
    }

    /// Returns to the first step with empty form data and drops the stored copy.
    pub async fn reset(&self) {
        let _write = self.inner.writes.lock().await;
        self.inner.state.send_modify(WizardState::reset);
        info!("Wizard reset");
        self.remove_stored().await;
    }

    fn start(
        &self,
        begin: impl FnOnce(&mut WizardState) -> Result<Ticket, Ignored>,
    ) -> Result<Ticket, Ignored> {
        let mut result = Err(Ignored::Busy);
        self.inner.state.send_if_modified(|state| {
            result = begin(state);
            result.is_ok()
        });
        result
    }

    fn end(&self) {
        self.inner.state.send_modify(WizardState::end);
    }

    fn settle_move(&self, step: &Step, ticket: &Ticket, to: usize) -> Transition {
        let mut current = false;
        self.inner.state.send_modify(|state| {
            current = state.is_current(ticket);
            if current {
                state.enter(to);
            }
            state.end();
        });
        if !current {
            return self.superseded(step);
        }
        info!(
            "Moved from step '{}' to step '{}'",
            step.id(),
            self.inner.steps[to].id()
        );
        Transition::Moved {
            from: ticket.from,
            to,
        }
    }

    async fn complete(&self, step: &Step, ticket: &Ticket) -> Result<Transition, WorkflowError> {
        let current = self.inner.state.borrow().is_current(ticket);
        if !current {
            self.end();
            return Ok(self.superseded(step));
        }

        if let Some(handler) = &self.inner.on_complete {
            let data = self.form_data();
            if let Err(source) = handler.on_complete(&data).await {
                self.end();
                return Err(self.hook_failed(step, HookType::Complete, source));
            }
        }

        // Held until storage is cleared so a reset and new writes cannot interleave.
        let _write = self.inner.writes.lock().await;
        let mut current = false;
        self.inner.state.send_modify(|state| {
            current = state.is_current(ticket);
            if current {
                state.mark_completed();
            } else {
                state.end();
            }
        });
        if !current {
            return Ok(self.superseded(step));
        }
        info!("Wizard completed at step '{}'", step.id());

        if self.inner.config.clear_storage_on_complete {
            self.remove_stored().await;
        }
        Ok(Transition::Completed)
    }

    fn store(&self) -> Option<&dyn PersistenceAdapter> {
        if self.inner.config.persist_state {
            self.inner.store.as_deref()
        } else {
            None
        }
    }

    async fn persist(&self, snapshot: &Snapshot) {
        let Some(store) = self.store() else {
            return;
        };
        let key = &self.inner.config.storage_key;
        match store.save(key, snapshot).await {
            Ok(()) => debug!("Saved revision {} under '{}'", snapshot.revision, key),
            Err(PersistenceError::StaleRevision {
                revision, stored, ..
            }) => {
                // The stored copy was never loaded or was written elsewhere.
                warn!(
                    "Stored revision {} under '{}' is ahead of {}; rebasing",
                    stored, key, revision
                );
                let mut rebased = Snapshot::default();
                self.inner.state.send_if_modified(|state| {
                    rebased = state.rebase(stored);
                    false
                });
                match store.save(key, &rebased).await {
                    Ok(()) => debug!("Saved revision {} under '{}'", rebased.revision, key),
                    Err(e) => warn!("Failed to persist form data under '{}': {}", key, e),
                }
            }
            Err(e) => warn!("Failed to persist form data under '{}': {}", key, e),
        }
    }

    async fn remove_stored(&self) {
        let Some(store) = self.store() else {
            return;
        };
        let key = &self.inner.config.storage_key;
        if let Err(e) = store.remove(key).await {
            warn!("Failed to remove stored form data under '{}': {}", key, e);
        }
    }

    fn ignored(&self, action: &str, reason: Ignored) -> Transition {
        debug!("{} ignored at step {}: {:?}", action, self.current_step(), reason);
        Transition::Ignored(reason)
    }

    fn superseded(&self, step: &Step) -> Transition {
        debug!(
            "Transition out of step '{}' superseded by another navigation",
            step.id()
        );
        Transition::Superseded
    }

    fn hook_failed(&self, step: &Step, hook_type: HookType, source: BoxError) -> WorkflowError {
        warn!("Hook '{}' failed in step '{}': {}", hook_type, step.id(), source);
        WorkflowError::HookError {
            step_id: step.id().clone(),
            hook_type,
            source,
        }
    }
}

/// Builder for constructing [`Wizard`] instances.
#[derive(Default)]
pub struct WizardBuilder {
    steps: Vec<Step>,
    config: WizardConfig,
    binding: Option<Arc<dyn FormBinding>>,
    store: Option<Arc<dyn PersistenceAdapter>>,
    on_complete: Option<Arc<dyn CompletionHandler>>,
    initial_data: FormData,
}

impl fmt::Debug for WizardBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardBuilder")
            .field("steps", &self.steps)
            .field("config", &self.config)
            .field("has_binding", &self.binding.is_some())
            .field("has_store", &self.store.is_some())
            .finish()
    }
}

impl WizardBuilder {
    /// Creates a new empty wizard builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step. Steps run in the order they are added.
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn config(mut self, config: WizardConfig) -> Self {
        self.config = config;
        self
    }

    pub fn allow_step_skipping(mut self, allow: bool) -> Self {
        self.config.allow_step_skipping = allow;
        self
    }

    pub fn persist_state(mut self, persist: bool) -> Self {
        self.config.persist_state = persist;
        self
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.config.storage_key = key.into();
        self
    }

    pub fn clear_storage_on_complete(mut self, clear: bool) -> Self {
        self.config.clear_storage_on_complete = clear;
        self
    }

    /// Sets the binding used for steps that declare fields.
    pub fn form_binding(mut self, binding: impl FormBinding + 'static) -> Self {
        self.binding = Some(Arc::new(binding));
        self
    }

    pub fn persistence(mut self, store: impl PersistenceAdapter + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn on_complete(mut self, handler: impl CompletionHandler + 'static) -> Self {
        self.on_complete = Some(Arc::new(handler));
        self
    }

    pub fn on_complete_with<F, Fut>(self, f: F) -> Self
    where
        F: Fn(FormData) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.on_complete(FnCompletion(f))
    }

    /// Form data to start from; values restored from storage take precedence.
    pub fn initial_data(mut self, data: FormData) -> Self {
        self.initial_data = data;
        self
    }

    /// Validates the configuration and restores stored form data.
    pub async fn build(self) -> Result<Wizard, WorkflowError> {
        if self.steps.is_empty() {
            return Err(WorkflowError::Configuration(
                "At least one step must be added".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id().as_str()) {
                return Err(WorkflowError::DuplicateStep(step.id().clone()));
            }
        }

        if self.binding.is_none() {
            if let Some(step) = self.steps.iter().find(|s| !s.field_names().is_empty()) {
                return Err(WorkflowError::Configuration(format!(
                    "Step '{}' declares fields but no form binding is configured",
                    step.id()
                )));
            }
        }

        let persisting = self.config.persist_state && self.store.is_some();
        if persisting && self.config.storage_key.trim().is_empty() {
            return Err(WorkflowError::Configuration(
                "Storage key must not be empty".to_string(),
            ));
        }

        let mut state = WizardState::new(self.steps.len());
        state.form_data = self.initial_data;

        if let (true, Some(store)) = (self.config.persist_state, &self.store) {
            let key = &self.config.storage_key;
            match store.load(key).await {
                Ok(Some(snapshot)) => {
                    state.restore(snapshot);
                    info!(
                        "Restored form data under '{}' at revision {}",
                        key,
                        state.revision()
                    );
                }
                Ok(None) => debug!("No stored form data under '{}'", key),
                Err(e) => warn!("Failed to load form data under '{}': {}", key, e),
            }
        }

        let (state, _) = watch::channel(state);
        Ok(Wizard {
            inner: Arc::new(Inner {
                steps: self.steps,
                config: self.config,
                gate: ValidationGate::new(self.binding),
                store: self.store,
                on_complete: self.on_complete,
                state,
                writes: Mutex::new(()),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn steps(count: usize) -> Vec<Step> {
        (0..count)
            .map(|i| Step::new(format!("step{i}"), format!("Step {i}")))
            .collect()
    }

    #[tokio::test]
    async fn test_builder_requires_steps() {
        let result = Wizard::builder().build().await;
        assert!(matches!(result, Err(WorkflowError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_builder_rejects_duplicate_ids() {
        let result = Wizard::builder()
            .step(Step::new("profile", "Profile"))
            .step(Step::new("profile", "Profile again"))
            .build()
            .await;
        assert!(matches!(result, Err(WorkflowError::DuplicateStep(id)) if id.as_str() == "profile"));
    }

    #[tokio::test]
    async fn test_builder_requires_binding_for_fields() {
        let result = Wizard::builder()
            .step(Step::new("profile", "Profile").fields(["name"]))
            .build()
            .await;
        match result {
            Err(WorkflowError::Configuration(msg)) => {
                assert_eq!(
                    msg,
                    "Step 'profile' declares fields but no form binding is configured"
                );
            }
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_initial_data_and_derived_flags() {
        let wizard = Wizard::builder()
            .steps(steps(2))
            .initial_data(FormData::new().with("role", json!("buyer")))
            .build()
            .await
            .expect("valid wizard");

        let state = wizard.state();
        assert!(state.is_first_step());
        assert!(!state.is_last_step());
        assert_eq!(state.total_steps, 2);
        assert_eq!(wizard.form_data().get("role"), Some(&json!("buyer")));
        assert_eq!(wizard.current().id().as_str(), "step0");
    }

    #[tokio::test]
    async fn test_set_can_go_next_and_revalidate() {
        let wizard = Wizard::builder()
            .step(Step::new("terms", "Terms").validate_with(|data: &FormData| data.contains("ok")))
            .step(Step::new("done", "Done"))
            .build()
            .await
            .expect("valid wizard");

        wizard.set_can_go_next(false);
        assert!(!wizard.state().can_go_next);

        wizard.update_form_data(FormData::new().with("ok", true)).await;
        assert_eq!(wizard.revalidate().await, GateOutcome::Passed);
        assert!(wizard.state().can_go_next);
    }

    #[tokio::test]
    async fn test_visibility_keeps_indices() {
        let wizard = Wizard::builder()
            .step(Step::new("role", "Role"))
            .step(
                Step::new("store", "Store")
                    .visible_when(|data| data.get("role") == Some(&json!("seller"))),
            )
            .step(Step::new("review", "Review"))
            .build()
            .await
            .expect("valid wizard");

        assert_eq!(wizard.visible_steps(), vec![0, 2]);
        assert!(!wizard.is_step_visible(1));
        assert!(!wizard.is_step_visible(9));

        wizard.update_form_data(FormData::new().with("role", "seller")).await;
        assert_eq!(wizard.visible_steps(), vec![0, 1, 2]);
        assert_eq!(wizard.total_steps(), 3);
    }

    #[tokio::test]
    async fn test_subscribers_see_moves() {
        let wizard = Wizard::builder()
            .steps(steps(3))
            .build()
            .await
            .expect("valid wizard");
        let mut rx = wizard.subscribe();

        assert_eq!(
            wizard.next_step().await.expect("no hook"),
            Transition::Moved { from: 0, to: 1 }
        );
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(rx.borrow_and_update().current_step, 1);

        assert_eq!(wizard.go_to_step(7), Transition::Ignored(Ignored::OutOfRange));
        assert!(!rx.has_changed().expect("sender alive"));
    }
}

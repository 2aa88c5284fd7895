//! Wizard state and its pure transitions.
//!
//! Nothing here awaits or performs I/O. The [`Wizard`](crate::Wizard) wraps
//! these transitions with validation, hooks and persistence.

use std::collections::BTreeSet;
use stepwise_core::{FormData, Snapshot};

/// Why a navigation action left the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// Target index outside `0..total_steps`.
    OutOfRange,
    /// Jump ahead to a step that was never reached while skipping is disabled.
    NotVisited,
    /// Target is already the current step.
    AlreadyCurrent,
    /// Another transition is still awaiting validation or a hook.
    Busy,
    /// Backwards from the first step.
    AtFirstStep,
    /// Skip requested on a step that is not optional.
    NotOptional,
    /// The wizard has already completed.
    AlreadyCompleted,
}

/// Observable state of a wizard.
///
/// `visited_steps` always contains `0` and `current_step`, and only grows until
/// the wizard is reset.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub current_step: usize,
    pub total_steps: usize,
    pub visited_steps: BTreeSet<usize>,
    pub form_data: FormData,
    pub is_loading: bool,
    pub can_go_next: bool,
    pub completed: bool,
    generation: u64,
    revision: u64,
}

/// Proof that a transition was started, carrying what it needs after awaiting.
#[derive(Debug, Clone)]
pub(crate) struct Ticket {
    pub from: usize,
    pub generation: u64,
    pub data: FormData,
}

impl WizardState {
    pub fn new(total_steps: usize) -> Self {
        Self {
            current_step: 0,
            total_steps,
            visited_steps: BTreeSet::from([0]),
            form_data: FormData::new(),
            is_loading: false,
            can_go_next: true,
            completed: false,
            generation: 0,
            revision: 0,
        }
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 >= self.total_steps
    }

    pub fn is_visited(&self, index: usize) -> bool {
        self.visited_steps.contains(&index)
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.form_data.merge(snapshot.data);
        self.revision = self.revision.max(snapshot.revision);
    }

    /// Arbitrary jump, subject to range and skip-ahead rules. Never validates.
    pub(crate) fn jump(&mut self, target: usize, allow_skipping: bool) -> Result<usize, Ignored> {
        if self.completed {
            return Err(Ignored::AlreadyCompleted);
        }
        if target >= self.total_steps {
            return Err(Ignored::OutOfRange);
        }
        if target == self.current_step {
            return Err(Ignored::AlreadyCurrent);
        }
        if !allow_skipping && target > self.current_step && !self.is_visited(target) {
            return Err(Ignored::NotVisited);
        }
        let from = self.current_step;
        self.enter(target);
        Ok(from)
    }

    /// Moves to `target` unconditionally. Callers guarantee it is in range.
    pub(crate) fn enter(&mut self, target: usize) {
        self.current_step = target;
        self.visited_steps.insert(target);
        self.can_go_next = true;
        self.generation += 1;
    }

    fn guard(&self) -> Result<(), Ignored> {
        if self.completed {
            return Err(Ignored::AlreadyCompleted);
        }
        if self.is_loading {
            return Err(Ignored::Busy);
        }
        Ok(())
    }

    /// Ticket for the current position without claiming the guard.
    pub(crate) fn observe(&self) -> Ticket {
        Ticket {
            from: self.current_step,
            generation: self.generation,
            data: self.form_data.clone(),
        }
    }

    fn claim(&mut self) -> Ticket {
        self.is_loading = true;
        self.observe()
    }

    /// Claims the re-entrancy guard for a forward transition.
    pub(crate) fn begin(&mut self) -> Result<Ticket, Ignored> {
        self.guard()?;
        Ok(self.claim())
    }

    pub(crate) fn begin_backward(&mut self) -> Result<Ticket, Ignored> {
        self.guard()?;
        if self.current_step == 0 {
            return Err(Ignored::AtFirstStep);
        }
        Ok(self.claim())
    }

    pub(crate) fn begin_skip(
        &mut self,
        is_optional: impl FnOnce(usize) -> bool,
    ) -> Result<Ticket, Ignored> {
        self.guard()?;
        if !is_optional(self.current_step) {
            return Err(Ignored::NotOptional);
        }
        Ok(self.claim())
    }

    /// Whether no navigation happened since `ticket` was issued.
    pub(crate) fn is_current(&self, ticket: &Ticket) -> bool {
        self.generation == ticket.generation
    }

    pub(crate) fn end(&mut self) {
        self.is_loading = false;
    }

    /// Shallow-merges `patch` and returns the snapshot to persist.
    pub(crate) fn merge(&mut self, patch: FormData) -> Snapshot {
        self.form_data.merge(patch);
        self.revision += 1;
        Snapshot::new(self.revision, self.form_data.clone())
    }

    /// Moves the revision past `stored` and returns the snapshot to write.
    pub(crate) fn rebase(&mut self, stored: u64) -> Snapshot {
        self.revision = self.revision.max(stored) + 1;
        Snapshot::new(self.revision, self.form_data.clone())
    }

    pub(crate) fn mark_completed(&mut self) {
        self.completed = true;
        self.is_loading = false;
    }

    /// Back to the initial position with empty data, starting a new session.
    ///
    /// Counters keep increasing so stale in-flight results and stale writes are
    /// still recognised afterwards. `is_loading` is left to the transition
    /// that set it.
    pub(crate) fn reset(&mut self) {
        let mut fresh = Self::new(self.total_steps);
        fresh.generation = self.generation + 1;
        fresh.revision = self.revision + 1;
        fresh.is_loading = self.is_loading;
        *self = fresh;
    }
}

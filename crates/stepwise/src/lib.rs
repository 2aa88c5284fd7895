//! # stepwise
//!
//! A multi-step wizard engine: an ordered list of steps, a validation gate on
//! every forward move, lifecycle hooks, optional steps that can be skipped,
//! visited-step tracking, and form data that survives a reload.
//!
//! ## Features
//!
//! - **Async gating**: field checks through a [`FormBinding`] and a per-step
//!   [`Validator`], both awaited before moving forwards
//! - **Lifecycle hooks**: `before_next` / `before_previous` with errors
//!   surfaced as [`WorkflowError::HookError`]
//! - **Re-entrancy guard**: a double click cannot advance twice
//! - **Persistence**: best-effort save/restore through a [`PersistenceAdapter`]
//!   ([`MemoryStore`], [`JsonFileStore`])
//! - **Observable**: renderers [`subscribe`](Wizard::subscribe) to state changes
//!
//! ## Quick Start
//!
//! ```rust
//! use stepwise::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), WorkflowError> {
//! let store = MemoryStore::new();
//!
//! let wizard = Wizard::builder()
//!     .step(Step::new("profile", "Profile").fields(["name"]))
//!     .step(Step::new("newsletter", "Newsletter").optional())
//!     .step(Step::new("review", "Review"))
//!     .form_binding(RequiredFields)
//!     .persistence(store.clone())
//!     .on_complete_with(|data: FormData| async move {
//!         println!("submitted {} fields", data.len());
//!         Ok::<(), BoxError>(())
//!     })
//!     .build()
//!     .await?;
//!
//! wizard.update_form_data(FormData::new().with("name", "Alice")).await;
//! wizard.next_step().await?;
//! wizard.skip_step().await?;
//! assert_eq!(wizard.next_step().await?, Transition::Completed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Validation failures are not errors; they come back as
//! [`Transition::Blocked`]. Hook failures are:
//!
//! ```rust
//! use stepwise::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let wizard = Wizard::builder()
//!     .step(Step::new("payment", "Payment").on_before_next_with(|_data: FormData| async {
//!         Err::<(), BoxError>("card declined".into())
//!     }))
//!     .step(Step::new("done", "Done"))
//!     .build()
//!     .await
//!     .expect("valid wizard");
//!
//! match wizard.next_step().await {
//!     Err(WorkflowError::HookError { step_id, hook_type, source }) => {
//!         eprintln!("{} failed in {}: {}", hook_type, step_id, source);
//!     }
//!     other => eprintln!("unexpected: {:?}", other),
//! }
//! assert_eq!(wizard.current_step(), 0);
//! # }
//! ```

mod config;
mod gate;
mod persistence;
mod state;
mod wizard;

// Re-export core types
pub use stepwise_core::*;

pub use config::{WizardConfig, DEFAULT_STORAGE_KEY};
pub use gate::{GateOutcome, RequiredFields, ValidationGate};
pub use persistence::{JsonFileStore, MemoryStore};
pub use state::{Ignored, WizardState};
pub use wizard::{Transition, Wizard, WizardBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        BoxError, FieldName, FormBinding, FormData, GateOutcome, HookType, Ignored,
        JsonFileStore, MemoryStore, PersistenceAdapter, RequiredFields, Step, StepHook, StepId,
        Transition, Validator, Wizard, WizardBuilder, WizardConfig, WizardState, WorkflowError,
    };
}

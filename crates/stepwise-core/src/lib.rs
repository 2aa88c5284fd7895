//! Core traits and types for the stepwise wizard engine.
//!
//! This crate provides the passive pieces of a wizard without runtime
//! dependencies. Form bindings, storage backends and step libraries should
//! depend on this crate.
//!
//! # Core Types
//!
//! - [`Step`] - Descriptor for one stage of a wizard
//! - [`FormData`] - Data accumulated across steps
//! - [`Snapshot`] - Revision-stamped form data as handed to storage
//! - [`WorkflowError`] - Errors surfaced to the wizard's caller
//! - [`PersistenceError`] - Errors raised by storage backends
//!
//! # Capability Traits
//!
//! - [`Validator`] - Step-level predicate
//! - [`StepHook`] - Runs before a step is left
//! - [`CompletionHandler`] - Runs once the last step is left
//! - [`FormBinding`] - Field-level validation
//! - [`PersistenceAdapter`] - Saves and restores form data

mod error;
mod form;
mod step;
mod traits;

pub use error::{BoxError, HookType, PersistenceError, WorkflowError};
pub use form::{FieldName, FormData, Snapshot};
pub use step::{Step, StepId};
pub use traits::{
    AsyncFnValidator, CompletionHandler, FnCompletion, FnHook, FnValidator, FormBinding,
    PersistenceAdapter, StepHook, Validator,
};

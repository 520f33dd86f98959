//! # newsdesk-forms
//!
//! The form pipeline: a draft is checked against a declarative schema, then
//! persisted through a guard that debounces and deduplicates submissions.
//! After success a best-effort notification is fired and the form shows its
//! success state.
//!
//! ## Modules
//!
//! - [`record`] - [`FormRecord`], the draft being edited
//! - [`validation`] - Schemas, rules, and the pure [`validate`] function
//! - [`guard`] - [`SubmissionGuard`]: debounce, in-flight exclusivity, cancellation
//! - [`controller`] - [`FormController`] and the [`FormHandler`] trait
//! - [`forms`] - The ad request, service request, signup, login, admin
//!   notification, and profile forms

pub mod controller;
pub mod forms;
pub mod guard;
pub mod record;
pub mod validation;

pub use controller::{FormController, FormHandler, FormSnapshot, Phase, SubmitOutcome};
pub use guard::{GuardRejection, Outcome, SubmissionGuard, SubmissionToken};
pub use record::FormRecord;
pub use validation::{
    validate, validate_field, FieldError, FieldErrors, FieldRule, Rule, RuleKind, Schema,
    ValidationResult,
};

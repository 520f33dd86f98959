//! The form controller.
//!
//! A [`FormController`] owns one form's draft and drives it through
//! `Editing -> Submitting -> Success | Editing(error)`:
//!
//! 1. Consent checkboxes named by the handler must be checked, otherwise the
//!    banner shows "You must agree to the terms and conditions".
//! 2. The record must pass the handler's [`Schema`]; failures become
//!    field-level errors and nothing is persisted.
//! 3. [`FormHandler::persist`] runs inside the [`SubmissionGuard`].
//! 4. On success the form shows `Success`, reverts to a fresh draft after the
//!    success display window, and spawns the handler's notification without
//!    awaiting it.
//! 5. On failure the draft is kept, the banner shows the handler's failure
//!    message, and the guard is reset so a retry is not debounced.
//!
//! Guard rejections leave the form state alone. Everything a handler needs
//! (gateway, auth, notifier) is injected into the handler itself; the
//! translator is injected here.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use newsdesk_core::logging::form_span;
use newsdesk_core::settings::FormSettings;
use newsdesk_core::{ErrorCode, NewsdeskError, NewsdeskResult, Translator};
use newsdesk_db::Value;
use newsdesk_notify::DetachedNotification;
use tracing::Instrument;

use crate::guard::{GuardRejection, Outcome, SubmissionGuard};
use crate::record::FormRecord;
use crate::validation::{self, FieldErrors, Schema};

/// Banner shown when a consent checkbox is unchecked.
pub const CONSENT_MESSAGE: &str = "You must agree to the terms and conditions";

/// Banner shown when persistence fails and the handler has nothing better.
pub const GENERIC_FAILURE: &str = "Failed to submit request. Please try again.";

/// What a concrete form contributes to the pipeline.
#[async_trait]
pub trait FormHandler: Send + Sync + 'static {
    /// What a successful submission produces.
    type Output: Send + 'static;

    /// Name used in logs and spans.
    fn name(&self) -> &'static str;

    fn schema(&self) -> &Schema;

    /// The empty draft shown on first render and after a successful submit.
    fn initial(&self) -> FormRecord;

    /// Checkbox fields that must be checked before validation runs.
    fn consent_fields(&self) -> &[&'static str] {
        &[]
    }

    /// Persists a validated record.
    async fn persist(&self, record: &FormRecord) -> NewsdeskResult<Self::Output>;

    /// A secondary notification to fire after a successful persist.
    fn notification(&self, _record: &FormRecord, _output: &Self::Output) -> Option<DetachedNotification> {
        None
    }

    /// The msgid shown in the banner when [`persist`](Self::persist) fails.
    fn failure_message(&self, _error: &NewsdeskError) -> String {
        GENERIC_FAILURE.to_string()
    }
}

/// Maps auth failures to their specific user-facing msgid.
pub fn auth_failure_message(error: &NewsdeskError) -> String {
    ErrorCode::classify(error).message().to_string()
}

/// Where the form is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Editing,
    Submitting,
    Success,
}

/// Result of [`FormController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome<T> {
    /// Persisted; the form now shows success.
    Submitted(T),
    /// A consent checkbox was unchecked.
    ConsentMissing,
    /// Validation failed; nothing was persisted.
    Invalid(FieldErrors),
    /// Persistence failed; the payload is the translated banner.
    Failed(String),
    /// The guard did not let the call through, or discarded its result.
    Ignored(GuardRejection),
    /// The form is showing its success state.
    NotEditing,
}

/// A point-in-time copy of the form's UI state, translated.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSnapshot {
    pub phase: Phase,
    pub record: FormRecord,
    pub field_errors: BTreeMap<String, String>,
    pub error: Option<String>,
}

#[derive(Debug)]
struct FormState {
    phase: Phase,
    record: FormRecord,
    field_errors: FieldErrors,
    error: Option<String>,
    generation: u64,
    in_flight: Option<u64>,
}

impl FormState {
    fn restart(&mut self, initial: FormRecord) {
        self.phase = Phase::Editing;
        self.record = initial;
        self.field_errors.clear();
        self.error = None;
        self.generation += 1;
        self.in_flight = None;
    }
}

/// Returns a form to `Editing` if its submission is dropped before settling.
struct InFlightSubmission {
    state: Arc<Mutex<FormState>>,
    submission: u64,
}

impl Drop for InFlightSubmission {
    fn drop(&mut self) {
        let mut state = self.state.lock().expect("form state lock poisoned");
        if state.in_flight == Some(self.submission) {
            state.in_flight = None;
            if state.phase == Phase::Submitting {
                state.phase = Phase::Editing;
            }
        }
    }
}

/// Drives one form instance.
pub struct FormController<H: FormHandler> {
    handler: Arc<H>,
    translator: Arc<dyn Translator>,
    guard: SubmissionGuard,
    success_display: Duration,
    submissions: AtomicU64,
    state: Arc<Mutex<FormState>>,
}

impl<H: FormHandler> FormController<H> {
    /// Creates a controller showing the handler's initial draft.
    pub fn new(handler: H, translator: Arc<dyn Translator>, settings: &FormSettings) -> Self {
        let record = handler.initial();
        Self {
            handler: Arc::new(handler),
            translator,
            guard: SubmissionGuard::new(settings.debounce()),
            success_display: settings.success_display(),
            submissions: AtomicU64::new(0),
            state: Arc::new(Mutex::new(FormState {
                phase: Phase::Editing,
                record,
                field_errors: FieldErrors::default(),
                error: None,
                generation: 0,
                in_flight: None,
            })),
        }
    }

    /// The form-specific handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().expect("form state lock poisoned")
    }

    /// Where the form is in its submit lifecycle.
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// A copy of the current draft.
    pub fn record(&self) -> FormRecord {
        self.lock().record.clone()
    }

    /// The banner error, translated.
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// The translated error for one field.
    pub fn field_error(&self, field: &str) -> Option<String> {
        self.lock()
            .field_errors
            .get(field)
            .map(|e| e.translate(self.translator.as_ref()))
    }

    /// The whole form state, read under one lock.
    pub fn snapshot(&self) -> FormSnapshot {
        let state = self.lock();
        FormSnapshot {
            phase: state.phase,
            record: state.record.clone(),
            field_errors: state.field_errors.translate(self.translator.as_ref()),
            error: state.error.clone(),
        }
    }

    /// Whether a submission currently holds the guard.
    pub fn is_submitting(&self) -> bool {
        self.guard.is_submitting()
    }

    /// Sets a field and clears that field's error and the banner.
    pub fn set_field(&self, field: &str, value: impl Into<Value>) {
        let mut state = self.lock();
        state.record.set(field, value);
        state.field_errors.remove(field);
        state.error = None;
    }

    /// Sets a boolean field, with the same clearing as [`set_field`](Self::set_field).
    pub fn set_checkbox(&self, field: &str, checked: bool) {
        self.set_field(field, checked);
    }

    /// Adds or removes one value of a checkbox-group field.
    pub fn toggle_choice(&self, field: &str, value: &str, checked: bool) {
        let mut state = self.lock();
        state.record.toggle_choice(field, value, checked);
        state.field_errors.remove(field);
        state.error = None;
    }

    /// Re-validates one field (on blur), returning its translated error.
    pub fn validate_field(&self, field: &str) -> Option<String> {
        let mut state = self.lock();
        match validation::validate_field(self.handler.schema(), field, &state.record) {
            Some(error) => {
                let message = error.translate(self.translator.as_ref());
                state.field_errors.remove(field);
                state.field_errors.insert(field, error);
                Some(message)
            }
            None => {
                state.field_errors.remove(field);
                None
            }
        }
    }

    /// Force-unlocks a form stuck in `Submitting`. The draft is kept and any
    /// pending result will be discarded.
    pub fn reset_guard(&self) {
        self.guard.reset();
        let mut state = self.lock();
        state.in_flight = None;
        if state.phase == Phase::Submitting {
            state.phase = Phase::Editing;
        }
    }

    /// Discards the draft and returns to a fresh `Editing` state.
    pub fn reset(&self) {
        self.guard.reset();
        let initial = self.handler.initial();
        self.lock().restart(initial);
    }

    /// Runs the submit pipeline.
    pub async fn submit(&self) -> SubmitOutcome<H::Output> {
        let submission = self.submissions.fetch_add(1, Ordering::Relaxed) + 1;
        let span = form_span(self.handler.name(), submission);
        self.run_submit(submission).instrument(span).await
    }

    async fn run_submit(&self, submission: u64) -> SubmitOutcome<H::Output> {
        let _in_flight = InFlightSubmission {
            state: Arc::clone(&self.state),
            submission,
        };
        let record = match self.prepare() {
            Ok(record) => record,
            Err(outcome) => return outcome,
        };

        let handler = Arc::clone(&self.handler);
        let state = Arc::clone(&self.state);
        let draft = record.clone();
        let outcome = self
            .guard
            .submit(|| async move {
                {
                    let mut state = state.lock().expect("form state lock poisoned");
                    state.phase = Phase::Submitting;
                    state.in_flight = Some(submission);
                }
                handler.persist(&draft).await
            })
            .await;

        match outcome {
            Outcome::Succeeded(output) => {
                self.succeed(&record, &output);
                SubmitOutcome::Submitted(output)
            }
            Outcome::Failed(err) => SubmitOutcome::Failed(self.fail(&err)),
            rejected => {
                let rejection = rejected
                    .rejection()
                    .unwrap_or(GuardRejection::Cancelled);
                tracing::debug!(?rejection, "submission ignored");
                SubmitOutcome::Ignored(rejection)
            }
        }
    }

    /// Consent and validation. Skipped while a call is in flight so a
    /// rejected resubmit cannot disturb the state. A `Submitting` phase with
    /// nothing pending in the guard is stale and is validated like `Editing`.
    fn prepare(&self) -> Result<FormRecord, SubmitOutcome<H::Output>> {
        let mut state = self.lock();
        match state.phase {
            Phase::Success => return Err(SubmitOutcome::NotEditing),
            Phase::Submitting if self.guard.is_submitting() => {
                return Ok(state.record.clone());
            }
            Phase::Submitting => {
                state.phase = Phase::Editing;
                state.in_flight = None;
            }
            Phase::Editing => {}
        }
        state.error = None;

        let consent_missing = self
            .handler
            .consent_fields()
            .iter()
            .any(|field| !state.record.is_checked(field));
        if consent_missing {
            state.error = Some(self.translator.gettext(CONSENT_MESSAGE));
            tracing::debug!("consent missing");
            return Err(SubmitOutcome::ConsentMissing);
        }

        match validation::validate(self.handler.schema(), &state.record) {
            Ok(record) => {
                state.field_errors.clear();
                Ok(record)
            }
            Err(errors) => {
                tracing::debug!(
                    fields = ?errors.iter().map(|(f, e)| (f, e.kind().code())).collect::<Vec<_>>(),
                    "validation failed"
                );
                state.field_errors = errors.clone();
                Err(SubmitOutcome::Invalid(errors))
            }
        }
    }

    fn succeed(&self, record: &FormRecord, output: &H::Output) {
        let generation = {
            let mut state = self.lock();
            state.phase = Phase::Success;
            state.in_flight = None;
            state.field_errors.clear();
            state.error = None;
            state.generation += 1;
            state.generation
        };
        tracing::info!("submission succeeded");

        let state = Arc::clone(&self.state);
        let initial = self.handler.initial();
        let delay = self.success_display;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = state.lock().expect("form state lock poisoned");
            if state.generation == generation && state.phase == Phase::Success {
                state.restart(initial);
            }
        });

        if let Some(notification) = self.handler.notification(record, output) {
            drop(notification.spawn());
        }
    }

    fn fail(&self, err: &NewsdeskError) -> String {
        tracing::error!(
            error = %err,
            code = %ErrorCode::classify(err),
            "submission failed"
        );
        let message = self
            .translator
            .gettext(&self.handler.failure_message(err));
        self.guard.reset();
        let mut state = self.lock();
        state.phase = Phase::Editing;
        state.in_flight = None;
        state.error = Some(message.clone());
        message
    }
}

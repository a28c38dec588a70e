//! Binds field edits to validation, step sequencing and draft persistence

use super::controller::{FlowPosition, StepController, StepTransition};
use super::write_behind::WriteBehind;
use crate::draft::{DraftSnapshot, DraftStore};
use crate::error::{ConfigurationError, FlowError, SubmissionError};
use crate::schema::{SchemaRegistry, ValidationMode, ValidationResult};
use crate::session::Identity;
use crate::state::{FormDraft, StepKey};
use crate::submission::{RegistrationApplication, SubmissionReceipt, Submitter};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient message for the user; not part of the flow state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// The action that produced this notice can be tried again
    pub retryable: bool,
}

impl Notice {
    fn new(kind: NoticeKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// The collaborator accepted the application; the draft is gone
    Submitted(SubmissionReceipt),
    /// A step is not completed or no longer validates; the flow moved there
    Incomplete {
        step: StepKey,
        result: ValidationResult,
    },
    /// The collaborator failed; the draft is kept for a retry
    Failed(SubmissionError),
    AlreadySubmitted,
}

/// The registration flow for one session.
///
/// Sole owner of the draft: every mutation goes through this type, one
/// event at a time.
pub struct RegistrationFlow {
    identity: Identity,
    registry: Arc<SchemaRegistry>,
    controller: StepController,
    draft: FormDraft,
    store: DraftStore,
    results: HashMap<StepKey, ValidationResult>,
    /// Steps that have been through a full check and keep being checked fully
    strict: HashSet<StepKey>,
    write_behind: WriteBehind,
    notice: Option<Notice>,
}

impl RegistrationFlow {
    /// Mount the flow for `identity`, resuming any stored draft
    pub fn start(
        identity: Identity,
        registry: Arc<SchemaRegistry>,
        mut store: DraftStore,
        flush_latency: Duration,
    ) -> Result<Self, FlowError> {
        if !identity.role().can_register() {
            return Err(FlowError::AccessDenied {
                role: identity.role(),
            });
        }

        let snapshot = store.load();
        let resumed = !snapshot.is_empty();
        let DraftSnapshot {
            mut draft,
            mut progress,
            ..
        } = snapshot;

        let dropped = draft.retain_declared(|key| registry.contains(key));
        if !dropped.is_empty() {
            tracing::warn!(?dropped, "Ignoring stored sections for undeclared steps");
        }

        // A completion mark only stands if the step still passes full validation
        let mut stale = Vec::new();
        for key in progress.completed.iter().copied() {
            if registry.contains(key)
                && !registry
                    .validate_draft(key, &draft, ValidationMode::Full)?
                    .is_valid()
            {
                stale.push(key);
            }
        }
        for key in &stale {
            progress.completed.remove(key);
        }
        if !stale.is_empty() {
            tracing::warn!(?stale, "Stored steps no longer validate");
        }

        let controller = StepController::restore(registry.step_keys(), progress);

        let mut results = HashMap::new();
        for key in draft.keys() {
            results.insert(
                key,
                registry.validate_draft(key, &draft, ValidationMode::Partial)?,
            );
        }

        tracing::info!(
            user = identity.user_id(),
            key = store.key(),
            step = controller.current_index(),
            resumed,
            "Registration flow started"
        );

        Ok(Self {
            identity,
            registry,
            controller,
            draft,
            store,
            results,
            strict: HashSet::new(),
            write_behind: WriteBehind::new(flush_latency),
            notice: None,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn controller(&self) -> &StepController {
        &self.controller
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn position(&self) -> FlowPosition {
        self.controller.position()
    }

    pub fn current_step(&self) -> StepKey {
        self.controller.current_key()
    }

    /// Current value of a field; empty when never set
    pub fn value(&self, step: StepKey, field: &str) -> &str {
        self.draft().value(step, field).unwrap_or("")
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.write_behind.is_dirty()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Update one field and refresh its step's live validation
    pub fn set_field(&mut self, step: StepKey, field: &str, value: &str) -> Result<(), FlowError> {
        if self.controller.is_submitted() {
            tracing::debug!(%step, field, "Ignoring edit after submission");
            return Ok(());
        }
        if !self.registry.contains(step) {
            return Err(ConfigurationError::UnknownStep(step.to_string()).into());
        }

        self.draft.set_field(step, field, value)?;
        let mode = if self.strict.contains(&step) {
            ValidationMode::Full
        } else {
            ValidationMode::Partial
        };
        let result = self.registry.validate_draft(step, &self.draft, mode)?;
        self.results.insert(step, result);
        self.write_behind.mark_dirty(Instant::now());
        Ok(())
    }

    /// Messages for `field` from the most recent validation of `step`
    pub fn get_field_error(&self, step: StepKey, field: &str) -> Option<&[String]> {
        self.results
            .get(&step)
            .and_then(|result| result.errors_for(field))
    }

    /// Most recent validation result for `step`
    pub fn step_result(&self, step: StepKey) -> Option<&ValidationResult> {
        self.results.get(&step)
    }

    /// Whether the draft's slice for `step` passes full validation
    pub fn is_step_valid(&self, step: StepKey) -> Result<bool, FlowError> {
        Ok(self
            .registry
            .validate_draft(step, &self.draft, ValidationMode::Full)?
            .is_valid())
    }

    /// Fully validate `step` and keep the result for field error lookups
    pub fn validate_step(&mut self, step: StepKey) -> Result<&ValidationResult, FlowError> {
        let result = self
            .registry
            .validate_draft(step, &self.draft, ValidationMode::Full)?;
        self.strict.insert(step);
        self.results.insert(step, result);
        Ok(&self.results[&step])
    }

    /// Advance past the current step if it validates
    pub fn next(&mut self) -> Result<StepTransition, FlowError> {
        if self.controller.is_submitted() {
            return Ok(StepTransition::Finished);
        }
        let step = self.controller.current_key();
        let result = self.validate_step(step)?.clone();
        let transition = self.controller.next(&result);
        match transition {
            StepTransition::Blocked => tracing::debug!(
                %step,
                errors = result.error_count(),
                "Step blocked by validation"
            ),
            other => tracing::info!(%step, ?other, "Step completed"),
        }
        self.flush();
        Ok(transition)
    }

    pub fn previous(&mut self) -> StepTransition {
        let transition = self.controller.previous();
        if let StepTransition::Moved(index) = transition {
            tracing::debug!(index, "Moved back");
            self.flush();
        }
        transition
    }

    pub fn go_to(&mut self, index: usize) -> Result<StepTransition, FlowError> {
        let transition = self.controller.go_to(index)?;
        if let StepTransition::Moved(index) = transition {
            tracing::debug!(index, "Jumped to step");
            self.flush();
        }
        Ok(transition)
    }

    /// Hand the completed draft to `submitter`.
    ///
    /// On success the flow becomes submitted and the stored draft is cleared.
    /// On failure the draft stays, both in memory and in the store.
    pub async fn submit(&mut self, submitter: &dyn Submitter) -> Result<SubmitOutcome, FlowError> {
        if self.controller.is_submitted() {
            return Ok(SubmitOutcome::AlreadySubmitted);
        }

        let steps = self.controller.steps().to_vec();
        for (index, step) in steps.into_iter().enumerate() {
            let result = self.validate_step(step)?.clone();
            if result.is_valid() && self.controller.is_completed(step) {
                continue;
            }
            if index <= self.controller.max_reachable() {
                self.controller.go_to(index)?;
            }
            self.notice = Some(Notice::new(
                NoticeKind::Error,
                format!(
                    "{} is incomplete",
                    self.registry.definition(step)?.label
                ),
                false,
            ));
            self.flush();
            return Ok(SubmitOutcome::Incomplete { step, result });
        }

        // The draft must be durable before it leaves our hands
        self.flush();
        let application = RegistrationApplication::assemble(self.identity.user_id(), &self.draft);

        match submitter.submit(&application).await {
            Ok(receipt) => {
                self.controller.mark_submitted();
                self.store.clear();
                self.draft = FormDraft::new();
                self.results.clear();
                self.strict.clear();
                self.write_behind.clear();
                tracing::info!(
                    application_id = %receipt.application_id,
                    reference = %receipt.reference,
                    "Registration submitted"
                );
                self.notice = Some(Notice::new(
                    NoticeKind::Success,
                    format!("Registration submitted (reference {})", receipt.reference),
                    false,
                ));
                Ok(SubmitOutcome::Submitted(receipt))
            }
            Err(error) => {
                tracing::warn!(error = %error, "Submission failed, draft kept");
                let mut message = format!("Submission failed: {error}.");
                if self.store.is_degraded() {
                    message.push_str(" Your draft is only held in memory; do not quit.");
                }
                self.notice = Some(Notice::new(NoticeKind::Error, message, true));
                Ok(SubmitOutcome::Failed(error))
            }
        }
    }

    /// Save the current draft and progress immediately
    pub fn flush(&mut self) {
        self.write_behind.clear();
        if self.controller.is_submitted() {
            return;
        }
        let snapshot = DraftSnapshot::new(self.draft.clone(), self.controller.state().clone());
        self.store.save(&snapshot);
    }

    /// Save if the oldest unsaved edit has waited long enough. Returns true if saved.
    pub fn flush_if_due(&mut self, now: Instant) -> bool {
        if self.write_behind.is_due(now) {
            self.flush();
            true
        } else {
            false
        }
    }

    /// Persist outstanding edits before the session goes away
    pub fn teardown(&mut self) {
        if self.write_behind.is_dirty() {
            self.flush();
        }
    }
}

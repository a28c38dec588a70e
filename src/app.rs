//! Application state and key handling

use crate::error::{FlowError, SubmissionError};
use crate::flow::{RegistrationFlow, StepTransition, SubmitOutcome};
use crate::state::{FieldEdit, FieldSpec, StepData, StepKey};
use crate::submission::{SubmissionReceipt, Submitter};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;

/// Main application struct
pub struct App {
    /// The registration flow being edited
    pub flow: RegistrationFlow,
    /// Collaborator that receives completed applications
    submitter: Box<dyn Submitter>,
    /// Index of the focused field within the current step
    pub active_field: usize,
    /// One-line feedback for the last key action
    pub status_message: Option<String>,
    /// Receipt of the accepted application
    pub receipt: Option<SubmissionReceipt>,
    /// Whether the app should quit
    quit: bool,
}

impl App {
    pub fn new(flow: RegistrationFlow, submitter: Box<dyn Submitter>) -> Self {
        Self {
            flow,
            submitter,
            active_field: 0,
            status_message: None,
            receipt: None,
            quit: false,
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Field descriptors of the step on screen
    pub fn current_fields(&self) -> &'static [FieldSpec] {
        StepData::field_specs_for(self.flow.current_step())
    }

    pub fn active_spec(&self) -> Option<&'static FieldSpec> {
        self.current_fields().get(self.active_field)
    }

    /// Periodic work between key events
    pub fn tick(&mut self, now: Instant) {
        if self.flow.flush_if_due(now) {
            tracing::trace!("Write-behind flush");
        }
    }

    /// Persist everything before exit
    pub fn shutdown(&mut self) {
        self.flow.teardown();
    }

    /// Handle a key event
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && key.code == KeyCode::Char('c') {
            self.quit = true;
            return Ok(());
        }

        if self.flow.controller().is_submitted() {
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter) {
                self.quit = true;
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Char('s') if ctrl => {
                self.flow.flush();
                self.status_message = Some("Draft saved".to_string());
            }
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_previous(),
            KeyCode::Enter => self.advance().await?,
            KeyCode::Esc => {
                if self.flow.notice().is_some() {
                    self.flow.dismiss_notice();
                } else if let StepTransition::Moved(_) = self.flow.previous() {
                    self.on_step_changed();
                }
            }
            KeyCode::F(n @ 1..=5) => self.jump_to(usize::from(n) - 1)?,
            KeyCode::Backspace => self.edit(FieldEdit::Pop)?,
            KeyCode::Delete => self.edit(FieldEdit::Clear)?,
            KeyCode::Char(c) if !ctrl => self.edit(FieldEdit::Push(c))?,
            _ => {}
        }
        Ok(())
    }

    fn focus_next(&mut self) {
        let count = self.current_fields().len();
        if count > 0 {
            self.active_field = (self.active_field + 1) % count;
        }
    }

    fn focus_previous(&mut self) {
        let count = self.current_fields().len();
        if count > 0 {
            self.active_field = (self.active_field + count - 1) % count;
        }
    }

    fn edit(&mut self, edit: FieldEdit) -> Result<()> {
        let Some(spec) = self.active_spec() else {
            return Ok(());
        };
        let step = self.flow.current_step();
        let value = edit.apply(self.flow.value(step, spec.name));
        self.flow.set_field(step, spec.name, &value)?;
        Ok(())
    }

    async fn advance(&mut self) -> Result<()> {
        match self.flow.next()? {
            StepTransition::Advanced(_) => self.on_step_changed(),
            StepTransition::Blocked => {
                let step = self.flow.current_step();
                let count = self.flow.step_result(step).map_or(0, |r| r.error_count());
                self.status_message = Some(format!("Fix {count} error(s) to continue"));
                self.focus_first_error(step);
            }
            StepTransition::ReadyToSubmit => self.submit().await?,
            StepTransition::Moved(_) | StepTransition::Unchanged | StepTransition::Finished => {}
        }
        Ok(())
    }

    async fn submit(&mut self) -> Result<()> {
        self.status_message = Some("Submitting...".to_string());
        match self.flow.submit(self.submitter.as_ref()).await? {
            SubmitOutcome::Submitted(receipt) => {
                self.status_message = None;
                self.receipt = Some(receipt);
            }
            SubmitOutcome::Incomplete { step, result } => {
                self.on_step_changed();
                self.status_message = Some(match result.error_count() {
                    0 => "Confirm this step to submit".to_string(),
                    count => format!("Fix {count} error(s) to submit"),
                });
                self.focus_first_error(step);
            }
            SubmitOutcome::Failed(error) => {
                self.status_message = match error {
                    SubmissionError::Rejected(_) => {
                        Some("Review the application before retrying".to_string())
                    }
                    _ => None,
                };
            }
            SubmitOutcome::AlreadySubmitted => {}
        }
        Ok(())
    }

    fn jump_to(&mut self, index: usize) -> Result<()> {
        match self.flow.go_to(index) {
            Ok(StepTransition::Moved(_)) => self.on_step_changed(),
            Ok(_) => {}
            Err(FlowError::StepLocked { max_reachable, .. }) => {
                self.status_message = Some(format!(
                    "Complete the earlier steps first (F{} is the furthest available)",
                    max_reachable + 1
                ));
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn on_step_changed(&mut self) {
        self.active_field = 0;
        self.status_message = None;
    }

    fn focus_first_error(&mut self, step: StepKey) {
        if let Some(index) = StepData::field_specs_for(step)
            .iter()
            .position(|spec| self.flow.get_field_error(step, spec.name).is_some())
        {
            self.active_field = index;
        }
    }
}

//! Step sequencing for the registration flow

use crate::error::FlowError;
use crate::schema::ValidationResult;
use crate::state::{StepKey, StepState};

/// Where the flow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPosition {
    Step(usize),
    Submitted,
}

/// Result of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTransition {
    /// The current step passed and the flow moved forward to this index
    Advanced(usize),
    /// The current step failed validation; nothing changed
    Blocked,
    /// The last step passed; the flow waits for submission
    ReadyToSubmit,
    /// The flow moved backwards or jumped to this index
    Moved(usize),
    /// The request was allowed but left the index where it was
    Unchanged,
    /// The flow is already submitted
    Finished,
}

/// Finite-state sequencing across the ordered steps.
///
/// Single writer of [`StepState`]. A step is only ever marked completed by
/// [`StepController::next`] with a valid result.
#[derive(Debug, Clone)]
pub struct StepController {
    steps: Vec<StepKey>,
    state: StepState,
    submitted: bool,
}

impl StepController {
    /// Fresh controller at the first step. `steps` must not be empty.
    pub fn new(steps: Vec<StepKey>) -> Self {
        debug_assert!(!steps.is_empty(), "a flow needs at least one step");
        Self {
            steps,
            state: StepState::default(),
            submitted: false,
        }
    }

    /// Controller resumed from persisted progress.
    ///
    /// Completion marks for undeclared steps are dropped and the current index
    /// is clamped to the furthest reachable step.
    pub fn restore(steps: Vec<StepKey>, mut state: StepState) -> Self {
        state.completed.retain(|key| steps.contains(key));
        let mut controller = Self::new(steps);
        controller.state = state;
        let max = controller.max_reachable();
        if controller.state.current > max {
            tracing::warn!(
                stored = controller.state.current,
                clamped = max,
                "Restored step index out of range"
            );
            controller.state.current = max;
        }
        controller
    }

    pub fn position(&self) -> FlowPosition {
        if self.submitted {
            FlowPosition::Submitted
        } else {
            FlowPosition::Step(self.state.current)
        }
    }

    pub fn current_index(&self) -> usize {
        self.state.current
    }

    pub fn current_key(&self) -> StepKey {
        self.steps[self.state.current]
    }

    pub fn steps(&self) -> &[StepKey] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_last(&self) -> bool {
        self.state.current + 1 == self.steps.len()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn is_completed(&self, key: StepKey) -> bool {
        self.state.is_completed(key)
    }

    pub fn all_completed(&self) -> bool {
        self.steps.iter().all(|key| self.state.is_completed(*key))
    }

    pub fn state(&self) -> &StepState {
        &self.state
    }

    /// Index of the furthest completed step
    pub fn highest_completed(&self) -> Option<usize> {
        self.steps
            .iter()
            .rposition(|key| self.state.is_completed(*key))
    }

    /// Furthest index `go_to` may target
    pub fn max_reachable(&self) -> usize {
        let last = self.steps.len() - 1;
        self.highest_completed().map_or(0, |h| (h + 1).min(last))
    }

    /// Advance past the current step if `result` is valid
    pub fn next(&mut self, result: &ValidationResult) -> StepTransition {
        if self.submitted {
            return StepTransition::Finished;
        }
        if !result.is_valid() {
            return StepTransition::Blocked;
        }

        let key = self.current_key();
        self.state.completed.insert(key);
        if self.is_last() {
            StepTransition::ReadyToSubmit
        } else {
            self.state.current += 1;
            StepTransition::Advanced(self.state.current)
        }
    }

    /// Step back one; completion marks are kept
    pub fn previous(&mut self) -> StepTransition {
        if self.submitted {
            return StepTransition::Finished;
        }
        if self.state.current == 0 {
            return StepTransition::Unchanged;
        }
        self.state.current -= 1;
        StepTransition::Moved(self.state.current)
    }

    /// Jump to `index`, which may be at most one past the furthest completed step
    pub fn go_to(&mut self, index: usize) -> Result<StepTransition, FlowError> {
        if self.submitted {
            return Ok(StepTransition::Finished);
        }
        let max_reachable = self.max_reachable();
        if index >= self.steps.len() || index > max_reachable {
            return Err(FlowError::StepLocked {
                index,
                max_reachable,
            });
        }
        if index == self.state.current {
            return Ok(StepTransition::Unchanged);
        }
        self.state.current = index;
        Ok(StepTransition::Moved(index))
    }

    /// Enter the terminal state. Only possible once every step is completed.
    pub fn mark_submitted(&mut self) -> bool {
        if self.submitted || !self.all_completed() {
            return false;
        }
        self.submitted = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps() -> Vec<StepKey> {
        StepKey::ALL.to_vec()
    }

    fn valid() -> ValidationResult {
        ValidationResult::default()
    }

    fn invalid() -> ValidationResult {
        let mut result = ValidationResult::default();
        result.add("last_name", "is required");
        result
    }

    /// Controller that has passed the first `n` steps
    fn advanced_by(n: usize) -> StepController {
        let mut controller = StepController::new(steps());
        for _ in 0..n {
            controller.next(&valid());
        }
        controller
    }

    mod initial_state {
        use super::*;

        #[test]
        fn test_starts_at_first_step_with_nothing_completed() {
            let controller = StepController::new(steps());
            assert_eq!(controller.position(), FlowPosition::Step(0));
            assert_eq!(controller.current_key(), StepKey::BasicInfo);
            assert!(controller.state().completed.is_empty());
            assert_eq!(controller.highest_completed(), None);
            assert_eq!(controller.max_reachable(), 0);
        }
    }

    mod next {
        use super::*;

        #[test]
        fn test_invalid_step_is_noop() {
            let mut controller = StepController::new(steps());
            let before = controller.state().clone();
            assert_eq!(controller.next(&invalid()), StepTransition::Blocked);
            assert_eq!(controller.state(), &before);
        }

        #[test]
        fn test_valid_step_advances_and_completes() {
            let mut controller = StepController::new(steps());
            assert_eq!(controller.next(&valid()), StepTransition::Advanced(1));
            assert!(controller.is_completed(StepKey::BasicInfo));
            assert_eq!(controller.current_key(), StepKey::Contact);
        }

        #[test]
        fn test_last_step_waits_for_submission() {
            let mut controller = advanced_by(4);
            assert_eq!(controller.current_index(), 4);
            assert_eq!(controller.next(&valid()), StepTransition::ReadyToSubmit);
            assert_eq!(controller.position(), FlowPosition::Step(4));
            assert!(controller.all_completed());
        }
    }

    mod previous {
        use super::*;

        #[test]
        fn test_at_first_step_is_unchanged() {
            let mut controller = StepController::new(steps());
            assert_eq!(controller.previous(), StepTransition::Unchanged);
            assert_eq!(controller.current_index(), 0);
        }

        #[test]
        fn test_keeps_completion_marks() {
            let mut controller = advanced_by(2);
            assert_eq!(controller.previous(), StepTransition::Moved(1));
            assert_eq!(controller.previous(), StepTransition::Moved(0));
            assert!(controller.is_completed(StepKey::BasicInfo));
            assert!(controller.is_completed(StepKey::Contact));
        }
    }

    mod go_to {
        use super::*;

        #[test]
        fn test_cannot_skip_ahead() {
            let mut controller = StepController::new(steps());
            let err = controller.go_to(2).unwrap_err();
            assert!(matches!(
                err,
                FlowError::StepLocked {
                    index: 2,
                    max_reachable: 0
                }
            ));
        }

        #[test]
        fn test_can_reach_one_past_highest_completed() {
            let mut controller = advanced_by(2);
            controller.go_to(0).unwrap();
            assert_eq!(controller.go_to(2).unwrap(), StepTransition::Moved(2));
            assert!(controller.go_to(3).is_err());
        }

        #[test]
        fn test_out_of_range_is_locked() {
            let mut controller = advanced_by(4);
            controller.next(&valid());
            assert!(controller.go_to(5).is_err());
        }

        #[test]
        fn test_same_index_is_unchanged() {
            let mut controller = advanced_by(1);
            assert_eq!(controller.go_to(1).unwrap(), StepTransition::Unchanged);
        }
    }

    mod submitted {
        use super::*;

        #[test]
        fn test_cannot_submit_with_incomplete_steps() {
            let mut controller = advanced_by(3);
            assert!(!controller.mark_submitted());
            assert_eq!(controller.position(), FlowPosition::Step(3));
        }

        #[test]
        fn test_terminal_state_ignores_navigation() {
            let mut controller = advanced_by(4);
            controller.next(&valid());
            assert!(controller.mark_submitted());
            assert_eq!(controller.position(), FlowPosition::Submitted);
            assert_eq!(controller.next(&valid()), StepTransition::Finished);
            assert_eq!(controller.previous(), StepTransition::Finished);
            assert_eq!(controller.go_to(0).unwrap(), StepTransition::Finished);
            assert!(!controller.mark_submitted());
        }
    }

    mod restore {
        use super::*;

        #[test]
        fn test_restores_progress() {
            let original = advanced_by(3);
            let restored = StepController::restore(steps(), original.state().clone());
            assert_eq!(restored.current_index(), 3);
            assert_eq!(restored.state(), original.state());
        }

        #[test]
        fn test_clamps_unreachable_index() {
            let state = StepState {
                current: 4,
                ..Default::default()
            };
            let restored = StepController::restore(steps(), state);
            assert_eq!(restored.current_index(), 0);
        }

        #[test]
        fn test_drops_undeclared_completion_marks() {
            let mut state = StepState::default();
            state.completed.insert(StepKey::Documents);
            let restored =
                StepController::restore(vec![StepKey::BasicInfo, StepKey::Contact], state);
            assert!(restored.state().completed.is_empty());
        }
    }
}

//! Step progress shared between the controller and the draft store

use super::StepKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where the applicant is in the flow, and which steps passed full validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepState {
    pub current: usize,
    pub completed: BTreeSet<StepKey>,
}

impl StepState {
    pub fn is_completed(&self, key: StepKey) -> bool {
        self.completed.contains(&key)
    }
}

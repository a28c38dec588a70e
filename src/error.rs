//! Error taxonomy for the registration flow
//!
//! Validation failures are not errors: they are reported as
//! [`crate::schema::ValidationResult`] and never block data retention.

use crate::session::Role;
use crate::state::StepKey;
use thiserror::Error;

/// Programming errors: a step or field name the registry does not know.
///
/// These should never reach a user at runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unknown step '{0}'")]
    UnknownStep(String),

    #[error("step '{step}' has no field named '{field}'")]
    UnknownField { step: StepKey, field: String },

    #[error("data for step '{found}' was passed where '{expected}' was expected")]
    StepMismatch { expected: StepKey, found: StepKey },

    #[error("step '{0}' is declared more than once")]
    DuplicateStep(StepKey),

    #[error("no steps are declared")]
    NoSteps,
}

/// Storage medium failures. Recovered by falling back to memory.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("storage medium unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("draft serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures reported by the submission collaborator. The draft is kept.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("application rejected: {0}")]
    Rejected(String),

    #[error("submission I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("application serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Problems resolving who is using the application
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no user id configured (set CONSULAR_USER_ID or identity.user_id)")]
    MissingUserId,

    #[error("unknown role '{0}' (expected citizen, consular_agent or administrator)")]
    UnknownRole(String),
}

/// Errors returned by flow operations
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("step {index} is locked (furthest reachable step is {max_reachable})")]
    StepLocked { index: usize, max_reachable: usize },

    #[error("role '{role}' may not start a registration")]
    AccessDenied { role: Role },
}

impl FlowError {
    /// Whether the user can act on this error (as opposed to a bug)
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FlowError::Configuration(_))
    }
}

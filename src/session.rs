//! Identity and role of the current user

use crate::config::IdentityConfig;
use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User class, as issued by the authentication service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Citizen,
    ConsularAgent,
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::ConsularAgent => "consular_agent",
            Self::Administrator => "administrator",
        }
    }

    /// Only citizens register themselves; staff work on existing records
    pub fn can_register(&self) -> bool {
        matches!(self, Self::Citizen)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "citizen" => Ok(Self::Citizen),
            "consular_agent" | "agent" => Ok(Self::ConsularAgent),
            "administrator" | "admin" => Ok(Self::Administrator),
            other => Err(SessionError::UnknownRole(other.to_string())),
        }
    }
}

/// Read-only identity supplied before the flow starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: String,
    display_name: String,
    role: Role,
}

impl Identity {
    pub fn new(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
    ) -> Result<Self, SessionError> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(SessionError::MissingUserId);
        }
        Ok(Self {
            user_id,
            display_name: display_name.into(),
            role,
        })
    }

    /// Resolve from the process environment, falling back to configuration
    pub fn from_env(config: &IdentityConfig) -> Result<Self, SessionError> {
        Self::resolve(|name| std::env::var(name).ok(), config)
    }

    /// Resolve using `lookup` for environment values, falling back to `config`.
    /// The role defaults to citizen.
    pub fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        config: &IdentityConfig,
    ) -> Result<Self, SessionError> {
        let user_id = lookup("CONSULAR_USER_ID")
            .or_else(|| config.user_id.clone())
            .ok_or(SessionError::MissingUserId)?;
        let display_name = lookup("CONSULAR_USER_NAME")
            .or_else(|| config.display_name.clone())
            .unwrap_or_else(|| user_id.clone());
        let role = match lookup("CONSULAR_USER_ROLE").or_else(|| config.role.clone()) {
            Some(role) => role.parse()?,
            None => Role::Citizen,
        };
        Self::new(user_id, display_name, role)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

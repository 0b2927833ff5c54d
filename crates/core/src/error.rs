//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures of the access-control domain.
/// Storage concerns belong to the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A module id is not part of the catalog (or missing from a matrix).
    #[error("unknown module: {0}")]
    UnknownModule(String),

    /// A user id does not refer to a known user.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// An edit targeted a user that is not the session's selected user.
    #[error("user {0} is not the selected user")]
    NotSelected(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A value failed validation (e.g. unparseable role name).
    #[error("validation failed: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn unknown_module(id: impl Into<String>) -> Self {
        Self::UnknownModule(id.into())
    }

    pub fn unknown_user(id: impl core::fmt::Display) -> Self {
        Self::UnknownUser(id.to_string())
    }

    pub fn not_selected(id: impl core::fmt::Display) -> Self {
        Self::NotSelected(id.to_string())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Caller errors: the operation was addressed at something that does not
    /// exist or is not editable right now. Never worth retrying.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::UnknownModule(_) | Self::UnknownUser(_) | Self::NotSelected(_)
        )
    }
}

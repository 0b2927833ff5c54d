use thiserror::Error;

use rolegate_access::ValidationError;
use rolegate_core::DomainError;
use rolegate_infra::StoreError;

pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Why a console operation was rejected.
///
/// Every variant means the operation did not happen: state is exactly what it
/// was before the call.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Caller error: unknown user/module, or an edit aimed at a user that is
    /// not selected.
    #[error(transparent)]
    Precondition(#[from] DomainError),

    /// Commit attempted while the selection still has violations.
    #[error("cannot save while {} validation error(s) remain", .0.len())]
    ValidationBlocked(Vec<ValidationError>),

    /// Admission with an email another user already has.
    #[error("email '{0}' is already in use")]
    DuplicateEmail(String),

    /// Admission with a missing name or email.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The store refused a load or save.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ConsoleError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(e) if e.is_precondition())
    }

    /// The blocking errors, for a [`ConsoleError::ValidationBlocked`].
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            Self::ValidationBlocked(errors) => Some(errors),
            _ => None,
        }
    }
}

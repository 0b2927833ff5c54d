use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use rolegate_access::{AuditLogEntry, User};

/// Everything the console needs at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredState {
    pub users: Vec<User>,
    pub audit: Vec<AuditLogEntry>,
}

/// Storage operation error.
///
/// These are **infrastructure errors** as opposed to domain errors. A failed
/// save leaves the console's in-memory state untouched.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("(de)serialization failed for {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("store lock poisoned")]
    Poisoned,
}

/// Durable home for users and audit entries, keyed by entity id.
///
/// The console loads once at startup and saves a full snapshot after every
/// committed change. Saving is an upsert by id: users and audit entries are
/// never deleted, so a snapshot always covers everything previously saved.
pub trait ConsoleStore: Send + Sync {
    /// Load every stored user and audit entry.
    ///
    /// An empty store is not an error.
    fn load_all(&self) -> Result<StoredState, StoreError>;

    /// Upsert `users` and `audit` together.
    ///
    /// On error neither list may have changed: a committed change and its audit
    /// entry are stored together or not at all.
    fn save(&self, users: &[User], audit: &[AuditLogEntry]) -> Result<(), StoreError>;
}

impl<S> ConsoleStore for Arc<S>
where
    S: ConsoleStore + ?Sized,
{
    fn load_all(&self) -> Result<StoredState, StoreError> {
        (**self).load_all()
    }

    fn save(&self, users: &[User], audit: &[AuditLogEntry]) -> Result<(), StoreError> {
        (**self).save(users, audit)
    }
}

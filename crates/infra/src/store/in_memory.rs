use std::collections::HashMap;
use std::sync::RwLock;

use rolegate_access::{AuditLogEntry, User};
use rolegate_core::{AuditEntryId, UserId};

use super::r#trait::{ConsoleStore, StoreError, StoredState};

/// In-memory store keyed by entity id.
///
/// Intended for tests/dev and for consoles started without a data directory.
#[derive(Debug, Default)]
pub struct InMemoryConsoleStore {
    users: RwLock<HashMap<UserId, User>>,
    audit: RwLock<HashMap<AuditEntryId, AuditLogEntry>>,
}

impl InMemoryConsoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store.
    pub fn with_state(state: StoredState) -> Self {
        let store = Self::new();
        if let Ok(mut users) = store.users.write() {
            users.extend(state.users.into_iter().map(|u| (u.id, u)));
        }
        if let Ok(mut audit) = store.audit.write() {
            audit.extend(state.audit.into_iter().map(|e| (e.id, e)));
        }
        store
    }

    pub fn user_count(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn audit_count(&self) -> usize {
        self.audit.read().map(|a| a.len()).unwrap_or(0)
    }
}

impl ConsoleStore for InMemoryConsoleStore {
    fn load_all(&self) -> Result<StoredState, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        let audit = self.audit.read().map_err(|_| StoreError::Poisoned)?;

        Ok(StoredState {
            users: users.values().cloned().collect(),
            audit: audit.values().cloned().collect(),
        })
    }

    fn save(&self, users: &[User], audit: &[AuditLogEntry]) -> Result<(), StoreError> {
        // Both locks before any write.
        let mut user_map = self.users.write().map_err(|_| StoreError::Poisoned)?;
        let mut audit_map = self.audit.write().map_err(|_| StoreError::Poisoned)?;

        user_map.extend(users.iter().map(|u| (u.id, u.clone())));
        audit_map.extend(audit.iter().map(|e| (e.id, e.clone())));
        Ok(())
    }
}

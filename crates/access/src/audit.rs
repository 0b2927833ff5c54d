//! Append-only audit trail, newest entry first per user.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rolegate_core::{AuditEntryId, Entity, UserId};

/// Action names recorded by the console.
pub mod actions {
    pub const USER_CREATED: &str = "User created";
    pub const PERMISSIONS_UPDATED: &str = "Permissions updated";
}

/// A recorded change. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: AuditEntryId,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub details: String,
}

impl Entity for AuditLogEntry {
    type Id = AuditEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AuditLogEntry {
    /// New entry stamped with a fresh id and the current time.
    pub fn new(user_id: UserId, action: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id: AuditEntryId::new(),
            user_id,
            timestamp: Utc::now(),
            action: action.into(),
            details: details.into(),
        }
    }
}

/// Per-user audit logs.
///
/// There is no way to edit or remove an entry once recorded.
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    by_user: HashMap<UserId, Vec<AuditLogEntry>>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted entries, newest first per user.
    pub fn from_entries(entries: impl IntoIterator<Item = AuditLogEntry>) -> Self {
        let mut by_user: HashMap<UserId, Vec<AuditLogEntry>> = HashMap::new();
        for entry in entries {
            by_user.entry(entry.user_id).or_default().push(entry);
        }
        for log in by_user.values_mut() {
            // Ties fall back to id order, same as `all`.
            log.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        }
        Self { by_user }
    }

    /// Record a new entry for `user_id`. Always succeeds.
    pub fn append(
        &mut self,
        user_id: UserId,
        action: impl Into<String>,
        details: impl Into<String>,
    ) -> AuditLogEntry {
        let entry = AuditLogEntry::new(user_id, action, details);
        self.record(entry.clone());
        entry
    }

    /// Record a pre-built entry at the head of its user's log.
    pub fn record(&mut self, entry: AuditLogEntry) {
        self.by_user.entry(entry.user_id).or_default().insert(0, entry);
    }

    /// Every entry for `user_id`, newest first.
    pub fn entries_for(&self, user_id: &UserId) -> &[AuditLogEntry] {
        self.by_user.get(user_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// At most `limit` of the newest entries for `user_id`.
    pub fn recent(&self, user_id: &UserId, limit: usize) -> &[AuditLogEntry] {
        let entries = self.entries_for(user_id);
        &entries[..entries.len().min(limit)]
    }

    /// All entries across users, newest first.
    pub fn all(&self) -> Vec<AuditLogEntry> {
        let mut all: Vec<AuditLogEntry> = self.by_user.values().flatten().cloned().collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        all
    }

    pub fn len(&self) -> usize {
        self.by_user.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Notifications the console publishes for presentation layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rolegate_access::Role;
use rolegate_core::{AuditEntryId, UserId};
use rolegate_events::Event;

/// Something the operator should be told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsoleEvent {
    UserCreated {
        user_id: UserId,
        name: String,
        role: Role,
        occurred_at: DateTime<Utc>,
    },
    PermissionsSaved {
        user_id: UserId,
        name: String,
        audit_entry_id: AuditEntryId,
        occurred_at: DateTime<Utc>,
    },
    CommitRejected {
        user_id: UserId,
        error_count: usize,
        occurred_at: DateTime<Utc>,
    },
    EditsDiscarded {
        user_id: UserId,
        occurred_at: DateTime<Utc>,
    },
}

impl ConsoleEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            ConsoleEvent::UserCreated { user_id, .. }
            | ConsoleEvent::PermissionsSaved { user_id, .. }
            | ConsoleEvent::CommitRejected { user_id, .. }
            | ConsoleEvent::EditsDiscarded { user_id, .. } => *user_id,
        }
    }

    /// Whether a toast for this event should be styled as an error.
    pub fn is_error(&self) -> bool {
        matches!(self, ConsoleEvent::CommitRejected { .. })
    }

    /// Short operator-facing text.
    pub fn message(&self) -> String {
        match self {
            ConsoleEvent::UserCreated { .. } => "User created successfully".to_string(),
            ConsoleEvent::PermissionsSaved { .. } => {
                "User permissions saved successfully".to_string()
            }
            ConsoleEvent::CommitRejected { error_count, .. } => {
                format!("Cannot save: {error_count} validation error(s) must be fixed first")
            }
            ConsoleEvent::EditsDiscarded { .. } => "Unsaved changes were discarded".to_string(),
        }
    }
}

impl Event for ConsoleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ConsoleEvent::UserCreated { .. } => "console.user.created",
            ConsoleEvent::PermissionsSaved { .. } => "console.permissions.saved",
            ConsoleEvent::CommitRejected { .. } => "console.permissions.rejected",
            ConsoleEvent::EditsDiscarded { .. } => "console.edits.discarded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ConsoleEvent::UserCreated { occurred_at, .. }
            | ConsoleEvent::PermissionsSaved { occurred_at, .. }
            | ConsoleEvent::CommitRejected { occurred_at, .. }
            | ConsoleEvent::EditsDiscarded { occurred_at, .. } => *occurred_at,
        }
    }
}

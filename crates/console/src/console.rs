//! The console: committed users, the audit trail, and the edit pipeline.
//!
//! ## Edit Flow
//!
//! ```text
//! select_user ─→ draft copy in the Session
//!   ↓
//! assign_role / set_capability (draft only, pending_changes = true, re-validate)
//!   ↓
//! commit
//!   1. refuse while the draft has validation errors
//!   2. save users + audit snapshots through the store
//!   3. swap the draft in as the stored user, record the audit entry
//!   4. publish a notification (failures are logged only)
//! ```
//!
//! Nothing is written to the store or to the in-memory collections until step 2
//! has succeeded, so a failed commit leaves both the console and the session
//! exactly as they were.

use std::sync::Arc;

use chrono::Utc;

use rolegate_access::audit::actions;
use rolegate_access::{
    AuditLogEntry, AuditTrail, Capability, ModuleCatalog, ModuleId, Role, User, ValidationError,
};
use rolegate_core::{DomainError, UserId};
use rolegate_events::{Event, EventBus, Subscription};
use rolegate_infra::{ConsoleConfig, ConsoleStore, DEFAULT_AUDIT_DISPLAY_LIMIT};

use crate::errors::{ConsoleError, ConsoleResult};
use crate::events::ConsoleEvent;
use crate::session::{Selection, Session};

/// Permission console over a store `S` and a notification bus `B`.
///
/// ## Guarantees
///
/// - Every stored user's matrix satisfies the consistency rules. Drafts may be
///   inconsistent; they only become stored users through [`Console::commit`].
/// - Users are listed newest first.
/// - Audit logs only grow.
/// - Every operation either applies completely or returns an error without
///   touching any state.
#[derive(Debug)]
pub struct Console<S, B> {
    pub(crate) catalog: ModuleCatalog,
    pub(crate) users: Vec<User>,
    pub(crate) audit: AuditTrail,
    pub(crate) store: S,
    pub(crate) bus: B,
    audit_display_limit: usize,
}

impl<S, B> Console<S, B>
where
    S: ConsoleStore,
    B: EventBus<ConsoleEvent>,
{
    /// Load the console state from `store`.
    ///
    /// Stored matrices are reshaped to `catalog` (missing modules become
    /// all-false, unknown modules are dropped).
    #[tracing::instrument(skip_all)]
    pub fn load(store: S, bus: B, catalog: ModuleCatalog) -> ConsoleResult<Self> {
        let state = store.load_all()?;

        let mut users: Vec<User> = state
            .users
            .into_iter()
            .map(|u| u.normalized(&catalog))
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        for user in &users {
            let errors = user.validate();
            if !errors.is_empty() {
                tracing::warn!(
                    user_id = %user.id,
                    error_count = errors.len(),
                    "stored user violates the permission rules"
                );
            }
        }

        let audit = AuditTrail::from_entries(state.audit);

        tracing::info!(
            users = users.len(),
            audit_entries = audit.len(),
            "console state loaded"
        );

        Ok(Self {
            catalog,
            users,
            audit,
            store,
            bus,
            audit_display_limit: DEFAULT_AUDIT_DISPLAY_LIMIT,
        })
    }

    /// How many audit entries [`Console::recent_audit`] returns.
    pub fn with_audit_display_limit(mut self, limit: usize) -> Self {
        self.audit_display_limit = limit;
        self
    }

    pub fn audit_display_limit(&self) -> usize {
        self.audit_display_limit
    }

    pub fn subscribe(&self) -> Subscription<ConsoleEvent> {
        self.bus.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────

    /// Switch the session's selection to `user_id` (or clear it with `None`).
    ///
    /// Uncommitted edits of the previous selection are discarded: the stored
    /// user is untouched and the next selection starts from it again.
    #[tracing::instrument(skip(self, session))]
    pub fn select_user(
        &mut self,
        session: &mut Session,
        user_id: Option<UserId>,
    ) -> ConsoleResult<()> {
        let next = match user_id {
            Some(id) => Some(Selection::new(self.require_user(id)?.clone())),
            None => None,
        };

        if let Some(dropped) = session.replace(next) {
            if dropped.pending_changes {
                tracing::info!(user_id = %dropped.draft.id, "discarding uncommitted edits");
                self.notify(ConsoleEvent::EditsDiscarded {
                    user_id: dropped.draft.id,
                    occurred_at: Utc::now(),
                });
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Edits (draft only)
    // ─────────────────────────────────────────────────────────────────────────

    /// Set the selected user's role; non-custom roles overwrite the matrix with
    /// their template.
    #[tracing::instrument(skip(self, session))]
    pub fn assign_role(
        &mut self,
        session: &mut Session,
        user_id: UserId,
        role: Role,
    ) -> ConsoleResult<()> {
        self.require_user(user_id)?;
        let selection = session.selection_for(user_id)?;

        selection.draft.assign_role(role);
        selection.touched();

        tracing::debug!(errors = selection.errors.len(), "role assigned");
        Ok(())
    }

    /// Set one capability of one module on the selected user.
    ///
    /// Clearing `read` also clears write, delete and share; clearing `write`
    /// also clears delete. Setting never cascades, so the draft may become
    /// inconsistent until the operator fixes it.
    #[tracing::instrument(skip(self, session))]
    pub fn set_capability(
        &mut self,
        session: &mut Session,
        user_id: UserId,
        module_id: &ModuleId,
        capability: Capability,
        value: bool,
    ) -> ConsoleResult<()> {
        self.require_user(user_id)?;
        let selection = session.selection_for(user_id)?;

        selection
            .draft
            .set_capability(&self.catalog, module_id, capability, value)?;
        selection.touched();

        tracing::debug!(errors = selection.errors.len(), "capability set");
        Ok(())
    }

    /// Recompute the selection's errors from its draft.
    pub fn validate_selection<'s>(&self, session: &'s mut Session) -> &'s [ValidationError] {
        match session.selection_mut() {
            Some(selection) => selection.revalidate(),
            None => &[],
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commit
    // ─────────────────────────────────────────────────────────────────────────

    /// Make the selected user's draft the stored user.
    ///
    /// Refused with [`ConsoleError::ValidationBlocked`] while any rule is
    /// broken. On success the returned audit entry has been recorded and
    /// persisted.
    #[tracing::instrument(skip(self, session))]
    pub fn commit(
        &mut self,
        session: &mut Session,
        user_id: UserId,
    ) -> ConsoleResult<AuditLogEntry> {
        let index = self.user_index(user_id)?;
        let selection = session.selection_for(user_id)?;

        let errors = selection.revalidate();
        if !errors.is_empty() {
            let errors = errors.to_vec();
            tracing::warn!(error_count = errors.len(), "commit refused: validation errors remain");
            self.notify(ConsoleEvent::CommitRejected {
                user_id,
                error_count: errors.len(),
                occurred_at: Utc::now(),
            });
            return Err(ConsoleError::ValidationBlocked(errors));
        }

        let committed = &self.users[index];
        let draft = selection.draft.clone();
        let entry = AuditLogEntry::new(
            user_id,
            actions::PERMISSIONS_UPDATED,
            self.commit_summary(committed, &draft),
        );

        let mut users = self.users.clone();
        users[index] = draft;
        self.persist(&users, &entry)?;

        self.users = users;
        self.audit.record(entry.clone());
        selection.pending_changes = false;

        tracing::info!(audit_entry_id = %entry.id, "permissions committed");
        self.notify(ConsoleEvent::PermissionsSaved {
            user_id,
            name: self.users[index].name.clone(),
            audit_entry_id: entry.id,
            occurred_at: entry.timestamp,
        });

        Ok(entry)
    }

    fn commit_summary(&self, before: &User, after: &User) -> String {
        let mut details = format!("Permissions updated for user {}", after.name);

        if before.role == after.role {
            details.push_str(&format!(" (role: {})", after.role));
        } else {
            details.push_str(&format!(" (role: {} -> {})", before.role, after.role));
        }

        let changed = after.permissions.changed_modules(&before.permissions);
        if !changed.is_empty() {
            let names: Vec<&str> = changed
                .iter()
                .map(|id| self.catalog.display_name(id))
                .collect();
            details.push_str("; changed: ");
            details.push_str(&names.join(", "));
        }

        details
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    /// Stored users, newest first.
    pub fn list_users(&self) -> &[User] {
        &self.users
    }

    pub fn get_user(&self, user_id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    /// Users whose name, email or role contains `term` (case-insensitive).
    pub fn search_users(&self, term: &str) -> Vec<&User> {
        self.users.iter().filter(|u| u.matches_search(term)).collect()
    }

    /// The selected user as edited, or `None` without a selection.
    pub fn working_user<'s>(&self, session: &'s Session) -> Option<&'s User> {
        session.draft()
    }

    /// Errors for `user_id`: the session's when it is selected, otherwise
    /// derived from the stored matrix.
    pub fn validation_errors(&self, session: &Session, user_id: UserId) -> Vec<ValidationError> {
        if session.is_selected(user_id) {
            return session.errors().to_vec();
        }
        self.get_user(user_id).map(User::validate).unwrap_or_default()
    }

    pub fn pending_changes(&self, session: &Session, user_id: UserId) -> bool {
        session.is_selected(user_id) && session.pending_changes()
    }

    /// Full audit log for `user_id`, newest first.
    pub fn audit_log(&self, user_id: UserId) -> &[AuditLogEntry] {
        self.audit.entries_for(&user_id)
    }

    /// The newest entries for `user_id`, bounded by the display limit.
    pub fn recent_audit(&self, user_id: UserId) -> &[AuditLogEntry] {
        self.audit.recent(&user_id, self.audit_display_limit)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn user_index(&self, user_id: UserId) -> Result<usize, DomainError> {
        self.users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or_else(|| DomainError::unknown_user(user_id))
    }

    fn require_user(&self, user_id: UserId) -> Result<&User, DomainError> {
        self.get_user(user_id)
            .ok_or_else(|| DomainError::unknown_user(user_id))
    }

    /// Save `users` and the audit trail plus `entry`.
    pub(crate) fn persist(&self, users: &[User], entry: &AuditLogEntry) -> ConsoleResult<()> {
        let mut audit = self.audit.all();
        audit.insert(0, entry.clone());

        self.store.save(users, &audit).inspect_err(|e| {
            tracing::error!(error = %e, "failed to save console state");
        })?;
        Ok(())
    }

    pub(crate) fn notify(&self, event: ConsoleEvent) {
        let event_type = event.event_type();
        tracing::debug!(
            event_type,
            version = event.version(),
            occurred_at = %event.occurred_at(),
            "publishing console notification"
        );
        if let Err(e) = self.bus.publish(event) {
            tracing::warn!(error = ?e, event_type, "failed to publish console notification");
        }
    }
}

impl<B> Console<Arc<dyn ConsoleStore>, B>
where
    B: EventBus<ConsoleEvent>,
{
    /// Open the configured store over the standard catalog.
    pub fn from_config(config: &ConsoleConfig, bus: B) -> ConsoleResult<Self> {
        let store = config.open_store()?;
        Ok(Self::load(store, bus, ModuleCatalog::standard())?
            .with_audit_display_limit(config.audit_display_limit))
    }
}

//! New-user admission and email availability lookups.

use chrono::Utc;

use rolegate_access::audit::actions;
use rolegate_access::{AuditLogEntry, PermissionMatrix, Role, User};
use rolegate_core::UserId;
use rolegate_events::EventBus;
use rolegate_infra::ConsoleStore;

use crate::console::Console;
use crate::email::{LookupOutcome, LookupRequest};
use crate::errors::{ConsoleError, ConsoleResult};
use crate::events::ConsoleEvent;

/// Admission form contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Starting matrix for a custom role. Ignored for template roles.
    pub permissions: Option<PermissionMatrix>,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role,
            permissions: None,
        }
    }

    pub fn with_permissions(mut self, permissions: PermissionMatrix) -> Self {
        self.permissions = Some(permissions);
        self
    }
}

impl<S, B> Console<S, B>
where
    S: ConsoleStore,
    B: EventBus<ConsoleEvent>,
{
    /// Admit a new user.
    ///
    /// Template roles get their template on every module. A custom role gets the
    /// supplied matrix (reshaped to the catalog), or all-false without one; the
    /// supplied matrix must already satisfy the rules.
    #[tracing::instrument(skip(self, new), fields(email = %new.email, role = %new.role))]
    pub fn create_user(&mut self, new: NewUser) -> ConsoleResult<User> {
        let name = new.name.trim();
        let email = new.email.trim();
        if name.is_empty() {
            return Err(ConsoleError::InvalidInput("name is required".to_string()));
        }
        if email.is_empty() {
            return Err(ConsoleError::InvalidInput("email is required".to_string()));
        }
        if self.email_taken(email) {
            return Err(ConsoleError::DuplicateEmail(email.to_string()));
        }

        let mut user = User::with_role(&self.catalog, name, email, new.role, Utc::now());
        match (new.role, new.permissions) {
            (Role::Custom, Some(permissions)) => {
                user.permissions = permissions.normalize(&self.catalog);
                let errors = user.validate();
                if !errors.is_empty() {
                    tracing::warn!(error_count = errors.len(), "admission refused: invalid matrix");
                    return Err(ConsoleError::ValidationBlocked(errors));
                }
            }
            (_, Some(_)) => {
                tracing::debug!("ignoring supplied matrix for template role");
            }
            (_, None) => {}
        }

        let entry = AuditLogEntry::new(
            user.id,
            actions::USER_CREATED,
            format!("Created user {} with {} role", user.name, user.role),
        );

        let mut users = Vec::with_capacity(self.users.len() + 1);
        users.push(user.clone());
        users.extend(self.users.iter().cloned());
        self.persist(&users, &entry)?;

        self.users = users;
        self.audit.record(entry);

        tracing::info!(user_id = %user.id, "user created");
        self.notify(ConsoleEvent::UserCreated {
            user_id: user.id,
            name: user.name.clone(),
            role: user.role,
            occurred_at: user.created_at,
        });

        Ok(user)
    }

    /// Whether another user already has `email` (case-insensitive).
    pub fn email_taken(&self, email: &str) -> bool {
        self.users.iter().any(|u| u.has_email(email))
    }

    /// Same as [`Console::email_taken`], ignoring `user_id` itself.
    pub fn email_taken_by_other(&self, email: &str, user_id: UserId) -> bool {
        self.users
            .iter()
            .any(|u| u.id != user_id && u.has_email(email))
    }

    /// Run a deferred lookup.
    pub fn check_email(&self, request: &LookupRequest) -> LookupOutcome {
        LookupOutcome {
            id: request.id,
            email: request.email.clone(),
            taken: self.email_taken(&request.email),
        }
    }
}

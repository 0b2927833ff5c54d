//! User record and the mutations the console may apply to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rolegate_core::{DomainResult, Entity, UserId};

use crate::matrix::{MatrixEdit, PermissionMatrix};
use crate::module::{ModuleCatalog, ModuleId};
use crate::permission::Capability;
use crate::role::Role;
use crate::rules::{self, ValidationError};

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A user managed by the console.
///
/// # Invariants
/// - `id` and `created_at` never change after admission.
/// - `email` is unique across users (compared case-insensitively).
/// - `permissions` has exactly one row per catalog module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub permissions: PermissionMatrix,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl User {
    /// Build a user whose matrix is the role's starting template.
    pub fn with_role(
        catalog: &ModuleCatalog,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            role,
            permissions: PermissionMatrix::for_role(catalog, role),
            created_at,
        }
    }

    /// Reshape the matrix to the catalog (used after loading from storage).
    pub fn normalized(mut self, catalog: &ModuleCatalog) -> Self {
        if !self.permissions.is_complete_for(catalog) {
            tracing::warn!(user_id = %self.id, "user matrix does not match the module catalog");
            self.permissions = self.permissions.normalize(catalog);
        }
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Set the role; non-custom roles overwrite every module with the template.
    pub fn assign_role(&mut self, role: Role) {
        self.role = role;
        if let Some(template) = role.template() {
            self.permissions.fill(template);
        }
    }

    /// Set one capability bit, with the clear-cascade.
    ///
    /// The module must be in the catalog and in this user's matrix.
    pub fn set_capability(
        &mut self,
        catalog: &ModuleCatalog,
        module_id: &ModuleId,
        capability: Capability,
        value: bool,
    ) -> DomainResult<()> {
        catalog.require(module_id)?;
        self.permissions.apply(&MatrixEdit::SetCapability {
            module_id: module_id.clone(),
            capability,
            value,
        })
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        rules::validate(&self.permissions)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn has_email(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }

    /// Case-insensitive substring match on name, email or role.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term)
            || self.email.to_lowercase().contains(&term)
            || self.role.as_str().contains(&term)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

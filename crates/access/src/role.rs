use core::str::FromStr;

use serde::{Deserialize, Serialize};

use rolegate_core::DomainError;

use crate::permission::Permission;

/// Role assigned to a user.
///
/// `Admin`, `Editor` and `Viewer` each carry one canonical [`Permission`]
/// template applied identically to every module. `Custom` carries none: its
/// matrix is edited module by module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    #[default]
    Viewer,
    Custom,
}

impl Role {
    /// All roles, in the order the console offers them.
    pub const ALL: [Role; 4] = [Role::Admin, Role::Editor, Role::Viewer, Role::Custom];

    /// Canonical template for this role, `None` for `Custom`.
    pub fn template(self) -> Option<Permission> {
        match self {
            Role::Admin => Some(Permission::ALL),
            Role::Editor => Some(Permission {
                read: true,
                write: true,
                delete: false,
                share: true,
            }),
            Role::Viewer => Some(Permission {
                read: true,
                write: false,
                delete: false,
                share: false,
            }),
            Role::Custom => None,
        }
    }

    /// Permission every module starts with when a user is admitted.
    pub fn initial_permission(self) -> Permission {
        self.template().unwrap_or(Permission::NONE)
    }

    pub fn is_custom(self) -> bool {
        matches!(self, Role::Custom)
    }

    /// Operator-facing summary of what the role grants.
    pub fn describe(self) -> &'static str {
        match self {
            Role::Admin => "Admin role has full access to all modules and permissions",
            Role::Editor => "Editor role has read and write access to all modules, but cannot delete content",
            Role::Viewer => "Viewer role has read-only access to all modules",
            Role::Custom => "Custom role permissions are set module by module",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
            Role::Custom => "custom",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown role '{s}'")))
    }
}

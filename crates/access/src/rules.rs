//! Consistency rules between capability bits.
//!
//! Every committed matrix must satisfy, for every module:
//! `write ⇒ read`, `delete ⇒ write`, `share ⇒ read`.

use serde::{Deserialize, Serialize};

use crate::matrix::PermissionMatrix;
use crate::module::ModuleId;
use crate::permission::{Capability, Permission};

/// A dependency between two capabilities of the same module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    WriteRequiresRead,
    DeleteRequiresWrite,
    ShareRequiresRead,
}

impl Rule {
    /// Evaluation order within a module.
    pub const ALL: [Rule; 3] = [
        Rule::WriteRequiresRead,
        Rule::DeleteRequiresWrite,
        Rule::ShareRequiresRead,
    ];

    /// The capability the rule constrains.
    pub fn capability(self) -> Capability {
        match self {
            Rule::WriteRequiresRead => Capability::Write,
            Rule::DeleteRequiresWrite => Capability::Delete,
            Rule::ShareRequiresRead => Capability::Share,
        }
    }

    /// The capability that must be present for [`Rule::capability`] to be.
    pub fn prerequisite(self) -> Capability {
        match self {
            Rule::WriteRequiresRead | Rule::ShareRequiresRead => Capability::Read,
            Rule::DeleteRequiresWrite => Capability::Write,
        }
    }

    pub fn holds(self, permission: &Permission) -> bool {
        !permission.get(self.capability()) || permission.get(self.prerequisite())
    }

    pub fn message(self) -> &'static str {
        match self {
            Rule::WriteRequiresRead => "Write permission requires Read permission",
            Rule::DeleteRequiresWrite => "Delete permission requires Write permission",
            Rule::ShareRequiresRead => "Share permission requires Read permission",
        }
    }
}

/// Rules a single module's permission breaks, in evaluation order.
pub fn violations(permission: &Permission) -> impl Iterator<Item = Rule> + '_ {
    Rule::ALL.into_iter().filter(move |rule| !rule.holds(permission))
}

/// A reported invariant violation.
///
/// Always derivable from the matrix alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<ModuleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<Capability>,
    pub message: String,
}

impl ValidationError {
    pub fn for_rule(module_id: ModuleId, rule: Rule) -> Self {
        Self {
            module_id: Some(module_id),
            capability: Some(rule.capability()),
            message: rule.message().to_string(),
        }
    }
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.module_id {
            Some(module_id) => write!(f, "{module_id}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Scan a matrix and report every violation.
///
/// Modules are visited in matrix (catalog) order; within a module the rules
/// run in [`Rule::ALL`] order, one error per broken rule.
pub fn validate(matrix: &PermissionMatrix) -> Vec<ValidationError> {
    matrix
        .iter()
        .flat_map(|(module_id, permission)| {
            violations(permission)
                .map(move |rule| ValidationError::for_rule(module_id.clone(), rule))
        })
        .collect()
}

pub fn is_consistent(matrix: &PermissionMatrix) -> bool {
    matrix
        .iter()
        .all(|(_, permission)| violations(permission).next().is_none())
}

/// Errors reported against one module.
pub fn errors_for_module<'a>(
    errors: &'a [ValidationError],
    module_id: &ModuleId,
) -> Vec<&'a ValidationError> {
    errors
        .iter()
        .filter(|e| e.module_id.as_ref() == Some(module_id))
        .collect()
}

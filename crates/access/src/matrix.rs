//! Per-user permission matrix and its pure transitions.

use serde::{Deserialize, Serialize};

use rolegate_core::{DomainError, DomainResult};

use crate::module::{ModuleCatalog, ModuleId};
use crate::permission::{Capability, Permission};
use crate::role::Role;
use crate::rules::{self, ValidationError};

/// One row of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleGrant {
    pub module_id: ModuleId,
    #[serde(flatten)]
    pub permission: Permission,
}

/// Module id → [`Permission`] for a single user.
///
/// Rows are held in catalog order. A matrix built through [`PermissionMatrix::uniform`]
/// or [`PermissionMatrix::normalize`] has exactly one row per catalog module.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMatrix {
    grants: Vec<ModuleGrant>,
}

/// An edit applied to a matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixEdit {
    /// Replace every module's permission with the template (no merge).
    ApplyTemplate(Permission),
    /// Set one bit on one module, cascading on clear.
    SetCapability {
        module_id: ModuleId,
        capability: Capability,
        value: bool,
    },
}

/// Result of [`transition`]: the new matrix and its derived errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub matrix: PermissionMatrix,
    pub errors: Vec<ValidationError>,
}

/// Pure transition `(matrix, edit) -> (matrix', errors')`.
///
/// The input is left untouched; on a precondition failure nothing is produced.
pub fn transition(matrix: &PermissionMatrix, edit: &MatrixEdit) -> DomainResult<Transition> {
    let mut next = matrix.clone();
    next.apply(edit)?;
    let errors = rules::validate(&next);
    Ok(Transition { matrix: next, errors })
}

impl PermissionMatrix {
    /// Same permission on every catalog module.
    pub fn uniform(catalog: &ModuleCatalog, permission: Permission) -> Self {
        Self {
            grants: catalog
                .ids()
                .map(|id| ModuleGrant {
                    module_id: id.clone(),
                    permission,
                })
                .collect(),
        }
    }

    /// Starting matrix for a freshly admitted user with `role`.
    pub fn for_role(catalog: &ModuleCatalog, role: Role) -> Self {
        Self::uniform(catalog, role.initial_permission())
    }

    /// Build from arbitrary rows, then normalize against the catalog.
    pub fn from_grants(
        catalog: &ModuleCatalog,
        grants: impl IntoIterator<Item = (ModuleId, Permission)>,
    ) -> Self {
        let raw = Self {
            grants: grants
                .into_iter()
                .map(|(module_id, permission)| ModuleGrant {
                    module_id,
                    permission,
                })
                .collect(),
        };
        raw.normalize(catalog)
    }

    /// Reshape to exactly the catalog's modules, in catalog order.
    ///
    /// Missing modules default to no access; unknown modules are dropped. Both
    /// are logged, never skipped silently. Duplicate rows keep the first.
    pub fn normalize(self, catalog: &ModuleCatalog) -> Self {
        for grant in &self.grants {
            if !catalog.contains(&grant.module_id) {
                tracing::warn!(module = %grant.module_id, "dropping permission for unknown module");
            }
        }

        let grants = catalog
            .ids()
            .map(|id| {
                let permission = match self.get(id) {
                    Some(p) => *p,
                    None => {
                        tracing::warn!(
                            module = %id,
                            "matrix missing module; defaulting to no access"
                        );
                        Permission::NONE
                    }
                };
                ModuleGrant {
                    module_id: id.clone(),
                    permission,
                }
            })
            .collect();

        Self { grants }
    }

    /// Whether the rows are exactly the catalog's modules, in order.
    pub fn is_complete_for(&self, catalog: &ModuleCatalog) -> bool {
        self.grants.len() == catalog.len()
            && self
                .grants
                .iter()
                .zip(catalog.ids())
                .all(|(g, id)| &g.module_id == id)
    }

    pub fn get(&self, module_id: &ModuleId) -> Option<&Permission> {
        self.grants
            .iter()
            .find(|g| &g.module_id == module_id)
            .map(|g| &g.permission)
    }

    fn get_mut(&mut self, module_id: &ModuleId) -> DomainResult<&mut Permission> {
        self.grants
            .iter_mut()
            .find(|g| &g.module_id == module_id)
            .map(|g| &mut g.permission)
            .ok_or_else(|| DomainError::unknown_module(module_id.as_str()))
    }

    pub fn contains(&self, module_id: &ModuleId) -> bool {
        self.get(module_id).is_some()
    }

    /// Overwrite one module's whole permission, no cascade.
    pub fn replace(&mut self, module_id: &ModuleId, permission: Permission) -> DomainResult<()> {
        *self.get_mut(module_id)? = permission;
        Ok(())
    }

    /// Overwrite every row with `permission`.
    pub fn fill(&mut self, permission: Permission) {
        for grant in &mut self.grants {
            grant.permission = permission;
        }
    }

    /// Apply an edit in place. Preconditions are checked before anything changes.
    pub fn apply(&mut self, edit: &MatrixEdit) -> DomainResult<()> {
        match edit {
            MatrixEdit::ApplyTemplate(template) => self.fill(*template),
            MatrixEdit::SetCapability {
                module_id,
                capability,
                value,
            } => {
                self.get_mut(module_id)?
                    .set_with_cascade(*capability, *value);
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModuleId, &Permission)> {
        self.grants.iter().map(|g| (&g.module_id, &g.permission))
    }

    pub fn grants(&self) -> &[ModuleGrant] {
        &self.grants
    }

    /// Modules whose permission differs from `other` (rows missing from
    /// `other` count as changed).
    pub fn changed_modules(&self, other: &PermissionMatrix) -> Vec<ModuleId> {
        self.iter()
            .filter(|(id, p)| other.get(id) != Some(*p))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use rolegate_core::{DomainError, DomainResult, ValueObject};

/// Module identifier (e.g. "billing").
///
/// Modules are opaque strings at this layer; the catalog decides which ones
/// exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(Cow<'static, str>);

impl ModuleId {
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ModuleId {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

/// An administrable resource area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub display_name: Cow<'static, str>,
}

impl ValueObject for Module {}

impl Module {
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        display_name: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            id: ModuleId::new(id),
            display_name: display_name.into(),
        }
    }
}

/// Fixed, ordered set of modules known at startup.
///
/// Catalog order is the order matrices are laid out and validated in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCatalog {
    modules: Vec<Module>,
}

impl ModuleCatalog {
    /// Build a catalog; module ids must be unique and the catalog non-empty.
    pub fn new(modules: Vec<Module>) -> DomainResult<Self> {
        if modules.is_empty() {
            return Err(DomainError::validation("module catalog cannot be empty"));
        }

        let mut seen = HashSet::new();
        for m in &modules {
            if !seen.insert(m.id.clone()) {
                return Err(DomainError::validation(format!("duplicate module id '{}'", m.id)));
            }
        }

        Ok(Self { modules })
    }

    /// The console's standard modules.
    pub fn standard() -> Self {
        Self {
            modules: vec![
                Module::new("dashboard", "Dashboard"),
                Module::new("users", "Users Management"),
                Module::new("reports", "Reports"),
                Module::new("settings", "Settings"),
                Module::new("billing", "Billing"),
                Module::new("analytics", "Analytics"),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.modules.iter().map(|m| &m.id)
    }

    pub fn get(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| &m.id == id)
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.get(id).is_some()
    }

    /// Resolve a module id, failing with a precondition error when unknown.
    pub fn require(&self, id: &ModuleId) -> DomainResult<&Module> {
        self.get(id)
            .ok_or_else(|| DomainError::unknown_module(id.as_str()))
    }

    /// Display name for `id`, falling back to the raw id.
    pub fn display_name<'a>(&'a self, id: &'a ModuleId) -> &'a str {
        self.get(id)
            .map(|m| m.display_name.as_ref())
            .unwrap_or_else(|| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

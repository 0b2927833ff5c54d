//! `rolegate-access`: the permission consistency rules.
//!
//! Everything in this crate is pure and storage-agnostic: matrices, role
//! templates, the rule set, and the audit trail all live in memory and are
//! driven by the console crate.

pub mod audit;
pub mod matrix;
pub mod module;
pub mod permission;
pub mod role;
pub mod rules;
pub mod user;

pub use audit::{AuditLogEntry, AuditTrail};
pub use matrix::{MatrixEdit, ModuleGrant, PermissionMatrix, Transition, transition};
pub use module::{Module, ModuleCatalog, ModuleId};
pub use permission::{Capability, Permission};
pub use role::Role;
pub use rules::{Rule, ValidationError, errors_for_module, is_consistent, validate};
pub use user::User;

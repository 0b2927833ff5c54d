//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Users and audit entries are entities: two records with the same id are the
/// same record, even when their other fields differ (e.g. a draft and its
/// committed counterpart).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Whether `other` refers to the same entity.
    fn same_entity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

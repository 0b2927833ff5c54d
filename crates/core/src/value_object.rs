//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Capability sets and module descriptors are value objects: a `Permission`
/// with the same four bits as another is the same permission, wherever it came
/// from.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// struct Permission { read: bool, write: bool, delete: bool, share: bool }
///
/// impl ValueObject for Permission {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

//! Value object trait: equality by value, not identity.

/// Marker for immutable values compared field by field.
///
/// Product names and carrier identifiers are value objects:
/// to "change" one, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

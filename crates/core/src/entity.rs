//! Entity trait: identity that survives state changes.

/// Something identified by a key rather than by its attribute values.
///
/// Two entities with the same `id()` denote the same thing even when their
/// other fields differ (e.g. a product's stock counter).
pub trait Entity {
    /// Strongly-typed identity key.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}

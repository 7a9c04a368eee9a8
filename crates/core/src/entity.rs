//! Entity trait: identity that survives state changes.

/// An object whose identity outlives its attribute values.
///
/// A catalog item keeps the same id through renames, price changes, and stock
/// decrements; equality of two snapshots means "same item", not "same state".
/// The index synchronizer relies on this: a later snapshot for the same id
/// replaces the document, it never creates a second one.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values; two
/// instances with the same values are interchangeable. Deduction requests and
/// catalog drafts/patches are value objects — a request is defined entirely by
/// which item it targets and how much it asks for.
///
/// To "modify" a value object, construct a new one. This keeps them safe to
/// copy across threads and into event payloads.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** - two instances
/// with the same attribute values are interchangeable. The validated input
/// structs that cross the service boundary (`NewStudent`, `NewCourse`) are
/// value objects: they carry no identity of their own, only the values a
/// record will take.
///
/// To "modify" a value object, build a new one. The trait requires `Clone`
/// (values are cheap to copy), `PartialEq` (compared by value) and `Debug`
/// (logging, test output).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

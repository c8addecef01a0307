use serde::{Deserialize, Serialize};
use std::fmt;

/// Default capacity applied when a field is created without one
/// (11 players per side).
pub const DEFAULT_CAPACITY: i32 = 22;

/// Unique identifier of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(i64);

impl FieldId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bookable physical sports surface.
///
/// `active` gates new bookings only; deactivating a field keeps its
/// historical reservations intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    /// Unique among all fields, active or not.
    pub name: String,
    pub description: Option<String>,
    pub capacity: i32,
    pub active: bool,
}

/// Minimal projection of a field joined onto reservation results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRef {
    pub id: FieldId,
    pub name: String,
}

impl From<&Field> for FieldRef {
    fn from(field: &Field) -> Self {
        Self {
            id: field.id,
            name: field.name.clone(),
        }
    }
}

/// Per-field usage counters for the statistics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUsage {
    pub id: FieldId,
    pub name: String,
    pub capacity: i32,
    pub active: bool,
    /// Reservations of any status referencing this field.
    pub total_reservations: usize,
    /// Reservations with status = active.
    pub active_reservations: usize,
}

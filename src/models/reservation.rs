use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::field::{FieldId, FieldRef};
use super::interval::TimeSlot;

/// Unique identifier of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(i64);

impl ReservationId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a reservation.
///
/// Only `Active` reservations participate in conflict checking; `Cancelled`
/// and `Completed` are terminal and never block new bookings. `Completed` is
/// never set automatically, only via an explicit edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Active,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(format!("Unknown reservation status: {}", other)),
        }
    }
}

/// A claim on a field for a specific date and time window by a student group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub field_id: FieldId,
    pub student_group: String,
    pub contact_name: String,
    pub contact_phone: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: ReservationStatus,
    pub notes: Option<String>,
}

impl Reservation {
    /// The `[start, end)` window this reservation occupies.
    pub fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.start_time, self.end_time)
    }

    /// Whether this reservation blocks the given window on the given date.
    /// Non-active reservations never block.
    pub fn blocks(&self, field_id: FieldId, date: NaiveDate, slot: &TimeSlot) -> bool {
        self.status == ReservationStatus::Active
            && self.field_id == field_id
            && self.date == date
            && self.slot().overlaps(slot)
    }
}

/// A reservation joined with the minimal projection of its field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationWithField {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub field: FieldRef,
}

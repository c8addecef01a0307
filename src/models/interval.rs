//! Half-open time interval logic.
//!
//! Reservations occupy `[start, end)` on a single calendar day: a reservation
//! ending exactly when another begins does not conflict. Cross-midnight spans
//! are not supported.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A `[start, end)` window of time-of-day on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether two same-day windows share at least one instant.
    ///
    /// Two intervals conflict unless one ends at or before the other begins:
    /// `self.start < other.end && self.end > other.start`. The relation is
    /// symmetric.
    ///
    /// Zero-length or inverted windows are not rejected here; interval
    /// validity is the caller's responsibility (see [`TimeSlot::is_valid`]).
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// A well-formed window has a strictly positive duration.
    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }
}

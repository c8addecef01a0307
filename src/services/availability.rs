//! Availability checking.
//!
//! Answers "is this field free on this date for this window?" with a fresh
//! read per call — results are never cached, since a stale answer here is a
//! double-booking waiting to happen. The same conflict count is re-computed
//! inside the repository's atomic unit when a booking is actually written;
//! this service exists for the read-only preview the frontend shows before
//! submitting.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::db::repository::{ConflictQuery, RepositoryError, RepositoryResult};
use crate::db::FullRepository;
use crate::models::{FieldId, ReservationId, TimeSlot};

/// Parameters of an availability check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvailabilityQuery {
    pub field_id: FieldId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Set when editing so the reservation is not counted against itself.
    pub exclude: Option<ReservationId>,
}

/// Outcome of an availability check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
    /// Number of active reservations overlapping the queried window.
    pub conflicts: usize,
}

/// Count active reservations overlapping the queried window.
///
/// Rejects inverted and zero-length windows: the source system accepted
/// them, but such a window can never overlap anything and would silently
/// always look free.
pub async fn check_availability(
    repo: &dyn FullRepository,
    query: AvailabilityQuery,
) -> RepositoryResult<Availability> {
    let slot = TimeSlot::new(query.start_time, query.end_time);
    if !slot.is_valid() {
        return Err(RepositoryError::validation(format!(
            "Invalid time window: start ({}) must be before end ({})",
            query.start_time, query.end_time
        )));
    }

    let conflicts = repo
        .count_conflicts(ConflictQuery {
            field_id: query.field_id,
            date: query.date,
            start_time: query.start_time,
            end_time: query.end_time,
            exclude: query.exclude,
        })
        .await?;

    Ok(Availability {
        available: conflicts == 0,
        conflicts,
    })
}

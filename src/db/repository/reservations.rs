//! Reservation repository trait and write records.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use super::error::RepositoryResult;
use crate::models::{FieldId, Reservation, ReservationId, ReservationWithField};

/// Validated data for creating or overwriting a reservation. Used for both
/// create and edit: an edit overwrites every mutable field, including
/// `field_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationRecord {
    pub field_id: FieldId,
    pub student_group: String,
    pub contact_name: String,
    pub contact_phone: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
}

/// Parameters of an availability lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConflictQuery {
    pub field_id: FieldId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Set when editing so a reservation never conflicts with itself.
    pub exclude: Option<ReservationId>,
}

/// Repository operations for reservations.
///
/// `create_reservation` and `update_reservation` must run the field and
/// overlap checks and the write as one atomic unit; callers rely on this to
/// keep the no-double-booking invariant under concurrency.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// All reservations joined with field id+name, ordered by date ascending
    /// then start time ascending.
    async fn list_reservations(&self) -> RepositoryResult<Vec<ReservationWithField>>;

    /// Reservations on one date, ordered by start time ascending.
    async fn list_reservations_by_date(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<ReservationWithField>>;

    /// Fetch one reservation with its field. Fails with `NotFound` when absent.
    async fn get_reservation(&self, id: ReservationId)
        -> RepositoryResult<ReservationWithField>;

    /// Count active reservations overlapping the queried window.
    ///
    /// Read-only and uncached: every call reflects the store state at call
    /// time. Staleness here would directly cause double-booking.
    async fn count_conflicts(&self, query: ConflictQuery) -> RepositoryResult<usize>;

    /// Create a reservation with status = active.
    ///
    /// Fails with `NotFound` when the field is absent and with `Conflict`
    /// when the field is inactive or the window overlaps an existing active
    /// reservation (reporting the conflict count). Check and insert are one
    /// atomic unit.
    async fn create_reservation(
        &self,
        record: ReservationRecord,
    ) -> RepositoryResult<ReservationWithField>;

    /// Overwrite all mutable fields of an existing reservation.
    ///
    /// Same checks as creation, with the reservation's own id excluded from
    /// the overlap count. Fails with `NotFound` when the reservation or the
    /// target field is absent.
    async fn update_reservation(
        &self,
        id: ReservationId,
        record: ReservationRecord,
    ) -> RepositoryResult<ReservationWithField>;

    /// Set status = cancelled. Idempotent: cancelling an already-cancelled
    /// reservation succeeds. Fails with `NotFound` when absent.
    async fn cancel_reservation(&self, id: ReservationId) -> RepositoryResult<Reservation>;

    /// Hard-delete regardless of status. Fails with `NotFound` when absent.
    async fn delete_reservation(&self, id: ReservationId) -> RepositoryResult<()>;

    /// Verify the backend is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}

//! Reservation lifecycle operations.
//!
//! Create and edit validate caller input here, then hand the write to the
//! repository, which re-checks field state and availability inside its own
//! atomic unit. Cancel is a soft status transition; delete is the explicit
//! destructive operation and removes the record regardless of status.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::db::repository::{RepositoryError, RepositoryResult, ReservationRecord};
use crate::db::FullRepository;
use crate::models::{FieldId, Reservation, ReservationId, ReservationWithField, TimeSlot};

/// Raw reservation input as submitted by the caller. Everything is optional
/// at this stage; [`ReservationInput::validate`] decides what is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationInput {
    pub field_id: Option<FieldId>,
    pub student_group: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub notes: Option<String>,
}

impl ReservationInput {
    /// Check required fields and interval validity, producing a write record.
    ///
    /// Blank strings count as missing, and all absent fields are reported in
    /// one message so the caller can fix the submission in a single pass.
    pub fn validate(self) -> RepositoryResult<ReservationRecord> {
        let mut missing = Vec::new();

        let student_group = self.student_group.filter(|s| !s.trim().is_empty());
        if student_group.is_none() {
            missing.push("student_group");
        }
        let contact_name = self.contact_name.filter(|s| !s.trim().is_empty());
        if contact_name.is_none() {
            missing.push("contact_name");
        }
        if self.date.is_none() {
            missing.push("date");
        }
        if self.start_time.is_none() {
            missing.push("start_time");
        }
        if self.end_time.is_none() {
            missing.push("end_time");
        }
        if self.field_id.is_none() {
            missing.push("field_id");
        }

        if !missing.is_empty() {
            return Err(RepositoryError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        // All present, checked above.
        let (Some(field_id), Some(student_group), Some(contact_name), Some(date), Some(start_time), Some(end_time)) =
            (self.field_id, student_group, contact_name, self.date, self.start_time, self.end_time)
        else {
            return Err(RepositoryError::internal("validated fields vanished"));
        };

        let slot = TimeSlot::new(start_time, end_time);
        if !slot.is_valid() {
            return Err(RepositoryError::validation(format!(
                "Invalid time window: start ({}) must be before end ({})",
                start_time, end_time
            )));
        }

        Ok(ReservationRecord {
            field_id,
            student_group,
            contact_name,
            contact_phone: self.contact_phone,
            date,
            start_time,
            end_time,
            notes: self.notes,
        })
    }
}

/// All reservations, date ascending then start time ascending.
pub async fn list_reservations(
    repo: &dyn FullRepository,
) -> RepositoryResult<Vec<ReservationWithField>> {
    repo.list_reservations().await
}

/// Reservations on one date, start time ascending.
pub async fn list_reservations_by_date(
    repo: &dyn FullRepository,
    date: NaiveDate,
) -> RepositoryResult<Vec<ReservationWithField>> {
    repo.list_reservations_by_date(date).await
}

/// One reservation with its field.
pub async fn get_reservation(
    repo: &dyn FullRepository,
    id: ReservationId,
) -> RepositoryResult<ReservationWithField> {
    repo.get_reservation(id).await
}

/// Create a reservation once input validation and the repository's atomic
/// availability check both pass.
pub async fn create_reservation(
    repo: &dyn FullRepository,
    input: ReservationInput,
) -> RepositoryResult<ReservationWithField> {
    let record = input.validate()?;
    repo.create_reservation(record).await
}

/// Overwrite all mutable fields of an existing reservation, excluding it from
/// its own availability check.
pub async fn update_reservation(
    repo: &dyn FullRepository,
    id: ReservationId,
    input: ReservationInput,
) -> RepositoryResult<ReservationWithField> {
    let record = input.validate()?;
    repo.update_reservation(id, record).await
}

/// Set status = cancelled. Idempotent.
pub async fn cancel_reservation(
    repo: &dyn FullRepository,
    id: ReservationId,
) -> RepositoryResult<Reservation> {
    repo.cancel_reservation(id).await
}

/// Permanently remove a reservation regardless of status.
pub async fn delete_reservation(
    repo: &dyn FullRepository,
    id: ReservationId,
) -> RepositoryResult<()> {
    repo.delete_reservation(id).await
}

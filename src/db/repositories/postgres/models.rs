use chrono::{NaiveDate, NaiveTime};
use diesel::prelude::*;

use super::schema::{fields, reservations};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{
    Field, FieldId, FieldRef, Reservation, ReservationId, ReservationStatus,
    ReservationWithField,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = fields)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FieldRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub capacity: i32,
    pub active: bool,
}

impl From<FieldRow> for Field {
    fn from(row: FieldRow) -> Self {
        Field {
            id: FieldId::new(row.id),
            name: row.name,
            description: row.description,
            capacity: row.capacity,
            active: row.active,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = fields)]
pub struct NewFieldRow {
    pub name: String,
    pub description: Option<String>,
    pub capacity: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reservations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReservationRow {
    pub id: i64,
    pub field_id: i64,
    pub student_group: String,
    pub contact_name: String,
    pub contact_phone: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub notes: Option<String>,
}

impl ReservationRow {
    /// Convert to the domain type; an unknown status string in the database
    /// is a data error, not a caller error.
    pub fn into_domain(self) -> RepositoryResult<Reservation> {
        let status: ReservationStatus = self
            .status
            .parse()
            .map_err(RepositoryError::internal)?;
        Ok(Reservation {
            id: ReservationId::new(self.id),
            field_id: FieldId::new(self.field_id),
            student_group: self.student_group,
            contact_name: self.contact_name,
            contact_phone: self.contact_phone,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            status,
            notes: self.notes,
        })
    }
}

/// Map a joined (reservation, field) row pair to the API projection.
pub fn join_rows(
    reservation: ReservationRow,
    field: FieldRow,
) -> RepositoryResult<ReservationWithField> {
    Ok(ReservationWithField {
        reservation: reservation.into_domain()?,
        field: FieldRef {
            id: FieldId::new(field.id),
            name: field.name,
        },
    })
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reservations)]
pub struct NewReservationRow {
    pub field_id: i64,
    pub student_group: String,
    pub contact_name: String,
    pub contact_phone: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub notes: Option<String>,
}

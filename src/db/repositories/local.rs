//! In-memory repository for unit testing and local development.
//!
//! State lives in a single `parking_lot::Mutex`; every operation takes the
//! lock for its whole duration, so check-then-act sequences (availability
//! before insert, name lookup before create) are atomic and the scheduling
//! invariant holds under concurrent callers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::db::repository::{
    ConflictQuery, ErrorContext, FieldPatch, FieldRepository, NewField, RepositoryError,
    RepositoryResult, ReservationRecord, ReservationRepository,
};
use crate::models::{
    Field, FieldId, FieldRef, FieldUsage, Reservation, ReservationId, ReservationStatus,
    ReservationWithField, TimeSlot,
};

#[derive(Debug, Default)]
struct Store {
    fields: BTreeMap<i64, Field>,
    reservations: BTreeMap<i64, Reservation>,
    next_field_id: i64,
    next_reservation_id: i64,
}

impl Store {
    fn field_not_found(id: FieldId) -> RepositoryError {
        RepositoryError::not_found_with_context(
            format!("Field {} not found", id),
            ErrorContext::default().with_entity("field").with_entity_id(id),
        )
    }

    fn reservation_not_found(id: ReservationId) -> RepositoryError {
        RepositoryError::not_found_with_context(
            format!("Reservation {} not found", id),
            ErrorContext::default()
                .with_entity("reservation")
                .with_entity_id(id),
        )
    }

    /// Active reservations overlapping the queried window.
    fn conflicts(&self, query: &ConflictQuery) -> usize {
        let slot = TimeSlot::new(query.start_time, query.end_time);
        self.reservations
            .values()
            .filter(|r| Some(r.id) != query.exclude)
            .filter(|r| r.blocks(query.field_id, query.date, &slot))
            .count()
    }

    /// Field existence + active gate shared by create and update.
    fn check_bookable(&self, field_id: FieldId) -> RepositoryResult<&Field> {
        let field = self
            .fields
            .get(&field_id.value())
            .ok_or_else(|| Self::field_not_found(field_id))?;
        if !field.active {
            return Err(RepositoryError::conflict_with_context(
                format!("Field '{}' is deactivated and cannot be booked", field.name),
                0,
                ErrorContext::new("check_bookable")
                    .with_entity("field")
                    .with_entity_id(field_id),
            ));
        }
        Ok(field)
    }

    fn joined(&self, reservation: &Reservation) -> RepositoryResult<ReservationWithField> {
        let field = self
            .fields
            .get(&reservation.field_id.value())
            .ok_or_else(|| {
                RepositoryError::internal(format!(
                    "Reservation {} references missing field {}",
                    reservation.id, reservation.field_id
                ))
            })?;
        Ok(ReservationWithField {
            reservation: reservation.clone(),
            field: FieldRef::from(field),
        })
    }

    fn name_taken(&self, name: &str, exclude: Option<FieldId>) -> bool {
        self.fields
            .values()
            .any(|f| f.name == name && Some(f.id) != exclude)
    }
}

/// In-memory implementation of the repository traits.
#[derive(Debug, Default)]
pub struct LocalRepository {
    store: Mutex<Store>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FieldRepository for LocalRepository {
    async fn list_active_fields(&self) -> RepositoryResult<Vec<Field>> {
        let store = self.store.lock();
        let mut fields: Vec<Field> = store.fields.values().filter(|f| f.active).cloned().collect();
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fields)
    }

    async fn list_fields(&self) -> RepositoryResult<Vec<Field>> {
        let store = self.store.lock();
        let mut fields: Vec<Field> = store.fields.values().cloned().collect();
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fields)
    }

    async fn get_field(&self, id: FieldId) -> RepositoryResult<Field> {
        let store = self.store.lock();
        store
            .fields
            .get(&id.value())
            .cloned()
            .ok_or_else(|| Store::field_not_found(id))
    }

    async fn create_field(&self, new: NewField) -> RepositoryResult<Field> {
        let mut store = self.store.lock();
        if store.name_taken(&new.name, None) {
            return Err(RepositoryError::conflict_with_context(
                format!("A field named '{}' already exists", new.name),
                1,
                ErrorContext::new("create_field").with_entity("field"),
            ));
        }

        store.next_field_id += 1;
        let field = Field {
            id: FieldId::new(store.next_field_id),
            name: new.name,
            description: new.description,
            capacity: new.capacity,
            active: true,
        };
        store.fields.insert(field.id.value(), field.clone());
        Ok(field)
    }

    async fn update_field(&self, id: FieldId, patch: FieldPatch) -> RepositoryResult<Field> {
        let mut store = self.store.lock();
        if !store.fields.contains_key(&id.value()) {
            return Err(Store::field_not_found(id));
        }
        if let Some(ref name) = patch.name {
            if store.name_taken(name, Some(id)) {
                return Err(RepositoryError::conflict_with_context(
                    format!("Another field named '{}' already exists", name),
                    1,
                    ErrorContext::new("update_field")
                        .with_entity("field")
                        .with_entity_id(id),
                ));
            }
        }

        let field = store
            .fields
            .get_mut(&id.value())
            .ok_or_else(|| Store::field_not_found(id))?;
        if let Some(name) = patch.name {
            field.name = name;
        }
        if let Some(description) = patch.description {
            field.description = Some(description);
        }
        if let Some(capacity) = patch.capacity {
            field.capacity = capacity;
        }
        if let Some(active) = patch.active {
            field.active = active;
        }
        Ok(field.clone())
    }

    async fn deactivate_field(&self, id: FieldId, today: NaiveDate) -> RepositoryResult<Field> {
        let mut store = self.store.lock();
        let field = store
            .fields
            .get(&id.value())
            .ok_or_else(|| Store::field_not_found(id))?;
        if !field.active {
            return Err(RepositoryError::validation_with_context(
                format!("Field '{}' is already deactivated", field.name),
                ErrorContext::new("deactivate_field")
                    .with_entity("field")
                    .with_entity_id(id),
            ));
        }

        let pending = store
            .reservations
            .values()
            .filter(|r| {
                r.field_id == id && r.status == ReservationStatus::Active && r.date >= today
            })
            .count();
        if pending > 0 {
            return Err(RepositoryError::conflict_with_context(
                format!(
                    "Field '{}' still has {} active upcoming reservation(s)",
                    field.name, pending
                ),
                pending,
                ErrorContext::new("deactivate_field")
                    .with_entity("field")
                    .with_entity_id(id),
            ));
        }

        let field = store
            .fields
            .get_mut(&id.value())
            .ok_or_else(|| Store::field_not_found(id))?;
        field.active = false;
        Ok(field.clone())
    }

    async fn activate_field(&self, id: FieldId) -> RepositoryResult<Field> {
        let mut store = self.store.lock();
        let field = store
            .fields
            .get_mut(&id.value())
            .ok_or_else(|| Store::field_not_found(id))?;
        if field.active {
            return Err(RepositoryError::validation_with_context(
                format!("Field '{}' is already active", field.name),
                ErrorContext::new("activate_field")
                    .with_entity("field")
                    .with_entity_id(id),
            ));
        }
        field.active = true;
        Ok(field.clone())
    }

    async fn delete_field(&self, id: FieldId) -> RepositoryResult<()> {
        let mut store = self.store.lock();
        let field = store
            .fields
            .get(&id.value())
            .ok_or_else(|| Store::field_not_found(id))?;

        let referencing = store
            .reservations
            .values()
            .filter(|r| r.field_id == id)
            .count();
        if referencing > 0 {
            return Err(RepositoryError::conflict_with_context(
                format!(
                    "Field '{}' has {} associated reservation(s); deactivate it instead",
                    field.name, referencing
                ),
                referencing,
                ErrorContext::new("delete_field")
                    .with_entity("field")
                    .with_entity_id(id),
            ));
        }

        store.fields.remove(&id.value());
        Ok(())
    }

    async fn field_usage(&self) -> RepositoryResult<Vec<FieldUsage>> {
        let store = self.store.lock();
        let mut usage: Vec<FieldUsage> = store
            .fields
            .values()
            .map(|field| {
                let total = store
                    .reservations
                    .values()
                    .filter(|r| r.field_id == field.id)
                    .count();
                let active = store
                    .reservations
                    .values()
                    .filter(|r| r.field_id == field.id && r.status == ReservationStatus::Active)
                    .count();
                FieldUsage {
                    id: field.id,
                    name: field.name.clone(),
                    capacity: field.capacity,
                    active: field.active,
                    total_reservations: total,
                    active_reservations: active,
                }
            })
            .collect();
        usage.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(usage)
    }
}

#[async_trait]
impl ReservationRepository for LocalRepository {
    async fn list_reservations(&self) -> RepositoryResult<Vec<ReservationWithField>> {
        let store = self.store.lock();
        let mut rows: Vec<ReservationWithField> = store
            .reservations
            .values()
            .map(|r| store.joined(r))
            .collect::<RepositoryResult<_>>()?;
        rows.sort_by_key(|r| (r.reservation.date, r.reservation.start_time));
        Ok(rows)
    }

    async fn list_reservations_by_date(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<ReservationWithField>> {
        let store = self.store.lock();
        let mut rows: Vec<ReservationWithField> = store
            .reservations
            .values()
            .filter(|r| r.date == date)
            .map(|r| store.joined(r))
            .collect::<RepositoryResult<_>>()?;
        rows.sort_by_key(|r| r.reservation.start_time);
        Ok(rows)
    }

    async fn get_reservation(
        &self,
        id: ReservationId,
    ) -> RepositoryResult<ReservationWithField> {
        let store = self.store.lock();
        let reservation = store
            .reservations
            .get(&id.value())
            .ok_or_else(|| Store::reservation_not_found(id))?;
        store.joined(reservation)
    }

    async fn count_conflicts(&self, query: ConflictQuery) -> RepositoryResult<usize> {
        let store = self.store.lock();
        Ok(store.conflicts(&query))
    }

    async fn create_reservation(
        &self,
        record: ReservationRecord,
    ) -> RepositoryResult<ReservationWithField> {
        let mut store = self.store.lock();
        store.check_bookable(record.field_id)?;

        let conflicts = store.conflicts(&ConflictQuery {
            field_id: record.field_id,
            date: record.date,
            start_time: record.start_time,
            end_time: record.end_time,
            exclude: None,
        });
        if conflicts > 0 {
            return Err(RepositoryError::conflict_with_context(
                "A reservation already exists in that time window",
                conflicts,
                ErrorContext::new("create_reservation")
                    .with_entity("reservation")
                    .with_details(format!(
                        "field_id={} date={}",
                        record.field_id, record.date
                    )),
            ));
        }

        store.next_reservation_id += 1;
        let reservation = Reservation {
            id: ReservationId::new(store.next_reservation_id),
            field_id: record.field_id,
            student_group: record.student_group,
            contact_name: record.contact_name,
            contact_phone: record.contact_phone,
            date: record.date,
            start_time: record.start_time,
            end_time: record.end_time,
            status: ReservationStatus::Active,
            notes: record.notes,
        };
        store
            .reservations
            .insert(reservation.id.value(), reservation.clone());
        store.joined(&reservation)
    }

    async fn update_reservation(
        &self,
        id: ReservationId,
        record: ReservationRecord,
    ) -> RepositoryResult<ReservationWithField> {
        let mut store = self.store.lock();
        if !store.reservations.contains_key(&id.value()) {
            return Err(Store::reservation_not_found(id));
        }
        store.check_bookable(record.field_id)?;

        let conflicts = store.conflicts(&ConflictQuery {
            field_id: record.field_id,
            date: record.date,
            start_time: record.start_time,
            end_time: record.end_time,
            exclude: Some(id),
        });
        if conflicts > 0 {
            return Err(RepositoryError::conflict_with_context(
                "A reservation already exists in that time window",
                conflicts,
                ErrorContext::new("update_reservation")
                    .with_entity("reservation")
                    .with_entity_id(id),
            ));
        }

        let reservation = store
            .reservations
            .get_mut(&id.value())
            .ok_or_else(|| Store::reservation_not_found(id))?;
        reservation.field_id = record.field_id;
        reservation.student_group = record.student_group;
        reservation.contact_name = record.contact_name;
        reservation.contact_phone = record.contact_phone;
        reservation.date = record.date;
        reservation.start_time = record.start_time;
        reservation.end_time = record.end_time;
        reservation.notes = record.notes;
        let reservation = reservation.clone();
        store.joined(&reservation)
    }

    async fn cancel_reservation(&self, id: ReservationId) -> RepositoryResult<Reservation> {
        let mut store = self.store.lock();
        let reservation = store
            .reservations
            .get_mut(&id.value())
            .ok_or_else(|| Store::reservation_not_found(id))?;
        reservation.status = ReservationStatus::Cancelled;
        Ok(reservation.clone())
    }

    async fn delete_reservation(&self, id: ReservationId) -> RepositoryResult<()> {
        let mut store = self.store.lock();
        store
            .reservations
            .remove(&id.value())
            .map(|_| ())
            .ok_or_else(|| Store::reservation_not_found(id))
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}

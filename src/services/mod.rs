//! Service layer: input validation and lifecycle orchestration.
//!
//! Services validate caller input (fail-fast, first violated precondition
//! wins), then delegate to the repository. State-dependent checks — name
//! uniqueness, the availability re-check before a booking write — run inside
//! the repository's atomic unit, so services never race against concurrent
//! writers.

pub mod availability;
pub mod fields;
pub mod reservations;

pub use availability::{check_availability, Availability, AvailabilityQuery};
pub use fields::{
    activate_field, create_field, deactivate_field, delete_field, field_usage, get_field,
    list_active_fields, seed_default_fields, update_field, FieldInput, FieldUpdateInput,
};
pub use reservations::{
    cancel_reservation, create_reservation, delete_reservation, get_reservation,
    list_reservations, list_reservations_by_date, update_reservation, ReservationInput,
};

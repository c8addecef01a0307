//! Domain model types.
//!
//! Entities are plain serde-friendly structs; identifiers are newtypes over
//! `i64` so a field id can never be passed where a reservation id is expected.

pub mod field;
pub mod interval;
pub mod reservation;

pub use field::{Field, FieldId, FieldRef, FieldUsage};
pub use interval::TimeSlot;
pub use reservation::{Reservation, ReservationId, ReservationStatus, ReservationWithField};

//! Repository trait definitions.
//!
//! The traits are the seam between the domain services and the storage
//! backends. Implementations must enforce the scheduling invariant inside
//! their own atomic unit: the availability re-check and the write happen
//! together, never as two unguarded steps.

pub mod error;
pub mod fields;
pub mod reservations;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use fields::{FieldPatch, FieldRepository, NewField};
pub use reservations::{ConflictQuery, ReservationRecord, ReservationRepository};

/// Combined repository interface: everything the application needs.
pub trait FullRepository: FieldRepository + ReservationRepository {}

impl<T: FieldRepository + ReservationRepository> FullRepository for T {}

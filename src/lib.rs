//! # Canchas Reservation Backend
//!
//! Backend for managing reservations of shared sports fields ("canchas") made
//! by student groups. Fields can be listed, created, edited, deactivated and
//! deleted; reservations claim a field for a date and a [start, end) time
//! window, and the scheduling core guarantees that no two active reservations
//! ever overlap on the same field and date.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: Domain entities (Field, Reservation) and interval logic
//! - [`db`]: Repository pattern and persistence backends (in-memory, Postgres)
//! - [`services`]: Availability checking and lifecycle orchestration
//! - [`http`]: Axum-based HTTP server and request handlers
//!
//! ## Concurrency
//!
//! The availability check is re-executed inside the storage backend's atomic
//! unit (a mutex-guarded critical section for the local backend, a
//! SERIALIZABLE transaction for Postgres), so two concurrent booking attempts
//! for overlapping windows can never both succeed.

pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;

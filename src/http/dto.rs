//! Data Transfer Objects for the HTTP API.
//!
//! The service-layer input structs already derive `Deserialize` and are used
//! directly as request bodies; this module re-exports them and adds the
//! response envelopes and query-parameter structs that only exist at the
//! HTTP boundary.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// Request bodies come straight from the service layer.
pub use crate::services::{FieldInput, FieldUpdateInput, ReservationInput};

// Domain types serialized directly in responses.
pub use crate::models::{Field, FieldUsage, Reservation, ReservationWithField};
pub use crate::services::Availability;

/// Response for the health check endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// API version
    pub version: String,
    /// Database connectivity status
    pub database: String,
}

/// Generic message envelope for operations without a richer payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Query parameters for the availability check.
///
/// Times use `HH:MM:SS`; `exclude` carries a reservation id to skip, set by
/// the frontend while editing.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityParams {
    pub field_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub exclude: Option<i64>,
}

/// Response for the seed endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedResponse {
    /// Number of fields created (0 when data already existed)
    pub created: usize,
    pub message: String,
}

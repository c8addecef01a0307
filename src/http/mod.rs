//! HTTP server module for the reservation backend.
//!
//! Exposes the field and reservation services as a REST API via axum. The
//! layer is deliberately thin: handlers parse requests, delegate to the
//! service layer, and translate `RepositoryError` variants into the
//! 400/404/409/500 status contract clients rely on for conflict handling.

#[cfg(feature = "http-server")]
pub mod dto;

#[cfg(feature = "http-server")]
pub mod error;

#[cfg(feature = "http-server")]
pub mod handlers;

#[cfg(feature = "http-server")]
pub mod router;

#[cfg(feature = "http-server")]
pub mod state;

#[cfg(feature = "http-server")]
pub use error::{ApiError, AppError};

#[cfg(feature = "http-server")]
pub use router::create_router;

#[cfg(feature = "http-server")]
pub use state::AppState;

//! Router configuration for the HTTP API.
//!
//! Sets up all routes and middleware (CORS, tracing) and produces the axum
//! router ready for serving.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Permissive CORS for development; restrict in production deployments.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Fields
        .route("/fields", get(handlers::list_fields))
        .route("/fields", post(handlers::create_field))
        .route("/fields/{id}", get(handlers::get_field))
        .route("/fields/{id}", put(handlers::update_field))
        .route("/fields/{id}", delete(handlers::deactivate_field))
        .route("/fields/{id}/activate", patch(handlers::activate_field))
        .route("/fields/{id}/permanent", delete(handlers::delete_field))
        // Reservations
        .route("/reservations", get(handlers::list_reservations))
        .route("/reservations", post(handlers::create_reservation))
        .route(
            "/reservations/date/{date}",
            get(handlers::list_reservations_by_date),
        )
        .route("/reservations/{id}", get(handlers::get_reservation))
        .route("/reservations/{id}", put(handlers::update_reservation))
        .route("/reservations/{id}", delete(handlers::delete_reservation))
        .route(
            "/reservations/{id}/cancel",
            patch(handlers::cancel_reservation),
        )
        // Availability and stats
        .route("/availability", get(handlers::check_availability))
        .route("/stats/field-usage", get(handlers::field_usage))
        .route("/seed", post(handlers::seed_default_fields));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to one endpoint and delegates to the service
//! layer; error translation happens in [`super::error`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;

use super::dto::{
    Availability, AvailabilityParams, Field, FieldInput, FieldUpdateInput, FieldUsage,
    HealthResponse, MessageResponse, Reservation, ReservationInput, ReservationWithField,
    SeedResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::{FieldId, ReservationId};
use crate::services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Verify the service is running and storage is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Fields
// =============================================================================

/// GET /api/fields
///
/// List active fields, name ascending.
pub async fn list_fields(State(state): State<AppState>) -> HandlerResult<Vec<Field>> {
    let fields = services::list_active_fields(state.repository.as_ref()).await?;
    Ok(Json(fields))
}

/// GET /api/fields/{id}
pub async fn get_field(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Field> {
    let field = services::get_field(state.repository.as_ref(), FieldId::new(id)).await?;
    Ok(Json(field))
}

/// POST /api/fields
pub async fn create_field(
    State(state): State<AppState>,
    Json(input): Json<FieldInput>,
) -> Result<(StatusCode, Json<Field>), AppError> {
    let field = services::create_field(state.repository.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(field)))
}

/// PUT /api/fields/{id}
pub async fn update_field(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<FieldUpdateInput>,
) -> HandlerResult<Field> {
    let field = services::update_field(state.repository.as_ref(), FieldId::new(id), input).await?;
    Ok(Json(field))
}

/// DELETE /api/fields/{id}
///
/// Soft delete: marks the field inactive. Refused with 409 while active
/// reservations dated today or later exist.
pub async fn deactivate_field(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Field> {
    let field = services::deactivate_field(state.repository.as_ref(), FieldId::new(id)).await?;
    Ok(Json(field))
}

/// PATCH /api/fields/{id}/activate
///
/// Reactivate an inactive field. 400 when it is already active.
pub async fn activate_field(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Field> {
    let field = services::activate_field(state.repository.as_ref(), FieldId::new(id)).await?;
    Ok(Json(field))
}

/// DELETE /api/fields/{id}/permanent
///
/// Hard delete. Refused with 409 while any reservation references the field.
pub async fn delete_field(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    services::delete_field(state.repository.as_ref(), FieldId::new(id)).await?;
    Ok(Json(MessageResponse {
        message: format!("Field {} deleted", id),
    }))
}

/// GET /api/stats/field-usage
///
/// Per-field reservation counters, including inactive fields.
pub async fn field_usage(State(state): State<AppState>) -> HandlerResult<Vec<FieldUsage>> {
    let usage = services::field_usage(state.repository.as_ref()).await?;
    Ok(Json(usage))
}

/// POST /api/seed
///
/// Create the default fields when the store is empty. Safe to call again;
/// a populated store is left untouched.
pub async fn seed_default_fields(State(state): State<AppState>) -> HandlerResult<SeedResponse> {
    let created = services::seed_default_fields(state.repository.as_ref()).await?;
    let message = if created > 0 {
        format!("Created {} default fields", created)
    } else {
        "Fields already present, nothing created".to_string()
    };
    Ok(Json(SeedResponse { created, message }))
}

// =============================================================================
// Reservations
// =============================================================================

/// GET /api/reservations
///
/// All reservations with their field, date then start time ascending.
pub async fn list_reservations(
    State(state): State<AppState>,
) -> HandlerResult<Vec<ReservationWithField>> {
    let reservations = services::list_reservations(state.repository.as_ref()).await?;
    Ok(Json(reservations))
}

/// GET /api/reservations/date/{date}
pub async fn list_reservations_by_date(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> HandlerResult<Vec<ReservationWithField>> {
    let reservations =
        services::list_reservations_by_date(state.repository.as_ref(), date).await?;
    Ok(Json(reservations))
}

/// GET /api/reservations/{id}
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<ReservationWithField> {
    let reservation =
        services::get_reservation(state.repository.as_ref(), ReservationId::new(id)).await?;
    Ok(Json(reservation))
}

/// POST /api/reservations
///
/// Create a reservation. 409 with the conflict count when the window
/// overlaps an active reservation on the same field and date.
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(input): Json<ReservationInput>,
) -> Result<(StatusCode, Json<ReservationWithField>), AppError> {
    let created = services::create_reservation(state.repository.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/reservations/{id}
///
/// Full overwrite of the reservation's mutable fields; the reservation is
/// excluded from its own availability check.
pub async fn update_reservation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ReservationInput>,
) -> HandlerResult<ReservationWithField> {
    let updated =
        services::update_reservation(state.repository.as_ref(), ReservationId::new(id), input)
            .await?;
    Ok(Json(updated))
}

/// PATCH /api/reservations/{id}/cancel
///
/// Idempotent: cancelling an already-cancelled reservation succeeds.
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Reservation> {
    let cancelled =
        services::cancel_reservation(state.repository.as_ref(), ReservationId::new(id)).await?;
    Ok(Json(cancelled))
}

/// DELETE /api/reservations/{id}
///
/// Permanent removal regardless of status.
pub async fn delete_reservation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    services::delete_reservation(state.repository.as_ref(), ReservationId::new(id)).await?;
    Ok(Json(MessageResponse {
        message: format!("Reservation {} deleted", id),
    }))
}

// =============================================================================
// Availability
// =============================================================================

/// GET /api/availability
///
/// Read-only preview; the authoritative check runs again inside the write.
pub async fn check_availability(
    State(state): State<AppState>,
    Query(params): Query<AvailabilityParams>,
) -> HandlerResult<Availability> {
    let result = services::check_availability(
        state.repository.as_ref(),
        services::AvailabilityQuery {
            field_id: FieldId::new(params.field_id),
            date: params.date,
            start_time: params.start_time,
            end_time: params.end_time,
            exclude: params.exclude.map(ReservationId::new),
        },
    )
    .await?;
    Ok(Json(result))
}

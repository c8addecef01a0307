//! End-to-end service flow over the in-memory backend: seed, book, check
//! availability, edit, cancel, and clean up — the sequence the HTTP layer
//! drives in production.

#![cfg(feature = "local-repo")]

use chrono::{NaiveDate, NaiveTime};

use canchas_backend::db::repository::RepositoryError;
use canchas_backend::db::LocalRepository;
use canchas_backend::services::{
    self, AvailabilityQuery, FieldInput, FieldUpdateInput, ReservationInput,
};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn booking(field_id: canchas_backend::models::FieldId, start: NaiveTime, end: NaiveTime) -> ReservationInput {
    ReservationInput {
        field_id: Some(field_id),
        student_group: Some("Equipo de Arquitectura".to_string()),
        contact_name: Some("Carlos Rivas".to_string()),
        contact_phone: Some("7777-8888".to_string()),
        date: Some(day()),
        start_time: Some(start),
        end_time: Some(end),
        notes: Some("partido amistoso".to_string()),
    }
}

#[tokio::test]
async fn test_full_booking_flow() {
    let repo = LocalRepository::new();

    // Seed the default fields, then confirm re-seeding is a no-op.
    assert_eq!(services::seed_default_fields(&repo).await.unwrap(), 4);
    assert_eq!(services::seed_default_fields(&repo).await.unwrap(), 0);

    let fields = services::list_active_fields(&repo).await.unwrap();
    assert_eq!(fields.len(), 4);
    let field = &fields[0];

    // The window starts free.
    let check = services::check_availability(
        &repo,
        AvailabilityQuery {
            field_id: field.id,
            date: day(),
            start_time: t(18, 0),
            end_time: t(20, 0),
            exclude: None,
        },
    )
    .await
    .unwrap();
    assert!(check.available);

    // Book it.
    let created = services::create_reservation(&repo, booking(field.id, t(18, 0), t(20, 0)))
        .await
        .unwrap();
    assert_eq!(created.field.name, field.name);

    // A second overlapping attempt is refused.
    let err = services::create_reservation(&repo, booking(field.id, t(19, 0), t(21, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { conflicts: 1, .. }));

    // An availability preview agrees with the write path.
    let check = services::check_availability(
        &repo,
        AvailabilityQuery {
            field_id: field.id,
            date: day(),
            start_time: t(19, 0),
            end_time: t(21, 0),
            exclude: None,
        },
    )
    .await
    .unwrap();
    assert!(!check.available);
    assert_eq!(check.conflicts, 1);

    // Editing the booking into an adjacent window succeeds: the record is
    // excluded from its own check.
    let updated = services::update_reservation(
        &repo,
        created.reservation.id,
        booking(field.id, t(17, 0), t(19, 0)),
    )
    .await
    .unwrap();
    assert_eq!(updated.reservation.start_time, t(17, 0));

    // Cancel frees the window for the next group.
    services::cancel_reservation(&repo, created.reservation.id)
        .await
        .unwrap();
    services::create_reservation(&repo, booking(field.id, t(17, 0), t(19, 0)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_field_lifecycle_gating() {
    let repo = LocalRepository::new();
    let field = services::create_field(
        &repo,
        FieldInput {
            name: Some("Cancha Central".to_string()),
            description: None,
            capacity: None,
        },
    )
    .await
    .unwrap();

    // Book well into the future so the deactivation gate sees it.
    let future = chrono::Local::now().date_naive() + chrono::Days::new(30);
    let mut input = booking(field.id, t(10, 0), t(12, 0));
    input.date = Some(future);
    let created = services::create_reservation(&repo, input).await.unwrap();

    let err = services::deactivate_field(&repo, field.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { conflicts: 1, .. }));

    services::cancel_reservation(&repo, created.reservation.id)
        .await
        .unwrap();
    let field_after = services::deactivate_field(&repo, field.id).await.unwrap();
    assert!(!field_after.active);

    // Hard delete still blocked: the cancelled reservation references the field.
    let err = services::delete_field(&repo, field.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));

    services::delete_reservation(&repo, created.reservation.id)
        .await
        .unwrap();
    services::delete_field(&repo, field.id).await.unwrap();
}

#[tokio::test]
async fn test_rename_survives_merge_patch() {
    let repo = LocalRepository::new();
    let field = services::create_field(
        &repo,
        FieldInput {
            name: Some("Cancha 1".to_string()),
            description: Some("cesped natural".to_string()),
            capacity: Some(18),
        },
    )
    .await
    .unwrap();

    let updated = services::update_field(
        &repo,
        field.id,
        FieldUpdateInput {
            name: Some("Cancha Norte".to_string()),
            description: None,
            capacity: None,
            active: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.name, "Cancha Norte");
    assert_eq!(updated.description.as_deref(), Some("cesped natural"));
    assert_eq!(updated.capacity, 18);
}

#[tokio::test]
async fn test_usage_stats_across_fields() {
    let repo = LocalRepository::new();
    services::seed_default_fields(&repo).await.unwrap();
    let fields = services::list_active_fields(&repo).await.unwrap();

    services::create_reservation(&repo, booking(fields[0].id, t(9, 0), t(10, 0)))
        .await
        .unwrap();
    services::create_reservation(&repo, booking(fields[0].id, t(10, 0), t(11, 0)))
        .await
        .unwrap();
    services::create_reservation(&repo, booking(fields[1].id, t(9, 0), t(10, 0)))
        .await
        .unwrap();

    let usage = services::field_usage(&repo).await.unwrap();
    assert_eq!(usage.len(), 4);
    assert_eq!(usage[0].total_reservations, 2);
    assert_eq!(usage[1].total_reservations, 1);
    assert_eq!(usage[2].total_reservations, 0);
}

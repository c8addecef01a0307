//! Integration tests for the in-memory repository backend.
//!
//! Exercise the repository trait directly: business rules live inside the
//! repository's atomic unit, so they must hold no matter which service calls
//! in.

#![cfg(feature = "local-repo")]

use chrono::{NaiveDate, NaiveTime};

use canchas_backend::db::repository::{
    ConflictQuery, FieldPatch, FieldRepository, NewField, RepositoryError, ReservationRecord,
    ReservationRepository,
};
use canchas_backend::db::LocalRepository;
use canchas_backend::models::{Field, ReservationStatus};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn d(y: i32, mo: u32, da: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, mo, da).unwrap()
}

async fn field(repo: &LocalRepository, name: &str) -> Field {
    repo.create_field(NewField {
        name: name.to_string(),
        description: None,
        capacity: 22,
    })
    .await
    .unwrap()
}

fn record(field: &Field, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> ReservationRecord {
    ReservationRecord {
        field_id: field.id,
        student_group: "Seleccion de Derecho".to_string(),
        contact_name: "Ana Castro".to_string(),
        contact_phone: Some("5555-0001".to_string()),
        date,
        start_time: start,
        end_time: end,
        notes: None,
    }
}

#[tokio::test]
async fn test_health_check() {
    let repo = LocalRepository::new();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn test_field_names_are_unique() {
    let repo = LocalRepository::new();
    field(&repo, "Cancha 1").await;

    let err = repo
        .create_field(NewField {
            name: "Cancha 1".to_string(),
            description: Some("duplicate".to_string()),
            capacity: 10,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));
}

#[tokio::test]
async fn test_active_listing_sorted_by_name() {
    let repo = LocalRepository::new();
    field(&repo, "Cancha 3").await;
    field(&repo, "Cancha 1").await;
    field(&repo, "Cancha 2").await;

    let names: Vec<String> = repo
        .list_active_fields()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, vec!["Cancha 1", "Cancha 2", "Cancha 3"]);
}

#[tokio::test]
async fn test_update_field_patch_semantics() {
    let repo = LocalRepository::new();
    let f = field(&repo, "Cancha 1").await;

    let updated = repo
        .update_field(
            f.id,
            FieldPatch {
                name: None,
                description: Some("resurfaced".to_string()),
                capacity: Some(11),
                active: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Cancha 1");
    assert_eq!(updated.description.as_deref(), Some("resurfaced"));
    assert_eq!(updated.capacity, 11);
    assert!(updated.active);
}

#[tokio::test]
async fn test_conflict_count_scoped_to_field_and_date() {
    let repo = LocalRepository::new();
    let a = field(&repo, "Cancha 1").await;
    let b = field(&repo, "Cancha 2").await;
    let day = d(2024, 5, 10);

    repo.create_reservation(record(&a, day, t(10, 0), t(12, 0)))
        .await
        .unwrap();
    // Same window, other field.
    repo.create_reservation(record(&b, day, t(10, 0), t(12, 0)))
        .await
        .unwrap();
    // Same field, other date.
    repo.create_reservation(record(&a, d(2024, 5, 11), t(10, 0), t(12, 0)))
        .await
        .unwrap();

    let count = repo
        .count_conflicts(ConflictQuery {
            field_id: a.id,
            date: day,
            start_time: t(11, 0),
            end_time: t(13, 0),
            exclude: None,
        })
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_create_rejects_overlap_and_reports_count() {
    let repo = LocalRepository::new();
    let f = field(&repo, "Cancha 1").await;
    let day = d(2024, 5, 10);

    repo.create_reservation(record(&f, day, t(9, 0), t(11, 0)))
        .await
        .unwrap();
    repo.create_reservation(record(&f, day, t(11, 0), t(13, 0)))
        .await
        .unwrap();

    // Spans both existing bookings.
    let err = repo
        .create_reservation(record(&f, day, t(10, 0), t(12, 0)))
        .await
        .unwrap_err();
    match err {
        RepositoryError::Conflict { conflicts, .. } => assert_eq!(conflicts, 2),
        other => panic!("expected Conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_inactive_field_is_not_bookable() {
    let repo = LocalRepository::new();
    let f = field(&repo, "Cancha 1").await;
    repo.deactivate_field(f.id, d(2020, 1, 1)).await.unwrap();

    let err = repo
        .create_reservation(record(&f, d(2024, 5, 10), t(9, 0), t(10, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));
}

#[tokio::test]
async fn test_unknown_field_is_not_found() {
    let repo = LocalRepository::new();
    let f = field(&repo, "Cancha 1").await;
    let mut rec = record(&f, d(2024, 5, 10), t(9, 0), t(10, 0));
    rec.field_id = canchas_backend::models::FieldId::new(999);

    let err = repo.create_reservation(rec).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_listing_sorted_by_date_then_start() {
    let repo = LocalRepository::new();
    let f = field(&repo, "Cancha 1").await;

    repo.create_reservation(record(&f, d(2024, 5, 11), t(9, 0), t(10, 0)))
        .await
        .unwrap();
    repo.create_reservation(record(&f, d(2024, 5, 10), t(14, 0), t(15, 0)))
        .await
        .unwrap();
    repo.create_reservation(record(&f, d(2024, 5, 10), t(9, 0), t(10, 0)))
        .await
        .unwrap();

    let listed = repo.list_reservations().await.unwrap();
    let keys: Vec<(NaiveDate, NaiveTime)> = listed
        .iter()
        .map(|r| (r.reservation.date, r.reservation.start_time))
        .collect();
    assert_eq!(
        keys,
        vec![
            (d(2024, 5, 10), t(9, 0)),
            (d(2024, 5, 10), t(14, 0)),
            (d(2024, 5, 11), t(9, 0)),
        ]
    );
}

#[tokio::test]
async fn test_cancel_is_idempotent_and_frees_window() {
    let repo = LocalRepository::new();
    let f = field(&repo, "Cancha 1").await;
    let day = d(2024, 5, 10);
    let created = repo
        .create_reservation(record(&f, day, t(9, 0), t(10, 0)))
        .await
        .unwrap();

    let first = repo.cancel_reservation(created.reservation.id).await.unwrap();
    assert_eq!(first.status, ReservationStatus::Cancelled);
    let second = repo.cancel_reservation(created.reservation.id).await.unwrap();
    assert_eq!(second.status, ReservationStatus::Cancelled);

    // The window is free again.
    repo.create_reservation(record(&f, day, t(9, 0), t(10, 0)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_reservation_is_full_overwrite() {
    let repo = LocalRepository::new();
    let f = field(&repo, "Cancha 1").await;
    let day = d(2024, 5, 10);
    let created = repo
        .create_reservation(record(&f, day, t(9, 0), t(10, 0)))
        .await
        .unwrap();

    let mut rec = record(&f, day, t(15, 0), t(16, 0));
    rec.contact_phone = None; // Overwrite drops the phone
    let updated = repo
        .update_reservation(created.reservation.id, rec)
        .await
        .unwrap();
    assert_eq!(updated.reservation.start_time, t(15, 0));
    assert_eq!(updated.reservation.contact_phone, None);
    // Status is not touched by an edit.
    assert_eq!(updated.reservation.status, ReservationStatus::Active);
}

#[tokio::test]
async fn test_delete_reservation_removes_record() {
    let repo = LocalRepository::new();
    let f = field(&repo, "Cancha 1").await;
    let created = repo
        .create_reservation(record(&f, d(2024, 5, 10), t(9, 0), t(10, 0)))
        .await
        .unwrap();

    repo.delete_reservation(created.reservation.id).await.unwrap();
    let err = repo.get_reservation(created.reservation.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    let err = repo.delete_reservation(created.reservation.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_field_usage_counts_by_status() {
    let repo = LocalRepository::new();
    let f = field(&repo, "Cancha 1").await;
    let day = d(2024, 5, 10);

    let first = repo
        .create_reservation(record(&f, day, t(9, 0), t(10, 0)))
        .await
        .unwrap();
    repo.create_reservation(record(&f, day, t(10, 0), t(11, 0)))
        .await
        .unwrap();
    repo.cancel_reservation(first.reservation.id).await.unwrap();

    let usage = repo.field_usage().await.unwrap();
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].total_reservations, 2);
    assert_eq!(usage[0].active_reservations, 1);
}

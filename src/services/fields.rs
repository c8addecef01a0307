//! Field lifecycle operations.
//!
//! Creation applies the default capacity when none is given; update is a
//! merge-patch where unspecified inputs keep the stored value. Deactivation
//! is the soft delete; hard deletion is only possible for fields no
//! reservation has ever referenced.

use serde::Deserialize;

use crate::db::repository::{FieldPatch, NewField, RepositoryError, RepositoryResult};
use crate::db::FullRepository;
use crate::models::field::DEFAULT_CAPACITY;
use crate::models::{Field, FieldId, FieldUsage};

/// Raw field-creation input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<i32>,
}

impl FieldInput {
    fn validate(self) -> RepositoryResult<NewField> {
        let name = self
            .name
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| RepositoryError::validation("Field name is required"))?;

        let capacity = self.capacity.unwrap_or(DEFAULT_CAPACITY);
        if capacity <= 0 {
            return Err(RepositoryError::validation(format!(
                "Capacity must be positive, got {}",
                capacity
            )));
        }

        Ok(NewField {
            name,
            description: self.description,
            capacity,
        })
    }
}

/// Raw field-update input. `None` keeps the stored value; the name is
/// still required, matching create.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldUpdateInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<i32>,
    pub active: Option<bool>,
}

impl FieldUpdateInput {
    fn validate(self) -> RepositoryResult<FieldPatch> {
        let name = self
            .name
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| RepositoryError::validation("Field name is required"))?;

        if let Some(capacity) = self.capacity {
            if capacity <= 0 {
                return Err(RepositoryError::validation(format!(
                    "Capacity must be positive, got {}",
                    capacity
                )));
            }
        }

        Ok(FieldPatch {
            name: Some(name),
            description: self.description,
            capacity: self.capacity,
            active: self.active,
        })
    }
}

/// All active fields, name ascending.
pub async fn list_active_fields(repo: &dyn FullRepository) -> RepositoryResult<Vec<Field>> {
    repo.list_active_fields().await
}

/// One field by id, active or not.
pub async fn get_field(repo: &dyn FullRepository, id: FieldId) -> RepositoryResult<Field> {
    repo.get_field(id).await
}

/// Create a field, defaulting capacity when absent.
pub async fn create_field(
    repo: &dyn FullRepository,
    input: FieldInput,
) -> RepositoryResult<Field> {
    let new = input.validate()?;
    repo.create_field(new).await
}

/// Merge-patch an existing field.
pub async fn update_field(
    repo: &dyn FullRepository,
    id: FieldId,
    input: FieldUpdateInput,
) -> RepositoryResult<Field> {
    let patch = input.validate()?;
    repo.update_field(id, patch).await
}

/// Soft-delete a field. Blocked while active reservations dated today or
/// later still exist.
pub async fn deactivate_field(
    repo: &dyn FullRepository,
    id: FieldId,
) -> RepositoryResult<Field> {
    let today = chrono::Local::now().date_naive();
    repo.deactivate_field(id, today).await
}

/// Reactivate a field. Fails when the field is already active.
pub async fn activate_field(repo: &dyn FullRepository, id: FieldId) -> RepositoryResult<Field> {
    repo.activate_field(id).await
}

/// Hard-delete a field that no reservation references.
pub async fn delete_field(repo: &dyn FullRepository, id: FieldId) -> RepositoryResult<()> {
    repo.delete_field(id).await
}

/// Per-field reservation counters.
pub async fn field_usage(repo: &dyn FullRepository) -> RepositoryResult<Vec<FieldUsage>> {
    repo.field_usage().await
}

/// Create the four default fields when the store holds none.
///
/// Returns the number of fields created (0 when the store was already
/// populated).
pub async fn seed_default_fields(repo: &dyn FullRepository) -> RepositoryResult<usize> {
    if !repo.list_fields().await?.is_empty() {
        return Ok(0);
    }

    let defaults = [
        ("Cancha 1", "Sector 1 - natural grass football field"),
        ("Cancha 2", "Sector 2 - synthetic turf football field"),
        ("Cancha 3", "Sector 3 - mixed-use football field"),
        ("Cancha 4", "Sector 4 - training football field"),
    ];
    for (name, description) in defaults {
        repo.create_field(NewField {
            name: name.to_string(),
            description: Some(description.to_string()),
            capacity: DEFAULT_CAPACITY,
        })
        .await?;
    }
    Ok(defaults.len())
}

#[cfg(all(test, feature = "local-repo"))]
mod tests {
    use super::*;
    use crate::db::repository::{ReservationRecord, ReservationRepository};
    use crate::db::LocalRepository;
    use chrono::{NaiveDate, NaiveTime};

    fn named(name: &str) -> FieldInput {
        FieldInput {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn record(field: &Field, date: NaiveDate) -> ReservationRecord {
        ReservationRecord {
            field_id: field.id,
            student_group: "Grupo de Ingeniería".to_string(),
            contact_name: "Juan Pérez".to_string(),
            contact_phone: None,
            date,
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_applies_default_capacity() {
        let repo = LocalRepository::new();
        let field = create_field(&repo, named("Cancha 1")).await.unwrap();
        assert_eq!(field.capacity, DEFAULT_CAPACITY);
        assert!(field.active);
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let repo = LocalRepository::new();
        let err = create_field(&repo, FieldInput::default()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));

        let err = create_field(&repo, named("  ")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() {
        let repo = LocalRepository::new();
        create_field(&repo, named("Cancha 1")).await.unwrap();
        let err = create_field(&repo, named("Cancha 1")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_capacity() {
        let repo = LocalRepository::new();
        let mut input = named("Cancha 1");
        input.capacity = Some(0);
        let err = create_field(&repo, input).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_update_is_merge_patch() {
        let repo = LocalRepository::new();
        let mut input = named("Cancha 1");
        input.description = Some("grass".to_string());
        input.capacity = Some(10);
        let field = create_field(&repo, input).await.unwrap();

        // Only the name is supplied; description and capacity survive.
        let updated = update_field(
            &repo,
            field.id,
            FieldUpdateInput {
                name: Some("Cancha Principal".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Cancha Principal");
        assert_eq!(updated.description.as_deref(), Some("grass"));
        assert_eq!(updated.capacity, 10);
    }

    #[tokio::test]
    async fn test_update_name_collision_excludes_self() {
        let repo = LocalRepository::new();
        let field = create_field(&repo, named("Cancha 1")).await.unwrap();
        create_field(&repo, named("Cancha 2")).await.unwrap();

        // Re-submitting its own name is fine.
        let same = update_field(
            &repo,
            field.id,
            FieldUpdateInput {
                name: Some("Cancha 1".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(same.is_ok());

        // Taking another field's name is not.
        let err = update_field(
            &repo,
            field.id,
            FieldUpdateInput {
                name: Some("Cancha 2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_deactivate_blocked_by_upcoming_reservation() {
        let repo = LocalRepository::new();
        let field = create_field(&repo, named("Cancha 1")).await.unwrap();
        let tomorrow = chrono::Local::now().date_naive() + chrono::Days::new(1);
        let created = repo.create_reservation(record(&field, tomorrow)).await.unwrap();

        let err = deactivate_field(&repo, field.id).await.unwrap_err();
        match err {
            RepositoryError::Conflict { conflicts, .. } => assert_eq!(conflicts, 1),
            other => panic!("expected Conflict, got {:?}", other),
        }

        // After cancelling the blocking reservation, deactivation succeeds.
        repo.cancel_reservation(created.reservation.id).await.unwrap();
        let field = deactivate_field(&repo, field.id).await.unwrap();
        assert!(!field.active);
    }

    #[tokio::test]
    async fn test_deactivate_ignores_past_reservations() {
        let repo = LocalRepository::new();
        let field = create_field(&repo, named("Cancha 1")).await.unwrap();
        let yesterday = chrono::Local::now().date_naive() - chrono::Days::new(1);
        repo.create_reservation(record(&field, yesterday)).await.unwrap();

        let field = deactivate_field(&repo, field.id).await.unwrap();
        assert!(!field.active);
    }

    #[tokio::test]
    async fn test_deactivate_twice_is_a_validation_error() {
        let repo = LocalRepository::new();
        let field = create_field(&repo, named("Cancha 1")).await.unwrap();
        deactivate_field(&repo, field.id).await.unwrap();

        let err = deactivate_field(&repo, field.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_activate_only_from_inactive() {
        let repo = LocalRepository::new();
        let field = create_field(&repo, named("Cancha 1")).await.unwrap();

        // Already active: user error, not a no-op.
        let err = activate_field(&repo, field.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));

        deactivate_field(&repo, field.id).await.unwrap();
        let field = activate_field(&repo, field.id).await.unwrap();
        assert!(field.active);
    }

    #[tokio::test]
    async fn test_delete_blocked_by_any_reservation() {
        let repo = LocalRepository::new();
        let field = create_field(&repo, named("Cancha 1")).await.unwrap();
        let yesterday = chrono::Local::now().date_naive() - chrono::Days::new(1);
        let created = repo.create_reservation(record(&field, yesterday)).await.unwrap();
        repo.cancel_reservation(created.reservation.id).await.unwrap();

        // Even a cancelled, past reservation blocks hard deletion.
        let err = delete_field(&repo, field.id).await.unwrap_err();
        match err {
            RepositoryError::Conflict { conflicts, .. } => assert_eq!(conflicts, 1),
            other => panic!("expected Conflict, got {:?}", other),
        }

        repo.delete_reservation(created.reservation.id).await.unwrap();
        delete_field(&repo, field.id).await.unwrap();
        assert!(matches!(
            get_field(&repo, field.id).await.unwrap_err(),
            RepositoryError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_inactive_fields_hidden_from_active_listing() {
        let repo = LocalRepository::new();
        let field = create_field(&repo, named("Cancha 1")).await.unwrap();
        create_field(&repo, named("Cancha 2")).await.unwrap();
        deactivate_field(&repo, field.id).await.unwrap();

        let active = list_active_fields(&repo).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Cancha 2");
    }

    #[tokio::test]
    async fn test_usage_counts() {
        let repo = LocalRepository::new();
        let field = create_field(&repo, named("Cancha 1")).await.unwrap();
        create_field(&repo, named("Cancha 2")).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let first = repo.create_reservation(record(&field, date)).await.unwrap();
        let mut second = record(&field, date);
        second.start_time = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        second.end_time = NaiveTime::from_hms_opt(13, 0, 0).unwrap();
        repo.create_reservation(second).await.unwrap();
        repo.cancel_reservation(first.reservation.id).await.unwrap();

        let usage = field_usage(&repo).await.unwrap();
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].total_reservations, 2);
        assert_eq!(usage[0].active_reservations, 1);
        assert_eq!(usage[1].total_reservations, 0);
    }

    #[tokio::test]
    async fn test_seed_is_one_shot() {
        let repo = LocalRepository::new();
        assert_eq!(seed_default_fields(&repo).await.unwrap(), 4);
        assert_eq!(seed_default_fields(&repo).await.unwrap(), 0);
        assert_eq!(list_active_fields(&repo).await.unwrap().len(), 4);
    }
}

//! Field repository trait and write records.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{Field, FieldId, FieldUsage};

/// Data required to create a field. Capacity is already defaulted by the
/// service layer; name uniqueness is enforced by the implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewField {
    pub name: String,
    pub description: Option<String>,
    pub capacity: i32,
}

/// Merge-patch for a field update: `None` keeps the stored value.
/// The name is always present because it is a required input of the
/// update operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<i32>,
    pub active: Option<bool>,
}

/// Repository operations for fields.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait FieldRepository: Send + Sync {
    /// All active fields, ordered by name ascending.
    async fn list_active_fields(&self) -> RepositoryResult<Vec<Field>>;

    /// All fields regardless of `active`, ordered by name ascending.
    async fn list_fields(&self) -> RepositoryResult<Vec<Field>>;

    /// Fetch one field. Fails with `NotFound` when absent.
    async fn get_field(&self, id: FieldId) -> RepositoryResult<Field>;

    /// Create a field. Fails with `Conflict` when another field (active or
    /// not) already carries the same name.
    async fn create_field(&self, new: NewField) -> RepositoryResult<Field>;

    /// Apply a merge-patch. Fails with `NotFound` when absent and with
    /// `Conflict` when the new name collides with a different field.
    async fn update_field(&self, id: FieldId, patch: FieldPatch) -> RepositoryResult<Field>;

    /// Soft-delete: set `active = false`.
    ///
    /// Fails with `Conflict` (reporting the count) when the field still has
    /// active reservations dated `today` or later, and with `Validation`
    /// when the field is already inactive.
    async fn deactivate_field(&self, id: FieldId, today: NaiveDate) -> RepositoryResult<Field>;

    /// Set `active = true`. Fails with `Validation` when already active.
    async fn activate_field(&self, id: FieldId) -> RepositoryResult<Field>;

    /// Hard-delete. Fails with `Conflict` (reporting the count) when any
    /// reservation of any status references the field.
    async fn delete_field(&self, id: FieldId) -> RepositoryResult<()>;

    /// Per-field reservation counters, ordered by name ascending.
    async fn field_usage(&self) -> RepositoryResult<Vec<FieldUsage>>;
}

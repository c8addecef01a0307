//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures (connection errors and
//!   serialization failures of SERIALIZABLE transactions)
//! - Automatic migration execution
//!
//! ## Consistency
//!
//! `create_reservation` and `update_reservation` run their existence,
//! active-field and overlap checks inside a SERIALIZABLE transaction together
//! with the write. Two concurrent overlapping bookings therefore cannot both
//! commit: the loser fails with a serialization error, is retried, and then
//! observes the winner's row as a conflict.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    ConflictQuery, ErrorContext, FieldPatch, FieldRepository, NewField, RepositoryError,
    RepositoryResult, ReservationRecord, ReservationRepository,
};
use crate::models::{
    Field, FieldId, FieldUsage, Reservation, ReservationId, ReservationStatus,
    ReservationWithField,
};

mod models;
mod schema;

use models::{join_rows, FieldRow, NewFieldRow, NewReservationRow, ReservationRow};
use schema::{fields, reservations};

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let parse_var = |name: &str, default: u64| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            database_url,
            max_pool_size: parse_var("PG_POOL_MAX", 10) as u32,
            min_pool_size: parse_var("PG_POOL_MIN", 1) as u32,
            connection_timeout_sec: parse_var("PG_CONN_TIMEOUT_SEC", 30),
            idle_timeout_sec: parse_var("PG_IDLE_TIMEOUT_SEC", 600),
            max_retries: parse_var("PG_MAX_RETRIES", 3) as u32,
            retry_delay_ms: parse_var("PG_RETRY_DELAY_MS", 100),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self { pool, config })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient
    /// failures (connection errors, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

/// Count active reservations overlapping `[start, end)` on the same field and
/// date, optionally excluding one reservation id.
fn conflict_count(conn: &mut PgConnection, query: &ConflictQuery) -> RepositoryResult<usize> {
    let mut q = reservations::table
        .filter(reservations::field_id.eq(query.field_id.value()))
        .filter(reservations::date.eq(query.date))
        .filter(reservations::status.eq(ReservationStatus::Active.as_str()))
        .filter(reservations::start_time.lt(query.end_time))
        .filter(reservations::end_time.gt(query.start_time))
        .into_boxed();
    if let Some(exclude) = query.exclude {
        q = q.filter(reservations::id.ne(exclude.value()));
    }
    let count: i64 = q.count().get_result(conn)?;
    Ok(count as usize)
}

/// Load a field row and fail with `Conflict` when it cannot accept bookings.
fn load_bookable_field(conn: &mut PgConnection, field_id: FieldId) -> RepositoryResult<FieldRow> {
    let field: FieldRow = fields::table
        .find(field_id.value())
        .select(FieldRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Field {} not found", field_id),
                ErrorContext::default()
                    .with_entity("field")
                    .with_entity_id(field_id),
            )
        })?;
    if !field.active {
        return Err(RepositoryError::conflict_with_context(
            format!("Field '{}' is deactivated and cannot be booked", field.name),
            0,
            ErrorContext::default()
                .with_entity("field")
                .with_entity_id(field_id),
        ));
    }
    Ok(field)
}

fn field_not_found(id: FieldId) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Field {} not found", id),
        ErrorContext::default().with_entity("field").with_entity_id(id),
    )
}

fn reservation_not_found(id: ReservationId) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Reservation {} not found", id),
        ErrorContext::default()
            .with_entity("reservation")
            .with_entity_id(id),
    )
}

#[async_trait]
impl FieldRepository for PostgresRepository {
    async fn list_active_fields(&self) -> RepositoryResult<Vec<Field>> {
        self.with_conn(|conn| {
            let rows: Vec<FieldRow> = fields::table
                .filter(fields::active.eq(true))
                .order(fields::name.asc())
                .select(FieldRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Field::from).collect())
        })
        .await
    }

    async fn list_fields(&self) -> RepositoryResult<Vec<Field>> {
        self.with_conn(|conn| {
            let rows: Vec<FieldRow> = fields::table
                .order(fields::name.asc())
                .select(FieldRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Field::from).collect())
        })
        .await
    }

    async fn get_field(&self, id: FieldId) -> RepositoryResult<Field> {
        self.with_conn(move |conn| {
            let row: FieldRow = fields::table
                .find(id.value())
                .select(FieldRow::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| field_not_found(id))?;
            Ok(row.into())
        })
        .await
    }

    async fn create_field(&self, new: NewField) -> RepositoryResult<Field> {
        self.with_conn(move |conn| {
            conn.build_transaction().serializable().run(|conn| {
                let taken: i64 = fields::table
                    .filter(fields::name.eq(&new.name))
                    .count()
                    .get_result(conn)?;
                if taken > 0 {
                    return Err(RepositoryError::conflict_with_context(
                        format!("A field named '{}' already exists", new.name),
                        taken as usize,
                        ErrorContext::new("create_field").with_entity("field"),
                    ));
                }

                let row: FieldRow = diesel::insert_into(fields::table)
                    .values(NewFieldRow {
                        name: new.name.clone(),
                        description: new.description.clone(),
                        capacity: new.capacity,
                        active: true,
                    })
                    .returning(FieldRow::as_returning())
                    .get_result(conn)?;
                Ok(row.into())
            })
        })
        .await
    }

    async fn update_field(&self, id: FieldId, patch: FieldPatch) -> RepositoryResult<Field> {
        self.with_conn(move |conn| {
            conn.build_transaction().serializable().run(|conn| {
                let current: FieldRow = fields::table
                    .find(id.value())
                    .select(FieldRow::as_select())
                    .first(conn)
                    .optional()?
                    .ok_or_else(|| field_not_found(id))?;

                let name = patch.name.clone().unwrap_or(current.name);
                let taken: i64 = fields::table
                    .filter(fields::name.eq(&name))
                    .filter(fields::id.ne(id.value()))
                    .count()
                    .get_result(conn)?;
                if taken > 0 {
                    return Err(RepositoryError::conflict_with_context(
                        format!("Another field named '{}' already exists", name),
                        taken as usize,
                        ErrorContext::new("update_field")
                            .with_entity("field")
                            .with_entity_id(id),
                    ));
                }

                // Merge-patch: unspecified inputs keep the stored value.
                let row: FieldRow = diesel::update(fields::table.find(id.value()))
                    .set((
                        fields::name.eq(name),
                        fields::description
                            .eq(patch.description.clone().or(current.description)),
                        fields::capacity.eq(patch.capacity.unwrap_or(current.capacity)),
                        fields::active.eq(patch.active.unwrap_or(current.active)),
                    ))
                    .returning(FieldRow::as_returning())
                    .get_result(conn)?;
                Ok(row.into())
            })
        })
        .await
    }

    async fn deactivate_field(&self, id: FieldId, today: NaiveDate) -> RepositoryResult<Field> {
        self.with_conn(move |conn| {
            conn.build_transaction().serializable().run(|conn| {
                let field: FieldRow = fields::table
                    .find(id.value())
                    .select(FieldRow::as_select())
                    .first(conn)
                    .optional()?
                    .ok_or_else(|| field_not_found(id))?;
                if !field.active {
                    return Err(RepositoryError::validation_with_context(
                        format!("Field '{}' is already deactivated", field.name),
                        ErrorContext::new("deactivate_field")
                            .with_entity("field")
                            .with_entity_id(id),
                    ));
                }

                let pending: i64 = reservations::table
                    .filter(reservations::field_id.eq(id.value()))
                    .filter(reservations::status.eq(ReservationStatus::Active.as_str()))
                    .filter(reservations::date.ge(today))
                    .count()
                    .get_result(conn)?;
                if pending > 0 {
                    return Err(RepositoryError::conflict_with_context(
                        format!(
                            "Field '{}' still has {} active upcoming reservation(s)",
                            field.name, pending
                        ),
                        pending as usize,
                        ErrorContext::new("deactivate_field")
                            .with_entity("field")
                            .with_entity_id(id),
                    ));
                }

                let row: FieldRow = diesel::update(fields::table.find(id.value()))
                    .set(fields::active.eq(false))
                    .returning(FieldRow::as_returning())
                    .get_result(conn)?;
                Ok(row.into())
            })
        })
        .await
    }

    async fn activate_field(&self, id: FieldId) -> RepositoryResult<Field> {
        self.with_conn(move |conn| {
            conn.build_transaction().serializable().run(|conn| {
                let field: FieldRow = fields::table
                    .find(id.value())
                    .select(FieldRow::as_select())
                    .first(conn)
                    .optional()?
                    .ok_or_else(|| field_not_found(id))?;
                if field.active {
                    return Err(RepositoryError::validation_with_context(
                        format!("Field '{}' is already active", field.name),
                        ErrorContext::new("activate_field")
                            .with_entity("field")
                            .with_entity_id(id),
                    ));
                }

                let row: FieldRow = diesel::update(fields::table.find(id.value()))
                    .set(fields::active.eq(true))
                    .returning(FieldRow::as_returning())
                    .get_result(conn)?;
                Ok(row.into())
            })
        })
        .await
    }

    async fn delete_field(&self, id: FieldId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            conn.build_transaction().serializable().run(|conn| {
                let field: FieldRow = fields::table
                    .find(id.value())
                    .select(FieldRow::as_select())
                    .first(conn)
                    .optional()?
                    .ok_or_else(|| field_not_found(id))?;

                let referencing: i64 = reservations::table
                    .filter(reservations::field_id.eq(id.value()))
                    .count()
                    .get_result(conn)?;
                if referencing > 0 {
                    return Err(RepositoryError::conflict_with_context(
                        format!(
                            "Field '{}' has {} associated reservation(s); deactivate it instead",
                            field.name, referencing
                        ),
                        referencing as usize,
                        ErrorContext::new("delete_field")
                            .with_entity("field")
                            .with_entity_id(id),
                    ));
                }

                diesel::delete(fields::table.find(id.value())).execute(conn)?;
                Ok(())
            })
        })
        .await
    }

    async fn field_usage(&self) -> RepositoryResult<Vec<FieldUsage>> {
        self.with_conn(|conn| {
            let field_rows: Vec<FieldRow> = fields::table
                .order(fields::name.asc())
                .select(FieldRow::as_select())
                .load(conn)?;

            let mut usage = Vec::with_capacity(field_rows.len());
            for field in field_rows {
                let total: i64 = reservations::table
                    .filter(reservations::field_id.eq(field.id))
                    .count()
                    .get_result(conn)?;
                let active: i64 = reservations::table
                    .filter(reservations::field_id.eq(field.id))
                    .filter(reservations::status.eq(ReservationStatus::Active.as_str()))
                    .count()
                    .get_result(conn)?;
                usage.push(FieldUsage {
                    id: FieldId::new(field.id),
                    name: field.name,
                    capacity: field.capacity,
                    active: field.active,
                    total_reservations: total as usize,
                    active_reservations: active as usize,
                });
            }
            Ok(usage)
        })
        .await
    }
}

#[async_trait]
impl ReservationRepository for PostgresRepository {
    async fn list_reservations(&self) -> RepositoryResult<Vec<ReservationWithField>> {
        self.with_conn(|conn| {
            let rows: Vec<(ReservationRow, FieldRow)> = reservations::table
                .inner_join(fields::table)
                .order((reservations::date.asc(), reservations::start_time.asc()))
                .select((ReservationRow::as_select(), FieldRow::as_select()))
                .load(conn)?;
            rows.into_iter().map(|(r, f)| join_rows(r, f)).collect()
        })
        .await
    }

    async fn list_reservations_by_date(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<ReservationWithField>> {
        self.with_conn(move |conn| {
            let rows: Vec<(ReservationRow, FieldRow)> = reservations::table
                .inner_join(fields::table)
                .filter(reservations::date.eq(date))
                .order(reservations::start_time.asc())
                .select((ReservationRow::as_select(), FieldRow::as_select()))
                .load(conn)?;
            rows.into_iter().map(|(r, f)| join_rows(r, f)).collect()
        })
        .await
    }

    async fn get_reservation(
        &self,
        id: ReservationId,
    ) -> RepositoryResult<ReservationWithField> {
        self.with_conn(move |conn| {
            let row: (ReservationRow, FieldRow) = reservations::table
                .inner_join(fields::table)
                .filter(reservations::id.eq(id.value()))
                .select((ReservationRow::as_select(), FieldRow::as_select()))
                .first(conn)
                .optional()?
                .ok_or_else(|| reservation_not_found(id))?;
            join_rows(row.0, row.1)
        })
        .await
    }

    async fn count_conflicts(&self, query: ConflictQuery) -> RepositoryResult<usize> {
        self.with_conn(move |conn| conflict_count(conn, &query)).await
    }

    async fn create_reservation(
        &self,
        record: ReservationRecord,
    ) -> RepositoryResult<ReservationWithField> {
        self.with_conn(move |conn| {
            conn.build_transaction().serializable().run(|conn| {
                let field = load_bookable_field(conn, record.field_id)?;

                let conflicts = conflict_count(
                    conn,
                    &ConflictQuery {
                        field_id: record.field_id,
                        date: record.date,
                        start_time: record.start_time,
                        end_time: record.end_time,
                        exclude: None,
                    },
                )?;
                if conflicts > 0 {
                    return Err(RepositoryError::conflict_with_context(
                        "A reservation already exists in that time window",
                        conflicts,
                        ErrorContext::new("create_reservation")
                            .with_entity("reservation")
                            .with_details(format!(
                                "field_id={} date={}",
                                record.field_id, record.date
                            )),
                    ));
                }

                let row: ReservationRow = diesel::insert_into(reservations::table)
                    .values(NewReservationRow {
                        field_id: record.field_id.value(),
                        student_group: record.student_group.clone(),
                        contact_name: record.contact_name.clone(),
                        contact_phone: record.contact_phone.clone(),
                        date: record.date,
                        start_time: record.start_time,
                        end_time: record.end_time,
                        status: ReservationStatus::Active.as_str().to_string(),
                        notes: record.notes.clone(),
                    })
                    .returning(ReservationRow::as_returning())
                    .get_result(conn)?;
                join_rows(row, field)
            })
        })
        .await
    }

    async fn update_reservation(
        &self,
        id: ReservationId,
        record: ReservationRecord,
    ) -> RepositoryResult<ReservationWithField> {
        self.with_conn(move |conn| {
            conn.build_transaction().serializable().run(|conn| {
                let exists: i64 = reservations::table
                    .filter(reservations::id.eq(id.value()))
                    .count()
                    .get_result(conn)?;
                if exists == 0 {
                    return Err(reservation_not_found(id));
                }

                let field = load_bookable_field(conn, record.field_id)?;

                let conflicts = conflict_count(
                    conn,
                    &ConflictQuery {
                        field_id: record.field_id,
                        date: record.date,
                        start_time: record.start_time,
                        end_time: record.end_time,
                        exclude: Some(id),
                    },
                )?;
                if conflicts > 0 {
                    return Err(RepositoryError::conflict_with_context(
                        "A reservation already exists in that time window",
                        conflicts,
                        ErrorContext::new("update_reservation")
                            .with_entity("reservation")
                            .with_entity_id(id),
                    ));
                }

                let row: ReservationRow =
                    diesel::update(reservations::table.find(id.value()))
                        .set((
                            reservations::field_id.eq(record.field_id.value()),
                            reservations::student_group.eq(record.student_group.clone()),
                            reservations::contact_name.eq(record.contact_name.clone()),
                            reservations::contact_phone.eq(record.contact_phone.clone()),
                            reservations::date.eq(record.date),
                            reservations::start_time.eq(record.start_time),
                            reservations::end_time.eq(record.end_time),
                            reservations::notes.eq(record.notes.clone()),
                        ))
                        .returning(ReservationRow::as_returning())
                        .get_result(conn)?;
                join_rows(row, field)
            })
        })
        .await
    }

    async fn cancel_reservation(&self, id: ReservationId) -> RepositoryResult<Reservation> {
        self.with_conn(move |conn| {
            let row: ReservationRow = diesel::update(reservations::table.find(id.value()))
                .set(reservations::status.eq(ReservationStatus::Cancelled.as_str()))
                .returning(ReservationRow::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| reservation_not_found(id))?;
            row.into_domain()
        })
        .await
    }

    async fn delete_reservation(&self, id: ReservationId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted =
                diesel::delete(reservations::table.find(id.value())).execute(conn)?;
            if deleted == 0 {
                return Err(reservation_not_found(id));
            }
            Ok(())
        })
        .await
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            diesel::sql_query("SELECT 1").execute(conn)?;
            Ok(true)
        })
        .await
    }
}

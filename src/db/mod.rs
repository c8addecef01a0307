//! Persistence layer: repository traits and storage backends.
//!
//! The module follows the repository pattern so storage backends can be
//! swapped without touching the services:
//!
//! - `repository`: trait definitions and error types
//! - `repositories::local`: in-memory backend for tests and local development
//! - `repositories::postgres`: Diesel/Postgres backend (`postgres-repo` feature)
//! - `factory`: creates repository instances from runtime configuration
//! - `repo_config`: TOML configuration file support
//!
//! There is deliberately no global repository singleton: the binary creates
//! one handle via [`factory::RepositoryFactory`] and injects it into the HTTP
//! state, which keeps tests free to run against their own stores.

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
#[cfg(feature = "local-repo")]
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::{PostgresConfig, PostgresRepository};
pub use repository::{
    ConflictQuery, ErrorContext, FieldPatch, FieldRepository, FullRepository, NewField,
    RepositoryError, RepositoryResult, ReservationRecord, ReservationRepository,
};

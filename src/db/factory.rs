//! Repository factory for dependency injection.
//!
//! Components never reach for a global store handle; the binary builds one
//! repository here and passes it down as `Arc<dyn FullRepository>`.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositoryConfig;
#[cfg(feature = "local-repo")]
use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::{PostgresConfig, PostgresRepository};
use super::repository::{FullRepository, RepositoryError, RepositoryResult};

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Postgres + Diesel implementation
    Postgres,
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "local" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from environment variables.
    ///
    /// Reads `REPOSITORY_TYPE`. Defaults to Postgres when a database URL is
    /// present, otherwise Local.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().unwrap_or(Self::Local);
        }

        if std::env::var("DATABASE_URL").is_ok() || std::env::var("PG_DATABASE_URL").is_ok() {
            Self::Postgres
        } else {
            Self::Local
        }
    }
}

/// Factory for creating repository instances.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// Postgres configuration is read from the environment when the
    /// `postgres-repo` feature is enabled.
    pub fn create(repo_type: RepositoryType) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Postgres => {
                #[cfg(feature = "postgres-repo")]
                {
                    let config = PostgresConfig::from_env()
                        .map_err(RepositoryError::configuration)?;
                    Self::create_postgres(&config)
                }
                #[cfg(not(feature = "postgres-repo"))]
                {
                    Err(RepositoryError::configuration(
                        "Postgres repository feature not enabled",
                    ))
                }
            }
            RepositoryType::Local => {
                #[cfg(feature = "local-repo")]
                {
                    Ok(Self::create_local())
                }
                #[cfg(not(feature = "local-repo"))]
                {
                    Err(RepositoryError::configuration(
                        "Local repository feature not enabled",
                    ))
                }
            }
        }
    }

    /// Create a repository from a TOML configuration file.
    pub fn create_from_file(
        config_path: impl AsRef<Path>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = RepositoryConfig::load(config_path)?;
        Self::create_from_config(&config)
    }

    /// Create a repository from an already-parsed configuration.
    pub fn create_from_config(
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match config.repository_type()? {
            RepositoryType::Postgres => {
                #[cfg(feature = "postgres-repo")]
                {
                    let pg_config = config.postgres_config();
                    if pg_config.database_url.is_empty() {
                        return Err(RepositoryError::configuration(
                            "Postgres repository requires [postgres] database_url",
                        ));
                    }
                    Self::create_postgres(&pg_config)
                }
                #[cfg(not(feature = "postgres-repo"))]
                {
                    Err(RepositoryError::configuration(
                        "Postgres repository feature not enabled",
                    ))
                }
            }
            RepositoryType::Local => Self::create(RepositoryType::Local),
        }
    }

    /// Create an in-memory repository.
    #[cfg(feature = "local-repo")]
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create a Postgres repository (runs pending migrations).
    #[cfg(feature = "postgres-repo")]
    pub fn create_postgres(
        config: &PostgresConfig,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo = PostgresRepository::new(config.clone())?;
        Ok(Arc::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_type_from_str() {
        assert_eq!("local".parse::<RepositoryType>().unwrap(), RepositoryType::Local);
        assert_eq!("postgres".parse::<RepositoryType>().unwrap(), RepositoryType::Postgres);
        assert_eq!("pg".parse::<RepositoryType>().unwrap(), RepositoryType::Postgres);
        assert_eq!("PG".parse::<RepositoryType>().unwrap(), RepositoryType::Postgres);
        assert!("sqlite".parse::<RepositoryType>().is_err());
    }

    #[cfg(feature = "local-repo")]
    #[tokio::test]
    async fn test_create_local_repository() {
        let repo = RepositoryFactory::create_local();
        assert!(repo.health_check().await.unwrap());
    }

    #[cfg(feature = "local-repo")]
    #[tokio::test]
    async fn test_create_via_type() {
        let repo = RepositoryFactory::create(RepositoryType::Local).unwrap();
        assert!(repo.list_active_fields().await.unwrap().is_empty());
    }

    #[cfg(feature = "local-repo")]
    #[tokio::test]
    async fn test_create_from_config_file() {
        let path = std::env::temp_dir().join("canchas-repo-config-test.toml");
        std::fs::write(&path, "[repository]\ntype = \"local\"\n").unwrap();

        let repo = RepositoryFactory::create_from_file(&path).unwrap();
        assert!(repo.health_check().await.unwrap());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_create_from_config_rejects_unknown_type() {
        let config = RepositoryConfig::parse(
            r#"
            [repository]
            type = "sqlite"
            "#,
        )
        .unwrap();
        let err = RepositoryFactory::create_from_config(&config).err().unwrap();
        assert!(matches!(err, RepositoryError::Configuration { .. }));
    }

    #[test]
    fn test_create_from_missing_file_is_configuration_error() {
        let err =
            RepositoryFactory::create_from_file("/nonexistent/repository.toml").err().unwrap();
        assert!(matches!(err, RepositoryError::Configuration { .. }));
    }
}

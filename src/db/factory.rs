//! Construction of repository instances.
//!
//! The rest of the crate works against `Arc<dyn ScheduleRepository>`; this
//! module decides which backend sits behind it, from an explicit choice, the
//! environment, or a loaded [`AppConfig`].

use std::str::FromStr;
use std::sync::Arc;

use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::PostgresRepository;
use super::repository::{RepositoryError, RepositoryResult, ScheduleRepository};
use super::PostgresConfig;
use crate::config::AppConfig;

/// Which storage backend to run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// PostgreSQL through Diesel, behind the `postgres-repo` feature
    Postgres,
    /// In-memory store, the default for tests and local development
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Accepts `"postgres"` (or `"pg"`) and `"local"`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "local" => Ok(Self::Local),
            other => Err(format!(
                "unrecognized repository type '{}' (expected 'postgres' or 'local')",
                other
            )),
        }
    }
}

impl RepositoryType {
    /// Pick a backend from the environment.
    ///
    /// `REPOSITORY_TYPE` wins when set (unknown values fall back to Local).
    /// Without it, the presence of a database URL selects Postgres.
    pub fn from_env() -> Self {
        if let Ok(choice) = std::env::var("REPOSITORY_TYPE") {
            return choice.parse().unwrap_or(Self::Local);
        }

        let has_url = ["DATABASE_URL", "PG_DATABASE_URL"]
            .iter()
            .any(|key| std::env::var(key).is_ok());
        if has_url {
            Self::Postgres
        } else {
            Self::Local
        }
    }
}

#[cfg(not(feature = "postgres-repo"))]
fn postgres_disabled() -> RepositoryError {
    RepositoryError::configuration("Postgres repository feature not enabled")
}

/// Builds repository instances for the selected backend.
///
/// Most callers want [`RepositoryFactory::from_app_config`]:
///
/// ```ignore
/// let config = AppConfig::load()?;
/// let repo = RepositoryFactory::from_app_config(&config).await?;
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository of the given type. Postgres needs its connection
    /// settings; Local ignores them.
    pub async fn create(
        repo_type: RepositoryType,
        postgres: Option<PostgresConfig>,
    ) -> RepositoryResult<Arc<dyn ScheduleRepository>> {
        match repo_type {
            #[cfg(feature = "postgres-repo")]
            RepositoryType::Postgres => {
                let config = postgres.ok_or_else(|| {
                    RepositoryError::configuration("Postgres backend needs connection settings")
                })?;
                let pg = Self::create_postgres(&config).await?;
                Ok(pg as Arc<dyn ScheduleRepository>)
            }
            #[cfg(not(feature = "postgres-repo"))]
            RepositoryType::Postgres => {
                let _ = postgres;
                Err(postgres_disabled())
            }
            RepositoryType::Local => Ok(Self::create_local()),
        }
    }

    /// Create a Postgres repository, setting up its pool and running
    /// pending migrations.
    #[cfg(feature = "postgres-repo")]
    pub async fn create_postgres(
        config: &PostgresConfig,
    ) -> RepositoryResult<Arc<PostgresRepository>> {
        let repo = PostgresRepository::new(config.clone())?;
        Ok(Arc::new(repo))
    }

    /// Create an empty in-memory repository.
    pub fn create_local() -> Arc<dyn ScheduleRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create the repository the environment asks for.
    ///
    /// Backend selection follows [`RepositoryType::from_env`]; the Postgres
    /// connection settings then come from the database URL variables.
    pub async fn from_env() -> RepositoryResult<Arc<dyn ScheduleRepository>> {
        let repo_type = RepositoryType::from_env();
        let pg = match repo_type {
            #[cfg(feature = "postgres-repo")]
            RepositoryType::Postgres => {
                Some(PostgresConfig::from_env().map_err(RepositoryError::configuration)?)
            }
            _ => None,
        };
        Self::create(repo_type, pg).await
    }

    /// Create the repository a loaded configuration file asks for.
    pub async fn from_app_config(
        config: &AppConfig,
    ) -> RepositoryResult<Arc<dyn ScheduleRepository>> {
        let repo_type = config
            .repository_type()
            .map_err(RepositoryError::configuration)?;
        let pg = match repo_type {
            #[cfg(feature = "postgres-repo")]
            RepositoryType::Postgres => {
                Some(config.postgres_config().map_err(RepositoryError::configuration)?)
            }
            _ => None,
        };
        Self::create(repo_type, pg).await
    }
}

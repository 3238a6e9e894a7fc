//! Storage layer for schedules.
//!
//! Everything above this layer holds an `Arc<dyn ScheduleRepository>` and
//! never learns which backend answers:
//!
//! ```text
//! services (generation, recurrence, queries)
//!        │
//!        ▼
//! ScheduleRepository trait ──► LocalRepository    (in-memory, default)
//!                          └─► PostgresRepository (Diesel + r2d2, feature)
//! ```
//!
//! `repository` defines the trait and the shared storage error type,
//! `repositories` holds the two backends, and `factory` turns configuration
//! into a running one.

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repositories;
pub mod repository;

#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::PostgresConfig;

/// Placeholder so signatures naming `PostgresConfig` (the factory, the app
/// config) still compile with the backend off. Cannot be constructed.
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig(());

pub use factory::{RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{ErrorContext, RepositoryError, RepositoryResult, ScheduleRepository};

//! Dayflow backend library.
//!
//! Dayflow turns free-text day descriptions into persisted schedule items by
//! way of an external text-generation provider, keeps recurring items alive by
//! materializing their next occurrences on a periodic sweep, and serves
//! filtered, sorted, paginated queries over the schedule collection.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum, feature "http-server")                 │
//! │  - REST routes, DTOs, error mapping                       │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Service Layer (services/)                                │
//! │  - text → schedule parsing and generation                 │
//! │  - recurrence materialization                             │
//! │  - CRUD + windowed listing                                │
//! └──────────┬────────────────────────────┬──────────────────┘
//!            │                            │
//! ┌──────────▼──────────────┐  ┌──────────▼──────────────────┐
//! │  Repository Layer (db/) │  │  Provider Layer (provider/) │
//! │  - LocalRepository      │  │  - Groq chat completions    │
//! │  - PostgresRepository   │  │    (OpenAI-compatible)      │
//! └─────────────────────────┘  └─────────────────────────────┘
//! ```
//!
//! # Storage backends
//!
//! Two repository implementations sit behind cargo features:
//! `local-repo` (in-memory, default, used by the test suite) and
//! `postgres-repo` (Diesel + r2d2). At least one must be enabled.
//!
//! # Quick start
//!
//! ```ignore
//! use dayflow::db::{RepositoryFactory, RepositoryType};
//! use dayflow::models::{Pagination, ScheduleFilter};
//! use dayflow::services;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = RepositoryFactory::create(RepositoryType::Local, None).await?;
//! let page = services::list_schedules(
//!     repo.as_ref(),
//!     Pagination::normalized(None, None),
//!     &ScheduleFilter::default(),
//! )
//! .await?;
//! println!("{} schedules", page.total_items);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
#[cfg(feature = "http-server")]
pub mod http;
pub mod models;
pub mod provider;
pub mod services;

pub use config::AppConfig;
pub use models::{Pagination, RepeatType, Schedule, ScheduleFilter, SchedulePage};
pub use services::ScheduleError;

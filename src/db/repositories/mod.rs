//! Concrete stores behind the `ScheduleRepository` trait.
//!
//! `local` keeps everything in process memory and backs tests and local
//! development; `postgres` persists through Diesel and only builds when the
//! `postgres-repo` feature is enabled.
pub mod local;
#[cfg(feature = "postgres-repo")]
pub mod postgres;

pub use local::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use postgres::{PostgresConfig, PostgresRepository};

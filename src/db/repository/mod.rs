//! Repository trait for abstracting schedule persistence.
//!
//! This trait defines the interface for all storage operations, allowing
//! different implementations (PostgreSQL, in-memory) to be swapped via
//! dependency injection.

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};

use crate::models::{Pagination, Schedule, ScheduleFilter};

/// Repository trait for schedule persistence.
///
/// The service layer holds this as `Arc<dyn ScheduleRepository>`; both the
/// recurrence materializer and the HTTP surface go through it, never through
/// a concrete backend.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust and allow
/// sharing across tasks.
///
/// # Error Handling
/// All methods return [`RepositoryResult<T>`] which wraps either the expected
/// return type or a [`RepositoryError`] describing what went wrong.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the storage backend is reachable.
    ///
    /// # Returns
    /// * `Ok(true)` if the backend answers
    /// * `Ok(false)` if it is reachable but reports itself unhealthy
    /// * `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Writes ====================

    /// Insert a batch of schedules atomically.
    ///
    /// Either every schedule in the slice is persisted or none is; partial
    /// batches are never left behind. Each inserted row gets its
    /// `created_at` stamped by the repository.
    async fn insert_batch(&self, schedules: &[Schedule]) -> RepositoryResult<()>;

    /// Insert a schedule unless one with the same `(title, start_time)`
    /// already exists.
    ///
    /// This is the idempotent write the recurrence materializer relies on;
    /// backends must make the check-and-insert atomic (unique constraint in
    /// Postgres, one write lock in the local backend).
    ///
    /// # Returns
    /// * `Ok(true)` - the schedule was inserted
    /// * `Ok(false)` - an occurrence with the same title and start already existed
    async fn insert_if_absent(&self, schedule: &Schedule) -> RepositoryResult<bool>;

    /// Replace the stored schedule with the given id.
    ///
    /// `created_at` is preserved from the stored row; everything else is
    /// taken from `schedule`.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` when the id references no row
    async fn update(&self, id: &str, schedule: &Schedule) -> RepositoryResult<()>;

    /// Delete one schedule by id.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` when the id references no row
    async fn delete_by_id(&self, id: &str) -> RepositoryResult<()>;

    /// Delete every schedule.
    async fn delete_all(&self) -> RepositoryResult<()>;

    // ==================== Reads ====================

    /// Fetch one schedule by id.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` when the id references no row
    async fn get_by_id(&self, id: &str) -> RepositoryResult<Schedule>;

    /// Fetch one page of schedules matching `filter`, plus the total number
    /// of matching rows before pagination.
    ///
    /// Every filter value is passed to the backend as a bound parameter;
    /// sort column and direction come pre-whitelisted from
    /// [`ScheduleFilter`].
    async fn list(
        &self,
        pagination: Pagination,
        filter: &ScheduleFilter,
    ) -> RepositoryResult<(Vec<Schedule>, u64)>;

    /// Fetch the recurring schedules still eligible for expansion: rows with
    /// `repeat_type != none` whose `repeat_until` is absent or strictly
    /// after `now`, ordered by `start_time` ascending.
    async fn list_active_recurring(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Schedule>>;

    /// Check whether any schedule exists with exactly this title and start
    /// instant.
    async fn exists_by_title_and_start(
        &self,
        title: &str,
        start_time: DateTime<FixedOffset>,
    ) -> RepositoryResult<bool>;
}

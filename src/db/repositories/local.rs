//! HashMap-backed schedule store.
//!
//! The default backend for tests and local runs: one map behind a single
//! RwLock, no I/O, deterministic and isolated per instance.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repository::{
    ErrorContext, RepositoryError, RepositoryResult, ScheduleRepository,
};
use crate::models::{Pagination, Schedule, ScheduleFilter};

/// Schedule store living entirely in process memory.
///
/// Cloning is cheap and every clone shares the same storage, so a test can
/// keep a handle for assertions while the service under test owns another.
///
/// The `(title, start_time)` uniqueness rule the Postgres schema enforces
/// with a constraint is enforced here too, so the two backends reject the
/// same writes.
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    schedules: HashMap<String, Schedule>,

    // Tests flip this to simulate an outage.
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            schedules: HashMap::new(),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the store up or down; while down, every call fails with a
    /// connection error.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Drop every stored schedule.
    pub fn clear(&self) {
        self.data.write().schedules.clear();
    }

    /// How many schedules are stored right now.
    pub fn schedule_count(&self) -> usize {
        self.data.read().schedules.len()
    }

    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("simulated outage, store is down"));
        }
        Ok(())
    }

    fn duplicate_error(operation: &str, schedule: &Schedule) -> RepositoryError {
        RepositoryError::query_with_context(
            format!(
                "duplicate schedule for title '{}' at {}",
                schedule.title, schedule.start_time
            ),
            ErrorContext::new(operation)
                .with_entity("schedule")
                .with_details("unique (title, start_time)"),
        )
    }
}

fn same_occurrence(a: &Schedule, title: &str, start_time: DateTime<FixedOffset>) -> bool {
    // DateTime equality compares instants, so the stored offset is irrelevant.
    a.title == title && a.start_time == start_time
}

#[async_trait]
impl ScheduleRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn insert_batch(&self, schedules: &[Schedule]) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();

        // Reject the whole batch before touching the map so the insert
        // stays atomic.
        for (index, schedule) in schedules.iter().enumerate() {
            let clashes_with_existing = data
                .schedules
                .values()
                .any(|s| same_occurrence(s, &schedule.title, schedule.start_time));
            let clashes_within_batch = schedules[..index]
                .iter()
                .any(|s| same_occurrence(s, &schedule.title, schedule.start_time));
            if clashes_with_existing || clashes_within_batch {
                return Err(Self::duplicate_error("insert_batch", schedule));
            }
        }

        let now = Utc::now();
        for schedule in schedules {
            let mut row = schedule.clone();
            row.created_at = Some(now);
            data.schedules.insert(row.id.clone(), row);
        }
        Ok(())
    }

    async fn insert_if_absent(&self, schedule: &Schedule) -> RepositoryResult<bool> {
        self.check_health()?;
        // Existence check and insert under one write lock, closing the
        // check-then-act race between concurrent expanders.
        let mut data = self.data.write();
        let exists = data
            .schedules
            .values()
            .any(|s| same_occurrence(s, &schedule.title, schedule.start_time));
        if exists {
            return Ok(false);
        }

        let mut row = schedule.clone();
        row.created_at = Some(Utc::now());
        data.schedules.insert(row.id.clone(), row);
        Ok(true)
    }

    async fn update(&self, id: &str, schedule: &Schedule) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        let existing = data.schedules.get(id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Schedule {} not found", id),
                ErrorContext::new("update").with_entity_id(id),
            )
        })?;

        let mut row = schedule.clone();
        row.id = id.to_string();
        // created_at is stamped once at insert and survives every update.
        row.created_at = existing.created_at;
        data.schedules.insert(id.to_string(), row);
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.schedules.remove(id).is_none() {
            return Err(RepositoryError::not_found_with_context(
                format!("Schedule {} not found", id),
                ErrorContext::new("delete_by_id").with_entity_id(id),
            ));
        }
        Ok(())
    }

    async fn delete_all(&self) -> RepositoryResult<()> {
        self.check_health()?;
        self.data.write().schedules.clear();
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> RepositoryResult<Schedule> {
        self.check_health()?;
        let data = self.data.read();
        data.schedules.get(id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Schedule {} not found", id),
                ErrorContext::new("get_by_id").with_entity_id(id),
            )
        })
    }

    async fn list(
        &self,
        pagination: Pagination,
        filter: &ScheduleFilter,
    ) -> RepositoryResult<(Vec<Schedule>, u64)> {
        self.check_health()?;
        let data = self.data.read();

        let mut matching: Vec<Schedule> = data
            .schedules
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| filter.compare(a, b));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .collect();
        Ok((items, total))
    }

    async fn list_active_recurring(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Schedule>> {
        self.check_health()?;
        let data = self.data.read();

        let mut recurring: Vec<Schedule> = data
            .schedules
            .values()
            .filter(|s| {
                s.repeat_type.is_recurring()
                    && s.repeat_until.map_or(true, |until| until > now)
            })
            .cloned()
            .collect();
        recurring.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        Ok(recurring)
    }

    async fn exists_by_title_and_start(
        &self,
        title: &str,
        start_time: DateTime<FixedOffset>,
    ) -> RepositoryResult<bool> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data
            .schedules
            .values()
            .any(|s| same_occurrence(s, title, start_time)))
    }
}

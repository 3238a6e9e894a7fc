//! Diesel-backed Postgres storage.
//!
//! Connections come from an r2d2 pool and every query runs on the tokio
//! blocking pool, so the async runtime never waits on a socket to Postgres.
//! Transient failures (checkout errors, dropped connections, serialization
//! conflicts) are retried a bounded number of times with doubling delays.
//! Schema migrations are embedded in the binary and applied on startup.
//!
//! Without a config file the connection can be described entirely through
//! the environment: `DATABASE_URL` (or `PG_DATABASE_URL`) is required, and
//! `PG_POOL_MAX`, `PG_POOL_MIN`, `PG_CONN_TIMEOUT_SEC`, `PG_IDLE_TIMEOUT_SEC`,
//! `PG_MAX_RETRIES` and `PG_RETRY_DELAY_MS` override the pool and retry
//! defaults documented on [`PostgresConfig`].

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::warn;
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    ErrorContext, RepositoryError, RepositoryResult, ScheduleRepository,
};
use crate::models::{Pagination, Schedule, ScheduleFilter, SortBy, SortOrder};

mod models;
mod schema;

use models::{NewScheduleRow, ScheduleRow};
use schema::schedules;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Parse an environment variable, falling back on missing or bad values.
fn env_parse<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(fallback)
}

/// Pool and retry settings for the Postgres backend.
///
/// Defaults: pool of 1..=10 connections, 30s checkout timeout, idle
/// connections recycled after 600s, up to 3 retries starting at 100ms.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_idle: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub retry_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub retry_base_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_connections: 10,
            min_idle: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
            retry_attempts: 3,
            retry_base_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Read the connection settings from the environment (see module docs).
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "set DATABASE_URL or PG_DATABASE_URL to use Postgres".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_connections: env_parse("PG_POOL_MAX", defaults.max_connections),
            min_idle: env_parse("PG_POOL_MIN", defaults.min_idle),
            connect_timeout_secs: env_parse("PG_CONN_TIMEOUT_SEC", defaults.connect_timeout_secs),
            idle_timeout_secs: env_parse("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_secs),
            retry_attempts: env_parse("PG_MAX_RETRIES", defaults.retry_attempts),
            retry_base_delay_ms: env_parse("PG_RETRY_DELAY_MS", defaults.retry_base_delay_ms),
        })
    }
}

/// Schedule store persisted in Postgres through Diesel.
///
/// Cloning is cheap; clones share the same pool.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Build the pool, apply pending migrations, and return the store.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(config.min_idle))
            .connection_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("build_pool")
                        .with_details(format!("url host only, pool<={}", config.max_connections)),
                )
            })?;

        run_migrations(&pool)?;

        Ok(Self { pool, config })
    }

    /// Run `f` on a pooled connection inside `spawn_blocking`.
    ///
    /// Retryable failures are reattempted up to `retry_attempts` times with
    /// exponential backoff; `op` labels the query in logs and error context.
    async fn run_query<T, F>(&self, op: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + Clone + 'static,
    {
        let pool = self.pool.clone();
        let attempts = self.config.retry_attempts;
        let base_delay = Duration::from_millis(self.config.retry_base_delay_ms);

        task::spawn_blocking(move || {
            let mut delay = base_delay;
            let mut attempt: u32 = 0;
            loop {
                if attempt > 0 {
                    std::thread::sleep(delay);
                    delay *= 2;
                }

                let outcome = match pool.get() {
                    Ok(mut conn) => f.clone()(&mut conn),
                    Err(e) => Err(RepositoryError::connection_with_context(
                        e.to_string(),
                        ErrorContext::new(op).with_details("pool checkout"),
                    )),
                };

                match outcome {
                    Ok(value) => return Ok(value),
                    Err(err) if err.is_retryable() && attempt < attempts => {
                        attempt += 1;
                        warn!(
                            "{} hit a transient database error (retry {}/{}): {}",
                            op, attempt, attempts, err
                        );
                    }
                    Err(err) => return Err(err),
                }
            }
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("database task aborted: {}", e),
                ErrorContext::new(op),
            )
        })?
    }
}

fn run_migrations(pool: &PgPool) -> RepositoryResult<()> {
    let mut conn = pool.get().map_err(|e| {
        RepositoryError::connection_with_context(e.to_string(), ErrorContext::new("migrations"))
    })?;
    conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
        RepositoryError::internal_with_context(
            format!("schema migration failed: {}", e),
            ErrorContext::new("migrations"),
        )
    })?;
    Ok(())
}

/// Apply the filter predicate to a boxed query. Every value is a bound
/// parameter; the sort column is applied separately from the whitelist.
fn apply_filter(
    mut query: schedules::BoxedQuery<'static, diesel::pg::Pg>,
    filter: &ScheduleFilter,
) -> schedules::BoxedQuery<'static, diesel::pg::Pg> {
    if let Some(done) = filter.is_done {
        query = query.filter(schedules::is_done.eq(done));
    }
    if let Some(repeat) = filter.repeat_type {
        query = query.filter(schedules::repeat_type.eq(repeat.as_str()));
    }
    if let Some(search) = &filter.search {
        if !search.is_empty() {
            let pattern = format!("%{}%", search);
            query = query.filter(
                schedules::title
                    .ilike(pattern.clone())
                    .or(schedules::description.ilike(pattern)),
            );
        }
    }
    if let Some(after) = filter.start_after {
        query = query.filter(schedules::start_time.ge(after.with_timezone(&Utc)));
    }
    if let Some(before) = filter.start_before {
        query = query.filter(schedules::start_time.lt(before.with_timezone(&Utc)));
    }
    query
}

fn apply_order(
    query: schedules::BoxedQuery<'static, diesel::pg::Pg>,
    filter: &ScheduleFilter,
) -> schedules::BoxedQuery<'static, diesel::pg::Pg> {
    let descending = matches!(filter.sort_order, SortOrder::Desc);
    let query = match (filter.sort_by, descending) {
        (SortBy::StartTime, false) => query.order(schedules::start_time.asc()),
        (SortBy::StartTime, true) => query.order(schedules::start_time.desc()),
        (SortBy::EndTime, false) => query.order(schedules::end_time.asc()),
        (SortBy::EndTime, true) => query.order(schedules::end_time.desc()),
        (SortBy::CreatedAt, false) => query.order(schedules::created_at.asc()),
        (SortBy::CreatedAt, true) => query.order(schedules::created_at.desc()),
        (SortBy::Title, false) => query.order(schedules::title.asc()),
        (SortBy::Title, true) => query.order(schedules::title.desc()),
    };
    // Same tie-breaker as the in-memory backend, keeps pagination stable.
    query.then_order_by(schedules::id.asc())
}

#[async_trait]
impl ScheduleRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.run_query("health_check", |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn insert_batch(&self, schedules_in: &[Schedule]) -> RepositoryResult<()> {
        if schedules_in.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let rows: Vec<NewScheduleRow> = schedules_in
            .iter()
            .map(|s| NewScheduleRow::from_schedule(s, now))
            .collect();

        // One multi-row INSERT; Postgres applies it all-or-nothing.
        self.run_query("insert_batch", move |conn| {
            diesel::insert_into(schedules::table)
                .values(&rows)
                .execute(conn)
                .map(|_| ())
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn insert_if_absent(&self, schedule: &Schedule) -> RepositoryResult<bool> {
        let row = NewScheduleRow::from_schedule(schedule, Utc::now());

        self.run_query("insert_if_absent", move |conn| {
            // The unique constraint turns the check-and-insert into one
            // atomic statement; a conflicting row leaves the count at zero.
            let inserted = diesel::insert_into(schedules::table)
                .values(&row)
                .on_conflict((schedules::title, schedules::start_time))
                .do_nothing()
                .execute(conn)
                .map_err(RepositoryError::from)?;
            Ok(inserted > 0)
        })
        .await
    }

    async fn update(&self, id: &str, schedule: &Schedule) -> RepositoryResult<()> {
        let id = id.to_string();
        let schedule = schedule.clone();

        self.run_query("update", move |conn| {
            let affected = diesel::update(schedules::table.find(&id))
                .set((
                    schedules::title.eq(&schedule.title),
                    schedules::description.eq(&schedule.description),
                    schedules::start_time.eq(schedule.start_time.with_timezone(&Utc)),
                    schedules::end_time.eq(schedule.end_time.with_timezone(&Utc)),
                    schedules::is_done.eq(schedule.is_done),
                    schedules::repeat_type.eq(schedule.repeat_type.as_str()),
                    schedules::repeat_until
                        .eq(schedule.repeat_until.map(|t| t.with_timezone(&Utc))),
                ))
                .execute(conn)
                .map_err(RepositoryError::from)?;

            if affected == 0 {
                return Err(RepositoryError::not_found_with_context(
                    format!("Schedule {} not found", id),
                    ErrorContext::new("update")
                        .with_entity("schedule")
                        .with_entity_id(&id),
                ));
            }
            Ok(())
        })
        .await
    }

    async fn delete_by_id(&self, id: &str) -> RepositoryResult<()> {
        let id = id.to_string();

        self.run_query("delete_by_id", move |conn| {
            let affected = diesel::delete(schedules::table.find(&id))
                .execute(conn)
                .map_err(RepositoryError::from)?;

            if affected == 0 {
                return Err(RepositoryError::not_found_with_context(
                    format!("Schedule {} not found", id),
                    ErrorContext::new("delete_by_id")
                        .with_entity("schedule")
                        .with_entity_id(&id),
                ));
            }
            Ok(())
        })
        .await
    }

    async fn delete_all(&self) -> RepositoryResult<()> {
        self.run_query("delete_all", |conn| {
            diesel::delete(schedules::table)
                .execute(conn)
                .map(|_| ())
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn get_by_id(&self, id: &str) -> RepositoryResult<Schedule> {
        let id = id.to_string();

        self.run_query("get_by_id", move |conn| {
            let row = schedules::table
                .find(&id)
                .select(ScheduleRow::as_select())
                .first::<ScheduleRow>(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("get_by_id"))?;
            row.into_schedule()
        })
        .await
    }

    async fn list(
        &self,
        pagination: Pagination,
        filter: &ScheduleFilter,
    ) -> RepositoryResult<(Vec<Schedule>, u64)> {
        let filter = filter.clone();

        self.run_query("list", move |conn| {
            // Paired count over the same predicate, before pagination.
            let total: i64 = apply_filter(schedules::table.into_boxed(), &filter)
                .count()
                .get_result(conn)
                .map_err(RepositoryError::from)?;

            let query = apply_filter(schedules::table.into_boxed(), &filter);
            let rows = apply_order(query, &filter)
                .limit(i64::from(pagination.limit))
                .offset(pagination.offset() as i64)
                .load::<ScheduleRow>(conn)
                .map_err(RepositoryError::from)?;

            let items = rows
                .into_iter()
                .map(ScheduleRow::into_schedule)
                .collect::<RepositoryResult<Vec<_>>>()?;
            Ok((items, total as u64))
        })
        .await
    }

    async fn list_active_recurring(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Schedule>> {
        self.run_query("list_active_recurring", move |conn| {
            let rows = schedules::table
                .filter(schedules::repeat_type.ne("none"))
                .filter(
                    schedules::repeat_until
                        .is_null()
                        .or(schedules::repeat_until.gt(now)),
                )
                .order(schedules::start_time.asc())
                .then_order_by(schedules::id.asc())
                .select(ScheduleRow::as_select())
                .load::<ScheduleRow>(conn)
                .map_err(RepositoryError::from)?;

            rows.into_iter()
                .map(ScheduleRow::into_schedule)
                .collect::<RepositoryResult<Vec<_>>>()
        })
        .await
    }

    async fn exists_by_title_and_start(
        &self,
        title: &str,
        start_time: DateTime<FixedOffset>,
    ) -> RepositoryResult<bool> {
        let title = title.to_string();
        let start_time = start_time.with_timezone(&Utc);

        self.run_query("exists_by_title_and_start", move |conn| {
            diesel::select(diesel::dsl::exists(
                schedules::table
                    .filter(schedules::title.eq(&title))
                    .filter(schedules::start_time.eq(start_time)),
            ))
            .get_result::<bool>(conn)
            .map_err(RepositoryError::from)
        })
        .await
    }
}

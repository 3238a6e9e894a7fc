//! Row types bridging the `schedules` table and the domain entity.
//!
//! `timestamptz` hands instants back in UTC, so the author's original offset
//! does not survive this backend; the domain type documents that instants,
//! not offsets, are authoritative.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::schedules;
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{RepeatType, Schedule};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schedules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ScheduleRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_done: bool,
    pub repeat_type: String,
    pub repeat_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ScheduleRow {
    /// Convert a stored row back into the domain entity.
    pub fn into_schedule(self) -> RepositoryResult<Schedule> {
        let repeat_type: RepeatType = self.repeat_type.parse().map_err(|e: String| {
            RepositoryError::validation_with_context(
                e,
                ErrorContext::new("into_schedule")
                    .with_entity("schedule")
                    .with_entity_id(&self.id),
            )
        })?;

        Ok(Schedule {
            id: self.id,
            title: self.title,
            description: self.description,
            start_time: self.start_time.fixed_offset(),
            end_time: self.end_time.fixed_offset(),
            is_done: self.is_done,
            repeat_type,
            repeat_until: self.repeat_until.map(|t| t.fixed_offset()),
            created_at: Some(self.created_at),
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schedules)]
pub struct NewScheduleRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_done: bool,
    pub repeat_type: String,
    pub repeat_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NewScheduleRow {
    /// Build an insertable row, stamping `created_at` with the given instant.
    pub fn from_schedule(schedule: &Schedule, created_at: DateTime<Utc>) -> Self {
        Self {
            id: schedule.id.clone(),
            title: schedule.title.clone(),
            description: schedule.description.clone(),
            start_time: schedule.start_time.with_timezone(&Utc),
            end_time: schedule.end_time.with_timezone(&Utc),
            is_done: schedule.is_done,
            repeat_type: schedule.repeat_type.as_str().to_string(),
            repeat_until: schedule.repeat_until.map(|t| t.with_timezone(&Utc)),
            created_at,
        }
    }
}

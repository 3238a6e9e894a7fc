//! Manual schedule operations: fetch, partial update, done toggles, deletes,
//! and the listing/window queries.
//!
//! Every function is generic over the repository trait so the HTTP layer can
//! call through `Arc<dyn ScheduleRepository>` and tests can pass a concrete
//! backend directly.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, Utc};
use log::info;

use super::error::{ScheduleError, ServiceResult};
use crate::db::repository::ScheduleRepository;
use crate::models::{Pagination, RepeatType, Schedule, ScheduleFilter, SchedulePage};

/// Partial update for one schedule. `None` leaves a field untouched;
/// `repeat_until` uses a double option so `Some(None)` can clear the bound
/// while `None` leaves it alone.
#[derive(Debug, Clone, Default)]
pub struct SchedulePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub is_done: Option<bool>,
    pub repeat_type: Option<RepeatType>,
    pub repeat_until: Option<Option<DateTime<FixedOffset>>>,
}

impl SchedulePatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.is_done.is_none()
            && self.repeat_type.is_none()
            && self.repeat_until.is_none()
    }

    /// Overlay the patch onto an existing schedule. Identity and
    /// `created_at` are never touched.
    pub fn apply(&self, schedule: &mut Schedule) {
        if let Some(title) = &self.title {
            schedule.title = title.clone();
        }
        if let Some(description) = &self.description {
            schedule.description = description.clone();
        }
        if let Some(start) = self.start_time {
            schedule.start_time = start;
        }
        if let Some(end) = self.end_time {
            schedule.end_time = end;
        }
        if let Some(done) = self.is_done {
            schedule.is_done = done;
        }
        if let Some(repeat) = self.repeat_type {
            schedule.repeat_type = repeat;
        }
        if let Some(until) = self.repeat_until {
            schedule.repeat_until = until;
        }
    }
}

fn ensure_id(id: &str) -> ServiceResult<()> {
    if id.trim().is_empty() {
        return Err(ScheduleError::InvalidInput(
            "schedule id must not be blank".to_string(),
        ));
    }
    Ok(())
}

// ==================== Single-schedule Operations ====================

/// Fetch one schedule by id.
///
/// # Arguments
/// * `repo` - Repository implementation
/// * `id` - Schedule id; must not be blank
pub async fn get_schedule<R>(repo: &R, id: &str) -> ServiceResult<Schedule>
where
    R: ScheduleRepository + ?Sized,
{
    ensure_id(id)?;
    Ok(repo.get_by_id(id).await?)
}

/// Apply a partial update to one schedule and return the merged result.
///
/// The stored row is loaded first, the patch overlaid, and the merged
/// schedule re-validated (`start_time < end_time`, recurrence coherence)
/// before anything is written.
pub async fn update_schedule<R>(
    repo: &R,
    id: &str,
    patch: &SchedulePatch,
) -> ServiceResult<Schedule>
where
    R: ScheduleRepository + ?Sized,
{
    ensure_id(id)?;

    let mut schedule = repo.get_by_id(id).await?;
    patch.apply(&mut schedule);
    schedule
        .validate()
        .map_err(|e| ScheduleError::InvalidInput(e.to_string()))?;

    repo.update(id, &schedule).await?;
    info!("Service layer: updated schedule {}", id);
    Ok(schedule)
}

/// Flip the completion flag on one schedule.
pub async fn set_done<R>(repo: &R, id: &str, done: bool) -> ServiceResult<Schedule>
where
    R: ScheduleRepository + ?Sized,
{
    ensure_id(id)?;

    let mut schedule = repo.get_by_id(id).await?;
    schedule.is_done = done;
    repo.update(id, &schedule).await?;
    info!("Service layer: marked schedule {} done={}", id, done);
    Ok(schedule)
}

/// Delete one schedule by id.
pub async fn delete_schedule<R>(repo: &R, id: &str) -> ServiceResult<()>
where
    R: ScheduleRepository + ?Sized,
{
    ensure_id(id)?;
    repo.delete_by_id(id).await?;
    info!("Service layer: deleted schedule {}", id);
    Ok(())
}

/// Delete every schedule.
pub async fn delete_all_schedules<R>(repo: &R) -> ServiceResult<()>
where
    R: ScheduleRepository + ?Sized,
{
    repo.delete_all().await?;
    info!("Service layer: deleted all schedules");
    Ok(())
}

// ==================== Listing & Windows ====================

/// Fetch one page of schedules matching `filter`.
pub async fn list_schedules<R>(
    repo: &R,
    pagination: Pagination,
    filter: &ScheduleFilter,
) -> ServiceResult<SchedulePage>
where
    R: ScheduleRepository + ?Sized,
{
    let (items, total) = repo.list(pagination, filter).await?;
    Ok(SchedulePage::new(items, pagination, total))
}

/// List schedules starting today, in the given display offset.
///
/// Today is the `[local midnight, next local midnight)` window around `now`;
/// any other filter fields the caller set still apply.
pub async fn today_schedules<R>(
    repo: &R,
    now: DateTime<Utc>,
    offset: FixedOffset,
    pagination: Pagination,
    mut filter: ScheduleFilter,
) -> ServiceResult<SchedulePage>
where
    R: ScheduleRepository + ?Sized,
{
    let (start, end) = day_window(now, offset);
    filter.start_after = Some(start);
    filter.start_before = Some(end);
    list_schedules(repo, pagination, &filter).await
}

/// List schedules starting this week, in the given display offset.
///
/// The week runs `[Monday 00:00, next Monday 00:00)` local to the offset.
pub async fn this_week_schedules<R>(
    repo: &R,
    now: DateTime<Utc>,
    offset: FixedOffset,
    pagination: Pagination,
    mut filter: ScheduleFilter,
) -> ServiceResult<SchedulePage>
where
    R: ScheduleRepository + ?Sized,
{
    let (start, end) = week_window(now, offset);
    filter.start_after = Some(start);
    filter.start_before = Some(end);
    list_schedules(repo, pagination, &filter).await
}

/// The `[midnight, midnight + 24h)` window containing `now` in `offset`.
pub fn day_window(
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let local = now.with_timezone(&offset);
    let midnight = local - local.time().signed_duration_since(NaiveTime::MIN);
    (midnight, midnight + Duration::days(1))
}

/// The `[Monday 00:00, next Monday 00:00)` window containing `now` in
/// `offset`.
pub fn week_window(
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let (day_start, _) = day_window(now, offset);
    let monday =
        day_start - Duration::days(i64::from(day_start.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(7))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    #[test]
    fn test_patch_overlays_only_present_fields() {
        let mut schedule = Schedule::new(
            "Standup",
            "daily sync",
            ts("2025-08-25T09:00:00+07:00"),
            ts("2025-08-25T09:15:00+07:00"),
        );
        let original_id = schedule.id.clone();

        let patch = SchedulePatch {
            title: Some("Team standup".to_string()),
            is_done: Some(true),
            ..Default::default()
        };
        patch.apply(&mut schedule);

        assert_eq!(schedule.title, "Team standup");
        assert!(schedule.is_done);
        assert_eq!(schedule.description, "daily sync");
        assert_eq!(schedule.id, original_id);
        assert_eq!(schedule.start_time, ts("2025-08-25T09:00:00+07:00"));
    }

    #[test]
    fn test_patch_can_clear_repeat_until() {
        let mut schedule = Schedule::new(
            "Standup",
            "",
            ts("2025-08-25T09:00:00+07:00"),
            ts("2025-08-25T09:15:00+07:00"),
        );
        schedule.repeat_type = RepeatType::Daily;
        schedule.repeat_until = Some(ts("2025-09-01T00:00:00+07:00"));

        let keep = SchedulePatch::default();
        keep.apply(&mut schedule);
        assert!(schedule.repeat_until.is_some(), "absent field leaves value");

        let clear = SchedulePatch {
            repeat_until: Some(None),
            ..Default::default()
        };
        clear.apply(&mut schedule);
        assert!(schedule.repeat_until.is_none());
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(SchedulePatch::default().is_empty());
        assert!(!SchedulePatch {
            is_done: Some(false),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_day_window_is_local_midnight_to_midnight() {
        // 22:30 UTC is already the next day at UTC+7.
        let now = ts("2025-08-05T22:30:00+00:00").with_timezone(&Utc);
        let (start, end) = day_window(now, offset(7));

        assert_eq!(start, ts("2025-08-06T00:00:00+07:00"));
        assert_eq!(end, ts("2025-08-07T00:00:00+07:00"));
    }

    #[test]
    fn test_day_window_with_negative_offset() {
        let now = ts("2025-08-05T02:30:00+00:00").with_timezone(&Utc);
        let (start, end) = day_window(now, offset(-5));

        assert_eq!(start, ts("2025-08-04T00:00:00-05:00"));
        assert_eq!(end, ts("2025-08-05T00:00:00-05:00"));
    }

    #[test]
    fn test_week_window_anchors_on_monday() {
        // 2025-08-06 is a Wednesday.
        let now = ts("2025-08-06T10:00:00+07:00").with_timezone(&Utc);
        let (start, end) = week_window(now, offset(7));

        assert_eq!(start, ts("2025-08-04T00:00:00+07:00"));
        assert_eq!(end, ts("2025-08-11T00:00:00+07:00"));
    }

    #[test]
    fn test_week_window_on_a_monday_starts_that_day() {
        let now = ts("2025-08-04T00:00:00+07:00").with_timezone(&Utc);
        let (start, _) = week_window(now, offset(7));
        assert_eq!(start, ts("2025-08-04T00:00:00+07:00"));
    }
}

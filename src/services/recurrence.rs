//! Recurrence materialization.
//!
//! Recurring schedules are templates: the stored row is never rewritten.
//! Each sweep walks the active recurring set, computes the single next
//! occurrence for every template (daily = +24 h, weekly = +7 d on both ends),
//! and inserts it unless the series has passed `repeat_until` or the
//! occurrence already exists. Because every inserted occurrence carries the
//! template's own recurrence rule, the series keeps walking forward one step
//! per sweep.
//!
//! Re-running a sweep is safe: the `(title, start_time)` existence probe plus
//! the repository's idempotent insert means an occurrence is created at most
//! once no matter how often the trigger fires.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use log::{info, warn};
use uuid::Uuid;

use super::error::{ScheduleError, ServiceResult};
use crate::db::repository::{RepositoryResult, ScheduleRepository};
use crate::models::{RepeatType, Schedule};

/// Counters for one expansion cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionSummary {
    /// Active recurring templates inspected.
    pub examined: usize,
    /// New occurrences inserted.
    pub created: usize,
    /// Templates skipped: occurrence already present, or series terminated
    /// by `repeat_until`.
    pub skipped: usize,
    /// Templates whose occurrence could not be written (item-scoped errors).
    pub failed: usize,
}

/// Compute the next occurrence interval for a recurring schedule.
///
/// Both ends advance by the fixed recurrence step, so the occurrence keeps
/// the template's duration and UTC offset. `repeat_type = none` has no next
/// occurrence.
pub fn next_occurrence(
    schedule: &Schedule,
) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
    let step = match schedule.repeat_type {
        RepeatType::Daily => Duration::hours(24),
        RepeatType::Weekly => Duration::days(7),
        RepeatType::None => return None,
    };
    Some((schedule.start_time + step, schedule.end_time + step))
}

/// Run one expansion cycle over the active recurring set.
///
/// A fetch failure aborts the cycle. Item-scoped write failures are logged,
/// counted in the summary, and do not block the remaining templates; a
/// connection-class storage failure (one the backend already retried and
/// still lost) aborts the cycle, since every following write would hit the
/// same wall.
///
/// # Arguments
/// * `repo` - Repository implementation
/// * `now` - The cycle's notion of the current instant; `repeat_until`
///   eligibility is evaluated against it
pub async fn expand<R>(repo: &R, now: DateTime<Utc>) -> ServiceResult<ExpansionSummary>
where
    R: ScheduleRepository + ?Sized,
{
    let templates = repo.list_active_recurring(now).await?;
    info!(
        "Service layer: expanding {} active recurring schedules",
        templates.len()
    );

    let mut summary = ExpansionSummary::default();
    for template in &templates {
        summary.examined += 1;

        let Some((next_start, next_end)) = next_occurrence(template) else {
            summary.skipped += 1;
            continue;
        };

        if let Some(until) = template.repeat_until {
            if next_start > until {
                summary.skipped += 1;
                continue;
            }
        }

        match materialize(repo, template, next_start, next_end).await {
            Ok(true) => summary.created += 1,
            Ok(false) => summary.skipped += 1,
            Err(err) if err.is_retryable() => {
                warn!(
                    "Service layer: aborting expansion cycle on storage failure: {}",
                    err
                );
                return Err(ScheduleError::from(err));
            }
            Err(err) => {
                warn!(
                    "Service layer: failed to materialize occurrence of '{}' ({}): {}",
                    template.title, template.id, err
                );
                summary.failed += 1;
            }
        }
    }

    info!(
        "Service layer: expansion done: examined={} created={} skipped={} failed={}",
        summary.examined, summary.created, summary.skipped, summary.failed
    );
    Ok(summary)
}

/// Insert the computed occurrence unless it already exists.
///
/// Returns `Ok(false)` for a duplicate, whether the existence probe saw it
/// or a concurrent writer won the insert.
async fn materialize<R>(
    repo: &R,
    template: &Schedule,
    next_start: DateTime<FixedOffset>,
    next_end: DateTime<FixedOffset>,
) -> RepositoryResult<bool>
where
    R: ScheduleRepository + ?Sized,
{
    if repo
        .exists_by_title_and_start(&template.title, next_start)
        .await?
    {
        return Ok(false);
    }

    let mut occurrence = template.clone();
    occurrence.id = Uuid::new_v4().to_string();
    occurrence.start_time = next_start;
    occurrence.end_time = next_end;
    occurrence.is_done = false;
    occurrence.created_at = None;

    repo.insert_if_absent(&occurrence).await
}

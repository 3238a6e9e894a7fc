//! Filter, sort and pagination types for the listing path.
//!
//! All normalization here is permissive: an unknown sort column falls back
//! to `start_time`, an unknown order falls back to ascending, and
//! non-positive page/limit values fall back to `1`/`10`. Typed filter values
//! (`repeat_type`, timestamp bounds) are NOT normalized here; parsing those
//! strictly is the HTTP layer's job.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::schedule::{RepeatType, Schedule};

/// Whitelisted sort columns for schedule listings.
///
/// The whitelist exists because a sort column cannot be passed to the
/// database as a bound parameter; everything else in the filter is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    StartTime,
    EndTime,
    CreatedAt,
    Title,
}

impl SortBy {
    /// Map user input onto the whitelist. Anything unrecognized falls back
    /// to [`SortBy::StartTime`] rather than failing.
    pub fn parse(value: &str) -> Self {
        match value {
            "start_time" => SortBy::StartTime,
            "end_time" => SortBy::EndTime,
            "created_at" => SortBy::CreatedAt,
            "title" => SortBy::Title,
            _ => SortBy::StartTime,
        }
    }

    /// Compare two schedules by this column, ascending.
    ///
    /// Used by the in-memory backend; the Postgres backend orders in SQL.
    /// A missing `created_at` sorts first.
    pub fn compare(&self, a: &Schedule, b: &Schedule) -> Ordering {
        match self {
            SortBy::StartTime => a.start_time.cmp(&b.start_time),
            SortBy::EndTime => a.end_time.cmp(&b.end_time),
            SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
            SortBy::Title => a.title.cmp(&b.title),
        }
    }
}

/// Sort direction; anything that is not `desc` (case-insensitive) means
/// ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn is_descending(&self) -> bool {
        matches!(self, SortOrder::Desc)
    }
}

/// Normalized page/limit pair. Construct through [`Pagination::normalized`]
/// so the invariants `page >= 1` and `limit >= 1` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Clamp raw user input: missing or non-positive values fall back to
    /// `page=1`, `limit=10`.
    pub fn normalized(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p.min(i64::from(u32::MAX)) as u32,
            _ => Self::DEFAULT_PAGE,
        };
        let limit = match limit {
            Some(l) if l >= 1 => l.min(i64::from(u32::MAX)) as u32,
            _ => Self::DEFAULT_LIMIT,
        };
        Self { page, limit }
    }

    /// Number of rows to skip before this page starts.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Filter predicate for schedule listings. All fields are optional and
/// combine with logical AND.
#[derive(Debug, Clone, Default)]
pub struct ScheduleFilter {
    /// Exact match on the completion flag.
    pub is_done: Option<bool>,
    /// Exact match on the recurrence rule.
    pub repeat_type: Option<RepeatType>,
    /// Case-insensitive substring match against title OR description.
    pub search: Option<String>,
    /// Lower bound on `start_time`, inclusive.
    pub start_after: Option<DateTime<FixedOffset>>,
    /// Upper bound on `start_time`, exclusive.
    pub start_before: Option<DateTime<FixedOffset>>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl ScheduleFilter {
    /// Evaluate the predicate against one schedule.
    ///
    /// This is the in-memory counterpart of the SQL the Postgres backend
    /// builds; both must agree so the two backends stay interchangeable.
    pub fn matches(&self, schedule: &Schedule) -> bool {
        if let Some(done) = self.is_done {
            if schedule.is_done != done {
                return false;
            }
        }
        if let Some(repeat) = self.repeat_type {
            if schedule.repeat_type != repeat {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !needle.is_empty()
                && !schedule.title.to_lowercase().contains(&needle)
                && !schedule.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(after) = self.start_after {
            if schedule.start_time < after {
                return false;
            }
        }
        if let Some(before) = self.start_before {
            if schedule.start_time >= before {
                return false;
            }
        }
        true
    }

    /// Comparator combining `sort_by` and `sort_order`, with `id` as the
    /// final tie-breaker so ordering is total and pagination is stable.
    pub fn compare(&self, a: &Schedule, b: &Schedule) -> Ordering {
        let ordering = self.sort_by.compare(a, b);
        let ordering = if self.sort_order.is_descending() {
            ordering.reverse()
        } else {
            ordering
        };
        ordering.then_with(|| a.id.cmp(&b.id))
    }
}

/// One page of schedules plus the pre-pagination total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePage {
    pub items: Vec<Schedule>,
    pub page: u32,
    pub limit: u32,
    /// Rows matching the filter before pagination was applied.
    pub total_items: u64,
    /// `ceil(total_items / limit)`; zero when nothing matches.
    pub total_pages: u64,
}

impl SchedulePage {
    pub fn new(items: Vec<Schedule>, pagination: Pagination, total_items: u64) -> Self {
        Self {
            items,
            page: pagination.page,
            limit: pagination.limit,
            total_items,
            total_pages: total_items.div_ceil(u64::from(pagination.limit)),
        }
    }
}

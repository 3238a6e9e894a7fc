//! Data Transfer Objects for the HTTP API.
//!
//! These DTOs are used for request/response serialization in the REST API.
//! The schedule entity itself is already serializable in its wire shape, so
//! responses reuse it directly.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// The entity doubles as the response body.
pub use crate::models::{RepeatType, Schedule};

use crate::models::{Pagination, ScheduleFilter, SchedulePage, SortBy, SortOrder};
use crate::services::SchedulePatch;

/// Request body for AI schedule generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Free-text description of the day to plan
    pub description: String,
}

/// Request body for a partial schedule update. Absent fields keep their
/// stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub end_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub is_done: Option<bool>,
    #[serde(default)]
    pub repeat_type: Option<RepeatType>,
    /// Absent leaves the bound alone; an explicit `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub repeat_until: Option<Option<DateTime<FixedOffset>>>,
}

/// Deserializer that keeps the absent-vs-null distinction: the field missing
/// entirely stays `None`, an explicit `null` becomes `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

impl UpdateScheduleRequest {
    pub fn into_patch(self) -> SchedulePatch {
        SchedulePatch {
            title: self.title,
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            is_done: self.is_done,
            repeat_type: self.repeat_type,
            repeat_until: self.repeat_until,
        }
    }
}

/// Query parameters for schedule listings.
///
/// Pagination and sorting are permissive (bad values fall back to defaults);
/// the typed filters (`repeat_type`, timestamp bounds) are strict and reject
/// unparseable input.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub is_done: Option<bool>,
    #[serde(default)]
    pub repeat_type: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub start_after: Option<String>,
    #[serde(default)]
    pub start_before: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
}

impl ListQuery {
    /// Split the raw query into normalized pagination and a typed filter.
    ///
    /// # Errors
    /// A human-readable message when `repeat_type`, `start_after` or
    /// `start_before` cannot be parsed.
    pub fn into_parts(self) -> Result<(Pagination, ScheduleFilter), String> {
        let pagination = Pagination::normalized(self.page, self.limit);

        let repeat_type = match self.repeat_type.as_deref() {
            None | Some("") => None,
            Some(value) => Some(value.parse::<RepeatType>()?),
        };

        let start_after = match self.start_after.as_deref() {
            None | Some("") => None,
            Some(value) => Some(
                DateTime::parse_from_rfc3339(value)
                    .map_err(|e| format!("invalid start_after {value:?}: {e}"))?,
            ),
        };

        let start_before = match self.start_before.as_deref() {
            None | Some("") => None,
            Some(value) => Some(
                DateTime::parse_from_rfc3339(value)
                    .map_err(|e| format!("invalid start_before {value:?}: {e}"))?,
            ),
        };

        let filter = ScheduleFilter {
            is_done: self.is_done,
            repeat_type,
            search: self.search.filter(|s| !s.is_empty()),
            start_after,
            start_before,
            sort_by: SortBy::parse(self.sort_by.as_deref().unwrap_or_default()),
            sort_order: SortOrder::parse(self.sort_order.as_deref().unwrap_or_default()),
        };

        Ok((pagination, filter))
    }
}

/// One page of schedules in the response envelope shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedSchedules {
    pub data: Vec<Schedule>,
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl From<SchedulePage> for PaginatedSchedules {
    fn from(page: SchedulePage) -> Self {
        Self {
            data: page.items,
            page: page.page,
            limit: page.limit,
            total_items: page.total_items,
            total_pages: page.total_pages,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Storage backend status
    pub repository: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults_are_permissive() {
        let query = ListQuery {
            page: Some(-1),
            limit: Some(0),
            sort_by: Some("droptable".to_string()),
            sort_order: Some("sideways".to_string()),
            ..Default::default()
        };

        let (pagination, filter) = query.into_parts().unwrap();
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 10);
        assert_eq!(filter.sort_by, SortBy::StartTime);
        assert_eq!(filter.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_list_query_rejects_bad_typed_filters() {
        let bad_repeat = ListQuery {
            repeat_type: Some("yearly".to_string()),
            ..Default::default()
        };
        assert!(bad_repeat.into_parts().is_err());

        let bad_bound = ListQuery {
            start_after: Some("next tuesday".to_string()),
            ..Default::default()
        };
        assert!(bad_bound.into_parts().is_err());
    }

    #[test]
    fn test_list_query_parses_typed_filters() {
        let query = ListQuery {
            is_done: Some(true),
            repeat_type: Some("weekly".to_string()),
            start_after: Some("2025-08-04T00:00:00+07:00".to_string()),
            search: Some("".to_string()),
            ..Default::default()
        };

        let (_, filter) = query.into_parts().unwrap();
        assert_eq!(filter.is_done, Some(true));
        assert_eq!(filter.repeat_type, Some(RepeatType::Weekly));
        assert!(filter.start_after.is_some());
        assert!(filter.search.is_none(), "empty search means no filter");
    }

    #[test]
    fn test_update_request_distinguishes_absent_from_null() {
        let absent: UpdateScheduleRequest = serde_json::from_str(r#"{"title":"t"}"#).unwrap();
        assert!(absent.repeat_until.is_none());

        let null: UpdateScheduleRequest =
            serde_json::from_str(r#"{"repeat_until":null}"#).unwrap();
        assert_eq!(null.repeat_until, Some(None));

        let set: UpdateScheduleRequest =
            serde_json::from_str(r#"{"repeat_until":"2025-09-01T00:00:00+07:00"}"#).unwrap();
        assert!(matches!(set.repeat_until, Some(Some(_))));
    }
}

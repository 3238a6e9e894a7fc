//! The schedule entity and its recurrence rule.

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recurrence rule attached to a schedule.
///
/// Only fixed-step recurrence is modeled: `daily` advances a schedule by
/// exactly 24 hours, `weekly` by exactly 7 days. The textual form (serde and
/// database column alike) is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatType {
    /// One-shot schedule, never expanded.
    #[default]
    None,
    /// Repeats every 24 hours.
    Daily,
    /// Repeats every 7 days.
    Weekly,
}

impl RepeatType {
    /// Lowercase textual form used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatType::None => "none",
            RepeatType::Daily => "daily",
            RepeatType::Weekly => "weekly",
        }
    }

    /// Whether the recurrence materializer should consider this schedule.
    pub fn is_recurring(&self) -> bool {
        !matches!(self, RepeatType::None)
    }
}

impl fmt::Display for RepeatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepeatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(RepeatType::None),
            "daily" => Ok(RepeatType::Daily),
            "weekly" => Ok(RepeatType::Weekly),
            other => Err(format!(
                "unknown repeat type '{}' (expected none, daily or weekly)",
                other
            )),
        }
    }
}

/// A titled time interval, optionally recurring, optionally marked done.
///
/// Values are passed between components by copy; the repository exclusively
/// owns durable storage. Timestamps keep the author's UTC offset so it
/// survives a parse → store → response round trip through the in-memory
/// backend; comparisons are always instant comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Opaque unique identifier (v4 UUID in canonical text form), assigned at
    /// creation and immutable afterwards.
    pub id: String,
    /// Non-empty display title.
    pub title: String,
    /// Free-form description, may be empty.
    pub description: String,
    /// Start of the interval. Strictly precedes `end_time`.
    pub start_time: DateTime<FixedOffset>,
    /// End of the interval.
    pub end_time: DateTime<FixedOffset>,
    /// Completion flag, defaults to false.
    #[serde(default)]
    pub is_done: bool,
    /// Recurrence rule, defaults to `none`.
    #[serde(default)]
    pub repeat_type: RepeatType,
    /// Inclusive recurrence boundary; an occurrence whose start would fall
    /// strictly after this instant is never materialized. Absent means the
    /// series is unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_until: Option<DateTime<FixedOffset>>,
    /// Stamped by the repository at insert, never touched by updates.
    /// `None` until the value has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Schedule {
    /// Build a draft schedule with a fresh id, not done, non-recurring and
    /// not yet persisted (`created_at` is `None`).
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        start_time: DateTime<FixedOffset>,
        end_time: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            start_time,
            end_time,
            is_done: false,
            repeat_type: RepeatType::None,
            repeat_until: None,
            created_at: None,
        }
    }

    /// Check the entity invariants: non-blank title, `start_time < end_time`,
    /// and a coherent repeat rule (`repeat_until` requires a recurring
    /// `repeat_type` and must not precede `start_time`).
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            anyhow::bail!("title must not be blank");
        }
        if self.start_time >= self.end_time {
            anyhow::bail!(
                "start_time must be before end_time ({} >= {})",
                self.start_time,
                self.end_time
            );
        }
        if let Some(until) = self.repeat_until {
            if !self.repeat_type.is_recurring() {
                anyhow::bail!("repeat_until requires repeat_type daily or weekly");
            }
            if until < self.start_time {
                anyhow::bail!("repeat_until must not precede start_time");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn sample() -> Schedule {
        Schedule::new(
            "Morning run",
            "5k around the park",
            ts("2025-08-05T07:00:00+07:00"),
            ts("2025-08-05T08:00:00+07:00"),
        )
    }

    #[test]
    fn new_assigns_identity_and_defaults() {
        let a = sample();
        let b = sample();
        assert_ne!(a.id, b.id, "each draft must get its own id");
        assert!(!a.is_done);
        assert_eq!(a.repeat_type, RepeatType::None);
        assert!(a.repeat_until.is_none());
        assert!(a.created_at.is_none());
    }

    #[test]
    fn validate_accepts_well_formed_schedule() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_title() {
        let mut s = sample();
        s.title = "   ".to_string();
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_interval() {
        let mut s = sample();
        s.end_time = s.start_time;
        assert!(s.validate().is_err());

        s.end_time = ts("2025-08-05T06:00:00+07:00");
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_repeat_until_without_rule() {
        let mut s = sample();
        s.repeat_until = Some(ts("2025-09-01T00:00:00+07:00"));
        assert!(s.validate().is_err());

        s.repeat_type = RepeatType::Daily;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn validate_rejects_repeat_until_before_start() {
        let mut s = sample();
        s.repeat_type = RepeatType::Weekly;
        s.repeat_until = Some(ts("2025-08-01T00:00:00+07:00"));
        assert!(s.validate().is_err());
    }

    #[test]
    fn repeat_type_round_trips_through_text() {
        for rt in [RepeatType::None, RepeatType::Daily, RepeatType::Weekly] {
            assert_eq!(rt.as_str().parse::<RepeatType>().unwrap(), rt);
        }
        assert_eq!("DAILY".parse::<RepeatType>().unwrap(), RepeatType::Daily);
        assert!("purple".parse::<RepeatType>().is_err());
    }

    #[test]
    fn repeat_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RepeatType::Weekly).unwrap(),
            "\"weekly\""
        );
        let parsed: RepeatType = serde_json::from_str("\"daily\"").unwrap();
        assert_eq!(parsed, RepeatType::Daily);
    }

    #[test]
    fn schedule_serde_keeps_offset() {
        let s = sample();
        let json = serde_json::to_string(&s).unwrap();
        let back: Schedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back.start_time, s.start_time);
        assert_eq!(back.start_time.offset(), s.start_time.offset());
        assert!(!json.contains("repeat_until"), "absent fields stay absent");
    }
}

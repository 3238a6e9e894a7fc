//! Provider reply parsing.
//!
//! The text-generation provider is asked for a JSON array but replies with
//! whatever it likes: the array is routinely wrapped in prose, markdown
//! fences, or an apology. The parser cuts the span between the first `[` and
//! the last `]` out of the reply, decodes it as a JSON array, and converts
//! each record independently so one bad record never sinks the batch.

use chrono::DateTime;
use log::warn;
use serde::Deserialize;

use super::error::ScheduleError;
use crate::models::Schedule;

/// One record as the provider writes it. Timestamps stay strings here so a
/// bad one fails only its own record, not the whole array decode.
#[derive(Debug, Deserialize)]
struct RawDraft {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    start_time: String,
    #[serde(default)]
    end_time: String,
}

/// Parse a provider reply into schedule drafts.
///
/// Each surviving draft carries a fresh id, `is_done = false`, no recurrence
/// rule and no `created_at` (stamped at persistence). Records that cannot be
/// used (blank title, unparseable timestamp, start not before end, not an
/// object) are skipped with a warning; an empty result is valid here and is
/// the orchestrator's problem.
///
/// # Errors
/// [`ScheduleError::MalformedResponse`] when the reply has no `[...]` span at
/// all, or the span is not a well-formed JSON array.
pub fn parse_schedules(reply: &str) -> Result<Vec<Schedule>, ScheduleError> {
    let span = extract_array_span(reply).ok_or_else(|| {
        ScheduleError::MalformedResponse("no JSON array found in provider reply".to_string())
    })?;

    let records: Vec<serde_json::Value> = serde_json::from_str(span).map_err(|e| {
        ScheduleError::MalformedResponse(format!("reply span is not a JSON array: {e}"))
    })?;

    let mut drafts = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match draft_from_record(record) {
            Ok(draft) => drafts.push(draft),
            Err(reason) => warn!("Skipping schedule record {index}: {reason}"),
        }
    }

    Ok(drafts)
}

/// The text between the first `[` and the last `]`, brackets included.
fn extract_array_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn draft_from_record(record: serde_json::Value) -> Result<Schedule, String> {
    let raw: RawDraft =
        serde_json::from_value(record).map_err(|e| format!("not a schedule object: {e}"))?;

    if raw.title.trim().is_empty() {
        return Err("blank title".to_string());
    }

    let start = DateTime::parse_from_rfc3339(&raw.start_time)
        .map_err(|e| format!("bad start_time {:?}: {e}", raw.start_time))?;
    let end = DateTime::parse_from_rfc3339(&raw.end_time)
        .map_err(|e| format!("bad end_time {:?}: {e}", raw.end_time))?;

    if start >= end {
        return Err(format!(
            "start_time {} is not before end_time {}",
            raw.start_time, raw.end_time
        ));
    }

    Ok(Schedule::new(raw.title, raw.description, start, end))
}

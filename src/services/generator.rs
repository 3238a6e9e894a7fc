//! Text-to-schedule generation orchestration.
//!
//! One call: take a free-text day description, ask the provider for a JSON
//! day plan, parse it into drafts, and persist the whole batch atomically.
//! The provider call runs under its own deadline so a stuck upstream cannot
//! hold a request open indefinitely.

use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, Utc};
use log::info;

use super::error::{ScheduleError, ServiceResult};
use super::parser;
use crate::db::repository::ScheduleRepository;
use crate::models::Schedule;
use crate::provider::{ProviderError, TextGenerator};

/// Default deadline for one provider call.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Generate schedules from a free-text description and persist them.
///
/// # Arguments
/// * `repo` - Repository implementation
/// * `provider` - Text-generation provider
/// * `description` - Free-text day description; must not be blank
/// * `display_offset` - UTC offset the prompt's date hints are written in
///
/// # Returns
/// * `Ok(Vec<Schedule>)` - The persisted drafts, ids assigned
/// * `Err(ScheduleError)` - `InvalidInput` for a blank description (the
///   provider is never called), `ProviderFailure` for transport/timeout,
///   `MalformedResponse`/`GenerationEmpty` for unusable replies,
///   `PersistenceFailure` when the batch insert fails
pub async fn generate_schedules<R>(
    repo: &R,
    provider: &dyn TextGenerator,
    description: &str,
    display_offset: FixedOffset,
) -> ServiceResult<Vec<Schedule>>
where
    R: ScheduleRepository + ?Sized,
{
    generate_schedules_with_timeout(repo, provider, description, display_offset, GENERATION_TIMEOUT)
        .await
}

/// [`generate_schedules`] with an explicit provider deadline.
///
/// Nothing is written to storage unless parsing succeeded with at least one
/// draft; the batch insert is atomic, so a failure there persists nothing.
pub async fn generate_schedules_with_timeout<R>(
    repo: &R,
    provider: &dyn TextGenerator,
    description: &str,
    display_offset: FixedOffset,
    timeout: Duration,
) -> ServiceResult<Vec<Schedule>>
where
    R: ScheduleRepository + ?Sized,
{
    if description.trim().is_empty() {
        return Err(ScheduleError::InvalidInput(
            "description must not be blank".to_string(),
        ));
    }

    let today = Utc::now().with_timezone(&display_offset).date_naive();
    let prompt = build_prompt(description, today, display_offset);

    info!(
        "Service layer: requesting schedule generation from provider '{}'",
        provider.name()
    );
    let reply = tokio::time::timeout(timeout, provider.complete(&prompt))
        .await
        .map_err(|_| ProviderError::Timeout(timeout.as_secs()))??;

    let drafts = parser::parse_schedules(&reply)?;
    if drafts.is_empty() {
        return Err(ScheduleError::GenerationEmpty);
    }

    repo.insert_batch(&drafts).await?;
    info!(
        "Service layer: generated and persisted {} schedules",
        drafts.len()
    );
    Ok(drafts)
}

/// Build the generation prompt around the user's description.
///
/// The reply contract matters more than the phrasing: a JSON array of
/// `{title, description, start_time, end_time}` objects with RFC 3339
/// timestamps carrying an explicit UTC offset, and nothing else.
fn build_prompt(description: &str, today: NaiveDate, offset: FixedOffset) -> String {
    format!(
        "You are a scheduling assistant. Based on this input: \"{description}\", \
generate a day plan as a JSON array of items, each with title, description, \
start_time and end_time in RFC 3339 format with an explicit UTC offset \
(like \"{today}T07:00:00{offset}\").\n\
\n\
IMPORTANT:\n\
- Determine the date from the input (e.g., \"tomorrow\", a weekday name, or an explicit date).\n\
- ALL items must use the same inferred date.\n\
- If no date is mentioned, use today ({today}).\n\
- Plan between 07:00 and 23:00 in the UTC{offset} timezone.\n\
\n\
Respond ONLY with a valid JSON array like this:\n\
[\n\
  {{\n\
    \"title\": \"Task title\",\n\
    \"description\": \"What it is\",\n\
    \"start_time\": \"{today}T07:00:00{offset}\",\n\
    \"end_time\": \"{today}T08:00:00{offset}\"\n\
  }}\n\
]"
    )
}

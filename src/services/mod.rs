//! Business logic for the schedule lifecycle.
//!
//! Three engines live here, sharing the repository contract:
//! - `generator` + `parser`: free text → provider → validated drafts → one
//!   atomic batch insert.
//! - `recurrence` + `sweeper`: periodic materialization of recurring
//!   schedules into concrete occurrences, idempotent per cycle.
//! - `schedules`: the manual path (fetch, partial update, done toggles,
//!   deletes) and the listing/window queries.
//!
//! All functions are generic over [`crate::db::ScheduleRepository`] and carry
//! no state of their own.

pub mod error;
pub mod generator;
pub mod parser;
pub mod recurrence;
pub mod schedules;
pub mod sweeper;

pub use error::{ScheduleError, ServiceResult};
pub use generator::{generate_schedules, generate_schedules_with_timeout, GENERATION_TIMEOUT};
pub use parser::parse_schedules;
pub use recurrence::{expand, next_occurrence, ExpansionSummary};
pub use schedules::{
    day_window, delete_all_schedules, delete_schedule, get_schedule, list_schedules, set_done,
    this_week_schedules, today_schedules, update_schedule, week_window, SchedulePatch,
};
pub use sweeper::spawn_sweeper;

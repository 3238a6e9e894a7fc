//! Domain model types shared by every layer.
//!
//! The schedule entity and its recurrence rule live in [`schedule`]; the
//! filter, sort and pagination types consumed by the listing path live in
//! [`filter`]. Both storage backends and the HTTP layer speak these types,
//! so normalization rules (sort whitelist, page clamping) are defined here
//! once as pure functions.

pub mod filter;
pub mod schedule;

pub use filter::{Pagination, ScheduleFilter, SchedulePage, SortBy, SortOrder};
pub use schedule::{RepeatType, Schedule};

//! # callog-engine
//!
//! Schedule conflict detection and recurrence expansion for the Callog
//! activity log.
//!
//! Schedules are wall-clock blocks on a single calendar date. The engine
//! decides whether a new or edited block double-books an existing one, and
//! turns a base schedule plus a daily/weekly/monthly rule into a bounded list
//! of concrete instances that share a recurrence group id.
//!
//! ## Modules
//!
//! - [`conflict`] — Same-date, half-open overlap checks with self-exclusion
//! - [`expander`] — Recurrence rule → chronological schedule instances
//! - [`schedule`] — Schedule, time slot and draft types
//! - [`time`] — Date/time parsing, formatting and weekday numbering
//! - [`validation`] — Field-level checks for schedule and project drafts
//! - [`project`] — Project date ranges and monthly progress
//! - [`store`] — Repository seam and the create/update/delete service
//! - [`wire`] — JSON shapes exchanged with the backend and calendar view
//! - [`ids`] — Schedule and recurrence group id generation
//! - [`error`] — Error types

pub mod conflict;
pub mod error;
pub mod expander;
pub mod ids;
pub mod project;
pub mod schedule;
pub mod store;
pub mod time;
pub mod validation;
pub mod wire;

pub use conflict::{
    check_batch, detect_conflict, BatchConflictPolicy, ConflictKind, ConflictResult,
};
pub use error::{CallogError, ConflictError};
pub use expander::{
    expand, expand_with_options, ExpansionOptions, Frequency, RecurrenceRule, Termination,
};
pub use ids::{IdSource, SequentialIds, UuidIds};
pub use project::{monthly_stats, Project, ProjectMonthlyStats};
pub use schedule::{ScheduleDraft, ScheduleId, ScheduleInstance, ScheduleKind, TimeSlot};
pub use store::{DeleteScope, InMemoryScheduleStore, ScheduleRepository, ScheduleService};

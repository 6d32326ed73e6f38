//! Error types for callog-engine operations.

use thiserror::Error;

use crate::schedule::{ScheduleId, ScheduleInstance};
use crate::validation::FieldErrors;

#[derive(Error, Debug)]
pub enum CallogError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid weekday: {0}")]
    InvalidWeekday(String),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Schedule not found: {0}")]
    NotFound(ScheduleId),

    #[error("Schedule id already in use: {0}")]
    DuplicateId(ScheduleId),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a candidate time slot was rejected.
///
/// `InvalidRange` is a malformed candidate; `Overlap` is a genuine
/// double-booking and carries every instance it collides with.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConflictError {
    #[error("end time must be after start time")]
    InvalidRange,

    #[error("time slot overlaps {} existing schedule(s)", conflicting.len())]
    Overlap { conflicting: Vec<ScheduleInstance> },
}

pub type Result<T> = std::result::Result<T, CallogError>;

//! Detect time conflicts between a candidate slot and existing schedules.
//!
//! Two slots conflict when they fall on the same date and
//! `candidate.start < existing.end && candidate.end > existing.start`.
//! Adjacent slots (one ends exactly when the other starts) are NOT conflicts.

use serde::{Deserialize, Serialize};

use crate::error::ConflictError;
use crate::schedule::{ScheduleId, ScheduleInstance, TimeSlot};

/// Failure class reported by [`detect_conflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictKind {
    /// The candidate's end time is not after its start time.
    InvalidRange,
    /// The candidate overlaps at least one existing schedule.
    Overlap,
}

/// Structured outcome of a conflict check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResult {
    pub has_conflict: bool,
    /// Every overlapping schedule, in input order.
    pub conflicting_instances: Vec<ScheduleInstance>,
    pub error_kind: Option<ConflictKind>,
}

impl ConflictResult {
    fn clear() -> Self {
        Self {
            has_conflict: false,
            conflicting_instances: Vec::new(),
            error_kind: None,
        }
    }

    fn invalid_range() -> Self {
        Self {
            has_conflict: true,
            conflicting_instances: Vec::new(),
            error_kind: Some(ConflictKind::InvalidRange),
        }
    }

    /// Convert into a `Result` so callers can use `?`.
    pub fn into_result(self) -> Result<(), ConflictError> {
        match self.error_kind {
            None => Ok(()),
            Some(ConflictKind::InvalidRange) => Err(ConflictError::InvalidRange),
            Some(ConflictKind::Overlap) => Err(ConflictError::Overlap {
                conflicting: self.conflicting_instances,
            }),
        }
    }
}

/// Check `candidate` against `existing`, skipping the schedule whose id equals
/// `exclude_id` (used when an edited schedule is checked against all others).
///
/// An invalid range is reported before any overlap search, even when
/// `existing` is empty. Conflicts are collected without short-circuiting so
/// the caller can show the full set.
pub fn detect_conflict(
    candidate: &TimeSlot,
    existing: &[ScheduleInstance],
    exclude_id: Option<&ScheduleId>,
) -> ConflictResult {
    if !candidate.is_valid_range() {
        return ConflictResult::invalid_range();
    }

    let conflicting: Vec<ScheduleInstance> = existing
        .iter()
        .filter(|s| exclude_id != Some(&s.id))
        .filter(|s| candidate.overlaps(&s.slot()))
        .cloned()
        .collect();

    if conflicting.is_empty() {
        return ConflictResult::clear();
    }

    ConflictResult {
        has_conflict: true,
        conflicting_instances: conflicting,
        error_kind: Some(ConflictKind::Overlap),
    }
}

/// Whether each instance of an expanded recurrence must pass
/// [`detect_conflict`] before the batch is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchConflictPolicy {
    /// Every generated instance is checked; one conflict rejects the batch.
    #[default]
    CheckEach,
    /// Skip local checks and let the persistence layer decide.
    DeferToBackend,
}

/// A rejected member of a recurrence batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConflict {
    pub instance: ScheduleInstance,
    pub result: ConflictResult,
}

/// Apply `policy` to an expanded batch. Returns every instance that failed,
/// in batch order; an empty vector means the batch may be committed.
///
/// Batch members are not stored yet, so no id is excluded from the check.
pub fn check_batch(
    batch: &[ScheduleInstance],
    existing: &[ScheduleInstance],
    policy: BatchConflictPolicy,
) -> Vec<BatchConflict> {
    if policy == BatchConflictPolicy::DeferToBackend {
        return Vec::new();
    }

    batch
        .iter()
        .filter_map(|instance| {
            let result = detect_conflict(&instance.slot(), existing, None);
            result.has_conflict.then(|| BatchConflict {
                instance: instance.clone(),
                result,
            })
        })
        .collect()
}

//! Identifier generation for expanded schedules.
//!
//! Expansion needs fresh ids for generated instances and for the recurrence
//! group. The source is injected so tests get reproducible output.

use uuid::Uuid;

use crate::schedule::{RecurrenceGroupId, ScheduleId};

pub trait IdSource {
    fn schedule_id(&mut self) -> ScheduleId;
    fn group_id(&mut self) -> RecurrenceGroupId;
}

impl<T: IdSource + ?Sized> IdSource for &mut T {
    fn schedule_id(&mut self) -> ScheduleId {
        (**self).schedule_id()
    }

    fn group_id(&mut self) -> RecurrenceGroupId {
        (**self).group_id()
    }
}

impl<T: IdSource + ?Sized> IdSource for Box<T> {
    fn schedule_id(&mut self) -> ScheduleId {
        (**self).schedule_id()
    }

    fn group_id(&mut self) -> RecurrenceGroupId {
        (**self).group_id()
    }
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn schedule_id(&mut self) -> ScheduleId {
        ScheduleId::new(Uuid::new_v4().to_string())
    }

    fn group_id(&mut self) -> RecurrenceGroupId {
        RecurrenceGroupId::new(Uuid::new_v4().to_string())
    }
}

/// Deterministic counters: `{prefix}-1`, `{prefix}-2`, ... for schedules and
/// `{prefix}-group-1`, ... for recurrence groups.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next_schedule: u64,
    next_group: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_schedule: 1,
            next_group: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("local")
    }
}

impl IdSource for SequentialIds {
    fn schedule_id(&mut self) -> ScheduleId {
        let id = ScheduleId::new(format!("{}-{}", self.prefix, self.next_schedule));
        self.next_schedule += 1;
        id
    }

    fn group_id(&mut self) -> RecurrenceGroupId {
        let id = RecurrenceGroupId::new(format!("{}-group-{}", self.prefix, self.next_group));
        self.next_group += 1;
        id
    }
}

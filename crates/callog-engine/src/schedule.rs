//! Schedule data model: concrete bookable time blocks on a calendar date.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::time::{self, minutes_since_midnight};

/// Opaque schedule identifier assigned by the caller or backend.
///
/// The backend hands out numeric ids while locally generated ids are UUID
/// strings, so both JSON numbers and strings deserialize into this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ScheduleId(String);

impl ScheduleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScheduleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<u64> for ScheduleId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for ScheduleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// Identifier shared by every instance produced from one recurrence expansion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecurrenceGroupId(String);

impl RecurrenceGroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecurrenceGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend project identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a schedule block is spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleKind {
    /// Time logged against a project. Requires a project reference.
    #[default]
    Project,
    /// Time that is blocked but not project work (classes, errands, ...).
    Inactive,
}

impl ScheduleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleKind::Project => "PROJECT",
            ScheduleKind::Inactive => "INACTIVE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PROJECT" => Some(ScheduleKind::Project),
            "INACTIVE" => Some(ScheduleKind::Inactive),
            _ => None,
        }
    }
}

/// A date plus a wall-clock time range on that date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub date: NaiveDate,
    #[serde(with = "time::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "time::hhmm")]
    pub end_time: NaiveTime,
}

impl TimeSlot {
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            date,
            start_time,
            end_time,
        }
    }

    /// Build a slot from `YYYY-MM-DD` and two `HH:MM` strings.
    pub fn parse(date: &str, start: &str, end: &str) -> crate::error::Result<Self> {
        Ok(Self::new(
            time::parse_date(date)?,
            time::parse_time(start)?,
            time::parse_time(end)?,
        ))
    }

    pub fn start_minutes(&self) -> u32 {
        minutes_since_midnight(self.start_time)
    }

    pub fn end_minutes(&self) -> u32 {
        minutes_since_midnight(self.end_time)
    }

    /// End strictly after start on the same date.
    pub fn is_valid_range(&self) -> bool {
        self.end_minutes() > self.start_minutes()
    }

    pub fn duration_minutes(&self) -> i64 {
        time::duration_minutes(self.start_time, self.end_time)
    }

    /// Half-open overlap on the same date. Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.date == other.date
            && self.start_minutes() < other.end_minutes()
            && self.end_minutes() > other.start_minutes()
    }

    /// Length of the shared interval in minutes, 0 when the slots don't overlap.
    pub fn overlap_minutes(&self, other: &TimeSlot) -> u32 {
        if !self.overlaps(other) {
            return 0;
        }
        let start = self.start_minutes().max(other.start_minutes());
        let end = self.end_minutes().min(other.end_minutes());
        end - start
    }
}

/// A single concrete schedule on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInstance {
    pub id: ScheduleId,
    #[serde(default)]
    pub title: String,
    pub date: NaiveDate,
    #[serde(with = "time::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "time::hhmm")]
    pub end_time: NaiveTime,
    #[serde(rename = "type", default)]
    pub kind: ScheduleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub content: String,
    /// Backend payloads name this `recurrenceId`.
    #[serde(default, alias = "recurrenceId", skip_serializing_if = "Option::is_none")]
    pub recurrence_group_id: Option<RecurrenceGroupId>,
}

impl ScheduleInstance {
    pub fn new(id: ScheduleId, title: impl Into<String>, kind: ScheduleKind, slot: TimeSlot) -> Self {
        Self {
            id,
            title: title.into(),
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            kind,
            project_id: None,
            content: String::new(),
            recurrence_group_id: None,
        }
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.date, self.start_time, self.end_time)
    }

    pub fn set_slot(&mut self, slot: TimeSlot) {
        self.date = slot.date;
        self.start_time = slot.start_time;
        self.end_time = slot.end_time;
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_group_id.is_some()
    }

    pub fn duration_minutes(&self) -> i64 {
        self.slot().duration_minutes()
    }
}

/// A schedule as entered by the user, before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDraft {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: ScheduleKind,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub content: String,
    pub date: NaiveDate,
    #[serde(with = "time::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "time::hhmm")]
    pub end_time: NaiveTime,
}

impl ScheduleDraft {
    pub fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.date, self.start_time, self.end_time)
    }

    /// Attach an id, producing a one-off instance.
    pub fn into_instance(self, id: ScheduleId) -> ScheduleInstance {
        ScheduleInstance {
            id,
            title: self.title,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            kind: self.kind,
            project_id: self.project_id,
            content: self.content,
            recurrence_group_id: None,
        }
    }

    /// Apply the draft's fields to an existing instance. Id and recurrence
    /// group are left untouched.
    pub fn apply_to(&self, instance: &mut ScheduleInstance) {
        instance.title = self.title.clone();
        instance.kind = self.kind;
        instance.project_id = self.project_id;
        instance.content = self.content.clone();
        instance.set_slot(self.slot());
    }
}

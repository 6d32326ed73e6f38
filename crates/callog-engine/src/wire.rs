//! JSON shapes exchanged with the Callog backend and calendar UI.
//!
//! Field names are camelCase to match the REST API. Weekdays in
//! [`RepeatOptions::days`] use ISO numbering (`"1"` = Monday .. `"7"` =
//! Sunday); conversion to and from [`RecurrenceRule::weekdays`] happens here
//! and nowhere else.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::conflict::{ConflictKind, ConflictResult};
use crate::error::{CallogError, ConflictError, Result};
use crate::expander::{Frequency, RecurrenceRule, Termination};
use crate::schedule::{
    ProjectId, RecurrenceGroupId, ScheduleDraft, ScheduleId, ScheduleInstance, ScheduleKind,
};
use crate::store::DeleteScope;
use crate::time::{self, iso_to_js_weekday, js_to_iso_weekday};

/// `repeat` block of a schedule create request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatOptions {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    /// ISO weekday numbers as strings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days: Vec<String>,
    /// `"never"`, `"date"` or `"count"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_count: Option<u32>,
}

impl RepeatOptions {
    /// Convert to an in-memory rule.
    ///
    /// Never fails: an unknown frequency leaves the rule degenerate, unusable
    /// weekday entries are dropped, and an end type missing its value falls
    /// back to `never`.
    pub fn to_rule(&self) -> RecurrenceRule {
        let frequency = self.frequency.as_deref().and_then(Frequency::parse);

        let weekdays = self
            .days
            .iter()
            .filter_map(|raw| {
                let parsed = raw
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .and_then(|iso| iso_to_js_weekday(iso).ok());
                if parsed.is_none() {
                    warn!(day = %raw, "ignoring invalid ISO weekday in repeat options");
                }
                parsed
            })
            .collect();

        let termination = match (self.end_type.as_deref(), self.end_date, self.end_count) {
            (Some("date"), Some(end_date), _) => Termination::OnDate { end_date },
            (Some("count"), _, Some(count)) => Termination::AfterCount { count },
            _ => Termination::Never,
        };

        RecurrenceRule {
            enabled: self.enabled,
            frequency,
            interval: self.interval.unwrap_or(1).max(1),
            weekdays,
            termination,
        }
    }

    /// Convert an in-memory rule to the backend shape.
    pub fn from_rule(rule: &RecurrenceRule) -> Self {
        let mut iso_days: Vec<u8> = rule
            .weekdays
            .iter()
            .filter_map(|&js| js_to_iso_weekday(js).ok())
            .collect();
        iso_days.sort_unstable();
        let days = iso_days.iter().map(u8::to_string).collect();

        let (end_type, end_date, end_count) = match rule.termination {
            Termination::Never => ("never", None, None),
            Termination::OnDate { end_date } => ("date", Some(end_date), None),
            Termination::AfterCount { count } => ("count", None, Some(count)),
        };

        Self {
            enabled: rule.enabled,
            frequency: rule.frequency.map(|f| f.as_str().to_string()),
            interval: Some(rule.interval),
            days,
            end_type: Some(end_type.to_string()),
            end_date,
            end_count,
        }
    }
}

/// `POST /schedules` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleCreateRequest {
    #[serde(flatten)]
    pub schedule: ScheduleDraft,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatOptions>,
}

impl ScheduleCreateRequest {
    /// The recurrence rule, disabled when `repeat` is absent.
    pub fn rule(&self) -> RecurrenceRule {
        self.repeat
            .as_ref()
            .map(RepeatOptions::to_rule)
            .unwrap_or_default()
    }
}

/// A schedule as returned by the backend.
///
/// `start`/`end` are `YYYY-MM-DDTHH:MM`. Older payloads carry only those two
/// fields, so `date`, `startTime` and `endTime` are optional on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub id: ScheduleId,
    #[serde(default)]
    pub title: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: ScheduleKind,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub recurrence_id: Option<RecurrenceGroupId>,
}

impl From<&ScheduleInstance> for ScheduleResponse {
    fn from(s: &ScheduleInstance) -> Self {
        Self {
            id: s.id.clone(),
            title: s.title.clone(),
            start: time::format_date_time(s.date, s.start_time),
            end: time::format_date_time(s.date, s.end_time),
            date: Some(s.date),
            start_time: Some(time::format_time(s.start_time)),
            end_time: Some(time::format_time(s.end_time)),
            kind: s.kind,
            project_id: s.project_id,
            content: s.content.clone(),
            recurrence_id: s.recurrence_group_id.clone(),
        }
    }
}

impl TryFrom<ScheduleResponse> for ScheduleInstance {
    type Error = CallogError;

    fn try_from(r: ScheduleResponse) -> Result<Self> {
        let (start_date, start_clock) = time::parse_date_time(&r.start)?;
        let (end_date, end_clock) = time::parse_date_time(&r.end)?;

        let date = r.date.unwrap_or(start_date);
        let start_time = match r.start_time.as_deref() {
            Some(t) => time::parse_time(t)?,
            None => start_clock,
        };
        let end_time = match r.end_time.as_deref() {
            Some(t) => time::parse_time(t)?,
            None => end_clock,
        };

        if start_date != end_date {
            return Err(CallogError::InvalidTime(format!(
                "schedule {} runs past midnight ({} to {})",
                r.id, r.start, r.end
            )));
        }
        if date != start_date {
            return Err(CallogError::InvalidTime(format!(
                "schedule {} has date {} but starts at {}",
                r.id, date, r.start
            )));
        }
        if end_time <= start_time {
            return Err(CallogError::InvalidTime(format!(
                "schedule {} ends before it starts ({} to {})",
                r.id,
                time::format_time(start_time),
                time::format_time(end_time)
            )));
        }

        Ok(ScheduleInstance {
            id: r.id,
            title: r.title,
            date,
            start_time,
            end_time,
            kind: r.kind,
            project_id: r.project_id,
            content: r.content,
            recurrence_group_id: r.recurrence_id,
        })
    }
}

/// Response to a create request: the base schedule plus every instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleCreateResponse {
    pub main_schedule: ScheduleResponse,
    pub schedules: Vec<ScheduleResponse>,
}

impl ScheduleCreateResponse {
    /// `None` when `instances` is empty.
    pub fn from_instances(instances: &[ScheduleInstance]) -> Option<Self> {
        let main = instances.first()?;
        Some(Self {
            main_schedule: ScheduleResponse::from(main),
            schedules: instances.iter().map(ScheduleResponse::from).collect(),
        })
    }
}

/// `DELETE /schedules/{id}` body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[serde(default)]
    pub delete_all_recurrences: bool,
}

impl From<DeleteRequest> for DeleteScope {
    fn from(req: DeleteRequest) -> Self {
        if req.delete_all_recurrences {
            DeleteScope::AllRecurrences
        } else {
            DeleteScope::Single
        }
    }
}

pub const SCHEDULE_CONFLICT: &str = "SCHEDULE_CONFLICT";
pub const INVALID_TIME_RANGE: &str = "INVALID_TIME_RANGE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSchedule {
    pub id: ScheduleId,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
}

impl From<&ScheduleInstance> for ConflictSchedule {
    fn from(s: &ScheduleInstance) -> Self {
        Self {
            id: s.id.clone(),
            title: s.title.clone(),
            start_time: time::format_time(s.start_time),
            end_time: time::format_time(s.end_time),
        }
    }
}

/// Error body describing a rejected slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictErrorResponse {
    pub error_code: String,
    pub message: String,
    pub conflict_schedules: Vec<ConflictSchedule>,
}

impl ConflictErrorResponse {
    /// Build the error body for a failed check. `None` if `result` is clear.
    /// The message text is supplied by the caller.
    pub fn from_result(result: &ConflictResult, message: impl Into<String>) -> Option<Self> {
        let error_code = match result.error_kind? {
            ConflictKind::InvalidRange => INVALID_TIME_RANGE,
            ConflictKind::Overlap => SCHEDULE_CONFLICT,
        };

        Some(Self {
            error_code: error_code.to_string(),
            message: message.into(),
            conflict_schedules: result
                .conflicting_instances
                .iter()
                .map(ConflictSchedule::from)
                .collect(),
        })
    }

    /// Build the error body for a conflict raised through `?`, using the
    /// error's own message.
    pub fn from_error(error: &ConflictError) -> Self {
        let (error_code, conflicting) = match error {
            ConflictError::InvalidRange => (INVALID_TIME_RANGE, &[][..]),
            ConflictError::Overlap { conflicting } => (SCHEDULE_CONFLICT, conflicting.as_slice()),
        };

        Self {
            error_code: error_code.to_string(),
            message: error.to_string(),
            conflict_schedules: conflicting.iter().map(ConflictSchedule::from).collect(),
        }
    }
}

/// Projection handed to the calendar view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: ScheduleId,
    pub title: String,
    pub start: String,
    pub end: String,
    #[serde(rename = "type")]
    pub kind: ScheduleKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_id: Option<RecurrenceGroupId>,
}

impl From<&ScheduleInstance> for CalendarEvent {
    fn from(s: &ScheduleInstance) -> Self {
        Self {
            id: s.id.clone(),
            title: s.title.clone(),
            start: time::format_date_time(s.date, s.start_time),
            end: time::format_date_time(s.date, s.end_time),
            kind: s.kind,
            project_id: s.project_id,
            recurrence_id: s.recurrence_group_id.clone(),
        }
    }
}

//! Field-level validation for schedule and project drafts.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::project::ProjectDraft;
use crate::schedule::{ScheduleDraft, ScheduleKind};

/// Field name -> message, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_string(), message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Check a schedule draft before it reaches conflict detection.
///
/// Midnight-crossing ranges fail here as "end not after start" since times
/// never exceed one day.
pub fn validate_schedule(draft: &ScheduleDraft) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if draft.title.trim().is_empty() {
        errors.add("title", "title is required");
    }

    if !draft.slot().is_valid_range() {
        errors.add("endTime", "end time must be after start time");
    }

    match draft.kind {
        ScheduleKind::Project => {
            if draft.project_id.is_none() {
                errors.add("projectId", "a project must be selected");
            }
            if draft.content.trim().is_empty() {
                errors.add("content", "activity content is required");
            }
        }
        ScheduleKind::Inactive => {
            if draft.project_id.is_some() {
                errors.add("projectId", "inactive schedules cannot reference a project");
            }
        }
    }

    errors.into_result()
}

pub fn validate_project(draft: &ProjectDraft) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if draft.name.trim().is_empty() {
        errors.add("name", "project name is required");
    }

    if draft.start_date.is_none() {
        errors.add("startDate", "start date is required");
    }
    match (draft.start_date, draft.end_date) {
        (_, None) => errors.add("endDate", "end date is required"),
        (Some(start), Some(end)) if start > end => {
            errors.add("endDate", "end date must not be before start date")
        }
        _ => {}
    }

    if draft.monthly_required_hours == 0 {
        errors.add("monthlyRequiredHours", "monthly required hours must be positive");
    }

    errors.into_result()
}

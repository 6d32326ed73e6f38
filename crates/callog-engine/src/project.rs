//! Projects with monthly required-hour targets, and progress against them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schedule::{ProjectId, ScheduleId, ScheduleInstance, ScheduleKind};
use crate::time::{self, in_month};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// `#RRGGBB` display color.
    #[serde(default)]
    pub color: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_required_hours: u32,
}

impl Project {
    /// Whether `date` lies within the project's start/end dates, inclusive.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Project fields as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub monthly_required_hours: u32,
}

/// Projects a schedule on `date` may be logged against.
pub fn projects_active_on(projects: &[Project], date: NaiveDate) -> Vec<&Project> {
    projects.iter().filter(|p| p.is_active_on(date)).collect()
}

/// Hours logged against a project in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMonthlyStats {
    pub project_id: ProjectId,
    pub year: i32,
    pub month: u32,
    /// Rounded to one decimal place.
    pub completed_hours: f64,
    pub required_hours: f64,
    /// `completed / required * 100`, clamped to `0..=100`, two decimal places.
    pub progress_percentage: f64,
}

/// Sum the project's `PROJECT` schedules in `year`/`month` against its target.
pub fn monthly_stats(
    project: &Project,
    schedules: &[ScheduleInstance],
    year: i32,
    month: u32,
) -> ProjectMonthlyStats {
    let minutes: i64 = schedules
        .iter()
        .filter(|s| belongs_to(s, project.id) && in_month(s.date, year, month))
        .map(|s| s.duration_minutes().max(0))
        .sum();

    let completed_hours = round_to(minutes as f64 / 60.0, 1);
    let required_hours = project.monthly_required_hours as f64;
    let progress = if required_hours > 0.0 {
        (completed_hours / required_hours * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    ProjectMonthlyStats {
        project_id: project.id,
        year,
        month,
        completed_hours,
        required_hours,
        progress_percentage: round_to(progress, 2),
    }
}

/// A logged activity in a project's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectActivity {
    pub id: ScheduleId,
    pub content: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

/// The project's `limit` most recent activities, newest first.
pub fn recent_activities(
    project_id: ProjectId,
    schedules: &[ScheduleInstance],
    limit: usize,
) -> Vec<ProjectActivity> {
    let mut matching: Vec<&ScheduleInstance> = schedules
        .iter()
        .filter(|s| belongs_to(s, project_id))
        .collect();
    matching.sort_by(|a, b| (b.date, b.start_time).cmp(&(a.date, a.start_time)));

    matching
        .into_iter()
        .take(limit)
        .map(|s| ProjectActivity {
            id: s.id.clone(),
            content: s.content.clone(),
            date: time::format_date(s.date),
            start_time: time::format_time(s.start_time),
            end_time: time::format_time(s.end_time),
        })
        .collect()
}

fn belongs_to(schedule: &ScheduleInstance, project_id: ProjectId) -> bool {
    schedule.kind == ScheduleKind::Project && schedule.project_id == Some(project_id)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

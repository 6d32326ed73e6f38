//! Tests for project date ranges, monthly progress and activity history.

use callog_engine::project::{monthly_stats, projects_active_on, recent_activities, Project};
use callog_engine::schedule::{ProjectId, ScheduleId, ScheduleInstance, ScheduleKind, TimeSlot};
use chrono::NaiveDate;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn project(id: i64, start: &str, end: &str, hours: u32) -> Project {
    Project {
        id: ProjectId(id),
        name: format!("project {}", id),
        color: "#888888".to_string(),
        start_date: date(start),
        end_date: date(end),
        monthly_required_hours: hours,
    }
}

fn logged(id: &str, project: i64, day: &str, start: &str, end: &str) -> ScheduleInstance {
    ScheduleInstance::new(
        ScheduleId::new(id),
        "work",
        ScheduleKind::Project,
        TimeSlot::parse(day, start, end).unwrap(),
    )
    .with_project(ProjectId(project))
    .with_content(format!("activity {}", id))
}

fn schedules() -> Vec<ScheduleInstance> {
    vec![
        logged("a", 1, "2025-06-02", "09:00", "11:00"),
        logged("b", 1, "2025-06-15", "13:00", "14:30"),
        logged("c", 1, "2025-07-01", "09:00", "17:00"),
        logged("d", 2, "2025-06-03", "09:00", "10:00"),
        ScheduleInstance::new(
            ScheduleId::new("e"),
            "gym",
            ScheduleKind::Inactive,
            TimeSlot::parse("2025-06-04", "18:00", "19:00").unwrap(),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Active range
// ---------------------------------------------------------------------------

#[test]
fn active_range_is_inclusive() {
    let p = project(1, "2025-03-01", "2025-06-30", 10);
    assert!(p.is_active_on(date("2025-03-01")));
    assert!(p.is_active_on(date("2025-06-30")));
    assert!(!p.is_active_on(date("2025-07-01")));
}

#[test]
fn projects_active_on_filters_by_date() {
    let projects = vec![
        project(1, "2025-01-01", "2025-06-30", 10),
        project(2, "2025-06-01", "2025-12-31", 10),
        project(3, "2025-08-01", "2025-12-31", 10),
    ];

    let active: Vec<i64> = projects_active_on(&projects, date("2025-06-15"))
        .iter()
        .map(|p| p.id.0)
        .collect();
    assert_eq!(active, vec![1, 2]);
}

// ---------------------------------------------------------------------------
// Monthly stats
// ---------------------------------------------------------------------------

#[test]
fn monthly_stats_sum_only_the_project_and_month() {
    let p = project(1, "2025-01-01", "2025-12-31", 40);
    let stats = monthly_stats(&p, &schedules(), 2025, 6);

    assert_eq!(stats.completed_hours, 3.5);
    assert_eq!(stats.required_hours, 40.0);
    assert_eq!(stats.progress_percentage, 8.75);
}

#[test]
fn progress_is_clamped_at_one_hundred() {
    let p = project(1, "2025-01-01", "2025-12-31", 2);
    let stats = monthly_stats(&p, &schedules(), 2025, 6);

    assert_eq!(stats.progress_percentage, 100.0);
}

#[test]
fn zero_required_hours_gives_zero_progress() {
    let p = project(1, "2025-01-01", "2025-12-31", 0);
    let stats = monthly_stats(&p, &schedules(), 2025, 6);

    assert_eq!(stats.completed_hours, 3.5);
    assert_eq!(stats.progress_percentage, 0.0);
}

#[test]
fn completed_hours_round_to_one_decimal() {
    let p = project(9, "2025-01-01", "2025-12-31", 10);
    let twenty_minutes = vec![logged("x", 9, "2025-06-02", "09:00", "09:20")];

    let stats = monthly_stats(&p, &twenty_minutes, 2025, 6);
    assert_eq!(stats.completed_hours, 0.3);
    assert_eq!(stats.progress_percentage, 3.0);
}

#[test]
fn stats_serialize_camel_case() {
    let p = project(1, "2025-01-01", "2025-12-31", 40);
    let json = serde_json::to_value(monthly_stats(&p, &schedules(), 2025, 6)).unwrap();

    assert_eq!(json["projectId"], 1);
    assert_eq!(json["completedHours"], 3.5);
    assert_eq!(json["progressPercentage"], 8.75);
}

// ---------------------------------------------------------------------------
// Activity history
// ---------------------------------------------------------------------------

#[test]
fn recent_activities_newest_first_with_limit() {
    let activities = recent_activities(ProjectId(1), &schedules(), 2);

    let ids: Vec<&str> = activities.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "b"]);
    assert_eq!(activities[0].date, "2025-07-01");
    assert_eq!(activities[0].start_time, "09:00");
    assert_eq!(activities[1].content, "activity b");
}

#[test]
fn recent_activities_for_unknown_project_is_empty() {
    assert!(recent_activities(ProjectId(42), &schedules(), 5).is_empty());
}

//! Tests for the schedule service over the in-memory repository.

use callog_engine::conflict::BatchConflictPolicy;
use callog_engine::error::{CallogError, ConflictError};
use callog_engine::expander::{ExpansionOptions, RecurrenceRule};
use callog_engine::ids::SequentialIds;
use callog_engine::schedule::{ProjectId, ScheduleDraft, ScheduleId, ScheduleKind, TimeSlot};
use callog_engine::store::{DeleteScope, InMemoryScheduleStore, ScheduleRepository, ScheduleService};
use chrono::{NaiveDate, NaiveTime};

type Service = ScheduleService<InMemoryScheduleStore, SequentialIds>;

fn service() -> Service {
    ScheduleService::with_ids(InMemoryScheduleStore::new(), SequentialIds::new("s"))
}

fn draft(day: &str, start: &str, end: &str) -> ScheduleDraft {
    let slot = TimeSlot::parse(day, start, end).unwrap();
    ScheduleDraft {
        title: "Study".to_string(),
        kind: ScheduleKind::Project,
        project_id: Some(ProjectId(1)),
        content: "exercises".to_string(),
        date: slot.date,
        start_time: slot.start_time,
        end_time: slot.end_time,
    }
}

fn none() -> RecurrenceRule {
    RecurrenceRule::default()
}

// ---------------------------------------------------------------------------
// create
// ---------------------------------------------------------------------------

#[test]
fn one_off_create_stores_a_single_schedule() {
    let mut svc = service();
    let created = svc.create(draft("2025-06-10", "09:00", "10:00"), &none()).unwrap();

    assert_eq!(created.len(), 1);
    assert_eq!(created[0].id.as_str(), "s-1");
    assert!(created[0].recurrence_group_id.is_none());
    assert_eq!(svc.repository().len(), 1);
}

#[test]
fn overlapping_one_off_is_rejected_and_nothing_stored() {
    let mut svc = service();
    svc.create(draft("2025-06-10", "09:00", "10:00"), &none()).unwrap();

    let err = svc
        .create(draft("2025-06-10", "09:30", "10:30"), &none())
        .unwrap_err();

    match err {
        CallogError::Conflict(ConflictError::Overlap { conflicting }) => {
            assert_eq!(conflicting[0].id.as_str(), "s-1");
        }
        other => panic!("expected overlap, got {:?}", other),
    }
    assert_eq!(svc.repository().len(), 1);
}

#[test]
fn invalid_draft_fails_validation_before_conflict_check() {
    let mut svc = service();
    let mut d = draft("2025-06-10", "10:00", "09:00");
    d.title.clear();

    match svc.create(d, &none()).unwrap_err() {
        CallogError::Validation(errors) => {
            assert!(errors.contains("title"));
            assert!(errors.contains("endTime"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn recurring_create_stores_the_whole_batch() {
    let mut svc = service();
    let created = svc
        .create(draft("2025-06-10", "09:00", "10:00"), &RecurrenceRule::daily().count(4))
        .unwrap();

    assert_eq!(created.len(), 4);
    assert_eq!(svc.repository().len(), 4);
    let group = created[0].recurrence_group_id.clone().unwrap();
    assert!(created.iter().all(|s| s.recurrence_group_id.as_ref() == Some(&group)));
}

#[test]
fn one_conflicting_occurrence_rejects_the_whole_batch() {
    let mut svc = service();
    svc.create(draft("2025-06-12", "09:30", "11:00"), &none()).unwrap();

    let result = svc.create(
        draft("2025-06-10", "09:00", "10:00"),
        &RecurrenceRule::daily().count(5),
    );

    assert!(matches!(
        result,
        Err(CallogError::Conflict(ConflictError::Overlap { .. }))
    ));
    assert_eq!(svc.repository().len(), 1, "rejected batch must not be stored");
}

#[test]
fn deferred_policy_stores_conflicting_batches() {
    let mut svc = service().batch_policy(BatchConflictPolicy::DeferToBackend);
    svc.create(draft("2025-06-12", "09:30", "11:00"), &none()).unwrap();

    let created = svc
        .create(draft("2025-06-10", "09:00", "10:00"), &RecurrenceRule::daily().count(5))
        .unwrap();

    assert_eq!(created.len(), 5);
    assert_eq!(svc.repository().len(), 6);
}

#[test]
fn recurring_create_with_reused_ids_still_sees_the_overlap() {
    let stored = draft("2025-06-10", "09:00", "10:00").into_instance(ScheduleId::new("t-1"));
    let store = InMemoryScheduleStore::with_schedules(vec![stored]);
    let mut svc = ScheduleService::with_ids(store, SequentialIds::new("t"));

    let result = svc.create(
        draft("2025-06-10", "09:30", "10:30"),
        &RecurrenceRule::daily().count(3),
    );

    match result {
        Err(CallogError::Conflict(ConflictError::Overlap { conflicting })) => {
            assert_eq!(conflicting[0].id.as_str(), "t-1");
        }
        other => panic!("expected overlap, got {:?}", other),
    }
    assert_eq!(svc.repository().len(), 1);
}

#[test]
fn recurring_create_rejects_ids_already_stored() {
    let stored = draft("2025-05-01", "09:00", "10:00").into_instance(ScheduleId::new("t-2"));
    let store = InMemoryScheduleStore::with_schedules(vec![stored]);
    let mut svc = ScheduleService::with_ids(store, SequentialIds::new("t"));

    let result = svc.create(
        draft("2025-06-10", "09:00", "10:00"),
        &RecurrenceRule::daily().count(3),
    );

    match result {
        Err(CallogError::DuplicateId(id)) => assert_eq!(id.as_str(), "t-2"),
        other => panic!("expected duplicate id, got {:?}", other),
    }
    assert_eq!(svc.repository().len(), 1, "nothing from the batch is stored");
    let kept = svc.repository().get(&ScheduleId::new("t-2")).unwrap();
    assert_eq!(kept.date, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
}

#[test]
fn one_off_create_rejects_an_id_already_stored() {
    let stored = draft("2025-05-01", "09:00", "10:00").into_instance(ScheduleId::new("t-1"));
    let store = InMemoryScheduleStore::with_schedules(vec![stored]);
    let mut svc = ScheduleService::with_ids(store, SequentialIds::new("t"));

    let result = svc.create(draft("2025-06-10", "09:00", "10:00"), &none());

    assert!(matches!(result, Err(CallogError::DuplicateId(_))));
    assert_eq!(svc.repository().len(), 1);
}

#[test]
fn degenerate_rule_creates_a_one_off() {
    let mut svc = service();
    let rule = RecurrenceRule {
        enabled: true,
        ..RecurrenceRule::default()
    };

    let created = svc.create(draft("2025-06-10", "09:00", "10:00"), &rule).unwrap();
    assert_eq!(created.len(), 1);
    assert!(created[0].recurrence_group_id.is_none());
}

#[test]
fn expansion_options_bound_never_ending_rules() {
    let mut svc = service().expansion_options(ExpansionOptions::with_safety_cap(3));
    let created = svc
        .create(draft("2025-06-10", "09:00", "10:00"), &RecurrenceRule::weekly())
        .unwrap();

    assert_eq!(created.len(), 3);
}

// ---------------------------------------------------------------------------
// update
// ---------------------------------------------------------------------------

#[test]
fn update_can_move_within_its_own_slot() {
    let mut svc = service();
    let id = svc.create(draft("2025-06-10", "09:00", "10:00"), &none()).unwrap()[0]
        .id
        .clone();

    let updated = svc.update(&id, &draft("2025-06-10", "09:30", "10:30")).unwrap();

    assert_eq!(updated.id, id);
    assert_eq!(updated.start_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    assert_eq!(svc.repository().get(&id).unwrap(), updated);
}

#[test]
fn update_into_another_schedule_is_rejected() {
    let mut svc = service();
    svc.create(draft("2025-06-10", "09:00", "10:00"), &none()).unwrap();
    let second = svc.create(draft("2025-06-10", "11:00", "12:00"), &none()).unwrap()[0]
        .id
        .clone();

    let result = svc.update(&second, &draft("2025-06-10", "09:45", "10:45"));
    assert!(matches!(result, Err(CallogError::Conflict(_))));
}

#[test]
fn updating_one_occurrence_keeps_its_group_and_siblings() {
    let mut svc = service();
    let batch = svc
        .create(draft("2025-06-10", "09:00", "10:00"), &RecurrenceRule::daily().count(3))
        .unwrap();
    let target = batch[1].id.clone();

    let updated = svc.update(&target, &draft("2025-06-11", "14:00", "15:00")).unwrap();

    assert_eq!(updated.recurrence_group_id, batch[1].recurrence_group_id);
    assert_eq!(svc.repository().len(), 3);
    assert_eq!(svc.repository().get(&batch[2].id).unwrap(), batch[2]);
}

#[test]
fn update_of_unknown_id_is_not_found() {
    let mut svc = service();
    let result = svc.update(&ScheduleId::new("nope"), &draft("2025-06-10", "09:00", "10:00"));
    assert!(matches!(result, Err(CallogError::NotFound(_))));
}

// ---------------------------------------------------------------------------
// delete
// ---------------------------------------------------------------------------

#[test]
fn delete_single_occurrence_leaves_the_rest() {
    let mut svc = service();
    let batch = svc
        .create(draft("2025-06-10", "09:00", "10:00"), &RecurrenceRule::daily().count(3))
        .unwrap();

    let removed = svc.delete(&batch[1].id, DeleteScope::Single).unwrap();

    assert_eq!(removed.len(), 1);
    assert_eq!(svc.repository().len(), 2);
}

#[test]
fn delete_all_recurrences_removes_the_group_only() {
    let mut svc = service();
    svc.create(draft("2025-06-20", "09:00", "10:00"), &none()).unwrap();
    let batch = svc
        .create(draft("2025-06-10", "09:00", "10:00"), &RecurrenceRule::daily().count(3))
        .unwrap();

    let removed = svc.delete(&batch[2].id, DeleteScope::AllRecurrences).unwrap();

    assert_eq!(removed.len(), 3);
    assert_eq!(svc.repository().len(), 1);
}

#[test]
fn delete_all_on_a_one_off_removes_just_it() {
    let mut svc = service();
    let id = svc.create(draft("2025-06-10", "09:00", "10:00"), &none()).unwrap()[0]
        .id
        .clone();

    let removed = svc.delete(&id, DeleteScope::AllRecurrences).unwrap();
    assert_eq!(removed.len(), 1);
    assert!(svc.repository().is_empty());
}

#[test]
fn delete_unknown_id_is_not_found() {
    let mut svc = service();
    let result = svc.delete(&ScheduleId::new("ghost"), DeleteScope::Single);
    assert!(matches!(result, Err(CallogError::NotFound(_))));
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[test]
fn monthly_and_daily_views_are_sorted() {
    let mut svc = service();
    svc.create(draft("2025-06-20", "13:00", "14:00"), &none()).unwrap();
    svc.create(draft("2025-06-05", "15:00", "16:00"), &none()).unwrap();
    svc.create(draft("2025-06-05", "08:00", "09:00"), &none()).unwrap();
    svc.create(draft("2025-07-01", "08:00", "09:00"), &none()).unwrap();

    let june: Vec<String> = svc
        .monthly(2025, 6)
        .iter()
        .map(|s| format!("{} {}", s.date, s.start_time.format("%H:%M")))
        .collect();
    assert_eq!(june, vec!["2025-06-05 08:00", "2025-06-05 15:00", "2025-06-20 13:00"]);

    let day = NaiveDate::from_ymd_opt(2025, 6, 5).unwrap();
    assert_eq!(svc.on_date(day).len(), 2);
}

#[test]
fn for_project_filters_by_reference() {
    let mut svc = service();
    svc.create(draft("2025-06-10", "09:00", "10:00"), &none()).unwrap();
    let mut other = draft("2025-06-11", "09:00", "10:00");
    other.project_id = Some(ProjectId(2));
    svc.create(other, &none()).unwrap();

    assert_eq!(svc.for_project(ProjectId(2)).len(), 1);
    assert_eq!(svc.for_project(ProjectId(3)).len(), 0);
}

#[test]
fn check_uses_the_stored_schedules() {
    let mut svc = service();
    let id = svc.create(draft("2025-06-10", "09:00", "10:00"), &none()).unwrap()[0]
        .id
        .clone();
    let slot = TimeSlot::parse("2025-06-10", "09:30", "10:30").unwrap();

    assert!(svc.check(&slot, None).has_conflict);
    assert!(!svc.check(&slot, Some(&id)).has_conflict);
}

#[test]
fn repository_replace_of_missing_schedule_fails() {
    let mut store = InMemoryScheduleStore::new();
    let ghost = draft("2025-06-10", "09:00", "10:00").into_instance(ScheduleId::new("ghost"));
    assert!(matches!(store.replace(ghost), Err(CallogError::NotFound(_))));
}

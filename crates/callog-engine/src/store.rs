//! Schedule storage seam and the create/update/delete flow built on it.
//!
//! [`ScheduleRepository`] stands in for the persistence backend. The service
//! runs validation, conflict detection and recurrence expansion before
//! anything reaches the repository, and commits a recurrence batch all at
//! once or not at all.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::conflict::{check_batch, detect_conflict, BatchConflictPolicy, ConflictResult};
use crate::error::{CallogError, ConflictError, Result};
use crate::expander::{expand_with_options, ExpansionOptions, RecurrenceRule};
use crate::ids::{IdSource, UuidIds};
use crate::schedule::{
    ProjectId, RecurrenceGroupId, ScheduleDraft, ScheduleId, ScheduleInstance, TimeSlot,
};
use crate::time::in_month;
use crate::validation::validate_schedule;

/// How much of a recurring series a delete removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeleteScope {
    /// Only the addressed schedule.
    #[default]
    Single,
    /// Every schedule sharing the addressed schedule's recurrence group.
    AllRecurrences,
}

pub trait ScheduleRepository {
    fn all(&self) -> Vec<ScheduleInstance>;

    fn get(&self, id: &ScheduleId) -> Option<ScheduleInstance>;

    fn insert_all(&mut self, instances: Vec<ScheduleInstance>);

    /// Overwrite the stored schedule with the same id.
    fn replace(&mut self, instance: ScheduleInstance) -> Result<()>;

    fn remove(&mut self, id: &ScheduleId) -> Option<ScheduleInstance>;

    /// Remove every schedule in `group`, returning them in storage order.
    fn remove_group(&mut self, group: &RecurrenceGroupId) -> Vec<ScheduleInstance>;
}

/// Vector-backed repository for local mirroring and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScheduleStore {
    schedules: Vec<ScheduleInstance>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedules(schedules: Vec<ScheduleInstance>) -> Self {
        Self { schedules }
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}

impl ScheduleRepository for InMemoryScheduleStore {
    fn all(&self) -> Vec<ScheduleInstance> {
        self.schedules.clone()
    }

    fn get(&self, id: &ScheduleId) -> Option<ScheduleInstance> {
        self.schedules.iter().find(|s| &s.id == id).cloned()
    }

    fn insert_all(&mut self, instances: Vec<ScheduleInstance>) {
        self.schedules.extend(instances);
    }

    fn replace(&mut self, instance: ScheduleInstance) -> Result<()> {
        let slot = self
            .schedules
            .iter_mut()
            .find(|s| s.id == instance.id)
            .ok_or_else(|| CallogError::NotFound(instance.id.clone()))?;
        *slot = instance;
        Ok(())
    }

    fn remove(&mut self, id: &ScheduleId) -> Option<ScheduleInstance> {
        let index = self.schedules.iter().position(|s| &s.id == id)?;
        Some(self.schedules.remove(index))
    }

    fn remove_group(&mut self, group: &RecurrenceGroupId) -> Vec<ScheduleInstance> {
        let (removed, kept) = std::mem::take(&mut self.schedules)
            .into_iter()
            .partition(|s| s.recurrence_group_id.as_ref() == Some(group));
        self.schedules = kept;
        removed
    }
}

/// Schedule operations over an injected repository and id source.
#[derive(Debug)]
pub struct ScheduleService<R, I = UuidIds> {
    repo: R,
    ids: I,
    options: ExpansionOptions,
    policy: BatchConflictPolicy,
}

impl<R: ScheduleRepository> ScheduleService<R, UuidIds> {
    pub fn new(repo: R) -> Self {
        Self::with_ids(repo, UuidIds)
    }
}

impl<R: ScheduleRepository, I: IdSource> ScheduleService<R, I> {
    pub fn with_ids(repo: R, ids: I) -> Self {
        Self {
            repo,
            ids,
            options: ExpansionOptions::default(),
            policy: BatchConflictPolicy::default(),
        }
    }

    pub fn expansion_options(mut self, options: ExpansionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn batch_policy(mut self, policy: BatchConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Check a slot against everything stored, optionally skipping one id.
    pub fn check(&self, slot: &TimeSlot, exclude_id: Option<&ScheduleId>) -> ConflictResult {
        detect_conflict(slot, &self.repo.all(), exclude_id)
    }

    /// Create a schedule, expanding `rule` when it is enabled.
    ///
    /// One-off schedules must not overlap anything stored. Recurring batches
    /// are checked according to the configured [`BatchConflictPolicy`]; a
    /// single conflicting instance rejects the whole batch. Ids handed out by
    /// the id source must not already be stored. Returns the stored
    /// instances, base first.
    pub fn create(
        &mut self,
        draft: ScheduleDraft,
        rule: &RecurrenceRule,
    ) -> Result<Vec<ScheduleInstance>> {
        validate_schedule(&draft).map_err(CallogError::Validation)?;

        let existing = self.repo.all();
        let base = draft.into_instance(self.ids.schedule_id());

        if rule.is_degenerate() {
            warn!(id = %base.id, "recurrence enabled without a frequency, creating a single schedule");
        }

        if rule.effective_frequency().is_none() {
            detect_conflict(&base.slot(), &existing, None).into_result()?;
            ensure_unused_ids(std::slice::from_ref(&base), &existing)?;
            debug!(id = %base.id, date = %base.date, "created schedule");
            self.repo.insert_all(vec![base.clone()]);
            return Ok(vec![base]);
        }

        let batch = expand_with_options(&base, rule, &self.options, &mut self.ids);
        let rejected = check_batch(&batch, &existing, self.policy);
        if !rejected.is_empty() {
            warn!(
                instances = batch.len(),
                rejected = rejected.len(),
                "recurrence batch rejected"
            );
            let conflicting = rejected
                .into_iter()
                .flat_map(|r| r.result.conflicting_instances)
                .collect();
            return Err(ConflictError::Overlap { conflicting }.into());
        }

        ensure_unused_ids(&batch, &existing)?;

        debug!(id = %base.id, instances = batch.len(), "created recurring schedule");
        self.repo.insert_all(batch.clone());
        Ok(batch)
    }

    /// Edit one schedule in place. The edited slot is checked against every
    /// other schedule; a recurring instance keeps its group and siblings.
    pub fn update(&mut self, id: &ScheduleId, draft: &ScheduleDraft) -> Result<ScheduleInstance> {
        validate_schedule(draft).map_err(CallogError::Validation)?;

        let mut current = self
            .repo
            .get(id)
            .ok_or_else(|| CallogError::NotFound(id.clone()))?;

        detect_conflict(&draft.slot(), &self.repo.all(), Some(id)).into_result()?;

        draft.apply_to(&mut current);
        self.repo.replace(current.clone())?;
        debug!(id = %id, "updated schedule");
        Ok(current)
    }

    /// Delete a schedule, or its whole recurrence group. Returns what was
    /// removed. `AllRecurrences` on a one-off schedule removes just that one.
    pub fn delete(&mut self, id: &ScheduleId, scope: DeleteScope) -> Result<Vec<ScheduleInstance>> {
        let target = self
            .repo
            .get(id)
            .ok_or_else(|| CallogError::NotFound(id.clone()))?;

        let removed = match (scope, target.recurrence_group_id) {
            (DeleteScope::AllRecurrences, Some(group)) => self.repo.remove_group(&group),
            _ => self.repo.remove(id).into_iter().collect(),
        };

        debug!(id = %id, removed = removed.len(), ?scope, "deleted schedule");
        Ok(removed)
    }

    /// Schedules in the given month, ordered by date then start time.
    pub fn monthly(&self, year: i32, month: u32) -> Vec<ScheduleInstance> {
        self.sorted(|s| in_month(s.date, year, month))
    }

    pub fn on_date(&self, date: NaiveDate) -> Vec<ScheduleInstance> {
        self.sorted(|s| s.date == date)
    }

    pub fn for_project(&self, project_id: ProjectId) -> Vec<ScheduleInstance> {
        self.sorted(|s| s.project_id == Some(project_id))
    }

    fn sorted(&self, keep: impl Fn(&ScheduleInstance) -> bool) -> Vec<ScheduleInstance> {
        let mut schedules: Vec<ScheduleInstance> =
            self.repo.all().into_iter().filter(|s| keep(s)).collect();
        schedules.sort_by_key(|s| (s.date, s.start_time));
        schedules
    }
}

/// Fails with [`CallogError::DuplicateId`] on the first new id that is
/// already stored or repeated within `new`.
fn ensure_unused_ids(new: &[ScheduleInstance], existing: &[ScheduleInstance]) -> Result<()> {
    let mut seen: HashSet<&ScheduleId> = existing.iter().map(|s| &s.id).collect();
    for instance in new {
        if !seen.insert(&instance.id) {
            warn!(id = %instance.id, "generated schedule id is already in use");
            return Err(CallogError::DuplicateId(instance.id.clone()));
        }
    }
    Ok(())
}

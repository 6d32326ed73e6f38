//! Recurrence expansion -- turns a base schedule plus a recurrence rule into a
//! bounded, chronological list of concrete schedule instances.
//!
//! The base schedule is always occurrence #1. Every instance of one expansion
//! shares a freshly generated recurrence group id. Expansion never produces
//! more than [`MAX_OCCURRENCES`] instances.

use std::collections::{BTreeSet, VecDeque};

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ids::IdSource;
use crate::schedule::ScheduleInstance;
use crate::time::weekday_from_index;

/// Hard upper bound on the number of instances one rule can produce.
pub const MAX_OCCURRENCES: u32 = 100;

/// Instances produced for `never` / `onDate` rules when nothing else is set.
pub const DEFAULT_SAFETY_CAP: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// Parse `daily` / `weekly` / `monthly`, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

/// When a recurrence stops producing instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Termination {
    /// Bounded only by the configured safety cap.
    #[default]
    Never,
    /// No instance dated after `end_date` (inclusive bound).
    OnDate {
        #[serde(rename = "endDate")]
        end_date: NaiveDate,
    },
    /// Exactly `count` instances in total, base included, capped at
    /// [`MAX_OCCURRENCES`].
    AfterCount { count: u32 },
}

fn default_interval() -> u32 {
    1
}

/// A recurrence request attached to a schedule at creation time.
///
/// `weekdays` holds `0 = Sunday .. 6 = Saturday` indices and only matters for
/// weekly rules. Empty means "the base date's weekday".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub weekdays: BTreeSet<u8>,
    #[serde(default)]
    pub termination: Termination,
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self {
            enabled: false,
            frequency: None,
            interval: 1,
            weekdays: BTreeSet::new(),
            termination: Termination::Never,
        }
    }
}

impl RecurrenceRule {
    /// An enabled rule with the given frequency, interval 1, never ending.
    pub fn new(frequency: Frequency) -> Self {
        Self {
            enabled: true,
            frequency: Some(frequency),
            ..Self::default()
        }
    }

    pub fn daily() -> Self {
        Self::new(Frequency::Daily)
    }

    pub fn weekly() -> Self {
        Self::new(Frequency::Weekly)
    }

    pub fn monthly() -> Self {
        Self::new(Frequency::Monthly)
    }

    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn on_weekdays(mut self, weekdays: impl IntoIterator<Item = u8>) -> Self {
        self.weekdays = weekdays.into_iter().collect();
        self
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.termination = Termination::OnDate { end_date };
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.termination = Termination::AfterCount { count };
        self
    }

    /// The frequency to expand with, or `None` when the rule is a no-op.
    pub fn effective_frequency(&self) -> Option<Frequency> {
        if self.enabled {
            self.frequency
        } else {
            None
        }
    }

    /// Enabled but missing a frequency. Treated as "no recurrence".
    pub fn is_degenerate(&self) -> bool {
        self.enabled && self.frequency.is_none()
    }

    /// Total number of instances (base included) this rule may produce.
    pub fn occurrence_cap(&self, options: &ExpansionOptions) -> u32 {
        match self.termination {
            Termination::AfterCount { count } => count.clamp(1, MAX_OCCURRENCES),
            Termination::Never | Termination::OnDate { .. } => options.effective_safety_cap(),
        }
    }
}

/// Tunables for expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionOptions {
    /// Instance cap for rules without an explicit count.
    pub safety_cap: u32,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        Self {
            safety_cap: DEFAULT_SAFETY_CAP,
        }
    }
}

impl ExpansionOptions {
    pub fn with_safety_cap(safety_cap: u32) -> Self {
        Self { safety_cap }
    }

    /// The safety cap clamped to `1..=MAX_OCCURRENCES`.
    pub fn effective_safety_cap(&self) -> u32 {
        self.safety_cap.clamp(1, MAX_OCCURRENCES)
    }
}

/// Expand `base` according to `rule` using the default [`ExpansionOptions`].
///
/// See [`expand_with_options`].
pub fn expand<I: IdSource>(
    base: &ScheduleInstance,
    rule: &RecurrenceRule,
    ids: &mut I,
) -> Vec<ScheduleInstance> {
    expand_with_options(base, rule, &ExpansionOptions::default(), ids)
}

/// Expand `base` according to `rule`.
///
/// A disabled rule, or one without a frequency, yields `[base]` unchanged and
/// consumes no ids. Otherwise the base keeps its id, every generated instance
/// gets a fresh id from `ids`, and all of them share one new recurrence group
/// id. The result is in chronological order.
pub fn expand_with_options<I: IdSource>(
    base: &ScheduleInstance,
    rule: &RecurrenceRule,
    options: &ExpansionOptions,
    ids: &mut I,
) -> Vec<ScheduleInstance> {
    if rule.effective_frequency().is_none() {
        return vec![base.clone()];
    }

    let dates = occurrence_dates(base.date, rule, options);
    let group = ids.group_id();

    let mut instances = Vec::with_capacity(dates.len());
    for (i, date) in dates.into_iter().enumerate() {
        let mut instance = base.clone();
        if i > 0 {
            instance.id = ids.schedule_id();
            instance.date = date;
        }
        instance.recurrence_group_id = Some(group.clone());
        instances.push(instance);
    }

    debug!(
        group = %group,
        frequency = ?rule.frequency,
        instances = instances.len(),
        "expanded recurrence"
    );

    instances
}

/// The dates a rule produces starting at `base_date`, base date first.
///
/// Returns just `[base_date]` for a disabled or degenerate rule.
pub fn occurrence_dates(
    base_date: NaiveDate,
    rule: &RecurrenceRule,
    options: &ExpansionOptions,
) -> Vec<NaiveDate> {
    let Some(frequency) = rule.effective_frequency() else {
        return vec![base_date];
    };

    let cap = rule.occurrence_cap(options) as usize;
    let mut dates = vec![base_date];
    let mut candidates = Candidates::new(base_date, frequency, rule);

    while dates.len() < cap {
        let Some(date) = candidates.next() else {
            break;
        };
        if let Termination::OnDate { end_date } = rule.termination {
            if date > end_date {
                break;
            }
        }
        dates.push(date);
    }

    dates
}

/// Lazily yields candidate dates strictly after the base date.
struct Candidates {
    base: NaiveDate,
    frequency: Frequency,
    interval: u32,
    weekdays: Vec<Weekday>,
    step: u32,
    pending: VecDeque<NaiveDate>,
}

impl Candidates {
    fn new(base: NaiveDate, frequency: Frequency, rule: &RecurrenceRule) -> Self {
        Self {
            base,
            frequency,
            interval: rule.interval.max(1),
            weekdays: effective_weekdays(base, &rule.weekdays),
            step: 0,
            pending: VecDeque::new(),
        }
    }

    fn plus_days(&self, days: u64) -> Option<NaiveDate> {
        self.base.checked_add_days(Days::new(days))
    }
}

impl Iterator for Candidates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if let Some(date) = self.pending.pop_front() {
            return Some(date);
        }

        self.step = self.step.checked_add(1)?;
        let offset = (self.step as u64).checked_mul(self.interval as u64)?;

        match self.frequency {
            Frequency::Daily => self.plus_days(offset),
            Frequency::Monthly => {
                // Counted from the base so Jan 31 -> Feb 28 -> Mar 31.
                let months = u32::try_from(offset).ok()?;
                self.base.checked_add_months(Months::new(months))
            }
            Frequency::Weekly => {
                // Each step opens a seven-day window at the week anchor; the
                // matching weekdays inside it are the step's occurrences.
                let anchor = self.plus_days(offset.checked_mul(7)?)?;
                for day in anchor.iter_days().take(7) {
                    if self.weekdays.contains(&day.weekday()) {
                        self.pending.push_back(day);
                    }
                }
                self.pending.pop_front()
            }
        }
    }
}

/// Valid weekdays from the rule, or the base date's weekday when none remain.
fn effective_weekdays(base: NaiveDate, indices: &BTreeSet<u8>) -> Vec<Weekday> {
    let weekdays: Vec<Weekday> = indices
        .iter()
        .filter_map(|&i| weekday_from_index(i))
        .collect();

    if weekdays.is_empty() {
        if !indices.is_empty() {
            debug!(?indices, "no valid weekday in rule, using base weekday");
        }
        return vec![base.weekday()];
    }
    weekdays
}

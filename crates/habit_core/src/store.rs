use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::calendar::{date_key, ViewMode};
use crate::error::{Result, TrackerError};
use crate::habit::{Habit, HabitFields, HabitId, MAX_HABITS};

/// Per-habit check marks keyed by `YYYY-MM-DD`. Only `true` is meaningful.
pub type CheckMap = BTreeMap<String, bool>;
pub type Checks = BTreeMap<HabitId, CheckMap>;

/// In-memory habit collection and its check marks. Habits keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitStore {
    habits: Vec<Habit>,
    checks: Checks,
}

impl HabitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from persisted parts, repairing anything that breaks the
    /// store invariants. Returns the store and how many repairs were made.
    pub fn from_parts(habits: Vec<Habit>, checks: Checks) -> (Self, usize) {
        let mut repairs = 0;
        let mut kept: Vec<Habit> = Vec::with_capacity(habits.len().min(MAX_HABITS));
        for mut habit in habits {
            if kept.iter().any(|existing| existing.id == habit.id) {
                warn!(id = %habit.id, "dropping duplicate habit id from snapshot");
                repairs += 1;
                continue;
            }
            if kept.len() >= MAX_HABITS {
                warn!(id = %habit.id, max = MAX_HABITS, "dropping habit beyond capacity");
                repairs += 1;
                continue;
            }
            if habit.repair() {
                warn!(id = %habit.id, "repaired habit fields from snapshot");
                repairs += 1;
            }
            kept.push(habit);
        }

        let mut store = Self {
            habits: kept,
            checks: BTreeMap::new(),
        };
        for (id, marks) in checks {
            if !store.contains(&id) {
                warn!(%id, entries = marks.len(), "dropping check marks for unknown habit");
                repairs += 1;
                continue;
            }
            let marks: CheckMap = marks.into_iter().filter(|(_, done)| *done).collect();
            if !marks.is_empty() {
                store.checks.insert(id, marks);
            }
        }
        (store, repairs)
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn checks(&self) -> &Checks {
        &self.checks
    }

    pub fn get(&self, id: &HabitId) -> Option<&Habit> {
        self.habits.iter().find(|habit| &habit.id == id)
    }

    pub fn contains(&self, id: &HabitId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.habits.len() >= MAX_HABITS
    }

    pub fn ensure_capacity(&self) -> Result<()> {
        if self.is_full() {
            return Err(TrackerError::CapacityExceeded { max: MAX_HABITS });
        }
        Ok(())
    }

    /// Appends a habit under a freshly generated id.
    pub fn add_habit(&mut self, fields: HabitFields) -> Result<HabitId> {
        self.add_habit_with_id(HabitId::generate(), fields)
    }

    /// Appends a habit under `id`, typically the id reserved by a draft. An id
    /// already in use is never reused; a new one is generated instead.
    pub fn add_habit_with_id(&mut self, id: HabitId, fields: HabitFields) -> Result<HabitId> {
        self.ensure_capacity()?;
        let id = if self.contains(&id) || self.checks.contains_key(&id) {
            HabitId::generate()
        } else {
            id
        };
        self.habits.push(Habit::new(id.clone(), fields));
        Ok(id)
    }

    /// Replaces the mutable fields in place. Returns false if `id` is unknown.
    pub fn update_habit(&mut self, id: &HabitId, fields: HabitFields) -> bool {
        match self.habits.iter_mut().find(|habit| &habit.id == id) {
            Some(habit) => {
                habit.apply(fields);
                true
            }
            None => {
                debug!(%id, "ignoring update for unknown habit");
                false
            }
        }
    }

    /// Removes the habit together with its whole check history.
    pub fn remove_habit(&mut self, id: &HabitId) -> Option<Habit> {
        let idx = self.habits.iter().position(|habit| &habit.id == id)?;
        let habit = self.habits.remove(idx);
        self.checks.remove(id);
        Some(habit)
    }

    /// Flips the mark for `(id, day)` and returns the new value.
    pub fn toggle_check(&mut self, mode: ViewMode, id: &HabitId, day: NaiveDate) -> Result<bool> {
        if !mode.allows_toggle() {
            return Err(TrackerError::InvalidMutation { mode });
        }
        if !self.contains(id) {
            return Err(TrackerError::UnknownHabit(id.clone()));
        }
        let key = date_key(day);
        let marks = self.checks.entry(id.clone()).or_default();
        let done = !marks.get(&key).copied().unwrap_or(false);
        if done {
            marks.insert(key, true);
        } else {
            marks.remove(&key);
            if marks.is_empty() {
                self.checks.remove(id);
            }
        }
        Ok(done)
    }

    pub fn is_checked(&self, id: &HabitId, day: NaiveDate) -> bool {
        self.checks
            .get(id)
            .and_then(|marks| marks.get(&date_key(day)))
            .copied()
            .unwrap_or(false)
    }

    pub fn check_count(&self, id: &HabitId) -> usize {
        self.checks
            .get(id)
            .map(|marks| marks.values().filter(|done| **done).count())
            .unwrap_or(0)
    }
}

use chrono::NaiveDate;

use crate::calendar::week_days;
use crate::habit::{Habit, HabitId};
use crate::store::HabitStore;

/// Number of `dates` on which `habit_id` is checked.
pub fn count_for_date_set(store: &HabitStore, habit_id: &HabitId, dates: &[NaiveDate]) -> usize {
    if !store.checks().contains_key(habit_id) {
        return 0;
    }
    dates
        .iter()
        .filter(|day| store.is_checked(habit_id, **day))
        .count()
}

/// Completions over the Monday-first week containing `cursor`.
pub fn count_for_week(store: &HabitStore, habit_id: &HabitId, cursor: NaiveDate) -> usize {
    count_for_date_set(store, habit_id, &week_days(cursor))
}

pub fn goal_met(store: &HabitStore, habit: &Habit, week: &[NaiveDate]) -> bool {
    habit.goal > 0 && count_for_date_set(store, &habit.id, week) >= habit.goal as usize
}

/// True when every habit reached its goal over `week`. An empty collection
/// never qualifies.
pub fn all_goals_met(store: &HabitStore, week: &[NaiveDate]) -> bool {
    !store.is_empty() && store.habits().iter().all(|habit| goal_met(store, habit, week))
}

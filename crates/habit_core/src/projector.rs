use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::aggregate::count_for_date_set;
use crate::calendar::{date_key, is_same_month, week_days, ViewMode, ViewState};
use crate::habit::{Habit, HabitId, MAX_HABITS};
use crate::store::HabitStore;

/// Dots drawn per month cell before the remainder collapses into a counter.
/// Matches `MAX_HABITS`, so a store within capacity never overflows.
pub const MAX_DOTS: usize = 12;

/// Read-only structure handed to the rendering layer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CalendarView {
    pub mode: ViewMode,
    pub cursor: NaiveDate,
    pub label: String,
    /// Whether check marks can be toggled from this view.
    pub editable: bool,
    pub is_empty: bool,
    pub can_add_habit: bool,
    pub days: Vec<DayHeader>,
    pub rows: Vec<HabitRow>,
    /// Populated in month mode only.
    pub month_cells: Vec<MonthCell>,
    /// Populated in month mode only.
    pub legend: Vec<LegendEntry>,
    pub milestone_visible: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DayHeader {
    pub date: NaiveDate,
    pub key: String,
    pub weekday: String,
    pub day_of_month: u32,
    pub is_today: bool,
    pub in_month: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HabitRow {
    pub id: HabitId,
    pub name: String,
    pub tint: String,
    pub goal: u32,
    pub week_count: usize,
    /// `count/goal` over the cursor's week.
    pub progress: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Cell {
    pub date: NaiveDate,
    pub done: bool,
    pub tint: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthCell {
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub in_month: bool,
    pub is_today: bool,
    pub dots: Vec<Dot>,
    pub overflow: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Dot {
    pub habit_id: HabitId,
    pub done: bool,
    pub tint: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LegendEntry {
    pub habit_id: HabitId,
    pub name: String,
    pub tint: String,
}

pub fn project(
    store: &HabitStore,
    view: &ViewState,
    today: NaiveDate,
    milestone_visible: bool,
) -> CalendarView {
    let days = view.days();
    let week = view.anchored_week();

    let headers = days
        .iter()
        .map(|day| DayHeader {
            date: *day,
            key: date_key(*day),
            weekday: weekday_label(*day, view.mode),
            day_of_month: day.day(),
            is_today: *day == today,
            in_month: is_same_month(*day, view.cursor),
        })
        .collect();

    let rows = store
        .habits()
        .iter()
        .map(|habit| habit_row(store, habit, &days, &week))
        .collect();

    let (month_cells, legend) = if view.mode == ViewMode::Month {
        (
            month_cells(store, &days, view.cursor, today, MAX_DOTS),
            legend(store.habits()),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    CalendarView {
        mode: view.mode,
        cursor: view.cursor,
        label: period_label(view.mode, view.cursor),
        editable: view.mode.allows_toggle(),
        is_empty: store.is_empty(),
        can_add_habit: store.len() < MAX_HABITS,
        days: headers,
        rows,
        month_cells,
        legend,
        milestone_visible,
    }
}

/// Header text for the current period.
pub fn period_label(mode: ViewMode, cursor: NaiveDate) -> String {
    match mode {
        ViewMode::Day => cursor.format("%a, %-d %B %Y").to_string(),
        ViewMode::Week => {
            let week = week_days(cursor);
            let (first, last) = (week[0], week[week.len() - 1]);
            if first.month() != last.month() {
                format!("{} – {}", first.format("%b"), last.format("%b %Y"))
            } else {
                first.format("%B %Y").to_string()
            }
        }
        ViewMode::Month => cursor.format("%B %Y").to_string(),
    }
}

fn weekday_label(day: NaiveDate, mode: ViewMode) -> String {
    match mode {
        ViewMode::Day => day.format("%A").to_string(),
        _ => day.format("%a").to_string(),
    }
}

fn habit_row(store: &HabitStore, habit: &Habit, days: &[NaiveDate], week: &[NaiveDate]) -> HabitRow {
    let tint = habit.tint().to_string();
    let week_count = count_for_date_set(store, &habit.id, week);
    let cells = days
        .iter()
        .map(|day| Cell {
            date: *day,
            done: store.is_checked(&habit.id, *day),
            tint: tint.clone(),
        })
        .collect();
    HabitRow {
        id: habit.id.clone(),
        name: habit.name.clone(),
        tint,
        goal: habit.goal,
        week_count,
        progress: format!("{}/{}", week_count, habit.goal),
        cells,
    }
}

fn month_cells(
    store: &HabitStore,
    days: &[NaiveDate],
    cursor: NaiveDate,
    today: NaiveDate,
    max_dots: usize,
) -> Vec<MonthCell> {
    let habits = store.habits();
    let overflow = habits.len().saturating_sub(max_dots);
    days.iter()
        .map(|day| MonthCell {
            date: *day,
            day_of_month: day.day(),
            in_month: is_same_month(*day, cursor),
            is_today: *day == today,
            dots: habits
                .iter()
                .take(max_dots)
                .map(|habit| Dot {
                    habit_id: habit.id.clone(),
                    done: store.is_checked(&habit.id, *day),
                    tint: habit.tint().to_string(),
                })
                .collect(),
            overflow,
        })
        .collect()
}

fn legend(habits: &[Habit]) -> Vec<LegendEntry> {
    habits
        .iter()
        .map(|habit| LegendEntry {
            habit_id: habit.id.clone(),
            name: habit.name.clone(),
            tint: habit.tint().to_string(),
        })
        .collect()
}

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cells in the Monday-first month grid (six full weeks).
pub const MONTH_GRID_LEN: usize = 42;
pub const WEEK_LEN: usize = 7;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Day,
    #[default]
    Week,
    Month,
}

impl ViewMode {
    /// Check marks may only be toggled from the day and week views.
    pub fn allows_toggle(self) -> bool {
        !matches!(self, ViewMode::Month)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Day => "day",
            ViewMode::Week => "week",
            ViewMode::Month => "month",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown view mode `{0}` (expected day, week or month)")]
pub struct UnknownViewMode(pub String);

impl FromStr for ViewMode {
    type Err = UnknownViewMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "d" => Ok(ViewMode::Day),
            "week" | "w" => Ok(ViewMode::Week),
            "month" | "m" => Ok(ViewMode::Month),
            _ => Err(UnknownViewMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    fn sign(self) -> i32 {
        match self {
            Direction::Previous => -1,
            Direction::Next => 1,
        }
    }
}

/// Transient navigation state: what is shown and where it is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub mode: ViewMode,
    pub cursor: NaiveDate,
}

impl ViewState {
    pub fn new(mode: ViewMode, cursor: NaiveDate) -> Self {
        Self { mode, cursor }
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        days_for(self.mode, self.cursor)
    }

    /// The seven days of the week anchored by the cursor, whatever the mode.
    pub fn anchored_week(&self) -> Vec<NaiveDate> {
        week_days(self.cursor)
    }

    pub fn week_id(&self) -> WeekId {
        WeekId::containing(self.cursor)
    }

    pub fn shift(&mut self, direction: Direction) {
        self.cursor = shift_cursor(self.cursor, self.mode, direction);
    }

    pub fn shift_by(&mut self, steps: i32) {
        self.cursor = shift_cursor_by(self.cursor, self.mode, steps);
    }
}

/// Identifier of a calendar week, formatted from its Monday as `YYYY-MM-DD`.
///
/// The empty identifier is the "never acknowledged" sentinel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(transparent)]
pub struct WeekId(String);

impl WeekId {
    pub fn containing(date: NaiveDate) -> Self {
        Self(date_key(week_start(date)))
    }

    pub fn none() -> Self {
        Self(String::new())
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for WeekId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Zero-padded local calendar key used for check marks.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), DATE_KEY_FORMAT).ok()
}

/// Monday of the ISO week containing `date`. Saturates at the first
/// representable date.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let weekday = date.weekday().num_days_from_sunday() as i64;
    let offset = if weekday == 0 { -6 } else { 1 - weekday };
    date.checked_add_signed(Duration::days(offset))
        .unwrap_or(NaiveDate::MIN)
}

pub fn week_days(cursor: NaiveDate) -> Vec<NaiveDate> {
    consecutive_days(week_start(cursor), WEEK_LEN)
}

/// First cell of the month grid: the 1st of the month walked back to Monday.
pub fn month_grid_start(cursor: NaiveDate) -> NaiveDate {
    let first = first_of_month(cursor);
    let back = (first.weekday().num_days_from_sunday() + 6) % 7;
    first
        .checked_sub_signed(Duration::days(i64::from(back)))
        .unwrap_or(NaiveDate::MIN)
}

pub fn month_grid_days(cursor: NaiveDate) -> Vec<NaiveDate> {
    consecutive_days(month_grid_start(cursor), MONTH_GRID_LEN)
}

/// The ordered days a view shows: 1, 7 or 42 entries.
pub fn days_for(mode: ViewMode, cursor: NaiveDate) -> Vec<NaiveDate> {
    match mode {
        ViewMode::Day => vec![cursor],
        ViewMode::Week => week_days(cursor),
        ViewMode::Month => month_grid_days(cursor),
    }
}

/// Moves the cursor one unit of `mode`. Month steps land on the 1st of the
/// target month so a cursor on the 31st never skips a shorter month.
pub fn shift_cursor(cursor: NaiveDate, mode: ViewMode, direction: Direction) -> NaiveDate {
    shift_cursor_by(cursor, mode, direction.sign())
}

/// Moves the cursor `steps` units of `mode` at once. A target outside the
/// representable date range leaves the cursor where it was.
pub fn shift_cursor_by(cursor: NaiveDate, mode: ViewMode, steps: i32) -> NaiveDate {
    if steps == 0 {
        return cursor;
    }
    let steps = i64::from(steps);
    let shifted = match mode {
        ViewMode::Day => cursor.checked_add_signed(Duration::days(steps)),
        ViewMode::Week => cursor.checked_add_signed(Duration::days(steps * WEEK_LEN as i64)),
        ViewMode::Month => add_months_to_first(cursor, steps),
    };
    shifted.unwrap_or(cursor)
}

pub fn is_same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn add_months_to_first(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let total_months = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
    let target_year = i32::try_from(total_months.div_euclid(12)).ok()?;
    let target_month = (total_months.rem_euclid(12) + 1) as u32;
    NaiveDate::from_ymd_opt(target_year, target_month, 1)
}

fn consecutive_days(start: NaiveDate, len: usize) -> Vec<NaiveDate> {
    start.iter_days().take(len).collect()
}

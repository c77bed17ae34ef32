use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const MAX_HABITS: usize = 12;
pub const MIN_GOAL: u32 = 1;
pub const MAX_GOAL: u32 = 7;
pub const DEFAULT_GOAL: u32 = 7;
pub const DEFAULT_NAME: &str = "New Habit";
/// Color offered to a freshly opened draft.
pub const DEFAULT_DRAFT_COLOR: &str = "#6366f1";
/// Tint used whenever a habit carries no color at all.
pub const FALLBACK_TINT: &str = "#10b981";

/// Opaque habit identity. Generated once and never reused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HabitId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for HabitId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Habit {
    pub id: HabitId,
    #[serde(default)]
    pub name: String,
    /// Display-only tint token; never parsed.
    #[serde(default)]
    pub color: String,
    /// Loaded leniently; out-of-range values are clamped by the store's repair.
    #[serde(default = "default_goal", deserialize_with = "lenient_goal")]
    pub goal: u32,
}

fn default_goal() -> u32 {
    DEFAULT_GOAL
}

/// Accepts any JSON number (or numeric string) so one bad goal cannot fail the
/// whole snapshot. Fractions round up since a goal counts whole days.
fn lenient_goal<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let numeric = match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_i64()
            .map(saturate_goal)
            .or_else(|| number.as_f64().map(fractional_goal)),
        Value::String(raw) => raw.trim().parse::<f64>().ok().map(fractional_goal),
        _ => None,
    };
    Ok(numeric.unwrap_or(DEFAULT_GOAL))
}

fn saturate_goal(raw: i64) -> u32 {
    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}

fn fractional_goal(raw: f64) -> u32 {
    // `as` saturates and maps NaN to 0, which repair lifts to MIN_GOAL.
    raw.ceil() as u32
}

impl Habit {
    pub fn new(id: HabitId, fields: HabitFields) -> Self {
        let fields = fields.normalized();
        Self {
            id,
            name: fields.name,
            color: fields.color,
            goal: clamp_goal(fields.goal),
        }
    }

    pub fn tint(&self) -> &str {
        if self.color.trim().is_empty() {
            FALLBACK_TINT
        } else {
            &self.color
        }
    }

    pub fn fields(&self) -> HabitFields {
        HabitFields {
            name: self.name.clone(),
            color: self.color.clone(),
            goal: i64::from(self.goal),
        }
    }

    pub(crate) fn apply(&mut self, fields: HabitFields) {
        let fields = fields.normalized();
        self.name = fields.name;
        self.color = fields.color;
        self.goal = clamp_goal(fields.goal);
    }

    /// Repairs a habit read from storage so it satisfies the in-memory invariants.
    /// Returns true when anything had to change.
    pub(crate) fn repair(&mut self) -> bool {
        let before = self.clone();
        let fields = self.fields();
        self.apply(fields);
        *self != before
    }
}

/// The user-editable part of a habit, as raised by an edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitFields {
    pub name: String,
    pub color: String,
    /// Raw requested goal; clamped into `MIN_GOAL..=MAX_GOAL` on commit.
    pub goal: i64,
}

impl HabitFields {
    pub fn new(name: impl Into<String>, color: impl Into<String>, goal: i64) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            goal,
        }
    }

    pub fn normalized(self) -> Self {
        let name = self.name.trim();
        let name = if name.is_empty() {
            DEFAULT_NAME.to_string()
        } else {
            name.to_string()
        };
        let color = if self.color.trim().is_empty() {
            FALLBACK_TINT.to_string()
        } else {
            self.color
        };
        Self {
            name,
            color,
            goal: i64::from(clamp_goal(self.goal)),
        }
    }
}

impl Default for HabitFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: DEFAULT_DRAFT_COLOR.to_string(),
            goal: i64::from(DEFAULT_GOAL),
        }
    }
}

pub fn clamp_goal(goal: i64) -> u32 {
    goal.clamp(i64::from(MIN_GOAL), i64::from(MAX_GOAL)) as u32
}

/// A pending add or edit. Nothing in the store changes until it is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDraft {
    pub id: HabitId,
    pub fields: HabitFields,
    pub is_new: bool,
}

impl HabitDraft {
    pub fn new_habit() -> Self {
        Self {
            id: HabitId::generate(),
            fields: HabitFields::default(),
            is_new: true,
        }
    }

    pub fn edit(habit: &Habit) -> Self {
        Self {
            id: habit.id.clone(),
            fields: habit.fields(),
            is_new: false,
        }
    }
}

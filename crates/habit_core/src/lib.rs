//! Calendar and state engine for a weekly habit tracker.
//!
//! Day, week and month date ranges come from [`calendar`]; habits and their
//! check marks live in a [`HabitStore`]; [`aggregate`] counts completions;
//! [`MilestoneTracker`] surfaces "every weekly goal met" at most once per
//! week; [`projector`] assembles the read-only view. [`HabitTracker`] owns all
//! of it and writes snapshots through an injected [`PersistenceAdapter`].

pub mod aggregate;
pub mod calendar;
pub mod error;
pub mod habit;
pub mod milestone;
pub mod persistence;
pub mod projector;
pub mod store;
pub mod tracker;

pub use crate::calendar::{Direction, ViewMode, ViewState, WeekId};
pub use crate::error::{PersistenceError, TrackerError};
pub use crate::habit::{Habit, HabitDraft, HabitFields, HabitId, MAX_HABITS};
pub use crate::milestone::{MilestoneSink, MilestoneTracker};
pub use crate::persistence::{JsonFileStore, MemoryStore, PersistenceAdapter, Snapshot};
pub use crate::projector::CalendarView;
pub use crate::store::HabitStore;
pub use crate::tracker::{HabitTracker, HabitTrackerBuilder};

use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument, warn};

use crate::aggregate::all_goals_met;
use crate::calendar::{Direction, ViewMode, ViewState};
use crate::error::{Result, TrackerError};
use crate::habit::{Habit, HabitDraft, HabitFields, HabitId};
use crate::milestone::{MilestoneSink, MilestoneTracker, MilestoneTransition};
use crate::persistence::{MemoryStore, PersistenceAdapter, Snapshot};
use crate::projector::{self, CalendarView};
use crate::store::HabitStore;

/// Single owner of the habit store, the view state and the milestone state.
///
/// Every command runs to completion before returning: state update, then a
/// milestone re-evaluation, then a best-effort snapshot write when persisted
/// state changed.
pub struct HabitTracker {
    store: HabitStore,
    view: ViewState,
    milestone: MilestoneTracker,
    persistence: Box<dyn PersistenceAdapter>,
    milestone_sink: Option<Box<dyn MilestoneSink>>,
}

pub struct HabitTrackerBuilder {
    persistence: Option<Box<dyn PersistenceAdapter>>,
    milestone_sink: Option<Box<dyn MilestoneSink>>,
    mode: ViewMode,
    cursor: Option<NaiveDate>,
}

impl HabitTrackerBuilder {
    pub fn new() -> Self {
        Self {
            persistence: None,
            milestone_sink: None,
            mode: ViewMode::default(),
            cursor: None,
        }
    }

    pub fn with_persistence(mut self, adapter: Box<dyn PersistenceAdapter>) -> Self {
        self.persistence = Some(adapter);
        self
    }

    pub fn with_milestone_sink(mut self, sink: Box<dyn MilestoneSink>) -> Self {
        self.milestone_sink = Some(sink);
        self
    }

    pub fn view_mode(mut self, mode: ViewMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn cursor(mut self, cursor: NaiveDate) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Loads the stored snapshot. An unreadable snapshot is logged and
    /// replaced by an empty one; building never fails.
    pub fn build(self) -> HabitTracker {
        let persistence = self
            .persistence
            .unwrap_or_else(|| Box::new(MemoryStore::new()));
        let snapshot = match persistence.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => Snapshot::default(),
            Err(err) => {
                warn!(%err, "failed to load snapshot; starting empty");
                Snapshot::default()
            }
        };

        let (store, repairs) = HabitStore::from_parts(snapshot.habits, snapshot.checks);
        if repairs > 0 {
            warn!(repairs, "snapshot needed repairs on load");
        }
        let cursor = self.cursor.unwrap_or_else(|| Local::now().date_naive());
        info!(
            habits = store.len(),
            mode = %self.mode,
            %cursor,
            "habit tracker ready"
        );

        let mut tracker = HabitTracker {
            store,
            view: ViewState::new(self.mode, cursor),
            milestone: MilestoneTracker::new(snapshot.acknowledged_week),
            persistence,
            milestone_sink: self.milestone_sink,
        };
        tracker.reevaluate_milestone();
        tracker
    }
}

impl Default for HabitTrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitTracker {
    pub fn builder() -> HabitTrackerBuilder {
        HabitTrackerBuilder::new()
    }

    pub fn store(&self) -> &HabitStore {
        &self.store
    }

    pub fn habits(&self) -> &[Habit] {
        self.store.habits()
    }

    pub fn view_state(&self) -> ViewState {
        self.view
    }

    pub fn milestone(&self) -> &MilestoneTracker {
        &self.milestone
    }

    pub fn milestone_visible(&self) -> bool {
        self.milestone.is_visible()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            habits: self.store.habits().to_vec(),
            checks: self.store.checks().clone(),
            acknowledged_week: self.milestone.acknowledged().clone(),
        }
    }

    /// Recomputes the read-only view for the renderer.
    pub fn view(&self, today: NaiveDate) -> CalendarView {
        projector::project(&self.store, &self.view, today, self.milestone.is_visible())
    }

    pub fn navigate(&mut self, direction: Direction) {
        self.view.shift(direction);
        debug!(cursor = %self.view.cursor, mode = %self.view.mode, "navigated");
        self.reevaluate_milestone();
    }

    /// Moves `steps` periods at once (negative goes back) with a single
    /// milestone re-evaluation.
    pub fn navigate_by(&mut self, steps: i32) {
        self.view.shift_by(steps);
        debug!(steps, cursor = %self.view.cursor, mode = %self.view.mode, "navigated");
        self.reevaluate_milestone();
    }

    pub fn next(&mut self) {
        self.navigate(Direction::Next);
    }

    pub fn previous(&mut self) {
        self.navigate(Direction::Previous);
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view.mode == mode {
            return;
        }
        self.view.mode = mode;
        debug!(%mode, "view mode changed");
        self.reevaluate_milestone();
    }

    pub fn jump_to(&mut self, cursor: NaiveDate) {
        self.view.cursor = cursor;
        debug!(%cursor, "cursor moved");
        self.reevaluate_milestone();
    }

    /// Flips one check mark. Rejected with `InvalidMutation` while the month
    /// view is active, leaving state and storage untouched.
    #[instrument(skip(self), fields(mode = %self.view.mode))]
    pub fn toggle_check(&mut self, habit_id: &HabitId, day: NaiveDate) -> Result<bool> {
        let done = self.store.toggle_check(self.view.mode, habit_id, day)?;
        debug!(done, "check toggled");
        self.commit();
        Ok(done)
    }

    /// Opens a draft for a new habit. Fails up front when the collection is
    /// already full so no form is shown for a habit that cannot be saved.
    pub fn begin_new_habit(&self) -> Result<HabitDraft> {
        self.store.ensure_capacity()?;
        Ok(HabitDraft::new_habit())
    }

    pub fn begin_edit(&self, habit_id: &HabitId) -> Result<HabitDraft> {
        self.store
            .get(habit_id)
            .map(HabitDraft::edit)
            .ok_or_else(|| TrackerError::UnknownHabit(habit_id.clone()))
    }

    /// Saves a draft: new drafts are appended, edits replace fields in place.
    pub fn commit_draft(&mut self, draft: HabitDraft) -> Result<HabitId> {
        if draft.is_new {
            let id = self.store.add_habit_with_id(draft.id, draft.fields)?;
            info!(%id, "habit added");
            self.commit();
            Ok(id)
        } else if self.store.update_habit(&draft.id, draft.fields) {
            info!(id = %draft.id, "habit updated");
            self.commit();
            Ok(draft.id)
        } else {
            Err(TrackerError::UnknownHabit(draft.id))
        }
    }

    pub fn add_habit(&mut self, fields: HabitFields) -> Result<HabitId> {
        let id = self.store.add_habit(fields)?;
        info!(%id, "habit added");
        self.commit();
        Ok(id)
    }

    /// No-op for unknown ids.
    pub fn update_habit(&mut self, habit_id: &HabitId, fields: HabitFields) -> bool {
        let updated = self.store.update_habit(habit_id, fields);
        if updated {
            info!(id = %habit_id, "habit updated");
            self.commit();
        }
        updated
    }

    /// Irreversibly deletes the habit and its entire check history. Callers
    /// are expected to have confirmed the deletion with the user.
    #[instrument(skip(self))]
    pub fn remove_habit(&mut self, habit_id: &HabitId) -> Option<Habit> {
        let removed = self.store.remove_habit(habit_id)?;
        info!(name = %removed.name, "habit removed with its history");
        self.commit();
        Some(removed)
    }

    /// Dismisses the milestone modal for the current week.
    pub fn acknowledge_milestone(&mut self) -> bool {
        if !self.milestone.acknowledge() {
            return false;
        }
        self.persist();
        true
    }

    fn commit(&mut self) {
        self.reevaluate_milestone();
        self.persist();
    }

    fn reevaluate_milestone(&mut self) {
        let all_met = all_goals_met(&self.store, &self.view.anchored_week());
        let transition = self.milestone.evaluate(self.view.week_id(), all_met);
        if transition == MilestoneTransition::Shown {
            if let Some(sink) = &self.milestone_sink {
                sink.milestone_reached(self.milestone.week());
            }
        }
    }

    fn persist(&self) {
        if let Err(err) = self.persistence.save(&self.snapshot()) {
            warn!(%err, "failed to persist snapshot; continuing in memory");
        }
    }
}

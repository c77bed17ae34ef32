use std::sync::Arc;

use chrono::NaiveDate;
use habit_core::{
    calendar::WeekId, HabitFields, HabitTracker, JsonFileStore, MemoryStore, MilestoneSink,
    PersistenceAdapter, PersistenceError, Snapshot, TrackerError, ViewMode, MAX_HABITS,
};
use parking_lot::Mutex;
use tempfile::tempdir;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn tracker_at(store: &MemoryStore, cursor: NaiveDate) -> HabitTracker {
    HabitTracker::builder()
        .with_persistence(Box::new(store.clone()))
        .view_mode(ViewMode::Week)
        .cursor(cursor)
        .build()
}

#[derive(Clone, Default)]
struct RecordingSink {
    weeks: Arc<Mutex<Vec<WeekId>>>,
}

impl MilestoneSink for RecordingSink {
    fn milestone_reached(&self, week: &WeekId) {
        self.weeks.lock().push(week.clone());
    }
}

struct BrokenStorage;

impl PersistenceAdapter for BrokenStorage {
    fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        Err(PersistenceError::Unavailable("quota exceeded".into()))
    }

    fn save(&self, _snapshot: &Snapshot) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable("quota exceeded".into()))
    }
}

#[test]
fn milestone_surfaces_at_most_once_per_week() {
    let storage = MemoryStore::new();
    let sink = RecordingSink::default();
    let mut tracker = HabitTracker::builder()
        .with_persistence(Box::new(storage.clone()))
        .with_milestone_sink(Box::new(sink.clone()))
        .cursor(ymd(2025, 8, 11))
        .build();
    let id = tracker
        .add_habit(HabitFields::new("Stretch", "#22c55e", 1))
        .expect("add habit");

    tracker.toggle_check(&id, ymd(2025, 8, 13)).expect("check");
    assert!(tracker.milestone_visible());

    assert!(tracker.acknowledge_milestone());
    assert_eq!(tracker.milestone().acknowledged().as_str(), "2025-08-11");
    assert!(!tracker.milestone_visible());

    tracker.toggle_check(&id, ymd(2025, 8, 13)).expect("uncheck");
    assert!(!tracker.milestone_visible());
    tracker.toggle_check(&id, ymd(2025, 8, 13)).expect("recheck");
    assert!(!tracker.milestone_visible());

    tracker.next();
    assert_eq!(tracker.view_state().cursor, ymd(2025, 8, 18));
    assert!(!tracker.milestone_visible());
    tracker.toggle_check(&id, ymd(2025, 8, 19)).expect("check next week");
    assert!(tracker.milestone_visible());

    let weeks: Vec<String> = sink
        .weeks
        .lock()
        .iter()
        .map(|week| week.to_string())
        .collect();
    assert_eq!(weeks, vec!["2025-08-11", "2025-08-18"]);

    let saved = storage.current().expect("snapshot saved");
    assert_eq!(saved.acknowledged_week.as_str(), "2025-08-11");
}

#[test]
fn acknowledgment_survives_a_reload() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("habit-tracker-v1.json");
    let cursor = ymd(2025, 8, 14);

    let mut first = HabitTracker::builder()
        .with_persistence(Box::new(JsonFileStore::new(&path)))
        .cursor(cursor)
        .build();
    let id = first
        .add_habit(HabitFields::new("Read", "", 2))
        .expect("add habit");
    first.toggle_check(&id, ymd(2025, 8, 11)).expect("check");
    first.toggle_check(&id, ymd(2025, 8, 12)).expect("check");
    assert!(first.milestone_visible());
    first.acknowledge_milestone();

    let second = HabitTracker::builder()
        .with_persistence(Box::new(JsonFileStore::new(&path)))
        .cursor(cursor)
        .build();
    assert_eq!(second.habits().len(), 1);
    assert!(second.store().is_checked(&id, ymd(2025, 8, 12)));
    assert!(!second.milestone_visible());
}

#[test]
fn unacknowledged_milestone_reappears_after_reload() {
    let storage = MemoryStore::new();
    let mut first = tracker_at(&storage, ymd(2025, 8, 11));
    let id = first
        .add_habit(HabitFields::new("Walk", "", 1))
        .expect("add habit");
    first.toggle_check(&id, ymd(2025, 8, 11)).expect("check");
    assert!(first.milestone_visible());

    let second = tracker_at(&storage, ymd(2025, 8, 15));
    assert!(second.milestone_visible());
}

#[test]
fn every_habit_must_meet_its_goal() {
    let storage = MemoryStore::new();
    let mut tracker = tracker_at(&storage, ymd(2025, 8, 11));
    let read = tracker
        .add_habit(HabitFields::new("Read", "", 3))
        .expect("add read");
    let run = tracker
        .add_habit(HabitFields::new("Run", "", 2))
        .expect("add run");

    for day in [ymd(2025, 8, 11), ymd(2025, 8, 12), ymd(2025, 8, 15)] {
        tracker.toggle_check(&read, day).expect("check read");
    }
    let view = tracker.view(ymd(2025, 8, 11));
    assert_eq!(view.rows[0].week_count, 3);
    assert_eq!(view.rows[0].progress, "3/3");
    assert!(!tracker.milestone_visible());

    tracker.toggle_check(&run, ymd(2025, 8, 16)).expect("check run");
    assert!(!tracker.milestone_visible());
    tracker.toggle_check(&run, ymd(2025, 8, 17)).expect("check run");
    assert!(tracker.milestone_visible());

    tracker.toggle_check(&run, ymd(2025, 8, 17)).expect("uncheck run");
    assert!(!tracker.milestone_visible(), "unchecking retracts the modal");
    assert!(tracker.milestone().acknowledged().is_none());
}

#[test]
fn no_habits_never_congratulates() {
    let storage = MemoryStore::new();
    let mut tracker = tracker_at(&storage, ymd(2025, 8, 11));
    assert!(!tracker.milestone_visible());
    tracker.next();
    tracker.set_view_mode(ViewMode::Day);
    assert!(!tracker.milestone_visible());

    let id = tracker
        .add_habit(HabitFields::new("Only", "", 1))
        .expect("add habit");
    tracker
        .toggle_check(&id, tracker.view_state().cursor)
        .expect("check");
    assert!(tracker.milestone_visible());

    tracker.remove_habit(&id).expect("remove");
    assert!(!tracker.milestone_visible());
    assert!(!tracker.acknowledge_milestone());
}

#[test]
fn month_view_rejects_toggles_without_writing() {
    let storage = MemoryStore::with_snapshot(Snapshot::default());
    let mut tracker = tracker_at(&storage, ymd(2025, 8, 11));
    let id = tracker
        .add_habit(HabitFields::new("Read", "", 1))
        .expect("add habit");
    let before = storage.current();

    tracker.set_view_mode(ViewMode::Month);
    let err = tracker
        .toggle_check(&id, ymd(2025, 8, 11))
        .expect_err("month is read-only");
    assert!(matches!(
        err,
        TrackerError::InvalidMutation {
            mode: ViewMode::Month
        }
    ));
    assert!(!tracker.store().is_checked(&id, ymd(2025, 8, 11)));
    assert_eq!(storage.current(), before);
    assert!(!tracker.view(ymd(2025, 8, 11)).editable);
}

#[test]
fn capacity_is_enforced_for_drafts_and_direct_adds() {
    let storage = MemoryStore::new();
    let mut tracker = tracker_at(&storage, ymd(2025, 8, 11));
    for i in 0..MAX_HABITS {
        let mut draft = tracker.begin_new_habit().expect("room for draft");
        draft.fields.name = format!("habit {i}");
        tracker.commit_draft(draft).expect("commit draft");
    }

    assert!(matches!(
        tracker.begin_new_habit(),
        Err(TrackerError::CapacityExceeded { max: 12 })
    ));
    assert!(matches!(
        tracker.add_habit(HabitFields::new("thirteenth", "", 1)),
        Err(TrackerError::CapacityExceeded { .. })
    ));
    assert_eq!(tracker.habits().len(), MAX_HABITS);
    assert!(!tracker.view(ymd(2025, 8, 11)).can_add_habit);
}

#[test]
fn edit_draft_updates_in_place() {
    let storage = MemoryStore::new();
    let mut tracker = tracker_at(&storage, ymd(2025, 8, 11));
    let first = tracker
        .add_habit(HabitFields::new("Read", "#111111", 3))
        .expect("add");
    tracker
        .add_habit(HabitFields::new("Run", "#222222", 3))
        .expect("add");

    let mut draft = tracker.begin_edit(&first).expect("draft");
    assert!(!draft.is_new);
    draft.fields.name = "   ".into();
    draft.fields.goal = 0;
    let id = tracker.commit_draft(draft).expect("commit");

    assert_eq!(id, first);
    let habit = &tracker.habits()[0];
    assert_eq!(habit.id, first);
    assert_eq!(habit.name, "New Habit");
    assert_eq!(habit.goal, 1);
    assert_eq!(habit.color, "#111111");

    let stale = tracker.begin_edit(&first).expect("draft");
    tracker.remove_habit(&first).expect("remove");
    assert!(matches!(
        tracker.commit_draft(stale),
        Err(TrackerError::UnknownHabit(_))
    ));
    assert_eq!(tracker.habits().len(), 1);
}

#[test]
fn removal_is_atomic_in_the_saved_snapshot() {
    let storage = MemoryStore::new();
    let mut tracker = tracker_at(&storage, ymd(2025, 8, 11));
    let id = tracker
        .add_habit(HabitFields::new("Journal", "", 7))
        .expect("add");
    for day in ymd(2025, 8, 11).iter_days().take(7) {
        tracker.toggle_check(&id, day).expect("check");
    }

    tracker.remove_habit(&id).expect("remove");
    let saved = storage.current().expect("saved");
    assert!(saved.habits.is_empty());
    assert!(!saved.checks.contains_key(&id));
}

#[test]
fn storage_failures_never_interrupt_the_session() {
    let mut tracker = HabitTracker::builder()
        .with_persistence(Box::new(BrokenStorage))
        .cursor(ymd(2025, 8, 11))
        .build();
    assert!(tracker.habits().is_empty());

    let id = tracker
        .add_habit(HabitFields::new("Read", "", 1))
        .expect("add in memory");
    assert!(tracker.toggle_check(&id, ymd(2025, 8, 11)).expect("toggle"));
    assert!(tracker.milestone_visible());
    assert!(tracker.acknowledge_milestone());
}

#[test]
fn corrupt_snapshot_file_falls_back_to_empty() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("habits.json");
    std::fs::write(&path, "{\"habits\": 42}").expect("write fixture");

    let mut tracker = HabitTracker::builder()
        .with_persistence(Box::new(JsonFileStore::new(&path)))
        .cursor(ymd(2025, 8, 11))
        .build();
    assert!(tracker.habits().is_empty());

    tracker
        .add_habit(HabitFields::new("Fresh start", "", 2))
        .expect("add");
    let reloaded = JsonFileStore::new(&path)
        .load()
        .expect("readable")
        .expect("present");
    assert_eq!(reloaded.habits.len(), 1);
}

#[test]
fn loads_snapshot_written_by_the_web_build() {
    let raw = r##"{
        "habits": [
            {"id": "k3j2h1", "name": "10k steps", "color": "#6366f1", "goal": 5},
            {"id": "p9q8r7", "name": "Read", "color": "#10b981", "goal": 3}
        ],
        "checks": {
            "k3j2h1": {"2025-08-11": true, "2025-08-12": false},
            "deleted": {"2025-08-11": true}
        },
        "congratsShownWeek": "2025-08-04"
    }"##;
    let snapshot = Snapshot::from_json(raw).expect("parse");
    let storage = MemoryStore::with_snapshot(snapshot);
    let tracker = tracker_at(&storage, ymd(2025, 8, 13));

    assert_eq!(tracker.habits().len(), 2);
    assert_eq!(tracker.habits()[0].name, "10k steps");
    assert_eq!(tracker.milestone().acknowledged().as_str(), "2025-08-04");
    let view = tracker.view(ymd(2025, 8, 13));
    assert_eq!(view.rows[0].progress, "1/5");
    assert_eq!(view.label, "August 2025");
}

#[test]
fn navigation_and_goal_edits_reevaluate_the_milestone() {
    let storage = MemoryStore::new();
    let mut tracker = tracker_at(&storage, ymd(2025, 8, 11));
    let id = tracker
        .add_habit(HabitFields::new("Read", "", 1))
        .expect("add habit");
    tracker.toggle_check(&id, ymd(2025, 8, 12)).expect("check");
    assert!(tracker.milestone_visible());

    tracker.previous();
    assert_eq!(tracker.view_state().cursor, ymd(2025, 8, 4));
    assert!(!tracker.milestone_visible());

    tracker.jump_to(ymd(2025, 8, 16));
    assert!(tracker.milestone_visible(), "unacknowledged week shows again");

    assert!(tracker.update_habit(&id, HabitFields::new("Read", "", 2)));
    assert!(!tracker.milestone_visible());
    assert_eq!(storage.current().expect("saved").habits[0].goal, 2);

    let missing = habit_core::HabitId::from("missing");
    assert!(!tracker.update_habit(&missing, HabitFields::new("x", "", 1)));
}

#[test]
fn out_of_range_goal_is_repaired_without_losing_the_file() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("habit-tracker-v1.json");
    std::fs::write(
        &path,
        r##"{
            "habits": [
                {"id": "a", "name": "Read", "color": "#6366f1", "goal": 3},
                {"id": "b", "name": "Swim", "color": "#10b981", "goal": -1},
                {"id": "c", "name": "Walk", "color": "#f97316", "goal": 3.5}
            ],
            "checks": {"a": {"2025-08-11": true}},
            "congratsShownWeek": "2025-08-04"
        }"##,
    )
    .expect("write fixture");

    let mut tracker = HabitTracker::builder()
        .with_persistence(Box::new(JsonFileStore::new(&path)))
        .cursor(ymd(2025, 8, 13))
        .build();
    let goals: Vec<u32> = tracker.habits().iter().map(|habit| habit.goal).collect();
    assert_eq!(goals, vec![3, 1, 4]);
    let read = habit_core::HabitId::from("a");
    assert!(tracker.store().is_checked(&read, ymd(2025, 8, 11)));
    assert_eq!(tracker.milestone().acknowledged().as_str(), "2025-08-04");

    tracker
        .add_habit(HabitFields::new("Stretch", "", 2))
        .expect("add");
    let saved = JsonFileStore::new(&path)
        .load()
        .expect("readable")
        .expect("present");
    assert_eq!(saved.habits.len(), 4);
    assert_eq!(saved.habits[1].goal, 1);
    assert_eq!(saved.checks[&read].len(), 1);
    assert_eq!(saved.acknowledged_week.as_str(), "2025-08-04");
}

#[test]
fn navigation_at_the_calendar_edges_stays_put() {
    let storage = MemoryStore::new();
    let mut tracker = HabitTracker::builder()
        .with_persistence(Box::new(storage.clone()))
        .view_mode(ViewMode::Day)
        .cursor(NaiveDate::MAX)
        .build();
    tracker.next();
    assert_eq!(tracker.view_state().cursor, NaiveDate::MAX);
    tracker.navigate_by(-2);
    assert_eq!(tracker.view_state().cursor, NaiveDate::MAX - chrono::Duration::days(2));

    tracker.jump_to(NaiveDate::MIN);
    tracker.set_view_mode(ViewMode::Week);
    tracker.previous();
    tracker.navigate_by(i32::MIN);
    assert_eq!(tracker.view_state().cursor, NaiveDate::MIN);
    assert!(!tracker.view(NaiveDate::MIN).days.is_empty());
}

use std::io::Write;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use habit_core::projector::{CalendarView, MonthCell};
use habit_core::{HabitFields, HabitId, HabitTracker, JsonFileStore, TrackerError, ViewMode};
use tracing::{debug, info};

use crate::config::AppConfig;

const NAME_WIDTH: usize = 18;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Render the current view, optionally moved `shift` periods away.
    Show { shift: i32 },
    List,
    Add {
        name: String,
        goal: i64,
        color: Option<String>,
    },
    Edit {
        habit: String,
        name: Option<String>,
        goal: Option<i64>,
        color: Option<String>,
    },
    Remove { habit: String, confirmed: bool },
    Toggle {
        habit: String,
        date: Option<NaiveDate>,
    },
    Acknowledge,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn run(
    config: &AppConfig,
    cursor: Option<NaiveDate>,
    command: Command,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let today = config.today();
    info!(path = %config.data_file.display(), "opening habit store");
    let mut tracker = HabitTracker::builder()
        .with_persistence(Box::new(JsonFileStore::new(&config.data_file)))
        .view_mode(config.view_mode)
        .cursor(today)
        .build();
    if let Some(cursor) = cursor {
        tracker.jump_to(cursor);
    }
    execute(&mut tracker, command, today, format, out)
}

/// Executes one command against the tracker and renders the resulting view.
pub fn execute(
    tracker: &mut HabitTracker,
    command: Command,
    today: NaiveDate,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Show { shift } => tracker.navigate_by(shift),
        Command::List => {
            for (idx, habit) in tracker.habits().iter().enumerate() {
                writeln!(
                    out,
                    "{:>2}. {:<width$} goal {}/week  {:>4} days done  {}  [{}]",
                    idx + 1,
                    habit.name,
                    habit.goal,
                    tracker.store().check_count(&habit.id),
                    habit.tint(),
                    habit.id,
                    width = NAME_WIDTH
                )?;
            }
            return Ok(());
        }
        Command::Add { name, goal, color } => {
            let mut draft = tracker.begin_new_habit()?;
            draft.fields.name = name;
            draft.fields.goal = goal;
            if let Some(color) = color {
                draft.fields.color = color;
            }
            let id = tracker.commit_draft(draft)?;
            writeln!(out, "Added habit {id}")?;
        }
        Command::Edit {
            habit,
            name,
            goal,
            color,
        } => {
            let id = resolve_habit(tracker, &habit)?;
            let mut draft = tracker.begin_edit(&id)?;
            let HabitFields {
                name: current_name,
                color: current_color,
                goal: current_goal,
            } = draft.fields;
            draft.fields = HabitFields::new(
                name.unwrap_or(current_name),
                color.unwrap_or(current_color),
                goal.unwrap_or(current_goal),
            );
            tracker.commit_draft(draft)?;
            writeln!(out, "Updated habit {id}")?;
        }
        Command::Remove { habit, confirmed } => {
            let id = resolve_habit(tracker, &habit)?;
            if !confirmed {
                let name = tracker
                    .store()
                    .get(&id)
                    .map(|habit| habit.name.clone())
                    .unwrap_or_default();
                let history = tracker.store().check_count(&id);
                bail!("refusing to delete `{name}` and its {history} check marks without --yes");
            }
            let removed = tracker
                .remove_habit(&id)
                .ok_or_else(|| anyhow!("habit `{id}` disappeared before removal"))?;
            writeln!(out, "Deleted `{}` and all its history", removed.name)?;
        }
        Command::Toggle { habit, date } => {
            let id = resolve_habit(tracker, &habit)?;
            let day = date.unwrap_or(tracker.view_state().cursor);
            match tracker.toggle_check(&id, day) {
                Ok(done) => {
                    let state = if done { "done" } else { "not done" };
                    writeln!(out, "{day}: marked {state}")?;
                }
                Err(err @ TrackerError::InvalidMutation { .. }) => {
                    debug!(%err, "toggle ignored");
                    writeln!(out, "note: {err}")?;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Acknowledge => {
            if tracker.acknowledge_milestone() {
                writeln!(out, "Milestone acknowledged for this week")?;
            } else {
                writeln!(out, "Nothing to acknowledge")?;
            }
        }
    }

    let view = tracker.view(today);
    match format {
        OutputFormat::Text => out.write_all(render_text(&view).as_bytes())?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &view).context("failed to encode view")?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Accepts an id, a 1-based list position, a case-insensitive name or a
/// unique id prefix.
pub fn resolve_habit(tracker: &HabitTracker, reference: &str) -> Result<HabitId> {
    let reference = reference.trim();
    let habits = tracker.habits();
    if let Some(habit) = habits.iter().find(|habit| habit.id.as_str() == reference) {
        return Ok(habit.id.clone());
    }
    if let Ok(position) = reference.parse::<usize>() {
        if let Some(habit) = position.checked_sub(1).and_then(|idx| habits.get(idx)) {
            return Ok(habit.id.clone());
        }
    }
    let by_name: Vec<_> = habits
        .iter()
        .filter(|habit| habit.name.eq_ignore_ascii_case(reference))
        .collect();
    if let [habit] = by_name.as_slice() {
        return Ok(habit.id.clone());
    }
    if by_name.len() > 1 {
        bail!("`{reference}` matches several habits; use the id from `habits list`");
    }
    let by_prefix: Vec<_> = habits
        .iter()
        .filter(|habit| !reference.is_empty() && habit.id.as_str().starts_with(reference))
        .collect();
    match by_prefix.as_slice() {
        [habit] => Ok(habit.id.clone()),
        [] => Err(anyhow!("no habit matches `{reference}`")),
        _ => Err(anyhow!("`{reference}` is an ambiguous id prefix")),
    }
}

pub fn render_text(view: &CalendarView) -> String {
    let mut text = format!("{}  ({} view)\n", view.label, view.mode);

    if view.is_empty {
        text.push_str("No habits yet.\nRun `habits add --name <NAME>` to get started.\n");
        return text;
    }

    match view.mode {
        ViewMode::Day | ViewMode::Week => render_matrix(view, &mut text),
        ViewMode::Month => render_month(view, &mut text),
    }

    if view.milestone_visible {
        text.push_str(
            "\nAll goals smashed! You completed every habit for this week. \
             Run `habits ack` to dismiss.\n",
        );
    }
    text
}

fn render_matrix(view: &CalendarView, text: &mut String) {
    let column = if view.mode == ViewMode::Day { 11 } else { 5 };
    let mut weekdays = format!("{:<width$}", "Habits", width = NAME_WIDTH + 6);
    let mut dates = " ".repeat(NAME_WIDTH + 6);
    for day in &view.days {
        weekdays.push_str(&format!("{:^column$}", day.weekday));
        let number = if day.is_today {
            format!("[{}]", day.day_of_month)
        } else {
            day.day_of_month.to_string()
        };
        dates.push_str(&format!("{number:^column$}"));
    }
    text.push_str(weekdays.trim_end());
    text.push('\n');
    text.push_str(dates.trim_end());
    text.push('\n');

    for row in &view.rows {
        let mut line = format!(
            "{:<name_width$}{:>5} ",
            truncate(&row.name, NAME_WIDTH),
            row.progress,
            name_width = NAME_WIDTH + 1
        );
        for cell in &row.cells {
            let mark = if cell.done { "✓" } else { "–" };
            line.push_str(&format!("{mark:^column$}"));
        }
        text.push_str(line.trim_end());
        text.push('\n');
    }
}

fn render_month(view: &CalendarView, text: &mut String) {
    let width = view
        .month_cells
        .first()
        .map(|cell| cell.dots.len() + 5)
        .unwrap_or(5)
        .max(5);
    for name in ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"] {
        text.push_str(&format!("{name:<width$}"));
    }
    text.push('\n');
    for week in view.month_cells.chunks(7) {
        let line: String = week
            .iter()
            .map(|cell| format!("{:<width$}", month_cell_text(cell)))
            .collect();
        text.push_str(line.trim_end());
        text.push('\n');
    }
    if let Some(overflow) = view.month_cells.first().map(|cell| cell.overflow) {
        if overflow > 0 {
            text.push_str(&format!("+{overflow} more\n"));
        }
    }
    text.push('\n');
    for entry in &view.legend {
        text.push_str(&format!("● {} ({})\n", entry.name, entry.tint));
    }
}

fn month_cell_text(cell: &MonthCell) -> String {
    let day = if cell.is_today {
        format!("[{}]", cell.day_of_month)
    } else if cell.in_month {
        format!("{:>2}", cell.day_of_month)
    } else {
        format!("({})", cell.day_of_month)
    };
    let dots: String = cell
        .dots
        .iter()
        .map(|dot| if dot.done { '●' } else { '·' })
        .collect();
    format!("{day}{dots}")
}

fn truncate(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let mut short: String = name.chars().take(max.saturating_sub(1)).collect();
    short.push('…');
    short
}

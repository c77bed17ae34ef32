use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use habit_core::calendar::parse_date_key;
use habit_core::ViewMode;

use crate::app::{Command, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "habits", version, about = "Weekly habit tracker")]
pub struct Cli {
    /// View to render: day, week or month (defaults to HABITS_VIEW_MODE).
    #[arg(long, short, global = true)]
    pub mode: Option<ViewMode>,

    /// Date the view is anchored on, as YYYY-MM-DD.
    #[arg(long, short, global = true, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Print the projected view as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render the calendar
    Show {
        /// Periods to move from the anchor date; negative goes back.
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        shift: i32,
    },
    /// List habits with their positions and ids
    List,
    /// Add a habit
    Add {
        #[arg(long)]
        name: String,
        /// Target completions per week (1-7).
        #[arg(long, default_value_t = 7, allow_hyphen_values = true)]
        goal: i64,
        #[arg(long)]
        color: Option<String>,
    },
    /// Edit a habit's name, color or goal
    Edit {
        /// Id, list position or name.
        habit: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        goal: Option<i64>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a habit and all of its history
    Remove {
        habit: String,
        /// Confirm the deletion.
        #[arg(long, short)]
        yes: bool,
    },
    /// Flip a check mark on the anchor date
    Toggle { habit: String },
    /// Dismiss this week's congratulations
    Ack,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    pub fn into_command(self) -> Command {
        match self.command.unwrap_or(Commands::Show { shift: 0 }) {
            Commands::Show { shift } => Command::Show { shift },
            Commands::List => Command::List,
            Commands::Add { name, goal, color } => Command::Add { name, goal, color },
            Commands::Edit {
                habit,
                name,
                goal,
                color,
            } => Command::Edit {
                habit,
                name,
                goal,
                color,
            },
            Commands::Remove { habit, yes } => Command::Remove {
                habit,
                confirmed: yes,
            },
            Commands::Toggle { habit } => Command::Toggle {
                habit,
                date: self.date,
            },
            Commands::Ack => Command::Acknowledge,
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_date_key(value).ok_or_else(|| format!("`{value}` is not a YYYY-MM-DD date"))
}

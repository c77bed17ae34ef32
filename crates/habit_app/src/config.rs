use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use habit_core::calendar::parse_date_key;
use habit_core::ViewMode;
use tracing::{info, warn};

const DATA_FILE_NAME: &str = "habit-tracker-v1.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub data_file: PathBuf,
    pub view_mode: ViewMode,
    /// Overrides the device clock for "today" and the initial cursor.
    pub today: Option<NaiveDate>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            data_file: default_data_file(lookup("HABITS_ENV").as_deref()),
            ..Self::default()
        };
        if let Some(path) = lookup("HABITS_DATA_FILE") {
            let path = path.trim();
            if !path.is_empty() {
                config.data_file = PathBuf::from(path);
            }
        }
        if let Some(mode) = lookup("HABITS_VIEW_MODE") {
            match mode.parse::<ViewMode>() {
                Ok(mode) => config.view_mode = mode,
                Err(err) => warn!(%err, "ignoring HABITS_VIEW_MODE"),
            }
        }
        if let Some(today) = lookup("HABITS_TODAY") {
            match parse_date_key(&today) {
                Some(date) => config.today = Some(date),
                None => warn!(value = %today, "ignoring HABITS_TODAY; expected YYYY-MM-DD"),
            }
        }
        info!(path = %config.data_file.display(), mode = %config.view_mode, "configuration loaded");
        config
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(None),
            view_mode: ViewMode::Week,
            today: None,
        }
    }
}

/// `~/.config/habit-tracker[-dev]/habit-tracker-v1.json`.
fn default_data_file(env: Option<&str>) -> PathBuf {
    let dir_name = if env == Some("dev") {
        "habit-tracker-dev"
    } else {
        "habit-tracker"
    };
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(dir_name)
        .join(DATA_FILE_NAME)
}

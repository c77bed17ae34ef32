use std::path::PathBuf;

use thiserror::Error;

use crate::calendar::ViewMode;
use crate::habit::HabitId;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("you can have up to {max} habits; delete one to add another")]
    CapacityExceeded { max: usize },

    #[error("check marks are read-only in {mode} view")]
    InvalidMutation { mode: ViewMode },

    #[error("habit `{0}` not found")]
    UnknownHabit(HabitId),
}

/// Storage transport failures. These never leave the tracker: loads fall back
/// to an empty snapshot and saves are logged and dropped.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;

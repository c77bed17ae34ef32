//! Snapshot persistence.
//!
//! The tracker only sees [`PersistenceAdapter`]. [`JsonFileStore`] keeps the
//! snapshot in a single JSON document on disk; [`MemoryStore`] keeps it in
//! memory and is what tests inject.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::calendar::WeekId;
use crate::error::PersistenceError;
use crate::habit::Habit;
use crate::store::Checks;

/// Everything that survives a restart, saved and loaded as one unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub checks: Checks,
    #[serde(rename = "congratsShownWeek", default)]
    pub acknowledged_week: WeekId,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(raw)?)
    }
}

pub trait PersistenceAdapter {
    /// `Ok(None)` means nothing has been stored yet.
    fn load(&self) -> Result<Option<Snapshot>, PersistenceError>;
    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError>;
}

/// Stores the snapshot as pretty-printed JSON. Writes go to a sibling temp
/// file that is renamed over the target, so readers see the old or the new
/// snapshot and never a partial one.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PersistenceAdapter for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Snapshot::from_json(&raw).map(Some)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
            }
        }
        let payload = snapshot.to_json()?;
        let temp = self.temp_path();
        let mut file = fs::File::create(&temp).map_err(|err| self.io_error(err))?;
        file.write_all(payload.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|err| self.io_error(err))?;
        fs::rename(&temp, &self.path).map_err(|err| self.io_error(err))?;
        Ok(())
    }
}

/// Shared in-memory slot. Clones observe the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<Snapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(snapshot))),
        }
    }

    pub fn current(&self) -> Option<Snapshot> {
        self.slot.lock().clone()
    }
}

impl PersistenceAdapter for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        *self.slot.lock() = Some(snapshot.clone());
        Ok(())
    }
}

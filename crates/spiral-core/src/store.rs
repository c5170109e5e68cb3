//! File-backed counter collaborator: `{ "stoneCount": <int> }` on disk.

use crate::constants::PERSISTED_COUNTER_DEFAULT;
use crate::counter::{CounterTransport, HttpReply};
use crate::error::{Result, SpiralError};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CounterDoc {
    stone_count: i64,
}

/// Bumps through one store are serialised, and each write replaces the file
/// atomically, so readers never see a partial document.
pub struct FileCounterStore {
    path: PathBuf,
    bump_lock: Mutex<()>,
}

impl FileCounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            bump_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current value; a missing or corrupt file reads as the default.
    pub fn load(&self) -> i64 {
        let parsed = std::fs::read_to_string(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<CounterDoc>(&raw).map_err(|e| e.to_string()));
        match parsed {
            Ok(doc) => doc.stone_count,
            Err(e) => {
                log::warn!(
                    "[counter] cannot read {}, starting at {}: {}",
                    self.path.display(),
                    PERSISTED_COUNTER_DEFAULT,
                    e
                );
                PERSISTED_COUNTER_DEFAULT
            }
        }
    }

    fn save(&self, stone_count: i64) -> Result<()> {
        let body = serde_json::to_string_pretty(&CounterDoc { stone_count })
            .map_err(|e| SpiralError::Transport(e.to_string()))?;
        let fail = |e: &dyn std::fmt::Display| {
            SpiralError::Transport(format!("write {}: {}", self.path.display(), e))
        };
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| fail(&e))?;
        tmp.write_all(body.as_bytes()).map_err(|e| fail(&e))?;
        tmp.persist(&self.path).map_err(|e| fail(&e.error))?;
        Ok(())
    }

    /// Add one and persist; returns the new value.
    pub fn bump(&self) -> Result<i64> {
        let _guard = self.bump_lock.lock().unwrap_or_else(|p| p.into_inner());
        let next = self.load().saturating_add(1);
        self.save(next)?;
        log::info!("[counter] stoneCount raised to {}", next);
        Ok(next)
    }

    fn reply(stone_count: i64) -> HttpReply {
        HttpReply::ok(serde_json::json!({ "stoneCount": stone_count }).to_string())
    }
}

impl CounterTransport for FileCounterStore {
    async fn increment(&self) -> Result<HttpReply> {
        self.bump().map(Self::reply)
    }

    async fn read(&self) -> Result<HttpReply> {
        Ok(Self::reply(self.load()))
    }
}

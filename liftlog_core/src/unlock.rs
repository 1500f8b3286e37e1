//! Append-only unlock record ledger.
//!
//! The ledger holds one line per first-time unlock and enforces the
//! at-most-once invariant: `try_insert` re-checks for an existing
//! (user, achievement) pair under an exclusive file lock before
//! appending, so concurrent evaluation passes cannot both grant the
//! same achievement. The evaluator's boolean is advisory; this check is
//! the authority.

use crate::{Result, UnlockRecord};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use uuid::Uuid;

/// Write/read surface over unlock records. Only the achievement engine
/// writes here, and only through `try_insert`.
pub trait UnlockStore: Send + Sync {
    /// Insert a record unless one already exists for (user, achievement).
    /// Returns true when this call created the record, false when the
    /// pair was already present (a no-op, not an error).
    fn try_insert(&self, user: Uuid, achievement_id: &str, at: DateTime<Utc>) -> Result<bool>;

    /// Ids of all achievements already unlocked by the user
    fn unlocked_for(&self, user: Uuid) -> Result<HashSet<String>>;

    /// All unlock records for the user, in insertion order
    fn records_for(&self, user: Uuid) -> Result<Vec<UnlockRecord>>;
}

/// JSONL-backed unlock ledger
#[derive(Clone)]
pub struct FileUnlockLedger {
    path: PathBuf,
}

impl FileUnlockLedger {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Read every record under a shared lock, skipping corrupt lines
    fn read_all(&self) -> Result<Vec<UnlockRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;
        let records = read_records(&file, &self.path);
        file.unlock()?;
        Ok(records)
    }
}

fn read_records(file: &File, path: &std::path::Path) -> Vec<UnlockRecord> {
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = match line_result {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to read unlock ledger line: {}", e);
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<UnlockRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse unlock record at {:?}:{}: {}",
                    path,
                    line_num + 1,
                    e
                );
            }
        }
    }

    records
}

impl UnlockStore for FileUnlockLedger {
    fn try_insert(&self, user: Uuid, achievement_id: &str, at: DateTime<Utc>) -> Result<bool> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        // The lock spans the existence check and the append: a racing
        // writer observes our record or we observe theirs.
        file.lock_exclusive()?;

        let existing = read_records(&file, &self.path);
        if existing
            .iter()
            .any(|r| r.user == user && r.achievement_id == achievement_id)
        {
            file.unlock()?;
            tracing::debug!(
                "Unlock of '{}' for {} already recorded; absorbing duplicate",
                achievement_id,
                user
            );
            return Ok(false);
        }

        let record = UnlockRecord {
            user,
            achievement_id: achievement_id.to_string(),
            unlocked_at: at,
        };

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(&record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.sync_all()?;
        file.unlock()?;

        tracing::info!("Recorded unlock of '{}' for {}", achievement_id, user);
        Ok(true)
    }

    fn unlocked_for(&self, user: Uuid) -> Result<HashSet<String>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.user == user)
            .map(|r| r.achievement_id)
            .collect())
    }

    fn records_for(&self, user: Uuid) -> Result<Vec<UnlockRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.user == user)
            .collect())
    }
}

//! Append-only JSONL journal for record persistence.
//!
//! Records are appended to a JSON Lines file with file locking to ensure
//! safe concurrent access. Session, body metric, and unlock stores all
//! sit on top of this primitive.

use crate::Result;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// JSONL-backed journal for one record type, with file locking
pub struct JsonlJournal<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonlJournal<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a journal handle for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append one record as a JSON line under an exclusive lock
    pub fn append(&self, record: &T) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended record to {:?}", self.path);
        Ok(())
    }

    /// Read all records, skipping lines that fail to parse
    pub fn read_all(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let reader = BufReader::new(&file);
        let mut records = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<T>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse record at {:?}:{}: {}",
                        self.path,
                        line_num + 1,
                        e
                    );
                    // Continue reading, don't fail completely
                }
            }
        }

        file.unlock()?;
        tracing::debug!("Read {} records from {:?}", records.len(), self.path);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExerciseSession, SessionMetrics};
    use chrono::Utc;
    use uuid::Uuid;

    fn create_test_session() -> ExerciseSession {
        ExerciseSession {
            id: Uuid::new_v4(),
            user: Uuid::new_v4(),
            exercise_id: "bench_press".into(),
            workout_id: None,
            performed_at: Utc::now(),
            sets: vec![],
            metrics: SessionMetrics::default(),
        }
    }

    #[test]
    fn test_append_and_read_single_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sessions.jsonl");

        let session = create_test_session();
        let session_id = session.id;

        let journal = JsonlJournal::new(&path);
        journal.append(&session).unwrap();

        let records = journal.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, session_id);
    }

    #[test]
    fn test_append_multiple_records() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sessions.jsonl");

        let journal = JsonlJournal::new(&path);
        for _ in 0..5 {
            journal.append(&create_test_session()).unwrap();
        }

        let records = journal.read_all().unwrap();
        assert_eq!(records.len(), 5);
    }

    #[test]
    fn test_read_missing_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal: JsonlJournal<ExerciseSession> =
            JsonlJournal::new(temp_dir.path().join("nonexistent.jsonl"));

        let records = journal.read_all().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sessions.jsonl");

        let journal = JsonlJournal::new(&path);
        journal.append(&create_test_session()).unwrap();

        // Inject a corrupt line between valid ones
        {
            use std::io::Write;
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{ not valid json").unwrap();
        }
        journal.append(&create_test_session()).unwrap();

        let records = journal.read_all().unwrap();
        assert_eq!(records.len(), 2);
    }
}

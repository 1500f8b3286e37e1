//! CSV rollup functionality for archiving journaled sessions.
//!
//! This module implements atomic journal-to-CSV conversion with proper
//! error handling to prevent data loss. Derived metrics travel into the
//! archive; raw set data stays in the journal only.

use crate::{ExerciseSession, JsonlJournal, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    user: String,
    exercise_id: String,
    workout_id: Option<String>,
    performed_at: String,
    set_count: usize,
    total_volume: f64,
    max_weight: f64,
    total_reps: u32,
}

impl From<&ExerciseSession> for CsvRow {
    fn from(session: &ExerciseSession) -> Self {
        CsvRow {
            id: session.id.to_string(),
            user: session.user.to_string(),
            exercise_id: session.exercise_id.clone(),
            workout_id: session.workout_id.map(|id| id.to_string()),
            performed_at: session.performed_at.to_rfc3339(),
            set_count: session.sets.len(),
            total_volume: session.metrics.total_volume,
            max_weight: session.metrics.max_weight,
            total_reps: session.metrics.total_reps,
        }
    }
}

/// Roll up journaled sessions into CSV and archive the journal atomically
///
/// This function:
/// 1. Reads all sessions from the journal
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the journal to .processed
/// 5. Returns the number of sessions processed
///
/// # Safety
/// - CSV is fsynced before the journal is renamed
/// - The journal is renamed (not deleted) to allow manual recovery if needed
/// - Processed journal files can be cleaned up separately
pub fn journal_to_csv_and_archive(journal_path: &Path, csv_path: &Path) -> Result<usize> {
    let journal: JsonlJournal<ExerciseSession> = JsonlJournal::new(journal_path);
    let sessions = journal.read_all()?;

    if sessions.is_empty() {
        tracing::info!("No sessions in journal to roll up");
        return Ok(0);
    }

    // Ensure parent directory exists
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Open CSV file for appending
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Determine if we need to write headers by checking file size after opening
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for session in &sessions {
        let row = CsvRow::from(session);
        writer.serialize(row)?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} sessions to CSV", sessions.len());

    // Atomically archive the journal by renaming it
    let processed_path = journal_path.with_extension("jsonl.processed");
    std::fs::rename(journal_path, &processed_path)?;

    tracing::info!("Archived journal to {:?}", processed_path);

    Ok(sessions.len())
}

/// Clean up old processed journal files
///
/// This removes all .processed files in the given directory.
pub fn cleanup_processed_journals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "processed" {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed processed journal: {:?}", path);
                count += 1;
            }
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed journal files", count);
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metrics, SetEntry};
    use chrono::Utc;
    use std::fs::File;
    use uuid::Uuid;

    fn create_test_session(exercise: &str) -> ExerciseSession {
        let mut session = ExerciseSession {
            id: Uuid::new_v4(),
            user: Uuid::new_v4(),
            exercise_id: exercise.into(),
            workout_id: None,
            performed_at: Utc::now(),
            sets: vec![SetEntry {
                set_number: 1,
                reps: 10,
                weight: 60.0,
                duration_seconds: None,
                rest_seconds: 60,
                completed: true,
                notes: None,
            }],
            metrics: Default::default(),
        };
        metrics::finalize_session(&mut session).unwrap();
        session
    }

    #[test]
    fn test_journal_to_csv_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("sessions.jsonl");
        let csv_path = temp_dir.path().join("sessions.csv");

        let journal = JsonlJournal::new(&journal_path);
        for i in 0..3 {
            journal
                .append(&create_test_session(&format!("exercise_{}", i)))
                .unwrap();
        }

        let count = journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();
        assert_eq!(count, 3);

        // Verify CSV exists
        assert!(csv_path.exists());

        // Verify journal was archived
        assert!(!journal_path.exists());
        assert!(journal_path.with_extension("jsonl.processed").exists());
    }

    #[test]
    fn test_journal_to_csv_appends() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("sessions.jsonl");
        let csv_path = temp_dir.path().join("sessions.csv");

        // First rollup
        let journal = JsonlJournal::new(&journal_path);
        journal.append(&create_test_session("bench_press")).unwrap();
        let count1 = journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();
        assert_eq!(count1, 1);

        // Second rollup (appends)
        let journal = JsonlJournal::new(&journal_path);
        journal.append(&create_test_session("deadlift")).unwrap();
        let count2 = journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();
        assert_eq!(count2, 1);

        // Verify CSV has both entries
        let reader = csv::Reader::from_path(&csv_path).unwrap();
        let record_count = reader.into_records().count();
        assert_eq!(record_count, 2);
    }

    #[test]
    fn test_empty_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("empty.jsonl");
        let csv_path = temp_dir.path().join("sessions.csv");

        File::create(&journal_path).unwrap();

        let count = journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_cleanup_processed_journals() {
        let temp_dir = tempfile::tempdir().unwrap();

        File::create(temp_dir.path().join("s1.jsonl.processed")).unwrap();
        File::create(temp_dir.path().join("s2.jsonl.processed")).unwrap();
        File::create(temp_dir.path().join("keep.jsonl")).unwrap();

        let count = cleanup_processed_journals(temp_dir.path()).unwrap();
        assert_eq!(count, 2);

        assert!(!temp_dir.path().join("s1.jsonl.processed").exists());
        assert!(!temp_dir.path().join("s2.jsonl.processed").exists());
        assert!(temp_dir.path().join("keep.jsonl").exists());
    }
}

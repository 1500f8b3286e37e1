//! Exercise session history store.
//!
//! The `HistoryStore` trait is the read surface every other component
//! queries: windowed range queries, personal records, and workout counts.
//! The file-backed implementation merges the live journal with the CSV
//! archive, deduplicating sessions that appear in both.

use crate::{metrics, Error, ExerciseSession, JsonlJournal, Result, SessionMetrics};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Read/append surface over persisted session records.
///
/// Reads are shared by every evaluation; writes happen only through
/// `log_session`, which revalidates and rederives metrics first.
pub trait HistoryStore: Send + Sync {
    /// Validate, rederive metrics, and persist a session record
    fn log_session(&self, session: ExerciseSession) -> Result<ExerciseSession>;

    /// Session records for a user (optionally one exercise) since a date,
    /// ascending by date
    fn records_in_window(
        &self,
        user: Uuid,
        exercise: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<Vec<ExerciseSession>>;

    /// The record with the maximum `max_weight` for user+exercise.
    /// Ties are broken by the earliest date.
    fn personal_record(&self, user: Uuid, exercise: &str) -> Result<Option<ExerciseSession>>;

    /// Number of workout session records for a user since a date
    fn count_in_window(&self, user: Uuid, since: DateTime<Utc>) -> Result<u64>;
}

/// CSV row format for reading archived sessions
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    user: String,
    exercise_id: String,
    workout_id: Option<String>,
    performed_at: String,
    #[allow(dead_code)]
    set_count: usize,
    total_volume: f64,
    max_weight: f64,
    total_reps: u32,
}

impl TryFrom<CsvRow> for ExerciseSession {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;
        let user = Uuid::parse_str(&row.user)
            .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;

        let performed_at = DateTime::parse_from_rfc3339(&row.performed_at)
            .map_err(|e| Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        let workout_id = row
            .workout_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| Uuid::parse_str(s).ok());

        Ok(ExerciseSession {
            id,
            user,
            exercise_id: row.exercise_id,
            workout_id,
            performed_at,
            sets: vec![], // Raw sets are not archived in CSV
            metrics: SessionMetrics {
                total_volume: row.total_volume,
                max_weight: row.max_weight,
                total_reps: row.total_reps,
            },
        })
    }
}

/// File-backed history store: live JSONL journal plus CSV archive
pub struct FileHistoryStore {
    journal: JsonlJournal<ExerciseSession>,
    csv_path: PathBuf,
}

impl FileHistoryStore {
    pub fn open(journal_path: impl Into<PathBuf>, csv_path: impl Into<PathBuf>) -> Self {
        Self {
            journal: JsonlJournal::new(journal_path),
            csv_path: csv_path.into(),
        }
    }

    /// Load every session from journal and archive, deduplicated by id.
    ///
    /// The journal is read first so the freshest copy of a session wins.
    fn load_all(&self) -> Result<Vec<ExerciseSession>> {
        let mut sessions = Vec::new();
        let mut seen_ids = HashSet::new();

        for session in self.journal.read_all()? {
            seen_ids.insert(session.id);
            sessions.push(session);
        }

        if self.csv_path.exists() {
            let mut csv_count = 0;
            for session in load_sessions_from_csv(&self.csv_path)? {
                if !seen_ids.contains(&session.id) {
                    seen_ids.insert(session.id);
                    sessions.push(session);
                    csv_count += 1;
                }
            }
            tracing::debug!("Loaded {} archived sessions from CSV", csv_count);
        }

        Ok(sessions)
    }
}

impl HistoryStore for FileHistoryStore {
    fn log_session(&self, mut session: ExerciseSession) -> Result<ExerciseSession> {
        metrics::finalize_session(&mut session)?;
        self.journal.append(&session)?;
        tracing::debug!("Logged session {} for {}", session.id, session.exercise_id);
        Ok(session)
    }

    fn records_in_window(
        &self,
        user: Uuid,
        exercise: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<Vec<ExerciseSession>> {
        let mut records: Vec<_> = self
            .load_all()?
            .into_iter()
            .filter(|s| s.user == user)
            .filter(|s| exercise.map_or(true, |e| s.exercise_id == e))
            .filter(|s| s.performed_at >= since)
            .collect();

        records.sort_by(|a, b| a.performed_at.cmp(&b.performed_at));
        Ok(records)
    }

    fn personal_record(&self, user: Uuid, exercise: &str) -> Result<Option<ExerciseSession>> {
        let mut best: Option<ExerciseSession> = None;

        for session in self.load_all()? {
            if session.user != user || session.exercise_id != exercise {
                continue;
            }
            let replace = match &best {
                None => true,
                Some(current) => {
                    session.metrics.max_weight > current.metrics.max_weight
                        || (session.metrics.max_weight == current.metrics.max_weight
                            && session.performed_at < current.performed_at)
                }
            };
            if replace {
                best = Some(session);
            }
        }

        Ok(best)
    }

    fn count_in_window(&self, user: Uuid, since: DateTime<Utc>) -> Result<u64> {
        let count = self
            .load_all()?
            .into_iter()
            .filter(|s| s.user == user && s.performed_at >= since)
            .count();
        Ok(count as u64)
    }
}

/// Load all sessions from a CSV archive file
fn load_sessions_from_csv(path: &Path) -> Result<Vec<ExerciseSession>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut sessions = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match ExerciseSession::try_from(row) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                    // Continue processing other rows
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(sessions)
}

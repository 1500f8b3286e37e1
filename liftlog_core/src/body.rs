//! Weight and body-measurement sample store.
//!
//! Weight-change and measurement-reach conditions read from here; samples
//! arrive through the same validated write boundary as sessions.

use crate::{metrics, BodyMetricSample, JsonlJournal, MeasurementType, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use uuid::Uuid;

/// Read/append surface over persisted body metric samples
pub trait BodyMetricStore: Send + Sync {
    /// Validate and persist a sample
    fn log_sample(&self, sample: BodyMetricSample) -> Result<()>;

    /// Weight samples for a user since a date, ascending by date
    fn weight_samples_in_window(
        &self,
        user: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, f64)>>;

    /// Most recently recorded value for one measurement site
    fn latest_measurement(&self, user: Uuid, kind: MeasurementType) -> Result<Option<f64>>;
}

/// JSONL-backed body metric store
pub struct FileBodyMetricStore {
    journal: JsonlJournal<BodyMetricSample>,
}

impl FileBodyMetricStore {
    pub fn open(journal_path: impl Into<PathBuf>) -> Self {
        Self {
            journal: JsonlJournal::new(journal_path),
        }
    }
}

impl BodyMetricStore for FileBodyMetricStore {
    fn log_sample(&self, sample: BodyMetricSample) -> Result<()> {
        metrics::validate_body_sample(&sample)?;
        self.journal.append(&sample)?;
        tracing::debug!("Logged body metric sample {} for {}", sample.id, sample.user);
        Ok(())
    }

    fn weight_samples_in_window(
        &self,
        user: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, f64)>> {
        let mut samples: Vec<_> = self
            .journal
            .read_all()?
            .into_iter()
            .filter(|s| s.user == user && s.recorded_at >= since)
            .filter_map(|s| s.weight_kg.map(|kg| (s.recorded_at, kg)))
            .collect();

        samples.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(samples)
    }

    fn latest_measurement(&self, user: Uuid, kind: MeasurementType) -> Result<Option<f64>> {
        let latest = self
            .journal
            .read_all()?
            .into_iter()
            .filter(|s| s.user == user)
            .filter_map(|s| s.measurements_cm.get(&kind).copied().map(|v| (s.recorded_at, v)))
            .max_by_key(|(at, _)| *at)
            .map(|(_, value)| value);

        Ok(latest)
    }
}

//! Progress trend aggregation over session history.
//!
//! Sessions are partitioned into UTC calendar-day buckets over a trailing
//! window. Days with no records are not emitted: callers that need streak
//! continuity must reason about the gaps themselves.

use crate::{HistoryStore, Result, TrendPoint};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Daily trend series for a user over a trailing window.
///
/// `exercise` of `None` means all exercises. Returns an ascending,
/// sparse sequence; no records means an empty series.
pub fn daily_trend(
    store: &dyn HistoryStore,
    user: Uuid,
    exercise: Option<&str>,
    window_days: i64,
    now: DateTime<Utc>,
) -> Result<Vec<TrendPoint>> {
    let since = now - Duration::days(window_days);
    let records = store.records_in_window(user, exercise, since)?;

    let mut buckets: BTreeMap<NaiveDate, TrendPoint> = BTreeMap::new();

    for record in records {
        let day = record.performed_at.date_naive();
        let point = buckets.entry(day).or_insert(TrendPoint {
            day,
            max_weight: 0.0,
            total_volume: 0.0,
            total_reps: 0,
        });

        if record.metrics.max_weight > point.max_weight {
            point.max_weight = record.metrics.max_weight;
        }
        point.total_volume += record.metrics.total_volume;
        point.total_reps += record.metrics.total_reps;
    }

    // BTreeMap iteration is already chronological
    Ok(buckets.into_values().collect())
}

/// The set of UTC calendar days on which the user logged at least one
/// session since `since`. Streak evaluation walks this set.
pub fn workout_days(
    store: &dyn HistoryStore,
    user: Uuid,
    since: DateTime<Utc>,
) -> Result<BTreeSet<NaiveDate>> {
    let records = store.records_in_window(user, None, since)?;
    Ok(records
        .into_iter()
        .map(|r| r.performed_at.date_naive())
        .collect())
}

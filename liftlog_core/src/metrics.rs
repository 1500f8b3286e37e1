//! Derivation of session metrics from raw set data.
//!
//! Derived fields are computed here and only here: client-supplied values
//! are discarded and recomputed before anything reaches persistence.

use crate::{BodyMetricSample, Error, ExerciseSession, Result, SessionMetrics, SetEntry};

const MAX_REPS: u32 = 1000;
const MAX_WEIGHT_KG: f64 = 1000.0;
const MAX_DURATION_SECONDS: u32 = 600;
const MAX_REST_SECONDS: u32 = 300;
const MAX_NOTES_LEN: usize = 500;
const MIN_BODY_WEIGHT_KG: f64 = 30.0;
const MAX_BODY_WEIGHT_KG: f64 = 300.0;

/// Compute {total_volume, max_weight, total_reps} for a set list.
///
/// An empty set list is the zero aggregate by definition, not the result
/// of folding a maximum over an empty collection.
pub fn derive_metrics(sets: &[SetEntry]) -> SessionMetrics {
    if sets.is_empty() {
        return SessionMetrics::default();
    }

    let mut total_volume = 0.0;
    let mut max_weight = 0.0_f64;
    let mut total_reps = 0_u32;

    for set in sets {
        total_volume += set.weight * f64::from(set.reps);
        if set.weight > max_weight {
            max_weight = set.weight;
        }
        total_reps += set.reps;
    }

    SessionMetrics {
        total_volume,
        max_weight,
        total_reps,
    }
}

/// Validate a set list against the write-boundary field constraints
pub fn validate_sets(sets: &[SetEntry]) -> Result<()> {
    for set in sets {
        if set.reps > MAX_REPS {
            return Err(Error::Validation(format!(
                "set {}: reps {} exceeds maximum of {}",
                set.set_number, set.reps, MAX_REPS
            )));
        }
        if !set.weight.is_finite() || set.weight < 0.0 || set.weight > MAX_WEIGHT_KG {
            return Err(Error::Validation(format!(
                "set {}: weight {} is outside 0..={} kg",
                set.set_number, set.weight, MAX_WEIGHT_KG
            )));
        }
        if let Some(duration) = set.duration_seconds {
            if duration > MAX_DURATION_SECONDS {
                return Err(Error::Validation(format!(
                    "set {}: duration {}s exceeds maximum of {}s",
                    set.set_number, duration, MAX_DURATION_SECONDS
                )));
            }
        }
        if set.rest_seconds > MAX_REST_SECONDS {
            return Err(Error::Validation(format!(
                "set {}: rest {}s exceeds maximum of {}s",
                set.set_number, set.rest_seconds, MAX_REST_SECONDS
            )));
        }
        if let Some(ref notes) = set.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(Error::Validation(format!(
                    "set {}: notes exceed {} characters",
                    set.set_number, MAX_NOTES_LEN
                )));
            }
        }
    }
    Ok(())
}

/// Validate a session and recompute its derived metrics in place.
///
/// Every persistence path calls this first, so stored metrics always
/// reflect the stored sets.
pub fn finalize_session(session: &mut ExerciseSession) -> Result<()> {
    if session.exercise_id.trim().is_empty() {
        return Err(Error::Validation("session has no exercise reference".into()));
    }
    validate_sets(&session.sets)?;
    session.metrics = derive_metrics(&session.sets);
    Ok(())
}

/// Validate a body metric sample against its write-boundary ranges
pub fn validate_body_sample(sample: &BodyMetricSample) -> Result<()> {
    if let Some(weight) = sample.weight_kg {
        if !weight.is_finite() || !(MIN_BODY_WEIGHT_KG..=MAX_BODY_WEIGHT_KG).contains(&weight) {
            return Err(Error::Validation(format!(
                "body weight {} kg is outside {}..={} kg",
                weight, MIN_BODY_WEIGHT_KG, MAX_BODY_WEIGHT_KG
            )));
        }
    }
    for (kind, value) in &sample.measurements_cm {
        let (min, max) = kind.valid_range();
        if !value.is_finite() || *value < min || *value > max {
            return Err(Error::Validation(format!(
                "{:?} measurement {} cm is outside {}..={} cm",
                kind, value, min, max
            )));
        }
    }
    if sample.weight_kg.is_none() && sample.measurements_cm.is_empty() {
        return Err(Error::Validation(
            "body metric sample carries no weight and no measurements".into(),
        ));
    }
    Ok(())
}

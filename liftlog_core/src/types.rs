//! Core domain types for the liftlog fitness tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercise sessions and their raw set data
//! - Derived session metrics
//! - Achievements, unlock conditions, and rewards
//! - Unlock records and body metric samples
//! - Trend series points

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// Session Types
// ============================================================================

/// One set within a logged exercise session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetEntry {
    pub set_number: u32,
    pub reps: u32,
    /// Weight in kg; 0 for bodyweight work
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default = "default_rest_seconds")]
    pub rest_seconds: u32,
    #[serde(default = "default_completed")]
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_rest_seconds() -> u32 {
    60
}

fn default_completed() -> bool {
    true
}

/// Metrics derived from a session's set list.
///
/// Never accepted from callers: always recomputed from `sets` before a
/// session is persisted. An empty set list yields the zero aggregate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub total_volume: f64,
    pub max_weight: f64,
    pub total_reps: u32,
}

/// One logged exercise occurrence with its sets
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseSession {
    pub id: Uuid,
    pub user: Uuid,
    pub exercise_id: String,
    #[serde(default)]
    pub workout_id: Option<Uuid>,
    pub performed_at: DateTime<Utc>,
    pub sets: Vec<SetEntry>,
    #[serde(default)]
    pub metrics: SessionMetrics,
}

// ============================================================================
// Achievement Types
// ============================================================================

/// Catalog grouping for an achievement
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Workout,
    Streak,
    Weight,
    Measurement,
    Strength,
    Nutrition,
    Social,
    Special,
}

/// Descriptive rarity tier; no behavioral effect
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Default for Rarity {
    fn default() -> Self {
        Rarity::Common
    }
}

/// Discriminant selecting which unlock rule applies
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    WorkoutCount,
    WorkoutStreak,
    WeightLoss,
    WeightGain,
    MeasurementReach,
    StrengthRecord,
    NutritionGoal,
    PerfectWeek,
    EarlyBird,
    SocialConnection,
}

/// Body measurement site
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementType {
    Chest,
    Waist,
    Hips,
    Biceps,
    Thighs,
    Calves,
    Neck,
    Shoulders,
}

impl MeasurementType {
    /// Accepted range in cm, enforced at the write boundary
    pub fn valid_range(self) -> (f64, f64) {
        match self {
            MeasurementType::Chest
            | MeasurementType::Waist
            | MeasurementType::Hips
            | MeasurementType::Shoulders => (50.0, 200.0),
            MeasurementType::Biceps | MeasurementType::Calves | MeasurementType::Neck => {
                (20.0, 100.0)
            }
            MeasurementType::Thighs => (30.0, 150.0),
        }
    }
}

/// Declarative unlock condition attached to an achievement
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnlockCondition {
    pub kind: ConditionKind,
    /// Numeric threshold; meaning depends on `kind` (count, days, kg, ...)
    pub target: f64,
    /// Trailing window in days; absent means "all history"
    #[serde(default)]
    pub timeframe_days: Option<i64>,
    #[serde(default)]
    pub exercise_id: Option<String>,
    #[serde(default)]
    pub measurement_type: Option<MeasurementType>,
    #[serde(default)]
    pub measurement_value: Option<f64>,
}

/// Rewards granted exactly once on first unlock
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Rewards {
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub experience: u64,
    /// Unlockable cosmetic clothing item ids
    #[serde(default)]
    pub clothing: Vec<String>,
    /// Unlockable character variant ids
    #[serde(default)]
    pub characters: Vec<String>,
}

/// A catalog entry, created and toggled by operators, not end users
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: AchievementCategory,
    #[serde(default)]
    pub rarity: Rarity,
    pub condition: UnlockCondition,
    #[serde(default)]
    pub rewards: Rewards,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Append-only audit of a first-time unlock.
///
/// At most one record may exist per (user, achievement) pair; the unlock
/// ledger enforces this, and it is the sole at-most-once authority.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UnlockRecord {
    pub user: Uuid,
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
}

// ============================================================================
// Body Metric Types
// ============================================================================

/// One logged weight and/or body-measurement sample
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BodyMetricSample {
    pub id: Uuid,
    pub user: Uuid,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub measurements_cm: BTreeMap<MeasurementType, f64>,
}

// ============================================================================
// Trend and Event Types
// ============================================================================

/// One calendar-day bucket in a progress trend series
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub day: NaiveDate,
    pub max_weight: f64,
    pub total_volume: f64,
    pub total_reps: u32,
}

/// Category of the event that triggers an unlock evaluation pass
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    WorkoutLogged,
    WeightLogged,
    MeasurementLogged,
    NutritionLogged,
    SocialAction,
}

impl TriggerEvent {
    /// Fixed mapping from trigger events to the achievement categories
    /// eligible for evaluation on that event.
    pub fn eligible_categories(self) -> &'static [AchievementCategory] {
        use AchievementCategory::*;
        match self {
            TriggerEvent::WorkoutLogged => &[Workout, Streak, Strength, Special],
            TriggerEvent::WeightLogged => &[Weight],
            TriggerEvent::MeasurementLogged => &[Measurement],
            TriggerEvent::NutritionLogged => &[Nutrition],
            TriggerEvent::SocialAction => &[Social],
        }
    }
}

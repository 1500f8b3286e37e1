//! Achievement condition evaluation.
//!
//! Every condition kind is an independent strategy behind the
//! `ConditionStrategy` trait; the evaluator dispatches through a
//! kind-to-strategy table built once at startup. Adding a kind means
//! registering a new strategy, not editing existing ones.
//!
//! Evaluation rules, common to all strategies:
//! - Absent historical data evaluates to `false`, never to an error.
//! - A strategy error means "not unlockable this pass"; the caller
//!   retries on the next triggering event.

use crate::{
    trend, BodyMetricStore, ConditionKind, Error, HistoryStore, Result, UnlockCondition,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Everything a strategy may consult. Stores are injected, never pulled
/// from a global registry.
#[derive(Clone)]
pub struct EvalContext {
    pub now: DateTime<Utc>,
    pub history: Arc<dyn HistoryStore>,
    pub body: Arc<dyn BodyMetricStore>,
    /// Trailing window for weight-change conditions, in days
    pub weight_window_days: i64,
}

/// One unlock rule, independently testable and swappable
pub trait ConditionStrategy: Send + Sync {
    fn evaluate(&self, condition: &UnlockCondition, user: Uuid, ctx: &EvalContext)
        -> Result<bool>;
}

/// Kind-to-strategy dispatch table, resolved once at startup
pub struct ConditionEvaluator {
    strategies: HashMap<ConditionKind, Box<dyn ConditionStrategy>>,
}

impl ConditionEvaluator {
    /// Build the evaluator with every built-in strategy registered.
    ///
    /// The three kinds without a concrete rule yet (nutrition_goal,
    /// early_bird, social_connection) get an explicit always-false
    /// strategy so no dispatch default can silently swallow them.
    pub fn new() -> Self {
        let mut evaluator = Self {
            strategies: HashMap::new(),
        };

        evaluator.register(ConditionKind::WorkoutCount, Box::new(WorkoutCount));
        evaluator.register(ConditionKind::WorkoutStreak, Box::new(WorkoutStreak));
        evaluator.register(ConditionKind::WeightLoss, Box::new(WeightLoss));
        evaluator.register(ConditionKind::WeightGain, Box::new(WeightGain));
        evaluator.register(ConditionKind::MeasurementReach, Box::new(MeasurementReach));
        evaluator.register(ConditionKind::StrengthRecord, Box::new(StrengthRecord));
        evaluator.register(ConditionKind::PerfectWeek, Box::new(PerfectWeek));
        evaluator.register(
            ConditionKind::NutritionGoal,
            Box::new(NotYetDefined("nutrition_goal")),
        );
        evaluator.register(
            ConditionKind::EarlyBird,
            Box::new(NotYetDefined("early_bird")),
        );
        evaluator.register(
            ConditionKind::SocialConnection,
            Box::new(NotYetDefined("social_connection")),
        );

        evaluator
    }

    /// Register (or replace) the strategy for a condition kind
    pub fn register(&mut self, kind: ConditionKind, strategy: Box<dyn ConditionStrategy>) {
        self.strategies.insert(kind, strategy);
    }

    /// Resolve the condition's kind and evaluate it for the user
    pub fn evaluate(
        &self,
        condition: &UnlockCondition,
        user: Uuid,
        ctx: &EvalContext,
    ) -> Result<bool> {
        let strategy = self.strategies.get(&condition.kind).ok_or_else(|| {
            Error::Evaluation(format!("no strategy registered for {:?}", condition.kind))
        })?;
        strategy.evaluate(condition, user, ctx)
    }
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// `workout_count`: at least `target` workouts since now − timeframe
/// (all history when no timeframe is set)
struct WorkoutCount;

impl ConditionStrategy for WorkoutCount {
    fn evaluate(
        &self,
        condition: &UnlockCondition,
        user: Uuid,
        ctx: &EvalContext,
    ) -> Result<bool> {
        let since = match condition.timeframe_days {
            Some(days) => ctx.now - Duration::days(days),
            None => DateTime::<Utc>::UNIX_EPOCH,
        };
        let count = ctx.history.count_in_window(user, since)?;
        Ok(count as f64 >= condition.target)
    }
}

/// `workout_streak`: at least `target` consecutive calendar days with a
/// workout, and the streak's last day is today or yesterday. A streak
/// broken earlier than yesterday does not count, however long it was.
struct WorkoutStreak;

impl ConditionStrategy for WorkoutStreak {
    fn evaluate(
        &self,
        condition: &UnlockCondition,
        user: Uuid,
        ctx: &EvalContext,
    ) -> Result<bool> {
        let target = condition.target.ceil() as i64;
        if target <= 0 {
            return Ok(false);
        }

        // One day of slack past the target covers a streak ending yesterday
        let since = ctx.now - Duration::days(target + 1);
        let days = trend::workout_days(&*ctx.history, user, since)?;

        let today = ctx.now.date_naive();
        let yesterday = match today.pred_opt() {
            Some(day) => day,
            None => return Ok(false),
        };

        let mut cursor = if days.contains(&today) {
            today
        } else if days.contains(&yesterday) {
            yesterday
        } else {
            return Ok(false);
        };

        let mut length = 1_i64;
        while let Some(previous) = cursor.pred_opt() {
            if !days.contains(&previous) {
                break;
            }
            length += 1;
            cursor = previous;
        }

        Ok(length >= target)
    }
}

/// Shared lookup for the weight-change strategies: first and last weight
/// sample inside the trailing window, or None when there are no samples
fn weight_endpoints(user: Uuid, ctx: &EvalContext) -> Result<Option<(f64, f64)>> {
    let since = ctx.now - Duration::days(ctx.weight_window_days);
    let samples = ctx.body.weight_samples_in_window(user, since)?;
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => Ok(Some((first.1, last.1))),
        _ => Ok(None),
    }
}

/// `weight_loss`: earliest minus latest weight sample ≥ target kg
struct WeightLoss;

impl ConditionStrategy for WeightLoss {
    fn evaluate(
        &self,
        condition: &UnlockCondition,
        user: Uuid,
        ctx: &EvalContext,
    ) -> Result<bool> {
        match weight_endpoints(user, ctx)? {
            Some((initial, current)) => Ok(initial - current >= condition.target),
            None => Ok(false),
        }
    }
}

/// `weight_gain`: latest minus earliest weight sample ≥ target kg
struct WeightGain;

impl ConditionStrategy for WeightGain {
    fn evaluate(
        &self,
        condition: &UnlockCondition,
        user: Uuid,
        ctx: &EvalContext,
    ) -> Result<bool> {
        match weight_endpoints(user, ctx)? {
            Some((initial, current)) => Ok(current - initial >= condition.target),
            None => Ok(false),
        }
    }
}

/// `measurement_reach`: latest value for the condition's measurement
/// site ≥ its measurement target
struct MeasurementReach;

impl ConditionStrategy for MeasurementReach {
    fn evaluate(
        &self,
        condition: &UnlockCondition,
        user: Uuid,
        ctx: &EvalContext,
    ) -> Result<bool> {
        let (kind, goal) = match (condition.measurement_type, condition.measurement_value) {
            (Some(kind), Some(goal)) => (kind, goal),
            _ => {
                tracing::warn!("measurement_reach condition is missing its measurement fields");
                return Ok(false);
            }
        };
        match ctx.body.latest_measurement(user, kind)? {
            Some(value) => Ok(value >= goal),
            None => Ok(false),
        }
    }
}

/// `strength_record`: personal record max weight for the condition's
/// exercise ≥ target (inclusive)
struct StrengthRecord;

impl ConditionStrategy for StrengthRecord {
    fn evaluate(
        &self,
        condition: &UnlockCondition,
        user: Uuid,
        ctx: &EvalContext,
    ) -> Result<bool> {
        let exercise = match condition.exercise_id.as_deref() {
            Some(exercise) => exercise,
            None => {
                tracing::warn!("strength_record condition is missing its exercise reference");
                return Ok(false);
            }
        };
        match ctx.history.personal_record(user, exercise)? {
            Some(record) => Ok(record.metrics.max_weight >= condition.target),
            None => Ok(false),
        }
    }
}

/// `perfect_week`: at least 7 workouts in the trailing 7 days
struct PerfectWeek;

impl ConditionStrategy for PerfectWeek {
    fn evaluate(
        &self,
        _condition: &UnlockCondition,
        user: Uuid,
        ctx: &EvalContext,
    ) -> Result<bool> {
        let since = ctx.now - Duration::days(7);
        Ok(ctx.history.count_in_window(user, since)? >= 7)
    }
}

/// Placeholder for kinds whose concrete rule is not defined yet.
/// Deterministically false, never an error; first-class so a future
/// unhandled kind cannot hide behind a dispatch default.
struct NotYetDefined(&'static str);

impl ConditionStrategy for NotYetDefined {
    fn evaluate(
        &self,
        _condition: &UnlockCondition,
        _user: Uuid,
        _ctx: &EvalContext,
    ) -> Result<bool> {
        tracing::debug!("condition kind '{}' has no rule yet; not satisfied", self.0);
        Ok(false)
    }
}

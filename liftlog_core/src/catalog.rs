//! Achievement catalog: the built-in entries plus operator extensions.
//!
//! Catalog entries are created and toggled by operators, never by end
//! users, and are never removed while unlock records reference them.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<AchievementCatalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static AchievementCatalog {
    &DEFAULT_CATALOG
}

/// The complete catalog of achievements
#[derive(Clone, Debug, Default)]
pub struct AchievementCatalog {
    pub achievements: HashMap<String, Achievement>,
}

impl AchievementCatalog {
    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.achievements.get(id)
    }

    /// Active achievements whose category is in the given list, sorted
    /// by id for deterministic evaluation order
    pub fn active_in_categories(
        &self,
        categories: &[AchievementCategory],
    ) -> Vec<&Achievement> {
        let mut selected: Vec<_> = self
            .achievements
            .values()
            .filter(|a| a.active && categories.contains(&a.category))
            .collect();
        selected.sort_by(|a, b| a.id.cmp(&b.id));
        selected
    }

    /// Merge operator-defined achievements; an entry with an existing id
    /// replaces the built-in one
    pub fn merge_custom(&mut self, extra: Vec<Achievement>) {
        for achievement in extra {
            tracing::debug!("Merging operator achievement '{}'", achievement.id);
            self.achievements
                .insert(achievement.id.clone(), achievement);
        }
    }

    /// Validate the catalog, returning all problems found
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, achievement) in &self.achievements {
            if id != &achievement.id {
                errors.push(format!(
                    "Catalog key '{}' does not match achievement id '{}'",
                    id, achievement.id
                ));
            }
            if achievement.id.is_empty() {
                errors.push("Achievement with empty id".to_string());
            }
            if achievement.title.is_empty() {
                errors.push(format!("Achievement '{}' has empty title", id));
            }
            if achievement.description.is_empty() {
                errors.push(format!("Achievement '{}' has empty description", id));
            }

            let condition = &achievement.condition;
            if !condition.target.is_finite() || condition.target <= 0.0 {
                errors.push(format!(
                    "Achievement '{}': target {} must be a positive number",
                    id, condition.target
                ));
            }
            if let Some(days) = condition.timeframe_days {
                if days <= 0 {
                    errors.push(format!(
                        "Achievement '{}': timeframe {} days must be positive",
                        id, days
                    ));
                }
            }
            match condition.kind {
                ConditionKind::StrengthRecord => {
                    if condition.exercise_id.is_none() {
                        errors.push(format!(
                            "Achievement '{}': strength_record requires an exercise reference",
                            id
                        ));
                    }
                }
                ConditionKind::MeasurementReach => {
                    if condition.measurement_type.is_none()
                        || condition.measurement_value.is_none()
                    {
                        errors.push(format!(
                            "Achievement '{}': measurement_reach requires a measurement type and value",
                            id
                        ));
                    }
                }
                _ => {}
            }
        }

        errors
    }
}

/// Builds the default catalog of built-in achievements
///
/// **Note**: For production use, prefer `get_default_catalog()` which
/// returns a cached reference. This function is retained for testing and
/// custom catalog creation.
pub fn build_default_catalog() -> AchievementCatalog {
    build_default_catalog_internal()
}

fn entry(
    id: &str,
    title: &str,
    description: &str,
    category: AchievementCategory,
    rarity: Rarity,
    condition: UnlockCondition,
    rewards: Rewards,
) -> (String, Achievement) {
    (
        id.to_string(),
        Achievement {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            category,
            rarity,
            condition,
            rewards,
            active: true,
        },
    )
}

fn count_condition(target: f64, timeframe_days: Option<i64>) -> UnlockCondition {
    UnlockCondition {
        kind: ConditionKind::WorkoutCount,
        target,
        timeframe_days,
        exercise_id: None,
        measurement_type: None,
        measurement_value: None,
    }
}

fn build_default_catalog_internal() -> AchievementCatalog {
    let mut achievements = HashMap::new();

    let entries = [
        entry(
            "first_workout",
            "First Workout",
            "Complete your first workout",
            AchievementCategory::Workout,
            Rarity::Common,
            count_condition(1.0, None),
            Rewards {
                points: 50,
                experience: 25,
                clothing: vec![],
                characters: vec![],
            },
        ),
        entry(
            "workouts_10",
            "Ten Down",
            "Complete 10 workouts in total",
            AchievementCategory::Workout,
            Rarity::Common,
            count_condition(10.0, None),
            Rewards {
                points: 100,
                experience: 50,
                clothing: vec!["shirt_1".into()],
                characters: vec![],
            },
        ),
        entry(
            "workouts_50",
            "Regular",
            "Complete 50 workouts in total",
            AchievementCategory::Workout,
            Rarity::Rare,
            count_condition(50.0, None),
            Rewards {
                points: 300,
                experience: 150,
                clothing: vec!["shirt_2".into()],
                characters: vec!["athlete".into()],
            },
        ),
        entry(
            "workouts_100",
            "Centurion",
            "Complete 100 workouts in total",
            AchievementCategory::Workout,
            Rarity::Legendary,
            count_condition(100.0, None),
            Rewards {
                points: 1000,
                experience: 500,
                clothing: vec!["hat_3".into()],
                characters: vec!["bodybuilder".into()],
            },
        ),
        entry(
            "monthly_20",
            "Strong Month",
            "Complete 20 workouts within 30 days",
            AchievementCategory::Workout,
            Rarity::Epic,
            count_condition(20.0, Some(30)),
            Rewards {
                points: 400,
                experience: 200,
                clothing: vec!["accessory_1".into()],
                characters: vec![],
            },
        ),
        entry(
            "streak_7",
            "Seven Day Streak",
            "Train seven days in a row",
            AchievementCategory::Streak,
            Rarity::Rare,
            UnlockCondition {
                kind: ConditionKind::WorkoutStreak,
                target: 7.0,
                timeframe_days: None,
                exercise_id: None,
                measurement_type: None,
                measurement_value: None,
            },
            Rewards {
                points: 150,
                experience: 75,
                clothing: vec![],
                characters: vec![],
            },
        ),
        entry(
            "streak_30",
            "Thirty Day Streak",
            "Train thirty days in a row",
            AchievementCategory::Streak,
            Rarity::Epic,
            UnlockCondition {
                kind: ConditionKind::WorkoutStreak,
                target: 30.0,
                timeframe_days: None,
                exercise_id: None,
                measurement_type: None,
                measurement_value: None,
            },
            Rewards {
                points: 500,
                experience: 250,
                clothing: vec![],
                characters: vec!["ninja".into()],
            },
        ),
        entry(
            "weight_loss_5",
            "Five Kilos Down",
            "Lose 5 kg from your starting weight",
            AchievementCategory::Weight,
            Rarity::Rare,
            UnlockCondition {
                kind: ConditionKind::WeightLoss,
                target: 5.0,
                timeframe_days: None,
                exercise_id: None,
                measurement_type: None,
                measurement_value: None,
            },
            Rewards {
                points: 200,
                experience: 100,
                clothing: vec![],
                characters: vec![],
            },
        ),
        entry(
            "weight_loss_10",
            "Ten Kilos Down",
            "Lose 10 kg from your starting weight",
            AchievementCategory::Weight,
            Rarity::Epic,
            UnlockCondition {
                kind: ConditionKind::WeightLoss,
                target: 10.0,
                timeframe_days: None,
                exercise_id: None,
                measurement_type: None,
                measurement_value: None,
            },
            Rewards {
                points: 400,
                experience: 200,
                clothing: vec![],
                characters: vec!["runner".into()],
            },
        ),
        entry(
            "biceps_40",
            "Forty Centimetres",
            "Reach a 40 cm biceps measurement",
            AchievementCategory::Measurement,
            Rarity::Rare,
            UnlockCondition {
                kind: ConditionKind::MeasurementReach,
                target: 40.0,
                timeframe_days: None,
                exercise_id: None,
                measurement_type: Some(MeasurementType::Biceps),
                measurement_value: Some(40.0),
            },
            Rewards {
                points: 200,
                experience: 100,
                clothing: vec![],
                characters: vec![],
            },
        ),
        entry(
            "bench_100",
            "Century Press",
            "Bench press 100 kg",
            AchievementCategory::Strength,
            Rarity::Epic,
            UnlockCondition {
                kind: ConditionKind::StrengthRecord,
                target: 100.0,
                timeframe_days: None,
                exercise_id: Some("bench_press".into()),
                measurement_type: None,
                measurement_value: None,
            },
            Rewards {
                points: 300,
                experience: 150,
                clothing: vec![],
                characters: vec!["warrior".into()],
            },
        ),
        entry(
            "perfect_week",
            "Perfect Week",
            "Train every day of the week",
            AchievementCategory::Special,
            Rarity::Rare,
            UnlockCondition {
                kind: ConditionKind::PerfectWeek,
                target: 7.0,
                timeframe_days: Some(7),
                exercise_id: None,
                measurement_type: None,
                measurement_value: None,
            },
            Rewards {
                points: 150,
                experience: 100,
                clothing: vec![],
                characters: vec![],
            },
        ),
        entry(
            "early_bird",
            "Early Bird",
            "Train before 7 AM on five days",
            AchievementCategory::Special,
            Rarity::Epic,
            UnlockCondition {
                kind: ConditionKind::EarlyBird,
                target: 5.0,
                timeframe_days: Some(30),
                exercise_id: None,
                measurement_type: None,
                measurement_value: None,
            },
            Rewards {
                points: 250,
                experience: 125,
                clothing: vec!["hat_1".into()],
                characters: vec![],
            },
        ),
    ];

    for (id, achievement) in entries {
        achievements.insert(id, achievement);
    }

    AchievementCatalog { achievements }
}

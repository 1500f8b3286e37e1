use clap::{Parser, Subcommand};
use liftlog_core::*;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Exercise progress and achievement tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Acting user id (defaults to the local profile)
    #[arg(long, global = true)]
    user: Option<Uuid>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log an exercise session and run achievement checks
    Log {
        /// Exercise id (e.g. bench_press)
        #[arg(long)]
        exercise: String,

        /// One set as REPS or REPSxWEIGHT, repeatable (e.g. --set 10x60)
        #[arg(long = "set", required = true)]
        sets: Vec<String>,

        /// Workout this session belongs to
        #[arg(long)]
        workout: Option<Uuid>,
    },

    /// Log a body weight sample and run achievement checks
    Weigh {
        /// Body weight in kg
        #[arg(long)]
        kg: f64,
    },

    /// Log a body measurement and run achievement checks
    Measure {
        /// Measurement site (chest, waist, hips, biceps, thighs, calves, neck, shoulders)
        #[arg(long)]
        kind: String,

        /// Measured value in cm
        #[arg(long)]
        value: f64,
    },

    /// Show the daily progress trend
    Trend {
        /// Restrict to one exercise
        #[arg(long)]
        exercise: Option<String>,

        /// Trailing window in days
        #[arg(long, default_value_t = 30)]
        days: i64,
    },

    /// Show the personal record for an exercise
    Pr {
        #[arg(long)]
        exercise: String,
    },

    /// List achievements, unlocks, and reward totals
    Achievements,

    /// Roll up the session journal to CSV
    Rollup {
        /// Clean up processed journal files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    liftlog_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    // Single local profile unless --user is given
    let user = cli.user.unwrap_or_else(Uuid::nil);

    match cli.command {
        Commands::Log {
            exercise,
            sets,
            workout,
        } => cmd_log(&data_dir, user, exercise, &sets, workout, &config),
        Commands::Weigh { kg } => cmd_weigh(&data_dir, user, kg, &config),
        Commands::Measure { kind, value } => cmd_measure(&data_dir, user, &kind, value, &config),
        Commands::Trend { exercise, days } => cmd_trend(&data_dir, user, exercise, days),
        Commands::Pr { exercise } => cmd_pr(&data_dir, user, &exercise),
        Commands::Achievements => cmd_achievements(&data_dir, user, &config),
        Commands::Rollup { cleanup } => cmd_rollup(&data_dir, cleanup),
    }
}

fn session_journal_path(data_dir: &Path) -> PathBuf {
    data_dir.join("journal").join("sessions.jsonl")
}

fn open_history(data_dir: &Path) -> FileHistoryStore {
    FileHistoryStore::open(session_journal_path(data_dir), data_dir.join("sessions.csv"))
}

fn open_body(data_dir: &Path) -> FileBodyMetricStore {
    FileBodyMetricStore::open(data_dir.join("journal").join("body_metrics.jsonl"))
}

/// Run an unlock pass after a triggering write has committed.
///
/// Evaluation failure never fails the triggering command: the logged
/// record stands, and the unlock is retried on a later event.
fn run_unlock_pass(data_dir: &Path, user: Uuid, event: TriggerEvent, config: &Config) {
    let engine = match build_file_engine(data_dir, config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Achievement engine unavailable: {}", e);
            return;
        }
    };

    match engine.on_event(user, event) {
        Ok(unlocked) => display_unlocked(&unlocked),
        Err(e) => {
            eprintln!(
                "Achievement evaluation failed (will retry on the next event): {}",
                e
            );
        }
    }
}

fn cmd_log(
    data_dir: &Path,
    user: Uuid,
    exercise: String,
    set_specs: &[String],
    workout: Option<Uuid>,
    config: &Config,
) -> Result<()> {
    let history = open_history(data_dir);
    let sets = parse_sets(set_specs)?;

    let session = history.log_session(ExerciseSession {
        id: Uuid::new_v4(),
        user,
        exercise_id: exercise,
        workout_id: workout,
        performed_at: chrono::Utc::now(),
        sets,
        metrics: Default::default(),
    })?;

    println!(
        "✓ Logged {}: {} sets, volume {:.1} kg, top set {:.1} kg",
        session.exercise_id,
        session.sets.len(),
        session.metrics.total_volume,
        session.metrics.max_weight
    );

    run_unlock_pass(data_dir, user, TriggerEvent::WorkoutLogged, config);
    Ok(())
}

fn cmd_weigh(data_dir: &Path, user: Uuid, kg: f64, config: &Config) -> Result<()> {
    let body = open_body(data_dir);
    body.log_sample(BodyMetricSample {
        id: Uuid::new_v4(),
        user,
        recorded_at: chrono::Utc::now(),
        weight_kg: Some(kg),
        measurements_cm: Default::default(),
    })?;

    println!("✓ Logged body weight: {:.1} kg", kg);

    run_unlock_pass(data_dir, user, TriggerEvent::WeightLogged, config);
    Ok(())
}

fn cmd_measure(
    data_dir: &Path,
    user: Uuid,
    kind: &str,
    value: f64,
    config: &Config,
) -> Result<()> {
    let kind = parse_measurement_kind(kind)?;

    let body = open_body(data_dir);
    let mut measurements = std::collections::BTreeMap::new();
    measurements.insert(kind, value);
    body.log_sample(BodyMetricSample {
        id: Uuid::new_v4(),
        user,
        recorded_at: chrono::Utc::now(),
        weight_kg: None,
        measurements_cm: measurements,
    })?;

    println!("✓ Logged {:?} measurement: {:.1} cm", kind, value);

    run_unlock_pass(data_dir, user, TriggerEvent::MeasurementLogged, config);
    Ok(())
}

fn cmd_trend(data_dir: &Path, user: Uuid, exercise: Option<String>, days: i64) -> Result<()> {
    let history = open_history(data_dir);
    let series = daily_trend(
        &history,
        user,
        exercise.as_deref(),
        days,
        chrono::Utc::now(),
    )?;

    if series.is_empty() {
        println!("No sessions in the last {} days.", days);
        return Ok(());
    }

    println!("{:<12} {:>8} {:>10} {:>6}", "DATE", "MAX KG", "VOLUME", "REPS");
    for point in &series {
        println!(
            "{:<12} {:>8.1} {:>10.1} {:>6}",
            point.day, point.max_weight, point.total_volume, point.total_reps
        );
    }

    Ok(())
}

fn cmd_pr(data_dir: &Path, user: Uuid, exercise: &str) -> Result<()> {
    let history = open_history(data_dir);

    match history.personal_record(user, exercise)? {
        Some(record) => {
            println!(
                "Personal record for {}: {:.1} kg on {}",
                exercise,
                record.metrics.max_weight,
                record.performed_at.date_naive()
            );
        }
        None => {
            println!("No sessions logged for {} yet.", exercise);
        }
    }

    Ok(())
}

fn cmd_achievements(data_dir: &Path, user: Uuid, config: &Config) -> Result<()> {
    let engine = build_file_engine(data_dir, config)?;
    let profile = engine.profile(user)?;
    let catalog = engine.catalog();

    let mut entries: Vec<_> = catalog.achievements.values().collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id));

    println!("Achievements:");
    for achievement in &entries {
        let marker = if profile.achievements.contains(&achievement.id) {
            "✓"
        } else {
            "·"
        };
        println!(
            "  {} {} [{:?}] - {}",
            marker, achievement.title, achievement.rarity, achievement.description
        );
    }

    let unlocked = profile.achievements.len();
    println!();
    println!("Unlocked {} of {}", unlocked, entries.len());
    println!("Points: {}  Experience: {}", profile.points, profile.experience);
    if !profile.clothing.is_empty() {
        println!(
            "Clothing: {}",
            profile.clothing.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }
    if !profile.characters.is_empty() {
        println!(
            "Characters: {}",
            profile
                .characters
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(())
}

fn cmd_rollup(data_dir: &Path, cleanup: bool) -> Result<()> {
    let journal_path = session_journal_path(data_dir);
    let csv_path = data_dir.join("sessions.csv");

    if !journal_path.exists() {
        println!("No session journal found - nothing to roll up.");
        return Ok(());
    }

    let count = csv_rollup::journal_to_csv_and_archive(&journal_path, &csv_path)?;

    println!("✓ Rolled up {} sessions to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = csv_rollup::cleanup_processed_journals(&data_dir.join("journal"))?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed journal files", cleaned);
        }
    }

    Ok(())
}

/// Parse set specs of the form "REPS" or "REPSxWEIGHT" (e.g. "12", "10x60")
fn parse_sets(specs: &[String]) -> Result<Vec<SetEntry>> {
    let mut sets = Vec::with_capacity(specs.len());

    for (index, spec) in specs.iter().enumerate() {
        let (reps_part, weight_part) = match spec.split_once(['x', 'X']) {
            Some((reps, weight)) => (reps, Some(weight)),
            None => (spec.as_str(), None),
        };

        let reps: u32 = reps_part.trim().parse().map_err(|_| {
            Error::Validation(format!(
                "invalid set '{}': expected REPS or REPSxWEIGHT",
                spec
            ))
        })?;

        let weight: f64 = match weight_part {
            Some(weight) => weight.trim().parse().map_err(|_| {
                Error::Validation(format!("invalid set '{}': weight must be a number", spec))
            })?,
            None => 0.0,
        };

        sets.push(SetEntry {
            set_number: (index + 1) as u32,
            reps,
            weight,
            duration_seconds: None,
            rest_seconds: 60,
            completed: true,
            notes: None,
        });
    }

    Ok(sets)
}

fn parse_measurement_kind(kind: &str) -> Result<MeasurementType> {
    match kind.to_lowercase().as_str() {
        "chest" => Ok(MeasurementType::Chest),
        "waist" => Ok(MeasurementType::Waist),
        "hips" => Ok(MeasurementType::Hips),
        "biceps" => Ok(MeasurementType::Biceps),
        "thighs" => Ok(MeasurementType::Thighs),
        "calves" => Ok(MeasurementType::Calves),
        "neck" => Ok(MeasurementType::Neck),
        "shoulders" => Ok(MeasurementType::Shoulders),
        other => Err(Error::Validation(format!(
            "unknown measurement site '{}'",
            other
        ))),
    }
}

fn display_unlocked(unlocked: &[Achievement]) {
    for achievement in unlocked {
        println!();
        println!(
            "★ Achievement unlocked: {} [{:?}]",
            achievement.title, achievement.rarity
        );
        println!("  {}", achievement.description);
        if achievement.rewards.points > 0 || achievement.rewards.experience > 0 {
            println!(
                "  +{} points, +{} XP",
                achievement.rewards.points, achievement.rewards.experience
            );
        }
        for item in &achievement.rewards.clothing {
            println!("  Unlocked clothing: {}", item);
        }
        for character in &achievement.rewards.characters {
            println!("  Unlocked character: {}", character);
        }
    }
}

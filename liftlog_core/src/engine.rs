//! Achievement unlock engine.
//!
//! One evaluation pass runs per triggering event: select candidate
//! achievements for the event's categories, evaluate each condition in
//! isolation, and record first-time unlocks through the ledger's
//! conditional insert. A failing or slow candidate is skipped and
//! retried on the next event; it never aborts the pass or the
//! triggering action.

use crate::{
    Achievement, AchievementCatalog, BodyMetricStore, ConditionEvaluator, Error, EvalContext,
    HistoryStore, Result, RewardProfile, TriggerEvent, UnlockStore,
};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use uuid::Uuid;

/// Orchestrates condition evaluation and at-most-once reward grants
pub struct AchievementEngine {
    catalog: Arc<AchievementCatalog>,
    evaluator: Arc<ConditionEvaluator>,
    history: Arc<dyn HistoryStore>,
    body: Arc<dyn BodyMetricStore>,
    unlocks: Arc<dyn UnlockStore>,
    profile_dir: PathBuf,
    weight_window_days: i64,
    candidate_timeout: Duration,
}

impl AchievementEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<AchievementCatalog>,
        evaluator: Arc<ConditionEvaluator>,
        history: Arc<dyn HistoryStore>,
        body: Arc<dyn BodyMetricStore>,
        unlocks: Arc<dyn UnlockStore>,
        profile_dir: impl Into<PathBuf>,
        weight_window_days: i64,
        candidate_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            evaluator,
            history,
            body,
            unlocks,
            profile_dir: profile_dir.into(),
            weight_window_days,
            candidate_timeout,
        }
    }

    /// Run one unlock evaluation pass for the user and return the
    /// achievements newly unlocked by this pass.
    ///
    /// Candidates are the active achievements in the event's eligible
    /// categories without an existing unlock record. The ledger's
    /// conditional insert is the at-most-once authority: when two
    /// passes race, the loser's insert is a silent no-op.
    pub fn on_event(&self, user: Uuid, event: TriggerEvent) -> Result<Vec<Achievement>> {
        let already = self.unlocks.unlocked_for(user)?;
        let candidates: Vec<&Achievement> = self
            .catalog
            .active_in_categories(event.eligible_categories())
            .into_iter()
            .filter(|a| !already.contains(&a.id))
            .collect();

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            "Evaluating {} candidate achievements for {:?}",
            candidates.len(),
            event
        );

        let ctx = EvalContext {
            now: Utc::now(),
            history: Arc::clone(&self.history),
            body: Arc::clone(&self.body),
            weight_window_days: self.weight_window_days,
        };

        let mut newly_unlocked = Vec::new();

        for achievement in candidates {
            let satisfied = match self.evaluate_candidate(achievement, user, &ctx) {
                Ok(satisfied) => satisfied,
                Err(e) => {
                    // Isolated per candidate: log and move on, the next
                    // triggering event retries it
                    tracing::warn!(
                        "Evaluation of '{}' failed: {}; skipping this pass",
                        achievement.id,
                        e
                    );
                    continue;
                }
            };

            if !satisfied {
                continue;
            }

            match self.unlocks.try_insert(user, &achievement.id, ctx.now) {
                Ok(true) => {
                    tracing::info!("User {} unlocked '{}'", user, achievement.id);
                    newly_unlocked.push(achievement.clone());
                }
                Ok(false) => {
                    // A concurrent pass won the race; the invariant held
                    tracing::debug!(
                        "'{}' was unlocked concurrently for {}; no-op",
                        achievement.id,
                        user
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Recording unlock of '{}' failed: {}; will retry on a later event",
                        achievement.id,
                        e
                    );
                }
            }
        }

        if !newly_unlocked.is_empty() {
            self.refresh_profile(user)?;
        }

        Ok(newly_unlocked)
    }

    /// Evaluate one candidate on a worker thread, bounded by the
    /// per-candidate timeout. On timeout the worker is abandoned and the
    /// candidate skipped, so one slow store query cannot stall the rest
    /// of the pass.
    fn evaluate_candidate(
        &self,
        achievement: &Achievement,
        user: Uuid,
        ctx: &EvalContext,
    ) -> Result<bool> {
        let (tx, rx) = mpsc::channel();
        let evaluator = Arc::clone(&self.evaluator);
        let condition = achievement.condition.clone();
        let ctx = ctx.clone();

        thread::spawn(move || {
            let _ = tx.send(evaluator.evaluate(&condition, user, &ctx));
        });

        match rx.recv_timeout(self.candidate_timeout) {
            Ok(result) => result,
            Err(_) => Err(Error::Evaluation(format!(
                "condition check for '{}' timed out after {:?}",
                achievement.id, self.candidate_timeout
            ))),
        }
    }

    /// Recompute the user's reward profile from the unlock ledger and
    /// persist the snapshot.
    ///
    /// The snapshot is derived, so this is idempotent: rewards are never
    /// applied twice, and a stale snapshot (e.g. after a crash between
    /// ledger append and snapshot write) is repaired here.
    pub fn refresh_profile(&self, user: Uuid) -> Result<RewardProfile> {
        let records = self.unlocks.records_for(user)?;
        let profile = RewardProfile::from_unlocks(&self.catalog, &records);
        profile.save(&self.profile_path(user))?;
        Ok(profile)
    }

    /// Load the user's reward profile snapshot
    pub fn profile(&self, user: Uuid) -> Result<RewardProfile> {
        RewardProfile::load(&self.profile_path(user))
    }

    fn profile_path(&self, user: Uuid) -> PathBuf {
        self.profile_dir.join(format!("{}.json", user))
    }

    pub fn catalog(&self) -> &AchievementCatalog {
        &self.catalog
    }
}

/// Build an engine over the file-backed stores rooted at `data_dir`,
/// using the default catalog merged with the config's operator entries.
pub fn build_file_engine(data_dir: &Path, config: &crate::Config) -> Result<AchievementEngine> {
    let mut catalog = crate::catalog::get_default_catalog().clone();
    catalog.merge_custom(config.achievements.custom.clone());
    let errors = catalog.validate();
    if !errors.is_empty() {
        return Err(Error::Catalog(errors.join("; ")));
    }

    let journal_dir = data_dir.join("journal");
    let history = Arc::new(crate::FileHistoryStore::open(
        journal_dir.join("sessions.jsonl"),
        data_dir.join("sessions.csv"),
    ));
    let body = Arc::new(crate::FileBodyMetricStore::open(
        journal_dir.join("body_metrics.jsonl"),
    ));
    let unlocks = Arc::new(crate::FileUnlockLedger::open(
        journal_dir.join("unlocks.jsonl"),
    ));

    Ok(AchievementEngine::new(
        Arc::new(catalog),
        Arc::new(ConditionEvaluator::new()),
        history,
        body,
        unlocks,
        data_dir.join("profiles"),
        config.evaluation.weight_window_days,
        Duration::from_millis(config.evaluation.candidate_timeout_ms),
    ))
}

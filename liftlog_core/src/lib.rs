#![forbid(unsafe_code)]

//! Core domain model and business logic for the liftlog fitness tracker.
//!
//! This crate provides:
//! - Domain types (sessions, sets, achievements, unlock records)
//! - Session metric derivation
//! - History and body metric stores
//! - Daily progress trend aggregation
//! - Achievement condition evaluation and at-most-once unlock grants
//! - Persistence (JSONL journals, CSV archive, profile snapshots)

pub mod types;
pub mod error;
pub mod metrics;
pub mod journal;
pub mod csv_rollup;
pub mod history;
pub mod body;
pub mod trend;
pub mod catalog;
pub mod conditions;
pub mod unlock;
pub mod state;
pub mod engine;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use metrics::{derive_metrics, finalize_session};
pub use journal::JsonlJournal;
pub use history::{FileHistoryStore, HistoryStore};
pub use body::{BodyMetricStore, FileBodyMetricStore};
pub use trend::{daily_trend, workout_days};
pub use catalog::{build_default_catalog, get_default_catalog, AchievementCatalog};
pub use conditions::{ConditionEvaluator, ConditionStrategy, EvalContext};
pub use unlock::{FileUnlockLedger, UnlockStore};
pub use state::RewardProfile;
pub use engine::{build_file_engine, AchievementEngine};
pub use config::Config;

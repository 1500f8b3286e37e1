//! Reward profile persistence with file locking.
//!
//! The profile is a snapshot of what a user's unlocks are worth: points,
//! experience, and the cosmetic items and characters their achievements
//! granted. It is a pure derivation of the unlock ledger plus the
//! catalog, so rewards can never be applied twice: recomputing from the
//! ledger repairs any stale or lost snapshot.

use crate::{AchievementCatalog, Error, Result, UnlockRecord};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Snapshot of a user's accumulated rewards
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct RewardProfile {
    pub points: u64,
    pub experience: u64,
    pub clothing: BTreeSet<String>,
    pub characters: BTreeSet<String>,
    /// Ids of unlocked achievements, for quick display
    pub achievements: BTreeSet<String>,
}

impl RewardProfile {
    /// Derive the profile from the user's unlock records.
    ///
    /// A ledger entry whose achievement no longer exists in the catalog
    /// is logged and skipped; the catalog is expected to preserve
    /// referential integrity, so this is a defect signal, not a crash.
    pub fn from_unlocks(catalog: &AchievementCatalog, records: &[UnlockRecord]) -> Self {
        let mut profile = Self::default();

        for record in records {
            let achievement = match catalog.get(&record.achievement_id) {
                Some(achievement) => achievement,
                None => {
                    tracing::warn!(
                        "Unlock record references unknown achievement '{}'",
                        record.achievement_id
                    );
                    continue;
                }
            };

            profile.points += achievement.rewards.points;
            profile.experience += achievement.rewards.experience;
            profile
                .clothing
                .extend(achievement.rewards.clothing.iter().cloned());
            profile
                .characters
                .extend(achievement.rewards.characters.iter().cloned());
            profile.achievements.insert(achievement.id.clone());
        }

        profile
    }

    /// Load a profile snapshot from a file with shared locking
    ///
    /// Returns the default profile if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns the default;
    /// the ledger derivation rebuilds it on the next refresh.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No profile snapshot found, using default");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open profile snapshot {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock profile snapshot {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read profile snapshot {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<RewardProfile>(&contents) {
            Ok(profile) => Ok(profile),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse profile snapshot {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save the profile snapshot with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "profile path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved profile snapshot to {:?}", path);
        Ok(())
    }
}

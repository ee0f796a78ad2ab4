//! Model version registry
//!
//! Every trained version is recorded with its metrics and artifact paths.
//! At most one version is active; activation swaps the flag inside a single
//! transaction so readers never see zero or two active versions.

use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode, OptionalExtension};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::data::Database;
use crate::training::{ArtifactPaths, TrainingMetrics};
use crate::{GridironError, Result};

const VERSION_COLUMNS: &str = "version, created_at, training_seasons, training_samples,
     winner_accuracy, spread_mae, total_mae,
     winner_model_path, spread_model_path, total_model_path, is_active";

/// A recorded model version
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelVersion {
    pub version: String,
    pub created_at: DateTime<Utc>,
    /// Seasons the models were trained on, in the order given
    pub training_seasons: Vec<i32>,
    pub training_samples: usize,
    pub metrics: TrainingMetrics,
    pub artifacts: ArtifactPaths,
    pub is_active: bool,
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} | {} | seasons {:?} | {} games | {}",
            self.version,
            if self.is_active { " (active)" } else { "" },
            self.created_at.format("%Y-%m-%d %H:%M"),
            self.training_seasons,
            self.training_samples,
            self.metrics
        )
    }
}

/// Registry over the `model_versions` table
pub struct ModelRegistry<'a> {
    db: &'a Database,
}

impl<'a> ModelRegistry<'a> {
    pub fn new(db: &'a Database) -> Self {
        ModelRegistry { db }
    }

    /// Record a newly trained version; fails with `DuplicateVersion` if the id is taken
    pub fn record(
        &self,
        version: &str,
        seasons: &[i32],
        samples: usize,
        metrics: &TrainingMetrics,
        artifacts: &ArtifactPaths,
    ) -> Result<ModelVersion> {
        let entry = ModelVersion {
            version: version.to_string(),
            created_at: Utc::now(),
            training_seasons: seasons.to_vec(),
            training_samples: samples,
            metrics: *metrics,
            artifacts: artifacts.clone(),
            is_active: false,
        };

        let seasons_json = serde_json::to_string(&entry.training_seasons)
            .map_err(|e| GridironError::Parse(format!("training seasons: {}", e)))?;

        let inserted = self.db.conn().execute(
            &format!(
                "INSERT INTO model_versions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0)",
                VERSION_COLUMNS
            ),
            params![
                entry.version,
                entry.created_at.to_rfc3339(),
                seasons_json,
                entry.training_samples as i64,
                entry.metrics.winner_accuracy,
                entry.metrics.spread_mae,
                entry.metrics.total_mae,
                entry.artifacts.winner_model_path.to_string_lossy(),
                entry.artifacts.spread_model_path.to_string_lossy(),
                entry.artifacts.total_model_path.to_string_lossy(),
            ],
        );

        match inserted {
            Ok(_) => {
                log::info!("Recorded model version {}", entry.version);
                Ok(entry)
            }
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
                Err(GridironError::DuplicateVersion(version.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Make `version` the only active version
    pub fn activate(&self, version: &str) -> Result<()> {
        let tx = self.db.conn().unchecked_transaction()?;

        // Clear first so the partial unique index never sees two active rows.
        tx.execute("UPDATE model_versions SET is_active = 0 WHERE is_active = 1", [])?;
        let updated = tx.execute(
            "UPDATE model_versions SET is_active = 1 WHERE version = ?1",
            params![version],
        )?;
        if updated == 0 {
            // Dropping the transaction rolls back the clear.
            return Err(GridironError::NotFound(version.to_string()));
        }

        tx.commit()?;
        log::info!("Activated model version {}", version);
        Ok(())
    }

    pub fn exists(&self, version: &str) -> Result<bool> {
        let found: Option<i64> = self
            .db
            .conn()
            .query_row(
                "SELECT 1 FROM model_versions WHERE version = ?1",
                params![version],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get(&self, version: &str) -> Result<ModelVersion> {
        self.db
            .conn()
            .query_row(
                &format!("SELECT {} FROM model_versions WHERE version = ?1", VERSION_COLUMNS),
                params![version],
                Self::row_to_version,
            )
            .optional()?
            .ok_or_else(|| GridironError::NotFound(version.to_string()))
    }

    /// The version currently used for predictions, if any
    pub fn active(&self) -> Result<Option<ModelVersion>> {
        let active = self
            .db
            .conn()
            .query_row(
                &format!("SELECT {} FROM model_versions WHERE is_active = 1", VERSION_COLUMNS),
                [],
                Self::row_to_version,
            )
            .optional()?;
        Ok(active)
    }

    /// All versions, newest first
    pub fn list(&self) -> Result<Vec<ModelVersion>> {
        let mut stmt = self.db.conn().prepare(&format!(
            "SELECT {} FROM model_versions ORDER BY created_at DESC, version DESC",
            VERSION_COLUMNS
        ))?;
        let versions = stmt
            .query_map([], Self::row_to_version)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(versions)
    }

    fn row_to_version(row: &rusqlite::Row) -> rusqlite::Result<ModelVersion> {
        use rusqlite::types::Type;

        let created: String = row.get(1)?;
        let created_at = DateTime::parse_from_rfc3339(&created)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?
            .with_timezone(&Utc);

        let seasons: String = row.get(2)?;
        let training_seasons = serde_json::from_str(&seasons)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

        let samples: i64 = row.get(3)?;
        let path = |idx: usize| -> rusqlite::Result<PathBuf> { Ok(PathBuf::from(row.get::<_, String>(idx)?)) };

        Ok(ModelVersion {
            version: row.get(0)?,
            created_at,
            training_seasons,
            training_samples: samples as usize,
            metrics: TrainingMetrics {
                winner_accuracy: row.get(4)?,
                spread_mae: row.get(5)?,
                total_mae: row.get(6)?,
            },
            artifacts: ArtifactPaths {
                winner_model_path: path(7)?,
                spread_model_path: path(8)?,
                total_model_path: path(9)?,
            },
            is_active: row.get(10)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(accuracy: f64) -> TrainingMetrics {
        TrainingMetrics {
            winner_accuracy: accuracy,
            spread_mae: 10.5,
            total_mae: 9.75,
        }
    }

    fn artifacts(version: &str) -> ArtifactPaths {
        ArtifactPaths {
            winner_model_path: PathBuf::from(format!("models/{version}_winner.mpk")),
            spread_model_path: PathBuf::from(format!("models/{version}_spread.mpk")),
            total_model_path: PathBuf::from(format!("models/{version}_total.mpk")),
        }
    }

    fn active_versions(registry: &ModelRegistry) -> Vec<String> {
        registry
            .list()
            .unwrap()
            .into_iter()
            .filter(|v| v.is_active)
            .map(|v| v.version)
            .collect()
    }

    #[test]
    fn test_record_and_get() {
        let db = Database::in_memory().unwrap();
        let registry = ModelRegistry::new(&db);
        registry
            .record("v1", &[2021, 2020, 2022], 812, &metrics(0.63), &artifacts("v1"))
            .unwrap();

        let v1 = registry.get("v1").unwrap();
        assert_eq!(v1.training_seasons, vec![2021, 2020, 2022]);
        assert_eq!(v1.training_samples, 812);
        assert_eq!(v1.metrics, metrics(0.63));
        assert_eq!(v1.artifacts, artifacts("v1"));
        assert!(!v1.is_active);
        assert!(registry.active().unwrap().is_none());
    }

    #[test]
    fn test_duplicate_version() {
        let db = Database::in_memory().unwrap();
        let registry = ModelRegistry::new(&db);
        registry.record("v1", &[2023], 100, &metrics(0.6), &artifacts("v1")).unwrap();

        let err = registry
            .record("v1", &[2024], 200, &metrics(0.7), &artifacts("v1"))
            .unwrap_err();
        assert!(matches!(err, GridironError::DuplicateVersion(v) if v == "v1"));
        assert_eq!(registry.get("v1").unwrap().training_samples, 100);
    }

    #[test]
    fn test_activation_flips_single_active() {
        let db = Database::in_memory().unwrap();
        let registry = ModelRegistry::new(&db);
        registry.record("v1", &[2023], 100, &metrics(0.6), &artifacts("v1")).unwrap();
        registry.record("v2", &[2023], 100, &metrics(0.6), &artifacts("v2")).unwrap();

        registry.activate("v2").unwrap();
        assert_eq!(active_versions(&registry), vec!["v2"]);
        assert_eq!(registry.active().unwrap().unwrap().version, "v2");

        registry.activate("v1").unwrap();
        assert_eq!(active_versions(&registry), vec!["v1"]);

        // Re-activating the active version is a no-op
        registry.activate("v1").unwrap();
        assert_eq!(active_versions(&registry), vec!["v1"]);
    }

    #[test]
    fn test_activate_missing_keeps_current() {
        let db = Database::in_memory().unwrap();
        let registry = ModelRegistry::new(&db);
        registry.record("v1", &[2023], 100, &metrics(0.6), &artifacts("v1")).unwrap();
        registry.activate("v1").unwrap();

        let err = registry.activate("nope").unwrap_err();
        assert!(matches!(err, GridironError::NotFound(_)));
        assert_eq!(active_versions(&registry), vec!["v1"]);
        assert!(matches!(registry.get("nope"), Err(GridironError::NotFound(_))));
    }

    #[test]
    fn test_list_and_exists() {
        let db = Database::in_memory().unwrap();
        let registry = ModelRegistry::new(&db);
        assert!(registry.list().unwrap().is_empty());
        assert!(!registry.exists("v1").unwrap());

        registry.record("v1", &[2022], 50, &metrics(0.55), &artifacts("v1")).unwrap();
        registry.record("v2", &[2023], 60, &metrics(0.58), &artifacts("v2")).unwrap();

        assert!(registry.exists("v1").unwrap());
        let listed: Vec<_> = registry.list().unwrap().into_iter().map(|v| v.version).collect();
        assert_eq!(listed.len(), 2);
        assert!(listed.contains(&"v1".to_string()));
    }
}

//! Training run orchestration
//!
//! build dataset -> check size -> train -> save artifacts -> record -> activate.
//! A failing step stops the run; nothing is recorded unless the artifacts
//! were saved.

use chrono::Local;
use std::path::{Path, PathBuf};

use crate::data::{Database, DatasetSummary, TrainingDataBuilder};
use crate::features::feature_names;
use crate::registry::ModelRegistry;
use crate::training::metrics::TrainingMetrics;
use crate::training::trainer::{ArtifactPaths, ModelTrainer};
use crate::{FeatureConfig, GridironError, Result, TrainingConfig};

/// Number of features listed in a report
const TOP_FEATURES: usize = 10;

/// What to train
#[derive(Debug, Clone, Default)]
pub struct TrainingRequest {
    pub seasons: Vec<i32>,
    /// Defaults to a timestamp id such as `v20241105_093000`
    pub version: Option<String>,
    /// Make the new version active once recorded
    pub activate: bool,
}

impl TrainingRequest {
    /// Every season from `start` to `end` inclusive
    pub fn season_range(start: i32, end: i32) -> Self {
        TrainingRequest {
            seasons: (start..=end).collect(),
            ..Self::default()
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub version: String,
    pub summary: DatasetSummary,
    pub metrics: TrainingMetrics,
    pub artifacts: ArtifactPaths,
    pub activated: bool,
    /// Highest importance first, when the trainer reports importance
    pub top_features: Vec<(String, f32)>,
}

pub fn default_version() -> String {
    Local::now().format("v%Y%m%d_%H%M%S").to_string()
}

/// Sequences a full training run against one database
pub struct TrainingOrchestrator<'a, T: ModelTrainer> {
    db: &'a Database,
    trainer: T,
    features: FeatureConfig,
    training: TrainingConfig,
    model_dir: PathBuf,
}

impl<'a, T: ModelTrainer> TrainingOrchestrator<'a, T> {
    pub fn new(
        db: &'a Database,
        trainer: T,
        features: FeatureConfig,
        training: TrainingConfig,
        model_dir: impl AsRef<Path>,
    ) -> Self {
        TrainingOrchestrator {
            db,
            trainer,
            features,
            training,
            model_dir: model_dir.as_ref().to_path_buf(),
        }
    }

    pub fn run(&self, request: &TrainingRequest) -> Result<TrainingReport> {
        let registry = ModelRegistry::new(self.db);
        let version = request.version.clone().unwrap_or_else(default_version);

        if registry.exists(&version)? {
            return Err(GridironError::DuplicateVersion(version));
        }

        log::info!("Training {} on seasons {:?}", version, request.seasons);

        let builder = TrainingDataBuilder::new(self.db, self.features.clone(), self.training.clone());
        let data = builder.build(&request.seasons)?;
        let summary = data.summary();

        if data.len() < self.training.min_samples {
            return Err(GridironError::InsufficientTrainingData {
                samples: data.len(),
                required: self.training.min_samples,
            });
        }

        let (models, metrics) = self.trainer.train(&data)?;
        log::info!("{}", metrics);

        let artifacts = self.trainer.save(&models, &self.model_dir, &version)?;

        let top_features = self
            .trainer
            .feature_importance(&models)
            .map(|importance| rank_features(&importance))
            .unwrap_or_default();
        for (name, score) in &top_features {
            log::info!("  {:<32} {:.4}", name, score);
        }

        registry.record(&version, &request.seasons, data.len(), &metrics, &artifacts)?;

        if request.activate {
            registry.activate(&version)?;
        }

        Ok(TrainingReport {
            version,
            summary,
            metrics,
            artifacts,
            activated: request.activate,
            top_features,
        })
    }
}

/// Pair importances with feature names and keep the largest
fn rank_features(importance: &[f32]) -> Vec<(String, f32)> {
    let mut ranked: Vec<(String, f32)> = feature_names().into_iter().zip(importance.iter().copied()).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(TOP_FEATURES);
    ranked
}

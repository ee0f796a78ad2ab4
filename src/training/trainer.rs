//! Contract between the orchestrator and a model fitting backend

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::TrainingSet;
use crate::training::metrics::TrainingMetrics;
use crate::Result;

/// Files written for one model version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub winner_model_path: PathBuf,
    pub spread_model_path: PathBuf,
    pub total_model_path: PathBuf,
}

/// Fits winner, spread and total models and persists them.
///
/// `train` receives rows in date order; implementations that hold out data
/// for metrics should hold out the most recent rows.
pub trait ModelTrainer {
    /// Fitted models for the three targets
    type Models;

    fn train(&self, data: &TrainingSet) -> Result<(Self::Models, TrainingMetrics)>;

    /// Write `models` under `dir`, file names prefixed by `version`
    fn save(&self, models: &Self::Models, dir: &Path, version: &str) -> Result<ArtifactPaths>;

    /// Per-feature importance in feature vector order, if the models expose it
    fn feature_importance(&self, _models: &Self::Models) -> Option<Vec<f32>> {
        None
    }
}

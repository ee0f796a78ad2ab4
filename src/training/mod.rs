//! Model training
//!
//! The trainer contract, a burn linear baseline, holdout metrics and the
//! orchestrator that turns a season range into a registered model version.

pub mod linear;
pub mod metrics;
pub mod orchestrator;
pub mod trainer;

pub use linear::{FeatureNormalization, LinearModels, LinearTrainer};
pub use metrics::TrainingMetrics;
pub use orchestrator::{default_version, TrainingOrchestrator, TrainingReport, TrainingRequest};
pub use trainer::{ArtifactPaths, ModelTrainer};

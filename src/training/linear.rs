//! Linear baseline trainer
//!
//! One linear head per target over z-score normalised features: logistic
//! for the winner, least squares for spread and total. Full batch Adam.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::TrainingSet;
use crate::features::{FeatureVector, FEATURE_DIM};
use crate::training::metrics::{accuracy, mean_absolute_error, TrainingMetrics};
use crate::training::trainer::{ArtifactPaths, ModelTrainer};
use crate::{GridironError, ModelConfig, Result};

/// Z-score parameters for inputs and regression targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureNormalization {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
    pub spread: TargetScale,
    pub total: TargetScale,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetScale {
    pub mean: f32,
    pub std: f32,
}

impl TargetScale {
    fn from_values(values: &[f32]) -> Self {
        let n = values.len().max(1) as f32;
        let mean = values.iter().sum::<f32>() / n;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
        TargetScale {
            mean,
            std: var.sqrt().max(0.001),
        }
    }

    fn scale(&self, values: &[f32]) -> Vec<f32> {
        values.iter().map(|v| (v - self.mean) / self.std).collect()
    }

    fn unscale(&self, values: &[f32]) -> Vec<f32> {
        values.iter().map(|v| v * self.std + self.mean).collect()
    }
}

impl FeatureNormalization {
    pub fn from_set(data: &TrainingSet) -> Self {
        let n = data.len().max(1) as f32;
        let mut sum = vec![0.0f32; FEATURE_DIM];
        let mut sum_sq = vec![0.0f32; FEATURE_DIM];

        for row in &data.features {
            for (j, v) in row.iter().enumerate() {
                sum[j] += v;
                sum_sq[j] += v * v;
            }
        }

        let mean: Vec<f32> = sum.iter().map(|s| s / n).collect();
        let std = sum_sq
            .iter()
            .zip(mean.iter())
            .map(|(sq, m)| (sq / n - m * m).max(0.0).sqrt().max(0.001))
            .collect();

        FeatureNormalization {
            mean,
            std,
            spread: TargetScale::from_values(&spread_targets(data)),
            total: TargetScale::from_values(&total_targets(data)),
        }
    }

    /// Normalise a [rows, FEATURE_DIM] tensor
    pub fn normalize<B: Backend>(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = features.device();
        let mean = Tensor::<B, 1>::from_floats(self.mean.as_slice(), &device).unsqueeze_dim(0);
        let std = Tensor::<B, 1>::from_floats(self.std.as_slice(), &device).unsqueeze_dim(0);
        (features - mean) / std
    }
}

fn spread_targets(data: &TrainingSet) -> Vec<f32> {
    data.y_spread.iter().map(|&y| y as f32).collect()
}

fn total_targets(data: &TrainingSet) -> Vec<f32> {
    data.y_total.iter().map(|&y| y as f32).collect()
}

fn feature_tensor<B: Backend>(rows: &[FeatureVector], device: &B::Device) -> Tensor<B, 2> {
    let flat: Vec<f32> = rows.iter().flat_map(|row| row.iter().copied()).collect();
    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([rows.len(), FEATURE_DIM])
}

fn column_tensor<B: Backend>(values: &[f32], device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 1>::from_floats(values, device).reshape([values.len(), 1])
}

fn to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| GridironError::Training(format!("Failed to read tensor: {:?}", e)))
}

/// Fitted heads plus the normalisation they were trained with
#[derive(Debug, Clone)]
pub struct LinearModels<B: Backend> {
    pub winner: Linear<B>,
    pub spread: Linear<B>,
    pub total: Linear<B>,
    pub normalization: FeatureNormalization,
}

impl<B: Backend> LinearModels<B> {
    /// Home win probability, predicted spread and predicted total per row
    pub fn predict(&self, rows: &[FeatureVector]) -> Result<(Vec<f32>, Vec<f32>, Vec<f32>)> {
        if rows.is_empty() {
            return Ok((Vec::new(), Vec::new(), Vec::new()));
        }
        let device = self.winner.weight.val().device();
        let x = self.normalization.normalize(feature_tensor::<B>(rows, &device));

        let probs = to_vec(sigmoid(self.winner.forward(x.clone())))?;
        let spread = self.normalization.spread.unscale(&to_vec(self.spread.forward(x.clone()))?);
        let total = self.normalization.total.unscale(&to_vec(self.total.forward(x))?);
        Ok((probs, spread, total))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Head {
    Winner,
    Spread,
    Total,
}

impl Head {
    fn name(&self) -> &'static str {
        match self {
            Head::Winner => "winner",
            Head::Spread => "spread",
            Head::Total => "total",
        }
    }
}

/// Linear baseline implementing [`ModelTrainer`]
pub struct LinearTrainer<B: AutodiffBackend> {
    config: ModelConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> LinearTrainer<B> {
    pub fn new(device: B::Device, config: ModelConfig) -> Self {
        LinearTrainer { config, device }
    }

    fn fit_head(&self, head: Head, x: &Tensor<B, 2>, y: &Tensor<B, 2>) -> Linear<B> {
        let mut model: Linear<B> = LinearConfig::new(FEATURE_DIM, 1).init(&self.device);
        let mut optimizer = AdamConfig::new().init::<B, Linear<B>>();
        let epochs = self.config.epochs;

        for epoch in 0..epochs {
            let output = model.forward(x.clone());
            let loss = match head {
                Head::Winner => binary_cross_entropy(sigmoid(output), y.clone()),
                Head::Spread | Head::Total => (output - y.clone()).powf_scalar(2.0).mean(),
            };

            if epoch % 100 == 0 || epoch + 1 == epochs {
                let loss_val: f32 = loss.clone().into_scalar().elem();
                log::debug!("{} head epoch {}/{}: loss={:.4}", head.name(), epoch + 1, epochs, loss_val);
            }

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(self.config.learning_rate, model, grads);
        }

        model
    }
}

fn binary_cross_entropy<B: Backend>(probs: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let eps = 1e-7;
    let probs = probs.clamp(eps, 1.0 - eps);
    let loss = targets.clone().neg() * probs.clone().log() - (targets.neg() + 1.0) * (probs.neg() + 1.0).log();
    loss.mean()
}

impl<B: AutodiffBackend> ModelTrainer for LinearTrainer<B> {
    type Models = LinearModels<B>;

    fn train(&self, data: &TrainingSet) -> Result<(Self::Models, TrainingMetrics)> {
        if data.len() < 2 {
            return Err(GridironError::Training(format!(
                "need at least 2 rows to fit and evaluate, got {}",
                data.len()
            )));
        }

        let (train, holdout) = data.split_chronological(self.config.holdout_ratio);
        log::info!(
            "Fitting linear heads on {} games, evaluating on the latest {}",
            train.len(),
            holdout.len()
        );

        let normalization = FeatureNormalization::from_set(&train);
        let x = normalization.normalize(feature_tensor::<B>(&train.features, &self.device));

        let winner_y: Vec<f32> = train.y_winner.iter().map(|&y| y as f32).collect();
        let spread_y = normalization.spread.scale(&spread_targets(&train));
        let total_y = normalization.total.scale(&total_targets(&train));

        let models = LinearModels {
            winner: self.fit_head(Head::Winner, &x, &column_tensor(&winner_y, &self.device)),
            spread: self.fit_head(Head::Spread, &x, &column_tensor(&spread_y, &self.device)),
            total: self.fit_head(Head::Total, &x, &column_tensor(&total_y, &self.device)),
            normalization,
        };

        let (probs, spread, total) = models.predict(&holdout.features)?;
        let metrics = TrainingMetrics {
            winner_accuracy: accuracy(&probs, &holdout.y_winner),
            spread_mae: mean_absolute_error(&spread, &spread_targets(&holdout)),
            total_mae: mean_absolute_error(&total, &total_targets(&holdout)),
        };
        log::info!("Holdout: {}", metrics);

        Ok((models, metrics))
    }

    fn save(&self, models: &Self::Models, dir: &Path, version: &str) -> Result<ArtifactPaths> {
        std::fs::create_dir_all(dir)?;
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();

        let save_head = |head: Head, model: &Linear<B>| -> Result<std::path::PathBuf> {
            let path = dir.join(format!("{}_{}.mpk", version, head.name()));
            recorder
                .record(model.clone().into_record(), path.clone())
                .map_err(|e| GridironError::Training(format!("Failed to save {} model: {:?}", head.name(), e)))?;
            Ok(path)
        };

        let paths = ArtifactPaths {
            winner_model_path: save_head(Head::Winner, &models.winner)?,
            spread_model_path: save_head(Head::Spread, &models.spread)?,
            total_model_path: save_head(Head::Total, &models.total)?,
        };

        let norm_path = dir.join(format!("{}_feature_norm.json", version));
        let norm_json = serde_json::to_string_pretty(&models.normalization)
            .map_err(|e| GridironError::Training(format!("Failed to serialize normalization: {}", e)))?;
        std::fs::write(&norm_path, norm_json)?;

        log::info!("Saved models for {} to {}", version, dir.display());
        Ok(paths)
    }

    fn feature_importance(&self, models: &Self::Models) -> Option<Vec<f32>> {
        let weights = to_vec(models.winner.weight.val()).ok()?;
        let magnitudes: Vec<f32> = weights.iter().map(|w| w.abs()).collect();
        let sum: f32 = magnitudes.iter().sum();
        if sum <= 0.0 {
            return None;
        }
        Some(magnitudes.iter().map(|m| m / sum).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameId;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray<f32>>;

    /// Feature 0 decides the winner and drives spread; feature 1 drives total
    fn synthetic_set(n: usize) -> TrainingSet {
        let mut set = TrainingSet::default();
        for i in 0..n {
            let edge = (i % 7) as f32 - 3.0;
            let pace = (i % 5) as f32;
            let mut row = [0.0; FEATURE_DIM];
            row[0] = edge;
            row[1] = pace;
            row[2] = ((i * 13) % 11) as f32;

            let spread = (edge * 4.0) as i32 + if edge == 0.0 { 1 } else { 0 };
            set.games.push(GameId(format!("g{i}")));
            set.features.push(row);
            set.y_winner.push(u8::from(spread > 0));
            set.y_spread.push(spread);
            set.y_total.push(40 + (pace * 3.0) as u32);
            set.processed += 1;
        }
        set
    }

    fn trainer() -> LinearTrainer<TestBackend> {
        let config = ModelConfig {
            learning_rate: 0.05,
            epochs: 300,
            holdout_ratio: 0.2,
        };
        LinearTrainer::new(Default::default(), config)
    }

    #[test]
    fn test_fits_separable_data() {
        let data = synthetic_set(70);
        let trainer = trainer();
        let (models, metrics) = trainer.train(&data).unwrap();

        assert!(metrics.winner_accuracy >= 0.8, "{}", metrics);
        assert!(metrics.spread_mae < 4.0, "{}", metrics);
        assert!(metrics.total_mae < 4.0, "{}", metrics);

        let importance = trainer.feature_importance(&models).unwrap();
        assert_eq!(importance.len(), FEATURE_DIM);
        assert!((importance.iter().sum::<f32>() - 1.0).abs() < 1e-3);
        let top = importance
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(top, Some(0));
    }

    #[test]
    fn test_rejects_tiny_sets() {
        let trainer = trainer();
        assert!(matches!(
            trainer.train(&synthetic_set(1)),
            Err(GridironError::Training(_))
        ));
    }

    #[test]
    fn test_normalization_handles_constant_columns() {
        let norm = FeatureNormalization::from_set(&synthetic_set(10));
        assert_eq!(norm.mean.len(), FEATURE_DIM);
        // Column 5 is always zero
        assert_eq!(norm.mean[5], 0.0);
        assert!(norm.std[5] > 0.0);
        assert!(norm.total.mean >= 40.0);
    }
}

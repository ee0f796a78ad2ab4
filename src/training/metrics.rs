//! Evaluation metrics for the three prediction targets

use serde::{Deserialize, Serialize};
use std::fmt;

/// Holdout metrics reported by a trainer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Share of games whose winner was called correctly, in [0, 1]
    pub winner_accuracy: f64,
    /// Mean absolute error of the predicted home margin, in points
    pub spread_mae: f64,
    /// Mean absolute error of the predicted combined score, in points
    pub total_mae: f64,
}

impl fmt::Display for TrainingMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Winner acc: {:.2}% | Spread MAE: {:.2} | Total MAE: {:.2}",
            self.winner_accuracy * 100.0,
            self.spread_mae,
            self.total_mae
        )
    }
}

/// Fraction of probabilities on the correct side of 0.5 (>= 0.5 calls a home win)
pub fn accuracy(probs: &[f32], labels: &[u8]) -> f64 {
    if probs.is_empty() {
        return 0.0;
    }
    let correct = probs
        .iter()
        .zip(labels)
        .filter(|(p, y)| (**p >= 0.5) == (**y == 1))
        .count();
    correct as f64 / probs.len() as f64
}

/// Mean absolute error, 0 for empty input
pub fn mean_absolute_error(predictions: &[f32], targets: &[f32]) -> f64 {
    if predictions.is_empty() {
        return 0.0;
    }
    let sum: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (*p as f64 - *t as f64).abs())
        .sum();
    sum / predictions.len() as f64
}

//! Training set construction from historical games
//!
//! Every completed game in the requested seasons becomes one row of 44
//! point-in-time features plus winner, spread and total labels. Games whose
//! teams lack enough prior history are skipped and counted.

use std::fmt;

use crate::data::store::{DateOrder, GameQuery, GameStore};
use crate::features::{FeatureExtractor, FeatureVector, FEATURE_DIM};
use crate::{FeatureConfig, GameId, GridironError, Result, TrainingConfig};

/// Feature matrix and label vectors, rows in date order
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub games: Vec<GameId>,
    pub features: Vec<FeatureVector>,
    /// 1 = home win; ties and away wins are 0
    pub y_winner: Vec<u8>,
    /// home_score - away_score
    pub y_spread: Vec<i32>,
    /// home_score + away_score
    pub y_total: Vec<u32>,
    /// Games that produced a row
    pub processed: usize,
    /// Games dropped for insufficient history
    pub skipped: usize,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    fn push(&mut self, game: GameId, features: FeatureVector, home: u16, away: u16) {
        self.games.push(game);
        self.features.push(features);
        self.y_winner.push(u8::from(home > away));
        self.y_spread.push(home as i32 - away as i32);
        self.y_total.push(home as u32 + away as u32);
        self.processed += 1;
    }

    fn slice(&self, range: std::ops::Range<usize>) -> TrainingSet {
        TrainingSet {
            games: self.games[range.clone()].to_vec(),
            features: self.features[range.clone()].to_vec(),
            y_winner: self.y_winner[range.clone()].to_vec(),
            y_spread: self.y_spread[range.clone()].to_vec(),
            y_total: self.y_total[range.clone()].to_vec(),
            processed: range.len(),
            skipped: 0,
        }
    }

    /// Split off the most recent `ratio` of rows as a holdout set.
    ///
    /// Both sides keep at least one row when there are two or more rows.
    pub fn split_chronological(&self, ratio: f32) -> (TrainingSet, TrainingSet) {
        let n = self.len();
        if n < 2 {
            return (self.slice(0..n), TrainingSet::default());
        }
        let test = ((n as f32 * ratio).round() as usize).clamp(1, n - 1);
        let cut = n - test;
        (self.slice(0..cut), self.slice(cut..n))
    }

    pub fn summary(&self) -> DatasetSummary {
        let n = self.len();
        let mean = |sum: f64| if n == 0 { 0.0 } else { sum / n as f64 };

        DatasetSummary {
            games: n,
            skipped: self.skipped,
            feature_dim: FEATURE_DIM,
            home_win_rate: mean(self.y_winner.iter().map(|&y| y as f64).sum()),
            avg_spread: mean(self.y_spread.iter().map(|&y| y as f64).sum()),
            avg_total: mean(self.y_total.iter().map(|&y| y as f64).sum()),
        }
    }
}

/// Size and label distribution of a training set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetSummary {
    pub games: usize,
    pub skipped: usize,
    pub feature_dim: usize,
    pub home_win_rate: f64,
    pub avg_spread: f64,
    pub avg_total: f64,
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Games:          {} ({} skipped)", self.games, self.skipped)?;
        writeln!(f, "Features:       {}", self.feature_dim)?;
        writeln!(f, "Home win rate:  {:.1}%", self.home_win_rate * 100.0)?;
        writeln!(f, "Avg spread:     {:+.2}", self.avg_spread)?;
        write!(f, "Avg total:      {:.2}", self.avg_total)
    }
}

/// Builds training sets from a game store
pub struct TrainingDataBuilder<S> {
    extractor: FeatureExtractor<S>,
    config: TrainingConfig,
}

impl<S: GameStore> TrainingDataBuilder<S> {
    pub fn new(store: S, features: FeatureConfig, config: TrainingConfig) -> Self {
        TrainingDataBuilder {
            extractor: FeatureExtractor::new(store, features),
            config,
        }
    }

    /// Build rows for completed games in `seasons` from `min_week` onward.
    ///
    /// Store failures abort the build; games without enough history are
    /// skipped.
    pub fn build(&self, seasons: &[i32]) -> Result<TrainingSet> {
        let mut set = TrainingSet::default();
        if seasons.is_empty() {
            log::warn!("No seasons requested; training set is empty");
            return Ok(set);
        }

        let query = GameQuery::new()
            .seasons(seasons)
            .min_week(self.config.min_week)
            .completed()
            .stage(self.config.stage)
            .order(DateOrder::Ascending);
        let games = self.extractor.store().find_games(&query)?;

        log::info!(
            "Building features for {} games in seasons {:?} (week >= {})",
            games.len(),
            seasons,
            self.config.min_week
        );

        for game in &games {
            let Some((home, away)) = game.final_score() else {
                continue;
            };

            match self.extractor.build_game_features(game) {
                Ok(features) => set.push(game.id.clone(), features.to_array(), home, away),
                Err(GridironError::InsufficientHistory { team, games, .. }) => {
                    log::debug!(
                        "Skipping {}: {} has only {} prior games",
                        game.id,
                        team,
                        games
                    );
                    set.skipped += 1;
                }
                Err(e) => return Err(e),
            }

            if (set.processed + set.skipped) % 250 == 0 {
                log::info!(
                    "  {}/{} games ({} skipped)",
                    set.processed + set.skipped,
                    games.len(),
                    set.skipped
                );
            }
        }

        let summary = set.summary();
        log::info!(
            "Training set: {} games, {} skipped, {} features, home win rate {:.1}%, avg spread {:+.2}, avg total {:.2}",
            summary.games,
            summary.skipped,
            summary.feature_dim,
            summary.home_win_rate * 100.0,
            summary.avg_spread,
            summary.avg_total
        );

        Ok(set)
    }
}

/// Chronological split: every season before `test_season` trains, the test
/// season alone evaluates.
pub fn train_test_split_by_season(seasons: &[i32], test_season: i32) -> (Vec<i32>, Vec<i32>) {
    let train = seasons.iter().copied().filter(|&s| s < test_season).collect();
    (train, vec![test_season])
}

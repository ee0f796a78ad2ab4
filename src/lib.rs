//! Football game prediction pipeline
//!
//! Point-in-time team features, leakage-safe training datasets and versioned
//! model artifacts for winner, spread and total predictions.

pub mod data;
pub mod features;
pub mod registry;
pub mod training;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique identifier for a team
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

/// A franchise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub abbreviation: String,
    pub name: String,
}

/// Unique identifier for a game (e.g. "2023_05_KC_MIN")
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(pub String);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        GameId(id.to_string())
    }
}

/// Stage of the season a game belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    Pre,
    Reg,
    Post,
}

impl Stage {
    pub fn code(&self) -> &'static str {
        match self {
            Stage::Pre => "PRE",
            Stage::Reg => "REG",
            Stage::Post => "POST",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "PRE" => Some(Stage::Pre),
            "REG" => Some(Stage::Reg),
            "POST" | "WC" | "DIV" | "CON" | "SB" => Some(Stage::Post),
            _ => None,
        }
    }
}

/// Stadium roof at the venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Roof {
    #[default]
    Outdoors,
    Open,
    Dome,
    Closed,
    Retractable,
}

impl Roof {
    pub fn code(&self) -> &'static str {
        match self {
            Roof::Outdoors => "outdoors",
            Roof::Open => "open",
            Roof::Dome => "dome",
            Roof::Closed => "closed",
            Roof::Retractable => "retractable",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "outdoors" | "outdoor" => Some(Roof::Outdoors),
            "open" => Some(Roof::Open),
            "dome" => Some(Roof::Dome),
            "closed" => Some(Roof::Closed),
            "retractable" => Some(Roof::Retractable),
            _ => None,
        }
    }

    /// Weather is not a factor under a dome, closed or retractable roof
    pub fn is_indoor(&self) -> bool {
        matches!(self, Roof::Dome | Roof::Closed | Roof::Retractable)
    }
}

/// A scheduled or completed game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub season: i32,
    pub week: u32,
    pub date: NaiveDate,
    pub stage: Stage,
    pub home_team: TeamId,
    pub away_team: TeamId,
    /// None until the game has been played
    pub home_score: Option<u16>,
    pub away_score: Option<u16>,
    #[serde(default)]
    pub roof: Roof,
    /// Degrees Fahrenheit
    pub temperature: Option<i32>,
    /// Miles per hour
    pub wind: Option<i32>,
}

impl Game {
    /// A game is completed once both scores are known
    pub fn is_completed(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }

    /// Final scores as (home, away), if completed
    pub fn final_score(&self) -> Option<(u16, u16)> {
        Some((self.home_score?, self.away_score?))
    }

    /// Check if a team was playing at home
    pub fn is_home(&self, team: TeamId) -> Option<bool> {
        if team == self.home_team {
            Some(true)
        } else if team == self.away_team {
            Some(false)
        } else {
            None
        }
    }

    /// Get score for a specific team
    pub fn score_for(&self, team: TeamId) -> Option<u16> {
        if team == self.home_team {
            self.home_score
        } else if team == self.away_team {
            self.away_score
        } else {
            None
        }
    }

    /// Get score against a specific team
    pub fn score_against(&self, team: TeamId) -> Option<u16> {
        if team == self.home_team {
            self.away_score
        } else if team == self.away_team {
            self.home_score
        } else {
            None
        }
    }
}

/// Per-team, per-game box score aggregates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamGameStat {
    pub team: TeamId,
    pub game: GameId,
    pub pass_attempts: u32,
    pub pass_completions: u32,
    pub pass_yards: i32,
    pub pass_touchdowns: u32,
    pub rush_attempts: u32,
    pub rush_yards: i32,
    pub rush_touchdowns: u32,
    pub interceptions: u32,
    pub fumbles_lost: u32,
    pub sacks: u32,
    pub def_sacks: u32,
    pub def_interceptions: u32,
    pub def_fumbles_forced: u32,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum GridironError {
    #[error("Game store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    #[error("Insufficient history for {team} before {cutoff}: has {games} games, need {required}")]
    InsufficientHistory {
        team: TeamId,
        cutoff: NaiveDate,
        games: usize,
        required: usize,
    },

    #[error("Insufficient training data: {samples} games, need at least {required}")]
    InsufficientTrainingData { samples: usize, required: usize },

    #[error("Model version already exists: {0}")]
    DuplicateVersion(String),

    #[error("Model version not found: {0}")]
    NotFound(String),

    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, GridironError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Most recent games averaged into offensive/defensive features
    pub window_size: usize,
    /// Games required before a team's features can be built
    pub min_history: usize,
    /// Games inspected for win percentage and streak
    pub trend_window: usize,
    /// Temperature used for indoor venues and unknown readings
    pub neutral_temperature: f32,
    pub default_rest_days: i64,
    pub max_rest_days: i64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig {
            window_size: 5,
            min_history: 3,
            trend_window: 5,
            neutral_temperature: 70.0,
            default_rest_days: 7,
            max_rest_days: 14,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Earliest week included in a training set
    pub min_week: u32,
    /// Runs with fewer usable games are rejected before training
    pub min_samples: usize,
    pub stage: Stage,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            min_week: 4,
            min_samples: 100,
            stage: Stage::Reg,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    /// Fraction of the most recent games held out for evaluation
    pub holdout_ratio: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            learning_rate: 0.05,
            epochs: 300,
            holdout_ratio: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub database_path: String,
    pub model_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            database_path: "data/gridiron.db".to_string(),
            model_dir: "models".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GridironError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| GridironError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GridironError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

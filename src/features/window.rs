//! Causal game selection
//!
//! Every feature group is computed from a window of completed games that a
//! team played strictly before a cutoff date, most recent first.

use chrono::NaiveDate;

use crate::data::store::{GameQuery, GameStore};
use crate::features::trend::Outcome;
use crate::{Game, GameId, GridironError, Result, TeamId};

/// Most recent completed games for a team before a cutoff
#[derive(Debug, Clone)]
pub struct GameWindow {
    team: TeamId,
    cutoff: NaiveDate,
    /// Most recent first
    games: Vec<Game>,
}

impl GameWindow {
    /// Load up to `size` completed games `team` played before `cutoff`.
    ///
    /// Seasons are not a boundary: early in a season the window is filled
    /// from the end of the previous one.
    pub fn load<S: GameStore>(store: &S, team: TeamId, cutoff: NaiveDate, size: usize) -> Result<Self> {
        let games = if size == 0 {
            Vec::new()
        } else {
            store.find_games(&GameQuery::recent_completed(team, cutoff, size))?
        };

        // Nothing on or after the cutoff may reach a feature.
        let games = games
            .into_iter()
            .filter(|g| g.date < cutoff && g.is_completed() && g.is_home(team).is_some())
            .collect();

        Ok(GameWindow { team, cutoff, games })
    }

    /// Fail with `InsufficientHistory` unless at least `required` games were found
    pub fn require(self, required: usize) -> Result<Self> {
        if self.games.len() < required {
            return Err(GridironError::InsufficientHistory {
                team: self.team,
                cutoff: self.cutoff,
                games: self.games.len(),
                required,
            });
        }
        Ok(self)
    }

    pub fn team(&self) -> TeamId {
        self.team
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn game_ids(&self) -> Vec<GameId> {
        self.games.iter().map(|g| g.id.clone()).collect()
    }

    /// Points scored by the team in each game
    pub fn points_for(&self) -> Vec<f32> {
        self.games
            .iter()
            .map(|g| g.score_for(self.team).unwrap_or(0) as f32)
            .collect()
    }

    /// Points scored by the opponent in each game
    pub fn points_against(&self) -> Vec<f32> {
        self.games
            .iter()
            .map(|g| g.score_against(self.team).unwrap_or(0) as f32)
            .collect()
    }

    /// Results from the team's perspective, most recent first
    pub fn outcomes(&self) -> Vec<Outcome> {
        self.games
            .iter()
            .filter_map(|g| Outcome::for_team(g, self.team))
            .collect()
    }

    /// Date of the most recent game in the window
    pub fn last_played(&self) -> Option<NaiveDate> {
        self.games.first().map(|g| g.date)
    }
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Average of one counter over a set of box score rows, 0 when there are none
pub fn average_by<T>(rows: &[T], field: impl Fn(&T) -> f32) -> f32 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(field).sum::<f32>() / rows.len() as f32
}

/// `numerator / denominator * 100`, 0 when the denominator is not positive
pub fn percentage(numerator: f32, denominator: f32) -> f32 {
    if denominator <= 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

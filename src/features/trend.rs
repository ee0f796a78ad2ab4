//! Recent form: win percentage and current streak

use crate::{Game, TeamId};

/// Result of a completed game from one team's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

impl Outcome {
    pub fn for_team(game: &Game, team: TeamId) -> Option<Self> {
        let (for_, against) = (game.score_for(team)?, game.score_against(team)?);
        Some(match for_.cmp(&against) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Less => Outcome::Loss,
            std::cmp::Ordering::Equal => Outcome::Tie,
        })
    }

    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Win)
    }
}

/// Trend features for one team
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendFeatures {
    /// Share of recent games won (ties are not wins), 0.5 without history
    pub recent_win_pct: f32,
    /// Positive = consecutive wins, negative = consecutive non-wins
    pub current_streak: f32,
}

impl Default for TrendFeatures {
    fn default() -> Self {
        TrendFeatures {
            recent_win_pct: 0.5,
            current_streak: 0.0,
        }
    }
}

impl TrendFeatures {
    pub const DIM: usize = 2;

    pub const NAMES: [&'static str; Self::DIM] = ["recent_win_pct", "current_streak"];

    /// Compute from results ordered most recent first
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        if outcomes.is_empty() {
            return Self::default();
        }

        let wins = outcomes.iter().filter(|o| o.is_win()).count();
        TrendFeatures {
            recent_win_pct: wins as f32 / outcomes.len() as f32,
            current_streak: current_streak(outcomes) as f32,
        }
    }

    pub fn to_array(&self) -> [f32; Self::DIM] {
        [self.recent_win_pct, self.current_streak]
    }
}

/// Signed streak from results ordered most recent first.
///
/// The scan stops at the first result that breaks the streak started by the
/// most recent game. Ties count as non-wins.
pub fn current_streak(outcomes: &[Outcome]) -> i32 {
    let Some(first) = outcomes.first() else {
        return 0;
    };

    let winning = first.is_win();
    let length = outcomes
        .iter()
        .take_while(|o| o.is_win() == winning)
        .count() as i32;

    if winning {
        length
    } else {
        -length
    }
}

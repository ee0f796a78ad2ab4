//! Defensive features: what opponents managed, and what the defense forced

use crate::features::window::{average_by, mean, GameWindow};
use crate::TeamGameStat;

/// Defensive features for one team
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DefensiveFeatures {
    pub pass_yards_allowed: f32,
    pub rush_yards_allowed: f32,
    pub total_yards_allowed: f32,
    pub points_allowed: f32,
    pub sacks: f32,
    pub interceptions: f32,
    /// Interceptions + fumbles forced
    pub turnovers_forced: f32,
}

impl DefensiveFeatures {
    pub const DIM: usize = 7;

    pub const NAMES: [&'static str; Self::DIM] = [
        "def_pass_yards_allowed",
        "def_rush_yards_allowed",
        "def_total_yards_allowed",
        "def_points_allowed",
        "def_sacks",
        "def_interceptions",
        "def_turnovers_forced",
    ];

    /// `game_stats` holds every team's rows for the window's games; rows of
    /// other teams are the yardage allowed, the team's own rows supply the
    /// defensive counters.
    pub fn from_window(window: &GameWindow, game_stats: &[TeamGameStat]) -> Self {
        let team = window.team();
        let (own, opponents): (Vec<&TeamGameStat>, Vec<&TeamGameStat>) =
            game_stats.iter().partition(|s| s.team == team);

        let pass_yards_allowed = average_by(&opponents, |s| s.pass_yards as f32);
        let rush_yards_allowed = average_by(&opponents, |s| s.rush_yards as f32);
        let interceptions = average_by(&own, |s| s.def_interceptions as f32);

        DefensiveFeatures {
            pass_yards_allowed,
            rush_yards_allowed,
            total_yards_allowed: pass_yards_allowed + rush_yards_allowed,
            points_allowed: mean(&window.points_against()),
            sacks: average_by(&own, |s| s.def_sacks as f32),
            interceptions,
            turnovers_forced: interceptions + average_by(&own, |s| s.def_fumbles_forced as f32),
        }
    }

    pub fn to_array(&self) -> [f32; Self::DIM] {
        [
            self.pass_yards_allowed,
            self.rush_yards_allowed,
            self.total_yards_allowed,
            self.points_allowed,
            self.sacks,
            self.interceptions,
            self.turnovers_forced,
        ]
    }
}

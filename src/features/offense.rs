//! Offensive production averaged over a team's recent games

use crate::features::window::{average_by, mean, percentage, GameWindow};
use crate::TeamGameStat;

/// Offensive features for one team
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OffensiveFeatures {
    pub pass_yards: f32,
    pub pass_tds: f32,
    /// Average completions / average attempts * 100, 0 without attempts
    pub completion_pct: f32,
    pub rush_yards: f32,
    pub rush_tds: f32,
    /// pass_yards + rush_yards
    pub total_yards: f32,
    pub points_scored: f32,
    /// Interceptions thrown + fumbles lost
    pub turnovers: f32,
}

impl OffensiveFeatures {
    pub const DIM: usize = 8;

    pub const NAMES: [&'static str; Self::DIM] = [
        "off_pass_yards",
        "off_pass_tds",
        "off_completion_pct",
        "off_rush_yards",
        "off_rush_tds",
        "off_total_yards",
        "off_points_scored",
        "off_turnovers",
    ];

    /// Aggregate the team's own box scores and points over the window.
    ///
    /// Counters are averaged over the rows that exist; points are averaged
    /// over every game in the window.
    pub fn from_window(window: &GameWindow, own_stats: &[TeamGameStat]) -> Self {
        let pass_yards = average_by(own_stats, |s| s.pass_yards as f32);
        let rush_yards = average_by(own_stats, |s| s.rush_yards as f32);
        let pass_attempts = average_by(own_stats, |s| s.pass_attempts as f32);
        let pass_completions = average_by(own_stats, |s| s.pass_completions as f32);

        if !own_stats.is_empty() && pass_attempts <= 0.0 {
            log::warn!(
                "{} has no pass attempts in {} games before {}; completion % set to 0",
                window.team(),
                own_stats.len(),
                window.cutoff()
            );
        }

        OffensiveFeatures {
            pass_yards,
            pass_tds: average_by(own_stats, |s| s.pass_touchdowns as f32),
            completion_pct: percentage(pass_completions, pass_attempts),
            rush_yards,
            rush_tds: average_by(own_stats, |s| s.rush_touchdowns as f32),
            total_yards: pass_yards + rush_yards,
            points_scored: mean(&window.points_for()),
            turnovers: average_by(own_stats, |s| s.interceptions as f32)
                + average_by(own_stats, |s| s.fumbles_lost as f32),
        }
    }

    pub fn to_array(&self) -> [f32; Self::DIM] {
        [
            self.pass_yards,
            self.pass_tds,
            self.completion_pct,
            self.rush_yards,
            self.rush_tds,
            self.total_yards,
            self.points_scored,
            self.turnovers,
        ]
    }
}

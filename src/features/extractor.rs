//! Point-in-time feature extraction for a game
//!
//! Produces the fixed 44-value vector used for training and prediction:
//! 22 values for the home team followed by the same 22 for the away team.
//! Every value is derived from games completed strictly before the game
//! date, so a vector for a past game never sees that game or anything later.

use chrono::NaiveDate;

use crate::data::store::GameStore;
use crate::features::defense::DefensiveFeatures;
use crate::features::offense::OffensiveFeatures;
use crate::features::situational::SituationalFeatures;
use crate::features::trend::TrendFeatures;
use crate::features::window::GameWindow;
use crate::{FeatureConfig, Game, Result, TeamId};

/// Number of values in a game feature vector
pub const FEATURE_DIM: usize = 2 * TeamFeatures::DIM;

const _: () = assert!(FEATURE_DIM == 44);

/// Ordered feature vector for one game
pub type FeatureVector = [f32; FEATURE_DIM];

/// All feature groups for one team in one game
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamFeatures {
    pub offense: OffensiveFeatures,
    pub defense: DefensiveFeatures,
    pub situational: SituationalFeatures,
    pub trend: TrendFeatures,
}

impl TeamFeatures {
    pub const DIM: usize = OffensiveFeatures::DIM
        + DefensiveFeatures::DIM
        + SituationalFeatures::DIM
        + TrendFeatures::DIM;

    /// Offense, defense, situational, trend
    pub fn to_array(&self) -> [f32; Self::DIM] {
        let mut out = [0.0; Self::DIM];
        let mut offset = 0;
        for part in [
            &self.offense.to_array()[..],
            &self.defense.to_array()[..],
            &self.situational.to_array()[..],
            &self.trend.to_array()[..],
        ] {
            out[offset..offset + part.len()].copy_from_slice(part);
            offset += part.len();
        }
        out
    }

    /// Unprefixed names in vector order
    pub fn names() -> impl Iterator<Item = &'static str> {
        OffensiveFeatures::NAMES
            .into_iter()
            .chain(DefensiveFeatures::NAMES)
            .chain(SituationalFeatures::NAMES)
            .chain(TrendFeatures::NAMES)
    }
}

/// Home and away features for one game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameFeatures {
    pub home: TeamFeatures,
    pub away: TeamFeatures,
}

impl GameFeatures {
    pub fn to_array(&self) -> FeatureVector {
        let mut out = [0.0; FEATURE_DIM];
        out[..TeamFeatures::DIM].copy_from_slice(&self.home.to_array());
        out[TeamFeatures::DIM..].copy_from_slice(&self.away.to_array());
        out
    }
}

/// Stable feature names in vector order, `home_*` then `away_*`
pub fn feature_names() -> Vec<String> {
    ["home", "away"]
        .iter()
        .flat_map(|side| TeamFeatures::names().map(move |name| format!("{side}_{name}")))
        .collect()
}

/// Computes team and game features from a read-only game store
pub struct FeatureExtractor<S> {
    store: S,
    config: FeatureConfig,
}

impl<S: GameStore> FeatureExtractor<S> {
    pub fn new(store: S, config: FeatureConfig) -> Self {
        FeatureExtractor { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn window(&self, team: TeamId, cutoff: NaiveDate, window_size: usize) -> Result<GameWindow> {
        GameWindow::load(&self.store, team, cutoff, window_size)?.require(self.config.min_history)
    }

    fn offense_from(&self, window: &GameWindow) -> Result<OffensiveFeatures> {
        let own = self.store.find_team_stats(window.team(), &window.game_ids())?;
        Ok(OffensiveFeatures::from_window(window, &own))
    }

    fn defense_from(&self, window: &GameWindow) -> Result<DefensiveFeatures> {
        let all = self.store.find_game_stats(&window.game_ids())?;
        Ok(DefensiveFeatures::from_window(window, &all))
    }

    /// Offensive averages over the last `window_size` completed games before `cutoff`
    pub fn offensive_features(
        &self,
        team: TeamId,
        cutoff: NaiveDate,
        window_size: usize,
    ) -> Result<OffensiveFeatures> {
        let window = self.window(team, cutoff, window_size)?;
        self.offense_from(&window)
    }

    /// Defensive averages over the last `window_size` completed games before `cutoff`
    pub fn defensive_features(
        &self,
        team: TeamId,
        cutoff: NaiveDate,
        window_size: usize,
    ) -> Result<DefensiveFeatures> {
        let window = self.window(team, cutoff, window_size)?;
        self.defense_from(&window)
    }

    /// Venue, weather and rest for `team` in `game`.
    ///
    /// Rest is measured from the team's last completed game before the game
    /// date; it never fails for a team without history.
    pub fn situational_features(&self, game: &Game, team: TeamId) -> Result<SituationalFeatures> {
        let last = GameWindow::load(&self.store, team, game.date, 1)?;
        Ok(SituationalFeatures::compute(
            game,
            team,
            last.last_played(),
            &self.config,
        ))
    }

    /// Win percentage and streak over the last `trend_window` completed games
    pub fn trend_features(&self, team: TeamId, cutoff: NaiveDate) -> Result<TrendFeatures> {
        let window = GameWindow::load(&self.store, team, cutoff, self.config.trend_window)?;
        Ok(TrendFeatures::from_outcomes(&window.outcomes()))
    }

    /// Every feature group for one side of a game
    pub fn team_features(&self, game: &Game, team: TeamId) -> Result<TeamFeatures> {
        let window = self.window(team, game.date, self.config.window_size)?;

        Ok(TeamFeatures {
            offense: self.offense_from(&window)?,
            defense: self.defense_from(&window)?,
            situational: SituationalFeatures::compute(
                game,
                team,
                window.last_played(),
                &self.config,
            ),
            trend: self.trend_features(team, game.date)?,
        })
    }

    /// Full feature set for a game, home side first.
    ///
    /// Fails with `InsufficientHistory` if either team has fewer than
    /// `min_history` completed games before the game date.
    pub fn build_game_features(&self, game: &Game) -> Result<GameFeatures> {
        let home = self.team_features(game, game.home_team)?;
        let away = self.team_features(game, game.away_team)?;
        Ok(GameFeatures { home, away })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::Fixture;
    use crate::{GridironError, Roof, TeamGameStat};

    const EPS: f32 = 0.01;

    fn stat(team: TeamId, game: &Game, pass_yards: i32) -> TeamGameStat {
        TeamGameStat {
            team,
            game: game.id.clone(),
            pass_attempts: 30,
            pass_completions: 20,
            pass_yards,
            rush_yards: 100,
            ..Default::default()
        }
    }

    /// Team 0 plays team 1 on days 1, 8 and 15, scoring 24, 17 and 30
    fn three_game_history() -> Fixture {
        let fx = Fixture::new(3);
        let (a, b) = (fx.team(0), fx.team(1));
        for (i, (day, home, away, score)) in [
            (1, a, b, (24, 10)),
            (8, b, a, (21, 17)),
            (15, a, b, (30, 30)),
        ]
        .into_iter()
        .enumerate()
        {
            let game = fx.add_game(&format!("g{i}"), fx.day(day), home, away, Some(score));
            fx.add_stat(stat(a, &game, 200 + 10 * i as i32));
            fx.add_stat(stat(b, &game, 250));
        }
        fx
    }

    #[test]
    fn test_feature_names_match_vector() {
        let names = feature_names();
        assert_eq!(names.len(), FEATURE_DIM);
        assert_eq!(names[0], "home_off_pass_yards");
        assert_eq!(names[21], "home_current_streak");
        assert_eq!(names[22], "away_off_pass_yards");
        assert_eq!(names[43], "away_current_streak");

        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), FEATURE_DIM);
    }

    #[test]
    fn test_offense_averages_window() {
        let fx = three_game_history();
        let extractor = FeatureExtractor::new(&fx.db, FeatureConfig::default());
        let offense = extractor
            .offensive_features(fx.team(0), fx.day(20), 5)
            .unwrap();

        assert!((offense.points_scored - 23.67).abs() < EPS);
        assert!((offense.pass_yards - 210.0).abs() < EPS);
        assert!((offense.total_yards - 310.0).abs() < EPS);
        assert!((offense.completion_pct - 66.67).abs() < EPS);
    }

    #[test]
    fn test_window_keeps_most_recent_games() {
        let fx = Fixture::new(2);
        let (a, b) = (fx.team(0), fx.team(1));
        for (i, points) in [50, 40, 24, 17, 30].into_iter().enumerate() {
            let day = 1 + 7 * i as i64;
            let game = fx.add_game(&format!("g{i}"), fx.day(day), a, b, Some((points, 0)));
            fx.add_stat(stat(a, &game, 100 * (i as i32 + 1)));
        }

        let extractor = FeatureExtractor::new(&fx.db, FeatureConfig::default());
        let offense = extractor.offensive_features(a, fx.day(60), 3).unwrap();
        assert!((offense.points_scored - 23.67).abs() < EPS);
        assert!((offense.pass_yards - 400.0).abs() < EPS);

        let all = extractor.offensive_features(a, fx.day(60), 10).unwrap();
        assert!((all.points_scored - 32.2).abs() < EPS);
    }

    #[test]
    fn test_window_reaches_into_previous_season() {
        let fx = Fixture::new(2);
        let (a, b) = (fx.team(0), fx.team(1));
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        fx.add_game_in("2022_16", 2022, 16, date(2022, 12, 24), a, b, Some((14, 10)));
        fx.add_game_in("2022_17", 2022, 17, date(2023, 1, 1), b, a, Some((3, 20)));
        fx.add_game_in("2023_01", 2023, 1, date(2023, 9, 10), a, b, Some((26, 7)));
        let game = fx.add_game_in("2023_02", 2023, 2, date(2023, 9, 17), b, a, None);

        let extractor = FeatureExtractor::new(&fx.db, FeatureConfig::default());
        let offense = extractor.offensive_features(a, game.date, 5).unwrap();
        assert!((offense.points_scored - 20.0).abs() < EPS);

        let features = extractor.build_game_features(&game).unwrap();
        assert_eq!(features.away.trend.recent_win_pct, 1.0);
        assert_eq!(features.away.trend.current_streak, 3.0);
    }

    #[test]
    fn test_defense_uses_opponent_rows() {
        let fx = three_game_history();
        let extractor = FeatureExtractor::new(&fx.db, FeatureConfig::default());
        let defense = extractor
            .defensive_features(fx.team(0), fx.day(20), 5)
            .unwrap();

        assert!((defense.pass_yards_allowed - 250.0).abs() < EPS);
        assert!((defense.points_allowed - (10.0 + 21.0 + 30.0) / 3.0).abs() < EPS);
    }

    #[test]
    fn test_insufficient_history() {
        let fx = three_game_history();
        let extractor = FeatureExtractor::new(&fx.db, FeatureConfig::default());

        // Only two games precede day 15
        let err = extractor
            .offensive_features(fx.team(0), fx.day(15), 5)
            .unwrap_err();
        assert!(matches!(
            err,
            GridironError::InsufficientHistory { games: 2, required: 3, .. }
        ));

        let err = extractor
            .defensive_features(fx.team(0), fx.day(15), 5)
            .unwrap_err();
        assert!(matches!(
            err,
            GridironError::InsufficientHistory { games: 2, required: 3, .. }
        ));

        // Team 2 has never played
        let game = fx.add_game("next", fx.day(22), fx.team(0), fx.team(2), None);
        assert!(matches!(
            extractor.build_game_features(&game),
            Err(GridironError::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn test_trend_counts_tie_as_non_win() {
        let fx = three_game_history();
        let extractor = FeatureExtractor::new(&fx.db, FeatureConfig::default());
        let trend = extractor.trend_features(fx.team(0), fx.day(20)).unwrap();

        // Most recent first: tie, loss, win
        assert!((trend.recent_win_pct - 1.0 / 3.0).abs() < EPS);
        assert_eq!(trend.current_streak, -2.0);
    }

    #[test]
    fn test_game_vector_layout_and_idempotence() {
        let fx = three_game_history();
        let game = fx.add_game("next", fx.day(22), fx.team(1), fx.team(0), None);
        let extractor = FeatureExtractor::new(&fx.db, FeatureConfig::default());

        let first = extractor.build_game_features(&game).unwrap().to_array();
        let second = extractor.build_game_features(&game).unwrap().to_array();
        assert_eq!(first, second);
        assert_eq!(first.len(), FEATURE_DIM);

        // is_home sits at offset 15 of each side; rest days at offset 19
        assert_eq!(first[15], 1.0);
        assert_eq!(first[22 + 15], 0.0);
        assert_eq!(first[19], 7.0);
    }

    #[test]
    fn test_later_results_do_not_leak() {
        let fx = three_game_history();
        let (a, b) = (fx.team(0), fx.team(1));
        let game = fx.add_game("target", fx.day(22), a, b, Some((3, 0)));
        let extractor = FeatureExtractor::new(&fx.db, FeatureConfig::default());
        let before = extractor.build_game_features(&game).unwrap().to_array();

        // Rewrite the target game's own box score and add a later game
        fx.add_stat(stat(a, &game, 999));
        let later = fx.add_game("later", fx.day(29), a, b, Some((50, 0)));
        fx.add_stat(stat(a, &later, 999));
        fx.add_stat(stat(b, &later, 0));

        let after = extractor.build_game_features(&game).unwrap().to_array();
        assert_eq!(before, after);
    }

    #[test]
    fn test_indoor_game_weather() {
        let fx = three_game_history();
        let mut game = fx.add_game("dome", fx.day(22), fx.team(0), fx.team(1), None);
        game.roof = Roof::Dome;
        game.temperature = Some(20);
        game.wind = Some(30);

        let extractor = FeatureExtractor::new(&fx.db, FeatureConfig::default());
        let sit = extractor.situational_features(&game, fx.team(0)).unwrap();
        assert_eq!(sit.temperature, 70.0);
        assert_eq!(sit.wind, 0.0);
        assert_eq!(sit.is_dome, 1.0);
        assert_eq!(sit.rest_days, 7.0);
    }

    #[test]
    fn test_zero_pass_attempts() {
        let fx = Fixture::new(2);
        let (a, b) = (fx.team(0), fx.team(1));
        for day in [1, 8, 15] {
            let game = fx.add_game(&format!("g{day}"), fx.day(day), a, b, Some((7, 3)));
            fx.add_stat(TeamGameStat {
                team: a,
                game: game.id.clone(),
                rush_yards: 150,
                ..Default::default()
            });
        }

        let extractor = FeatureExtractor::new(&fx.db, FeatureConfig::default());
        let offense = extractor.offensive_features(a, fx.day(16), 5).unwrap();
        assert_eq!(offense.completion_pct, 0.0);
        assert!(offense.completion_pct.is_finite());
    }
}

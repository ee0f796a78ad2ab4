//! Game context: venue, weather and rest

use chrono::NaiveDate;

use crate::{FeatureConfig, Game, TeamId};

/// Situational features for one team in one game
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SituationalFeatures {
    /// 1.0 = home, 0.0 = away
    pub is_home: f32,
    pub temperature: f32,
    pub wind: f32,
    /// 1.0 for dome, closed or retractable roof
    pub is_dome: f32,
    /// Days since the team's previous completed game, capped
    pub rest_days: f32,
}

impl SituationalFeatures {
    pub const DIM: usize = 5;

    pub const NAMES: [&'static str; Self::DIM] =
        ["is_home", "temperature", "wind", "is_dome", "rest_days"];

    /// `last_played` is the date of the team's most recent completed game
    /// before this one, if any.
    pub fn compute(
        game: &Game,
        team: TeamId,
        last_played: Option<NaiveDate>,
        config: &FeatureConfig,
    ) -> Self {
        let indoor = game.roof.is_indoor();

        let (temperature, wind) = if indoor {
            (config.neutral_temperature, 0.0)
        } else {
            (
                game.temperature
                    .map(|t| t as f32)
                    .unwrap_or(config.neutral_temperature),
                game.wind.unwrap_or(0) as f32,
            )
        };

        let rest_days = last_played
            .map(|last| (game.date - last).num_days())
            .unwrap_or(config.default_rest_days)
            .min(config.max_rest_days);

        SituationalFeatures {
            is_home: if game.home_team == team { 1.0 } else { 0.0 },
            temperature,
            wind,
            is_dome: if indoor { 1.0 } else { 0.0 },
            rest_days: rest_days as f32,
        }
    }

    pub fn to_array(&self) -> [f32; Self::DIM] {
        [
            self.is_home,
            self.temperature,
            self.wind,
            self.is_dome,
            self.rest_days,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameId, Roof, Stage};

    fn make_game(roof: Roof, temperature: Option<i32>, wind: Option<i32>) -> Game {
        Game {
            id: GameId::from("g"),
            season: 2023,
            week: 6,
            date: NaiveDate::from_ymd_opt(2023, 10, 15).unwrap(),
            stage: Stage::Reg,
            home_team: TeamId(1),
            away_team: TeamId(2),
            home_score: None,
            away_score: None,
            roof,
            temperature,
            wind,
        }
    }

    #[test]
    fn test_outdoor_weather_passes_through() {
        let config = FeatureConfig::default();
        let game = make_game(Roof::Outdoors, Some(38), Some(17));
        let sit = SituationalFeatures::compute(&game, TeamId(1), None, &config);
        assert_eq!(sit.is_home, 1.0);
        assert_eq!(sit.temperature, 38.0);
        assert_eq!(sit.wind, 17.0);
        assert_eq!(sit.is_dome, 0.0);
    }

    #[test]
    fn test_indoor_weather_is_neutral() {
        let config = FeatureConfig::default();
        for roof in [Roof::Dome, Roof::Closed, Roof::Retractable] {
            let game = make_game(roof, Some(20), Some(25));
            let sit = SituationalFeatures::compute(&game, TeamId(2), None, &config);
            assert_eq!(sit.is_home, 0.0);
            assert_eq!(sit.temperature, 70.0);
            assert_eq!(sit.wind, 0.0);
            assert_eq!(sit.is_dome, 1.0);
        }
    }

    #[test]
    fn test_missing_outdoor_readings() {
        let config = FeatureConfig::default();
        let game = make_game(Roof::Open, None, None);
        let sit = SituationalFeatures::compute(&game, TeamId(1), None, &config);
        assert_eq!(sit.temperature, 70.0);
        assert_eq!(sit.wind, 0.0);
    }

    #[test]
    fn test_rest_days_default_and_cap() {
        let config = FeatureConfig::default();
        let game = make_game(Roof::Dome, None, None);

        let no_history = SituationalFeatures::compute(&game, TeamId(1), None, &config);
        assert_eq!(no_history.rest_days, 7.0);

        let short_week = NaiveDate::from_ymd_opt(2023, 10, 11);
        let sit = SituationalFeatures::compute(&game, TeamId(1), short_week, &config);
        assert_eq!(sit.rest_days, 4.0);

        let after_bye = NaiveDate::from_ymd_opt(2023, 9, 24);
        let sit = SituationalFeatures::compute(&game, TeamId(1), after_bye, &config);
        assert_eq!(sit.rest_days, 14.0);
    }
}

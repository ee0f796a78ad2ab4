//! In-memory league fixtures shared by unit tests

use chrono::{Datelike, Duration, NaiveDate};

use crate::data::Database;
use crate::{Game, GameId, Roof, Stage, TeamGameStat, TeamId};

pub(crate) struct Fixture {
    pub db: Database,
    teams: Vec<TeamId>,
}

impl Fixture {
    /// Empty league with `n` teams named T0, T1, ...
    pub fn new(n: usize) -> Self {
        let db = Database::in_memory().unwrap();
        let teams = (0..n)
            .map(|i| {
                db.get_or_create_team(&format!("T{i}"), &format!("Team {i}"))
                    .unwrap()
                    .id
            })
            .collect();
        Fixture { db, teams }
    }

    /// Four teams playing two games a week, every week, each season.
    /// Both box scores are recorded for every game.
    pub fn league(seasons: &[i32], weeks: u32) -> Self {
        const ROUNDS: [[(usize, usize); 2]; 3] = [[(0, 1), (2, 3)], [(0, 2), (3, 1)], [(3, 0), (1, 2)]];

        let fx = Fixture::new(4);
        for &season in seasons {
            let opener = NaiveDate::from_ymd_opt(season, 9, 7).unwrap();
            for week in 1..=weeks {
                let date = opener + Duration::days(7 * (week as i64 - 1));
                let round = ROUNDS[(week as usize - 1) % ROUNDS.len()];
                for (slot, &(h, a)) in round.iter().enumerate() {
                    let (h, a) = if (week - 1) / 3 % 2 == 1 { (a, h) } else { (h, a) };
                    let home_score = 10 + ((season as u32 * 7 + week * 5 + h as u32 * 11) % 24) as u16;
                    let away_score = 7 + ((season as u32 * 3 + week * 13 + a as u32 * 7) % 24) as u16;

                    let id = format!("{season}_{week:02}_{slot}");
                    let game = fx.add_game_in(
                        &id,
                        season,
                        week,
                        date,
                        fx.team(h),
                        fx.team(a),
                        Some((home_score, away_score)),
                    );

                    for (team, points, seed) in [(game.home_team, home_score, h), (game.away_team, away_score, a)] {
                        fx.add_stat(Self::box_score(team, &game.id, points, week, seed as u32));
                    }
                }
            }
        }
        fx
    }

    fn box_score(team: TeamId, game: &GameId, points: u16, week: u32, seed: u32) -> TeamGameStat {
        let points = points as u32;
        TeamGameStat {
            team,
            game: game.clone(),
            pass_attempts: 28 + (week + seed) % 9,
            pass_completions: 18 + (week * 3 + seed) % 7,
            pass_yards: 150 + (points * 5) as i32,
            pass_touchdowns: points / 10,
            rush_attempts: 20 + seed,
            rush_yards: 70 + ((week * 11 + seed * 5) % 60) as i32,
            rush_touchdowns: points / 14,
            interceptions: (week + seed) % 3,
            fumbles_lost: (week * seed) % 2,
            sacks: (week + 2 * seed) % 4,
            def_sacks: (week * 2 + seed) % 5,
            def_interceptions: (week + seed + 1) % 3,
            def_fumbles_forced: (week + seed) % 2,
        }
    }

    pub fn team(&self, i: usize) -> TeamId {
        self.teams[i]
    }

    /// Day `n` of the 2023 season, day 1 = 2023-09-01
    pub fn day(&self, n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 9, 1).unwrap() + Duration::days(n - 1)
    }

    /// Add a regular season game in an outdoor stadium without weather readings
    pub fn add_game(
        &self,
        id: &str,
        date: NaiveDate,
        home: TeamId,
        away: TeamId,
        score: Option<(u16, u16)>,
    ) -> Game {
        let opener = NaiveDate::from_ymd_opt(date.year(), 9, 1).unwrap();
        let week = ((date - opener).num_days() / 7 + 1).max(1) as u32;
        self.add_game_in(id, date.year(), week, date, home, away, score)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_game_in(
        &self,
        id: &str,
        season: i32,
        week: u32,
        date: NaiveDate,
        home: TeamId,
        away: TeamId,
        score: Option<(u16, u16)>,
    ) -> Game {
        let game = Game {
            id: GameId::from(id),
            season,
            week,
            date,
            stage: Stage::Reg,
            home_team: home,
            away_team: away,
            home_score: score.map(|s| s.0),
            away_score: score.map(|s| s.1),
            roof: Roof::Outdoors,
            temperature: None,
            wind: None,
        };
        self.db.upsert_game(&game).unwrap();
        game
    }

    pub fn add_stat(&self, stat: TeamGameStat) {
        self.db.upsert_team_stat(&stat).unwrap();
    }
}

//! JSON import of teams, games and box scores
//!
//! Games and stats refer to teams by abbreviation; teams are created on
//! first sight.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::data::Database;
use crate::{Game, GameId, GridironError, Result, Roof, Stage, TeamGameStat, TeamId};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImportFile {
    pub teams: Vec<TeamRecord>,
    pub games: Vec<GameRecord>,
    pub team_stats: Vec<StatRecord>,
}

#[derive(Debug, Deserialize)]
pub struct TeamRecord {
    pub abbreviation: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub season: i32,
    pub week: u32,
    pub date: NaiveDate,
    #[serde(default = "default_stage")]
    pub stage: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u16>,
    pub away_score: Option<u16>,
    #[serde(default)]
    pub roof: Option<String>,
    pub temperature: Option<i32>,
    pub wind: Option<i32>,
}

fn default_stage() -> String {
    Stage::Reg.code().to_string()
}

/// Box score keyed by team abbreviation; missing counters are 0
#[derive(Debug, Deserialize)]
pub struct StatRecord {
    pub team: String,
    pub game: String,
    #[serde(flatten)]
    pub counters: StatCounters,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatCounters {
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

/// Counts of records written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub teams: usize,
    pub games: usize,
    pub team_stats: usize,
}

/// Read and import a JSON file
pub fn import_file<P: AsRef<Path>>(db: &Database, path: P) -> Result<ImportSummary> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let file: ImportFile = serde_json::from_str(&content)
        .map_err(|e| GridironError::Parse(format!("{}: {}", path.display(), e)))?;
    file.import(db)
}

impl ImportFile {
    /// Upsert everything into `db` inside one transaction
    pub fn import(&self, db: &Database) -> Result<ImportSummary> {
        let tx = db.conn().unchecked_transaction()?;
        let mut teams: HashMap<String, TeamId> = HashMap::new();

        for record in &self.teams {
            let team = db.get_or_create_team(&record.abbreviation, &record.name)?;
            teams.insert(team.abbreviation, team.id);
        }

        let mut resolve = |abbreviation: &str| -> Result<TeamId> {
            let key = abbreviation.to_uppercase();
            if let Some(id) = teams.get(&key) {
                return Ok(*id);
            }
            let team = db.get_or_create_team(&key, &key)?;
            teams.insert(key, team.id);
            Ok(team.id)
        };

        let mut games = Vec::with_capacity(self.games.len());
        for record in &self.games {
            let stage = Stage::from_code(&record.stage).ok_or_else(|| {
                GridironError::Parse(format!("game {}: unknown stage '{}'", record.id, record.stage))
            })?;
            let roof = match record.roof.as_deref() {
                None | Some("") => Roof::default(),
                Some(code) => Roof::from_code(code).ok_or_else(|| {
                    GridironError::Parse(format!("game {}: unknown roof '{}'", record.id, code))
                })?,
            };

            games.push(Game {
                id: GameId(record.id.clone()),
                season: record.season,
                week: record.week,
                date: record.date,
                stage,
                home_team: resolve(&record.home_team)?,
                away_team: resolve(&record.away_team)?,
                home_score: record.home_score,
                away_score: record.away_score,
                roof,
                temperature: record.temperature,
                wind: record.wind,
            });
        }

        let mut stats = Vec::with_capacity(self.team_stats.len());
        for record in &self.team_stats {
            let c = &record.counters;
            stats.push(TeamGameStat {
                team: resolve(&record.team)?,
                game: GameId(record.game.clone()),
                pass_attempts: c.pass_attempts,
                pass_completions: c.pass_completions,
                pass_yards: c.pass_yards,
                pass_touchdowns: c.pass_touchdowns,
                rush_attempts: c.rush_attempts,
                rush_yards: c.rush_yards,
                rush_touchdowns: c.rush_touchdowns,
                interceptions: c.interceptions,
                fumbles_lost: c.fumbles_lost,
                sacks: c.sacks,
                def_sacks: c.def_sacks,
                def_interceptions: c.def_interceptions,
                def_fumbles_forced: c.def_fumbles_forced,
            });
        }

        let games = db.upsert_games(&games)?;
        let team_stats = db.upsert_team_stats(&stats)?;
        tx.commit()?;

        let summary = ImportSummary {
            teams: teams.len(),
            games,
            team_stats,
        };
        log::info!(
            "Imported {} teams, {} games, {} box scores",
            summary.teams,
            summary.games,
            summary.team_stats
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::{GameQuery, GameStore};

    const SAMPLE: &str = r#"{
        "teams": [
            {"abbreviation": "kc", "name": "Kansas City Chiefs"},
            {"abbreviation": "DET", "name": "Detroit Lions"}
        ],
        "games": [
            {"id": "2023_01_DET_KC", "season": 2023, "week": 1, "date": "2023-09-07",
             "home_team": "KC", "away_team": "DET", "home_score": 20, "away_score": 21,
             "roof": "outdoors", "temperature": 80, "wind": 5},
            {"id": "2023_02_KC_JAX", "season": 2023, "week": 2, "date": "2023-09-17",
             "home_team": "JAX", "away_team": "KC", "roof": "open"}
        ],
        "team_stats": [
            {"team": "KC", "game": "2023_01_DET_KC", "pass_attempts": 39,
             "pass_completions": 22, "pass_yards": 226, "def_sacks": 2},
            {"team": "det", "game": "2023_01_DET_KC", "pass_yards": 253}
        ]
    }"#;

    #[test]
    fn test_import_sample() {
        let db = Database::in_memory().unwrap();
        let file: ImportFile = serde_json::from_str(SAMPLE).unwrap();
        let summary = file.import(&db).unwrap();

        assert_eq!(summary.games, 2);
        assert_eq!(summary.team_stats, 2);
        // JAX is created from the schedule
        assert_eq!(summary.teams, 3);
        assert!(db.find_team("jax").unwrap().is_some());

        let kc = db.find_team("KC").unwrap().unwrap();
        let opener = db.get_game(&GameId::from("2023_01_DET_KC")).unwrap();
        assert_eq!(opener.home_team, kc.id);
        assert_eq!(opener.stage, Stage::Reg);
        assert_eq!(opener.temperature, Some(80));

        let upcoming = db.get_game(&GameId::from("2023_02_KC_JAX")).unwrap();
        assert!(!upcoming.is_completed());
        assert_eq!(upcoming.roof, Roof::Open);

        let stats = db.find_team_stats(kc.id, &[opener.id.clone()]).unwrap();
        assert_eq!(stats[0].pass_completions, 22);
        assert_eq!(stats[0].rush_yards, 0);

        let completed = db.find_games(&GameQuery::new().completed()).unwrap();
        assert_eq!(completed.len(), 1);
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let file: ImportFile = serde_json::from_str(SAMPLE).unwrap();
        file.import(&db).unwrap();
        file.import(&db).unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.team_count, 3);
        assert_eq!(stats.game_count, 2);
        assert_eq!(stats.stat_count, 2);
    }

    #[test]
    fn test_unknown_stage_is_rejected() {
        let db = Database::in_memory().unwrap();
        let file: ImportFile = serde_json::from_str(
            r#"{"games": [{"id": "x", "season": 2023, "week": 1, "date": "2023-09-07",
                "stage": "EXHIBITION", "home_team": "A", "away_team": "B"}]}"#,
        )
        .unwrap();
        assert!(matches!(file.import(&db), Err(GridironError::Parse(_))));
    }
}

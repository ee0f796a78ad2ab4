//! SQLite database management for games, box scores and model versions

use crate::data::store::{DateOrder, GameQuery, GameStore};
use crate::{Game, GameId, GridironError, Result, Roof, Stage, Team, TeamGameStat, TeamId};
use chrono::NaiveDate;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

const GAME_COLUMNS: &str = "id, season, week, date, stage, home_team_id, away_team_id,
     home_score, away_score, roof, temperature, wind";

const STAT_COLUMNS: &str = "team_id, game_id,
     COALESCE(pass_attempts, 0), COALESCE(pass_completions, 0), COALESCE(pass_yards, 0),
     COALESCE(pass_touchdowns, 0), COALESCE(rush_attempts, 0), COALESCE(rush_yards, 0),
     COALESCE(rush_touchdowns, 0), COALESCE(interceptions, 0), COALESCE(fumbles_lost, 0),
     COALESCE(sacks, 0), COALESCE(def_sacks, 0), COALESCE(def_interceptions, 0),
     COALESCE(def_fumbles_forced, 0)";

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                abbreviation TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS games (
                id TEXT PRIMARY KEY,
                season INTEGER NOT NULL,
                week INTEGER NOT NULL,
                date TEXT NOT NULL,
                stage TEXT NOT NULL DEFAULT 'REG',
                home_team_id INTEGER NOT NULL REFERENCES teams(id),
                away_team_id INTEGER NOT NULL REFERENCES teams(id),
                home_score INTEGER,
                away_score INTEGER,
                roof TEXT NOT NULL DEFAULT 'outdoors',
                temperature INTEGER,
                wind INTEGER
            );

            CREATE TABLE IF NOT EXISTS team_game_stats (
                team_id INTEGER NOT NULL REFERENCES teams(id),
                game_id TEXT NOT NULL REFERENCES games(id),
                pass_attempts INTEGER DEFAULT 0,
                pass_completions INTEGER DEFAULT 0,
                pass_yards INTEGER DEFAULT 0,
                pass_touchdowns INTEGER DEFAULT 0,
                rush_attempts INTEGER DEFAULT 0,
                rush_yards INTEGER DEFAULT 0,
                rush_touchdowns INTEGER DEFAULT 0,
                interceptions INTEGER DEFAULT 0,
                fumbles_lost INTEGER DEFAULT 0,
                sacks INTEGER DEFAULT 0,
                def_sacks INTEGER DEFAULT 0,
                def_interceptions INTEGER DEFAULT 0,
                def_fumbles_forced INTEGER DEFAULT 0,
                PRIMARY KEY (team_id, game_id)
            );

            CREATE TABLE IF NOT EXISTS model_versions (
                version TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                training_seasons TEXT NOT NULL DEFAULT '[]',
                training_samples INTEGER NOT NULL DEFAULT 0,
                winner_accuracy REAL NOT NULL DEFAULT 0,
                spread_mae REAL NOT NULL DEFAULT 0,
                total_mae REAL NOT NULL DEFAULT 0,
                winner_model_path TEXT NOT NULL DEFAULT '',
                spread_model_path TEXT NOT NULL DEFAULT '',
                total_model_path TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_games_date ON games(date);
            CREATE INDEX IF NOT EXISTS idx_games_season ON games(season, week);
            CREATE INDEX IF NOT EXISTS idx_games_teams ON games(home_team_id, away_team_id);
            CREATE INDEX IF NOT EXISTS idx_stats_game ON team_game_stats(game_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_model_versions_active
                ON model_versions(is_active) WHERE is_active = 1;
            "#,
        )?;
        Ok(())
    }

    // ==================== Team Operations ====================

    /// Get or create a team by abbreviation
    pub fn get_or_create_team(&self, abbreviation: &str, name: &str) -> Result<Team> {
        if let Some(team) = self.find_team(abbreviation)? {
            return Ok(team);
        }

        self.conn.execute(
            "INSERT INTO teams (abbreviation, name) VALUES (?1, ?2)",
            params![abbreviation.to_uppercase(), name],
        )?;

        Ok(Team {
            id: TeamId(self.conn.last_insert_rowid()),
            abbreviation: abbreviation.to_uppercase(),
            name: name.to_string(),
        })
    }

    /// Find a team by abbreviation (case-insensitive)
    pub fn find_team(&self, abbreviation: &str) -> Result<Option<Team>> {
        let team = self
            .conn
            .query_row(
                "SELECT id, abbreviation, name FROM teams WHERE abbreviation = ?1",
                params![abbreviation.to_uppercase()],
                Self::row_to_team,
            )
            .optional()?;
        Ok(team)
    }

    fn row_to_team(row: &rusqlite::Row) -> rusqlite::Result<Team> {
        Ok(Team {
            id: TeamId(row.get(0)?),
            abbreviation: row.get(1)?,
            name: row.get(2)?,
        })
    }

    // ==================== Game Operations ====================

    /// Insert or update a game; scores, weather and roof are refreshed on conflict
    pub fn upsert_game(&self, game: &Game) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO games (id, season, week, date, stage, home_team_id, away_team_id,
                               home_score, away_score, roof, temperature, wind)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(id) DO UPDATE SET
                season = excluded.season,
                week = excluded.week,
                date = excluded.date,
                stage = excluded.stage,
                home_score = excluded.home_score,
                away_score = excluded.away_score,
                roof = excluded.roof,
                temperature = COALESCE(excluded.temperature, temperature),
                wind = COALESCE(excluded.wind, wind)
            "#,
            params![
                game.id.0,
                game.season,
                game.week,
                game.date.format(DATE_FORMAT).to_string(),
                game.stage.code(),
                game.home_team.0,
                game.away_team.0,
                game.home_score,
                game.away_score,
                game.roof.code(),
                game.temperature,
                game.wind,
            ],
        )?;
        Ok(())
    }

    /// Upsert a batch of games, returning how many were written
    pub fn upsert_games(&self, games: &[Game]) -> Result<usize> {
        let mut count = 0;
        for game in games {
            self.upsert_game(game)?;
            count += 1;
        }
        Ok(count)
    }

    /// Get a game by id
    pub fn get_game(&self, id: &GameId) -> Result<Game> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM games WHERE id = ?1", GAME_COLUMNS),
                params![id.0],
                Self::row_to_game,
            )
            .optional()?
            .ok_or_else(|| GridironError::GameNotFound(id.clone()))
    }

    fn row_to_game(row: &rusqlite::Row) -> rusqlite::Result<Game> {
        let date_str: String = row.get(3)?;
        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

        let stage_str: String = row.get(4)?;
        let stage = Stage::from_code(&stage_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                format!("unknown stage '{}'", stage_str).into(),
            )
        })?;

        let roof_str: String = row.get(9)?;
        let roof = Roof::from_code(&roof_str).unwrap_or_default();

        Ok(Game {
            id: GameId(row.get(0)?),
            season: row.get(1)?,
            week: row.get(2)?,
            date,
            stage,
            home_team: TeamId(row.get(5)?),
            away_team: TeamId(row.get(6)?),
            home_score: row.get(7)?,
            away_score: row.get(8)?,
            roof,
            temperature: row.get(10)?,
            wind: row.get(11)?,
        })
    }

    // ==================== Box Score Operations ====================

    /// Insert or replace a team's box score for a game
    pub fn upsert_team_stat(&self, stat: &TeamGameStat) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO team_game_stats (
                team_id, game_id, pass_attempts, pass_completions, pass_yards, pass_touchdowns,
                rush_attempts, rush_yards, rush_touchdowns, interceptions, fumbles_lost,
                sacks, def_sacks, def_interceptions, def_fumbles_forced)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                stat.team.0,
                stat.game.0,
                stat.pass_attempts,
                stat.pass_completions,
                stat.pass_yards,
                stat.pass_touchdowns,
                stat.rush_attempts,
                stat.rush_yards,
                stat.rush_touchdowns,
                stat.interceptions,
                stat.fumbles_lost,
                stat.sacks,
                stat.def_sacks,
                stat.def_interceptions,
                stat.def_fumbles_forced,
            ],
        )?;
        Ok(())
    }

    /// Upsert a batch of box scores, returning how many were written
    pub fn upsert_team_stats(&self, stats: &[TeamGameStat]) -> Result<usize> {
        let mut count = 0;
        for stat in stats {
            self.upsert_team_stat(stat)?;
            count += 1;
        }
        Ok(count)
    }

    fn query_stats(&self, team: Option<TeamId>, games: &[GameId]) -> Result<Vec<TeamGameStat>> {
        if games.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; games.len()].join(", ");
        let mut sql = format!(
            "SELECT {} FROM team_game_stats WHERE game_id IN ({})",
            STAT_COLUMNS, placeholders
        );
        let mut values: Vec<Value> = games.iter().map(|g| Value::Text(g.0.clone())).collect();
        if let Some(team) = team {
            sql.push_str(" AND team_id = ?");
            values.push(Value::Integer(team.0));
        }
        sql.push_str(" ORDER BY game_id, team_id");

        let mut stmt = self.conn.prepare(&sql)?;
        let stats = stmt
            .query_map(params_from_iter(values), Self::row_to_stat)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(stats)
    }

    fn row_to_stat(row: &rusqlite::Row) -> rusqlite::Result<TeamGameStat> {
        Ok(TeamGameStat {
            team: TeamId(row.get(0)?),
            game: GameId(row.get(1)?),
            pass_attempts: row.get(2)?,
            pass_completions: row.get(3)?,
            pass_yards: row.get(4)?,
            pass_touchdowns: row.get(5)?,
            rush_attempts: row.get(6)?,
            rush_yards: row.get(7)?,
            rush_touchdowns: row.get(8)?,
            interceptions: row.get(9)?,
            fumbles_lost: row.get(10)?,
            sacks: row.get(11)?,
            def_sacks: row.get(12)?,
            def_interceptions: row.get(13)?,
            def_fumbles_forced: row.get(14)?,
        })
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        let (first_season, last_season): (Option<i32>, Option<i32>) = self.conn.query_row(
            "SELECT MIN(season), MAX(season) FROM games",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(DatabaseStats {
            team_count: count("SELECT COUNT(*) FROM teams")?,
            game_count: count("SELECT COUNT(*) FROM games")?,
            completed_count: count(
                "SELECT COUNT(*) FROM games WHERE home_score IS NOT NULL AND away_score IS NOT NULL",
            )?,
            stat_count: count("SELECT COUNT(*) FROM team_game_stats")?,
            first_season,
            last_season,
        })
    }
}

impl GameStore for Database {
    fn find_games(&self, query: &GameQuery) -> Result<Vec<Game>> {
        let mut sql = format!("SELECT {} FROM games WHERE 1 = 1", GAME_COLUMNS);
        let mut values: Vec<Value> = Vec::new();

        if let Some(team) = query.team {
            sql.push_str(" AND (home_team_id = ? OR away_team_id = ?)");
            values.push(Value::Integer(team.0));
            values.push(Value::Integer(team.0));
        }
        if !query.seasons.is_empty() {
            let placeholders = vec!["?"; query.seasons.len()].join(", ");
            sql.push_str(&format!(" AND season IN ({})", placeholders));
            values.extend(query.seasons.iter().map(|s| Value::Integer(*s as i64)));
        }
        if let Some(before) = query.date_before {
            sql.push_str(" AND date < ?");
            values.push(Value::Text(before.format(DATE_FORMAT).to_string()));
        }
        if let Some(after) = query.date_after {
            sql.push_str(" AND date >= ?");
            values.push(Value::Text(after.format(DATE_FORMAT).to_string()));
        }
        if let Some(week) = query.min_week {
            sql.push_str(" AND week >= ?");
            values.push(Value::Integer(week as i64));
        }
        if query.completed_only {
            sql.push_str(" AND home_score IS NOT NULL AND away_score IS NOT NULL");
        }
        if let Some(stage) = query.stage {
            sql.push_str(" AND stage = ?");
            values.push(Value::Text(stage.code().to_string()));
        }

        sql.push_str(match query.order {
            DateOrder::Ascending => " ORDER BY date ASC, id ASC",
            DateOrder::Descending => " ORDER BY date DESC, id DESC",
        });

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let games = stmt
            .query_map(params_from_iter(values), Self::row_to_game)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(games)
    }

    fn find_team_stats(&self, team: TeamId, games: &[GameId]) -> Result<Vec<TeamGameStat>> {
        self.query_stats(Some(team), games)
    }

    fn find_game_stats(&self, games: &[GameId]) -> Result<Vec<TeamGameStat>> {
        self.query_stats(None, games)
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub team_count: usize,
    pub game_count: usize,
    pub completed_count: usize,
    pub stat_count: usize,
    pub first_season: Option<i32>,
    pub last_season: Option<i32>,
}

//! Read-only query contract over games and team box scores

use crate::{Game, GameId, Result, Stage, TeamGameStat, TeamId};
use chrono::NaiveDate;

/// Ordering of query results by date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    #[default]
    Ascending,
    /// Most recent first, ties broken by descending game id
    Descending,
}

/// Filter for [`GameStore::find_games`]
#[derive(Debug, Clone, Default)]
pub struct GameQuery {
    /// Games where this team played home or away
    pub team: Option<TeamId>,
    /// Empty means every season
    pub seasons: Vec<i32>,
    /// Strictly before this date
    pub date_before: Option<NaiveDate>,
    /// On or after this date
    pub date_after: Option<NaiveDate>,
    pub min_week: Option<u32>,
    pub completed_only: bool,
    pub stage: Option<Stage>,
    pub limit: Option<usize>,
    pub order: DateOrder,
}

impl GameQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `limit` most recent completed games for `team` before `cutoff`
    pub fn recent_completed(team: TeamId, cutoff: NaiveDate, limit: usize) -> Self {
        GameQuery {
            team: Some(team),
            date_before: Some(cutoff),
            completed_only: true,
            limit: Some(limit),
            order: DateOrder::Descending,
            ..Self::default()
        }
    }

    pub fn team(mut self, team: TeamId) -> Self {
        self.team = Some(team);
        self
    }

    pub fn seasons(mut self, seasons: &[i32]) -> Self {
        self.seasons = seasons.to_vec();
        self
    }

    pub fn before(mut self, date: NaiveDate) -> Self {
        self.date_before = Some(date);
        self
    }

    pub fn after(mut self, date: NaiveDate) -> Self {
        self.date_after = Some(date);
        self
    }

    pub fn min_week(mut self, week: u32) -> Self {
        self.min_week = Some(week);
        self
    }

    pub fn completed(mut self) -> Self {
        self.completed_only = true;
        self
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: DateOrder) -> Self {
        self.order = order;
        self
    }
}

/// Source of game and box score records.
///
/// Implementations must return deterministic results on unchanged data:
/// descending queries are ordered by date then game id, both descending.
pub trait GameStore {
    fn find_games(&self, query: &GameQuery) -> Result<Vec<Game>>;

    /// Box scores recorded by `team` in the given games
    fn find_team_stats(&self, team: TeamId, games: &[GameId]) -> Result<Vec<TeamGameStat>>;

    /// Box scores of every team in the given games
    fn find_game_stats(&self, games: &[GameId]) -> Result<Vec<TeamGameStat>>;
}

impl<S: GameStore + ?Sized> GameStore for &S {
    fn find_games(&self, query: &GameQuery) -> Result<Vec<Game>> {
        (**self).find_games(query)
    }

    fn find_team_stats(&self, team: TeamId, games: &[GameId]) -> Result<Vec<TeamGameStat>> {
        (**self).find_team_stats(team, games)
    }

    fn find_game_stats(&self, games: &[GameId]) -> Result<Vec<TeamGameStat>> {
        (**self).find_game_stats(games)
    }
}

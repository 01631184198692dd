//! Queries the presentation layer runs against the cache: picking match days,
//! and assembling everything shown for one fixture.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::warn;

use crate::cache::PreviewCache;
use crate::error::{PreviewError, Result};
use crate::transform::{
    ClubMatchRow, ClubSeasonRow, ClubSeasonTable, HeadToHeadRow, ScheduleRow, SplitRow,
    StandingsRow,
};

/// A form row with the opponent's current league position joined in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClubFormRow {
    #[serde(flatten)]
    pub row: ClubMatchRow,
    pub opponent_rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPreview {
    pub game_str: String,
    pub home_team: String,
    pub away_team: String,
    pub kickoff: Option<NaiveDateTime>,
    pub time_to_start_days: Option<i64>,
    pub time_to_start_hours: Option<i64>,
    pub standings: Vec<StandingsRow>,
    pub home_split: Option<SplitRow>,
    pub away_split: Option<SplitRow>,
    pub home_form: Vec<ClubFormRow>,
    pub away_form: Vec<ClubFormRow>,
    pub head_to_head: Vec<HeadToHeadRow>,
    pub season_columns: Vec<String>,
    pub season_stats: Vec<ClubSeasonRow>,
}

pub fn future_games(schedule: &[ScheduleRow]) -> Vec<&ScheduleRow> {
    schedule.iter().filter(|g| g.is_upcoming()).collect()
}

/// Match weeks that still have at least one game to play, ascending.
pub fn open_match_days(schedule: &[ScheduleRow]) -> Vec<u32> {
    future_games(schedule)
        .into_iter()
        .filter_map(|g| g.week)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Upcoming games of one match week ordered by kickoff.
pub fn games_for_match_day(schedule: &[ScheduleRow], week: u32) -> Vec<ScheduleRow> {
    let mut games: Vec<ScheduleRow> = future_games(schedule)
        .into_iter()
        .filter(|g| g.week == Some(week))
        .cloned()
        .collect();
    games.sort_by_key(|g| g.kickoff);
    games
}

/// Resolves a tab label to its game; labels that match more than one game are
/// reported instead of silently picking one.
pub fn find_game<'a>(games: &'a [ScheduleRow], game_str: &str) -> Result<&'a ScheduleRow> {
    let mut hits = games.iter().filter(|g| g.game_str == game_str);
    let first = hits
        .next()
        .ok_or_else(|| PreviewError::schema(format!("no game labelled `{game_str}`")))?;
    if hits.next().is_some() {
        return Err(PreviewError::schema(format!(
            "game label `{game_str}` is ambiguous on this match day"
        )));
    }
    Ok(first)
}

pub fn duplicate_labels(games: &[ScheduleRow]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut dups = BTreeSet::new();
    for g in games {
        if !seen.insert(g.game_str.as_str()) {
            dups.insert(g.game_str.clone());
        }
    }
    dups.into_iter().collect()
}

pub fn team_id_for(season: &ClubSeasonTable, team: &str) -> Result<String> {
    season
        .row_for(team)
        .map(|r| r.team_id.clone())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| PreviewError::schema(format!("no club identifier found for `{team}`")))
}

/// Left join of opponent name against the overall table.
pub fn with_opponent_rank(rows: &[ClubMatchRow], standings: &[StandingsRow]) -> Vec<ClubFormRow> {
    rows.iter()
        .map(|row| ClubFormRow {
            opponent_rank: standings
                .iter()
                .find(|s| s.squad == row.opponent)
                .and_then(|s| s.rank),
            row: row.clone(),
        })
        .collect()
}

pub fn split_row_for(rows: &[SplitRow], club: &str) -> Option<SplitRow> {
    rows.iter().find(|r| r.squad == club).cloned()
}

pub fn standings_rows_for(rows: &[StandingsRow], clubs: [&str; 2]) -> Vec<StandingsRow> {
    rows.iter()
        .filter(|r| clubs.contains(&r.squad.as_str()))
        .cloned()
        .collect()
}

pub fn season_rows_for(season: &ClubSeasonTable, clubs: [&str; 2]) -> Vec<ClubSeasonRow> {
    season
        .rows
        .iter()
        .filter(|r| clubs.contains(&r.team.as_str()))
        .cloned()
        .collect()
}

/// Pulls every dataset for one fixture. The first failing dataset aborts the
/// preview and its error is returned unchanged.
pub fn build_match_preview(cache: &PreviewCache, game: &ScheduleRow) -> Result<MatchPreview> {
    let home = game.home_team.as_str();
    let away = game.away_team.as_str();

    let tables = cache.get_table()?;
    let season = cache.get_club_season_stats()?;
    let home_matches = cache.get_club_recent_matches(home)?;
    let away_matches = cache.get_club_recent_matches(away)?;
    let home_id = team_id_for(&season, home)?;
    let away_id = team_id_for(&season, away)?;
    let h2h = cache.get_head_to_head(&home_id, &away_id)?;

    Ok(MatchPreview {
        game_str: game.game_str.clone(),
        home_team: home.to_string(),
        away_team: away.to_string(),
        kickoff: game.kickoff,
        time_to_start_days: game.time_to_start_days,
        time_to_start_hours: game.time_to_start_hours,
        standings: standings_rows_for(&tables.overall, [home, away]),
        home_split: split_row_for(&tables.home, home),
        away_split: split_row_for(&tables.away, away),
        home_form: with_opponent_rank(&home_matches, &tables.overall),
        away_form: with_opponent_rank(&away_matches, &tables.overall),
        head_to_head: h2h.as_ref().clone(),
        season_columns: season.columns.clone(),
        season_stats: season_rows_for(&season, [home, away]),
    })
}

/// One game of a match-day dump. Exactly one of `preview` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchDayEntry {
    pub game_str: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<MatchPreview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MatchDayEntry {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Builds the preview of every upcoming game of `week`. A failing game is
/// kept as an entry carrying its error instead of being skipped.
pub fn build_match_day(
    cache: &PreviewCache,
    schedule: &[ScheduleRow],
    week: u32,
) -> Vec<MatchDayEntry> {
    games_for_match_day(schedule, week)
        .into_iter()
        .map(|game| {
            let (preview, error) = match build_match_preview(cache, &game) {
                Ok(preview) => (Some(preview), None),
                Err(err) => {
                    warn!(game = %game.game_str, error = %err, "preview failed");
                    (None, Some(err.to_string()))
                }
            };
            MatchDayEntry {
                game_str: game.game_str,
                home_team: game.home_team,
                away_team: game.away_team,
                preview,
                error,
            }
        })
        .collect()
}

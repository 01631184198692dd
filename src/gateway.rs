//! Source gateway: fetches raw FBref tables either from the network or from
//! the local snapshot written by a previous live fetch.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::error::{PreviewError, Result};
use crate::html_table::{HtmlTable, extract_tables};
use crate::http_client::PageSource;
use crate::season::Season;
use crate::snapshot::{SnapshotKey, SnapshotStore};
use crate::table::{ColumnKey, GroupedTable, RawTable, StandingsRaw, cell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchMode {
    Live,
    Snapshot,
}

const SCHEDULE_RENAMES: &[(&str, &str)] = &[
    ("Wk", "week"),
    ("Day", "day"),
    ("Date", "date"),
    ("Time", "time"),
    ("Home", "home_team"),
    ("xG", "home_xg"),
    ("Score", "score"),
    ("xG.1", "away_xg"),
    ("Away", "away_team"),
    ("Attendance", "attendance"),
    ("Venue", "venue"),
    ("Referee", "referee"),
    ("Match Report", "match_report"),
    ("Notes", "notes"),
];

const MATCH_LOG_RENAMES: &[(&str, &str)] = &[
    ("Date", "date"),
    ("Time", "time"),
    ("Comp", "comp"),
    ("Round", "round"),
    ("Day", "day"),
    ("Venue", "venue"),
    ("Result", "result"),
    ("Opponent", "opponent"),
    ("Attendance", "attendance"),
    ("Captain", "captain"),
    ("Formation", "formation"),
    ("Opp Formation", "opp_formation"),
    ("Referee", "referee"),
    ("Match Report", "match_report"),
    ("Notes", "notes"),
];

const MATCH_REPORT_TEXT: &str = "Match Report";

pub struct SourceGateway {
    source: Box<dyn PageSource>,
    snapshots: SnapshotStore,
    config: SourceConfig,
    mode: FetchMode,
    // Club display name -> squad page href, learned from standings/season pages.
    squad_links: Mutex<HashMap<String, String>>,
}

impl SourceGateway {
    pub fn new(
        source: Box<dyn PageSource>,
        snapshots: SnapshotStore,
        config: SourceConfig,
        mode: FetchMode,
    ) -> Self {
        Self {
            source,
            snapshots,
            config,
            mode,
            squad_links: Mutex::new(HashMap::new()),
        }
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn standings_url(&self, season: Season) -> String {
        format!(
            "{}/{}-{}-Stats",
            self.comp_base(season),
            season,
            self.config.competition_slug
        )
    }

    pub fn schedule_url(&self, season: Season) -> String {
        format!(
            "{}/schedule/{}-{}-Scores-and-Fixtures",
            self.comp_base(season),
            season,
            self.config.competition_slug
        )
    }

    pub fn season_stats_url(&self, season: Season) -> String {
        format!(
            "{}/stats/{}-{}-Stats",
            self.comp_base(season),
            season,
            self.config.competition_slug
        )
    }

    pub fn head_to_head_url(&self, home_id: &str, away_id: &str) -> String {
        format!(
            "{}/en/stathead/matchup/teams/{home_id}/{away_id}/",
            self.config.base_url
        )
    }

    /// Match log URL for a squad page href such as
    /// `/en/squads/054efa67/Bayern-Munich-Stats`.
    pub fn match_log_url(&self, season: Season, squad_href: &str) -> Result<String> {
        let parts: Vec<&str> = squad_href.split('/').collect();
        let (Some(id), Some(last)) = (parts.get(3), parts.last()) else {
            return Err(PreviewError::schema(format!(
                "unexpected squad link `{squad_href}`"
            )));
        };
        let name_slug = last.trim_end_matches("-Stats");
        Ok(format!(
            "{}/en/squads/{id}/{season}/matchlogs/c{}/schedule/{name_slug}-Scores-and-Fixtures-{}",
            self.config.base_url, self.config.competition_code, self.config.competition_slug
        ))
    }

    pub fn fetch_schedule(&self, season: Season, mode: FetchMode) -> Result<RawTable> {
        info!(%season, ?mode, "fetching schedule");
        let key = SnapshotKey::Schedule;
        match mode {
            FetchMode::Snapshot => self.snapshots.read_flat(&key),
            FetchMode::Live => {
                let url = self.schedule_url(season);
                let table = self.page_table(&url, 0)?;
                let schedule = normalize_schedule(&table);
                self.snapshots.write_flat(&key, &schedule)?;
                Ok(schedule)
            }
        }
    }

    pub fn fetch_standings(&self, season: Season, mode: FetchMode) -> Result<StandingsRaw> {
        info!(%season, ?mode, "fetching standings");
        match mode {
            FetchMode::Snapshot => Ok(StandingsRaw {
                overall: self.snapshots.read_flat(&SnapshotKey::Standings)?,
                home_away: self.snapshots.read_grouped(&SnapshotKey::StandingsHomeAway)?,
            }),
            FetchMode::Live => {
                let url = self.standings_url(season);
                let tables = self.page_tables(&url, 2)?;
                self.remember_squad_links(&tables[0]);
                let raw = StandingsRaw {
                    overall: tables[0].to_raw_table(),
                    home_away: tables[1].to_grouped_table(),
                };
                self.snapshots.write_flat(&SnapshotKey::Standings, &raw.overall)?;
                self.snapshots
                    .write_grouped(&SnapshotKey::StandingsHomeAway, &raw.home_away)?;
                Ok(raw)
            }
        }
    }

    pub fn fetch_club_matches(
        &self,
        season: Season,
        club_name: &str,
        mode: FetchMode,
    ) -> Result<RawTable> {
        info!(%season, club = club_name, ?mode, "fetching club match log");
        let key = SnapshotKey::ClubMatches(club_name.to_string());
        match mode {
            FetchMode::Snapshot => self.snapshots.read_flat(&key),
            FetchMode::Live => {
                let href = self.squad_link(season, club_name)?;
                let url = self.match_log_url(season, &href)?;
                let table = self.page_table(&url, 0)?;
                let log = normalize_match_log(&table, club_name);
                self.snapshots.write_flat(&key, &log)?;
                Ok(log)
            }
        }
    }

    pub fn fetch_club_season(&self, season: Season, mode: FetchMode) -> Result<GroupedTable> {
        info!(%season, ?mode, "fetching club season stats");
        let key = SnapshotKey::TeamSeasonStats;
        match mode {
            FetchMode::Snapshot => {
                let table = self.snapshots.read_grouped(&key)?;
                self.remember_season_links(&table);
                Ok(table)
            }
            FetchMode::Live => {
                let url = self.season_stats_url(season);
                let page = self.page_table(&url, 0)?;
                self.remember_squad_links(&page);
                let table = normalize_season_stats(&page, &self.config.competition_slug, season)?;
                self.snapshots.write_grouped(&key, &table)?;
                Ok(table)
            }
        }
    }

    pub fn fetch_head_to_head(
        &self,
        home_id: &str,
        away_id: &str,
        mode: FetchMode,
    ) -> Result<RawTable> {
        info!(home_id, away_id, ?mode, "fetching head-to-head");
        let key = SnapshotKey::HeadToHead {
            home_id: home_id.to_string(),
            away_id: away_id.to_string(),
        };
        match mode {
            FetchMode::Snapshot => self.snapshots.read_flat(&key),
            FetchMode::Live => {
                let url = self.head_to_head_url(home_id, away_id);
                let table = self.page_table(&url, 0)?.to_raw_table();
                self.snapshots.write_flat(&key, &table)?;
                Ok(table)
            }
        }
    }

    fn comp_base(&self, season: Season) -> String {
        format!(
            "{}/en/comps/{}/{}",
            self.config.base_url, self.config.competition_code, season
        )
    }

    fn page_tables(&self, url: &str, min_tables: usize) -> Result<Vec<HtmlTable>> {
        let html = self.source.fetch_page(url)?;
        let tables = extract_tables(&html);
        if tables.len() < min_tables {
            return Err(PreviewError::source_unavailable(
                url,
                format!("expected {min_tables} table(s), found {}", tables.len()),
            ));
        }
        debug!(url, tables = tables.len(), "page parsed");
        Ok(tables)
    }

    fn page_table(&self, url: &str, index: usize) -> Result<HtmlTable> {
        let mut tables = self.page_tables(url, index + 1)?;
        Ok(tables.swap_remove(index))
    }

    fn squad_link(&self, season: Season, club_name: &str) -> Result<String> {
        if let Some(href) = self.lookup_squad_link(club_name) {
            return Ok(href);
        }
        // One extra page request to learn the squad links.
        warn!(club = club_name, "squad link unknown, loading standings page");
        let url = self.standings_url(season);
        let tables = self.page_tables(&url, 1)?;
        self.remember_squad_links(&tables[0]);
        self.lookup_squad_link(club_name).ok_or_else(|| {
            PreviewError::schema(format!("no squad link found for club `{club_name}`"))
        })
    }

    fn lookup_squad_link(&self, club_name: &str) -> Option<String> {
        let links = self.squad_links.lock().ok()?;
        links.get(club_name).cloned()
    }

    fn remember_squad_links(&self, table: &HtmlTable) {
        let Some(squad_col) = table
            .header_rows
            .last()
            .and_then(|names| names.iter().position(|n| n == "Squad"))
        else {
            return;
        };
        let Ok(mut links) = self.squad_links.lock() else {
            return;
        };
        for row in &table.rows {
            let Some(c) = row.get(squad_col) else {
                continue;
            };
            if let Some(href) = c.href.as_ref().filter(|h| h.contains("/squads/")) {
                links.insert(c.text.clone(), href.clone());
            }
        }
    }

    fn remember_season_links(&self, table: &GroupedTable) {
        let (Some(team_col), Some(url_col)) = (
            table.column_index("team", ""),
            table.column_index("url", ""),
        ) else {
            return;
        };
        let Ok(mut links) = self.squad_links.lock() else {
            return;
        };
        for row in &table.rows {
            let href = cell(row, url_col);
            if href.contains("/squads/") {
                links.insert(cell(row, team_col).to_string(), href.to_string());
            }
        }
    }
}

/// Schedule page table with snake_case headers, report links and derived
/// `game_id` / `game` columns. Spacer and repeated header rows are dropped.
pub fn normalize_schedule(table: &HtmlTable) -> RawTable {
    let mut raw = table.to_raw_table();
    let report_col = raw.column_index("Match Report");
    let links = report_col.map(|c| table.column_links(c)).unwrap_or_default();
    raw.rename_columns(SCHEDULE_RENAMES);

    if let Some(col) = report_col {
        for (row, link) in raw.rows.iter_mut().zip(&links) {
            let value = report_link(cell(row, col), link.as_deref());
            if let Some(slot) = row.get_mut(col) {
                *slot = value;
            }
        }
    }

    let date_col = raw.column_index("date");
    let home_col = raw.column_index("home_team");
    let away_col = raw.column_index("away_team");
    let mut game_ids = Vec::with_capacity(raw.rows.len());
    let mut games = Vec::with_capacity(raw.rows.len());
    for row in &raw.rows {
        let report = report_col.map(|c| cell(row, c)).unwrap_or("");
        game_ids.push(report.split('/').nth(3).unwrap_or("").to_string());
        let date = date_col.map(|c| cell(row, c)).unwrap_or("");
        let home = home_col.map(|c| cell(row, c)).unwrap_or("");
        let away = away_col.map(|c| cell(row, c)).unwrap_or("");
        games.push(format!("{date} {home}-{away}"));
    }
    raw.push_column("game_id", game_ids);
    raw.push_column("game", games);
    drop_filler_rows(&mut raw, date_col, "Date");
    raw
}

/// Club match log with snake_case headers; `match_report` holds the report
/// href for played matches and stays empty otherwise.
pub fn normalize_match_log(table: &HtmlTable, club_name: &str) -> RawTable {
    let mut raw = table.to_raw_table();
    let report_col = raw.column_index("Match Report");
    let links = report_col.map(|c| table.column_links(c)).unwrap_or_default();
    raw.rename_columns(MATCH_LOG_RENAMES);

    if let Some(col) = report_col {
        for (row, link) in raw.rows.iter_mut().zip(&links) {
            let value = report_link(cell(row, col), link.as_deref());
            if let Some(slot) = row.get_mut(col) {
                *slot = value;
            }
        }
    }

    let date_col = raw.column_index("date");
    let venue_col = raw.column_index("venue");
    let opp_col = raw.column_index("opponent");
    let games = raw
        .rows
        .iter()
        .map(|row| {
            let date = date_col.map(|c| cell(row, c)).unwrap_or("");
            let opponent = opp_col.map(|c| cell(row, c)).unwrap_or("");
            if venue_col.map(|c| cell(row, c)) == Some("Away") {
                format!("{date} {opponent}-{club_name}")
            } else {
                format!("{date} {club_name}-{opponent}")
            }
        })
        .collect();
    raw.push_column("game", games);
    drop_filler_rows(&mut raw, date_col, "Date");
    raw
}

/// Squad standard stats with `league`/`season`/`team` leading columns and a
/// trailing `url` column taken from the squad link.
pub fn normalize_season_stats(
    table: &HtmlTable,
    league: &str,
    season: Season,
) -> Result<GroupedTable> {
    let grouped = table.to_grouped_table();
    let squad_col = grouped
        .columns
        .iter()
        .position(|c| c.name == "Squad")
        .ok_or_else(|| PreviewError::schema("season stats table has no Squad column"))?;
    let links = table.column_links(squad_col);

    let mut columns = vec![
        ColumnKey::new("league", ""),
        ColumnKey::new("season", ""),
        ColumnKey::new("team", ""),
    ];
    columns.extend(
        grouped
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != squad_col)
            .map(|(_, c)| c.clone()),
    );
    columns.push(ColumnKey::new("url", ""));

    let rows = grouped
        .rows
        .iter()
        .zip(links)
        .filter(|(row, _)| {
            let squad = cell(row, squad_col);
            !squad.is_empty() && squad != "Squad"
        })
        .map(|(row, link)| {
            let mut out = vec![
                league.to_string(),
                season.to_string(),
                cell(row, squad_col).to_string(),
            ];
            out.extend(
                (0..grouped.columns.len())
                    .filter(|i| *i != squad_col)
                    .map(|i| cell(row, i).to_string()),
            );
            out.push(link.unwrap_or_default());
            out
        })
        .collect();
    Ok(GroupedTable::new(columns, rows))
}

fn report_link(text: &str, href: Option<&str>) -> String {
    match href {
        Some(href) if text == MATCH_REPORT_TEXT => href.to_string(),
        _ => String::new(),
    }
}

fn drop_filler_rows(raw: &mut RawTable, date_col: Option<usize>, header_label: &str) {
    let Some(col) = date_col else {
        return;
    };
    raw.rows.retain(|row| {
        let date = cell(row, col);
        !date.is_empty() && date != header_label
    });
}

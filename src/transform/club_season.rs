use serde::Serialize;

use crate::error::{PreviewError, Result};
use crate::table::{GroupedTable, cell};

const DROPPED_GROUPS: [&str; 3] = ["league", "season", "url"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClubSeasonRow {
    pub team: String,
    /// FBref squad id, the only stable club key across pages.
    pub team_id: String,
    /// Values aligned with [`ClubSeasonTable::columns`].
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClubSeasonTable {
    pub columns: Vec<String>,
    pub rows: Vec<ClubSeasonRow>,
}

impl ClubSeasonTable {
    pub fn value<'a>(&self, row: &'a ClubSeasonRow, column: &str) -> Option<&'a str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        row.values.get(idx).map(String::as_str)
    }

    pub fn row_for(&self, team: &str) -> Option<&ClubSeasonRow> {
        self.rows.iter().find(|r| r.team == team)
    }
}

/// Club id is the 4th `/` segment of the squad URL (`/en/squads/<id>/...`).
pub fn team_id_from_url(url: &str) -> Option<&str> {
    url.split('/').nth(3).filter(|s| !s.is_empty())
}

pub fn prep_club_season(raw: &GroupedTable) -> Result<ClubSeasonTable> {
    let url_col = raw
        .columns
        .iter()
        .position(|c| c.group == "url")
        .ok_or_else(|| PreviewError::schema("season stats have no `url` column"))?;
    let team_col = raw
        .columns
        .iter()
        .position(|c| c.group == "team" || (c.group.is_empty() && c.name == "team"))
        .ok_or_else(|| PreviewError::schema("season stats have no `team` column"))?;

    let kept: Vec<usize> = (0..raw.columns.len())
        .filter(|&i| i != team_col)
        .filter(|&i| !DROPPED_GROUPS.contains(&raw.columns[i].group.as_str()))
        .collect();

    let columns = kept.iter().map(|&i| raw.columns[i].flat_label()).collect();
    let rows = raw
        .rows
        .iter()
        .map(|row| ClubSeasonRow {
            team: cell(row, team_col).to_string(),
            team_id: team_id_from_url(cell(row, url_col))
                .unwrap_or_default()
                .to_string(),
            values: kept.iter().map(|&i| cell(row, i).to_string()).collect(),
        })
        .collect();
    Ok(ClubSeasonTable { columns, rows })
}

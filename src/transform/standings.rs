use serde::Serialize;

use crate::error::{PreviewError, Result};
use crate::table::{GroupedTable, RawTable, StandingsRaw, cell, parse_f64, parse_i64};

use super::{opt_cell, require_columns};

/// Columns of the overall table shown in a preview, in display order.
pub const STANDINGS_COLUMNS: [&str; 16] = [
    "Rk", "Squad", "MP", "W", "D", "L", "GF", "GA", "GD", "Pts", "Pts/MP", "xG", "xGA", "xGD",
    "xGD/90", "Last 5",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsRow {
    /// Rank as published by the source, tie-breaks included.
    pub rank: Option<u32>,
    pub squad: String,
    pub matches_played: Option<i64>,
    pub wins: Option<i64>,
    pub draws: Option<i64>,
    pub losses: Option<i64>,
    pub goals_for: Option<i64>,
    pub goals_against: Option<i64>,
    pub goal_diff: Option<i64>,
    pub points: Option<i64>,
    pub points_per_match: Option<f64>,
    pub xg: Option<f64>,
    pub xga: Option<f64>,
    pub xgd: Option<f64>,
    pub xgd_per90: Option<f64>,
    /// Opaque recent-form summary, displayed as-is.
    pub last5: String,
}

/// One club's line in the home-only or away-only table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitRow {
    /// Position within this split, recomputed from points.
    pub split_rank: u32,
    /// Overall table rank carried over from the source row.
    pub table_rank: Option<u32>,
    pub squad: String,
    pub matches_played: Option<i64>,
    pub wins: Option<i64>,
    pub draws: Option<i64>,
    pub losses: Option<i64>,
    pub goals_for: Option<i64>,
    pub goals_against: Option<i64>,
    pub goal_diff: Option<i64>,
    pub points: Option<i64>,
    pub points_per_match: Option<f64>,
    pub xg: Option<f64>,
    pub xga: Option<f64>,
    pub xgd: Option<f64>,
    pub xgd_per90: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeagueTables {
    pub overall: Vec<StandingsRow>,
    pub home: Vec<SplitRow>,
    pub away: Vec<SplitRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn group(self) -> &'static str {
        match self {
            Side::Home => "Home",
            Side::Away => "Away",
        }
    }

    fn other(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

pub fn prep_league_tables(raw: &StandingsRaw) -> Result<LeagueTables> {
    Ok(LeagueTables {
        overall: prep_overall(&raw.overall)?,
        home: prep_split(&raw.home_away, Side::Home)?,
        away: prep_split(&raw.home_away, Side::Away)?,
    })
}

fn prep_overall(raw: &RawTable) -> Result<Vec<StandingsRow>> {
    let [rk, squad, mp, w, d, l, gf, ga, gd, pts, ppm, xg, xga, xgd, xgd90, last5] =
        require_columns(raw, STANDINGS_COLUMNS)?;
    Ok(raw
        .rows
        .iter()
        .map(|row| StandingsRow {
            rank: parse_rank(cell(row, rk)),
            squad: cell(row, squad).to_string(),
            matches_played: parse_i64(cell(row, mp)),
            wins: parse_i64(cell(row, w)),
            draws: parse_i64(cell(row, d)),
            losses: parse_i64(cell(row, l)),
            goals_for: parse_i64(cell(row, gf)),
            goals_against: parse_i64(cell(row, ga)),
            goal_diff: parse_i64(cell(row, gd)),
            points: parse_i64(cell(row, pts)),
            points_per_match: parse_f64(cell(row, ppm)),
            xg: parse_f64(cell(row, xg)),
            xga: parse_f64(cell(row, xga)),
            xgd: parse_f64(cell(row, xgd)),
            xgd_per90: parse_f64(cell(row, xgd90)),
            last5: cell(row, last5).to_string(),
        })
        .collect())
}

/// Home-only or away-only table: the other side's group is dropped, the header
/// flattened, rows ordered by points (stable on ties) and ranked from 1.
pub fn prep_split(raw: &GroupedTable, side: Side) -> Result<Vec<SplitRow>> {
    if !raw.columns.iter().any(|c| c.group == side.group()) {
        return Err(PreviewError::schema(format!(
            "home/away table has no `{}` column group",
            side.group()
        )));
    }
    let other = side.other().group();
    let flat = raw.select(|c| c.group != other).drop_group_level();
    let [squad, pts] = require_columns(&flat, ["Squad", "Pts"])?;
    let col = |name: &str| flat.column_index(name);
    let (rk, mp, w, d, l) = (col("Rk"), col("MP"), col("W"), col("D"), col("L"));
    let (gf, ga, gd, ppm) = (col("GF"), col("GA"), col("GD"), col("Pts/MP"));
    let (xg, xga, xgd, xgd90) = (col("xG"), col("xGA"), col("xGD"), col("xGD/90"));

    let mut rows: Vec<SplitRow> = flat
        .rows
        .iter()
        .filter(|row| !cell(row, squad).is_empty())
        .map(|row| SplitRow {
            split_rank: 0,
            table_rank: parse_rank(opt_cell(row, rk)),
            squad: cell(row, squad).to_string(),
            matches_played: parse_i64(opt_cell(row, mp)),
            wins: parse_i64(opt_cell(row, w)),
            draws: parse_i64(opt_cell(row, d)),
            losses: parse_i64(opt_cell(row, l)),
            goals_for: parse_i64(opt_cell(row, gf)),
            goals_against: parse_i64(opt_cell(row, ga)),
            goal_diff: parse_i64(opt_cell(row, gd)),
            points: parse_i64(cell(row, pts)),
            points_per_match: parse_f64(opt_cell(row, ppm)),
            xg: parse_f64(opt_cell(row, xg)),
            xga: parse_f64(opt_cell(row, xga)),
            xgd: parse_f64(opt_cell(row, xgd)),
            xgd_per90: parse_f64(opt_cell(row, xgd90)),
        })
        .collect();

    // Stable sort: equal points keep their source order.
    rows.sort_by(|a, b| b.points.cmp(&a.points));
    for (i, row) in rows.iter_mut().enumerate() {
        row.split_rank = i as u32 + 1;
    }
    Ok(rows)
}

fn parse_rank(raw: &str) -> Option<u32> {
    parse_i64(raw).and_then(|v| u32::try_from(v).ok())
}

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::{PreviewError, Result};
use crate::table::{RawTable, cell, parse_f64};

use super::require_columns;

/// Matchups older than this many years before the latest one are dropped.
pub const H2H_WINDOW_YEARS: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadToHeadRow {
    pub comp: String,
    pub round: String,
    pub date: String,
    pub home: String,
    pub home_xg: Option<f64>,
    pub score: String,
    pub away_xg: Option<f64>,
    pub away: String,
}

/// Played matchups within [`H2H_WINDOW_YEARS`] of the most recent one on record.
pub fn prep_head_to_head(raw: &RawTable) -> Result<Vec<HeadToHeadRow>> {
    let [comp, round, date, home, home_xg, score, away_xg, away] = require_columns(
        raw,
        ["Comp", "Round", "Date", "Home", "xG", "Score", "xG.1", "Away"],
    )?;

    let played = raw
        .rows
        .iter()
        .filter(|row| {
            let s = cell(row, score).trim();
            !s.is_empty() && s != "Score"
        })
        .map(|row| {
            let raw_date = cell(row, date);
            let year = parse_year(raw_date).ok_or_else(|| {
                PreviewError::schema(format!("unreadable head-to-head date `{raw_date}`"))
            })?;
            Ok((year, row))
        })
        .collect::<Result<Vec<_>>>()?;

    let Some(max_year) = played.iter().map(|(y, _)| *y).max() else {
        return Ok(Vec::new());
    };

    Ok(played
        .into_iter()
        .filter(|(year, _)| max_year - year < H2H_WINDOW_YEARS)
        .map(|(_, row)| HeadToHeadRow {
            comp: cell(row, comp).to_string(),
            round: cell(row, round).to_string(),
            date: cell(row, date).to_string(),
            home: cell(row, home).to_string(),
            home_xg: parse_f64(cell(row, home_xg)),
            score: cell(row, score).to_string(),
            away_xg: parse_f64(cell(row, away_xg)),
            away: cell(row, away).to_string(),
        })
        .collect())
}

fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(d.year());
    }
    trimmed.get(..4).and_then(|y| y.parse::<i32>().ok())
}

use serde::Serialize;

use crate::error::Result;
use crate::table::{RawTable, cell, parse_f64, parse_i64};

use super::require_columns;

/// Number of completed matches kept for the form table.
pub const FORM_GAMES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClubMatchRow {
    pub game: String,
    pub date: String,
    pub round: String,
    pub day: String,
    pub venue: String,
    pub result: String,
    pub goals_for: Option<i64>,
    pub goals_against: Option<i64>,
    pub opponent: String,
    pub xg: Option<f64>,
    pub xga: Option<f64>,
    pub possession: Option<f64>,
}

impl ClubMatchRow {
    pub fn outcome(&self) -> Option<Outcome> {
        match self.result.trim().chars().next()? {
            'W' => Some(Outcome::Win),
            'D' => Some(Outcome::Draw),
            'L' => Some(Outcome::Loss),
            _ => None,
        }
    }
}

/// Last [`FORM_GAMES`] matches that have a match report, in source order.
pub fn prep_club_matches(raw: &RawTable) -> Result<Vec<ClubMatchRow>> {
    let [report, game, date, round, day, venue, result, gf, ga, opponent, xg, xga, poss] =
        require_columns(
            raw,
            [
                "match_report", "game", "date", "round", "day", "venue", "result", "GF", "GA",
                "opponent", "xG", "xGA", "Poss",
            ],
        )?;

    let reported: Vec<&Vec<String>> = raw
        .rows
        .iter()
        .filter(|row| !cell(row, report).trim().is_empty())
        .collect();
    let skip = reported.len().saturating_sub(FORM_GAMES);

    Ok(reported
        .into_iter()
        .skip(skip)
        .map(|row| ClubMatchRow {
            game: cell(row, game).to_string(),
            date: cell(row, date).to_string(),
            round: cell(row, round).to_string(),
            day: cell(row, day).to_string(),
            venue: cell(row, venue).to_string(),
            result: cell(row, result).to_string(),
            goals_for: parse_i64(cell(row, gf)),
            goals_against: parse_i64(cell(row, ga)),
            opponent: cell(row, opponent).to_string(),
            xg: parse_f64(cell(row, xg)),
            xga: parse_f64(cell(row, xga)),
            possession: parse_f64(cell(row, poss)),
        })
        .collect())
}

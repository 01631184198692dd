use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Serialize;

use crate::clubs::club_abbr;
use crate::error::Result;
use crate::table::{RawTable, cell, parse_i64};

use super::{opt_cell, require_columns};

const SECS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    pub game_id: String,
    pub game: String,
    pub week: Option<u32>,
    pub day: String,
    pub date: Option<NaiveDate>,
    pub time: String,
    pub home_team: String,
    pub away_team: String,
    pub kickoff: Option<NaiveDateTime>,
    #[serde(skip)]
    pub time_to_start: Option<TimeDelta>,
    pub time_to_start_days: Option<i64>,
    pub time_to_start_hours: Option<i64>,
    pub home_abbr: String,
    pub away_abbr: String,
    /// `"{home_abbr} vs {away_abbr}"`, used as the tab label of a match.
    pub game_str: String,
}

impl ScheduleRow {
    pub fn is_upcoming(&self) -> bool {
        self.time_to_start.is_some_and(|d| d > TimeDelta::zero())
    }

    /// Identity of the fixture. Unplayed games have no report id yet, so they
    /// fall back to the pairing and kickoff.
    pub fn game_key(&self) -> String {
        if !self.game_id.is_empty() {
            return self.game_id.clone();
        }
        let kickoff = self.kickoff.map(|k| k.to_string()).unwrap_or_default();
        format!("{}|{}|{kickoff}", self.home_team, self.away_team)
    }
}

/// Shapes the season schedule. `now` is the reference for the countdown
/// fields, so calling this again later yields fresh values.
pub fn prep_schedule(raw: &RawTable, now: NaiveDateTime) -> Result<Vec<ScheduleRow>> {
    let [date_col, time_col, home_col, away_col, week_col] =
        require_columns(raw, ["date", "time", "home_team", "away_team", "week"])?;
    let day_col = raw.column_index("day");
    let game_id_col = raw.column_index("game_id");
    let game_col = raw.column_index("game");

    let rows = raw
        .rows
        .iter()
        .map(|row| {
            let date = parse_date(cell(row, date_col));
            let time = cell(row, time_col).to_string();
            let kickoff = date.and_then(|d| parse_kickoff_time(&time).map(|t| d.and_time(t)));
            let time_to_start = kickoff.map(|k| k - now);
            let (days, hours) = match time_to_start {
                Some(delta) => {
                    let (d, h) = split_days_hours(delta);
                    (Some(d), Some(h))
                }
                None => (None, None),
            };
            let home_team = cell(row, home_col).to_string();
            let away_team = cell(row, away_col).to_string();
            let home_abbr = club_abbr(&home_team);
            let away_abbr = club_abbr(&away_team);
            ScheduleRow {
                game_id: opt_cell(row, game_id_col).to_string(),
                game: opt_cell(row, game_col).to_string(),
                week: parse_i64(cell(row, week_col)).and_then(|w| u32::try_from(w).ok()),
                day: opt_cell(row, day_col).to_string(),
                date,
                time,
                game_str: format!("{home_abbr} vs {away_abbr}"),
                home_team,
                away_team,
                kickoff,
                time_to_start,
                time_to_start_days: days,
                time_to_start_hours: hours,
                home_abbr,
                away_abbr,
            }
        })
        .collect();
    Ok(rows)
}

/// Whole days (floored, so negative durations count down past zero) and the
/// leftover hours, the way a timedelta reports them.
pub fn split_days_hours(delta: TimeDelta) -> (i64, i64) {
    let secs = delta.num_seconds();
    (
        secs.div_euclid(SECS_PER_DAY),
        secs.rem_euclid(SECS_PER_DAY) / 3600,
    )
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

// FBref appends the viewer's local time in brackets: "18:30 (19:30)".
fn parse_kickoff_time(raw: &str) -> Option<NaiveTime> {
    let first = raw.split_whitespace().next()?;
    NaiveTime::parse_from_str(first, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(first, "%H:%M:%S"))
        .ok()
}

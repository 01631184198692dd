//! Pure reshaping of raw source tables into presentation rows, one module per
//! dataset.

pub mod club_matches;
pub mod club_season;
pub mod head_to_head;
pub mod schedule;
pub mod standings;

pub use club_matches::{ClubMatchRow, Outcome, prep_club_matches};
pub use club_season::{ClubSeasonRow, ClubSeasonTable, prep_club_season};
pub use head_to_head::{HeadToHeadRow, prep_head_to_head};
pub use schedule::{ScheduleRow, prep_schedule};
pub use standings::{LeagueTables, Side, SplitRow, StandingsRow, prep_league_tables, prep_split};

use crate::error::Result;
use crate::table::{RawTable, cell};

pub(crate) fn require_columns<const N: usize>(
    raw: &RawTable,
    names: [&str; N],
) -> Result<[usize; N]> {
    let mut out = [0usize; N];
    for (slot, name) in out.iter_mut().zip(names) {
        *slot = raw.require_column(name)?;
    }
    Ok(out)
}

pub(crate) fn opt_cell(row: &[String], idx: Option<usize>) -> &str {
    idx.map(|i| cell(row, i)).unwrap_or("")
}

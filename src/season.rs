use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// Seasons roll over on July 1st.
const ROLLOVER_MONTH: u32 = 7;

/// A league season keyed by the calendar year it starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Season(i32);

impl Season {
    pub const fn new(start_year: i32) -> Self {
        Self(start_year)
    }

    pub fn start(self) -> i32 {
        self.0
    }

    pub fn end(self) -> i32 {
        self.0 + 1
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start(), self.end())
    }
}

pub fn current_season(today: NaiveDate) -> Season {
    if today.month() >= ROLLOVER_MONTH {
        Season(today.year())
    } else {
        Season(today.year() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn june_30_belongs_to_previous_season() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(current_season(d), Season::new(2023));
    }

    #[test]
    fn july_1_starts_new_season() {
        let d = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert_eq!(current_season(d), Season::new(2024));
        assert_eq!(current_season(d).to_string(), "2024-2025");
    }
}

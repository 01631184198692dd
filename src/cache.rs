//! Memoized access to every dataset the preview needs.
//!
//! A [`PreviewCache`] is built once per process with its clock and page source
//! injected, then handed to whoever renders previews.

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::Result;
use crate::gateway::SourceGateway;
use crate::http_client::HttpPageSource;
use crate::memo::Memo;
use crate::season::{Season, current_season};
use crate::snapshot::SnapshotStore;
use crate::table::RawTable;
use crate::transform::{
    ClubMatchRow, ClubSeasonTable, HeadToHeadRow, LeagueTables, ScheduleRow, prep_club_matches,
    prep_club_season, prep_head_to_head, prep_league_tables, prep_schedule,
};

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Schedule,
    Table,
    ClubMatches,
    ClubSeason,
    HeadToHead,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 5] = [
        DatasetKind::Schedule,
        DatasetKind::Table,
        DatasetKind::ClubMatches,
        DatasetKind::ClubSeason,
        DatasetKind::HeadToHead,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DatasetKind::Schedule => "season schedule",
            DatasetKind::Table => "league table",
            DatasetKind::ClubMatches => "club matches",
            DatasetKind::ClubSeason => "club season stats",
            DatasetKind::HeadToHead => "head-to-head",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub struct PreviewCache {
    gateway: SourceGateway,
    clock: Box<dyn Clock>,
    // The schedule keeps its raw table: countdown fields depend on "now" and
    // are derived again on every read.
    schedule: Memo<Season, RawTable>,
    table: Memo<Season, LeagueTables>,
    club_matches: Memo<(Season, String), Vec<ClubMatchRow>>,
    club_season: Memo<Season, ClubSeasonTable>,
    head_to_head: Memo<(String, String), Vec<HeadToHeadRow>>,
}

impl PreviewCache {
    pub fn new(gateway: SourceGateway, clock: Box<dyn Clock>) -> Self {
        Self {
            gateway,
            clock,
            schedule: Memo::new(),
            table: Memo::new(),
            club_matches: Memo::new(),
            club_season: Memo::new(),
            head_to_head: Memo::new(),
        }
    }

    /// Live HTTP source, snapshot directory and fetch mode from `cfg`, wall clock.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let source = HttpPageSource::new(cfg.http_timeout_secs)?;
        let gateway = SourceGateway::new(
            Box::new(source),
            SnapshotStore::new(&cfg.snapshot_dir),
            cfg.source.clone(),
            cfg.fetch_mode,
        );
        Ok(Self::new(gateway, Box::new(SystemClock)))
    }

    pub fn season(&self) -> Season {
        current_season(self.clock.today())
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn gateway(&self) -> &SourceGateway {
        &self.gateway
    }

    pub fn get_schedule(&self) -> Result<Vec<ScheduleRow>> {
        let season = self.season();
        log_lookup(DatasetKind::Schedule, self.schedule.contains(&season));
        let raw = self.schedule.get_or_try_init(&season, || {
            self.gateway.fetch_schedule(season, self.gateway.mode())
        })?;
        prep_schedule(&raw, self.clock.now())
    }

    pub fn get_table(&self) -> Result<Arc<LeagueTables>> {
        let season = self.season();
        log_lookup(DatasetKind::Table, self.table.contains(&season));
        self.table.get_or_try_init(&season, || {
            let raw = self.gateway.fetch_standings(season, self.gateway.mode())?;
            prep_league_tables(&raw)
        })
    }

    pub fn get_club_recent_matches(&self, club_name: &str) -> Result<Arc<Vec<ClubMatchRow>>> {
        let key = (self.season(), club_name.to_string());
        log_lookup(DatasetKind::ClubMatches, self.club_matches.contains(&key));
        self.club_matches.get_or_try_init(&key, || {
            let raw = self
                .gateway
                .fetch_club_matches(key.0, club_name, self.gateway.mode())?;
            prep_club_matches(&raw)
        })
    }

    pub fn get_club_season_stats(&self) -> Result<Arc<ClubSeasonTable>> {
        let season = self.season();
        log_lookup(DatasetKind::ClubSeason, self.club_season.contains(&season));
        self.club_season.get_or_try_init(&season, || {
            let raw = self.gateway.fetch_club_season(season, self.gateway.mode())?;
            prep_club_season(&raw)
        })
    }

    pub fn get_head_to_head(
        &self,
        home_club_id: &str,
        away_club_id: &str,
    ) -> Result<Arc<Vec<HeadToHeadRow>>> {
        let key = (home_club_id.to_string(), away_club_id.to_string());
        log_lookup(DatasetKind::HeadToHead, self.head_to_head.contains(&key));
        self.head_to_head.get_or_try_init(&key, || {
            let raw =
                self.gateway
                    .fetch_head_to_head(home_club_id, away_club_id, self.gateway.mode())?;
            prep_head_to_head(&raw)
        })
    }

    pub fn reset(&self, kind: DatasetKind) {
        info!(dataset = %kind, "cache reset");
        match kind {
            DatasetKind::Schedule => self.schedule.clear(),
            DatasetKind::Table => self.table.clear(),
            DatasetKind::ClubMatches => self.club_matches.clear(),
            DatasetKind::ClubSeason => self.club_season.clear(),
            DatasetKind::HeadToHead => self.head_to_head.clear(),
        }
    }

    pub fn reset_schedule(&self) {
        self.reset(DatasetKind::Schedule);
    }

    pub fn reset_table(&self) {
        self.reset(DatasetKind::Table);
    }

    pub fn reset_club_matches(&self) {
        self.reset(DatasetKind::ClubMatches);
    }

    pub fn reset_club_season(&self) {
        self.reset(DatasetKind::ClubSeason);
    }

    pub fn reset_head_to_head(&self) {
        self.reset(DatasetKind::HeadToHead);
    }

    pub fn reset_all(&self) {
        for kind in DatasetKind::ALL {
            self.reset(kind);
        }
    }
}

fn log_lookup(kind: DatasetKind, hit: bool) {
    if hit {
        debug!(dataset = %kind, "cache hit");
    } else {
        debug!(dataset = %kind, "cache miss");
    }
}

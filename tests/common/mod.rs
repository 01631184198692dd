#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

use bundesliga_preview::cache::{Clock, PreviewCache};
use bundesliga_preview::config::SourceConfig;
use bundesliga_preview::error::{PreviewError, Result};
use bundesliga_preview::gateway::{FetchMode, SourceGateway};
use bundesliga_preview::http_client::PageSource;
use bundesliga_preview::snapshot::SnapshotStore;

pub const BAYERN_ID: &str = "054efa67";
pub const STUTTGART_ID: &str = "598bc722";

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

pub fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("fixture file should be readable")
}

/// Fresh snapshot directory under the system temp dir.
pub fn temp_dir(label: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "bundesliga_preview_{label}_{}_{}",
        std::process::id(),
        NEXT_DIR.fetch_add(1, Ordering::SeqCst)
    ));
    let _ = fs::remove_dir_all(&path);
    fs::create_dir_all(&path).expect("temp dir should be creatable");
    path
}

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

pub fn at(date: &str, time: &str) -> NaiveDateTime {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date");
    d.and_time(chrono::NaiveTime::parse_from_str(time, "%H:%M").expect("valid time"))
}

#[derive(Clone)]
pub struct FakeClock(pub Arc<Mutex<NaiveDateTime>>);

impl FakeClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().unwrap()
    }
}

/// Serves the HTML fixtures by URL shape and counts every request.
#[derive(Clone, Default)]
pub struct FixtureSource {
    pub calls: Arc<AtomicUsize>,
    pub requested: Arc<Mutex<Vec<String>>>,
    pub offline: Arc<AtomicBool>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.contains(needle))
            .count()
    }
}

impl PageSource for FixtureSource {
    fn fetch_page(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());
        if self.offline.load(Ordering::SeqCst) {
            return Err(PreviewError::source_unavailable(url, "offline"));
        }
        let name = if url.contains("/matchlogs/") && url.contains(BAYERN_ID) {
            "matchlog_bayern.html"
        } else if url.contains("/matchlogs/") && url.contains(STUTTGART_ID) {
            "matchlog_stuttgart.html"
        } else if url.contains(&format!("/matchup/teams/{STUTTGART_ID}/{BAYERN_ID}/")) {
            "h2h_stuttgart_bayern.html"
        } else if url.ends_with("/2024-2025/schedule/2024-2025-Bundesliga-Scores-and-Fixtures") {
            "schedule.html"
        } else if url.ends_with("/2024-2025/stats/2024-2025-Bundesliga-Stats") {
            "season_stats.html"
        } else if url.ends_with("/2024-2025/2024-2025-Bundesliga-Stats") {
            "standings.html"
        } else {
            return Err(PreviewError::source_unavailable(url, "http 404 Not Found"));
        };
        Ok(read_fixture(name))
    }
}

/// Source that must never be hit.
pub struct NoNetwork;

impl PageSource for NoNetwork {
    fn fetch_page(&self, url: &str) -> Result<String> {
        Err(PreviewError::source_unavailable(url, "network disabled in test"))
    }
}

pub fn live_gateway(source: &FixtureSource, dir: &PathBuf) -> SourceGateway {
    SourceGateway::new(
        Box::new(source.clone()),
        SnapshotStore::new(dir),
        SourceConfig::default(),
        FetchMode::Live,
    )
}

pub fn live_cache(source: &FixtureSource, clock: &FakeClock, dir: &PathBuf) -> PreviewCache {
    PreviewCache::new(live_gateway(source, dir), Box::new(clock.clone()))
}

pub fn snapshot_cache(clock: &FakeClock, dir: &PathBuf) -> PreviewCache {
    let gateway = SourceGateway::new(
        Box::new(NoNetwork),
        SnapshotStore::new(dir),
        SourceConfig::default(),
        FetchMode::Snapshot,
    );
    PreviewCache::new(gateway, Box::new(clock.clone()))
}

/// Tuesday of match week 6 in the fixture schedule.
pub fn fixture_now() -> NaiveDateTime {
    at("2024-10-01", "12:00")
}

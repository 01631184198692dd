//! Runtime configuration from the environment (`.env.local` / `.env` are
//! loaded first by the binaries).

use std::path::PathBuf;

use crate::gateway::FetchMode;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub snapshot_dir: PathBuf,
    pub fetch_mode: FetchMode,
    pub source: SourceConfig,
    pub http_timeout_secs: u64,
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub base_url: String,
    pub competition_code: u32,
    /// Competition name as it appears in FBref URLs, e.g. `Bundesliga`.
    pub competition_slug: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fbref.com".to_string(),
            competition_code: 20,
            competition_slug: "Bundesliga".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let defaults = SourceConfig::default();
        let source = SourceConfig {
            base_url: non_empty("PREVIEW_SOURCE_BASE")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            competition_code: non_empty("PREVIEW_COMPETITION_CODE")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .unwrap_or(defaults.competition_code),
            competition_slug: non_empty("PREVIEW_COMPETITION_SLUG")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.competition_slug),
        };

        let use_snapshot = non_empty("PREVIEW_USE_SNAPSHOT")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Self {
            snapshot_dir: non_empty("PREVIEW_SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            fetch_mode: if use_snapshot {
                FetchMode::Snapshot
            } else {
                FetchMode::Live
            },
            source,
            http_timeout_secs: non_empty("PREVIEW_HTTP_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(30)
                .clamp(5, 300),
            log_file: non_empty("PREVIEW_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("bundesliga_preview.log")),
        }
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

use anyhow::{Context, Result, anyhow, bail};

use bundesliga_preview::cache::PreviewCache;
use bundesliga_preview::config::{self, AppConfig};
use bundesliga_preview::gateway::FetchMode;
use bundesliga_preview::logging;
use bundesliga_preview::preview::{build_match_day, open_match_days};

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_stderr_logging();

    let mut cfg = AppConfig::from_env();
    if has_flag("--snapshot") {
        cfg.fetch_mode = FetchMode::Snapshot;
    }
    let cache = PreviewCache::from_config(&cfg).context("failed to set up data source")?;

    let schedule = cache.get_schedule().context("schedule")?;
    let open_days = open_match_days(&schedule);
    let week = match parse_week_arg() {
        Some(week) => week,
        None => open_days
            .first()
            .copied()
            .ok_or_else(|| anyhow!("no open match day in season {}", cache.season()))?,
    };
    if !open_days.contains(&week) {
        return Err(anyhow!("match day {week} has no upcoming games"));
    }

    let entries = build_match_day(&cache, &schedule, week);
    let json = serde_json::to_string_pretty(&entries)?;
    println!("{json}");

    let failed = entries.iter().filter(|e| e.is_failed()).count();
    if failed > 0 {
        bail!("{failed} of {} previews failed for match day {week}", entries.len());
    }
    Ok(())
}

fn has_flag(flag: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == flag)
}

fn parse_week_arg() -> Option<u32> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix("--week=")
            && let Ok(week) = raw.trim().parse::<u32>()
        {
            return Some(week);
        }
        if arg == "--week"
            && let Some(next) = args.get(idx + 1)
            && let Ok(week) = next.trim().parse::<u32>()
        {
            return Some(week);
        }
    }
    None
}

use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use bundesliga_preview::cache::PreviewCache;
use bundesliga_preview::config::{self, AppConfig};
use bundesliga_preview::gateway::FetchMode;
use bundesliga_preview::logging;
use bundesliga_preview::preview::{games_for_match_day, open_match_days, team_id_for};

const DATASETS: &[&str] = &["schedule", "table", "season", "clubs", "h2h"];

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_stderr_logging();

    let only = parse_only_arg()?;
    let mut cfg = AppConfig::from_env();
    cfg.fetch_mode = FetchMode::Live;
    let cache = PreviewCache::from_config(&cfg).context("failed to set up live source")?;
    let season = cache.season();
    info!(%season, dir = %cfg.snapshot_dir.display(), "prefetching snapshots");

    let wants = |name: &str| only.is_empty() || only.contains(name);
    let mut failures = 0usize;

    if wants("schedule") || wants("h2h") {
        let schedule = cache.get_schedule().context("schedule")?;
        println!("schedule: {} games", schedule.len());
    }
    if wants("table") || wants("clubs") {
        let tables = cache.get_table().context("league table")?;
        println!("table: {} clubs", tables.overall.len());
    }
    if wants("season") || wants("h2h") {
        let season_stats = cache.get_club_season_stats().context("club season stats")?;
        println!("season: {} clubs", season_stats.rows.len());
    }

    if wants("clubs") {
        let tables = cache.get_table()?;
        for row in &tables.overall {
            match cache.get_club_recent_matches(&row.squad) {
                Ok(rows) => println!("clubs: {} ({} recent)", row.squad, rows.len()),
                Err(err) => {
                    failures += 1;
                    warn!(club = %row.squad, error = %err, "club match log failed");
                }
            }
        }
    }

    if wants("h2h") {
        let schedule = cache.get_schedule()?;
        let season_stats = cache.get_club_season_stats()?;
        let Some(week) = open_match_days(&schedule).first().copied() else {
            println!("h2h: no open match day");
            return finish(failures);
        };
        for game in games_for_match_day(&schedule, week) {
            let ids = team_id_for(&season_stats, &game.home_team)
                .and_then(|h| Ok((h, team_id_for(&season_stats, &game.away_team)?)));
            let result = ids.and_then(|(h, a)| cache.get_head_to_head(&h, &a));
            match result {
                Ok(rows) => println!("h2h: {} ({} meetings)", game.game_str, rows.len()),
                Err(err) => {
                    failures += 1;
                    warn!(game = %game.game_str, error = %err, "head-to-head failed");
                }
            }
        }
    }

    finish(failures)
}

fn finish(failures: usize) -> Result<()> {
    if failures > 0 {
        return Err(anyhow!("{failures} dataset(s) failed, see log output"));
    }
    println!("done");
    Ok(())
}

fn parse_only_arg() -> Result<HashSet<String>> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        let raw = if let Some(raw) = arg.strip_prefix("--only=") {
            raw
        } else if arg == "--only"
            && let Some(next) = args.get(idx + 1)
        {
            next.as_str()
        } else {
            continue;
        };
        let names = raw
            .split([',', ';', ' '])
            .map(|part| part.trim().to_ascii_lowercase())
            .filter(|part| !part.is_empty())
            .collect::<HashSet<_>>();
        if let Some(bad) = names.iter().find(|n| !DATASETS.contains(&n.as_str())) {
            return Err(anyhow!(
                "unknown dataset `{bad}`, expected one of {}",
                DATASETS.join(",")
            ));
        }
        return Ok(names);
    }
    Ok(HashSet::new())
}

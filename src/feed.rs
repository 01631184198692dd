use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::cache::{DatasetKind, PreviewCache};
use crate::preview::build_match_preview;
use crate::state::{Delta, ProviderCommand};

/// Runs the cache on its own thread. Commands are handled one at a time, so
/// there is never more than one fetch in flight.
pub fn spawn_provider(
    cache: PreviewCache,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        info!("provider started");
        for cmd in cmd_rx {
            for delta in handle_command(&cache, cmd) {
                if tx.send(delta).is_err() {
                    info!("ui gone, provider stopping");
                    return;
                }
            }
        }
    })
}

pub fn handle_command(cache: &PreviewCache, cmd: ProviderCommand) -> Vec<Delta> {
    match cmd {
        ProviderCommand::LoadSchedule => match cache.get_schedule() {
            Ok(schedule) => vec![Delta::SetSchedule(schedule)],
            Err(err) => {
                warn!(error = %err, "schedule load failed");
                vec![Delta::ScheduleFailed(err.to_string())]
            }
        },
        ProviderCommand::LoadPreview { game } => match build_match_preview(cache, &game) {
            Ok(preview) => vec![
                Delta::SetPreview {
                    game_key: game.game_key(),
                    preview: Box::new(preview),
                },
                Delta::Log(format!("[INFO] Preview {} ready", game.game_str)),
            ],
            Err(err) => {
                warn!(game = %game.game_str, error = %err, "preview failed");
                vec![Delta::PreviewFailed {
                    game_key: game.game_key(),
                    game_str: game.game_str,
                    error: err.to_string(),
                }]
            }
        },
        ProviderCommand::Reset(kind) => {
            cache.reset(kind);
            vec![Delta::DatasetReset(kind)]
        }
        ProviderCommand::ResetAll => {
            cache.reset_all();
            DatasetKind::ALL
                .into_iter()
                .map(Delta::DatasetReset)
                .collect()
        }
    }
}

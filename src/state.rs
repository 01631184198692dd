use std::collections::{HashMap, VecDeque};

use crate::cache::DatasetKind;
use crate::preview::{MatchPreview, duplicate_labels, games_for_match_day, open_match_days};
use crate::transform::ScheduleRow;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone)]
pub enum PreviewSlot {
    Loading,
    Ready(Box<MatchPreview>),
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    LoadSchedule,
    LoadPreview { game: ScheduleRow },
    Reset(DatasetKind),
    ResetAll,
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetSchedule(Vec<ScheduleRow>),
    ScheduleFailed(String),
    SetPreview {
        game_key: String,
        preview: Box<MatchPreview>,
    },
    PreviewFailed {
        game_key: String,
        game_str: String,
        error: String,
    },
    DatasetReset(DatasetKind),
    Log(String),
}

#[derive(Debug)]
pub struct AppState {
    pub schedule: Vec<ScheduleRow>,
    pub schedule_loading: bool,
    pub schedule_error: Option<String>,
    pub match_days: Vec<u32>,
    pub selected_day: usize,
    /// Upcoming games of the selected match day, by kickoff.
    pub games: Vec<ScheduleRow>,
    pub selected_game: usize,
    /// Keyed by [`ScheduleRow::game_key`]; tab labels can collide.
    pub previews: HashMap<String, PreviewSlot>,
    pub preview_scroll: u16,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            schedule: Vec::new(),
            schedule_loading: true,
            schedule_error: None,
            match_days: Vec::new(),
            selected_day: 0,
            games: Vec::new(),
            selected_game: 0,
            previews: HashMap::new(),
            preview_scroll: 0,
            help_overlay: false,
            logs: VecDeque::new(),
        }
    }

    pub fn selected_week(&self) -> Option<u32> {
        self.match_days.get(self.selected_day).copied()
    }

    pub fn selected_game(&self) -> Option<&ScheduleRow> {
        self.games.get(self.selected_game)
    }

    pub fn selected_preview(&self) -> Option<&PreviewSlot> {
        let game = self.selected_game()?;
        self.previews.get(&game.game_key())
    }

    /// True when the selected game has neither a preview nor a request in flight.
    pub fn needs_preview(&self) -> bool {
        self.selected_game()
            .is_some_and(|g| !self.previews.contains_key(&g.game_key()))
    }

    pub fn mark_preview_loading(&mut self, game: &ScheduleRow) {
        self.previews.insert(game.game_key(), PreviewSlot::Loading);
    }

    /// Returns true when the selection moved. The caller then asks for a
    /// fresh schedule so countdowns are derived again.
    pub fn select_next_day(&mut self) -> bool {
        if self.selected_day + 1 < self.match_days.len() {
            self.selected_day += 1;
            self.refresh_games();
            return true;
        }
        false
    }

    pub fn select_prev_day(&mut self) -> bool {
        if self.selected_day > 0 {
            self.selected_day -= 1;
            self.refresh_games();
            return true;
        }
        false
    }

    pub fn select_next_game(&mut self) {
        if self.games.is_empty() {
            return;
        }
        self.selected_game = (self.selected_game + 1) % self.games.len();
        self.preview_scroll = 0;
    }

    pub fn select_prev_game(&mut self) {
        if self.games.is_empty() {
            return;
        }
        self.selected_game = if self.selected_game == 0 {
            self.games.len() - 1
        } else {
            self.selected_game - 1
        };
        self.preview_scroll = 0;
    }

    pub fn scroll_down(&mut self) {
        self.preview_scroll = self.preview_scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.preview_scroll = self.preview_scroll.saturating_sub(1);
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn set_schedule(&mut self, schedule: Vec<ScheduleRow>) {
        let previous_week = self.selected_week();
        self.schedule = schedule;
        self.schedule_loading = false;
        self.schedule_error = None;
        self.match_days = open_match_days(&self.schedule);
        self.selected_day = previous_week
            .and_then(|w| self.match_days.iter().position(|d| *d == w))
            .unwrap_or(0);
        self.refresh_games();
    }

    fn refresh_games(&mut self) {
        let previous_keys: Vec<String> = self.games.iter().map(ScheduleRow::game_key).collect();
        let previous_game = previous_keys.get(self.selected_game).cloned();
        self.games = match self.selected_week() {
            Some(week) => games_for_match_day(&self.schedule, week),
            None => Vec::new(),
        };
        let kept = previous_game
            .and_then(|key| self.games.iter().position(|g| g.game_key() == key));
        if kept.is_none() {
            self.preview_scroll = 0;
        }
        self.selected_game = kept.unwrap_or(0);

        let keys: Vec<String> = self.games.iter().map(ScheduleRow::game_key).collect();
        if keys != previous_keys {
            for label in duplicate_labels(&self.games) {
                self.push_log(format!("[WARN] Game label {label} is not unique"));
            }
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetSchedule(schedule) => {
            let count = schedule.len();
            let previous_days = state.match_days.clone();
            state.set_schedule(schedule);
            // Periodic refreshes stay quiet unless the open days moved.
            if previous_days != state.match_days {
                state.push_log(format!(
                    "[INFO] Schedule loaded: {count} games, {} open match days",
                    state.match_days.len()
                ));
            }
        }
        Delta::ScheduleFailed(error) => {
            state.schedule_loading = false;
            state.push_log(format!("[WARN] Schedule failed: {error}"));
            state.schedule_error = Some(error);
        }
        Delta::SetPreview { game_key, preview } => {
            state.previews.insert(game_key, PreviewSlot::Ready(preview));
        }
        Delta::PreviewFailed {
            game_key,
            game_str,
            error,
        } => {
            state.push_log(format!("[WARN] Preview {game_str} failed: {error}"));
            state.previews.insert(game_key, PreviewSlot::Failed(error));
        }
        Delta::DatasetReset(kind) => {
            // Previews are assembled from every dataset, so any reset stales them.
            state.previews.clear();
            if kind == DatasetKind::Schedule {
                state.schedule_loading = true;
            }
            state.push_log(format!("[INFO] Reset {kind}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

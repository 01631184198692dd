mod common;

use bundesliga_preview::cache::DatasetKind;
use bundesliga_preview::feed::handle_command;
use bundesliga_preview::state::{AppState, Delta, PreviewSlot, ProviderCommand, apply_delta};
use bundesliga_preview::table::RawTable;
use bundesliga_preview::transform::{ScheduleRow, prep_schedule};

use common::{FakeClock, FixtureSource, at, fixture_now, live_cache, temp_dir};

fn fixture_schedule() -> Vec<ScheduleRow> {
    let dir = temp_dir("state_schedule");
    let source = FixtureSource::new();
    let clock = FakeClock::new(fixture_now());
    live_cache(&source, &clock, &dir).get_schedule().unwrap()
}

fn loaded_state() -> AppState {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::SetSchedule(fixture_schedule()));
    state
}

#[test]
fn schedule_delta_selects_first_open_match_day() {
    let state = loaded_state();
    assert!(!state.schedule_loading);
    assert_eq!(state.match_days, vec![6, 7]);
    assert_eq!(state.selected_week(), Some(6));
    let labels: Vec<&str> = state.games.iter().map(|g| g.game_str.as_str()).collect();
    assert_eq!(labels, vec!["VfB vs FCB", "B04 vs BVB"]);
    assert!(state.logs.back().unwrap().starts_with("[INFO] Schedule loaded"));
}

#[test]
fn navigation_wraps_games_and_clamps_days() {
    let mut state = loaded_state();
    assert!(!state.select_prev_day());
    assert_eq!(state.selected_week(), Some(6));

    state.select_next_game();
    assert_eq!(state.selected_game().unwrap().game_str, "B04 vs BVB");
    state.select_next_game();
    assert_eq!(state.selected_game().unwrap().game_str, "VfB vs FCB");
    state.select_prev_game();
    assert_eq!(state.selected_game().unwrap().game_str, "B04 vs BVB");

    assert!(state.select_next_day());
    assert_eq!(state.selected_week(), Some(7));
    assert_eq!(state.selected_game, 0);
    assert!(!state.select_next_day());
    assert_eq!(state.selected_week(), Some(7));
}

#[test]
fn reloading_schedule_keeps_the_selected_week() {
    let mut state = loaded_state();
    state.select_next_day();
    apply_delta(&mut state, Delta::SetSchedule(fixture_schedule()));
    assert_eq!(state.selected_week(), Some(7));
}

#[test]
fn preview_slots_track_requests() {
    let mut state = loaded_state();
    assert!(state.needs_preview());
    let game = state.selected_game().unwrap().clone();
    state.mark_preview_loading(&game);
    assert!(!state.needs_preview());
    assert!(matches!(state.selected_preview(), Some(PreviewSlot::Loading)));

    apply_delta(
        &mut state,
        Delta::PreviewFailed {
            game_key: game.game_key(),
            game_str: game.game_str.clone(),
            error: "schema mismatch: boom".into(),
        },
    );
    assert!(matches!(state.selected_preview(), Some(PreviewSlot::Failed(e)) if e.contains("boom")));
    assert!(state.logs.back().unwrap().starts_with("[WARN]"));
}

#[test]
fn dataset_reset_drops_previews() {
    let mut state = loaded_state();
    let game = state.selected_game().unwrap().clone();
    state.mark_preview_loading(&game);
    apply_delta(&mut state, Delta::DatasetReset(DatasetKind::Table));
    assert!(state.previews.is_empty());
    assert!(!state.schedule_loading);

    apply_delta(&mut state, Delta::DatasetReset(DatasetKind::Schedule));
    assert!(state.schedule_loading);
    assert_eq!(state.logs.back().unwrap(), "[INFO] Reset season schedule");
}

#[test]
fn schedule_failure_is_surfaced() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::ScheduleFailed("source unavailable".into()));
    assert!(!state.schedule_loading);
    assert_eq!(state.schedule_error.as_deref(), Some("source unavailable"));
    assert!(state.selected_game().is_none());
    assert!(!state.needs_preview());
}

#[test]
fn log_console_is_bounded() {
    let mut state = AppState::new();
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("[INFO] line {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().unwrap(), "[INFO] line 50");
}

#[test]
fn provider_commands_produce_deltas() {
    let dir = temp_dir("state_provider");
    let source = FixtureSource::new();
    let clock = FakeClock::new(fixture_now());
    let cache = live_cache(&source, &clock, &dir);

    let deltas = handle_command(&cache, ProviderCommand::LoadSchedule);
    let mut state = AppState::new();
    for delta in deltas {
        apply_delta(&mut state, delta);
    }
    let game = state.selected_game().unwrap().clone();

    let key = game.game_key();
    let deltas = handle_command(&cache, ProviderCommand::LoadPreview { game });
    assert!(matches!(
        deltas.as_slice(),
        [Delta::SetPreview { game_key, .. }, Delta::Log(_)] if *game_key == key
    ));
    for delta in deltas {
        apply_delta(&mut state, delta);
    }
    assert!(matches!(state.selected_preview(), Some(PreviewSlot::Ready(_))));
    assert_eq!(state.logs.back().unwrap(), "[INFO] Preview VfB vs FCB ready");

    let deltas = handle_command(&cache, ProviderCommand::ResetAll);
    assert_eq!(deltas.len(), DatasetKind::ALL.len());
    let calls = source.call_count();
    handle_command(&cache, ProviderCommand::LoadSchedule);
    assert_eq!(source.call_count(), calls + 1);
}

#[test]
fn offline_preview_reports_failure() {
    let dir = temp_dir("state_offline");
    let source = FixtureSource::new();
    let clock = FakeClock::new(fixture_now());
    let cache = live_cache(&source, &clock, &dir);
    let schedule = cache.get_schedule().unwrap();
    let game = schedule.into_iter().find(|g| g.game_str == "B04 vs BVB").unwrap();

    source.set_offline(true);
    let deltas = handle_command(&cache, ProviderCommand::LoadPreview { game });
    assert!(matches!(
        deltas.as_slice(),
        [Delta::PreviewFailed { error, .. }] if error.contains("source unavailable")
    ));
}

fn colliding_schedule() -> Vec<ScheduleRow> {
    let header = ["date", "time", "home_team", "away_team", "week"];
    let rows = [
        ["2024-10-05", "15:30", "Hamburger SV", "St. Pauli", "6"],
        ["2024-10-05", "18:30", "Hamburg Tigers", "St. Gallen", "6"],
    ];
    let raw = RawTable::new(
        header.map(String::from).to_vec(),
        rows.iter().map(|r| r.map(String::from).to_vec()).collect(),
    );
    prep_schedule(&raw, fixture_now()).unwrap()
}

#[test]
fn games_sharing_a_label_keep_separate_previews() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::SetSchedule(colliding_schedule()));
    let labels: Vec<&str> = state.games.iter().map(|g| g.game_str.as_str()).collect();
    assert_eq!(labels, vec!["HAM vs ST.", "HAM vs ST."]);
    assert!(state.logs.iter().any(|l| l == "[WARN] Game label HAM vs ST. is not unique"));

    let first = state.selected_game().unwrap().clone();
    state.mark_preview_loading(&first);
    apply_delta(
        &mut state,
        Delta::PreviewFailed {
            game_key: first.game_key(),
            game_str: first.game_str.clone(),
            error: "schema mismatch: boom".into(),
        },
    );

    state.select_next_game();
    assert_eq!(state.selected_game().unwrap().home_team, "Hamburg Tigers");
    assert!(state.needs_preview());
    assert!(state.selected_preview().is_none());

    state.select_prev_game();
    assert!(matches!(state.selected_preview(), Some(PreviewSlot::Failed(_))));
}

#[test]
fn refreshed_schedule_drops_started_games() {
    let dir = temp_dir("state_refresh");
    let source = FixtureSource::new();
    let clock = FakeClock::new(fixture_now());
    let cache = live_cache(&source, &clock, &dir);

    let mut state = AppState::new();
    for delta in handle_command(&cache, ProviderCommand::LoadSchedule) {
        apply_delta(&mut state, delta);
    }
    state.select_next_game();
    state.scroll_down();
    assert_eq!(state.selected_game().unwrap().game_str, "B04 vs BVB");
    let before = state.selected_game().unwrap().time_to_start_days;

    // Half an hour after Stuttgart v Bayern kicked off.
    clock.set(at("2024-10-04", "21:00"));
    let calls = source.call_count();
    for delta in handle_command(&cache, ProviderCommand::LoadSchedule) {
        apply_delta(&mut state, delta);
    }
    assert_eq!(source.call_count(), calls);

    let labels: Vec<&str> = state.games.iter().map(|g| g.game_str.as_str()).collect();
    assert_eq!(labels, vec!["B04 vs BVB"]);
    let game = state.selected_game().unwrap();
    assert_eq!(game.game_str, "B04 vs BVB");
    assert_ne!(game.time_to_start_days, before);
    assert_eq!(game.time_to_start_days, Some(0));
    assert_eq!(state.preview_scroll, 1);
}

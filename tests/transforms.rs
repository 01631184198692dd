mod common;

use chrono::TimeDelta;

use bundesliga_preview::clubs::club_abbr;
use bundesliga_preview::error::PreviewError;
use bundesliga_preview::gateway::{normalize_match_log, normalize_schedule};
use bundesliga_preview::html_table::extract_tables;
use bundesliga_preview::table::{ColumnKey, GroupedTable, RawTable};
use bundesliga_preview::transform::head_to_head::H2H_WINDOW_YEARS;
use bundesliga_preview::transform::{
    Side, prep_club_matches, prep_club_season, prep_head_to_head, prep_schedule, prep_split,
};

use common::{at, read_fixture};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn schedule_table(rows: &[[&str; 5]]) -> RawTable {
    RawTable::new(
        strings(&["week", "date", "time", "home_team", "away_team"]),
        rows.iter().map(|r| strings(r)).collect(),
    )
}

#[test]
fn countdown_is_positive_before_kickoff() {
    let raw = schedule_table(&[["6", "2024-10-04", "20:30", "Stuttgart", "Bayern Munich"]]);
    let rows = prep_schedule(&raw, at("2024-10-01", "12:00")).unwrap();
    let game = &rows[0];
    assert_eq!(game.time_to_start, Some(TimeDelta::minutes(3 * 24 * 60 + 8 * 60 + 30)));
    assert_eq!(game.time_to_start_days, Some(3));
    assert_eq!(game.time_to_start_hours, Some(8));
    assert!(game.is_upcoming());
    assert_eq!(game.game_str, "VfB vs FCB");
}

#[test]
fn countdown_goes_negative_after_kickoff() {
    let raw = schedule_table(&[["6", "2024-10-04", "20:30", "Stuttgart", "Bayern Munich"]]);
    let rows = prep_schedule(&raw, at("2024-10-04", "21:30")).unwrap();
    let game = &rows[0];
    assert_eq!(game.time_to_start, Some(TimeDelta::hours(-1)));
    assert_eq!(game.time_to_start_days, Some(-1));
    assert_eq!(game.time_to_start_hours, Some(23));
    assert!(!game.is_upcoming());
}

#[test]
fn game_without_kickoff_time_is_not_upcoming() {
    let raw = schedule_table(&[["7", "2024-10-20", "", "Dortmund", "Leverkusen"]]);
    let rows = prep_schedule(&raw, at("2024-10-01", "12:00")).unwrap();
    assert_eq!(rows[0].kickoff, None);
    assert_eq!(rows[0].time_to_start_days, None);
    assert!(!rows[0].is_upcoming());
}

#[test]
fn abbreviations_map_known_clubs_and_fall_back() {
    let raw = schedule_table(&[["1", "2024-08-24", "15:30", "Werder Bremen", "Hamburger SV"]]);
    let rows = prep_schedule(&raw, at("2024-08-01", "12:00")).unwrap();
    assert_eq!(rows[0].home_abbr, "SVW");
    assert_eq!(rows[0].away_abbr, "HAM");
    assert_eq!(rows[0].game_str, "SVW vs HAM");
    assert_eq!(club_abbr("Eint Frankfurt"), "SGE");
}

#[test]
fn schedule_without_required_column_is_a_schema_mismatch() {
    let raw = RawTable::new(strings(&["date", "time"]), vec![strings(&["2024-10-04", "20:30"])]);
    let err = prep_schedule(&raw, at("2024-10-01", "12:00")).unwrap_err();
    assert!(matches!(err, PreviewError::SchemaMismatch(_)), "{err}");
}

#[test]
fn fixture_schedule_counts_down_from_fixed_clock() {
    let html = read_fixture("schedule.html");
    let raw = normalize_schedule(&extract_tables(&html)[0]);
    let rows = prep_schedule(&raw, at("2024-10-01", "12:00")).unwrap();
    assert_eq!(rows.len(), 6);

    let upcoming: Vec<&str> = rows
        .iter()
        .filter(|g| g.is_upcoming())
        .map(|g| g.game_str.as_str())
        .collect();
    assert_eq!(upcoming, vec!["VfB vs FCB", "B04 vs BVB", "FCB vs VfB"]);
    // Local-time suffix "(21:30)" is ignored.
    assert_eq!(rows[4].kickoff, Some(at("2024-10-19", "15:30")));
    assert_eq!(rows[0].game_id, "a1b2c3d4");
}

fn split_table() -> GroupedTable {
    let columns = vec![
        ColumnKey::new("", "Rk"),
        ColumnKey::new("", "Squad"),
        ColumnKey::new("Home", "MP"),
        ColumnKey::new("Home", "Pts"),
        ColumnKey::new("Away", "MP"),
        ColumnKey::new("Away", "Pts"),
    ];
    let rows = vec![
        strings(&["1", "A", "2", "6", "3", "7"]),
        strings(&["2", "B", "3", "6", "2", "5"]),
        strings(&["3", "C", "3", "9", "2", "1"]),
        strings(&["4", "D", "3", "4", "2", "3"]),
    ];
    GroupedTable::new(columns, rows)
}

#[test]
fn home_split_orders_by_points_keeping_ties_stable() {
    let home = prep_split(&split_table(), Side::Home).unwrap();
    let order: Vec<(&str, u32, Option<u32>)> = home
        .iter()
        .map(|r| (r.squad.as_str(), r.split_rank, r.table_rank))
        .collect();
    assert_eq!(
        order,
        vec![
            ("C", 1, Some(3)),
            ("A", 2, Some(1)),
            ("B", 3, Some(2)),
            ("D", 4, Some(4)),
        ]
    );
    assert_eq!(home[0].points, Some(9));
    assert_eq!(home[0].matches_played, Some(3));
}

#[test]
fn away_split_is_ranked_independently() {
    let away = prep_split(&split_table(), Side::Away).unwrap();
    let order: Vec<(&str, u32)> = away.iter().map(|r| (r.squad.as_str(), r.split_rank)).collect();
    assert_eq!(order, vec![("A", 1), ("B", 2), ("D", 3), ("C", 4)]);
    assert_eq!(away[3].points, Some(1));
}

#[test]
fn split_without_side_group_is_a_schema_mismatch() {
    let table = GroupedTable::new(
        vec![ColumnKey::new("", "Squad"), ColumnKey::new("Home", "Pts")],
        vec![strings(&["A", "3"])],
    );
    let err = prep_split(&table, Side::Away).unwrap_err();
    assert!(matches!(err, PreviewError::SchemaMismatch(_)), "{err}");
}

fn match_log(reports: &[&str]) -> RawTable {
    let columns = strings(&[
        "date", "round", "day", "venue", "result", "GF", "GA", "opponent", "xG", "xGA", "Poss",
        "match_report", "game",
    ]);
    let rows = reports
        .iter()
        .enumerate()
        .map(|(i, report)| {
            vec![
                format!("2024-09-{:02}", i + 1),
                format!("Matchweek {}", i + 1),
                "Sat".to_string(),
                "Home".to_string(),
                "W".to_string(),
                "2".to_string(),
                "1".to_string(),
                format!("Opp {i}"),
                "1.5".to_string(),
                "0.8".to_string(),
                "55".to_string(),
                report.to_string(),
                format!("game {i}"),
            ]
        })
        .collect();
    RawTable::new(columns, rows)
}

#[test]
fn club_matches_keep_last_five_reported() {
    // 8 rows, 2 without a report: the last 5 of the 6 reported remain.
    let raw = match_log(&["/r/0", "", "/r/2", "/r/3", "/r/4", "/r/5", "/r/6", ""]);
    let rows = prep_club_matches(&raw).unwrap();
    let games: Vec<&str> = rows.iter().map(|r| r.game.as_str()).collect();
    assert_eq!(games, vec!["game 2", "game 3", "game 4", "game 5", "game 6"]);
    assert_eq!(rows[0].possession, Some(55.0));
    assert_eq!(rows[0].goals_for, Some(2));
}

#[test]
fn club_matches_with_few_reports_keep_all() {
    let raw = match_log(&["/r/0", "", "/r/2"]);
    let rows = prep_club_matches(&raw).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn fixture_match_log_keeps_last_five_played() {
    let html = read_fixture("matchlog_bayern.html");
    let raw = normalize_match_log(&extract_tables(&html)[0], "Bayern Munich");
    let rows = prep_club_matches(&raw).unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].game, "2024-08-31 Bayern Munich-Freiburg");
    assert_eq!(rows[1].game, "2024-09-14 Holstein Kiel-Bayern Munich");
    assert_eq!(rows[4].opponent, "Leverkusen");
    assert_eq!(rows[4].result, "D");
}

fn h2h_table(rows: &[[&str; 8]]) -> RawTable {
    RawTable::new(
        strings(&["Comp", "Round", "Date", "Home", "xG", "Score", "xG.1", "Away"]),
        rows.iter().map(|r| strings(r)).collect(),
    )
}

#[test]
fn head_to_head_keeps_five_year_window() {
    let raw = h2h_table(&[
        ["Bundesliga", "1", "2024-03-02", "A", "2.6", "2–0", "0.8", "B"],
        ["Bundesliga", "2", "2020-06-09", "B", "1.1", "1–2", "1.7", "A"],
        ["Bundesliga", "3", "2019-01-27", "B", "0.7", "1–4", "2.5", "A"],
        ["Bundesliga", "4", "2024-10-04", "B", "", "", "", "A"],
        ["Comp", "Round", "Date", "Home", "xG", "Score", "xG", "Away"],
    ]);
    let rows = prep_head_to_head(&raw).unwrap();
    let dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
    assert_eq!(dates, vec!["2024-03-02", "2020-06-09"]);
    assert_eq!(rows[0].home_xg, Some(2.6));
    assert_eq!(H2H_WINDOW_YEARS, 5);
}

#[test]
fn head_to_head_without_played_games_is_empty() {
    let raw = h2h_table(&[["Bundesliga", "4", "2024-10-04", "B", "", "", "", "A"]]);
    assert!(prep_head_to_head(&raw).unwrap().is_empty());
}

#[test]
fn head_to_head_with_unreadable_date_is_a_schema_mismatch() {
    let raw = h2h_table(&[["Bundesliga", "1", "soon", "A", "1.0", "1–0", "0.2", "B"]]);
    let err = prep_head_to_head(&raw).unwrap_err();
    assert!(matches!(err, PreviewError::SchemaMismatch(_)), "{err}");
}

#[test]
fn club_season_drops_bookkeeping_columns() {
    let columns = vec![
        ColumnKey::new("league", ""),
        ColumnKey::new("season", ""),
        ColumnKey::new("team", ""),
        ColumnKey::new("", "# Pl"),
        ColumnKey::new("Performance", "Gls"),
        ColumnKey::new("url", ""),
    ];
    let rows = vec![strings(&[
        "Bundesliga",
        "2024-2025",
        "Bayern Munich",
        "24",
        "20",
        "/en/squads/054efa67/Bayern-Munich-Stats",
    ])];
    let table = prep_club_season(&GroupedTable::new(columns, rows)).unwrap();
    assert_eq!(table.columns, vec!["# Pl", "Performance Gls"]);
    let bayern = table.row_for("Bayern Munich").unwrap();
    assert_eq!(bayern.team_id, "054efa67");
    assert_eq!(table.value(bayern, "Performance Gls"), Some("20"));
}

#[test]
fn club_season_without_url_is_a_schema_mismatch() {
    let table = GroupedTable::new(
        vec![ColumnKey::new("team", ""), ColumnKey::new("", "MP")],
        vec![strings(&["Bayern Munich", "5"])],
    );
    let err = prep_club_season(&table).unwrap_err();
    assert!(matches!(err, PreviewError::SchemaMismatch(_)), "{err}");
}

use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs};

use bundesliga_preview::cache::{DatasetKind, PreviewCache};
use bundesliga_preview::config::{self, AppConfig};
use bundesliga_preview::feed;
use bundesliga_preview::gateway::FetchMode;
use bundesliga_preview::logging;
use bundesliga_preview::preview::{ClubFormRow, MatchPreview};
use bundesliga_preview::season::Season;
use bundesliga_preview::state::{self, AppState, PreviewSlot, ProviderCommand, apply_delta};
use bundesliga_preview::transform::{Outcome, ScheduleRow, SplitRow, StandingsRow};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
    season: Season,
    mode: FetchMode,
    last_schedule_refresh: Instant,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ProviderCommand>, season: Season, mode: FetchMode) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
            season,
            mode,
            last_schedule_refresh: Instant::now(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Right | KeyCode::Char('l') => {
                if self.state.select_next_day() {
                    self.refresh_schedule();
                }
            }
            KeyCode::Left | KeyCode::Char('h') => {
                if self.state.select_prev_day() {
                    self.refresh_schedule();
                }
            }
            KeyCode::BackTab => self.state.select_prev_game(),
            KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.state.select_prev_game()
            }
            KeyCode::Tab => self.state.select_next_game(),
            KeyCode::Char('j') | KeyCode::Down => self.state.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.scroll_up(),
            KeyCode::Char('1') => self.reset(DatasetKind::Schedule),
            KeyCode::Char('2') => self.reset(DatasetKind::Table),
            KeyCode::Char('3') => self.reset(DatasetKind::ClubMatches),
            KeyCode::Char('4') => self.reset(DatasetKind::ClubSeason),
            KeyCode::Char('5') => self.reset(DatasetKind::HeadToHead),
            KeyCode::Char('R') => self.reload_all(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn send(&mut self, cmd: ProviderCommand) -> bool {
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Provider is not running");
            return false;
        }
        true
    }

    fn reset(&mut self, kind: DatasetKind) {
        if !self.send(ProviderCommand::Reset(kind)) {
            return;
        }
        if kind == DatasetKind::Schedule {
            self.send(ProviderCommand::LoadSchedule);
        }
    }

    /// The cache re-derives countdowns on every read without fetching again.
    fn refresh_schedule(&mut self) {
        if !self.state.schedule_loading && self.send(ProviderCommand::LoadSchedule) {
            self.last_schedule_refresh = Instant::now();
        }
    }

    fn reload_all(&mut self) {
        if self.send(ProviderCommand::ResetAll) {
            self.send(ProviderCommand::LoadSchedule);
        }
    }

    fn maybe_request_preview(&mut self) {
        if !self.state.needs_preview() {
            return;
        }
        let Some(game) = self.state.selected_game().cloned() else {
            return;
        };
        if self.send(ProviderCommand::LoadPreview { game: game.clone() }) {
            self.state.mark_preview_loading(&game);
        }
    }
}

fn main() -> Result<()> {
    config::load_dotenv();
    let mut cfg = AppConfig::from_env();
    if std::env::args().skip(1).any(|a| a == "--snapshot") {
        cfg.fetch_mode = FetchMode::Snapshot;
    }
    logging::init_file_logging(&cfg.log_file)?;

    let cache = PreviewCache::from_config(&cfg).context("failed to set up data source")?;
    let season = cache.season();

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let _provider = feed::spawn_provider(cache, tx, cmd_rx);

    let mut app = App::new(cmd_tx, season, cfg.fetch_mode);
    app.send(ProviderCommand::LoadSchedule);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let schedule_refresh = Duration::from_secs(60);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.maybe_request_preview();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            if app.last_schedule_refresh.elapsed() >= schedule_refresh {
                app.refresh_schedule();
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Min(5),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_game_tabs(frame, chunks[1], &app.state);

    let day = Paragraph::new(match_day_lines(&app.state))
        .block(Block::default().title("Match day").borders(Borders::ALL));
    frame.render_widget(day, chunks[2]);

    let preview = Paragraph::new(preview_lines(&app.state))
        .scroll((app.state.preview_scroll, 0))
        .block(Block::default().title("Preview").borders(Borders::ALL));
    frame.render_widget(preview, chunks[3]);

    let console = Paragraph::new(console_text(&app.state))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(console, chunks[4]);

    let footer = Paragraph::new(
        "←/→ Match day | Tab Game | j/k Scroll | 1-5 Reset dataset | R Reload all | ? Help | q Quit",
    );
    frame.render_widget(footer, chunks[5]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let day = app
        .state
        .selected_week()
        .map(|w| format!("Match Day {w}"))
        .unwrap_or_else(|| "No open match day".to_string());
    let mode = match app.mode {
        FetchMode::Live => "live",
        FetchMode::Snapshot => "snapshot",
    };
    format!(
        "BUNDESLIGA MATCH PREVIEW | Season {} | {day} | {mode}",
        app.season
    )
}

fn render_game_tabs(frame: &mut Frame, area: Rect, state: &AppState) {
    let titles: Vec<String> = state.games.iter().map(|g| g.game_str.clone()).collect();
    let tabs = Tabs::new(titles)
        .select(state.selected_game)
        .block(Block::default().title("Games").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn match_day_lines(state: &AppState) -> Vec<Line<'static>> {
    if state.schedule_loading {
        return vec![Line::from("Loading schedule...")];
    }
    if let Some(err) = &state.schedule_error {
        return vec![Line::styled(
            format!("Schedule unavailable: {err}"),
            Style::default().fg(Color::Red),
        )];
    }
    if state.games.is_empty() {
        return vec![Line::from("No upcoming games")];
    }
    let mut lines = vec![Line::styled(
        format!("{:<12} {:<4} {:<14} {}", "Game", "Day", "Time", "Starts in"),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (idx, g) in state.games.iter().enumerate() {
        let style = if idx == state.selected_game {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        lines.push(Line::styled(
            format!(
                "{:<12} {:<4} {:<14} {}",
                g.game_str,
                g.day,
                g.time,
                countdown(g)
            ),
            style,
        ));
    }
    lines
}

fn countdown(game: &ScheduleRow) -> String {
    match (game.time_to_start_days, game.time_to_start_hours) {
        (Some(d), Some(h)) => format!("{d}d {h}h"),
        _ => "-".to_string(),
    }
}

fn preview_lines(state: &AppState) -> Vec<Line<'static>> {
    match state.selected_preview() {
        None => vec![Line::from("Select a game")],
        Some(PreviewSlot::Loading) => vec![Line::from("Loading preview...")],
        Some(PreviewSlot::Failed(err)) => vec![Line::styled(
            format!("Preview failed: {err}"),
            Style::default().fg(Color::Red),
        )],
        Some(PreviewSlot::Ready(preview)) => render_preview(preview),
    }
}

fn render_preview(p: &MatchPreview) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    section(&mut lines, "Table");
    lines.push(bold(format!(
        "{:>3} {:<16} {:>3} {:>3} {:>3} {:>3} {:>7} {:>4} {:>4} {:>5} {:>5} {:>5}  {}",
        "Rk", "Club", "MP", "W", "D", "L", "Goals", "GD", "Pts", "xG", "xGA", "xGD", "Last 5"
    )));
    for row in &p.standings {
        lines.push(Line::from(standings_line(row)));
    }

    section(&mut lines, &format!("{} home table stats", p.home_team));
    split_lines(&mut lines, p.home_split.as_ref());
    section(&mut lines, &format!("{} away table stats", p.away_team));
    split_lines(&mut lines, p.away_split.as_ref());

    section(&mut lines, "5 Game Form");
    form_lines(&mut lines, &p.home_team, &p.home_form);
    form_lines(&mut lines, &p.away_team, &p.away_form);

    section(&mut lines, "Head-to-head Statistics");
    if p.head_to_head.is_empty() {
        lines.push(dim("No recent meetings"));
    }
    for h in &p.head_to_head {
        lines.push(Line::from(format!(
            "{:<10} {:<16} {:<18} {:>4} {:^7} {:<4} {:<18} {}",
            h.date,
            h.comp,
            h.home,
            opt_f1(h.home_xg),
            h.score,
            opt_f1(h.away_xg),
            h.away,
            h.round
        )));
    }

    section(&mut lines, "Team Season Stats");
    let shown: Vec<usize> = (0..p.season_columns.len()).take(10).collect();
    let header = shown
        .iter()
        .map(|&i| format!("{:>10}", truncate(&p.season_columns[i], 10)))
        .collect::<String>();
    lines.push(bold(format!("{:<16}{header}", "Club")));
    for row in &p.season_stats {
        let values = shown
            .iter()
            .map(|&i| format!("{:>10}", row.values.get(i).map(String::as_str).unwrap_or("")))
            .collect::<String>();
        lines.push(Line::from(format!("{:<16}{values}", row.team)));
    }

    lines
}

fn standings_line(row: &StandingsRow) -> String {
    format!(
        "{:>3} {:<16} {:>3} {:>3} {:>3} {:>3} {:>7} {:>4} {:>4} {:>5} {:>5} {:>5}  {}",
        opt(row.rank),
        truncate(&row.squad, 16),
        opt(row.matches_played),
        opt(row.wins),
        opt(row.draws),
        opt(row.losses),
        format!("{}:{}", opt(row.goals_for), opt(row.goals_against)),
        opt(row.goal_diff),
        opt(row.points),
        opt_f1(row.xg),
        opt_f1(row.xga),
        opt_f1(row.xgd),
        row.last5
    )
}

fn split_lines(lines: &mut Vec<Line<'static>>, row: Option<&SplitRow>) {
    let Some(row) = row else {
        lines.push(dim("Club not found in split table"));
        return;
    };
    lines.push(Line::from(format!(
        "#{} (table {}) {:<16} MP {} W {} D {} L {} Goals {}:{} Pts {} xG {} xGA {}",
        row.split_rank,
        opt(row.table_rank),
        truncate(&row.squad, 16),
        opt(row.matches_played),
        opt(row.wins),
        opt(row.draws),
        opt(row.losses),
        opt(row.goals_for),
        opt(row.goals_against),
        opt(row.points),
        opt_f1(row.xg),
        opt_f1(row.xga)
    )));
}

fn form_lines(lines: &mut Vec<Line<'static>>, club: &str, rows: &[ClubFormRow]) {
    lines.push(bold(club.to_string()));
    if rows.is_empty() {
        lines.push(dim("No completed matches"));
    }
    for f in rows {
        let m = &f.row;
        let color = match m.outcome() {
            Some(Outcome::Win) => Color::Green,
            Some(Outcome::Draw) => Color::Blue,
            Some(Outcome::Loss) => Color::Red,
            None => Color::White,
        };
        let text = format!(
            "{:<10} {:<3} {:<5} {:<3} {}:{} vs {:<16} ({:>2}) xG {} xGA {} Poss {}",
            m.date,
            m.day,
            m.venue,
            m.result,
            opt(m.goals_for),
            opt(m.goals_against),
            truncate(&m.opponent, 16),
            opt(f.opponent_rank),
            opt_f1(m.xg),
            opt_f1(m.xga),
            opt(m.possession.map(|p| p.round() as i64))
        );
        lines.push(Line::from(Span::styled(text, Style::default().fg(color))));
    }
}

fn section(lines: &mut Vec<Line<'static>>, title: &str) {
    if !lines.is_empty() {
        lines.push(Line::from(""));
    }
    lines.push(Line::styled(
        title.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ));
}

fn bold(text: String) -> Line<'static> {
    Line::styled(text, Style::default().add_modifier(Modifier::BOLD))
}

fn dim(text: &str) -> Line<'static> {
    Line::styled(text.to_string(), Style::default().fg(Color::DarkGray))
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn opt_f1(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.1}"))
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn console_text(state: &AppState) -> String {
    let mut lines: Vec<&str> = state.logs.iter().rev().take(3).map(String::as_str).collect();
    lines.reverse();
    lines.join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Bundesliga Match Preview - Help",
        "",
        "  ←/→ or h/l      Previous / next match day",
        "  Tab / Shift-Tab Next / previous game",
        "  j/k or ↑/↓      Scroll preview",
        "  1               Reset season schedule",
        "  2               Reset league table",
        "  3               Reset club matches",
        "  4               Reset club season stats",
        "  5               Reset head-to-head",
        "  R               Reset everything and reload",
        "  ?               Toggle help",
        "  q               Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

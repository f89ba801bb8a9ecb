use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};

use live_odds::config::EngineConfig;
use live_odds::forecast::GoalForecast;
use live_odds::match_state::Side;
use live_odds::odds::OddsSnapshot;
use live_odds::session::{MatchSession, result_label};

struct App {
    session: MatchSession,
    forecast: GoalForecast,
    forecast_dirty: bool,
    // Digits typed before h/a; blank means the clock minute.
    goal_minute_input: String,
    goal_detail: bool,
    help_overlay: bool,
    should_quit: bool,
}

impl App {
    fn new(config: EngineConfig) -> Self {
        let mut session = MatchSession::new(config);
        let cfg = session.config();
        let msg = format!(
            "[INFO] Model home {:.2}+{:.2} away {:.2} | {} trials",
            cfg.params.base_home_rate, cfg.params.home_advantage, cfg.params.base_away_rate, cfg.trials
        );
        session.push_log(msg);
        Self {
            session,
            forecast: GoalForecast::default(),
            forecast_dirty: true,
            goal_minute_input: String::new(),
            goal_detail: false,
            help_overlay: false,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Right | KeyCode::Char('l') => self.step(1),
            KeyCode::Left | KeyCode::Char('j') => self.step(-1),
            KeyCode::PageUp | KeyCode::Char('L') => self.step(5),
            KeyCode::PageDown | KeyCode::Char('J') => self.step(-5),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.goal_minute_input.len() < 2 {
                    self.goal_minute_input.push(c);
                }
            }
            KeyCode::Backspace => {
                self.goal_minute_input.pop();
            }
            KeyCode::Char('h') => self.goal(Side::Home),
            KeyCode::Char('a') => self.goal(Side::Away),
            KeyCode::Char('d') => self.goal_detail = !self.goal_detail,
            KeyCode::Char('r') => {
                self.session.reset();
                self.forecast_dirty = true;
            }
            KeyCode::Char('f') => {
                self.forecast_dirty = true;
                self.session.push_log("[INFO] Forecast re-rolled");
            }
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            KeyCode::Esc => {
                self.help_overlay = false;
                self.goal_minute_input.clear();
            }
            _ => {}
        }
    }

    fn step(&mut self, delta: i32) {
        let before = self.session.minute();
        self.session.step_minute(delta);
        if self.session.minute() != before {
            self.forecast_dirty = true;
        }
    }

    fn goal(&mut self, side: Side) {
        let input = std::mem::take(&mut self.goal_minute_input);
        if self.session.record_goal(&input, side).is_ok() {
            self.forecast_dirty = true;
        }
    }

    // The simulation is random, so it is rerun only when its inputs change.
    fn refresh_forecast(&mut self) {
        if self.forecast_dirty {
            self.forecast = self.session.forecast();
            self.forecast_dirty = false;
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mut app = App::new(EngineConfig::from_env());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        app.refresh_forecast();
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
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
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.session))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_match(frame, chunks[1], app);

    let console = Paragraph::new(console_text(&app.session))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(app));
    frame.render_widget(footer, chunks[3]);

    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn footer_text(app: &App) -> String {
    let goal_at = if app.goal_minute_input.is_empty() {
        format!("{}' (clock)", app.session.minute())
    } else {
        format!("{}'", app.goal_minute_input)
    };
    format!(
        "←/→ Minute | PgUp/PgDn ±5 | 0-9 Goal minute [{goal_at}] | h Home goal | a Away goal | d Detail | r Reset | f Re-roll | ? Help | q Quit"
    )
}

fn header_text(session: &MatchSession) -> String {
    let (home, away) = session.scoreline();
    let line1 = format!(
        "  LIVE ODDS | {}' | {} min left",
        session.minute(),
        session.remaining_minutes()
    );
    let line2 = format!(
        "  HOME {home}-{away} AWAY | {}",
        result_label(session.leader())
    );
    format!("{line1}\n{line2}")
}

fn render_match(frame: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(28)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(5),
            Constraint::Min(4),
        ])
        .split(columns[0]);

    let goal_text = if app.goal_detail {
        goal_detail_text(&app.session)
    } else {
        goal_list_text(&app.session)
    };
    let goals = Paragraph::new(goal_text)
        .block(Block::default().title("Goals").borders(Borders::ALL));
    frame.render_widget(goals, columns[1]);

    if !app.session.has_started() {
        let idle = Paragraph::new("Move the clock (→) to start the analysis")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title("Odds").borders(Borders::ALL));
        frame.render_widget(idle, columns[0]);
        return;
    }

    let snapshot = app.session.odds();
    render_odds(frame, left[0], &snapshot);

    let rates = Paragraph::new(format!(
        "Home λ {:.3}\nAway λ {:.3}\nRemaining {}'",
        snapshot.rates.home,
        snapshot.rates.away,
        app.session.remaining_minutes()
    ))
    .block(Block::default().title("Adjusted rates").borders(Borders::ALL));
    frame.render_widget(rates, left[1]);

    let forecast = Paragraph::new(forecast_text(&app.forecast))
        .block(Block::default().title("Next goals").borders(Borders::ALL));
    frame.render_widget(forecast, left[2]);
}

fn render_odds(frame: &mut Frame, area: Rect, snapshot: &OddsSnapshot) {
    let block = Block::default().title("1 X 2").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(10)])
        .split(inner);

    let rows = [
        ("1 Home", snapshot.odds.home, snapshot.probs.home),
        ("X Draw", snapshot.odds.draw, snapshot.probs.draw),
        ("2 Away", snapshot.odds.away, snapshot.probs.away),
    ];
    let text = rows
        .iter()
        .map(|(label, odds, prob)| format!("{label}  {odds:>6.2}  {:>5.1}%", prob * 100.0))
        .collect::<Vec<_>>()
        .join("\n\n");
    frame.render_widget(
        Paragraph::new(text).style(Style::default().add_modifier(Modifier::BOLD)),
        cols[0],
    );
    frame.render_widget(prob_bar_chart(snapshot), cols[1]);
}

fn prob_bar_chart(snapshot: &OddsSnapshot) -> BarChart<'static> {
    let bar = |prob: f64, color: Color| {
        Bar::default()
            .value((prob * 100.0).round().max(0.0) as u64)
            .text_value(String::new())
            .style(Style::default().fg(color))
    };
    let bars = [
        bar(snapshot.probs.home, Color::Green),
        bar(snapshot.probs.draw, Color::Yellow),
        bar(snapshot.probs.away, Color::Red),
    ];

    BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(1)
        .group_gap(0)
        .max(100)
}

fn forecast_text(forecast: &GoalForecast) -> String {
    let side_line = |label: &str, minutes: &[f64]| {
        if minutes.is_empty() {
            return format!("{label}: no further goals expected");
        }
        let parts = minutes
            .iter()
            .map(|m| format!("{m:.0}'"))
            .collect::<Vec<_>>()
            .join("  ");
        format!("{label}: {parts}")
    };
    [
        side_line("Home", &forecast.home),
        side_line("Away", &forecast.away),
        "(25th / 50th / 75th percentile)".to_string(),
    ]
    .join("\n")
}

fn goal_list_text(session: &MatchSession) -> String {
    let events = session.events();
    if events.is_empty() {
        return "No goals recorded".to_string();
    }
    events
        .iter()
        .enumerate()
        .map(|(i, goal)| format!("{}. {:.0}' {}", i + 1, goal.minute, goal.side))
        .collect::<Vec<_>>()
        .join("\n")
}

fn goal_detail_text(session: &MatchSession) -> String {
    let minutes = |side: Side| {
        session
            .state()
            .goal_minutes(side)
            .iter()
            .map(|m| format!("{m:.0}'"))
            .collect::<Vec<_>>()
            .join(" ")
    };
    format!(
        "Home: [{}]\nAway: [{}]",
        minutes(Side::Home),
        minutes(Side::Away)
    )
}

fn console_text(session: &MatchSession) -> String {
    if session.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    session
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Live Odds - Help",
        "",
        "Keys:",
        "  ←/→ or j/l       Minute -1/+1",
        "  PgDn/PgUp, J/L   Minute -5/+5",
        "  0-9, Backspace   Type a goal minute (Esc clears)",
        "  h                Home goal at typed minute, else clock",
        "  a                Away goal at typed minute, else clock",
        "  d                Toggle raw goal-minute lists",
        "  r                Reset match",
        "  f                Re-run goal simulation",
        "  ?                Toggle help",
        "  q                Quit",
        "",
        "Model:",
        "  Home λ = (base home + advantage) × remaining/90",
        "  Away λ = base away × remaining/90",
        "  Leading side ×0.8, trailing side ×1.2",
        "  Final result from independent Poisson goals (0-9 each)",
        "  Next goals: 25/50/75th pct of simulated arrival minutes",
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

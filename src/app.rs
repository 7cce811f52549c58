//! App: terminal init, main loop, tick scheduling, key and mouse handling,
//! screen routing.

use crate::Args;
use crate::engine::{EngineEvent, Mode, ModeProfile, RoundEngine, RoundOutcome};
use crate::input::{Action, key_to_action};
use crate::scores::{FileScores, ResultSink, ScoreEntry};
use crate::theme::Theme;
use crate::ui;
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use std::io;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Redraw cadence; also the fast-tick period driving the clock.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const FAST_TICK_INTERVAL: Duration = Duration::from_millis(16);
/// Ambient grid mutation cadence (hard mode).
const AMBIENT_INTERVAL: Duration = Duration::from_secs(1);

/// If the process was suspended longer than this, snap the tick schedule to
/// now instead of replaying the backlog.
const TICK_CATCHUP_LIMIT: Duration = Duration::from_secs(1);

const MAX_NAME_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    /// Read-only view of the scores file.
    Scores,
    Playing,
    /// Easy mode, between sub-rounds; the clock is paused.
    RoundBreak,
    /// Easy mode cleared; the survival round starts on the next key.
    Handoff,
    /// Survival round over; the player types a name for the scores file.
    NameEntry,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Play,
    Scores,
    Quit,
}

impl MenuItem {
    fn next(self) -> Self {
        match self {
            Self::Play => Self::Scores,
            Self::Scores => Self::Quit,
            Self::Quit => Self::Play,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Play => Self::Quit,
            Self::Scores => Self::Play,
            Self::Quit => Self::Scores,
        }
    }
}

/// A live round. Kept around through game over so the final stats stay on
/// screen; dropped when returning to the menu.
pub struct Session {
    pub engine: RoundEngine<SmallRng>,
}

pub struct App {
    args: Args,
    theme: Theme,
    screen: Screen,
    session: Option<Session>,
    cursor: (usize, usize),
    menu_selected: MenuItem,
    name_input: String,
    /// Contents of the scores file, loaded when the scores screen opens.
    scores_text: String,
    last_outcome: Option<RoundOutcome>,
    /// Stats captured the moment a survival round terminates, so later UI
    /// time does not leak into the recorded entry.
    pending: Option<(RoundOutcome, u32, f64)>,
    sink: FileScores,
    last_fast_tick: Instant,
    last_ambient_tick: Instant,
    outcome_effect: Option<Effect>,
    effect_time: Option<Instant>,
}

impl App {
    pub fn new(args: Args, theme: Theme) -> Self {
        let sink = FileScores::new(args.scores_file.clone());
        let now = Instant::now();
        Self {
            args,
            theme,
            screen: Screen::Menu,
            session: None,
            cursor: (0, 0),
            menu_selected: MenuItem::Play,
            name_input: String::new(),
            scores_text: String::new(),
            last_outcome: None,
            pending: None,
            sink,
            last_fast_tick: now,
            last_ambient_tick: now,
            outcome_effect: None,
            effect_time: None,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        result
    }

    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        if self.args.no_menu {
            self.start_session(ModeProfile::easy(), Instant::now());
        }
        loop {
            let frame_start = Instant::now();
            terminal.draw(|frame| {
                ui::draw(
                    frame,
                    self.screen,
                    self.session.as_ref(),
                    &self.theme,
                    self.cursor,
                    self.menu_selected,
                    &self.name_input,
                    &self.scores_text,
                    self.last_outcome,
                    &mut self.outcome_effect,
                    &mut self.effect_time,
                    frame_start,
                );
            })?;

            let timeout = FRAME_INTERVAL.saturating_sub(frame_start.elapsed());
            if event::poll(timeout)? {
                loop {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if !self.on_key(key) {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => self.on_mouse(mouse)?,
                        _ => {}
                    }
                    if !event::poll(Duration::ZERO)? {
                        break;
                    }
                }
            }
            self.advance_time(Instant::now());
        }
    }

    /// Run the fast (~60 Hz) and ambient (1 Hz) triggers up to `now`. Only
    /// the playing screen ticks; breaks and overlays pause the round.
    fn advance_time(&mut self, now: Instant) {
        if self.screen != Screen::Playing {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if now.duration_since(self.last_fast_tick) > TICK_CATCHUP_LIMIT {
            self.last_fast_tick = now - FAST_TICK_INTERVAL;
            self.last_ambient_tick = now;
        }
        let mut events = Vec::new();
        while now.duration_since(self.last_fast_tick) >= FAST_TICK_INTERVAL {
            self.last_fast_tick += FAST_TICK_INTERVAL;
            events.extend(session.engine.fast_tick(now));
            if session.engine.finished().is_some() {
                break;
            }
        }
        if session.engine.profile().mutates
            && now.duration_since(self.last_ambient_tick) >= AMBIENT_INTERVAL
        {
            self.last_ambient_tick = now;
            events.extend(session.engine.ambient_tick(now));
        }
        self.process_events(&events, now);
    }

    /// The engine reports everything it did; the app only routes outcomes.
    /// Tile and clock changes are picked up from engine state on redraw.
    fn process_events(&mut self, events: &[EngineEvent], now: Instant) {
        for event in events {
            if let EngineEvent::Outcome(outcome) = event {
                self.on_outcome(*outcome, now);
            }
        }
    }

    fn on_outcome(&mut self, outcome: RoundOutcome, now: Instant) {
        self.last_outcome = Some(outcome);
        let mode = self.session.as_ref().map(|s| s.engine.profile().mode);
        match (mode, outcome) {
            (_, RoundOutcome::Advance(round)) => {
                log::info!("round {round} up next");
                self.screen = Screen::RoundBreak;
            }
            (Some(Mode::Easy), RoundOutcome::Win) => {
                log::info!("easy rounds cleared, handing off to survival");
                self.screen = Screen::Handoff;
            }
            (Some(Mode::Hard), outcome) => {
                if let Some(session) = self.session.as_ref() {
                    self.pending = Some((
                        outcome,
                        session.engine.white_clicked(),
                        session.engine.seconds_survived(now),
                    ));
                }
                self.name_input = self.args.name.clone().unwrap_or_default();
                self.screen = Screen::NameEntry;
            }
            _ => self.enter_game_over(),
        }
    }

    fn start_session(&mut self, profile: ModeProfile, now: Instant) {
        match RoundEngine::new(profile, SmallRng::from_os_rng(), now) {
            Ok(engine) => {
                self.session = Some(Session { engine });
                self.cursor = (0, 0);
                self.last_outcome = None;
                self.pending = None;
                self.outcome_effect = None;
                self.effect_time = None;
                self.last_fast_tick = now;
                self.last_ambient_tick = now;
                self.screen = Screen::Playing;
            }
            Err(err) => {
                log::error!("could not start round: {err}");
                self.session = None;
                self.screen = Screen::Menu;
            }
        }
    }

    /// Returns false when the app should exit.
    fn on_key(&mut self, key: KeyEvent) -> bool {
        // Name entry consumes raw characters before the action mapping.
        if self.screen == Screen::NameEntry {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.submit_score(),
                KeyCode::Backspace => {
                    self.name_input.pop();
                }
                KeyCode::Char(c)
                    if !key.modifiers.contains(KeyModifiers::CONTROL)
                        && self.name_input.chars().count() < MAX_NAME_LEN =>
                {
                    self.name_input.push(c);
                }
                _ => {}
            }
            return true;
        }

        let action = key_to_action(key);
        let now = Instant::now();
        match self.screen {
            Screen::Menu => match action {
                Action::Up | Action::Left => self.menu_selected = self.menu_selected.prev(),
                Action::Down | Action::Right => self.menu_selected = self.menu_selected.next(),
                Action::Click => match self.menu_selected {
                    MenuItem::Play => self.start_session(ModeProfile::easy(), now),
                    MenuItem::Scores => self.open_scores(),
                    MenuItem::Quit => return false,
                },
                Action::Quit | Action::Back => return false,
                Action::None => {}
            },
            Screen::Scores => match action {
                Action::Quit => return false,
                _ => self.screen = Screen::Menu,
            },
            Screen::Playing => match action {
                Action::Up => self.move_cursor(0, -1),
                Action::Down => self.move_cursor(0, 1),
                Action::Left => self.move_cursor(-1, 0),
                Action::Right => self.move_cursor(1, 0),
                Action::Click => self.click_cell(self.cursor, now),
                Action::Back => self.back_to_menu(),
                Action::Quit => return false,
                Action::None => {}
            },
            Screen::RoundBreak => match action {
                Action::Quit => return false,
                Action::Back => self.back_to_menu(),
                _ => self.resume_play(now),
            },
            Screen::Handoff => match action {
                Action::Quit => return false,
                Action::Back => self.back_to_menu(),
                _ => self.start_session(ModeProfile::hard(), now),
            },
            Screen::GameOver => match action {
                Action::Quit => return false,
                _ => self.back_to_menu(),
            },
            Screen::NameEntry => unreachable!("handled above"),
        }
        true
    }

    fn on_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        if self.screen != Screen::Playing
            || !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left))
        {
            return Ok(());
        }
        let Some(size) = self.session.as_ref().map(|s| s.engine.grid().size()) else {
            return Ok(());
        };
        let (cols, rows) = crossterm::terminal::size()?;
        let area = Rect::new(0, 0, cols, rows);
        if let Some(cell) = ui::grid_cell_at(area, size, mouse.column, mouse.row) {
            self.cursor = cell;
            self.click_cell(cell, Instant::now());
        }
        Ok(())
    }

    fn move_cursor(&mut self, dx: isize, dy: isize) {
        let Some(size) = self.session.as_ref().map(|s| s.engine.grid().size()) else {
            return;
        };
        let (x, y) = self.cursor;
        let nx = x.saturating_add_signed(dx).min(size - 1);
        let ny = y.saturating_add_signed(dy).min(size - 1);
        self.cursor = (nx, ny);
    }

    fn click_cell(&mut self, (x, y): (usize, usize), now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.engine.handle_click(x, y, now) {
            Ok(events) => self.process_events(&events, now),
            Err(err) => {
                // Clicks only come from the cursor and the hit-test, so a
                // rejected one means the presentation lost sync; bail out of
                // the round rather than play on against a stale board.
                log::error!("click rejected: {err}");
                self.back_to_menu();
            }
        }
    }

    /// Leave a round break; the clock did not run during the pause, so the
    /// tick schedule restarts at `now`.
    fn resume_play(&mut self, now: Instant) {
        self.last_fast_tick = now;
        self.last_ambient_tick = now;
        self.screen = Screen::Playing;
    }

    fn submit_score(&mut self) {
        if let Some((outcome, whites_clicked, seconds_survived)) = self.pending.take() {
            let trimmed = self.name_input.trim();
            let name = if trimmed.is_empty() {
                "anonymous".to_string()
            } else {
                trimmed.to_string()
            };
            let entry = ScoreEntry {
                outcome,
                whites_clicked,
                seconds_survived,
                name,
            };
            // A lost score never fails the round.
            if let Err(err) = self.sink.record(&entry) {
                log::warn!("could not save score to {:?}: {err:#}", self.sink.path());
            }
        }
        self.enter_game_over();
    }

    fn open_scores(&mut self) {
        self.scores_text = match std::fs::read_to_string(self.sink.path()) {
            Ok(text) if !text.trim().is_empty() => text,
            _ => "No scores yet — survive a hard round first.".to_string(),
        };
        self.screen = Screen::Scores;
    }

    fn enter_game_over(&mut self) {
        self.outcome_effect = None;
        self.effect_time = None;
        self.screen = Screen::GameOver;
    }

    fn back_to_menu(&mut self) {
        self.session = None;
        self.pending = None;
        self.last_outcome = None;
        self.name_input.clear();
        self.screen = Screen::Menu;
    }
}

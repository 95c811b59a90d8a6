mod ui;

use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Local};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, KeyCode,
        KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use waterquest::{
    app_dirs::AppDirs,
    celebration::Celebration,
    config::{Config, ConfigStore, FileConfigStore},
    events::{EngineEvent, EventLog},
    runtime::{self, FixedFrameRate, GameEvent, Runner},
    DifficultyLevel, HitResult, SessionStateMachine, SessionStatus, TargetKind,
};

const FRAME_RATE_MS: u64 = 50;
const FEEDBACK_MS: u64 = 900;
const LOG_ENV: &str = "WATERQUEST_LOG";
const MAX_SPLASHES: usize = 8;

/// clean-water reflex game: tap the jerry cans, dodge the pollutants
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal reflex game. Jerry cans and pollutants pop up at random. \
                  Click the cans before they vanish, avoid the pollutants, and reach \
                  the goal score before the clock runs out."
)]
pub struct Cli {
    /// difficulty to play (defaults to the saved choice)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<DifficultyLevel>,

    /// seed the random streams for a repeatable session
    #[clap(long)]
    seed: Option<u64>,

    /// silence the terminal bell played on hits
    #[clap(short = 'm', long)]
    muted: bool,

    /// skip the menu and start playing immediately
    #[clap(short = 'p', long)]
    play: bool,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,

    /// print the difficulty table and exit
    #[clap(long)]
    list_difficulties: bool,
}

impl Cli {
    /// Layer command-line flags over the stored config
    fn apply(&self, stored: Config) -> Config {
        Config {
            difficulty: self.difficulty.unwrap_or(stored.difficulty),
            seed: self.seed.or(stored.seed),
            muted: self.muted || stored.muted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Menu,
    Playing,
    Results,
}

/// Floating "+10 💧" label near a resolved hit
#[derive(Debug, Clone)]
pub struct Feedback {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub good: bool,
    pub until_ms: u64,
}

impl Feedback {
    fn for_hit(result: &HitResult, x: f64, y: f64, now: u64) -> Self {
        let good = result.kind == Some(TargetKind::Good);
        let mut text = if good {
            format!("+{} 💧", result.score_delta)
        } else {
            format!("{} 💀", result.score_delta)
        };
        if result.time_penalty_seconds > 0 {
            text.push_str(&format!(" -{}s", result.time_penalty_seconds));
        }
        Self {
            text,
            x,
            y,
            good,
            until_ms: now + FEEDBACK_MS,
        }
    }
}

pub struct App {
    pub machine: SessionStateMachine,
    pub events: Arc<Mutex<EventLog>>,
    pub state: AppState,
    pub selected: DifficultyLevel,
    pub muted: bool,
    pub feedback: Vec<Feedback>,
    pub celebration: Celebration,
    pub finished_at: Option<DateTime<Local>>,
    pub viewport: Rect,
    /// Cells of recent good hits; the win celebration bursts from them
    pub splashes: Vec<(u16, u16)>,
    bell_pending: bool,
    /// Set only when the pause came from the terminal losing focus
    focus_paused: bool,
}

impl App {
    pub fn new(config: &Config, viewport: Rect) -> Self {
        let events = Arc::new(Mutex::new(EventLog::new()));
        let mut machine = SessionStateMachine::new()
            .with_sink(events.clone())
            .with_play_area(ui::layout::play_area(ui::layout::field_inner(viewport)));
        if let Some(seed) = config.seed {
            machine = machine.with_seed(seed);
        }

        Self {
            machine,
            events,
            state: AppState::Menu,
            selected: config.difficulty,
            muted: config.muted,
            feedback: Vec::new(),
            celebration: Celebration::new(),
            finished_at: None,
            viewport,
            splashes: Vec::new(),
            bell_pending: false,
            focus_paused: false,
        }
    }

    pub fn start(&mut self) {
        self.feedback.clear();
        self.splashes.clear();
        self.focus_paused = false;
        self.celebration.stop();
        self.finished_at = None;
        self.machine.start_level(self.selected);
        self.state = AppState::Playing;
    }

    pub fn back_to_menu(&mut self) {
        self.machine.reset_to_menu();
        self.feedback.clear();
        self.splashes.clear();
        self.focus_paused = false;
        self.celebration.stop();
        self.drain_events();
        self.state = AppState::Menu;
    }

    pub fn resize(&mut self, viewport: Rect) {
        self.viewport = viewport;
        self.machine
            .set_play_area(ui::layout::play_area(ui::layout::field_inner(viewport)));
    }

    /// Advance the engine to the current time and apply what it reported
    pub fn on_frame(&mut self) {
        self.machine.advance();
        self.drain_events();
        let now = self.machine.now_ms();
        self.feedback.retain(|f| f.until_ms > now);
        self.celebration.update();
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        if self.state != AppState::Playing || mouse.kind != MouseEventKind::Down(MouseButton::Left)
        {
            return;
        }
        if self.machine.is_paused() {
            self.resume();
            return;
        }
        let inner = ui::layout::field_inner(self.viewport);
        let Some((x, y)) = ui::layout::cell_to_point(inner, mouse.column, mouse.row) else {
            return;
        };
        let Some(id) = self.machine.target_at(x, y).map(|t| t.id) else {
            return;
        };
        let now = self.machine.now_ms();
        let result = self.machine.register_hit(id, now);
        if result.applied {
            if result.kind == Some(TargetKind::Good) {
                if self.splashes.len() == MAX_SPLASHES {
                    self.splashes.remove(0);
                }
                self.splashes.push((mouse.column, mouse.row));
            }
            self.feedback.push(Feedback::for_hit(&result, x, y, now));
        }
        self.drain_events();
    }

    /// Returns false when the app should quit
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return true;
        }
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return false;
        }
        if key.code == KeyCode::Char('s') {
            self.muted = !self.muted;
            return true;
        }

        match self.state {
            AppState::Menu => match key.code {
                KeyCode::Left | KeyCode::Up => self.selected = self.selected.previous(),
                KeyCode::Right | KeyCode::Down => self.selected = self.selected.next(),
                KeyCode::Char('1') => self.selected = DifficultyLevel::Easy,
                KeyCode::Char('2') => self.selected = DifficultyLevel::Normal,
                KeyCode::Char('3') => self.selected = DifficultyLevel::Hard,
                KeyCode::Enter | KeyCode::Char(' ') => self.start(),
                _ => {}
            },
            AppState::Playing => {
                if self.machine.is_paused() {
                    self.resume();
                    return true;
                }
                match key.code {
                    KeyCode::Char('p') => self.machine.pause(),
                    KeyCode::Char('e') => {
                        self.machine.end();
                        self.drain_events();
                    }
                    KeyCode::Backspace => self.back_to_menu(),
                    _ => {}
                }
            }
            AppState::Results => match key.code {
                KeyCode::Char('r') | KeyCode::Enter | KeyCode::Char(' ') => self.start(),
                KeyCode::Char('m') | KeyCode::Backspace => self.back_to_menu(),
                _ => {}
            },
        }
        true
    }

    pub fn on_focus_lost(&mut self) {
        if self.state == AppState::Playing && !self.machine.is_paused() {
            self.machine.pause();
            self.focus_paused = self.machine.is_paused();
        }
    }

    /// Only undoes a pause that focus loss caused; a `p` pause stays
    pub fn on_focus_gained(&mut self) {
        if self.focus_paused {
            self.resume();
        }
    }

    fn resume(&mut self) {
        self.focus_paused = false;
        self.machine.resume();
    }

    fn drain_events(&mut self) {
        let events = match self.events.lock() {
            Ok(mut log) => log.drain(),
            Err(_) => return,
        };
        for event in events {
            match event {
                EngineEvent::HitResolved(result) => {
                    if result.applied && !self.muted {
                        self.bell_pending = true;
                    }
                }
                EngineEvent::Ended(verdict) => {
                    self.finished_at = Some(Local::now());
                    self.state = AppState::Results;
                    if verdict.is_win() {
                        self.celebration.start(
                            self.viewport.width,
                            self.viewport.height,
                            &self.splashes,
                        );
                    }
                }
                EngineEvent::Spawned(_) | EngineEvent::Expired(_) | EngineEvent::Ticked(_) => {}
            }
        }
    }

    fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell_pending)
    }
}

/// Log to a file under the state dir; stdout belongs to the TUI
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
    {
        eprintln!("waterquest: logging disabled: {err}");
    }
}

fn print_difficulties() {
    println!(
        "{:<8} {:>8} {:>8} {:>9} {:>5} {:>5} {:>5}",
        "level", "seconds", "spawn", "lifetime", "good", "bad", "goal"
    );
    for level in DifficultyLevel::ALL {
        let p = level.profile();
        println!(
            "{:<8} {:>8} {:>6}ms {:>7}ms {:>5} {:>5} {:>5}",
            level.to_string(),
            p.duration_seconds,
            p.spawn_interval_ms,
            p.object_lifetime_ms,
            p.good_score_delta,
            p.bad_score_delta,
            p.win_score_threshold
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.list_difficulties {
        print_difficulties();
        return Ok(());
    }

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if cli.save_config {
        store.save(&config)?;
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();
    info!(difficulty = %config.difficulty, seed = ?config.seed, "waterquest starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let mut app = App::new(&config, Rect::new(0, 0, size.width, size.height));
    if cli.play {
        app.start();
    }
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen,
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend + io::Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        runtime::terminal_events()?,
        FixedFrameRate::from_millis(FRAME_RATE_MS),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        if app.take_bell() {
            execute!(terminal.backend_mut(), Print("\x07"))?;
        }

        match runner.step() {
            GameEvent::Tick => app.on_frame(),
            GameEvent::Resize(w, h) => app.resize(Rect::new(0, 0, w, h)),
            GameEvent::Mouse(mouse) => app.on_mouse(mouse),
            GameEvent::FocusLost => app.on_focus_lost(),
            GameEvent::FocusGained => app.on_focus_gained(),
            GameEvent::Key(key) => {
                if !app.on_key(key) {
                    break;
                }
            }
        }
    }

    if app.machine.status() == SessionStatus::Running {
        app.machine.end();
    }
    Ok(())
}

use std::error::Error;
use std::fs;
use std::io::{self, stdin};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use angler::{
    assets::AssetCache,
    config::{DataPaths, FileSettingsStore, SettingsStore},
    menu::MainMenuScreen,
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    screen::{ScreenContext, ScreenManager},
    stats::FileStatsStore,
};

/// terminal inhibition trainer with a day/night recognition mini-game
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal trainer: catch the announced fish with the announced key before it escapes, test your attention on the number grid, and track your progress on the statistics dashboard."
)]
pub struct Cli {
    /// directory holding config/, stats/ and the session log
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// directory holding image/, sound/ and music/ assets
    #[clap(long, default_value = "assets")]
    assets_dir: PathBuf,

    /// override the configured frame rate
    #[clap(long)]
    fps: Option<u32>,
}

fn init_logging(paths: &DataPaths) {
    let path = paths.log_file();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match fs::OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            let _ = tracing_subscriber::fmt()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
        }
        Err(_) => {
            // No log file, no logging; the TUI owns stdout/stderr
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let paths = cli
        .data_dir
        .clone()
        .map(DataPaths::new)
        .unwrap_or_else(DataPaths::default_root);
    init_logging(&paths);

    let mut settings = FileSettingsStore::new(&paths).load();
    if let Some(fps) = cli.fps {
        settings.fps = fps;
    }
    tracing::info!(
        "starting {}x{} @{}fps, data at {:?}",
        settings.screen_w,
        settings.screen_h,
        settings.fps,
        paths.root()
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let stats = FileStatsStore::new(&paths);
    let ctx = ScreenContext::new(
        settings.clone(),
        paths,
        AssetCache::new(&cli.assets_dir),
        Box::new(stats),
    );
    let mut manager = ScreenManager::new(ctx);
    manager.push(MainMenuScreen::new());

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::from_fps(settings.fps),
    );
    let result = run_loop(&mut terminal, &mut manager, &runner);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Pump events into the manager at the configured tick rate: buffered
/// input is handed over on every tick together with the measured dt,
/// then the top screen is drawn.
fn run_loop<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    manager: &mut ScreenManager,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    let mut pending: Vec<AppEvent> = Vec::new();
    let mut last_tick = Instant::now();

    terminal.draw(|f| manager.render(f))?;

    while manager.is_running() {
        match runner.step() {
            AppEvent::Tick => {
                let dt = last_tick.elapsed().as_secs_f64();
                last_tick = Instant::now();

                let events: Vec<AppEvent> = pending.drain(..).collect();
                manager.handle_events(&events);
                manager.update(dt);

                if manager.is_running() {
                    terminal.draw(|f| manager.render(f))?;
                }
            }
            event => pending.push(event),
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
  },
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use reel::app::App;
use reel::catalog::Catalog;
use reel::config::Config;
use reel::input::{handle_key_event, handle_mouse_event};
use reel::navigation::Route;
use reel::ui;
use reel::watchlist::{FileStore, KeyValueStore, MemoryStore};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Catalog file (RON list of videos); the built-in catalog when omitted
  #[arg(short, long)]
  catalog: Option<PathBuf>,

  /// Screen to open on start
  #[arg(short, long, default_value = "home")]
  start: StartScreen,

  /// Play sound only, without opening a video window
  #[arg(short, long)]
  audio_only: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum StartScreen {
  Home,
  Discover,
  Saved,
}

impl From<StartScreen> for Route {
  fn from(screen: StartScreen) -> Self {
    match screen {
      StartScreen::Home => Route::Home,
      StartScreen::Discover => Route::Discover,
      StartScreen::Saved => Route::MyList,
    }
  }
}

/// Longest the loop blocks on input when no feed timer is pending.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// --- Logging ---

/// Log to a daily file in the data dir. The terminal belongs to the UI.
fn init_tracing() -> Option<WorkerGuard> {
  let proj_dirs = ProjectDirs::from("", "", "reel")?;
  let logs_dir = proj_dirs.data_dir().join("logs");
  std::fs::create_dir_all(&logs_dir).ok()?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, "reel.log"));
  let filter = EnvFilter::try_from_env("REEL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
    .try_init()
    .ok()?;
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let _guard = init_tracing();

  let catalog = match &args.catalog {
    Some(path) => Catalog::load(path).with_context(|| format!("Failed to load catalog {}", path.display()))?,
    None => Catalog::builtin().context("Built-in catalog is invalid")?,
  };
  let store: Box<dyn KeyValueStore> = match FileStore::default_location() {
    Some(store) => Box::new(store),
    None => {
      warn!("no data directory, watch list will not persist");
      Box::new(MemoryStore::default())
    }
  };
  let config = Config::load();
  let audio_only = args.audio_only || config.audio_only.unwrap_or(false);
  info!(videos = catalog.len(), audio_only, "starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  execute!(std::io::stdout(), EnableMouseCapture).context("Failed to enable mouse capture")?;
  let app = App::new(catalog, store, config, args.start.into(), audio_only);
  let result = run(&mut terminal, app);
  let _ = execute!(std::io::stdout(), DisableMouseCapture);
  ratatui::restore();
  result
}

fn run(terminal: &mut DefaultTerminal, mut app: App) -> Result<()> {
  loop {
    app.check_pending();
    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    let timeout = app.time_until_next().map_or(POLL_INTERVAL, |due| due.min(POLL_INTERVAL));
    if event::poll(timeout)? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key_event(&mut app, key),
        Event::Mouse(mouse) => handle_mouse_event(&mut app, mouse),
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }
  app.shutdown();
  info!("bye");
  Ok(())
}

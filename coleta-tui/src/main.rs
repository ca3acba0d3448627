//! Terminal UI for coleta that looks up waste collection schedules by address or coordinates.

mod app;
mod input;
mod ui;

use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration as StdDuration,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use coleta_core::{
    CollectionConfig, ColetaService, FileZoneSource, GeocodeMatcher, ZoneSource, ZoneStore,
};
use coleta_provider_nominatim::{HttpZoneSource, NominatimGeocoder};

use crate::app::App;
use crate::input::Action;

#[derive(Parser, Debug)]
#[command(name = "coleta")]
#[command(about = "Look up municipal waste collection schedules by address")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Zone `GeoJSON` path or URL, overriding the configuration
    #[arg(short, long)]
    dataset: Option<String>,

    /// File receiving log output
    #[arg(long, default_value = "coleta.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_file)?;

    let mut config = match &args.config {
        Some(path) => CollectionConfig::load_from_file(path)?,
        None => CollectionConfig::default(),
    };
    if let Some(dataset) = args.dataset {
        config.dataset.source = dataset;
    }

    // HTTP + service setup
    let client = Client::builder()
        .user_agent(config.geocoder.user_agent.as_str())
        .build()?;

    let source: Arc<dyn ZoneSource> = if config.dataset.is_remote() {
        Arc::new(HttpZoneSource::new(client.clone(), &config.dataset.source))
    } else {
        Arc::new(FileZoneSource::new(&config.dataset.source))
    };
    let store = Arc::new(ZoneStore::new(source, config.dataset.projection()?));

    let geocoder = Arc::new(NominatimGeocoder::new(client, &config.geocoder.base_url));
    let min_query_chars = config.geocoder.min_query_chars;
    let matcher = GeocodeMatcher::new(geocoder, config.geocoder);
    let service = Arc::new(ColetaService::new(store, matcher, config.schedule));

    info!(dataset = %config.dataset.source, "coleta starting");

    // Build the dataset while the user types
    let warm = Arc::clone(&service);
    tokio::spawn(async move {
        warm.warm_up().await;
    });

    let app = App::new(service, config.search.debounce(), min_query_chars);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        app.poll_background();
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            match input::handle_key_event(key, &mut app) {
                Action::Quit => break,
                Action::None => {}
                Action::InputChanged => app.on_input_changed(),
                Action::Submit => app.submit(),
            }
        }
    }

    Ok(())
}

fn init_tracing(log_file: &Path) -> Result<()> {
    let file = File::create(log_file)
        .with_context(|| format!("cannot create log file {}", log_file.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

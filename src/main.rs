use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::EnableBracketedPaste,
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use pdfask::event_source::KeyboardEventSource;
use pdfask::panic_handler;
use pdfask::settings;
use pdfask::{App, run_app_with_event_source};

/// Page through a PDF and ask questions about it
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// PDF to open at startup
    file: Option<PathBuf>,

    /// Question answering endpoint, overrides the config file
    #[arg(long)]
    endpoint: Option<String>,

    /// Seconds to wait for an answer (0 waits forever)
    #[arg(long)]
    timeout: Option<u64>,

    #[arg(long, default_value = "pdfask.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    WriteLogger::init(
        if args.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("Failed to create log file {}", args.log_file.display()))?,
    )?;

    info!("Starting pdfask");

    settings::load_settings();
    let mut config = settings::current();
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(secs) = args.timeout {
        config.request_timeout_secs = Some(secs);
    }

    let mut app = App::with_settings(&config)?;
    if let Some(path) = &args.file {
        app.open_path(path);
    }

    panic_handler::initialize_panic_handler();

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut events = KeyboardEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut events);

    panic_handler::restore_terminal();

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down pdfask");
    Ok(())
}

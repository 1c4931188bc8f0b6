//! Terminal admin for a product catalog: a sortable, paginated, selectable
//! products table and an add-product form with validation.
//!
//! Run with `--data catalog.json` to manage a catalog file; without it a
//! built-in sample catalog is shown and deletions stay in memory.

mod app;
mod config;
mod core;
mod ui;

use std::fs::OpenOptions;
use std::io::stderr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    handler,
    state::AppState,
};
use crate::config::AppConfig;
use crate::core::{
    image::{self, ImageError},
    product::{self, CatalogDeleter},
    submit::{JsonLinesSubmitter, LogSubmitter, SubmitHandler},
};

/// Longest side of a decoded preview, in pixels.
const THUMBNAIL_SIDE: u32 = 96;

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Product catalog admin")]
struct Cli {
    /// Product catalog (JSON array).  Deleting rows rewrites this file.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Directory the image picker lists files from.
    #[arg(long, default_value = ".")]
    images: PathBuf,

    /// Append submitted products to this JSON Lines file.
    #[arg(long)]
    submit_log: Option<PathBuf>,

    /// Write diagnostics to this file (turns diagnostics on).
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Rows per page for this session.
    #[arg(long)]
    page_size: Option<usize>,
}

// ───────────────────────────────────────── diagnostics ───────

/// Install the tracing subscriber, writing to `path`.  Nothing is
/// installed when diagnostics are off, so the terminal is never touched.
fn init_diagnostics(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ───────────────────────────────────────── event loop ────────

type ThumbnailResult = (PathBuf, Result<::image::RgbaImage, ImageError>);

fn spawn_thumbnail_jobs(state: &mut AppState, tx: &mpsc::UnboundedSender<ThumbnailResult>) {
    for path in std::mem::take(&mut state.pending_thumbnails) {
        if state.thumbnails.contains_key(&path) {
            continue;
        }
        let tx = tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = image::load_thumbnail(&path, THUMBNAIL_SIDE);
            let _ = tx.send((path, result));
        });
    }
}

fn apply_thumbnail(state: &mut AppState, (path, result): ThumbnailResult) {
    // The image may have been detached or replaced while decoding.
    let wanted = state
        .form
        .draft
        .images()
        .values()
        .any(|img| img.path == path);
    match result {
        Ok(thumb) if wanted => {
            state.thumbnails.insert(path, Arc::new(thumb));
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "preview failed"),
    }
}

async fn run<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    state: &mut AppState,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let mut events = spawn_event_reader(Duration::from_millis(100));
    let (thumb_tx, mut thumb_rx) = mpsc::unbounded_channel::<ThumbnailResult>();

    loop {
        terminal.draw(|frame| ui::render(frame, state))?;

        spawn_thumbnail_jobs(state, &thumb_tx);

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                match event {
                    AppEvent::Key(k) => handler::handle_key(state, k),
                    AppEvent::Mouse(m) => handler::handle_mouse(state, m),
                    AppEvent::Paste(text) => handler::handle_paste(state, &text),
                    AppEvent::Resize(_, _) | AppEvent::Tick => {}
                }
            }

            Some(result) = thumb_rx.recv() => {
                apply_thumbnail(state, result);
                while let Ok(more) = thumb_rx.try_recv() {
                    apply_thumbnail(state, more);
                }
            }
        }

        if state.should_quit {
            return Ok(());
        }
    }
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_file = config::config_path();
    let user_config = AppConfig::load_from(&config_file);
    if cli.log_file.is_some() || user_config.diagnostics {
        let path = cli.log_file.clone().unwrap_or_else(config::default_log_path);
        init_diagnostics(&path)?;
    }

    let (products, deleter) = match &cli.data {
        Some(path) => (
            product::load_catalog(path)
                .with_context(|| format!("loading catalog {}", path.display()))?,
            CatalogDeleter::new(Some(path.clone())),
        ),
        None => (product::sample_catalog(), CatalogDeleter::new(None)),
    };
    let submitter: Box<dyn SubmitHandler> = match cli.submit_log {
        Some(path) => Box::new(JsonLinesSubmitter::new(path)),
        None => Box::new(LogSubmitter),
    };
    info!(rows = products.len(), "starting");

    let mut state = AppState::new(products, user_config, deleter, submitter);
    state.config_path = Some(config_file);
    state.image_root = cli.images;
    if let Some(n) = cli.page_size {
        state.set_session_page_size(n);
    }

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    execute!(
        stderr(),
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stderr()))?;

    let result = run(&mut terminal, &mut state).await;

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    result
}

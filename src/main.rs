//! A ring-bound notebook in the terminal.
//!
//! Every image or video under a folder becomes a sheet bound at a spiral
//! spine.  Scroll, drag, or key through the pages and watch them flip over
//! the rings; sub-folders become coloured chapter tabs.

mod app;
mod config;
mod core;
mod ui;

use std::fs::File;
use std::io::{self, stderr};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    widgets::{Block, Borders},
    Terminal,
};
use tracing::info;

use crate::app::{
    event::{spawn_event_reader, AppEvent, FRAME_INTERVAL},
    handler,
    state::{ActiveView, AppState},
    thumb_runtime::{self, ThumbUpdate},
};
use crate::core::input::DeviceClass;
use crate::core::transform::PageClass;
use crate::ui::{
    focus::FocusOverlay,
    layout::AppLayout,
    notebook::NotebookWidget,
    popup,
    spinner::DecodeIndicator,
    status::StatusBar,
    tabs::{ChapterTabs, TabState},
    theme::Theme,
};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Ring-bound notebook page-flip viewer")]
struct Cli {
    /// Folder of pages to open (defaults to `.`).
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Wrap around from the last page to the first (this session only).
    #[arg(long = "loop")]
    loop_mode: bool,

    /// Use touch-pad momentum tuning.
    #[arg(long)]
    touch: bool,

    /// Page to open on (1-based).
    #[arg(long, default_value_t = 1)]
    start_page: i64,

    /// Rotation of a fully flipped page, in degrees (180-270).
    #[arg(long)]
    max_angle: Option<f64>,

    /// Include hidden (dot) files.
    #[arg(long)]
    hidden: bool,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log: Option<PathBuf>,
}

fn init_tracing(log: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    match log {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr) // never pollute stdout
                .init();
        }
    }
    Ok(())
}

/// Per-chapter tab highlighting for the current snapshot.
fn tab_states(state: &AppState) -> Vec<TabState> {
    let current_chapter = state
        .portfolio
        .pages
        .get(state.current_page())
        .map(|p| p.chapter);
    (0..state.portfolio.chapters.len())
        .map(|i| {
            let range = state.portfolio.chapter_range(i);
            let read = match (state.snapshot, range.end.checked_sub(1)) {
                (Some(snapshot), Some(last)) if !range.is_empty() => {
                    state.pipeline.classify(last, &snapshot) == PageClass::Read
                }
                _ => false,
            };
            TabState {
                active: current_chapter == Some(i),
                read,
            }
        })
        .collect()
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log.as_ref())?;

    // ── load pages ────────────────────────────────────────────
    let root = cli
        .path
        .canonicalize()
        .with_context(|| format!("opening {}", cli.path.display()))?;
    let load_config = core::content::LoadConfig {
        show_hidden: cli.hidden,
        ..Default::default()
    };
    let portfolio = core::content::load_portfolio(&root, &load_config)?;
    info!(
        pages = portfolio.len(),
        chapters = portfolio.chapters.len(),
        root = %root.display(),
        "portfolio loaded"
    );

    let mut user_config = config::AppConfig::load();
    if cli.loop_mode {
        user_config.flip.loop_mode = true;
    }
    if cli.touch {
        user_config.flip.device = DeviceClass::Touch;
    }
    if let Some(angle) = cli.max_angle {
        user_config.flip.max_angle = angle.clamp(180.0, 270.0);
    }
    let start_page = cli.start_page.saturating_sub(1);
    let mut state = AppState::new(portfolio, user_config, start_page, Instant::now())?;

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    // ── async channels ────────────────────────────────────────
    let mut events = spawn_event_reader(FRAME_INTERVAL);
    let (thumb_tx, mut thumb_rx) = tokio::sync::mpsc::unbounded_channel::<ThumbUpdate>();

    // ── event loop ────────────────────────────────────────────
    loop {
        state.engine.tick(Instant::now());
        state.sync_scene();

        let size = terminal.size()?;
        let layout = AppLayout::from_area(Rect::new(0, 0, size.width, size.height));
        let book_block = Block::default()
            .title(format!(" {} ", state.portfolio.root.display()))
            .title_style(Theme::title_style())
            .borders(Borders::ALL)
            .border_style(Theme::border_style());
        let book_inner = book_block.inner(layout.notebook_area);
        thumb_runtime::ensure_resolution(&mut state, book_inner);
        thumb_runtime::request_visible(&mut state, &thumb_tx);

        let tabs = tab_states(&state);
        terminal.draw(|frame| {
            state.tab_hits = ChapterTabs {
                chapters: &state.portfolio.chapters,
                states: &tabs,
            }
            .render_and_hit(layout.tabs_area, frame.buffer_mut());

            frame.render_widget(book_block, layout.notebook_area);
            frame.render_widget(
                NotebookWidget {
                    scene: &state.scene,
                    portfolio: &state.portfolio,
                    thumbs: &state.thumbs,
                    transform: state.pipeline.transform(),
                },
                book_inner,
            );
            frame.render_widget(
                DecodeIndicator {
                    pending: state.thumb_pending.len(),
                    tick: state.tick_count,
                },
                book_inner,
            );
            frame.render_widget(StatusBar { state: &state }, layout.status_area);

            match state.active_view {
                ActiveView::SettingsMenu => {
                    frame.render_widget(
                        popup::SettingsPopup {
                            state: &state,
                            selected: state.settings_selected,
                        },
                        frame.area(),
                    );
                }
                ActiveView::ControlsSubmenu => {
                    frame.render_widget(
                        popup::ControlsPopup {
                            config: &state.config,
                            selected: state.controls_selected,
                            awaiting_rebind: state.awaiting_rebind,
                        },
                        frame.area(),
                    );
                }
                ActiveView::Focus => {
                    let area = frame.area();
                    state.focus_hits = Some(
                        FocusOverlay {
                            portfolio: &state.portfolio,
                            page: state.current_page(),
                            looping: state.engine.mapper().is_active(state.portfolio.len()),
                            thumbs: &state.thumbs,
                        }
                        .render_and_hit(area, frame.buffer_mut()),
                    );
                }
                ActiveView::Notebook => {}
            }
        })?;

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                match event {
                    AppEvent::Key(k) => handler::handle_key(&mut state, k, Instant::now()),
                    AppEvent::Mouse(m) => handler::handle_mouse(&mut state, m, Instant::now()),
                    AppEvent::Resize(_, _) => {}
                    AppEvent::Tick => state.tick_count = state.tick_count.wrapping_add(1),
                }
            }

            Some(update) = thumb_rx.recv() => {
                // Batch-drain whatever else is ready before redrawing.
                thumb_runtime::apply_update(&mut state, update);
                while let Ok(update) = thumb_rx.try_recv() {
                    thumb_runtime::apply_update(&mut state, update);
                }
            }
        }

        if state.should_quit {
            break;
        }
    }

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}

//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).
//! The engine never talks to the terminal directly: it pushes snapshots into
//! a shared cell, and the frame loop feeds them through the render pipeline.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use ratatui::layout::Rect;
use tracing::warn;

use crate::config::AppConfig;
use crate::core::{
    content::Portfolio,
    engine::{ScrollEngine, ScrollSnapshot},
    input::InputScaling,
    render::RenderPipeline,
};
use crate::ui::focus::FocusHitZones;
use crate::ui::notebook::NotebookScene;

/// Which view / overlay is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Notebook,
    /// Full-size view of the current page; flip input is paused.
    Focus,
    SettingsMenu,
    ControlsSubmenu,
}

/// Top-level application state.
pub struct AppState {
    pub portfolio: Portfolio,
    pub engine: ScrollEngine,
    pub pipeline: RenderPipeline,
    /// Per-page visuals written by the pipeline, read by the notebook widget.
    pub scene: NotebookScene,
    /// Latest snapshot pushed by the engine observer and not yet rendered.
    pub pending: Rc<Cell<Option<ScrollSnapshot>>>,
    /// Snapshot the scene currently reflects.
    pub snapshot: Option<ScrollSnapshot>,
    pub scaling: InputScaling,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    /// Which view / overlay is currently shown.
    pub active_view: ActiveView,
    /// Keybindings and flip settings.
    pub config: AppConfig,
    /// Where `config` is saved.
    pub config_path: PathBuf,
    /// Currently highlighted item in the settings menu.
    pub settings_selected: usize,
    /// Currently highlighted item in the controls submenu.
    pub controls_selected: usize,
    /// When `true`, the controls submenu is waiting for the user to press
    /// a key to rebind the action at `controls_selected`.
    pub awaiting_rebind: bool,
    /// Decoded, downscaled page images.
    pub thumbs: HashMap<PathBuf, Arc<image::RgbaImage>>,
    /// Thumbnails decoded at the current generation.
    pub thumb_fresh: HashSet<PathBuf>,
    /// Decodes in flight.
    pub thumb_pending: HashSet<PathBuf>,
    /// Files that failed to decode; never retried this session.
    pub thumb_failed: HashSet<PathBuf>,
    /// Monotonic generation id used to ignore stale decode results.
    pub thumb_generation: u64,
    /// Longest edge thumbnails are decoded at.
    pub thumb_max_dim: u32,
    /// Row of the last left-drag sample.
    pub drag_row: Option<u16>,
    /// Chapter tab hit zones from the last draw.
    pub tab_hits: Vec<(Rect, usize)>,
    /// Focus overlay hit zones from the last draw.
    pub focus_hits: Option<FocusHitZones>,
    /// Frame counter for the decode spinner.
    pub tick_count: u64,
}

impl AppState {
    pub fn new(
        portfolio: Portfolio,
        config: AppConfig,
        start_page: i64,
        now: Instant,
    ) -> anyhow::Result<Self> {
        let flip = config.flip.flip_config();
        let mut engine = ScrollEngine::new(flip.clone()).context("invalid flip settings")?;

        let pending = Rc::new(Cell::new(None));
        let sink = Rc::clone(&pending);
        engine.subscribe(Box::new(move |snapshot: &ScrollSnapshot| {
            sink.set(Some(*snapshot));
        }));
        engine
            .set_total_pages(portfolio.len(), now)
            .context("starting the scroll engine")?;
        engine.set_position(start_page)?;

        Ok(Self {
            pipeline: RenderPipeline::new(flip.transform.clone(), flip.loop_mode),
            scene: NotebookScene::new(),
            pending,
            snapshot: None,
            scaling: InputScaling::for_device(config.flip.device),
            portfolio,
            engine,
            should_quit: false,
            status_message: None,
            active_view: ActiveView::default(),
            config,
            config_path: crate::config::config_path(),
            settings_selected: 0,
            controls_selected: 0,
            awaiting_rebind: false,
            thumbs: HashMap::new(),
            thumb_fresh: HashSet::new(),
            thumb_pending: HashSet::new(),
            thumb_failed: HashSet::new(),
            thumb_generation: 0,
            thumb_max_dim: 0,
            drag_row: None,
            tab_hits: Vec::new(),
            focus_hits: None,
            tick_count: 0,
        })
    }

    /// Feed the newest engine snapshot (if any) through the pipeline.
    /// Returns whether the scene changed.
    pub fn sync_scene(&mut self) -> bool {
        let Some(snapshot) = self.pending.take() else {
            return false;
        };
        self.pipeline.render(&snapshot, &mut self.scene);
        self.snapshot = Some(snapshot);
        true
    }

    /// Push the persisted flip settings into the engine and pipeline after a
    /// settings change.
    pub fn apply_flip_settings(&mut self, now: Instant) {
        let flip = self.config.flip.flip_config();
        if let Err(err) = self.engine.reconfigure(flip.clone()) {
            warn!(%err, "rejected flip settings");
            self.status_message = Some(format!("Invalid setting: {err}"));
            return;
        }
        self.engine.set_loop_mode(flip.loop_mode, now);
        self.pipeline.set_transform(flip.transform);
        self.pipeline.set_loop_mode(flip.loop_mode);
        self.scaling = InputScaling::for_device(self.config.flip.device);
        // Force a full re-render even if the position did not move.
        if let Ok(snapshot) = self.engine.snapshot() {
            self.pending.set(Some(snapshot));
        }
    }

    /// Persist the config, reporting failures in the status bar.
    pub fn save_config(&mut self) {
        if let Err(err) = self.config.save_to(&self.config_path) {
            warn!(error = %err, "failed to save config");
            self.status_message = Some(format!("Could not save config: {err:#}"));
        }
    }

    /// Index of the page currently on top of the unread pile.
    pub fn current_page(&self) -> usize {
        self.snapshot.map_or(0, |s| s.page)
    }
}

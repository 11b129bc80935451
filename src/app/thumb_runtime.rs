//! Background image decoding so page images never block a frame.
//!
//! Only pages near the current one are decoded.  Every result carries the
//! generation it was requested under; results from an older generation
//! (the terminal grew and thumbnails need more pixels) are dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::state::AppState;
use crate::core::content::MediaKind;
use crate::core::looping::actual_index;

/// Decode threads allowed at once.
pub const MAX_IN_FLIGHT: usize = 4;

pub struct ThumbUpdate {
    pub generation: u64,
    pub path: PathBuf,
    pub result: anyhow::Result<Arc<image::RgbaImage>>,
}

pub fn spawn_decode(
    tx: mpsc::UnboundedSender<ThumbUpdate>,
    generation: u64,
    path: PathBuf,
    max_dim: u32,
) {
    std::thread::spawn(move || {
        let result = decode(&path, max_dim).map(Arc::new);
        let _ = tx.send(ThumbUpdate {
            generation,
            path,
            result,
        });
    });
}

/// Decode `path` and shrink it so neither edge exceeds `max_dim`.
pub fn decode(path: &Path, max_dim: u32) -> anyhow::Result<image::RgbaImage> {
    let img = image::open(path).with_context(|| format!("decoding {}", path.display()))?;
    let img = if img.width() > max_dim || img.height() > max_dim {
        img.thumbnail(max_dim, max_dim)
    } else {
        img
    };
    Ok(img.to_rgba8())
}

/// Longest edge a thumbnail needs to fill `area` with half-block cells
/// (one pixel per column, two per row), rounded up to a multiple of 64.
pub fn needed_dim(area: Rect) -> u32 {
    let px = u32::from(area.width).max(u32::from(area.height) * 2);
    px.div_ceil(64).max(1) * 64
}

/// Raise the decode resolution when the drawing area grew.  Existing
/// thumbnails stay on screen until their sharper replacements arrive.
pub fn ensure_resolution(state: &mut AppState, area: Rect) {
    let dim = needed_dim(area);
    if dim <= state.thumb_max_dim {
        return;
    }
    debug!(from = state.thumb_max_dim, to = dim, "thumbnail resolution raised");
    state.thumb_max_dim = dim;
    state.thumb_generation += 1;
    state.thumb_fresh.clear();
    state.thumb_pending.clear();
}

/// Queue decodes for image pages around the current one, nearest first.
pub fn request_visible(state: &mut AppState, tx: &mpsc::UnboundedSender<ThumbUpdate>) {
    let Some(snapshot) = state.snapshot else {
        return;
    };
    if state.thumb_max_dim == 0 {
        return;
    }
    let total = snapshot.total_pages;
    let looping = state.engine.mapper().is_active(total);
    let radius = state.pipeline.transform().visible_depth as i64 + 1;
    let current = snapshot.page as i64;

    let mut order = vec![current];
    for d in 1..=radius {
        order.push(current + d);
        order.push(current - d);
    }

    for virtual_page in order {
        if state.thumb_pending.len() >= MAX_IN_FLIGHT {
            break;
        }
        let page = if looping {
            actual_index(virtual_page, total)
        } else if (0..total as i64).contains(&virtual_page) {
            virtual_page as usize
        } else {
            continue;
        };
        let Some(entry) = state.portfolio.pages.get(page) else {
            continue;
        };
        if entry.kind != MediaKind::Image {
            continue;
        }
        let path = &entry.path;
        if state.thumb_fresh.contains(path)
            || state.thumb_pending.contains(path)
            || state.thumb_failed.contains(path)
        {
            continue;
        }
        state.thumb_pending.insert(path.clone());
        spawn_decode(
            tx.clone(),
            state.thumb_generation,
            path.clone(),
            state.thumb_max_dim,
        );
    }
}

/// Store a finished decode.  Returns whether anything visible changed.
pub fn apply_update(state: &mut AppState, update: ThumbUpdate) -> bool {
    if update.generation != state.thumb_generation {
        return false;
    }
    state.thumb_pending.remove(&update.path);
    match update.result {
        Ok(img) => {
            state.thumb_fresh.insert(update.path.clone());
            state.thumbs.insert(update.path, img);
            true
        }
        Err(err) => {
            warn!(path = %update.path.display(), error = %err, "image decode failed");
            state.thumb_failed.insert(update.path);
            false
        }
    }
}

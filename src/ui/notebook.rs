//! The notebook: a retained scene the render pipeline writes into, and the
//! widget that draws it.
//!
//! Sheets hang below a ring spine.  A flip rotates a sheet about the spine:
//! its projected height is `H·|cos θ|`, below the spine while `cos θ ≥ 0`
//! and folded over above it afterwards.  Depth narrows a sheet through a
//! perspective factor, and each pile staggers its sheets by a row so their
//! edges peek out.  Read pages show above the spine, the most recent one on
//! top.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::Style,
    widgets::Widget,
};

use super::halfblock::{fit_size, paint, resample};
use super::theme::{blend, rgb, Theme};
use crate::core::content::{MediaKind, Portfolio};
use crate::core::render::VisualSurface;
use crate::core::transform::{PageClass, PageVisual, TransformConfig};

/// Terminal cells are coarse; depth is exaggerated so a few pages of stack
/// still read as depth.
const DEPTH_EXAGGERATION: f64 = 20.0;
/// Lift is given in pixels; one row is about this many.
const PX_PER_ROW: f64 = 16.0;
/// Columns between two rings on the spine.
const RING_SPACING: u16 = 6;

// ───────────────────────────────────────── scene ─────────────

/// Per-page visuals as last written by the pipeline.
#[derive(Debug, Default)]
pub struct NotebookScene {
    sheets: Vec<Option<PageVisual>>,
}

impl NotebookScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visual(&self, page: usize) -> Option<&PageVisual> {
        self.sheets.get(page).and_then(Option::as_ref)
    }

    /// Visible sheets with their rank inside their pile (0 = the sheet on
    /// top of the pile), in paint order: read pile, unread pile, then the
    /// sheet being flipped.  Within a pile the top sheet is painted last.
    ///
    /// The unread pile's top is its shallowest sheet; the read pile's top is
    /// its outermost (deepest) one, the page read most recently.
    pub fn draw_order(&self) -> Vec<(usize, PageVisual, u16)> {
        let mut visible: Vec<(usize, PageVisual)> = self
            .sheets
            .iter()
            .enumerate()
            .filter_map(|(page, v)| v.filter(|v| v.opacity > 0.0).map(|v| (page, v)))
            .collect();
        visible.sort_by(|a, b| a.1.depth_z.total_cmp(&b.1.depth_z));
        let pile = |class: PageClass| -> Vec<(usize, PageVisual)> {
            visible.iter().copied().filter(|(_, v)| v.class == class).collect()
        };
        let rank = |i: usize| i.min(usize::from(u16::MAX)) as u16;

        let mut ordered = Vec::with_capacity(visible.len());
        let read = pile(PageClass::Read);
        let n = read.len();
        ordered.extend(read.into_iter().enumerate().map(|(i, (p, v))| (p, v, rank(n - 1 - i))));
        let unread = pile(PageClass::Unread);
        ordered.extend(unread.into_iter().enumerate().rev().map(|(i, (p, v))| (p, v, rank(i))));
        ordered.extend(pile(PageClass::Flipping).into_iter().map(|(p, v)| (p, v, 0)));
        ordered
    }
}

impl VisualSurface for NotebookScene {
    fn apply(&mut self, page: usize, visual: &PageVisual) {
        if page >= self.sheets.len() {
            self.sheets.resize(page + 1, None);
        }
        self.sheets[page] = Some(*visual);
    }

    fn hide(&mut self, page: usize) {
        if let Some(slot) = self.sheets.get_mut(page) {
            *slot = None;
        }
    }
}

// ───────────────────────────────────────── geometry ──────────

/// Where the spine and an unrotated sheet sit inside the notebook area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub area: Rect,
    pub spine_y: u16,
    pub sheet_w: u16,
    pub sheet_h: u16,
    /// Rows under the top sheet left for pile edges.
    pub edge_rows: u16,
}

impl Geometry {
    pub fn new(area: Rect, visible_depth: usize) -> Self {
        let edge_rows = (visible_depth.min(3) as u16).min(area.height / 8);
        let spine_y = area.y + (area.height / 3).max(1).min(area.height.saturating_sub(1));
        let below = area.bottom().saturating_sub(spine_y + 1);
        let sheet_h = below.saturating_sub(edge_rows);
        let sheet_w = area
            .width
            .saturating_sub(4)
            .min((f64::from(sheet_h) * 2.4).round() as u16);
        Self {
            area,
            spine_y,
            sheet_w,
            sheet_h,
            edge_rows,
        }
    }

    /// Screen rectangle of a sheet; `None` when nothing of it is on screen.
    pub fn project(&self, visual: &PageVisual, rank: u16, cfg: &TransformConfig) -> Option<Rect> {
        if self.sheet_w == 0 || self.sheet_h == 0 {
            return None;
        }
        let cos = visual.rotation_deg.to_radians().cos();
        let h = ((f64::from(self.sheet_h) * cos.abs()).round() as u16).max(1);

        // Perspective follows the position inside the pile; the flipping
        // sheet is always at the front.
        let depth = match visual.class {
            PageClass::Flipping => 0.0,
            _ => f64::from(rank) * cfg.page_spacing,
        };
        let persp = cfg.perspective_px / (cfg.perspective_px + depth * DEPTH_EXAGGERATION);
        let w = (f64::from(self.sheet_w) * persp * visual.scale)
            .round()
            .clamp(1.0, f64::from(self.area.width)) as u16;
        let x = self.area.x + (self.area.width - w) / 2;
        let lift = (visual.lift_y.max(0.0) / PX_PER_ROW).round() as u16;
        let offset = rank.min(self.edge_rows);

        let (top, bottom) = if cos >= 0.0 {
            let top = (self.spine_y + 1 + offset)
                .saturating_sub(lift)
                .max(self.area.y);
            (top, (top + h).min(self.area.bottom()))
        } else {
            let bottom = self.spine_y.saturating_sub(offset + lift);
            (bottom.saturating_sub(h).max(self.area.y), bottom)
        };
        (bottom > top).then(|| Rect::new(x, top, w, bottom - top))
    }
}

// ───────────────────────────────────────── shading ───────────

/// Per-sheet colour transform: backface tint, then shadow, then fade
/// towards the desk.
#[derive(Debug, Clone, Copy)]
struct Shade {
    opacity: f64,
    shadow: f64,
    backface: f64,
}

impl Shade {
    fn of(visual: &PageVisual) -> Self {
        Self {
            opacity: visual.opacity,
            shadow: visual.shadow_overlay,
            backface: visual.backface_alpha,
        }
    }

    fn apply(&self, c: [u8; 3]) -> [u8; 3] {
        let c = blend(c, Theme::PAPER_BACK, self.backface);
        let c = blend(c, [0, 0, 0], self.shadow);
        blend(Theme::DESK, c, self.opacity)
    }
}

// ───────────────────────────────────────── widget ────────────

pub struct NotebookWidget<'a> {
    pub scene: &'a NotebookScene,
    pub portfolio: &'a Portfolio,
    pub thumbs: &'a HashMap<PathBuf, Arc<RgbaImage>>,
    pub transform: &'a TransformConfig,
}

impl<'a> Widget for NotebookWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Theme::desk_style());
        let geo = Geometry::new(area, self.transform.visible_depth);

        for (page, visual, rank) in self.scene.draw_order() {
            let Some(rect) = geo.project(&visual, rank, self.transform) else {
                continue;
            };
            let shade = Shade::of(&visual);
            // Deeper pile sheets only show their edges.
            let detailed = rank == 0 || visual.class == PageClass::Flipping;
            if !detailed {
                fill(buf, rect, shade.apply(Theme::PAPER_EDGE));
                continue;
            }
            fill(buf, rect, shade.apply(Theme::PAPER));
            self.render_content(page, &visual, rect, &geo, shade, buf);
        }

        render_spine(&geo, buf);
    }
}

impl<'a> NotebookWidget<'a> {
    fn render_content(
        &self,
        page: usize,
        visual: &PageVisual,
        rect: Rect,
        geo: &Geometry,
        shade: Shade,
        buf: &mut Buffer,
    ) {
        let Some(entry) = self.portfolio.pages.get(page) else {
            return;
        };
        let inner = inset(rect);
        let cos = visual.rotation_deg.to_radians().cos();

        if let Some(thumb) = self.thumbs.get(&entry.path) {
            // Fit against the unrotated sheet, then foreshorten vertically.
            let full = inset(Rect::new(rect.x, rect.y, rect.width, geo.sheet_h));
            let (w, full_h) = fit_size(
                thumb.dimensions(),
                (u32::from(full.width), u32::from(full.height) * 2),
            );
            let h = ((f64::from(full_h) * cos.abs()).round() as u32).min(u32::from(inner.height) * 2);
            if w == 0 || h == 0 {
                return;
            }
            let mut rgba = resample(thumb, w, h, visual.blur_px);
            if cos < 0.0 {
                image::imageops::flip_vertical_in_place(&mut rgba);
            }
            let x = inner.x + inner.width.saturating_sub(w as u16) / 2;
            let y = inner.y + inner.height.saturating_sub(h.div_ceil(2) as u16) / 2;
            paint(&rgba, x, y, inner, buf, |c| shade.apply(c));
            return;
        }

        // No pixels (video, or still decoding): a captioned card.
        if inner.height == 0 || visual.backface_alpha >= 0.5 {
            return;
        }
        let caption = match entry.kind {
            MediaKind::Video => format!("▶ {}", entry.name),
            MediaKind::Image => format!("{} …", entry.name),
        };
        let fg = shade.apply([70, 66, 58]);
        let bg = shade.apply(Theme::PAPER);
        let style = Theme::caption_style().fg(rgb(fg)).bg(rgb(bg));
        let width = caption.chars().count().min(inner.width as usize) as u16;
        let x = inner.x + (inner.width - width) / 2;
        let y = inner.y + inner.height / 2;
        buf.set_stringn(x, y, &caption, inner.width as usize, style);
    }
}

/// One cell of paper margin around the content.
fn inset(rect: Rect) -> Rect {
    if rect.width < 3 || rect.height < 3 {
        return Rect::new(rect.x, rect.y, 0, 0);
    }
    Rect::new(rect.x + 1, rect.y + 1, rect.width - 2, rect.height - 2)
}

fn fill(buf: &mut Buffer, rect: Rect, color: [u8; 3]) {
    buf.set_style(rect, Style::default().bg(rgb(color)));
    for y in rect.top()..rect.bottom() {
        for x in rect.left()..rect.right() {
            if let Some(cell) = buf.cell_mut(Position::new(x, y)) {
                cell.set_char(' ');
            }
        }
    }
}

fn render_spine(geo: &Geometry, buf: &mut Buffer) {
    if geo.sheet_w == 0 {
        return;
    }
    let width = (geo.sheet_w + 2).min(geo.area.width);
    let x0 = geo.area.x + (geo.area.width - width) / 2;
    for i in 0..width {
        let x = x0 + i;
        let Some(cell) = buf.cell_mut(Position::new(x, geo.spine_y)) else {
            continue;
        };
        if i % RING_SPACING == RING_SPACING / 2 {
            cell.set_char('○').set_style(Theme::ring_style());
        } else {
            cell.set_char('━').set_style(Theme::spine_style());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::compute_transform;

    fn scene_at(position: f64, total: usize, cfg: &TransformConfig) -> NotebookScene {
        let mut scene = NotebookScene::new();
        for page in 0..total {
            scene.apply(page, &compute_transform(page, position, total, cfg));
        }
        scene
    }

    #[test]
    fn scene_tracks_applied_and_hidden_pages() {
        let cfg = TransformConfig::default();
        let mut scene = NotebookScene::new();
        scene.apply(4, &compute_transform(4, 0.0, 8, &cfg));
        assert!(scene.visual(4).is_some());
        assert!(scene.visual(2).is_none());
        scene.hide(4);
        scene.hide(40);
        assert!(scene.visual(4).is_none());
    }

    #[test]
    fn flipping_sheet_paints_last_and_piles_far_first() {
        let cfg = TransformConfig::default();
        let scene = scene_at(2.5, 6, &cfg);
        let order = scene.draw_order();

        let last = order.last().unwrap();
        assert_eq!((last.0, last.1.class), (2, PageClass::Flipping));

        let unread: Vec<(usize, u16)> = order
            .iter()
            .filter(|(_, v, _)| v.class == PageClass::Unread)
            .map(|(p, _, r)| (*p, *r))
            .collect();
        assert_eq!(unread, [(5, 2), (4, 1), (3, 0)]);

        let read_top = order
            .iter()
            .filter(|(_, v, _)| v.class == PageClass::Read)
            .last()
            .unwrap();
        assert_eq!((read_top.0, read_top.2), (1, 0));
    }

    #[test]
    fn rotation_moves_the_sheet_over_the_spine() {
        let cfg = TransformConfig::default();
        let geo = Geometry::new(Rect::new(0, 0, 80, 30), cfg.visible_depth);
        let flat = geo.project(&compute_transform(0, 0.0, 3, &cfg), 0, &cfg).unwrap();
        assert_eq!(flat.y, geo.spine_y + 1);
        assert_eq!(flat.height, geo.sheet_h);

        let half = geo.project(&compute_transform(0, 0.25, 3, &cfg), 0, &cfg).unwrap();
        assert!(half.height < flat.height);
        assert!(half.y <= flat.y);

        let over = geo.project(&compute_transform(0, 0.9, 3, &cfg), 0, &cfg).unwrap();
        assert!(over.bottom() <= geo.spine_y);
    }

    #[test]
    fn deeper_sheets_are_narrower_and_staggered() {
        let cfg = TransformConfig::default();
        let geo = Geometry::new(Rect::new(0, 0, 80, 30), cfg.visible_depth);
        let top = geo.project(&compute_transform(0, 0.0, 5, &cfg), 0, &cfg).unwrap();
        let below = geo.project(&compute_transform(2, 0.0, 5, &cfg), 2, &cfg).unwrap();
        assert!(below.width <= top.width);
        assert!(below.bottom() > top.bottom());
    }

    #[test]
    fn renders_spine_and_caption_without_thumbnails() {
        let cfg = TransformConfig::default();
        let portfolio = Portfolio::sample(3);
        let scene = scene_at(0.0, 3, &cfg);
        let thumbs = HashMap::new();
        let area = Rect::new(0, 0, 60, 24);
        let mut buf = Buffer::empty(area);
        NotebookWidget {
            scene: &scene,
            portfolio: &portfolio,
            thumbs: &thumbs,
            transform: &cfg,
        }
        .render(area, &mut buf);

        let geo = Geometry::new(area, cfg.visible_depth);
        let spine: String = (0..60)
            .map(|x| buf[(x, geo.spine_y)].symbol().to_string())
            .collect();
        assert!(spine.contains('○'));
        assert!(spine.contains('━'));

        let text: String = (0..24)
            .flat_map(|y| (0..60).map(move |x| (x, y)))
            .map(|(x, y)| buf[(x, y)].symbol().to_string())
            .collect();
        assert!(text.contains("00.png"));
    }

    #[test]
    fn tiny_areas_do_not_panic() {
        let cfg = TransformConfig::default();
        let portfolio = Portfolio::sample(3);
        let scene = scene_at(0.4, 3, &cfg);
        let thumbs = HashMap::new();
        for (w, h) in [(0, 0), (1, 1), (3, 2), (10, 4)] {
            let area = Rect::new(0, 0, w, h);
            let mut buf = Buffer::empty(area);
            NotebookWidget {
                scene: &scene,
                portfolio: &portfolio,
                thumbs: &thumbs,
                transform: &cfg,
            }
            .render(area, &mut buf);
        }
    }
}

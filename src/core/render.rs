//! Render pipeline driver.
//!
//! Turns an engine snapshot into per-page writes on a [`VisualSurface`].  The
//! surface is retained: the pipeline remembers what it last wrote for every
//! page and only writes again when the visual actually changed.  Pages well
//! outside the visible window are hidden once and skipped afterwards.

use super::engine::ScrollSnapshot;
use super::looping::LoopMapper;
use super::transform::{visual_at, PageClass, PageVisual, TransformConfig};

/// Anything the pipeline can draw onto.  The core never reads back from it.
pub trait VisualSurface {
    fn apply(&mut self, page: usize, visual: &PageVisual);
    fn hide(&mut self, page: usize);
}

/// Counters for one [`RenderPipeline::render`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub applied: usize,
    pub unchanged: usize,
    pub hidden: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Applied {
    Unknown,
    Hidden,
    Shown(PageVisual),
}

#[derive(Debug, Clone)]
pub struct RenderPipeline {
    transform: TransformConfig,
    mapper: LoopMapper,
    applied: Vec<Applied>,
}

impl RenderPipeline {
    pub fn new(transform: TransformConfig, loop_mode: bool) -> Self {
        let mapper = LoopMapper::new(loop_mode, transform.visible_depth);
        Self {
            transform,
            mapper,
            applied: Vec::new(),
        }
    }

    pub fn transform(&self) -> &TransformConfig {
        &self.transform
    }

    /// Forget what was written; the next render rewrites every page.
    pub fn invalidate(&mut self) {
        self.applied.iter_mut().for_each(|a| *a = Applied::Unknown);
    }

    pub fn set_transform(&mut self, transform: TransformConfig) {
        self.mapper.visible_depth = transform.visible_depth;
        self.transform = transform;
        self.invalidate();
    }

    pub fn set_loop_mode(&mut self, enabled: bool) {
        if self.mapper.enabled != enabled {
            self.mapper.enabled = enabled;
            self.invalidate();
        }
    }

    /// Write every changed page for `snapshot` onto `surface`.
    pub fn render(&mut self, snapshot: &ScrollSnapshot, surface: &mut dyn VisualSurface) -> RenderStats {
        let total = snapshot.total_pages;
        if self.applied.len() != total {
            self.applied = vec![Applied::Unknown; total];
        }

        let window = self.transform.visible_depth as f64 + 1.0;
        let mut stats = RenderStats::default();
        for page in 0..total {
            let rel = self.mapper.relative_position(page, snapshot.position, total);
            if rel.abs() > window {
                if self.applied[page] != Applied::Hidden {
                    surface.hide(page);
                    self.applied[page] = Applied::Hidden;
                    stats.hidden += 1;
                }
                continue;
            }

            let rank = self.mapper.read_rank(page, snapshot.position, total);
            let visual = visual_at(page, rel, rank, &self.transform);
            if self.applied[page] == Applied::Shown(visual) {
                stats.unchanged += 1;
                continue;
            }
            surface.apply(page, &visual);
            self.applied[page] = Applied::Shown(visual);
            stats.applied += 1;
        }
        stats
    }

    /// Coarse unread / flipping / read class of `page`.
    pub fn classify(&self, page: usize, snapshot: &ScrollSnapshot) -> PageClass {
        let rel = self
            .mapper
            .relative_position(page, snapshot.position, snapshot.total_pages);
        PageClass::from_relative(rel)
    }
}

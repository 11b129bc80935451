//! Transform / depth calculator — the "physics" of the notebook.
//!
//! A pure function from `(page, scroll position, page count)` to a
//! [`PageVisual`].  Pages flip over the top edge of the stack and land on a
//! pile behind it:
//!
//! * **Unread** pages rest in front, each one `page_spacing` deeper than the
//!   page above it.
//! * The **flipping** page rotates from 0 to `max_angle`, arcing up off the
//!   stack, going edge-on (dimmer, blurrier) and showing its backface.
//! * **Read** pages rest on the back pile, the most recently read one
//!   outermost.
//!
//! `depth_z` is measured away from the camera: larger is further back.
//!
//! The page at `floor(scroll)` is the one whose flip progress equals the
//! fractional part of `scroll`.  With `rel = page - scroll` that page has
//! `rel ∈ (-1, 0]`, so classification works on `lead = rel + 1`.

use super::error::{non_negative, within, ConfigError};
use super::math::{arc, clamp, lerp, map_range_clamped};

// ───────────────────────────────────────── config ────────────

/// Host capabilities.  A disabled effect yields its neutral value instead of
/// failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effects {
    pub blur: bool,
    pub backface: bool,
    pub shadow: bool,
}

impl Default for Effects {
    fn default() -> Self {
        Self {
            blur: true,
            backface: true,
            shadow: true,
        }
    }
}

/// Geometry and appearance constants for the page model.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformConfig {
    /// Rotation of a fully read page: 180 (primary) or up to 270.
    pub max_angle: f64,
    /// Depth between neighbouring resting pages (px).
    pub page_spacing: f64,
    /// Depth of the top unread page (px).
    pub stack_base_z: f64,
    /// Peak lift of a flipping sheet (px).
    pub lift_height: f64,
    /// Opacity/blur start changing this many degrees before edge-on.
    pub fade_start_angle: f64,
    pub min_edge_opacity: f64,
    pub max_blur_px: f64,
    pub backface_start_angle: f64,
    /// Degrees over which the backface fades in.
    pub backface_ramp_deg: f64,
    /// Contact shadow is gone once the page above passes this angle.
    pub shadow_threshold_angle: f64,
    pub max_shadow: f64,
    /// Pages shown on each pile before fading out.
    pub visible_depth: usize,
    /// Per-index depth offset that breaks exact ties.
    pub z_tiebreak: f64,
    pub perspective_px: f64,
    /// Scale sheets so they render at uniform size regardless of depth.
    pub compensate_perspective: bool,
    pub effects: Effects,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_angle: 180.0,
            page_spacing: 3.0,
            stack_base_z: 0.0,
            lift_height: 40.0,
            fade_start_angle: 60.0,
            min_edge_opacity: 0.35,
            max_blur_px: 2.5,
            backface_start_angle: 90.0,
            backface_ramp_deg: 25.0,
            shadow_threshold_angle: 45.0,
            max_shadow: 0.45,
            visible_depth: 5,
            z_tiebreak: 0.001,
            perspective_px: 1200.0,
            compensate_perspective: false,
            effects: Effects::default(),
        }
    }
}

impl TransformConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(180.0..=270.0).contains(&self.max_angle) {
            return Err(ConfigError::MaxAngle(self.max_angle));
        }
        if self.visible_depth == 0 {
            return Err(ConfigError::ZeroVisibleDepth);
        }
        non_negative("page_spacing", self.page_spacing)?;
        non_negative("lift_height", self.lift_height)?;
        non_negative("max_blur_px", self.max_blur_px)?;
        non_negative("z_tiebreak", self.z_tiebreak)?;
        within("fade_start_angle", self.fade_start_angle, 0.0, 89.0)?;
        within("min_edge_opacity", self.min_edge_opacity, 0.0, 1.0)?;
        within("backface_start_angle", self.backface_start_angle, 0.0, self.max_angle)?;
        within("backface_ramp_deg", self.backface_ramp_deg, 0.0, 180.0)?;
        within("shadow_threshold_angle", self.shadow_threshold_angle, 1.0, 180.0)?;
        within("max_shadow", self.max_shadow, 0.0, 1.0)?;
        within("perspective_px", self.perspective_px, 1.0, 100_000.0)?;
        Ok(())
    }

    /// Depth of the first slot on the back pile, just behind the visible
    /// unread window.
    fn read_base_z(&self) -> f64 {
        self.stack_base_z + (self.visible_depth as f64 + 1.0) * self.page_spacing
    }

    fn read_depth(&self, read_rank: f64) -> f64 {
        self.read_base_z() + read_rank * self.page_spacing
    }

    fn perspective_scale(&self, depth: f64) -> f64 {
        if self.compensate_perspective {
            clamp((self.perspective_px + depth) / self.perspective_px, 0.1, 10.0)
        } else {
            1.0
        }
    }

    /// Opacity of a resting page `distance` pages into a pile.
    fn window_fade(&self, distance: f64) -> f64 {
        let depth = self.visible_depth as f64;
        map_range_clamped(distance, depth - 1.0, depth, 1.0, 0.0)
    }

    /// 1 when the sheet is edge-on (90° or 270°), 0 outside the fade band.
    fn edge_on(&self, angle: f64) -> f64 {
        let band = 90.0 - self.fade_start_angle;
        if band <= 0.0 {
            return 0.0;
        }
        let off = (angle - 90.0).abs().min((angle - 270.0).abs());
        1.0 - clamp(off / band, 0.0, 1.0)
    }

    /// Rotation of a page given its lead offset.
    fn rotation_for_lead(&self, lead: f64) -> f64 {
        clamp(1.0 - lead, 0.0, 1.0) * self.max_angle
    }
}

// ───────────────────────────────────────── output ────────────

/// Coarse position of a page in the notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageClass {
    Unread,
    Flipping,
    Read,
}

impl PageClass {
    /// Classify by `rel = page - scroll`.
    pub fn from_relative(rel: f64) -> Self {
        let lead = rel + 1.0;
        if lead >= 1.0 {
            PageClass::Unread
        } else if lead > 0.0 {
            PageClass::Flipping
        } else {
            PageClass::Read
        }
    }
}

/// Per-frame visual description of one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageVisual {
    pub depth_z: f64,
    pub lift_y: f64,
    pub rotation_deg: f64,
    pub opacity: f64,
    pub blur_px: f64,
    pub backface_alpha: f64,
    pub shadow_overlay: f64,
    /// Perspective compensation (1.0 when disabled).
    pub scale: f64,
    pub class: PageClass,
}

impl PageVisual {
    /// Flat, unshadowed, on top of the unread pile.
    fn resting(page: usize, cfg: &TransformConfig) -> Self {
        let depth = cfg.stack_base_z + page as f64 * cfg.z_tiebreak;
        Self {
            depth_z: depth,
            lift_y: 0.0,
            rotation_deg: 0.0,
            opacity: 1.0,
            blur_px: 0.0,
            backface_alpha: 0.0,
            shadow_overlay: 0.0,
            scale: cfg.perspective_scale(depth),
            class: PageClass::Unread,
        }
    }
}

// ───────────────────────────────────────── calculator ────────

/// Visual for `page` at `scroll` in a bounded notebook of `total` pages.
pub fn compute_transform(page: usize, scroll: f64, total: usize, cfg: &TransformConfig) -> PageVisual {
    if total == 0 || page >= total {
        let mut v = PageVisual::resting(page, cfg);
        v.opacity = 0.0;
        return v;
    }
    visual_at(page, page as f64 - scroll, page as f64, cfg)
}

/// Visual for `page` given its relative offset and read-pile rank (both
/// supplied by the loop mapper).
pub fn visual_at(page: usize, rel: f64, read_rank: f64, cfg: &TransformConfig) -> PageVisual {
    if !rel.is_finite() || !read_rank.is_finite() {
        return PageVisual::resting(page, cfg);
    }
    let tiebreak = page as f64 * cfg.z_tiebreak;
    let lead = rel + 1.0;

    match PageClass::from_relative(rel) {
        PageClass::Unread => {
            let depth = cfg.stack_base_z + rel * cfg.page_spacing + tiebreak;
            // The page directly above has lead - 1 == rel.
            let above = cfg.rotation_for_lead(rel);
            let shadow = if cfg.effects.shadow {
                cfg.max_shadow * (1.0 - clamp(above / cfg.shadow_threshold_angle, 0.0, 1.0))
            } else {
                0.0
            };
            PageVisual {
                depth_z: depth,
                lift_y: 0.0,
                rotation_deg: 0.0,
                opacity: cfg.window_fade(rel),
                blur_px: 0.0,
                backface_alpha: 0.0,
                shadow_overlay: shadow,
                scale: cfg.perspective_scale(depth),
                class: PageClass::Unread,
            }
        }
        PageClass::Flipping => {
            let p = 1.0 - lead;
            let angle = p * cfg.max_angle;
            let lift = arc(p) * cfg.lift_height;
            let rest = cfg.stack_base_z + tiebreak;
            let landing = cfg.read_depth(read_rank) + tiebreak;
            let depth = lerp(rest, landing, p) - lift;
            let edge = cfg.edge_on(angle);
            PageVisual {
                depth_z: depth,
                lift_y: lift,
                rotation_deg: angle,
                opacity: 1.0 - edge * (1.0 - cfg.min_edge_opacity),
                blur_px: if cfg.effects.blur { edge * cfg.max_blur_px } else { 0.0 },
                backface_alpha: if cfg.effects.backface {
                    map_range_clamped(
                        angle,
                        cfg.backface_start_angle,
                        cfg.backface_start_angle + cfg.backface_ramp_deg,
                        0.0,
                        1.0,
                    )
                } else {
                    0.0
                },
                shadow_overlay: 0.0,
                scale: cfg.perspective_scale(depth),
                class: PageClass::Flipping,
            }
        }
        PageClass::Read => {
            let depth = cfg.read_depth(read_rank) + tiebreak;
            PageVisual {
                depth_z: depth,
                lift_y: 0.0,
                rotation_deg: cfg.max_angle,
                opacity: cfg.window_fade(-lead),
                blur_px: 0.0,
                backface_alpha: if cfg.effects.backface { 1.0 } else { 0.0 },
                shadow_overlay: 0.0,
                scale: cfg.perspective_scale(depth),
                class: PageClass::Read,
            }
        }
    }
}

//! Image drawing with Unicode `▀` half-blocks (2 pixels per cell).
//!
//! Each cell represents 1 pixel wide × 2 pixels tall: the top pixel is the
//! foreground colour, the bottom one the background.

use image::imageops::FilterType;
use image::RgbaImage;
use ratatui::{buffer::Buffer, layout::Position, layout::Rect, style::Color};

use super::theme::{blend, Theme};

/// Largest size with the aspect ratio of `src` that fits in `max` pixels.
/// Never upscales.
pub fn fit_size(src: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (f64::from(src.0), f64::from(src.1));
    if src_w == 0.0 || src_h == 0.0 || max.0 == 0 || max.1 == 0 {
        return (0, 0);
    }
    let scale = (f64::from(max.0) / src_w)
        .min(f64::from(max.1) / src_h)
        .min(1.0);
    (
        (src_w * scale).round().max(1.0) as u32,
        (src_h * scale).round().max(1.0) as u32,
    )
}

/// Resize `img` to exactly `w × h`, optionally softened by `blur` pixels
/// (downscale, then back up).
pub fn resample(img: &RgbaImage, w: u32, h: u32, blur: f64) -> RgbaImage {
    if blur >= 0.75 {
        let k = 1.0 + blur;
        let sw = ((f64::from(w) / k).round() as u32).max(1);
        let sh = ((f64::from(h) / k).round() as u32).max(1);
        let small = image::imageops::resize(img, sw, sh, FilterType::Triangle);
        image::imageops::resize(&small, w, h, FilterType::Triangle)
    } else {
        image::imageops::resize(img, w, h, FilterType::Triangle)
    }
}

/// Draw `rgba` with its top-left pixel at cell `(x, y)`, clipped to `clip`.
/// Transparent pixels are composited over paper; every colour then passes
/// through `shade`.
pub fn paint(
    rgba: &RgbaImage,
    x: u16,
    y: u16,
    clip: Rect,
    buf: &mut Buffer,
    shade: impl Fn([u8; 3]) -> [u8; 3],
) {
    let pixel = |px: u32, py: u32| -> Option<[u8; 3]> {
        if py >= rgba.height() {
            return None;
        }
        let p = rgba.get_pixel(px, py);
        let c = blend(Theme::PAPER, [p[0], p[1], p[2]], f64::from(p[3]) / 255.0);
        Some(shade(c))
    };

    let rows = rgba.height().div_ceil(2);
    for row in 0..rows {
        let cy = u32::from(y) + row;
        if cy < u32::from(clip.y) || cy >= u32::from(clip.bottom()) {
            continue;
        }
        for col in 0..rgba.width() {
            let cx = u32::from(x) + col;
            if cx < u32::from(clip.x) || cx >= u32::from(clip.right()) {
                continue;
            }
            let Some(top) = pixel(col, row * 2) else {
                continue;
            };
            let bottom = pixel(col, row * 2 + 1);
            if let Some(cell) = buf.cell_mut(Position::new(cx as u16, cy as u16)) {
                cell.set_char('▀').set_fg(Color::Rgb(top[0], top[1], top[2]));
                match bottom {
                    Some(b) => cell.set_bg(Color::Rgb(b[0], b[1], b[2])),
                    None => cell.set_bg(Color::Reset),
                };
            }
        }
    }
}

/// Fit `thumb` inside `area` (aspect preserved), centred, unshaded.
pub fn render_image_halfblocks(thumb: &RgbaImage, area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let (w, h) = fit_size(
        thumb.dimensions(),
        (u32::from(area.width), u32::from(area.height) * 2),
    );
    if w == 0 || h == 0 {
        return;
    }
    let rgba = resample(thumb, w, h, 0.0);
    let x = area.x + (area.width.saturating_sub(w as u16)) / 2;
    let y = area.y + (area.height.saturating_sub(h.div_ceil(2) as u16)) / 2;
    paint(&rgba, x, y, area, buf, |c| c);
}

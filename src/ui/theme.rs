//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

/// Central theme — change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── notebook ───────────────────────────────────────────────
    /// Colour behind the notebook.
    pub const DESK: [u8; 3] = [28, 30, 36];
    /// Front of a sheet without an image.
    pub const PAPER: [u8; 3] = [236, 230, 214];
    /// Back of a sheet.
    pub const PAPER_BACK: [u8; 3] = [196, 188, 168];
    /// Sheet edge peeking out of a pile.
    pub const PAPER_EDGE: [u8; 3] = [170, 162, 142];

    pub fn desk_style() -> Style {
        Style::default().bg(rgb(Self::DESK))
    }

    pub fn spine_style() -> Style {
        Style::default().fg(Color::Rgb(120, 124, 134)).bg(rgb(Self::DESK))
    }

    pub fn ring_style() -> Style {
        Style::default()
            .fg(Color::Rgb(210, 214, 222))
            .bg(rgb(Self::DESK))
            .add_modifier(Modifier::BOLD)
    }

    pub fn caption_style() -> Style {
        Style::default().fg(Color::Rgb(70, 66, 58))
    }

    // ── tabs ───────────────────────────────────────────────────
    pub fn tab_style(color: [u8; 3], active: bool, read: bool) -> Style {
        let base = Style::default().bg(rgb(color)).fg(Color::Black);
        if active {
            base.add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else if read {
            base.add_modifier(Modifier::DIM)
        } else {
            base
        }
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn border_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn title_style() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }

    pub fn status_accent_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }
}

pub fn rgb(c: [u8; 3]) -> Color {
    Color::Rgb(c[0], c[1], c[2])
}

/// Mix `c` towards `toward` by `t` (0 = `c`, 1 = `toward`).
pub fn blend(c: [u8; 3], toward: [u8; 3], t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    [mix(c[0], toward[0]), mix(c[1], toward[1]), mix(c[2], toward[2])]
}

//! Focus overlay: the current page at full size.
//!
//! Renders the page centred on the terminal with navigation arrows, a close
//! button, and a position indicator (e.g. "3 / 7").  While it is open the
//! notebook ignores scroll and drag input.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use super::halfblock::render_image_halfblocks;
use crate::core::content::{MediaKind, Portfolio};

pub struct FocusOverlay<'a> {
    pub portfolio: &'a Portfolio,
    pub page: usize,
    /// Wraps around at both ends.
    pub looping: bool,
    pub thumbs: &'a HashMap<PathBuf, Arc<image::RgbaImage>>,
}

/// Clickable regions returned after rendering, for mouse hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusHitZones {
    pub close_rect: Rect,
    pub prev_rect: Rect,
    pub next_rect: Rect,
}

impl FocusHitZones {
    pub fn contains(rect: Rect, column: u16, row: u16) -> bool {
        column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
    }
}

impl<'a> FocusOverlay<'a> {
    /// Centred, 90% of the terminal.
    fn overlay_area(terminal: Rect) -> Rect {
        let margin_x = (f32::from(terminal.width) * 0.05).round() as u16;
        let margin_y = (f32::from(terminal.height) * 0.05).round() as u16;
        let width = terminal.width.saturating_sub(margin_x * 2).max(20).min(terminal.width);
        let height = terminal.height.saturating_sub(margin_y * 2).max(8).min(terminal.height);
        Rect::new(terminal.x + margin_x, terminal.y + margin_y, width, height)
    }

    /// Render and return hit zones for mouse interaction.
    pub fn render_and_hit(self, terminal_area: Rect, buf: &mut Buffer) -> FocusHitZones {
        let area = Self::overlay_area(terminal_area);
        Clear.render(area, buf);

        let total = self.portfolio.len();
        let entry = self.portfolio.pages.get(self.page);
        let title = match entry {
            Some(entry) => format!(" {} — {}/{} ", entry.name, self.page + 1, total),
            None => " No page ".to_string(),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightBlue))
            .title(Span::styled(
                title,
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(area);
        block.render(area, buf);

        let close_rect = Rect::new(area.x + area.width.saturating_sub(5), area.y, 3, 1);
        Paragraph::new(Line::from(Span::styled(
            "[X]",
            Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        )))
        .render(close_rect.intersection(area), buf);

        let arrow_y = area.y + area.height / 2;
        let prev_rect = Rect::new(area.x, arrow_y, 3, 1);
        let next_rect = Rect::new(area.x + area.width.saturating_sub(3), arrow_y, 3, 1);
        let arrow = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        if self.looping || self.page > 0 {
            Paragraph::new(Line::from(Span::styled(" ◀", arrow))).render(prev_rect.intersection(area), buf);
        }
        if self.looping || self.page + 1 < total {
            Paragraph::new(Line::from(Span::styled("▶ ", arrow))).render(next_rect.intersection(area), buf);
        }

        let body = Rect::new(
            inner.x.saturating_add(2),
            inner.y,
            inner.width.saturating_sub(4),
            inner.height.saturating_sub(1), // leave 1 row for footer
        );
        if let Some(entry) = entry {
            let message = match (entry.kind, self.thumbs.get(&entry.path)) {
                (MediaKind::Image, Some(thumb)) if body.width > 2 && body.height > 1 => {
                    render_image_halfblocks(thumb, body, buf);
                    None
                }
                (MediaKind::Image, _) => Some("Loading…".to_string()),
                (MediaKind::Video, _) => Some(format!("▶ video · {}", entry.path.display())),
            };
            if let Some(message) = message {
                let width = (message.chars().count() as u16).min(body.width);
                let rect = Rect::new(
                    body.x + (body.width - width) / 2,
                    body.y + body.height / 2,
                    width,
                    1,
                );
                Paragraph::new(Span::styled(message, Style::default().fg(Color::DarkGray)))
                    .render(rect.intersection(area), buf);
            }
        }

        let footer = Line::from(Span::styled(
            " ←/→ page   Esc close ",
            Style::default().fg(Color::DarkGray),
        ));
        let footer_y = inner.y + inner.height.saturating_sub(1);
        Paragraph::new(footer).render(Rect::new(inner.x, footer_y, inner.width, 1), buf);

        FocusHitZones {
            close_rect,
            prev_rect,
            next_rect,
        }
    }
}

//! Decode indicator — a small spinner + label rendered in the top-right
//! corner of a given area while page images are still loading.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Braille-dot spinner frames.  Cycles through these on each tick.
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// "⠹ loading 3" indicator.  Invisible when nothing is pending.
pub struct DecodeIndicator {
    /// Images still being decoded.
    pub pending: usize,
    /// Monotonically increasing tick counter (drives the spinner frame).
    pub tick: u64,
}

impl DecodeIndicator {
    fn label(&self) -> String {
        // Advance roughly every 80 ms at the frame cadence.
        let frame = SPINNER_FRAMES[(self.tick / 5) as usize % SPINNER_FRAMES.len()];
        format!(" {frame} loading {} ", self.pending)
    }
}

impl Widget for DecodeIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.pending == 0 || area.width < 16 || area.height == 0 {
            return;
        }

        let label = self.label();
        let label_width = label.chars().count() as u16;
        let x = area.x + area.width.saturating_sub(label_width + 1);

        let line = Line::from(Span::styled(
            label,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));

        buf.set_line(x, area.y, &line, label_width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_when_idle() {
        let area = Rect::new(0, 0, 30, 1);
        let mut buf = Buffer::empty(area);
        DecodeIndicator { pending: 0, tick: 7 }.render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }

    #[test]
    fn shows_pending_count_top_right() {
        let area = Rect::new(0, 0, 30, 2);
        let mut buf = Buffer::empty(area);
        DecodeIndicator { pending: 3, tick: 0 }.render(area, &mut buf);
        let row: String = (0..30).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(row.trim_end().ends_with("⠋ loading 3"));
    }
}

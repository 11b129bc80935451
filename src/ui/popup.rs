//! Popup overlay widgets for the settings menu and controls submenu.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use crate::app::settings::{SettingsItem, SETTINGS_ITEMS};
use crate::app::state::AppState;
use crate::config::{Action, AppConfig};

// ───────────────────────────────────────── settings popup ────

/// Settings menu popup overlay.
pub struct SettingsPopup<'a> {
    pub state: &'a AppState,
    pub selected: usize,
}

impl<'a> Widget for SettingsPopup<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = (SETTINGS_ITEMS.len() as u16) + 6;
        let popup = centered_fixed(48, height, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .title(" Settings ")
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines = Vec::new();
        lines.push(Line::raw(""));
        for (i, item) in SETTINGS_ITEMS.iter().enumerate() {
            let (prefix, style) = if i == self.selected {
                (
                    " ▸ ",
                    Style::default()
                        .fg(Color::White)
                        .bg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ("   ", Style::default().fg(Color::White))
            };

            // Current value, right after the label.
            let (suffix, suffix_style) = match item {
                SettingsItem::Submenu { .. } => (String::new(), Style::default()),
                SettingsItem::Toggle { get, .. } => {
                    if get(self.state) {
                        ("  [ON]".to_string(), Style::default().fg(Color::Green))
                    } else {
                        ("  [OFF]".to_string(), Style::default().fg(Color::DarkGray))
                    }
                }
                SettingsItem::Cycle { value, .. } => (
                    format!("  ‹{}›", value(self.state)),
                    Style::default().fg(Color::Yellow),
                ),
            };

            lines.push(Line::from(vec![
                Span::styled(format!("{prefix}{}", item.label()), style),
                Span::styled(suffix, suffix_style),
            ]));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "  Enter/Space: change  Esc: close",
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── controls popup ────

/// Interactive controls / keybinding popup overlay.
pub struct ControlsPopup<'a> {
    pub config: &'a AppConfig,
    pub selected: usize,
    pub awaiting_rebind: bool,
}

impl<'a> Widget for ControlsPopup<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // actions + blanks + reset + fixed keys + hint + border
        let height = (Action::ALL.len() as u16) + 9;
        let popup = centered_fixed(52, height, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .title(" Controls ")
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(popup);
        block.render(popup, buf);

        let dim = Style::default().fg(Color::DarkGray);
        let mut lines = Vec::new();

        lines.push(Line::raw(""));

        // ── Action rows ─────────────────────────────────────────
        for (i, &action) in Action::ALL.iter().enumerate() {
            let is_selected = i == self.selected;

            let prefix = if is_selected { " ▸ " } else { "   " };
            let label = action.label();

            let keys_display = if is_selected && self.awaiting_rebind {
                "Press a key…".to_string()
            } else {
                self.config.display_bindings(action)
            };

            let base_style = if is_selected {
                Style::default()
                    .fg(Color::White)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let key_style = if is_selected && self.awaiting_rebind {
                Style::default()
                    .fg(Color::Yellow)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else if is_selected {
                Style::default()
                    .fg(Color::Yellow)
                    .bg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Yellow)
            };

            // Fixed-width columns: label left-aligned, keys right-aligned.
            let label_col = format!("{prefix}{label:<22}");
            let inner_width = inner.width as usize;
            let keys_width = inner_width.saturating_sub(label_col.len()).max(1);
            let keys_col = format!("{keys_display:>keys_width$}");

            lines.push(Line::from(vec![
                Span::styled(label_col, base_style),
                Span::styled(keys_col, key_style),
            ]));
        }

        // ── Reset option ────────────────────────────────────────
        let reset_idx = Action::ALL.len();
        let is_reset_selected = self.selected == reset_idx;

        lines.push(Line::raw(""));
        let reset_style = if is_reset_selected {
            Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let reset_prefix = if is_reset_selected { " ▸ " } else { "   " };
        lines.push(Line::from(Span::styled(
            format!("{reset_prefix}⟳ Reset to defaults"),
            reset_style,
        )));

        // ── Fixed keys and hint bar ─────────────────────────────
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("   Fixed: ", dim),
            Span::styled("1-9", Style::default().fg(Color::Yellow)),
            Span::styled(" chapter  ", dim),
            Span::styled("wheel/drag", Style::default().fg(Color::Yellow)),
            Span::styled(" flip", dim),
        ]));
        lines.push(Line::from(Span::styled(
            "  Enter: add key  Del: clear  Esc: back",
            dim,
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── helpers ───────────

/// Create a centered rectangle with fixed dimensions, clamped to the available area.
fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::content::Portfolio;
    use std::time::Instant;

    fn text(buf: &Buffer) -> String {
        let area = buf.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn settings_show_current_values() {
        let state = AppState::new(Portfolio::sample(3), AppConfig::default(), 0, Instant::now())
            .unwrap();
        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        SettingsPopup {
            state: &state,
            selected: 1,
        }
        .render(area, &mut buf);
        let out = text(&buf);
        assert!(out.contains("▸ Loop Pages  [OFF]"));
        assert!(out.contains("Page Shadows  [ON]"));
        assert!(out.contains("Flip Angle  ‹180°›"));
    }

    #[test]
    fn controls_prompt_while_rebinding() {
        let config = AppConfig::default();
        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        ControlsPopup {
            config: &config,
            selected: 0,
            awaiting_rebind: true,
        }
        .render(area, &mut buf);
        let out = text(&buf);
        assert!(out.contains("Press a key…"));
        assert!(out.contains("Reset to defaults"));
        assert!(out.contains("PgUp"));
    }

    #[test]
    fn centered_rect_is_clamped() {
        assert_eq!(centered_fixed(10, 4, Rect::new(0, 0, 20, 10)), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_fixed(50, 40, Rect::new(2, 2, 20, 10)), Rect::new(2, 2, 20, 10));
    }
}

//! Bottom status bar: where you are in the notebook, plus key hints or the
//! latest status message.

use std::time::SystemTime;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::theme::Theme;
use crate::app::state::{ActiveView, AppState};
use crate::core::momentum::Phase;

fn format_modified(t: SystemTime) -> String {
    let dt: chrono::DateTime<chrono::Local> = t.into();
    dt.format("%Y/%m/%d %H:%M").to_string()
}

fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// "p 3/12 · travel · IMG_0042.jpg · 1.2 MiB · 2024/05/01 10:12"
pub fn page_summary(state: &AppState) -> String {
    let Some(snapshot) = state.snapshot else {
        return String::new();
    };
    let mut parts = vec![format!("p {}/{}", snapshot.page + 1, snapshot.total_pages)];
    if let Some(chapter) = state.portfolio.chapter_of(snapshot.page) {
        parts.push(chapter.title.clone());
    }
    if let Some(page) = state.portfolio.pages.get(snapshot.page) {
        parts.push(page.name.clone());
        parts.push(format_size(page.size));
        if let Some(modified) = page.modified {
            parts.push(format_modified(modified));
        }
    }
    parts.join(" · ")
}

pub struct StatusBar<'a> {
    pub state: &'a AppState,
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.state;
        buf.set_style(area, Theme::status_bar_style());

        let mut spans = vec![Span::raw(format!(" {} ", page_summary(state)))];
        if state.engine.mapper().enabled {
            spans.push(Span::styled("∞ ", Theme::status_accent_style()));
        }
        if let Some(snapshot) = state.snapshot.filter(|s| s.phase != Phase::Idle) {
            spans.push(Span::styled(
                format!("{} ", snapshot.phase.label()),
                Theme::status_accent_style(),
            ));
        }

        let hint = state.config.status_bar_hint();
        let right = match state.active_view {
            ActiveView::Notebook => state.status_message.as_deref().unwrap_or(&hint),
            ActiveView::Focus => state.status_message.as_deref().unwrap_or(""),
            ActiveView::SettingsMenu | ActiveView::ControlsSubmenu => "",
        };
        spans.push(Span::raw(format!("│ {right}")));

        Paragraph::new(Line::from(spans))
            .style(Theme::status_bar_style())
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::content::Portfolio;
    use std::time::Instant;

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(5 * 1024 * 1024 + 1024 * 512), "5.5 MiB");
    }

    #[test]
    fn summary_names_page_and_chapter() {
        let mut state =
            AppState::new(Portfolio::sample(4), AppConfig::default(), 3, Instant::now()).unwrap();
        assert_eq!(page_summary(&state), "");
        state.sync_scene();
        assert_eq!(page_summary(&state), "p 4/4 · second · 03.png · 1 B");
    }
}

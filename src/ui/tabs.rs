//! Chapter tab strip.
//!
//! One coloured tab per chapter.  The chapter holding the current page is
//! highlighted, chapters already flipped past are dimmed, and clicking a tab
//! jumps to the chapter's first page.

use ratatui::{buffer::Buffer, layout::Rect, style::Style};

use super::theme::Theme;
use crate::core::content::Chapter;

/// Longest tab title before it is cut short.
const MAX_TITLE: usize = 16;

/// Per-chapter state handed in by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabState {
    pub active: bool,
    /// Every page of the chapter is on the read pile.
    pub read: bool,
}

pub struct ChapterTabs<'a> {
    pub chapters: &'a [Chapter],
    pub states: &'a [TabState],
}

fn label(index: usize, title: &str) -> String {
    let title = if title.chars().count() > MAX_TITLE {
        let mut cut: String = title.chars().take(MAX_TITLE - 1).collect();
        cut.push('…');
        cut
    } else {
        title.to_string()
    };
    if index < 9 {
        // Digit shortcut.
        format!(" {} {title} ", index + 1)
    } else {
        format!(" {title} ")
    }
}

/// Tab rectangles laid out left to right.  Tabs that do not fit are dropped.
pub fn tab_rects(chapters: &[Chapter], area: Rect) -> Vec<Rect> {
    let mut rects = Vec::with_capacity(chapters.len());
    let mut x = area.x;
    for (i, chapter) in chapters.iter().enumerate() {
        let width = label(i, &chapter.title).chars().count() as u16;
        if area.height == 0 || x + width > area.right() {
            break;
        }
        rects.push(Rect::new(x, area.y, width, 1));
        // One column gap between tabs.
        x += width + 1;
    }
    rects
}

impl<'a> ChapterTabs<'a> {
    /// Render and return `(rect, chapter index)` hit zones for mouse clicks.
    pub fn render_and_hit(self, area: Rect, buf: &mut Buffer) -> Vec<(Rect, usize)> {
        buf.set_style(area, Theme::status_bar_style());
        let rects = tab_rects(self.chapters, area);
        let mut hits = Vec::with_capacity(rects.len());
        for (i, rect) in rects.into_iter().enumerate() {
            let chapter = &self.chapters[i];
            let state = self.states.get(i).copied().unwrap_or(TabState {
                active: false,
                read: false,
            });
            let style: Style = Theme::tab_style(chapter.color, state.active, state.read);
            buf.set_stringn(
                rect.x,
                rect.y,
                label(i, &chapter.title),
                rect.width as usize,
                style,
            );
            hits.push((rect, i));
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Modifier;

    fn chapter(title: &str, start_page: usize) -> Chapter {
        Chapter {
            title: title.into(),
            start_page,
            color: [100, 150, 200],
        }
    }

    #[test]
    fn labels_carry_shortcuts_and_truncate() {
        assert_eq!(label(0, "intro"), " 1 intro ");
        assert_eq!(label(9, "tenth"), " tenth ");
        assert_eq!(label(2, "a very long chapter title"), " 3 a very long cha… ");
    }

    #[test]
    fn tabs_that_do_not_fit_are_dropped() {
        let chapters = [chapter("one", 0), chapter("two", 3), chapter("three", 5)];
        let rects = tab_rects(&chapters, Rect::new(0, 0, 20, 1));
        assert_eq!(rects, [Rect::new(0, 0, 7, 1), Rect::new(8, 0, 7, 1)]);
    }

    #[test]
    fn active_and_read_tabs_are_styled() {
        let chapters = [chapter("one", 0), chapter("two", 3)];
        let states = [
            TabState {
                active: false,
                read: true,
            },
            TabState {
                active: true,
                read: false,
            },
        ];
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        let hits = ChapterTabs {
            chapters: &chapters,
            states: &states,
        }
        .render_and_hit(area, &mut buf);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].1, 1);
        assert!(buf[(1, 0)].modifier.contains(Modifier::DIM));
        assert!(buf[(9, 0)].modifier.contains(Modifier::BOLD));
    }
}

//! Layout helpers — split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Primary screen layout: chapter tabs on top, the notebook in the middle
/// and a status bar at the bottom.
pub struct AppLayout {
    pub tabs_area: Rect,
    pub notebook_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    /// Compute the layout from the full terminal area.
    pub fn from_area(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // chapter tabs
                Constraint::Min(6),    // notebook (takes all remaining space)
                Constraint::Length(1), // status bar
            ])
            .split(area);

        Self {
            tabs_area: chunks[0],
            notebook_area: chunks[1],
            status_area: chunks[2],
        }
    }
}

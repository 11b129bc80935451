//! UI / rendering layer — everything that touches Ratatui widgets.
//!
//! This layer takes the *core* data structures and turns them into cells on
//! the terminal.  No filesystem I/O happens here; page images arrive already
//! decoded.

pub mod focus;
pub mod halfblock;
pub mod layout;
pub mod notebook;
pub mod popup;
pub mod spinner;
pub mod status;
pub mod tabs;
pub mod theme;

//! Input handling — maps key/mouse events to state mutations.
//!
//! Notebook input never moves the page directly: wheel and drag samples go
//! through [`InputScaling`](crate::core::input::InputScaling) into
//! `apply_delta`, paging keys become engine steps, and tab clicks become
//! animated jumps.

use std::time::Instant;

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use tracing::{debug, warn};

use crate::config::{Action, KeyBind};
use crate::core::error::EngineError;
use crate::core::input::{InputDelta, InputEvent, KeyDirection};
use crate::ui::focus::FocusHitZones;

use super::settings::{SettingsItem, SETTINGS_ITEMS};
use super::state::{ActiveView, AppState};

/// Total selectable rows in the controls submenu (actions + "Reset").
pub fn controls_item_count() -> usize {
    Action::ALL.len() + 1
}

/// Process a key event, dispatching based on the active view.
pub fn handle_key(state: &mut AppState, key: KeyEvent, now: Instant) {
    // Ctrl+c always quits, regardless of view.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    match state.active_view {
        ActiveView::Notebook => handle_notebook_key(state, key, now),
        ActiveView::Focus => handle_focus_key(state, key, now),
        ActiveView::SettingsMenu => handle_settings_key(state, key),
        ActiveView::ControlsSubmenu => {
            if state.awaiting_rebind {
                handle_rebind_key(state, key);
            } else {
                handle_controls_key(state, key);
            }
        }
    }
}

// ── Notebook (configurable bindings) ────────────────────────────

fn handle_notebook_key(state: &mut AppState, key: KeyEvent, now: Instant) {
    // Chapter shortcuts are fixed: 1-9.
    if let KeyCode::Char(c @ '1'..='9') = key.code {
        if key.modifiers.difference(KeyModifiers::SHIFT).is_empty() {
            let index = c as usize - '1' as usize;
            jump_to_chapter(state, index, now);
            return;
        }
    }

    let Some(action) = state.config.match_key(key) else {
        return;
    };
    state.status_message = None;
    match action {
        Action::FlipForward => flip(state, KeyDirection::Forward, now),
        Action::FlipBack => flip(state, KeyDirection::Backward, now),
        Action::FirstPage => {
            let result = state.engine.jump_to(0, now);
            report(state, result);
        }
        Action::LastPage => {
            let last = state.portfolio.len().saturating_sub(1) as i64;
            let result = state.engine.jump_to(last, now);
            report(state, result);
        }
        Action::Focus => open_focus(state),
        Action::ToggleLoop => {
            let enabled = !state.config.flip.loop_mode;
            state.config.flip.loop_mode = enabled;
            state.status_message = Some(format!("Loop mode {}", if enabled { "on" } else { "off" }));
            state.save_config();
            state.apply_flip_settings(now);
        }
        Action::OpenSettings => {
            state.active_view = ActiveView::SettingsMenu;
            state.settings_selected = 0;
        }
        Action::Quit => state.should_quit = true,
    }
}

/// One discrete page step.
fn flip(state: &mut AppState, direction: KeyDirection, now: Instant) {
    match state.scaling.translate(InputEvent::Key(direction)) {
        InputDelta::Step(n) => {
            let direction = if n >= 0 {
                KeyDirection::Forward
            } else {
                KeyDirection::Backward
            };
            let result = state.engine.step(direction, now);
            report(state, result);
        }
        InputDelta::Scroll(delta) => {
            state.engine.apply_delta(delta, now);
        }
    }
}

/// Feed a continuous input sample to the engine.
fn scroll(state: &mut AppState, event: InputEvent, now: Instant) {
    if let InputDelta::Scroll(delta) = state.scaling.translate(event) {
        if !state.engine.apply_delta(delta, now) {
            debug!(delta, "scroll input ignored");
        }
    }
}

fn jump_to_chapter(state: &mut AppState, index: usize, now: Instant) {
    let Some(chapter) = state.portfolio.chapters.get(index) else {
        return;
    };
    let (start, title) = (chapter.start_page as i64, chapter.title.clone());
    let result = state.engine.jump_to(start, now);
    report(state, result);
    state.status_message = Some(format!("Chapter: {title}"));
}

fn report(state: &mut AppState, result: Result<(), EngineError>) {
    if let Err(err) = result {
        warn!(%err, "engine rejected request");
        state.status_message = Some(err.to_string());
    }
}

// ── Focus overlay ───────────────────────────────────────────────

fn open_focus(state: &mut AppState) {
    state.engine.pause_input();
    state.drag_row = None;
    state.active_view = ActiveView::Focus;
}

fn close_focus(state: &mut AppState) {
    state.engine.resume_input();
    state.focus_hits = None;
    state.active_view = ActiveView::Notebook;
}

fn handle_focus_key(state: &mut AppState, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('x') | KeyCode::Enter => {
            close_focus(state);
            return;
        }
        KeyCode::Left | KeyCode::Char('h') => {
            flip(state, KeyDirection::Backward, now);
            return;
        }
        KeyCode::Right | KeyCode::Char('l') => {
            flip(state, KeyDirection::Forward, now);
            return;
        }
        _ => {}
    }
    match state.config.match_key(key) {
        Some(Action::Focus) => close_focus(state),
        Some(Action::FlipForward) => flip(state, KeyDirection::Forward, now),
        Some(Action::FlipBack) => flip(state, KeyDirection::Backward, now),
        Some(Action::Quit) => state.should_quit = true,
        _ => {}
    }
}

fn handle_focus_mouse(state: &mut AppState, mouse: MouseEvent, now: Instant) {
    let MouseEventKind::Down(MouseButton::Left) = mouse.kind else {
        return;
    };
    let Some(zones) = state.focus_hits else {
        return;
    };
    let (col, row) = (mouse.column, mouse.row);
    if FocusHitZones::contains(zones.close_rect, col, row) {
        close_focus(state);
    } else if FocusHitZones::contains(zones.prev_rect, col, row) {
        flip(state, KeyDirection::Backward, now);
    } else if FocusHitZones::contains(zones.next_rect, col, row) {
        flip(state, KeyDirection::Forward, now);
    }
}

// ── Settings menu (hardcoded keys) ──────────────────────────────

fn handle_settings_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            state.active_view = ActiveView::Notebook;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.settings_selected = state.settings_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.settings_selected + 1 < SETTINGS_ITEMS.len() {
                state.settings_selected += 1;
            }
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
            if let Some(item) = SETTINGS_ITEMS.get(state.settings_selected) {
                match item {
                    SettingsItem::Submenu { view, .. } => {
                        state.active_view = *view;
                        state.controls_selected = 0;
                    }
                    SettingsItem::Toggle { get, set, .. } => {
                        let current = get(state);
                        set(state, !current);
                    }
                    SettingsItem::Cycle { cycle, .. } => cycle(state),
                }
            }
        }
        _ => {}
    }
}

// ── Controls submenu (hardcoded navigation, interactive rebinding) ──

fn handle_controls_key(state: &mut AppState, key: KeyEvent) {
    let item_count = controls_item_count();

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            state.active_view = ActiveView::Notebook;
        }
        KeyCode::Left | KeyCode::Char('h') => {
            state.active_view = ActiveView::SettingsMenu;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.controls_selected = state.controls_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.controls_selected + 1 < item_count {
                state.controls_selected += 1;
            }
        }
        KeyCode::Enter => {
            if state.controls_selected < Action::ALL.len() {
                state.awaiting_rebind = true;
            } else {
                state.config.reset_defaults();
                state.save_config();
                state.status_message = Some("Key bindings reset".into());
            }
        }
        KeyCode::Delete | KeyCode::Backspace => {
            if let Some(&action) = Action::ALL.get(state.controls_selected) {
                state.config.bindings.insert(action, Vec::new());
                state.save_config();
            }
        }
        _ => {}
    }
}

/// Capture the next key press as a new binding.
fn handle_rebind_key(state: &mut AppState, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    // Esc cancels rebinding.
    if key.code == KeyCode::Esc {
        state.awaiting_rebind = false;
        return;
    }
    // Digits are chapter shortcuts.
    if matches!(key.code, KeyCode::Char('1'..='9')) && key.modifiers.is_empty() {
        return;
    }

    let Some(&action) = Action::ALL.get(state.controls_selected) else {
        state.awaiting_rebind = false;
        return;
    };
    state.config.add_binding(action, KeyBind::from_key_event(key));
    state.save_config();
    state.awaiting_rebind = false;
}

// ── Mouse ───────────────────────────────────────────────────────

/// Process a mouse event.
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent, now: Instant) {
    match state.active_view {
        ActiveView::Focus => handle_focus_mouse(state, mouse, now),
        ActiveView::Notebook => handle_notebook_mouse(state, mouse, now),
        ActiveView::SettingsMenu | ActiveView::ControlsSubmenu => {}
    }
}

fn handle_notebook_mouse(state: &mut AppState, mouse: MouseEvent, now: Instant) {
    match mouse.kind {
        MouseEventKind::ScrollDown => scroll(state, InputEvent::Wheel { lines: 1.0 }, now),
        MouseEventKind::ScrollUp => scroll(state, InputEvent::Wheel { lines: -1.0 }, now),
        MouseEventKind::Down(MouseButton::Left) => {
            let tab = state
                .tab_hits
                .iter()
                .find(|(rect, _)| FocusHitZones::contains(*rect, mouse.column, mouse.row))
                .map(|&(_, index)| index);
            match tab {
                Some(index) => jump_to_chapter(state, index, now),
                None => state.drag_row = Some(mouse.row),
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if let Some(last) = state.drag_row {
                // Dragging upward lifts the sheet over the spine.
                let rows = f64::from(last) - f64::from(mouse.row);
                if rows != 0.0 {
                    scroll(state, InputEvent::Drag { rows }, now);
                }
            }
            state.drag_row = Some(mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => state.drag_row = None,
        MouseEventKind::Down(MouseButton::Right) => open_focus(state),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use ratatui::layout::Rect;

    use crate::config::AppConfig;
    use crate::core::content::Portfolio;
    use crate::core::momentum::Phase;

    struct Fixture {
        state: AppState,
        now: Instant,
        _dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(pages: usize) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let now = Instant::now();
            let mut state =
                AppState::new(Portfolio::sample(pages), AppConfig::default(), 0, now).unwrap();
            state.config_path = dir.path().join("config.toml");
            state.sync_scene();
            Self {
                state,
                now,
                _dir: dir,
            }
        }

        fn key(&mut self, code: KeyCode) {
            handle_key(&mut self.state, KeyEvent::new(code, KeyModifiers::NONE), self.now);
        }

        fn mouse(&mut self, kind: MouseEventKind, column: u16, row: u16) {
            let event = MouseEvent {
                kind,
                column,
                row,
                modifiers: KeyModifiers::NONE,
            };
            handle_mouse(&mut self.state, event, self.now);
        }

        /// Let every animation finish.
        fn settle(&mut self) -> f64 {
            self.now += Duration::from_secs(3);
            self.state.engine.tick(self.now);
            self.now += Duration::from_secs(3);
            self.state.engine.tick(self.now);
            self.state.engine.snapshot().unwrap().position
        }
    }

    #[test]
    fn paging_keys_step_one_page() {
        let mut f = Fixture::new(6);
        f.key(KeyCode::PageDown);
        assert_eq!(f.settle(), 1.0);
        f.key(KeyCode::Char(' '));
        f.key(KeyCode::Down);
        assert_eq!(f.settle(), 3.0);
        f.key(KeyCode::Up);
        assert_eq!(f.settle(), 2.0);
    }

    #[test]
    fn home_end_and_chapter_digits_jump() {
        let mut f = Fixture::new(6);
        f.key(KeyCode::End);
        assert_eq!(f.settle(), 5.0);
        f.key(KeyCode::Home);
        assert_eq!(f.settle(), 0.0);
        f.key(KeyCode::Char('2'));
        assert_eq!(f.settle(), 3.0);
        assert_eq!(f.state.status_message.as_deref(), Some("Chapter: second"));
        // No ninth chapter: nothing happens.
        f.key(KeyCode::Char('9'));
        assert_eq!(f.settle(), 3.0);
    }

    #[test]
    fn wheel_and_drag_feed_the_engine() {
        let mut f = Fixture::new(6);
        f.mouse(MouseEventKind::ScrollDown, 10, 10);
        assert_eq!(f.state.engine.phase(), Phase::Dragging);
        let after_wheel = f.state.engine.snapshot().unwrap().position;
        assert!(after_wheel > 0.0);

        f.now += Duration::from_millis(16);
        f.mouse(MouseEventKind::Down(MouseButton::Left), 10, 20);
        f.mouse(MouseEventKind::Drag(MouseButton::Left), 10, 17);
        let after_drag = f.state.engine.snapshot().unwrap().position;
        assert!(after_drag > after_wheel);
        f.mouse(MouseEventKind::Up(MouseButton::Left), 10, 17);
        assert_eq!(f.state.drag_row, None);
    }

    #[test]
    fn focus_pauses_scroll_but_not_paging() {
        let mut f = Fixture::new(6);
        f.key(KeyCode::Char('f'));
        assert_eq!(f.state.active_view, ActiveView::Focus);
        assert!(f.state.engine.is_input_paused());

        f.mouse(MouseEventKind::ScrollDown, 10, 10);
        assert_eq!(f.state.engine.snapshot().unwrap().position, 0.0);

        f.key(KeyCode::Right);
        assert_eq!(f.settle(), 1.0);

        f.key(KeyCode::Esc);
        assert_eq!(f.state.active_view, ActiveView::Notebook);
        assert!(!f.state.engine.is_input_paused());
    }

    #[test]
    fn focus_buttons_are_clickable() {
        let mut f = Fixture::new(6);
        f.key(KeyCode::Enter);
        f.state.focus_hits = Some(FocusHitZones {
            close_rect: Rect::new(50, 0, 3, 1),
            prev_rect: Rect::new(0, 10, 3, 1),
            next_rect: Rect::new(57, 10, 3, 1),
        });
        f.mouse(MouseEventKind::Down(MouseButton::Left), 58, 10);
        assert_eq!(f.settle(), 1.0);
        f.mouse(MouseEventKind::Down(MouseButton::Left), 51, 0);
        assert_eq!(f.state.active_view, ActiveView::Notebook);
    }

    #[test]
    fn tab_clicks_jump_to_the_chapter() {
        let mut f = Fixture::new(8);
        f.state.tab_hits = vec![(Rect::new(0, 0, 7, 1), 0), (Rect::new(8, 0, 8, 1), 1)];
        f.mouse(MouseEventKind::Down(MouseButton::Left), 9, 0);
        assert_eq!(f.settle(), 4.0);
        assert_eq!(f.state.drag_row, None);
    }

    #[test]
    fn loop_toggle_is_saved_and_applied() {
        let mut f = Fixture::new(12);
        f.key(KeyCode::Char('l'));
        assert!(f.state.config.flip.loop_mode);
        assert!(f.state.engine.mapper().enabled);
        let saved = AppConfig::load_from(&f.state.config_path);
        assert!(saved.flip.loop_mode);

        // Wraps backwards from the first page.
        f.key(KeyCode::Up);
        f.settle();
        assert_eq!(f.state.engine.snapshot().unwrap().page, 11);

        // Switching back folds the position into the page range.
        f.key(KeyCode::Char('l'));
        assert!(!f.state.engine.mapper().enabled);
        assert_eq!(f.settle(), 11.0);
    }

    #[test]
    fn settings_menu_toggles_and_closes() {
        let mut f = Fixture::new(6);
        f.key(KeyCode::Char('?'));
        assert_eq!(f.state.active_view, ActiveView::SettingsMenu);
        f.key(KeyCode::Down);
        f.key(KeyCode::Down);
        f.key(KeyCode::Enter); // Page Shadows
        assert!(!f.state.config.flip.shadows);
        assert!(!f.state.pipeline.transform().effects.shadow);
        f.key(KeyCode::Esc);
        assert_eq!(f.state.active_view, ActiveView::Notebook);
    }

    #[test]
    fn rebinding_flow() {
        let mut f = Fixture::new(6);
        f.key(KeyCode::Char('?'));
        f.key(KeyCode::Enter); // Controls
        assert_eq!(f.state.active_view, ActiveView::ControlsSubmenu);

        f.key(KeyCode::Enter);
        assert!(f.state.awaiting_rebind);
        f.key(KeyCode::Esc);
        assert!(!f.state.awaiting_rebind);

        f.key(KeyCode::Enter);
        f.key(KeyCode::Char('n'));
        assert!(!f.state.awaiting_rebind);
        let n = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE);
        assert_eq!(f.state.config.match_key(n), Some(Action::FlipForward));

        // Reset sits after the last action.
        for _ in 0..Action::ALL.len() {
            f.key(KeyCode::Down);
        }
        f.key(KeyCode::Enter);
        assert_eq!(f.state.config.match_key(n), None);
    }

    #[test]
    fn ctrl_c_quits_from_anywhere() {
        let mut f = Fixture::new(3);
        f.key(KeyCode::Char('?'));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        handle_key(&mut f.state, ctrl_c, f.now);
        assert!(f.state.should_quit);
    }
}

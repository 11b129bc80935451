//! User configuration — keybindings, flip settings and persistence.
//!
//! Everything is stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/ringbook/config.toml` (default `~/.config/ringbook/config.toml`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::engine::FlipConfig;
use crate::core::input::DeviceClass;
use crate::core::math::Easing;

// ───────────────────────────────────────── actions ───────────

/// All configurable user actions in the notebook view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    FlipForward,
    FlipBack,
    FirstPage,
    LastPage,
    Focus,
    ToggleLoop,
    OpenSettings,
    Quit,
}

impl Action {
    /// Ordered list of all actions (used for the controls menu).
    pub const ALL: &[Action] = &[
        Action::FlipForward,
        Action::FlipBack,
        Action::FirstPage,
        Action::LastPage,
        Action::Focus,
        Action::ToggleLoop,
        Action::OpenSettings,
        Action::Quit,
    ];

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Action::FlipForward => "Next Page",
            Action::FlipBack => "Previous Page",
            Action::FirstPage => "First Page",
            Action::LastPage => "Last Page",
            Action::Focus => "Focus Page",
            Action::ToggleLoop => "Toggle Loop",
            Action::OpenSettings => "Open Settings",
            Action::Quit => "Quit",
        }
    }

    /// Key used in the config file.
    fn config_key(self) -> &'static str {
        match self {
            Action::FlipForward => "flip_forward",
            Action::FlipBack => "flip_back",
            Action::FirstPage => "first_page",
            Action::LastPage => "last_page",
            Action::Focus => "focus",
            Action::ToggleLoop => "toggle_loop",
            Action::OpenSettings => "open_settings",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding — key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Does this binding match a key event?  Only CTRL/ALT/SHIFT modifiers
    /// are compared (platform-specific modifiers like SUPER are ignored).
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// Create a binding from a raw key event (used during rebinding).
    pub fn from_key_event(event: KeyEvent) -> Self {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        Self {
            code: event.code,
            modifiers: event.modifiers & mask,
        }
    }

    fn modifier_prefix(&self) -> String {
        let mut s = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("Ctrl+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("Alt+");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            s.push_str("Shift+");
        }
        s
    }

    /// User-friendly display string (e.g. `"PgDn"`, `"Ctrl+c"`, `"↓"`).
    pub fn display(&self) -> String {
        let key = match self.code {
            KeyCode::Up => "↑".into(),
            KeyCode::Down => "↓".into(),
            KeyCode::Left => "←".into(),
            KeyCode::Right => "→".into(),
            KeyCode::Backspace => "Bksp".into(),
            KeyCode::Delete => "Del".into(),
            KeyCode::PageUp => "PgUp".into(),
            KeyCode::PageDown => "PgDn".into(),
            _ => self.key_name(),
        };
        self.modifier_prefix() + &key
    }

    /// Serialise to config-file format (e.g. `"PageDown"`, `"Ctrl+c"`).
    fn to_config_string(&self) -> String {
        self.modifier_prefix() + &self.key_name()
    }

    fn key_name(&self) -> String {
        match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "Up".into(),
            KeyCode::Down => "Down".into(),
            KeyCode::Left => "Left".into(),
            KeyCode::Right => "Right".into(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Esc => "Esc".into(),
            KeyCode::Tab => "Tab".into(),
            KeyCode::Backspace => "Backspace".into(),
            KeyCode::Delete => "Delete".into(),
            KeyCode::Home => "Home".into(),
            KeyCode::End => "End".into(),
            KeyCode::PageUp => "PageUp".into(),
            KeyCode::PageDown => "PageDown".into(),
            KeyCode::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        }
    }

    /// Parse a key string like `"Ctrl+c"`, `"Shift+Down"`, `"j"`, `"Space"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').collect();
        let key_part = parts.last()?;

        for &part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backspace" | "bksp" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            s if s.starts_with('f') && s.len() > 1 => {
                let n: u8 = s[1..].parse().ok()?;
                KeyCode::F(n)
            }
            // Keep the original case for single characters ("G" vs "g").
            _ if key_part.chars().count() == 1 => KeyCode::Char(key_part.chars().next()?),
            _ => return None,
        };

        Some(KeyBind { code, modifiers })
    }
}

// ───────────────────────────────────────── flip settings ─────

/// Allowed sensitivity steps (also the settings-menu cycle).
pub const SENSITIVITY_STEPS: &[f64] = &[0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

/// Allowed full-flip angles.
pub const MAX_ANGLES: &[f64] = &[180.0, 270.0];

/// User-facing subset of [`FlipConfig`] that is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FlipSettings {
    pub sensitivity: f64,
    pub loop_mode: bool,
    pub max_angle: f64,
    pub shadows: bool,
    pub motion_blur: bool,
    pub perspective_compensation: bool,
    pub snap_easing: Easing,
    pub device: DeviceClass,
}

impl Default for FlipSettings {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            loop_mode: false,
            max_angle: 180.0,
            shadows: true,
            motion_blur: true,
            perspective_compensation: false,
            snap_easing: Easing::CubicOut,
            device: DeviceClass::Desktop,
        }
    }
}

impl FlipSettings {
    /// Engine configuration for these settings.
    pub fn flip_config(&self) -> FlipConfig {
        let mut cfg = FlipConfig::for_device(self.device);
        cfg.sensitivity = self.sensitivity;
        cfg.loop_mode = self.loop_mode;
        cfg.snap_easing = self.snap_easing;
        cfg.transform.max_angle = self.max_angle;
        cfg.transform.effects.shadow = self.shadows;
        cfg.transform.effects.blur = self.motion_blur;
        cfg.transform.compensate_perspective = self.perspective_compensation;
        cfg
    }

    /// Apply one `key = value` line.  Returns `false` for unknown keys.
    fn apply(&mut self, key: &str, value: &str) -> bool {
        match key {
            "sensitivity" => {
                if let Ok(v) = value.parse::<f64>() {
                    if v.is_finite() {
                        self.sensitivity = v.clamp(0.1, 5.0);
                    }
                }
            }
            "loop_mode" => self.loop_mode = value == "true",
            "max_angle" => {
                if let Ok(v) = value.parse::<f64>() {
                    if v.is_finite() {
                        self.max_angle = v.clamp(180.0, 270.0);
                    }
                }
            }
            "shadows" => self.shadows = value == "true",
            "motion_blur" => self.motion_blur = value == "true",
            "perspective_compensation" => self.perspective_compensation = value == "true",
            "snap_easing" => {
                if let Some(e) = Easing::from_config_key(value) {
                    self.snap_easing = e;
                }
            }
            "device" => {
                if let Some(d) = DeviceClass::from_config_key(value) {
                    self.device = d;
                }
            }
            _ => return false,
        }
        true
    }

    fn serialise_into(&self, lines: &mut Vec<String>) {
        lines.push(format!("sensitivity = {}", self.sensitivity));
        lines.push(format!("loop_mode = {}", self.loop_mode));
        lines.push(format!("max_angle = {}", self.max_angle));
        lines.push(format!("shadows = {}", self.shadows));
        lines.push(format!("motion_blur = {}", self.motion_blur));
        lines.push(format!(
            "perspective_compensation = {}",
            self.perspective_compensation
        ));
        lines.push(format!("snap_easing = {}", self.snap_easing.config_key()));
        lines.push(format!("device = {}", self.device.config_key()));
    }
}

// ───────────────────────────────────────── config ────────────

/// Application configuration — keybindings and flip settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    pub flip: FlipSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bindings: Self::default_bindings(),
            flip: FlipSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(
            FlipForward,
            vec![
                KeyBind::new(Down, n),
                KeyBind::new(Char('j'), n),
                KeyBind::new(PageDown, n),
                KeyBind::new(Char(' '), n),
            ],
        );
        m.insert(
            FlipBack,
            vec![
                KeyBind::new(Up, n),
                KeyBind::new(Char('k'), n),
                KeyBind::new(PageUp, n),
            ],
        );
        m.insert(FirstPage, vec![KeyBind::new(Home, n)]);
        m.insert(LastPage, vec![KeyBind::new(End, n)]);
        m.insert(Focus, vec![KeyBind::new(Char('f'), n), KeyBind::new(Enter, n)]);
        m.insert(ToggleLoop, vec![KeyBind::new(Char('l'), n)]);
        m.insert(OpenSettings, vec![KeyBind::new(Char('?'), n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n)]);

        m
    }

    /// Find the action that matches a key event.  When multiple bindings
    /// match, the one with the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<Action> = None;
        let mut best_mod_count = 0;

        for (&action, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.is_none() || mc > best_mod_count {
                        best = Some(action);
                        best_mod_count = mc;
                    }
                }
            }
        }
        best
    }

    /// Add a binding for `action`, taking the key away from any other action.
    pub fn add_binding(&mut self, action: Action, bind: KeyBind) {
        for binds in self.bindings.values_mut() {
            binds.retain(|b| b != &bind);
        }
        self.bindings.entry(action).or_default().push(bind);
    }

    pub fn reset_defaults(&mut self) {
        self.bindings = Self::default_bindings();
    }

    /// Format the binding list for a given action (e.g. `"↓/j/PgDn"`).
    pub fn display_bindings(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => {
                binds.iter().map(|b| b.display()).collect::<Vec<_>>().join("/")
            }
            _ => "unbound".into(),
        }
    }

    fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].display(),
            _ => "?".into(),
        }
    }

    /// Key hints for the status bar.
    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}/{}: flip | {}: focus | 1-9: chapter | {}: settings",
            self.short_binding(Action::FlipForward),
            self.short_binding(Action::FlipBack),
            self.short_binding(Action::Focus),
            self.short_binding(Action::OpenSettings),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from disk, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse_config(&contents),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(path, self.serialise())
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    fn parse_config(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            if config.flip.apply(key, value) {
                continue;
            }

            let Some(action) = Action::from_config_key(key) else {
                continue;
            };
            let parsed: Vec<KeyBind> = value
                .split(',')
                .filter_map(|part| KeyBind::parse(part.trim().trim_matches('"')))
                .collect();
            if !parsed.is_empty() {
                config.bindings.insert(action, parsed);
            }
        }

        config
    }

    fn serialise(&self) -> String {
        let mut lines = vec![
            "# ringbook configuration".to_string(),
            String::new(),
            "# Flip settings".to_string(),
        ];
        self.flip.serialise_into(&mut lines);
        lines.extend([
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            "# Special keys: Up, Down, Left, Right, Enter, Esc, Tab,".to_string(),
            "#   Backspace, Delete, Home, End, PageUp, PageDown, Space, F1-F12".to_string(),
            String::new(),
        ]);

        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                let keys: Vec<String> = binds.iter().map(|b| b.to_config_string()).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/ringbook/config.toml`).
pub fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("ringbook").join("config.toml")
}

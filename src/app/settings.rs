//! Settings menu model (data only).
//!
//! Keeping these definitions outside the input handler lets both the handler
//! and UI renderers consume the same source of truth without cross-importing.
//! Every change is persisted and pushed into the engine right away.

use std::time::Instant;

use super::state::{ActiveView, AppState};
use crate::config::{MAX_ANGLES, SENSITIVITY_STEPS};
use crate::core::input::DeviceClass;
use crate::core::math::Easing;

/// A single item in the settings menu.
pub enum SettingsItem {
    /// Opens a submenu.
    Submenu {
        label: &'static str,
        view: ActiveView,
    },
    /// Boolean toggle — reads/writes via accessors on `AppState`.
    Toggle {
        label: &'static str,
        get: fn(&AppState) -> bool,
        set: fn(&mut AppState, bool),
    },
    /// Cycles through a finite set of values.
    Cycle {
        label: &'static str,
        value: fn(&AppState) -> String,
        cycle: fn(&mut AppState),
    },
}

impl SettingsItem {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Submenu { label, .. }
            | Self::Toggle { label, .. }
            | Self::Cycle { label, .. } => label,
        }
    }
}

/// Save, then hand the new values to the engine.
/// Failures overwrite `message` in the status bar.
fn commit(s: &mut AppState, message: String) {
    s.status_message = Some(message);
    s.save_config();
    s.apply_flip_settings(Instant::now());
}

/// Entry after `current` in `steps`, wrapping around.
fn next_step(steps: &[f64], current: f64) -> f64 {
    let idx = steps
        .iter()
        .position(|v| (v - current).abs() < 1e-9)
        .map_or(0, |i| (i + 1) % steps.len());
    steps[idx]
}

/// All items shown in the settings popup, in display order.
pub static SETTINGS_ITEMS: &[SettingsItem] = &[
    SettingsItem::Submenu {
        label: "Controls",
        view: ActiveView::ControlsSubmenu,
    },
    SettingsItem::Toggle {
        label: "Loop Pages",
        get: |s| s.config.flip.loop_mode,
        set: |s, v| {
            s.config.flip.loop_mode = v;
            commit(s, format!("Loop mode {}", if v { "on" } else { "off" }));
        },
    },
    SettingsItem::Toggle {
        label: "Page Shadows",
        get: |s| s.config.flip.shadows,
        set: |s, v| {
            s.config.flip.shadows = v;
            commit(s, format!("Shadows {}", if v { "on" } else { "off" }));
        },
    },
    SettingsItem::Toggle {
        label: "Motion Blur",
        get: |s| s.config.flip.motion_blur,
        set: |s, v| {
            s.config.flip.motion_blur = v;
            commit(s, format!("Motion blur {}", if v { "on" } else { "off" }));
        },
    },
    SettingsItem::Toggle {
        label: "Perspective Compensation",
        get: |s| s.config.flip.perspective_compensation,
        set: |s, v| {
            s.config.flip.perspective_compensation = v;
            commit(
                s,
                format!("Perspective compensation {}", if v { "on" } else { "off" }),
            );
        },
    },
    SettingsItem::Cycle {
        label: "Sensitivity",
        value: |s| format!("{:.2}x", s.config.flip.sensitivity),
        cycle: |s| {
            let next = next_step(SENSITIVITY_STEPS, s.config.flip.sensitivity);
            s.config.flip.sensitivity = next;
            commit(s, format!("Sensitivity: {next:.2}x"));
        },
    },
    SettingsItem::Cycle {
        label: "Flip Angle",
        value: |s| format!("{}°", s.config.flip.max_angle),
        cycle: |s| {
            let next = next_step(MAX_ANGLES, s.config.flip.max_angle);
            s.config.flip.max_angle = next;
            commit(s, format!("Flip angle: {next}°"));
        },
    },
    SettingsItem::Cycle {
        label: "Snap Easing",
        value: |s| s.config.flip.snap_easing.label().to_string(),
        cycle: |s| {
            let idx = Easing::ALL
                .iter()
                .position(|e| *e == s.config.flip.snap_easing)
                .unwrap_or(0);
            let next = Easing::ALL[(idx + 1) % Easing::ALL.len()];
            s.config.flip.snap_easing = next;
            commit(s, format!("Snap easing: {}", next.label()));
        },
    },
    SettingsItem::Cycle {
        label: "Input Device",
        value: |s| s.config.flip.device.label().to_string(),
        cycle: |s| {
            let idx = DeviceClass::ALL
                .iter()
                .position(|d| *d == s.config.flip.device)
                .unwrap_or(0);
            let next = DeviceClass::ALL[(idx + 1) % DeviceClass::ALL.len()];
            s.config.flip.device = next;
            commit(s, format!("Input device: {}", next.label()));
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_cycle_and_recover_from_unknown_values() {
        assert_eq!(next_step(MAX_ANGLES, 180.0), 270.0);
        assert_eq!(next_step(MAX_ANGLES, 270.0), 180.0);
        assert_eq!(next_step(SENSITIVITY_STEPS, 2.0), 0.5);
        // A hand-edited value that is not in the list restarts the cycle.
        assert_eq!(next_step(SENSITIVITY_STEPS, 1.1), 0.5);
    }

    #[test]
    fn controls_submenu_comes_first() {
        assert!(matches!(
            SETTINGS_ITEMS[0],
            SettingsItem::Submenu {
                view: ActiveView::ControlsSubmenu,
                ..
            }
        ));
        assert!(SETTINGS_ITEMS.iter().all(|item| !item.label().is_empty()));
    }
}

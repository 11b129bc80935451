//! Raw input → scroll deltas.
//!
//! The terminal layer reports wheel notches, dragged rows and key presses;
//! this module turns them into position deltas (in pages) with device-class
//! aware scaling, so the engine never sees host-specific units.

/// Broad class of the input device, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceClass {
    #[default]
    Desktop,
    /// Touch-like input (trackpads, drag gestures): finer deltas, longer
    /// glides.
    Touch,
}

impl DeviceClass {
    pub const ALL: &[DeviceClass] = &[DeviceClass::Desktop, DeviceClass::Touch];

    pub fn label(self) -> &'static str {
        match self {
            DeviceClass::Desktop => "Desktop",
            DeviceClass::Touch => "Touch",
        }
    }

    pub fn config_key(self) -> &'static str {
        match self {
            DeviceClass::Desktop => "desktop",
            DeviceClass::Touch => "touch",
        }
    }

    pub fn from_config_key(s: &str) -> Option<Self> {
        match s {
            "desktop" => Some(DeviceClass::Desktop),
            "touch" | "mobile" => Some(DeviceClass::Touch),
            _ => None,
        }
    }
}

/// Direction of a discrete paging key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    Forward,
    Backward,
}

/// One raw input sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Wheel notches; positive = scroll down = flip forward.
    Wheel { lines: f64 },
    /// Rows dragged since the previous sample; positive = dragged upward,
    /// which lifts the sheet over the spine (forward).
    Drag { rows: f64 },
    Key(KeyDirection),
}

/// What the engine should do with an input sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputDelta {
    /// Continuous position change, in pages (before engine sensitivity).
    Scroll(f64),
    /// Discrete page step (±1).
    Step(i64),
}

/// Device-dependent conversion factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputScaling {
    /// Pages per wheel notch.
    pub pages_per_line: f64,
    /// Pages per terminal row dragged.
    pub pages_per_row: f64,
}

impl InputScaling {
    pub fn for_device(device: DeviceClass) -> Self {
        match device {
            DeviceClass::Desktop => Self {
                pages_per_line: 0.2,
                pages_per_row: 0.08,
            },
            DeviceClass::Touch => Self {
                pages_per_line: 0.12,
                pages_per_row: 0.06,
            },
        }
    }

    pub fn translate(&self, event: InputEvent) -> InputDelta {
        match event {
            InputEvent::Wheel { lines } => InputDelta::Scroll(lines * self.pages_per_line),
            InputEvent::Drag { rows } => InputDelta::Scroll(rows * self.pages_per_row),
            InputEvent::Key(KeyDirection::Forward) => InputDelta::Step(1),
            InputEvent::Key(KeyDirection::Backward) => InputDelta::Step(-1),
        }
    }
}

impl Default for InputScaling {
    fn default() -> Self {
        Self::for_device(DeviceClass::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_and_drag_scale_per_device() {
        let desktop = InputScaling::for_device(DeviceClass::Desktop);
        let touch = InputScaling::for_device(DeviceClass::Touch);

        let InputDelta::Scroll(d) = desktop.translate(InputEvent::Wheel { lines: 2.0 }) else {
            panic!("wheel should scroll");
        };
        assert!((d - 0.4).abs() < 1e-12);

        let InputDelta::Scroll(t) = touch.translate(InputEvent::Wheel { lines: 2.0 }) else {
            panic!("wheel should scroll");
        };
        assert!(t < d, "touch wheel is finer than desktop");

        let InputDelta::Scroll(drag) = desktop.translate(InputEvent::Drag { rows: -10.0 }) else {
            panic!("drag should scroll");
        };
        assert!((drag + 0.8).abs() < 1e-12);
    }

    #[test]
    fn keys_become_unit_steps() {
        let s = InputScaling::default();
        assert_eq!(s.translate(InputEvent::Key(KeyDirection::Forward)), InputDelta::Step(1));
        assert_eq!(s.translate(InputEvent::Key(KeyDirection::Backward)), InputDelta::Step(-1));
    }

    #[test]
    fn device_keys_parse() {
        assert_eq!(DeviceClass::from_config_key("mobile"), Some(DeviceClass::Touch));
        for &d in DeviceClass::ALL {
            assert_eq!(DeviceClass::from_config_key(d.config_key()), Some(d));
        }
    }
}

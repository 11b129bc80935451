//! Error types for the core.
//!
//! Only initialisation-time misuse produces errors.  Steady-state input
//! (out-of-range jumps, flicks past the last page, overlapping animations)
//! is clamped or cancelled instead.

use thiserror::Error;

/// Misuse of the scroll engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A state query or navigation request arrived before `set_total_pages`.
    #[error("scroll engine used before the page count was set")]
    NotInitialized,
    /// The content loader reported an empty notebook.
    #[error("a notebook needs at least one page")]
    NoPages,
}

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_angle must be between 180 and 270 degrees, got {0}")]
    MaxAngle(f64),
    #[error("{field} must be a finite value >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("visible_depth must be at least 1")]
    ZeroVisibleDepth,
}

/// Check that `value` is finite and not negative.
pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

/// Check that `value` lies in `[min, max]`.
pub(crate) fn within(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

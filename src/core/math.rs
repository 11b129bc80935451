//! Scalar helpers and easing curves shared by the engine and the transform
//! calculator.
//!
//! Everything here is a pure function of its arguments.

use std::f64::consts::PI;

// ───────────────────────────────────────── scalar ────────────

/// Clamp `v` into `[lo, hi]`.  A NaN input collapses to `lo` so callers never
/// propagate NaN into positions or transforms.
pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() {
        return lo;
    }
    v.max(lo).min(hi)
}

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Where `v` sits between `a` and `b` (0 at `a`, 1 at `b`).  A zero-width
/// range reports 0.
pub fn inverse_lerp(a: f64, b: f64, v: f64) -> f64 {
    let span = b - a;
    if span.abs() < f64::EPSILON {
        0.0
    } else {
        (v - a) / span
    }
}

/// Map `v` from `[in_min, in_max]` onto `[out_min, out_max]` (unclamped).
pub fn map_range(v: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    lerp(out_min, out_max, inverse_lerp(in_min, in_max, v))
}

/// Like [`map_range`] but the result never leaves the output range.
pub fn map_range_clamped(v: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    lerp(out_min, out_max, clamp(inverse_lerp(in_min, in_max, v), 0.0, 1.0))
}

// ───────────────────────────────────────── easing ────────────

/// Angular frequency of the [`Easing::Spring`] curve.  Large enough that the
/// spring has visibly settled well before `t = 1`.
const SPRING_OMEGA: f64 = 9.0;

/// Easing curves used by the snap and jump tweens.
///
/// Every curve maps 0 → 0 and 1 → 1 and is non-decreasing, so a tween
/// towards a forward target never moves backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Easing {
    Linear,
    CubicIn,
    #[default]
    CubicOut,
    CubicInOut,
    ExpoInOut,
    /// Critically damped spring, normalised to land exactly on 1.
    Spring,
}

impl Easing {
    /// Ordered list of all curves (used by the settings cycle).
    pub const ALL: &[Easing] = &[
        Easing::Linear,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::ExpoInOut,
        Easing::Spring,
    ];

    /// Evaluate the curve at `t` (clamped to `[0, 1]`).
    pub fn apply(self, t: f64) -> f64 {
        let t = clamp(t, 0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => {
                let u = 1.0 - t;
                1.0 - u * u * u
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u * u / 2.0
                }
            }
            Easing::ExpoInOut => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Easing::Spring => damped_spring(t, SPRING_OMEGA),
        }
    }

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Easing::Linear => "Linear",
            Easing::CubicIn => "Cubic In",
            Easing::CubicOut => "Cubic Out",
            Easing::CubicInOut => "Cubic In-Out",
            Easing::ExpoInOut => "Expo In-Out",
            Easing::Spring => "Spring",
        }
    }

    /// Key used in the config file.
    pub fn config_key(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::CubicIn => "cubic-in",
            Easing::CubicOut => "cubic-out",
            Easing::CubicInOut => "cubic-in-out",
            Easing::ExpoInOut => "expo-in-out",
            Easing::Spring => "spring",
        }
    }

    pub fn from_config_key(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.config_key() == s)
    }
}

/// Critically damped spring response `1 - (1 + ωt)·e^(-ωt)`, rescaled so the
/// curve reaches exactly 1 at `t = 1`.  Critical damping never overshoots.
pub fn damped_spring(t: f64, omega: f64) -> f64 {
    let response = |t: f64| 1.0 - (1.0 + omega * t) * (-omega * t).exp();
    let end = response(1.0);
    if end <= 0.0 {
        return t;
    }
    clamp(response(clamp(t, 0.0, 1.0)) / end, 0.0, 1.0)
}

/// Half-sine arc: 0 at both ends, 1 at `t = 0.5`.  Drives the sheet lift.
pub fn arc(t: f64) -> f64 {
    (clamp(t, 0.0, 1.0) * PI).sin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_handles_nan_and_bounds() {
        assert_eq!(clamp(f64::NAN, 0.0, 1.0), 0.0);
        assert_eq!(clamp(-3.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(3.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
    }

    #[test]
    fn range_mapping() {
        assert_eq!(map_range(5.0, 0.0, 10.0, 0.0, 100.0), 50.0);
        assert_eq!(map_range(20.0, 0.0, 10.0, 0.0, 100.0), 200.0);
        assert_eq!(map_range_clamped(20.0, 0.0, 10.0, 0.0, 100.0), 100.0);
        assert_eq!(map_range_clamped(-1.0, 0.0, 10.0, 1.0, 0.0), 1.0);
        assert_eq!(inverse_lerp(3.0, 3.0, 7.0), 0.0);
    }

    #[test]
    fn every_easing_hits_both_endpoints() {
        for &e in Easing::ALL {
            assert!(e.apply(0.0).abs() < 1e-9, "{e:?} at 0");
            assert!((e.apply(1.0) - 1.0).abs() < 1e-9, "{e:?} at 1");
            assert!((e.apply(-5.0)).abs() < 1e-9, "{e:?} below range");
            assert!((e.apply(5.0) - 1.0).abs() < 1e-9, "{e:?} above range");
        }
    }

    #[test]
    fn every_easing_is_monotonic() {
        for &e in Easing::ALL {
            let mut prev = e.apply(0.0);
            for i in 1..=200 {
                let v = e.apply(i as f64 / 200.0);
                assert!(v + 1e-12 >= prev, "{e:?} decreased at step {i}");
                prev = v;
            }
        }
    }

    #[test]
    fn easing_config_keys_round_trip() {
        for &e in Easing::ALL {
            assert_eq!(Easing::from_config_key(e.config_key()), Some(e));
        }
        assert_eq!(Easing::from_config_key("bouncy"), None);
    }

    #[test]
    fn arc_peaks_in_the_middle() {
        assert!(arc(0.0).abs() < 1e-12);
        assert!(arc(1.0).abs() < 1e-12);
        assert!((arc(0.5) - 1.0).abs() < 1e-12);
    }
}

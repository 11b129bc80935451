//! Momentum & snap state machine.
//!
//! Once input goes quiet the engine must bring the position back to an
//! integer page.  This module holds the physics and the decisions; the
//! engine owns the clock and the single driver slot.
//!
//! ```text
//! Idle ──input──▶ Dragging ──quiet──▶ DecisionPending ─┬─▶ Coasting ──▶ Snapping ──▶ Idle
//!                                                       └─▶ Snapping ─────────────▶ Idle
//! ```

use std::time::{Duration, Instant};

use super::input::DeviceClass;
use super::math::{clamp, lerp, Easing};

/// Positions closer than this to an integer count as resting on it.
pub const INTEGRAL_EPSILON: f64 = 1e-6;

// ───────────────────────────────────────── config ────────────

/// Tunables for coasting and settling.  Velocities are in pages per second.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentumConfig {
    /// Exponential decay rate of coasting velocity (1/s).
    pub decay: f64,
    /// Coasting stops below this speed; below it at decision time we snap.
    pub min_velocity: f64,
    /// Input-derived velocity is capped here.
    pub max_velocity: f64,
    /// Hard wall-clock cap on a single coast.  A hard flick is still moving
    /// fast when it hits the cap; that leftover speed becomes extra pages.
    pub max_duration: Duration,
    /// Residual velocity → extra pages conversion factor.
    pub velocity_to_pages: f64,
    pub max_extra_pages: u32,
    /// Within `dead_zone_window` of a finished snap, slower input than this
    /// never coasts.
    pub dead_zone_velocity: f64,
    pub dead_zone_window: Duration,
    pub base_duration: Duration,
    /// Extra snap time per page travelled.
    pub duration_per_page: Duration,
    pub max_snap_duration: Duration,
    /// Flip progress above which a started flip always completes.
    pub commit_threshold: f64,
    /// Quiet period after the last input before settling starts.
    pub decision_delay: Duration,
    /// Inputs further apart than this start a new gesture (velocity resets).
    pub gesture_gap: Duration,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            decay: 4.0,
            min_velocity: 1.5,
            max_velocity: 40.0,
            max_duration: Duration::from_millis(400),
            velocity_to_pages: 0.25,
            max_extra_pages: 3,
            dead_zone_velocity: 3.0,
            dead_zone_window: Duration::from_millis(300),
            base_duration: Duration::from_millis(180),
            duration_per_page: Duration::from_millis(90),
            max_snap_duration: Duration::from_millis(600),
            commit_threshold: 0.05,
            decision_delay: Duration::from_millis(40),
            gesture_gap: Duration::from_millis(100),
        }
    }
}

impl MomentumConfig {
    /// Defaults adapted once for the device class.  Touch glides longer and
    /// needs a firmer flick to escape the dead zone.
    pub fn for_device(device: DeviceClass) -> Self {
        let base = Self::default();
        match device {
            DeviceClass::Desktop => base,
            DeviceClass::Touch => Self {
                decay: 2.5,
                dead_zone_velocity: 4.5,
                max_duration: Duration::from_millis(700),
                velocity_to_pages: 0.3,
                ..base
            },
        }
    }
}

// ───────────────────────────────────────── phase ─────────────

/// Lifecycle of the scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Resting on an integer page, nothing scheduled.
    #[default]
    Idle,
    /// Input is actively moving the position.
    Dragging,
    /// Input stopped; waiting out the quiet period.
    DecisionPending,
    /// Momentum driver running.
    Coasting,
    /// Eased tween towards an integer page.
    Snapping,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Dragging => "dragging",
            Phase::DecisionPending => "settling",
            Phase::Coasting => "coasting",
            Phase::Snapping => "snapping",
        }
    }
}

/// Outcome of the quiet-period decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    Coast,
    Snap,
}

/// Decide between coasting and snapping once input has stopped.
///
/// `since_last_snap` is the time since the previous settle finished, if any.
pub fn decide(velocity: f64, since_last_snap: Option<Duration>, cfg: &MomentumConfig) -> Settle {
    let speed = velocity.abs();
    if !speed.is_finite() {
        return Settle::Snap;
    }
    let in_dead_zone = since_last_snap.is_some_and(|d| d < cfg.dead_zone_window);
    if in_dead_zone {
        if speed > 2.0 * cfg.dead_zone_velocity {
            return Settle::Coast;
        }
        if speed < cfg.dead_zone_velocity {
            return Settle::Snap;
        }
    }
    if speed >= cfg.min_velocity {
        Settle::Coast
    } else {
        Settle::Snap
    }
}

// ───────────────────────────────────────── targets ───────────

fn settle_noise(position: f64) -> f64 {
    let r = position.round();
    if (position - r).abs() < INTEGRAL_EPSILON {
        r
    } else {
        position
    }
}

/// Target of a direct snap: a flip that has visibly started completes,
/// anything below the commit threshold falls back.
pub fn snap_target(position: f64, cfg: &MomentumConfig) -> f64 {
    let position = settle_noise(position);
    let floor = position.floor();
    if position - floor > cfg.commit_threshold {
        position.ceil()
    } else {
        floor
    }
}

/// Target of a direct snap after a backward gesture: the sheet being turned
/// back commits once it has moved more than the threshold off its boundary.
pub fn snap_back_target(position: f64, cfg: &MomentumConfig) -> f64 {
    let position = settle_noise(position);
    let ceil = position.ceil();
    if ceil - position > cfg.commit_threshold {
        position.floor()
    } else {
        ceil
    }
}

/// Target after a coast: the next boundary in the direction of travel plus
/// extra pages from the residual velocity.  The caller clamps to the page
/// range.
pub fn momentum_target(position: f64, velocity: f64, cfg: &MomentumConfig) -> f64 {
    let position = settle_noise(position);
    let base = if velocity >= 0.0 {
        position.ceil()
    } else {
        position.floor()
    };
    let max = f64::from(cfg.max_extra_pages);
    let extra = clamp((velocity * cfg.velocity_to_pages).round(), -max, max);
    base + extra
}

/// Snap duration grows with distance, up to the cap.
pub fn snap_duration(distance: f64, cfg: &MomentumConfig) -> Duration {
    let pages = clamp(distance.abs(), 0.0, 1_000.0);
    let scaled = cfg.base_duration + cfg.duration_per_page.mul_f64(pages);
    scaled.min(cfg.max_snap_duration)
}

// ───────────────────────────────────────── coast ─────────────

/// One frame of coasting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoastStep {
    Advance(f64),
    /// Last movement of the coast plus the velocity left over.
    Finished { delta: f64, residual: f64 },
}

/// Exponentially decaying glide.
#[derive(Debug, Clone, PartialEq)]
pub struct Coast {
    velocity: f64,
    started: Instant,
    last: Instant,
}

impl Coast {
    pub fn new(velocity: f64, now: Instant) -> Self {
        Self {
            velocity,
            started: now,
            last: now,
        }
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn step(&mut self, now: Instant, cfg: &MomentumConfig) -> CoastStep {
        let dt = now.saturating_duration_since(self.last).as_secs_f64();
        self.last = now;
        self.velocity *= (-cfg.decay * dt).exp();
        let delta = self.velocity * dt;

        let elapsed = now.saturating_duration_since(self.started);
        if self.velocity.abs() < cfg.min_velocity || elapsed >= cfg.max_duration {
            CoastStep::Finished {
                delta,
                residual: self.velocity,
            }
        } else {
            CoastStep::Advance(delta)
        }
    }
}

// ───────────────────────────────────────── tween ─────────────

/// Fixed-duration eased move between two positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    start: Instant,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    pub fn new(from: f64, to: f64, start: Instant, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            easing,
        }
    }

    pub fn is_done(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= self.duration
    }

    pub fn sample(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        let t = elapsed / self.duration.as_secs_f64();
        lerp(self.from, self.to, self.easing.apply(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn slow_release_snaps_fast_release_coasts() {
        let cfg = MomentumConfig::default();
        assert_eq!(decide(0.5, None, &cfg), Settle::Snap);
        assert_eq!(decide(-8.0, None, &cfg), Settle::Coast);
        assert_eq!(decide(f64::NAN, None, &cfg), Settle::Snap);
    }

    #[test]
    fn dead_zone_forces_snap_after_recent_settle() {
        let cfg = MomentumConfig::default();
        // Fast enough to coast normally, but below the dead-zone speed.
        let v = 2.5;
        assert_eq!(decide(v, None, &cfg), Settle::Coast);
        assert_eq!(decide(v, Some(ms(100)), &cfg), Settle::Snap);
        // Window elapsed.
        assert_eq!(decide(v, Some(ms(400)), &cfg), Settle::Coast);
        // Clear intent overrides the dead zone.
        assert_eq!(decide(7.0, Some(ms(100)), &cfg), Settle::Coast);
    }

    #[test]
    fn started_flip_commits_forward() {
        let cfg = MomentumConfig::default();
        assert_eq!(snap_target(0.6, &cfg), 1.0);
        assert_eq!(snap_target(2.06, &cfg), 3.0);
        assert_eq!(snap_target(0.02, &cfg), 0.0);
        assert_eq!(snap_target(4.0, &cfg), 4.0);
        // Float noise just above an integer does not count as a started flip.
        assert_eq!(snap_target(3.000_000_000_1, &cfg), 3.0);
    }

    #[test]
    fn started_back_flip_commits_backward() {
        let cfg = MomentumConfig::default();
        assert_eq!(snap_back_target(0.4, &cfg), 0.0);
        assert_eq!(snap_back_target(2.98, &cfg), 3.0);
        assert_eq!(snap_back_target(-0.6, &cfg), -1.0);
        assert_eq!(snap_back_target(4.0, &cfg), 4.0);
    }

    #[test]
    fn momentum_target_adds_clamped_extra_pages() {
        let cfg = MomentumConfig::default();
        // 8 pages/s * 0.25 = 2 extra pages past the next boundary.
        assert_eq!(momentum_target(3.4, 8.0, &cfg), 6.0);
        // Capped at max_extra_pages.
        assert_eq!(momentum_target(3.4, 100.0, &cfg), 7.0);
        // Backwards travel rounds to the lower boundary.
        assert_eq!(momentum_target(3.4, -8.0, &cfg), 1.0);
        assert_eq!(momentum_target(3.4, -100.0, &cfg), 0.0);
    }

    #[test]
    fn snap_duration_scales_and_caps() {
        let cfg = MomentumConfig::default();
        assert_eq!(snap_duration(0.0, &cfg), ms(180));
        assert_eq!(snap_duration(1.0, &cfg), ms(270));
        assert_eq!(snap_duration(50.0, &cfg), cfg.max_snap_duration);
    }

    #[test]
    fn coast_decays_and_terminates() {
        let cfg = MomentumConfig::default();
        let t0 = Instant::now();
        let mut coast = Coast::new(10.0, t0);
        let mut travelled = 0.0;
        let mut finished = false;
        for frame in 1..=200u64 {
            match coast.step(t0 + ms(16 * frame), &cfg) {
                CoastStep::Advance(d) => {
                    assert!(d > 0.0);
                    travelled += d;
                }
                CoastStep::Finished { delta, residual } => {
                    travelled += delta;
                    assert!(residual.abs() < 10.0);
                    finished = true;
                    break;
                }
            }
        }
        assert!(finished, "coast must stop within max_duration");
        assert!(travelled > 0.5);
        assert!(coast.velocity() < 10.0);
    }

    #[test]
    fn coast_respects_wall_clock_cap_even_without_decay() {
        let cfg = MomentumConfig {
            decay: 0.0,
            ..MomentumConfig::default()
        };
        let t0 = Instant::now();
        let mut coast = Coast::new(20.0, t0);
        assert!(matches!(coast.step(t0 + ms(16), &cfg), CoastStep::Advance(_)));
        assert!(matches!(
            coast.step(t0 + cfg.max_duration, &cfg),
            CoastStep::Finished { .. }
        ));
    }

    #[test]
    fn tween_samples_between_endpoints() {
        let t0 = Instant::now();
        let tween = Tween::new(1.0, 3.0, t0, ms(200), Easing::Linear);
        assert_eq!(tween.sample(t0), 1.0);
        assert!((tween.sample(t0 + ms(100)) - 2.0).abs() < 1e-9);
        assert_eq!(tween.sample(t0 + ms(500)), 3.0);
        assert!(!tween.is_done(t0 + ms(199)));
        assert!(tween.is_done(t0 + ms(200)));

        let instant = Tween::new(1.0, 3.0, t0, Duration::ZERO, Easing::CubicOut);
        assert_eq!(instant.sample(t0), 3.0);
    }

    #[test]
    fn touch_profile_glides_longer() {
        let desktop = MomentumConfig::for_device(DeviceClass::Desktop);
        let touch = MomentumConfig::for_device(DeviceClass::Touch);
        assert!(touch.decay < desktop.decay);
        assert!(touch.max_duration > desktop.max_duration);
        assert_eq!(desktop, MomentumConfig::default());
    }
}

//! Touch velocity tracking and momentum scrolling.
//!
//! After a flick, the content keeps moving: every fixed tick it advances
//! by the current velocity, which then decays geometrically until it falls
//! below a threshold.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::types::Point;

/// Momentum tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MomentumConfig {
    /// Time between momentum steps
    pub tick_ms: f64,
    /// Velocity multiplier applied after each step
    pub decay: f64,
    /// Speed (px/ms) below which momentum stops
    pub min_speed: f64,
    /// Only touch samples this recent count toward release velocity
    pub sample_window_ms: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16.0,
            decay: 0.95,
            min_speed: 0.02,
            sample_window_ms: 100.0,
        }
    }
}

/// Largest decay accepted; at 1 or above velocity never falls off
pub const MAX_DECAY: f64 = 0.999;

impl MomentumConfig {
    /// Copy with out-of-range values replaced so momentum always stops.
    ///
    /// `decay` is clamped to `[0, MAX_DECAY]`; a non-positive or non-finite
    /// tick or stop speed falls back to its default.
    pub fn bounded(self) -> Self {
        let defaults = Self::default();
        let positive = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
        Self {
            tick_ms: positive(self.tick_ms, defaults.tick_ms),
            decay: if self.decay.is_finite() {
                self.decay.clamp(0.0, MAX_DECAY)
            } else {
                defaults.decay
            },
            min_speed: positive(self.min_speed, defaults.min_speed),
            sample_window_ms: self.sample_window_ms,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    point: Point,
    time_ms: f64,
}

/// Follows one touch gesture and turns it into scroll deltas
#[derive(Debug, Clone, Default)]
pub struct TouchTracker {
    samples: VecDeque<Sample>,
}

const MAX_SAMPLES: usize = 8;

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracking(&self) -> bool {
        !self.samples.is_empty()
    }

    /// Start a gesture, discarding any previous one.
    pub fn begin(&mut self, x: f64, y: f64, time_ms: f64) {
        self.samples.clear();
        self.samples.push_back(Sample {
            point: Point::new(x, y),
            time_ms,
        });
    }

    /// Record a touch move and return the scroll delta it implies.
    ///
    /// Content follows the finger, so dragging up scrolls down.
    pub fn move_to(&mut self, x: f64, y: f64, time_ms: f64) -> Point {
        let Some(last) = self.samples.back().copied() else {
            self.begin(x, y, time_ms);
            return Point::default();
        };
        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample {
            point: Point::new(x, y),
            time_ms,
        });
        Point::new(last.point.x - x, last.point.y - y)
    }

    /// Finish the gesture. Returns momentum if the release was a flick.
    pub fn end(&mut self, time_ms: f64, config: &MomentumConfig) -> Option<Momentum> {
        let samples = std::mem::take(&mut self.samples);
        let last = samples.back()?;
        // A finger resting before release cancels the flick
        if time_ms - last.time_ms > config.sample_window_ms {
            return None;
        }
        let first = samples
            .iter()
            .find(|s| last.time_ms - s.time_ms <= config.sample_window_ms)?;
        let dt = last.time_ms - first.time_ms;
        if dt <= 0.0 {
            return None;
        }
        let velocity = Point::new(
            (first.point.x - last.point.x) / dt,
            (first.point.y - last.point.y) / dt,
        );
        let momentum = Momentum::new(velocity, *config);
        momentum.is_active().then_some(momentum)
    }
}

/// Decaying scroll velocity after a flick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum {
    velocity: Point,
    config: MomentumConfig,
}

impl Momentum {
    pub fn new(velocity: Point, config: MomentumConfig) -> Self {
        Self {
            velocity,
            config: config.bounded(),
        }
    }

    /// Current velocity in px/ms
    pub fn velocity(&self) -> Point {
        self.velocity
    }

    fn speed(&self) -> f64 {
        self.velocity.x.hypot(self.velocity.y)
    }

    pub fn is_active(&self) -> bool {
        self.speed() >= self.config.min_speed
    }

    pub fn tick_ms(&self) -> f64 {
        self.config.tick_ms
    }

    /// Advance one tick. Returns the scroll delta, or `None` once stopped.
    pub fn tick(&mut self) -> Option<Point> {
        if !self.is_active() {
            return None;
        }
        let delta = Point::new(
            self.velocity.x * self.config.tick_ms,
            self.velocity.y * self.config.tick_ms,
        );
        self.velocity.x *= self.config.decay;
        self.velocity.y *= self.config.decay;
        Some(delta)
    }

    /// Stop immediately, e.g. when a new touch begins.
    pub fn stop(&mut self) {
        self.velocity = Point::default();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_deltas_follow_finger() {
        let mut tracker = TouchTracker::new();
        tracker.begin(100.0, 300.0, 0.0);
        assert_eq!(tracker.move_to(100.0, 250.0, 10.0), Point::new(0.0, 50.0));
        assert_eq!(tracker.move_to(90.0, 260.0, 20.0), Point::new(10.0, -10.0));
    }

    #[test]
    fn test_flick_produces_decaying_momentum() {
        let config = MomentumConfig::default();
        let mut tracker = TouchTracker::new();
        tracker.begin(0.0, 500.0, 0.0);
        tracker.move_to(0.0, 400.0, 50.0);
        let mut momentum = tracker.end(55.0, &config).unwrap();
        assert_eq!(momentum.velocity(), Point::new(0.0, 2.0));

        let first = momentum.tick().unwrap();
        assert_eq!(first.y, 32.0);
        let second = momentum.tick().unwrap();
        assert!(second.y < first.y);

        let mut ticks = 2;
        while momentum.tick().is_some() {
            ticks += 1;
            assert!(ticks < 1000, "momentum never settled");
        }
        assert!(!momentum.is_active());
        assert!(!tracker.is_tracking());
    }

    #[test]
    fn test_runaway_decay_still_settles() {
        let config: MomentumConfig =
            serde_json::from_str(r#"{"decay": 1.5, "minSpeed": 0}"#).unwrap();
        let mut momentum = Momentum::new(Point::new(0.0, 2.0), config);
        let mut ticks = 0;
        while momentum.tick().is_some() {
            ticks += 1;
            assert!(ticks < 10_000, "momentum never settled");
        }
        assert!(!momentum.is_active());
    }

    #[test]
    fn test_bounded_keeps_sane_values() {
        let config = MomentumConfig::default();
        assert_eq!(config.bounded(), config);
        let wild = MomentumConfig {
            tick_ms: f64::NAN,
            decay: -1.0,
            ..config
        }
        .bounded();
        assert_eq!(wild.tick_ms, config.tick_ms);
        assert_eq!(wild.decay, 0.0);
    }

    #[test]
    fn test_slow_release_has_no_momentum() {
        let config = MomentumConfig::default();
        let mut tracker = TouchTracker::new();
        tracker.begin(0.0, 500.0, 0.0);
        tracker.move_to(0.0, 400.0, 50.0);
        assert!(tracker.end(400.0, &config).is_none());
    }
}

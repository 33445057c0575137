//! Scrollbar thumb geometry and drag-to-scroll mapping for one axis.

use serde::Serialize;

use crate::config::MIN_THUMB_FRACTION;

/// Thumb size and position, both as fractions of the track
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThumbMetrics {
    /// Thumb length / track length
    pub fraction: f64,
    /// 0 at the start of travel, 1 at the end
    pub position: f64,
}

impl ThumbMetrics {
    /// Thumb start and length in pixels for a track of `bar_length`.
    pub fn pixels(&self, bar_length: f64) -> (f64, f64) {
        let length = self.fraction * bar_length;
        (self.position * (bar_length - length), length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollbarModel {
    min_fraction: f64,
}

impl Default for ScrollbarModel {
    fn default() -> Self {
        Self::new(MIN_THUMB_FRACTION)
    }
}

impl ScrollbarModel {
    pub fn new(min_fraction: f64) -> Self {
        Self {
            min_fraction: min_fraction.clamp(0.0, 1.0),
        }
    }

    /// Thumb length as a fraction of the track, floored at the minimum.
    ///
    /// `None` when the whole content fits: a full-length thumb is not shown.
    pub fn thumb_fraction(&self, viewport: f64, content: f64) -> Option<f64> {
        if content <= 0.0 || viewport >= content {
            return None;
        }
        let fraction = (viewport / content).max(self.min_fraction);
        (fraction < 1.0).then_some(fraction)
    }

    /// Scroll progress in `[0, 1]`; 0 when there is nowhere to scroll.
    pub fn thumb_position(offset: f64, max_offset: f64) -> f64 {
        if max_offset <= 0.0 {
            return 0.0;
        }
        (offset / max_offset).clamp(0.0, 1.0)
    }

    pub fn metrics(&self, offset: f64, viewport: f64, content: f64) -> Option<ThumbMetrics> {
        let fraction = self.thumb_fraction(viewport, content)?;
        Some(ThumbMetrics {
            fraction,
            position: Self::thumb_position(offset, content - viewport),
        })
    }

    /// Start a thumb drag at the current scroll offset.
    pub fn begin_drag(&self, offset: f64, viewport: f64, content: f64) -> Option<ThumbDrag> {
        let metrics = self.metrics(offset, viewport, content)?;
        Some(ThumbDrag {
            start_position: metrics.position,
            thumb_fraction: metrics.fraction,
            max_offset: content - viewport,
        })
    }
}

/// An in-progress thumb drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbDrag {
    start_position: f64,
    thumb_fraction: f64,
    max_offset: f64,
}

impl ThumbDrag {
    /// Content offset for a pointer displacement of `delta` pixels since
    /// the drag began, on a track `bar_length` pixels long.
    ///
    /// The thumb travels `bar_length * (1 - fraction)`, not the full track.
    pub fn offset_for(&self, delta: f64, bar_length: f64) -> f64 {
        let travel = bar_length * (1.0 - self.thumb_fraction);
        if travel <= 0.0 || !delta.is_finite() {
            return self.start_position * self.max_offset;
        }
        let position = (self.start_position + delta / travel).clamp(0.0, 1.0);
        position * self.max_offset
    }

    pub fn max_offset(&self) -> f64 {
        self.max_offset
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_thumb_fraction() {
        let model = ScrollbarModel::default();
        assert_eq!(model.thumb_fraction(500.0, 1000.0), Some(0.5));
        assert_eq!(model.thumb_fraction(10.0, 40_000.0), Some(MIN_THUMB_FRACTION));
        assert_eq!(model.thumb_fraction(500.0, 500.0), None);
        assert_eq!(model.thumb_fraction(500.0, 0.0), None);
    }

    #[test]
    fn test_thumb_pixels() {
        let metrics = ThumbMetrics {
            fraction: 0.25,
            position: 1.0,
        };
        assert_eq!(metrics.pixels(400.0), (300.0, 100.0));
    }

    #[test]
    fn test_drag_accounts_for_thumb_length() {
        let model = ScrollbarModel::default();
        // Half-length thumb on a 200px track travels 100px
        let drag = model.begin_drag(0.0, 500.0, 1000.0).unwrap();
        assert_eq!(drag.offset_for(50.0, 200.0), 250.0);
        assert_eq!(drag.offset_for(100.0, 200.0), 500.0);
        assert_eq!(drag.offset_for(900.0, 200.0), 500.0);
        assert_eq!(drag.offset_for(-10.0, 200.0), 0.0);
    }
}

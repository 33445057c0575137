//! Scroll-related logic for `GridView`.
//!
//! Includes frame-coalesced scroll deltas, the settle recompute after a
//! paced-out move, the scroll indicator timeout, the momentum loop and
//! thumb dragging.

use std::cell::RefCell;
use std::rc::Rc;

use super::{
    deliver, SharedState, INDICATOR_KEY, MOMENTUM_KEY, SCROLL_KEY, SETTLE_KEY, THUMB_KEY,
};
use crate::layout::ChangeRecord;
use crate::pacer::Clock;
use crate::types::{Axis, Point};

/// Add a delta to the pending scroll and make sure a frame applies it.
pub(crate) fn queue_scroll<C: Clock + 'static>(
    state: &Rc<RefCell<SharedState<C>>>,
    delta_x: f64,
    delta_y: f64,
) {
    if !(delta_x.is_finite() && delta_y.is_finite()) {
        return;
    }
    {
        let mut s = state.borrow_mut();
        s.pending_delta.x += delta_x;
        s.pending_delta.y += delta_y;
        let weak_state = Rc::downgrade(state);
        s.pacer.request_frame(SCROLL_KEY, move || {
            if let Some(state) = weak_state.upgrade() {
                apply_pending_scroll(&state);
            }
        });
    }
    show_indicator(state);
}

fn apply_pending_scroll<C: Clock + 'static>(state: &Rc<RefCell<SharedState<C>>>) {
    let record = {
        let mut s = state.borrow_mut();
        let delta = std::mem::take(&mut s.pending_delta);
        s.model.move_window_by(delta.x, delta.y)
    };
    settle_or_deliver(state, record);
}

/// Deliver a record, or if the move was paced out, schedule a recompute
/// for when the pacing interval is up so the last position is not lost.
pub(crate) fn settle_or_deliver<C: Clock + 'static>(
    state: &Rc<RefCell<SharedState<C>>>,
    record: Option<ChangeRecord>,
) {
    if let Some(record) = record {
        state.borrow_mut().pacer.cancel(SETTLE_KEY);
        deliver(state, record);
        return;
    }
    let mut s = state.borrow_mut();
    let interval = s.model.engine().config().min_recompute_interval_ms;
    let weak_state = Rc::downgrade(state);
    s.pacer.debounce(SETTLE_KEY, interval, move || {
        if let Some(state) = weak_state.upgrade() {
            let record = state.borrow_mut().model.engine_mut().recompute(false);
            settle_or_deliver(&state, record);
        }
    });
}

/// Show the scroll indicator and push back its hide timeout.
pub(crate) fn show_indicator<C: Clock + 'static>(state: &Rc<RefCell<SharedState<C>>>) {
    let newly_visible = {
        let mut s = state.borrow_mut();
        let idle = s.model.engine().config().indicator_idle_ms;
        let weak_state = Rc::downgrade(state);
        s.pacer.debounce(INDICATOR_KEY, idle, move || {
            if let Some(state) = weak_state.upgrade() {
                set_indicator(&state, false);
            }
        });
        !s.indicator_visible
    };
    if newly_visible {
        set_indicator(state, true);
    }
}

fn set_indicator<C: Clock>(state: &Rc<RefCell<SharedState<C>>>, visible: bool) {
    let callback = {
        let mut s = state.borrow_mut();
        s.indicator_visible = visible;
        s.indicator_callback.clone()
    };
    #[cfg(target_arch = "wasm32")]
    if let Some(callback) = callback {
        let arg = wasm_bindgen::JsValue::from_bool(visible);
        if let Err(e) = callback.call1(&wasm_bindgen::JsValue::NULL, &arg) {
            tracing::warn!(?e, "indicator callback failed");
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    let _ = callback;
}

/// Run one momentum step and schedule the next while velocity remains.
pub(crate) fn momentum_tick<C: Clock + 'static>(state: &Rc<RefCell<SharedState<C>>>) {
    let step = {
        let mut s = state.borrow_mut();
        let step = s
            .momentum
            .as_mut()
            .and_then(|m| m.tick().map(|d| (d, m.tick_ms())));
        if step.is_none() {
            s.momentum = None;
        }
        step
    };
    let Some((delta, tick_ms)) = step else {
        tracing::trace!("momentum settled");
        return;
    };
    queue_scroll(state, delta.x, delta.y);
    schedule_momentum(state, tick_ms);
}

pub(crate) fn schedule_momentum<C: Clock + 'static>(
    state: &Rc<RefCell<SharedState<C>>>,
    tick_ms: f64,
) {
    let weak_state = Rc::downgrade(state);
    state
        .borrow_mut()
        .pacer
        .debounce(MOMENTUM_KEY, tick_ms, move || {
            if let Some(state) = weak_state.upgrade() {
                momentum_tick(&state);
            }
        });
}

/// Stop any momentum in flight.
pub(crate) fn stop_momentum<C: Clock>(state: &Rc<RefCell<SharedState<C>>>) {
    let mut s = state.borrow_mut();
    s.momentum = None;
    s.pacer.cancel(MOMENTUM_KEY);
}

/// Start dragging the thumb for `axis`. False if the axis cannot scroll.
pub(crate) fn begin_thumb_drag<C: Clock>(
    state: &Rc<RefCell<SharedState<C>>>,
    axis: Axis,
) -> bool {
    let mut s = state.borrow_mut();
    let engine = s.model.engine();
    let window = engine.window_rect();
    let size = engine.grid_size();
    let drag = match axis {
        Axis::Row => s.scrollbar.begin_drag(window.y, window.height, size.height),
        Axis::Column => s.scrollbar.begin_drag(window.x, window.width, size.width),
    };
    s.thumb_drag = drag.map(|d| (axis, d));
    s.thumb_target = None;
    s.thumb_drag.is_some()
}

/// Move the dragged thumb. The offset is applied on the next frame.
pub(crate) fn drag_thumb<C: Clock + 'static>(
    state: &Rc<RefCell<SharedState<C>>>,
    delta: f64,
    bar_length: f64,
) {
    {
        let mut s = state.borrow_mut();
        let Some((axis, drag)) = s.thumb_drag else {
            return;
        };
        let offset = drag.offset_for(delta, bar_length);
        let current = s.model.scroll_position();
        let target = match axis {
            Axis::Row => Point::new(current.x, offset),
            Axis::Column => Point::new(offset, current.y),
        };
        s.thumb_target = Some(target);
        let weak_state = Rc::downgrade(state);
        s.pacer.request_frame(THUMB_KEY, move || {
            if let Some(state) = weak_state.upgrade() {
                apply_thumb_target(&state);
            }
        });
    }
    show_indicator(state);
}

fn apply_thumb_target<C: Clock + 'static>(state: &Rc<RefCell<SharedState<C>>>) {
    let record = {
        let mut s = state.borrow_mut();
        let Some(target) = s.thumb_target.take() else {
            return;
        };
        s.model.move_window_absolute(target.x, target.y)
    };
    settle_or_deliver(state, record);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::super::pump;
    use super::super::test_support::shared_state;
    use super::*;
    use crate::pacer::ManualClock;

    #[test]
    fn test_paced_out_scroll_settles_later() {
        let clock = ManualClock::new();
        let state = shared_state(&clock);
        // Too soon after the initial layout
        clock.advance(5.0);
        queue_scroll(&state, 0.0, 400.0);
        pump(&state);
        assert!(state.borrow().pending_change.is_none());
        assert_eq!(state.borrow().model.scroll_position().y, 400.0);

        clock.advance(20.0);
        pump(&state);
        let change = state.borrow_mut().pending_change.take().unwrap();
        assert_eq!(change.range.unwrap().row, 8);
    }

    #[test]
    fn test_indicator_hides_after_idle() {
        let clock = ManualClock::new();
        let state = shared_state(&clock);
        queue_scroll(&state, 0.0, 10.0);
        assert!(state.borrow().indicator_visible);

        clock.advance(500.0);
        queue_scroll(&state, 0.0, 10.0);
        clock.advance(500.0);
        pump(&state);
        assert!(state.borrow().indicator_visible);

        clock.advance(400.0);
        pump(&state);
        assert!(!state.borrow().indicator_visible);
    }

    #[test]
    fn test_thumb_drag_moves_window() {
        let clock = ManualClock::new();
        let state = shared_state(&clock);
        assert!(begin_thumb_drag(&state, Axis::Row));
        clock.advance(20.0);
        // Thumb is 1.25% of the track, floored to 5%; dragging the full travel hits the bottom
        drag_thumb(&state, 1000.0, 200.0);
        pump(&state);
        assert_eq!(state.borrow().model.scroll_position().y, 40_000.0 - 500.0);
    }

    #[test]
    fn test_no_thumb_drag_when_content_fits() {
        let clock = ManualClock::new();
        let state = shared_state(&clock);
        assert!(begin_thumb_drag(&state, Axis::Column));
        state.borrow_mut().model.set_viewport_size(2000.0, 500.0);
        assert!(!begin_thumb_drag(&state, Axis::Column));
    }
}

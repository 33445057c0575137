//! Keyboard and touch handlers for `GridView`.
//!
//! All functions here are `pub(crate)` helpers called from the wasm-exported
//! public API that lives in `mod.rs`.

use std::cell::RefCell;
use std::rc::Rc;

use super::scroll::{
    queue_scroll, schedule_momentum, settle_or_deliver, show_indicator, stop_momentum,
};
use super::SharedState;
use crate::pacer::Clock;
use crate::types::Point;

/// Distance scrolled by one arrow key press
pub(crate) const LINE_SCROLL_PX: f64 = 40.0;

fn line_delta(key: &str) -> Option<Point> {
    match key {
        "ArrowUp" => Some(Point::new(0.0, -LINE_SCROLL_PX)),
        "ArrowDown" => Some(Point::new(0.0, LINE_SCROLL_PX)),
        "ArrowLeft" => Some(Point::new(-LINE_SCROLL_PX, 0.0)),
        "ArrowRight" => Some(Point::new(LINE_SCROLL_PX, 0.0)),
        _ => None,
    }
}

/// Handle a key press. Returns true if the key is a scroll key.
///
/// Arrow keys are coalesced like wheel input; paging and Home/End jump at once.
pub(crate) fn key_down<C: Clock + 'static>(
    state: &Rc<RefCell<SharedState<C>>>,
    key: &str,
) -> bool {
    if let Some(delta) = line_delta(key) {
        queue_scroll(state, delta.x, delta.y);
        return true;
    }
    let record = {
        let mut s = state.borrow_mut();
        let engine = s.model.engine_mut();
        match key {
            "PageUp" => engine.page_up(),
            "PageDown" | " " => engine.page_down(),
            "Home" => engine.scroll_to_top(),
            "End" => engine.scroll_to_bottom(),
            _ => return false,
        }
    };
    stop_momentum(state);
    show_indicator(state);
    settle_or_deliver(state, record);
    true
}

pub(crate) fn touch_start<C: Clock>(
    state: &Rc<RefCell<SharedState<C>>>,
    x: f64,
    y: f64,
    time_ms: f64,
) {
    stop_momentum(state);
    state.borrow_mut().touch.begin(x, y, time_ms);
}

pub(crate) fn touch_move<C: Clock + 'static>(
    state: &Rc<RefCell<SharedState<C>>>,
    x: f64,
    y: f64,
    time_ms: f64,
) {
    let delta = state.borrow_mut().touch.move_to(x, y, time_ms);
    if delta != Point::default() {
        queue_scroll(state, delta.x, delta.y);
    }
}

/// Finish a touch gesture, starting momentum if it ended in a flick.
pub(crate) fn touch_end<C: Clock + 'static>(state: &Rc<RefCell<SharedState<C>>>, time_ms: f64) {
    let tick_ms = {
        let mut s = state.borrow_mut();
        let config = s.model.engine().config().momentum;
        let momentum = s.touch.end(time_ms, &config);
        s.momentum = momentum;
        momentum.map(|m| m.tick_ms())
    };
    if let Some(tick_ms) = tick_ms {
        let velocity = state.borrow().momentum.map(|m| m.velocity());
        tracing::debug!(?velocity, "momentum started");
        schedule_momentum(state, tick_ms);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::super::pump;
    use super::super::test_support::shared_state;
    use super::*;
    use crate::pacer::ManualClock;

    #[test]
    fn test_arrow_keys_are_coalesced() {
        let clock = ManualClock::new();
        let state = shared_state(&clock);
        clock.advance(20.0);
        assert!(key_down(&state, "ArrowDown"));
        assert!(key_down(&state, "ArrowDown"));
        assert_eq!(state.borrow().model.scroll_position().y, 0.0);
        pump(&state);
        assert_eq!(state.borrow().model.scroll_position().y, 2.0 * LINE_SCROLL_PX);
    }

    #[test]
    fn test_page_keys_jump_immediately() {
        let clock = ManualClock::new();
        let state = shared_state(&clock);
        clock.advance(20.0);
        assert!(key_down(&state, "PageDown"));
        assert_eq!(state.borrow().model.scroll_position().y, 500.0);
        assert!(state.borrow().pending_change.is_some());

        clock.advance(20.0);
        assert!(key_down(&state, "End"));
        assert_eq!(state.borrow().model.scroll_position().y, 40_000.0 - 500.0);
        assert!(!key_down(&state, "Tab"));
    }

    #[test]
    fn test_flick_keeps_scrolling_until_momentum_settles() {
        let clock = ManualClock::new();
        let state = shared_state(&clock);
        clock.advance(20.0);
        touch_start(&state, 0.0, 500.0, 0.0);
        touch_move(&state, 0.0, 400.0, 50.0);
        pump(&state);
        assert_eq!(state.borrow().model.scroll_position().y, 100.0);

        touch_end(&state, 55.0);
        assert!(state.borrow().momentum.is_some());

        let mut frames = 0;
        while state.borrow().momentum.is_some() {
            clock.advance(16.0);
            pump(&state);
            frames += 1;
            assert!(frames < 1000, "momentum never settled");
        }
        let y = state.borrow().model.scroll_position().y;
        assert!(y > 100.0);
    }

    #[test]
    fn test_touch_start_stops_momentum() {
        let clock = ManualClock::new();
        let state = shared_state(&clock);
        touch_start(&state, 0.0, 500.0, 0.0);
        touch_move(&state, 0.0, 400.0, 50.0);
        touch_end(&state, 55.0);
        assert!(state.borrow().momentum.is_some());

        touch_start(&state, 0.0, 300.0, 60.0);
        assert!(state.borrow().momentum.is_none());
        assert!(!state.borrow_mut().pacer.cancel("momentum"));
    }
}

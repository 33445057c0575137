//! Rate limiting and coalescing for layout updates.
//!
//! Three keyed primitives: next-frame coalescing, throttling and
//! debouncing. Keys are free-form labels so unrelated call sites never
//! cancel each other. The pacer does not own a timer; the host pumps it
//! with [`UpdatePacer::run_frame`] on each animation frame and
//! [`UpdatePacer::run_due`] when [`UpdatePacer::next_deadline`] passes.

mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

use std::collections::HashMap;

/// Deferred work
pub type Job = Box<dyn FnOnce()>;

struct Pending {
    due_ms: f64,
    job: Job,
}

#[derive(Default)]
struct ThrottleSlot {
    last_run_ms: Option<f64>,
    trailing: Option<Pending>,
}

pub struct UpdatePacer<C = MonotonicClock> {
    clock: C,
    frame: Vec<(String, Job)>,
    throttles: HashMap<String, ThrottleSlot>,
    debounces: HashMap<String, Pending>,
}

impl UpdatePacer<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl Default for UpdatePacer<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> UpdatePacer<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            frame: Vec::new(),
            throttles: HashMap::new(),
            debounces: HashMap::new(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run `job` on the next frame, replacing any job pending under `key`.
    pub fn request_frame(&mut self, key: impl Into<String>, job: impl FnOnce() + 'static) {
        let key = key.into();
        self.frame.retain(|(pending, _)| *pending != key);
        self.frame.push((key, Box::new(job)));
    }

    pub fn has_frame_pending(&self) -> bool {
        !self.frame.is_empty()
    }

    /// Remove this frame's jobs without running them.
    ///
    /// Lets a host release any borrow on the pacer before the jobs run.
    pub fn take_frame_jobs(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.frame)
            .into_iter()
            .map(|(_, job)| job)
            .collect()
    }

    /// Run every job submitted for this frame. Returns how many ran.
    pub fn run_frame(&mut self) -> usize {
        run_all(self.take_frame_jobs())
    }

    /// Run `job` now if `interval_ms` has passed since `key` last ran;
    /// otherwise schedule it once the interval is up, replacing any
    /// trailing job already waiting. Returns true if the job ran now.
    pub fn throttle(
        &mut self,
        key: impl Into<String>,
        interval_ms: f64,
        job: impl FnOnce() + 'static,
    ) -> bool {
        let now = self.clock.now_ms();
        let slot = self.throttles.entry(key.into()).or_default();
        match slot.last_run_ms {
            Some(last) if now - last < interval_ms => {
                slot.trailing = Some(Pending {
                    due_ms: last + interval_ms,
                    job: Box::new(job),
                });
                false
            }
            _ => {
                slot.last_run_ms = Some(now);
                slot.trailing = None;
                job();
                true
            }
        }
    }

    /// Run `job` once `interval_ms` passes without another call for `key`.
    pub fn debounce(
        &mut self,
        key: impl Into<String>,
        interval_ms: f64,
        job: impl FnOnce() + 'static,
    ) {
        let due_ms = self.clock.now_ms() + interval_ms;
        self.debounces.insert(
            key.into(),
            Pending {
                due_ms,
                job: Box::new(job),
            },
        );
    }

    /// Remove throttle/debounce jobs whose time has come, earliest first.
    pub fn take_due_jobs(&mut self) -> Vec<Job> {
        let now = self.clock.now_ms();
        let mut due: Vec<Pending> = Vec::new();

        for slot in self.throttles.values_mut() {
            if slot.trailing.as_ref().is_some_and(|p| p.due_ms <= now) {
                if let Some(pending) = slot.trailing.take() {
                    slot.last_run_ms = Some(now);
                    due.push(pending);
                }
            }
        }

        let expired: Vec<String> = self
            .debounces
            .iter()
            .filter(|(_, pending)| pending.due_ms <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            if let Some(pending) = self.debounces.remove(&key) {
                due.push(pending);
            }
        }

        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        due.into_iter().map(|p| p.job).collect()
    }

    /// Run throttle/debounce jobs whose time has come. Returns how many ran.
    pub fn run_due(&mut self) -> usize {
        run_all(self.take_due_jobs())
    }

    /// Earliest time (in clock milliseconds) a throttle/debounce job is due.
    pub fn next_deadline(&self) -> Option<f64> {
        self.throttles
            .values()
            .filter_map(|slot| slot.trailing.as_ref().map(|p| p.due_ms))
            .chain(self.debounces.values().map(|p| p.due_ms))
            .min_by(f64::total_cmp)
    }

    /// Drop anything pending under `key`. Returns true if something was dropped.
    pub fn cancel(&mut self, key: &str) -> bool {
        let before = self.frame.len();
        self.frame.retain(|(pending, _)| pending != key);
        let mut dropped = self.frame.len() != before;
        if let Some(slot) = self.throttles.get_mut(key) {
            dropped |= slot.trailing.take().is_some();
        }
        dropped |= self.debounces.remove(key).is_some();
        dropped
    }

    /// True when nothing is waiting to run
    pub fn is_idle(&self) -> bool {
        self.frame.is_empty() && self.next_deadline().is_none()
    }
}

fn run_all(jobs: Vec<Job>) -> usize {
    let count = jobs.len();
    for job in jobs {
        job();
    }
    count
}

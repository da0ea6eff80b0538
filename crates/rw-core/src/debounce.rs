//! Trailing-edge debouncer driven by caller-supplied timestamps.
//!
//! Values pushed within the quiet window replace each other; only the last
//! one comes out, once the window has passed without a newer push. Time is
//! passed in explicitly so the host decides what a clock is.

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window_ms: f64,
    pending: Option<T>,
    deadline: f64,
}

impl<T> Debouncer<T> {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms: window_ms.max(0.0),
            pending: None,
            deadline: 0.0,
        }
    }

    pub fn window_ms(&self) -> f64 {
        self.window_ms
    }

    /// Record a new value at `now_ms`, restarting the quiet window.
    /// Returns the delay after which `poll` should be called.
    pub fn push(&mut self, now_ms: f64, value: T) -> f64 {
        self.pending = Some(value);
        self.deadline = now_ms + self.window_ms;
        self.window_ms
    }

    /// Take the pending value if its quiet window has elapsed.
    pub fn poll(&mut self, now_ms: f64) -> Option<T> {
        if self.pending.is_some() && now_ms >= self.deadline {
            self.pending.take()
        } else {
            None
        }
    }

    /// Milliseconds until the pending value is due, if any.
    pub fn remaining(&self, now_ms: f64) -> Option<f64> {
        self.pending
            .as_ref()
            .map(|_| (self.deadline - now_ms).max(0.0))
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

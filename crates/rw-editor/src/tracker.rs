//! Selection tracker.
//!
//! Turns raw page selections into `SelectionDescriptor`s. Selection-affecting
//! events are debounced (latest wins) and evaluated once the quiet window
//! has passed. A descriptor is only emitted when it differs from the
//! previous one in element, span or text, and losing a qualifying selection
//! is reported once.
//!
//! The tracker never touches the page; the controller hands it snapshots.

use rw_core::{Debouncer, ElementId, RawSelection, SelectionDescriptor, SurfaceKind};

/// Result of an evaluation that changed what the tracker holds.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerUpdate {
    /// A new qualifying selection.
    Captured(SelectionDescriptor),
    /// The previous qualifying selection is gone.
    Cleared,
}

/// Turn a raw snapshot into a descriptor, if it qualifies.
///
/// Fields qualify with a non-empty `[start, end)`. Window ranges qualify
/// when they are non-collapsed and inside an editing host.
pub fn qualify(raw: &RawSelection) -> Option<SelectionDescriptor> {
    match raw {
        RawSelection::Field {
            element,
            value,
            start,
            end,
            rect,
        } => SelectionDescriptor::capture(
            SurfaceKind::PlainInput,
            *element,
            value,
            *start,
            *end,
            *rect,
        ),
        RawSelection::Range {
            editable_root: Some(root),
            text,
            start,
            end,
            rect,
        } => SelectionDescriptor::from_range(
            SurfaceKind::ContentEditable,
            *root,
            text,
            *start,
            *end,
            *rect,
        ),
        RawSelection::Range {
            editable_root: None,
            ..
        }
        | RawSelection::Empty => None,
    }
}

/// What makes two captures the same selection. Bounds are left out, they
/// move with scrolling.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectionKey {
    element: ElementId,
    start: usize,
    end: usize,
    text: String,
}

impl SelectionKey {
    fn of(descriptor: &SelectionDescriptor) -> Self {
        Self {
            element: descriptor.element(),
            start: descriptor.start(),
            end: descriptor.end(),
            text: descriptor.text().to_string(),
        }
    }
}

#[derive(Debug)]
pub struct SelectionTracker {
    debouncer: Debouncer<RawSelection>,
    last: Option<SelectionKey>,
    /// Re-read the page once this time has passed (select-all shortcut).
    resample_at: Option<f64>,
}

impl SelectionTracker {
    pub fn new(debounce_ms: f64) -> Self {
        Self {
            debouncer: Debouncer::new(debounce_ms),
            last: None,
            resample_at: None,
        }
    }

    /// Record a snapshot taken at `now_ms`. Returns the delay after which
    /// `poll` should run.
    pub fn observe(&mut self, now_ms: f64, raw: RawSelection) -> f64 {
        self.debouncer.push(now_ms, raw)
    }

    /// Ask for a fresh snapshot one window from now.
    pub fn schedule_resample(&mut self, now_ms: f64) -> f64 {
        let window = self.debouncer.window_ms();
        self.resample_at = Some(now_ms + window);
        window
    }

    /// Whether a resample requested earlier is due.
    pub fn take_resample(&mut self, now_ms: f64) -> bool {
        match self.resample_at {
            Some(at) if now_ms >= at => {
                self.resample_at = None;
                true
            }
            _ => false,
        }
    }

    /// Evaluate the latest snapshot if its quiet window has elapsed.
    pub fn poll(&mut self, now_ms: f64) -> Option<TrackerUpdate> {
        let raw = self.debouncer.poll(now_ms)?;
        self.evaluate(&raw)
    }

    /// Evaluate a snapshot right away, dropping anything pending.
    pub fn evaluate(&mut self, raw: &RawSelection) -> Option<TrackerUpdate> {
        self.debouncer.cancel();
        match qualify(raw) {
            Some(descriptor) => {
                let key = SelectionKey::of(&descriptor);
                if self.last.as_ref() == Some(&key) {
                    return None;
                }
                self.last = Some(key);
                log::debug!(
                    "selection captured in {} [{}, {})",
                    descriptor.element(),
                    descriptor.start(),
                    descriptor.end()
                );
                Some(TrackerUpdate::Captured(descriptor))
            }
            None => self.last.take().map(|_| TrackerUpdate::Cleared),
        }
    }

    /// Milliseconds until the next evaluation or resample is due.
    pub fn next_due(&self, now_ms: f64) -> Option<f64> {
        let resample = self.resample_at.map(|at| (at - now_ms).max(0.0));
        match (self.debouncer.remaining(now_ms), resample) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Forget the last capture so the same selection can qualify again.
    pub fn reset(&mut self) {
        self.last = None;
        self.debouncer.cancel();
        self.resample_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rw_core::{ElementId, Rect};

    fn field(element: ElementId, value: &str, start: usize, end: usize) -> RawSelection {
        RawSelection::Field {
            element,
            value: value.to_string(),
            start,
            end,
            rect: Rect::default(),
        }
    }

    #[test]
    fn collapsed_field_selection_does_not_qualify() {
        let el = ElementId::next();
        assert_eq!(qualify(&field(el, "hello", 2, 2)), None);
        assert!(qualify(&field(el, "hello", 0, 5)).is_some());
    }

    #[test]
    fn range_outside_editing_host_does_not_qualify() {
        let raw = RawSelection::Range {
            editable_root: None,
            text: "static".into(),
            start: 0,
            end: 6,
            rect: Rect::default(),
        };
        assert_eq!(qualify(&raw), None);
    }

    #[test]
    fn burst_yields_one_evaluation_with_latest_data() {
        let el = ElementId::next();
        let mut tracker = SelectionTracker::new(100.0);
        tracker.observe(0.0, field(el, "hello world", 0, 1));
        tracker.observe(30.0, field(el, "hello world", 0, 3));
        tracker.observe(60.0, field(el, "hello world", 0, 5));

        assert_eq!(tracker.poll(100.0), None, "window restarted at 60ms");
        match tracker.poll(160.0) {
            Some(TrackerUpdate::Captured(d)) => assert_eq!(d.text(), "hello"),
            other => panic!("expected capture, got {other:?}"),
        }
        assert_eq!(tracker.poll(500.0), None);
    }

    #[test]
    fn identical_text_is_not_reemitted() {
        let el = ElementId::next();
        let mut tracker = SelectionTracker::new(0.0);
        assert!(matches!(
            tracker.evaluate(&field(el, "hello world", 0, 5)),
            Some(TrackerUpdate::Captured(_))
        ));
        assert_eq!(tracker.evaluate(&field(el, "hello world", 0, 5)), None);

        tracker.reset();
        assert!(matches!(
            tracker.evaluate(&field(el, "hello world", 0, 5)),
            Some(TrackerUpdate::Captured(_))
        ));
    }

    #[test]
    fn same_text_elsewhere_is_a_new_selection() {
        let first = ElementId::next();
        let second = ElementId::next();
        let mut tracker = SelectionTracker::new(0.0);
        tracker.evaluate(&field(first, "hello hello", 0, 5));

        match tracker.evaluate(&field(first, "hello hello", 6, 11)) {
            Some(TrackerUpdate::Captured(d)) => assert_eq!(d.start(), 6),
            other => panic!("expected capture, got {other:?}"),
        }
        match tracker.evaluate(&field(second, "hello hello", 6, 11)) {
            Some(TrackerUpdate::Captured(d)) => assert_eq!(d.element(), second),
            other => panic!("expected capture, got {other:?}"),
        }
    }

    #[test]
    fn losing_the_selection_is_reported_once() {
        let el = ElementId::next();
        let mut tracker = SelectionTracker::new(0.0);
        tracker.evaluate(&field(el, "abc", 0, 3));
        assert_eq!(
            tracker.evaluate(&RawSelection::Empty),
            Some(TrackerUpdate::Cleared)
        );
        assert_eq!(tracker.evaluate(&RawSelection::Empty), None);
    }

    #[test]
    fn resample_comes_due_after_one_window() {
        let mut tracker = SelectionTracker::new(100.0);
        assert_eq!(tracker.schedule_resample(10.0), 100.0);
        assert_eq!(tracker.next_due(50.0), Some(60.0));
        assert!(!tracker.take_resample(50.0));
        assert!(tracker.take_resample(110.0));
        assert!(!tracker.take_resample(200.0));
    }
}

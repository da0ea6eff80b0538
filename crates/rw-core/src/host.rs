//! The seam between the rewrite logic and a page.
//!
//! The tracker and the replacement engine only ever talk to a page through
//! `EditableHost`. The browser bridge implements it over the real DOM;
//! `HeadlessPage` implements it in memory for tests.

use crate::geometry::Viewport;
use crate::id::ElementId;
use crate::model::{Rect, SurfaceKind};

/// What the page currently shows as selected, before any qualification.
///
/// Offsets are UTF-16 code units. Rects are in document coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSelection {
    /// Focus is in an `<input>` or `<textarea>`.
    Field {
        element: ElementId,
        value: String,
        start: usize,
        end: usize,
        rect: Rect,
    },
    /// A window selection. `editable_root` is the editing host containing
    /// the range's common ancestor, if any; offsets are relative to it.
    Range {
        editable_root: Option<ElementId>,
        text: String,
        start: usize,
        end: usize,
        rect: Rect,
    },
    /// Nothing selected, or the selection could not be read.
    Empty,
}

/// Operations the rewrite flow needs from a page.
///
/// Implementations must not panic on stale handles; reads of a detached
/// element return `None`/empty and writes are ignored.
pub trait EditableHost {
    /// A text node inside a rich surface.
    type Run: Clone;

    /// Read the current focus/selection.
    fn snapshot_selection(&self) -> RawSelection;

    /// Current viewport size and scroll offset.
    fn viewport(&self) -> Viewport;

    /// Whether the element is still attached to the document.
    fn is_connected(&self, element: ElementId) -> bool;

    /// Editable surface kind of the element, `None` if it cannot be edited.
    fn surface_kind(&self, element: ElementId) -> Option<SurfaceKind>;

    // ── Plain surfaces ──

    fn field_value(&self, element: ElementId) -> Option<String>;

    fn set_field_value(&mut self, element: ElementId, value: &str);

    fn set_field_selection(&mut self, element: ElementId, start: usize, end: usize);

    // ── Rich surfaces ──

    /// Text nodes under `element` in document order, with their data.
    fn text_runs(&self, element: ElementId) -> Vec<(Self::Run, String)>;

    fn set_run_text(&mut self, run: &Self::Run, text: &str);

    fn remove_run(&mut self, run: &Self::Run);

    /// Insert a new text node right after `run`, returning it.
    fn insert_run_after(&mut self, run: &Self::Run, text: &str) -> Option<Self::Run>;

    /// Collapse the window selection to the point right after `run`.
    fn collapse_selection_after(&mut self, run: &Self::Run);

    // ── Both ──

    fn focus(&mut self, element: ElementId);

    /// Fire a synthetic `input` event so frameworks bound to the element
    /// observe the change.
    fn dispatch_input(&mut self, element: ElementId);
}

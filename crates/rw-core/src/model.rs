//! Data model shared by the tracker, the planner, the panel, and the
//! replacement engine.
//!
//! A `SelectionDescriptor` is the unit of truth for "what is selected and
//! where". It is captured once from a single selection reading and is never
//! patched afterwards; anything that needs a different selection captures a
//! new descriptor.

use crate::api::GenerateResponse;
use crate::id::{AgentId, ElementId};
use crate::text::{slice_utf16, utf16_len};
use serde::{Deserialize, Serialize};

// ─── Geometry primitives ─────────────────────────────────────────────────

/// An axis-aligned box. Edges rather than origin + size because that is
/// what `getBoundingClientRect` hands out.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Rect {
    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn center_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    /// Shift the box by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            top: self.top + dy,
            left: self.left + dx,
            bottom: self.bottom + dy,
            right: self.right + dx,
        }
    }
}

// ─── Selection ───────────────────────────────────────────────────────────

/// Which kind of editable surface hosts a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceKind {
    /// `<input>` or `<textarea>`: text lives in `value`.
    PlainInput,
    /// A rich-text editing host: text lives in descendant text nodes.
    ContentEditable,
}

/// Immutable snapshot of a qualifying text selection.
///
/// Offsets are UTF-16 code units into the surface's text content, with
/// `start < end <= len(content)` at capture time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionDescriptor {
    surface: SurfaceKind,
    element: ElementId,
    start: usize,
    end: usize,
    text: String,
    bounds: Rect,
}

impl SelectionDescriptor {
    /// Capture a descriptor from the surface's full text content.
    ///
    /// Returns `None` for collapsed or out-of-range selections, and for
    /// offsets that split a surrogate pair.
    pub fn capture(
        surface: SurfaceKind,
        element: ElementId,
        content: &str,
        start: usize,
        end: usize,
        bounds: Rect,
    ) -> Option<Self> {
        if start >= end {
            return None;
        }
        let text = slice_utf16(content, start, end)?;
        Some(Self {
            surface,
            element,
            start,
            end,
            text: text.to_string(),
            bounds,
        })
    }

    /// Build a descriptor when the host already extracted the selected text
    /// (window ranges). The text must be exactly `end - start` code units long.
    pub fn from_range(
        surface: SurfaceKind,
        element: ElementId,
        text: &str,
        start: usize,
        end: usize,
        bounds: Rect,
    ) -> Option<Self> {
        if start >= end || utf16_len(text) != end - start {
            return None;
        }
        Some(Self {
            surface,
            element,
            start,
            end,
            text: text.to_string(),
            bounds,
        })
    }

    pub fn surface(&self) -> SurfaceKind {
        self.surface
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bounding box in document coordinates at capture time.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }
}

// ─── Placement ───────────────────────────────────────────────────────────

/// Where a floating element sits, in viewport (fixed) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub top: f64,
    pub left: f64,
    /// `true` when the element was flipped above its anchor.
    pub is_bottom: bool,
}

/// Placement of the action control and the panel, derived on demand.
///
/// At most one of the two is positioned at any time; showing one clears
/// the other.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlacementState {
    control: Option<Placement>,
    panel: Option<Placement>,
}

impl PlacementState {
    pub fn control(&self) -> Option<Placement> {
        self.control
    }

    pub fn panel(&self) -> Option<Placement> {
        self.panel
    }

    pub fn show_control(&mut self, placement: Placement) {
        self.panel = None;
        self.control = Some(placement);
    }

    pub fn show_panel(&mut self, placement: Placement) {
        self.control = None;
        self.panel = Some(placement);
    }
}

// ─── Rewrite results ─────────────────────────────────────────────────────

/// One suggestion produced by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteSuggestion {
    /// Opaque handle used to acknowledge approval later.
    pub activity_id: String,
    pub agent_id: AgentId,
    pub original_text: String,
    pub prompt_note: String,
    pub suggested_text: String,
}

impl From<GenerateResponse> for RewriteSuggestion {
    fn from(resp: GenerateResponse) -> Self {
        Self {
            activity_id: resp.activity_id,
            agent_id: resp.agent_id,
            original_text: resp.original,
            prompt_note: resp.prompt,
            suggested_text: resp.suggestion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_slices_selected_text() {
        let el = ElementId::next();
        let d = SelectionDescriptor::capture(
            SurfaceKind::PlainInput,
            el,
            "hello world",
            6,
            11,
            Rect::default(),
        )
        .unwrap();
        assert_eq!(d.text(), "world");
        assert_eq!(d.element(), el);
        assert_eq!((d.start(), d.end()), (6, 11));
    }

    #[test]
    fn descriptor_serializes_with_a_plain_element_handle() {
        let el = ElementId::next();
        let d = SelectionDescriptor::capture(
            SurfaceKind::PlainInput,
            el,
            "hello world",
            0,
            5,
            Rect::default(),
        )
        .unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["text"], "hello");
        assert_eq!(json["surface"], "PlainInput");
        assert!(json["element"].is_u64());
    }

    #[test]
    fn capture_rejects_collapsed_and_out_of_range() {
        let el = ElementId::next();
        let r = Rect::default();
        assert!(SelectionDescriptor::capture(SurfaceKind::PlainInput, el, "abc", 2, 2, r).is_none());
        assert!(SelectionDescriptor::capture(SurfaceKind::PlainInput, el, "abc", 2, 1, r).is_none());
        assert!(SelectionDescriptor::capture(SurfaceKind::PlainInput, el, "abc", 1, 9, r).is_none());
    }

    #[test]
    fn from_range_checks_text_length() {
        let el = ElementId::next();
        let r = Rect::default();
        assert!(
            SelectionDescriptor::from_range(SurfaceKind::ContentEditable, el, "ab", 3, 5, r)
                .is_some()
        );
        assert!(
            SelectionDescriptor::from_range(SurfaceKind::ContentEditable, el, "ab", 3, 6, r)
                .is_none()
        );
    }

    #[test]
    fn placement_state_is_mutually_exclusive() {
        let p = Placement {
            top: 1.0,
            left: 2.0,
            is_bottom: false,
        };
        let mut state = PlacementState::default();
        state.show_control(p);
        assert!(state.control().is_some());
        state.show_panel(p);
        assert!(state.control().is_none());
        assert!(state.panel().is_some());
        state.show_control(p);
        assert!(state.panel().is_none());
    }
}

//! Placement planner for the floating control and the rewrite panel.
//!
//! Pure functions over boxes and viewport sizes. Elements prefer to sit
//! below their anchor and flip above it when the anchor's bottom edge is
//! past the vertical midpoint of the viewport. Horizontally they are
//! clamped so they never cross the left or right viewport edge.

use crate::model::{Placement, Rect};
use serde::{Deserialize, Serialize};

/// The browser viewport: its size plus the document scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

impl Viewport {
    /// Convert a box in document coordinates to viewport coordinates.
    pub fn to_client(&self, rect: Rect) -> Rect {
        rect.translate(-self.scroll_x, -self.scroll_y)
    }
}

/// Sizes of the floating elements and the gaps between them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlacementMetrics {
    pub control_width: f64,
    pub control_height: f64,
    pub panel_width: f64,
    pub panel_height: f64,
    /// Gap between the selection and the control.
    pub gap: f64,
    /// Extra distance between the control's spot and the panel.
    pub panel_offset: f64,
}

impl Default for PlacementMetrics {
    fn default() -> Self {
        Self {
            control_width: 60.0,
            control_height: 24.0,
            panel_width: 256.0,
            panel_height: 320.0,
            gap: 10.0,
            panel_offset: 20.0,
        }
    }
}

/// Clamp `left` into `[0, viewport_width - element_width]`.
///
/// An element wider than the viewport is pinned to the left edge.
pub fn clamp_left(left: f64, element_width: f64, viewport_width: f64) -> f64 {
    let max = (viewport_width - element_width).max(0.0);
    left.clamp(0.0, max)
}

/// Whether an anchor ending at `bottom` sits in the lower half of the viewport.
pub fn is_bottom_half(bottom: f64, viewport_height: f64) -> bool {
    bottom > viewport_height / 2.0
}

/// Place an element of `height` near `anchor` (viewport coordinates).
///
/// Below: the element's top edge sits `gap` under the anchor's bottom.
/// Flipped: the element's bottom edge sits `gap` above the anchor's top.
pub fn place_near(
    anchor: Rect,
    width: f64,
    height: f64,
    desired_left: f64,
    gap: f64,
    viewport: &Viewport,
) -> Placement {
    let is_bottom = is_bottom_half(anchor.bottom, viewport.height);
    let top = if is_bottom {
        anchor.top - gap - height
    } else {
        anchor.bottom + gap
    };
    Placement {
        top,
        left: clamp_left(desired_left, width, viewport.width),
        is_bottom,
    }
}

/// Place the action control for a selection box given in document
/// coordinates. The control is centered horizontally on the selection.
pub fn place_control(selection: Rect, viewport: &Viewport, metrics: &PlacementMetrics) -> Placement {
    let anchor = viewport.to_client(selection);
    let desired_left = anchor.center_x() - metrics.control_width / 2.0;
    place_near(
        anchor,
        metrics.control_width,
        metrics.control_height,
        desired_left,
        metrics.gap,
        viewport,
    )
}

/// Place the panel from the control's current position.
///
/// The panel opens on the same side of the selection as the control, keeps
/// the control's left edge where it fits, and sits `panel_offset` further
/// away from the selection than the control did.
pub fn place_panel(control: Placement, viewport: &Viewport, metrics: &PlacementMetrics) -> Placement {
    let top = if control.is_bottom {
        control.top + metrics.control_height - metrics.panel_offset - metrics.panel_height
    } else {
        control.top + metrics.panel_offset
    };
    Placement {
        top,
        left: clamp_left(control.left, metrics.panel_width, viewport.width),
        is_bottom: control.is_bottom,
    }
}

/// Placement of a dragged element whose grab point sits `grab` away from
/// its top-left corner. A manually moved element is never flipped.
pub fn drag_to(pointer: (f64, f64), grab: (f64, f64)) -> Placement {
    Placement {
        top: pointer.1 - grab.1,
        left: pointer.0 - grab.0,
        is_bottom: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(width: f64, height: f64) -> Viewport {
        Viewport {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    #[test]
    fn control_below_selection_in_top_half() {
        let m = PlacementMetrics::default();
        let p = place_control(Rect::new(100.0, 200.0, 120.0, 300.0), &viewport(1000.0, 800.0), &m);
        assert!(!p.is_bottom);
        assert_eq!(p.top, 130.0);
        assert_eq!(p.left, 250.0 - 30.0);
    }

    #[test]
    fn control_flips_above_selection_in_bottom_half() {
        let m = PlacementMetrics::default();
        let p = place_control(Rect::new(600.0, 200.0, 620.0, 300.0), &viewport(1000.0, 800.0), &m);
        assert!(p.is_bottom);
        // bottom edge of the control sits `gap` above the selection top
        assert_eq!(p.top + m.control_height, 600.0 - m.gap);
    }

    #[test]
    fn midpoint_is_not_bottom() {
        assert!(!is_bottom_half(400.0, 800.0));
        assert!(is_bottom_half(400.5, 800.0));
    }

    #[test]
    fn control_is_clamped_to_viewport_edges() {
        let m = PlacementMetrics::default();
        let vp = viewport(500.0, 800.0);
        let left_edge = place_control(Rect::new(10.0, 0.0, 20.0, 4.0), &vp, &m);
        assert_eq!(left_edge.left, 0.0);
        let right_edge = place_control(Rect::new(10.0, 480.0, 20.0, 500.0), &vp, &m);
        assert_eq!(right_edge.left, 500.0 - m.control_width);
    }

    #[test]
    fn scroll_offset_is_removed_before_planning() {
        let m = PlacementMetrics::default();
        let vp = Viewport {
            width: 1000.0,
            height: 800.0,
            scroll_x: 0.0,
            scroll_y: 2000.0,
        };
        // Document y 2100 is viewport y 100, top half.
        let p = place_control(Rect::new(2080.0, 100.0, 2100.0, 200.0), &vp, &m);
        assert!(!p.is_bottom);
        assert_eq!(p.top, 110.0);
    }

    #[test]
    fn clamp_left_holds_for_many_inputs() {
        for vw in [300.0, 640.0, 1920.0] {
            for w in [24.0, 60.0, 256.0] {
                for left in [-500.0, -1.0, 0.0, 17.5, 299.0, 5000.0] {
                    let l = clamp_left(left, w, vw);
                    assert!(l >= 0.0 && l <= vw - w, "left={left} w={w} vw={vw} -> {l}");
                }
            }
        }
    }

    #[test]
    fn panel_opens_on_the_control_side() {
        let m = PlacementMetrics::default();
        let vp = viewport(1000.0, 800.0);
        let below = Placement {
            top: 130.0,
            left: 900.0,
            is_bottom: false,
        };
        let p = place_panel(below, &vp, &m);
        assert_eq!(p.top, 150.0);
        assert_eq!(p.left, 1000.0 - m.panel_width);
        assert!(!p.is_bottom);

        let above = Placement {
            top: 566.0,
            left: 100.0,
            is_bottom: true,
        };
        let p = place_panel(above, &vp, &m);
        assert_eq!(p.top + m.panel_height, 566.0 + m.control_height - m.panel_offset);
        assert!(p.is_bottom);
    }

    #[test]
    fn drag_never_flips() {
        let p = drag_to((300.0, 200.0), (12.0, 8.0));
        assert_eq!((p.left, p.top, p.is_bottom), (288.0, 192.0, false));
    }
}

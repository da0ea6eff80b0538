//! The floating action control shown next to a qualifying selection.

use rw_core::geometry::clamp_left;
use rw_core::{Placement, PlacementMetrics, SelectionDescriptor, Viewport, place_control};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActionControl {
    #[default]
    Hidden,
    Visible {
        placement: Placement,
        /// The selection the control was shown for; handed to the panel on click.
        descriptor: SelectionDescriptor,
    },
}

impl ActionControl {
    /// Show the control for `descriptor`, replacing any previous one.
    pub fn show(
        &mut self,
        descriptor: SelectionDescriptor,
        viewport: &Viewport,
        metrics: &PlacementMetrics,
    ) {
        let placement = place_control(descriptor.bounds(), viewport, metrics);
        *self = Self::Visible {
            placement,
            descriptor,
        };
    }

    /// Hide the control. Returns whether it was visible.
    pub fn hide(&mut self) -> bool {
        let was_visible = self.is_visible();
        *self = Self::Hidden;
        was_visible
    }

    /// Hide the control and hand over what it was showing.
    pub fn take(&mut self) -> Option<(Placement, SelectionDescriptor)> {
        match std::mem::take(self) {
            Self::Visible {
                placement,
                descriptor,
            } => Some((placement, descriptor)),
            Self::Hidden => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Visible { .. })
    }

    pub fn placement(&self) -> Option<Placement> {
        match self {
            Self::Visible { placement, .. } => Some(*placement),
            Self::Hidden => None,
        }
    }

    /// Keep the control inside a resized viewport.
    pub fn clamp_to(&mut self, viewport: &Viewport, metrics: &PlacementMetrics) {
        if let Self::Visible { placement, .. } = self {
            placement.left = clamp_left(placement.left, metrics.control_width, viewport.width);
        }
    }
}

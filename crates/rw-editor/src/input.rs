//! Input abstraction layer.
//!
//! Everything the page, the overlay, timers and the network report to the
//! controller is normalized into one `HostEvent` enum. Timestamps are
//! milliseconds from any monotonic clock the host likes.

use crate::service::Ticket;
use rw_core::api::Agent;
use rw_core::{AgentId, RewriteError, RewriteSuggestion};

/// Modifier keys held during a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on Linux/Windows, ⌘ on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    pub fn from_flags(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Self {
        Self {
            shift,
            ctrl,
            alt,
            meta,
        }
    }
}

/// A normalized event from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    // ── Page ──
    /// `selectionchange` on the document.
    SelectionChange { now_ms: f64 },
    MouseUp { now_ms: f64 },
    KeyUp {
        key: String,
        modifiers: Modifiers,
        now_ms: f64,
    },
    KeyDown {
        key: String,
        modifiers: Modifiers,
        now_ms: f64,
    },
    /// Pointer pressed anywhere; `on_overlay` when it landed on our own UI.
    MouseDown { on_overlay: bool },
    /// The user typed into the page.
    Input,
    VisibilityChanged { visible: bool },
    ViewportResized,

    // ── Timers ──
    /// A timer requested with `Effect::ScheduleTick` fired.
    Tick { now_ms: f64 },

    // ── Overlay ──
    ControlClicked,
    /// Pointer pressed on the panel chrome, viewport coordinates.
    PanelPointerDown { x: f64, y: f64 },
    PanelPointerMove { x: f64, y: f64 },
    PanelPointerUp,
    AgentMenuToggled,
    AgentChosen { agent: AgentId },
    NoteEdited { note: String },
    RewriteClicked,
    ApproveClicked,
    CloseClicked,

    // ── Completions ──
    SessionLoaded { token: Option<String> },
    AgentsLoaded {
        ticket: Ticket,
        result: Result<Vec<Agent>, RewriteError>,
    },
    RewriteFinished {
        ticket: Ticket,
        result: Result<RewriteSuggestion, RewriteError>,
    },
    ApprovalAcknowledged { result: Result<(), RewriteError> },
}

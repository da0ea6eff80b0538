//! Host-agnostic state machines for the rewrite flow.
//!
//! The browser bridge (or a test) feeds `HostEvent`s into a `Controller`
//! together with an `EditableHost`, and performs the `Effect`s it returns.

pub mod control;
pub mod controller;
pub mod input;
pub mod panel;
pub mod service;
pub mod session;
pub mod shortcuts;
pub mod tracker;

pub use control::ActionControl;
pub use controller::{Controller, Effect, Effects};
pub use input::{HostEvent, Modifiers};
pub use panel::{PanelPhase, PanelState, PanelView, RewritePanel};
pub use service::{RemoteCall, RemoteRequest, RewriteApi, Ticket, perform};
pub use session::{MemoryPreferences, PreferenceStore, SessionState};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tracker::{SelectionTracker, TrackerUpdate, qualify};

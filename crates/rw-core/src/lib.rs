pub mod api;
pub mod config;
pub mod debounce;
pub mod error;
pub mod geometry;
pub mod host;
pub mod id;
pub mod model;
pub mod page;
pub mod replace;
pub mod text;

pub use config::RewriteConfig;
pub use debounce::Debouncer;
pub use error::{RemoteCallKind, RewriteError};
pub use geometry::{PlacementMetrics, Viewport, place_control, place_panel};
pub use host::{EditableHost, RawSelection};
pub use id::{AgentId, ElementId};
pub use model::*;
pub use page::HeadlessPage;
pub use replace::{Replaced, replace_selection};

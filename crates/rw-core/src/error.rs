use std::fmt;

/// Which remote call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCallKind {
    ListAgents,
    Generate,
    MarkApproved,
}

impl fmt::Display for RemoteCallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RemoteCallKind::ListAgents => "agent list",
            RemoteCallKind::Generate => "rewrite",
            RemoteCallKind::MarkApproved => "approval",
        })
    }
}

/// Errors surfaced by the rewrite flow.
///
/// "No qualifying selection" is not an error; it is `None` wherever a
/// descriptor is expected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RewriteError {
    #[error("{call} request failed: {reason}")]
    RemoteCallFailed { call: RemoteCallKind, reason: String },

    #[error("the selected text changed before it could be replaced ({reason})")]
    ReplacementTargetStale { reason: String },

    #[error("this field cannot be edited")]
    UnsupportedSurface,

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
}

impl RewriteError {
    pub fn remote(call: RemoteCallKind, reason: impl Into<String>) -> Self {
        Self::RemoteCallFailed {
            call,
            reason: reason.into(),
        }
    }

    pub fn stale(reason: impl Into<String>) -> Self {
        Self::ReplacementTargetStale {
            reason: reason.into(),
        }
    }
}

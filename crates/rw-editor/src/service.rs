//! Remote rewrite service boundary.
//!
//! The controller never awaits anything. It emits `RemoteCall`s as effects;
//! the host runs them with `perform` against some `RewriteApi` and feeds the
//! returned completion event back in. Each call carries the `Ticket` of the
//! panel that asked for it so late answers for a closed panel are dropped.

use crate::input::HostEvent;
use rw_core::api::{Agent, ApproveRequest, GenerateRequest, GenerateResponse};
use rw_core::{RemoteCallKind, RewriteError};
use std::fmt;

/// Identifies one panel instance (or one request within it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Ticket(u64);

impl Ticket {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What to ask the service.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteRequest {
    ListAgents,
    Generate(GenerateRequest),
    MarkApproved(ApproveRequest),
}

impl RemoteRequest {
    pub fn kind(&self) -> RemoteCallKind {
        match self {
            Self::ListAgents => RemoteCallKind::ListAgents,
            Self::Generate(_) => RemoteCallKind::Generate,
            Self::MarkApproved(_) => RemoteCallKind::MarkApproved,
        }
    }
}

/// A request ready to run, with the credential captured at emit time.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub ticket: Ticket,
    pub token: Option<String>,
    pub request: RemoteRequest,
}

/// The remote rewrite service.
///
/// Futures are awaited on the single UI thread, so no `Send` bound.
#[allow(async_fn_in_trait)]
pub trait RewriteApi {
    async fn list_agents(&self, token: &str) -> Result<Vec<Agent>, RewriteError>;

    async fn generate(
        &self,
        token: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, RewriteError>;

    async fn mark_approved(&self, token: &str, request: &ApproveRequest)
    -> Result<(), RewriteError>;
}

/// Run one call and turn its outcome into the completion event.
///
/// A call without a token is not attempted.
pub async fn perform<A: RewriteApi>(api: &A, call: RemoteCall) -> HostEvent {
    let RemoteCall {
        ticket,
        token,
        request,
    } = call;
    let kind = request.kind();
    let token = token.ok_or_else(|| RewriteError::remote(kind, "not logged in"));

    match request {
        RemoteRequest::ListAgents => {
            let result = match &token {
                Ok(t) => api.list_agents(t).await,
                Err(e) => Err(e.clone()),
            };
            HostEvent::AgentsLoaded { ticket, result }
        }
        RemoteRequest::Generate(body) => {
            let result = match &token {
                Ok(t) => api.generate(t, &body).await.map(Into::into),
                Err(e) => Err(e.clone()),
            };
            HostEvent::RewriteFinished { ticket, result }
        }
        RemoteRequest::MarkApproved(body) => {
            let result = match &token {
                Ok(t) => api.mark_approved(t, &body).await,
                Err(e) => Err(e.clone()),
            };
            HostEvent::ApprovalAcknowledged { result }
        }
    }
}

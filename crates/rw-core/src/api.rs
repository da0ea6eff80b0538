//! Wire types for the remote rewrite service.
//!
//! Field names follow the service's JSON (`camelCase`). The HTTP transport
//! lives with the host; this module only knows paths, methods and bodies.

use crate::id::AgentId;
use serde::{Deserialize, Serialize};

/// Agent lifecycle status as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Inactive,
    #[serde(other)]
    Unknown,
}

/// A configured rewrite persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub status: AgentStatus,
}

impl Agent {
    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}

/// Keep only the agents a user may pick.
pub fn active_agents(agents: Vec<Agent>) -> Vec<Agent> {
    agents.into_iter().filter(Agent::is_active).collect()
}

/// Body of `POST rewrite/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub agent_id: AgentId,
    pub original_text: String,
    pub note: String,
}

/// Response of `POST rewrite/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub activity_id: String,
    pub agent_id: AgentId,
    pub original: String,
    #[serde(default)]
    pub prompt: String,
    pub suggestion: String,
}

/// Body of `POST rewrite/mark-as-approved`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub activity_id: String,
}

/// The three service endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ListAgents,
    Generate,
    MarkApproved,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::ListAgents => "api/agents",
            Endpoint::Generate => "api/rewrite/generate",
            Endpoint::MarkApproved => "api/rewrite/mark-as-approved",
        }
    }

    pub fn method(self) -> &'static str {
        match self {
            Endpoint::ListAgents => "GET",
            Endpoint::Generate | Endpoint::MarkApproved => "POST",
        }
    }

    /// Join the endpoint path onto `base`, tolerating a trailing slash.
    pub fn url(self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.path())
    }
}

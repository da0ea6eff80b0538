//! Process-scoped state shared across panel instances.
//!
//! The session token and the last used agent are plain last-write-wins
//! values. The controller owns them; the host loads them at mount and
//! writes preferences back through `PreferenceStore`.

use rw_core::AgentId;

/// Login status as reported by the session bridge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    token: Option<String>,
}

impl SessionState {
    pub fn new(token: Option<String>) -> Self {
        let mut session = Self::default();
        session.set_token(token);
        session
    }

    /// Replace the token. Empty tokens count as logged out.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|t| !t.trim().is_empty());
    }

    /// Opaque bearer credential for remote calls.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn logged_in(&self) -> bool {
        self.token.is_some()
    }
}

/// Persistent user preferences.
pub trait PreferenceStore {
    /// The agent used for the last rewrite, if any was saved.
    fn last_agent(&self) -> Option<AgentId>;

    fn save_last_agent(&mut self, agent: &AgentId);
}

/// Preferences kept in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    last_agent: Option<AgentId>,
}

impl MemoryPreferences {
    pub fn with_last_agent(agent: AgentId) -> Self {
        Self {
            last_agent: Some(agent),
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn last_agent(&self) -> Option<AgentId> {
        self.last_agent.clone()
    }

    fn save_last_agent(&mut self, agent: &AgentId) {
        self.last_agent = Some(agent.clone());
    }
}

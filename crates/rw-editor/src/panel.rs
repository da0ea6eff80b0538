//! Rewrite panel state machine.
//!
//! ```text
//!   open ──► AwaitingInput ──request──► Fetching ──ok──► SuggestionReady
//!                 ▲                       │                  │   │
//!                 └──────── error ────────┘ (back to prior)  │   └─request──► Fetching
//!                                                            └─approve──► (closed)
//! ```
//!
//! A panel is opened with the descriptor handed over by the action control
//! and keeps it for its whole life. Every remote request it makes carries a
//! `Ticket`; completions whose ticket doesn't match what the panel is
//! waiting for are stale and ignored.

use crate::service::Ticket;
use rw_core::api::{Agent, GenerateRequest, active_agents};
use rw_core::geometry::{clamp_left, drag_to};
use rw_core::{
    AgentId, Placement, PlacementMetrics, RewriteError, RewriteSuggestion, SelectionDescriptor,
    Viewport,
};
use serde::Serialize;

/// Where the panel is in the rewrite flow.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelState {
    AwaitingInput,
    Fetching {
        ticket: Ticket,
        /// Suggestion shown before this request, restored if it fails.
        previous: Option<RewriteSuggestion>,
    },
    SuggestionReady(RewriteSuggestion),
}

impl PanelState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingInput => "awaiting input",
            Self::Fetching { .. } => "fetching",
            Self::SuggestionReady(_) => "showing a suggestion",
        }
    }
}

/// The account's agents as far as the panel knows.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentsState {
    Loading { ticket: Ticket },
    Failed,
    Ready {
        /// Active agents only.
        agents: Vec<Agent>,
        chosen: Option<AgentId>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewritePanel {
    descriptor: SelectionDescriptor,
    placement: Placement,
    state: PanelState,
    agents: AgentsState,
    menu_open: bool,
    note: String,
    error: Option<String>,
    /// Grab point relative to the panel's top-left while dragging.
    grab: Option<(f64, f64)>,
}

impl RewritePanel {
    /// Open a panel and start loading agents under `agents_ticket`.
    pub fn open(descriptor: SelectionDescriptor, placement: Placement, agents_ticket: Ticket) -> Self {
        Self {
            descriptor,
            placement,
            state: PanelState::AwaitingInput,
            agents: AgentsState::Loading {
                ticket: agents_ticket,
            },
            menu_open: false,
            note: String::new(),
            error: None,
            grab: None,
        }
    }

    pub fn descriptor(&self) -> &SelectionDescriptor {
        &self.descriptor
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn agents(&self) -> &AgentsState {
        &self.agents
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn suggestion(&self) -> Option<&RewriteSuggestion> {
        match &self.state {
            PanelState::SuggestionReady(s) => Some(s),
            _ => None,
        }
    }

    pub fn chosen_agent(&self) -> Option<&AgentId> {
        match &self.agents {
            AgentsState::Ready { chosen, .. } => chosen.as_ref(),
            _ => None,
        }
    }

    /// Agents loaded and none of them active.
    pub fn needs_agent(&self) -> bool {
        matches!(&self.agents, AgentsState::Ready { agents, .. } if agents.is_empty())
    }

    // ─── Agents ──────────────────────────────────────────────────────────

    /// Apply the agent list. `last_used` is preferred when it is still
    /// active. Returns `false` for a stale ticket.
    pub fn agents_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Agent>, RewriteError>,
        last_used: Option<AgentId>,
    ) -> bool {
        if self.agents != (AgentsState::Loading { ticket }) {
            return false;
        }
        match result {
            Ok(all) => {
                let agents = active_agents(all);
                let chosen = last_used
                    .filter(|id| agents.iter().any(|a| &a.id == id))
                    .or_else(|| agents.first().map(|a| a.id.clone()));
                log::debug!("{} active agents, chose {chosen:?}", agents.len());
                self.agents = AgentsState::Ready { agents, chosen };
            }
            Err(e) => {
                log::warn!("{e}");
                self.error = Some(e.to_string());
                self.agents = AgentsState::Failed;
            }
        }
        true
    }

    /// Pick an agent from the menu; it must be one of the active agents.
    pub fn choose_agent(&mut self, agent: &AgentId) -> Result<(), RewriteError> {
        let AgentsState::Ready { agents, chosen } = &mut self.agents else {
            return Err(RewriteError::InvalidTransition {
                state: "agents are not loaded",
                action: "choose an agent",
            });
        };
        if !agents.iter().any(|a| &a.id == agent) {
            return Err(RewriteError::InvalidTransition {
                state: "the agent is not active",
                action: "choose an agent",
            });
        }
        *chosen = Some(agent.clone());
        self.menu_open = false;
        Ok(())
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    /// Returns whether the menu was open.
    pub fn close_menu(&mut self) -> bool {
        std::mem::replace(&mut self.menu_open, false)
    }

    pub fn set_note(&mut self, note: String) {
        self.note = note;
    }

    // ─── Rewrite ─────────────────────────────────────────────────────────

    /// Move to `Fetching` under `ticket` and build the request body.
    pub fn request_rewrite(&mut self, ticket: Ticket) -> Result<GenerateRequest, RewriteError> {
        if matches!(self.state, PanelState::Fetching { .. }) {
            return Err(RewriteError::InvalidTransition {
                state: self.state.name(),
                action: "request a rewrite",
            });
        }
        let Some(agent_id) = self.chosen_agent().cloned() else {
            return Err(RewriteError::InvalidTransition {
                state: "no agent is chosen",
                action: "request a rewrite",
            });
        };

        let previous = match std::mem::replace(&mut self.state, PanelState::AwaitingInput) {
            PanelState::SuggestionReady(s) => Some(s),
            _ => None,
        };
        self.state = PanelState::Fetching { ticket, previous };
        self.error = None;
        self.menu_open = false;
        log::debug!("panel fetching rewrite {ticket}");
        Ok(GenerateRequest {
            agent_id,
            original_text: self.descriptor.text().to_string(),
            note: self.note.clone(),
        })
    }

    /// Apply a rewrite result. Returns `false` for a stale ticket.
    pub fn rewrite_finished(
        &mut self,
        ticket: Ticket,
        result: Result<RewriteSuggestion, RewriteError>,
    ) -> bool {
        let previous = match &mut self.state {
            PanelState::Fetching {
                ticket: waiting,
                previous,
            } if *waiting == ticket => previous.take(),
            _ => return false,
        };
        match result {
            Ok(suggestion) => {
                log::debug!("suggestion ready for activity {}", suggestion.activity_id);
                self.state = PanelState::SuggestionReady(suggestion);
            }
            Err(e) => {
                log::warn!("{e}");
                self.error = Some(e.to_string());
                self.state = match previous {
                    Some(s) => PanelState::SuggestionReady(s),
                    None => PanelState::AwaitingInput,
                };
            }
        }
        true
    }

    /// Approval is only possible with a suggestion on screen.
    pub fn check_approve(&self) -> Result<&RewriteSuggestion, RewriteError> {
        self.suggestion().ok_or(RewriteError::InvalidTransition {
            state: self.state.name(),
            action: "approve",
        })
    }

    // ─── Dragging ────────────────────────────────────────────────────────

    pub fn begin_drag(&mut self, x: f64, y: f64) {
        self.grab = Some((x - self.placement.left, y - self.placement.top));
    }

    /// Follow the pointer. Returns whether the panel moved.
    pub fn drag(&mut self, x: f64, y: f64) -> bool {
        let Some(grab) = self.grab else {
            return false;
        };
        self.placement = drag_to((x, y), grab);
        true
    }

    pub fn end_drag(&mut self) {
        self.grab = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    /// Keep the panel inside a resized viewport.
    pub fn clamp_to(&mut self, viewport: &Viewport, metrics: &PlacementMetrics) {
        self.placement.left = clamp_left(self.placement.left, metrics.panel_width, viewport.width);
    }

    // ─── View ────────────────────────────────────────────────────────────

    /// Everything the overlay needs to draw the panel.
    pub fn view(&self) -> PanelView {
        let phase = match &self.state {
            PanelState::AwaitingInput => PanelPhase::AwaitingInput,
            PanelState::Fetching { .. } => PanelPhase::Fetching,
            PanelState::SuggestionReady(_) => PanelPhase::SuggestionReady,
        };
        let agents = match &self.agents {
            AgentsState::Ready { agents, .. } => agents
                .iter()
                .map(|a| AgentOption {
                    id: a.id.clone(),
                    name: a.name.clone(),
                })
                .collect(),
            _ => Vec::new(),
        };
        let chosen = self.chosen_agent().cloned();
        let chosen_name = match &self.agents {
            AgentsState::Ready { agents, .. } => agents
                .iter()
                .find(|a| Some(&a.id) == chosen.as_ref())
                .map(|a| a.name.clone()),
            _ => None,
        };
        let has_agent = chosen.is_some();
        PanelView {
            placement: self.placement,
            phase,
            agents_loading: matches!(self.agents, AgentsState::Loading { .. }),
            agents,
            chosen_agent: chosen,
            chosen_agent_name: chosen_name,
            menu_open: self.menu_open,
            show_cta: self.needs_agent(),
            original_text: self.descriptor.text().to_string(),
            note: self.note.clone(),
            suggestion: self.suggestion().map(|s| s.suggested_text.clone()),
            error: self.error.clone(),
            can_rewrite: has_agent && phase != PanelPhase::Fetching,
            can_approve: phase == PanelPhase::SuggestionReady,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PanelPhase {
    AwaitingInput,
    Fetching,
    SuggestionReady,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentOption {
    pub id: AgentId,
    pub name: String,
}

/// Render model of an open panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub placement: Placement,
    pub phase: PanelPhase,
    pub agents_loading: bool,
    pub agents: Vec<AgentOption>,
    pub chosen_agent: Option<AgentId>,
    pub chosen_agent_name: Option<String>,
    pub menu_open: bool,
    /// No active agent: offer to create one instead of rewrite controls.
    pub show_cta: bool,
    pub original_text: String,
    pub note: String,
    pub suggestion: Option<String>,
    pub error: Option<String>,
    pub can_rewrite: bool,
    pub can_approve: bool,
}

//! The single event-dispatch entry point.
//!
//! `Controller::handle` takes one `HostEvent` and the page, updates the
//! tracker, the action control and the panel, and returns the `Effect`s the
//! host must carry out: timers, redraws, remote calls, login redirects and
//! user notices. Completions of those effects come back in as events.

use crate::control::ActionControl;
use crate::input::HostEvent;
use crate::panel::{PanelView, RewritePanel};
use crate::service::{RemoteCall, RemoteRequest, Ticket};
use crate::session::{PreferenceStore, SessionState};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tracker::{SelectionTracker, TrackerUpdate};
use rw_core::api::ApproveRequest;
use rw_core::{
    EditableHost, Placement, PlacementState, RewriteConfig, RewriteError, place_panel,
    replace_selection,
};
use smallvec::{SmallVec, smallvec};

/// Something the host has to do on the controller's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver `HostEvent::Tick` after `delay_ms`.
    ScheduleTick { delay_ms: f64 },
    /// Redraw the overlay from `Controller::placement_state` and `panel_view`.
    Render,
    /// Only the panel moved; update its position without a full redraw.
    Reposition(Placement),
    /// Run a remote call and feed back its completion.
    Remote(RemoteCall),
    /// Ask the session bridge for the current token.
    RefreshSession,
    /// Open the login page in a new tab.
    OpenLogin { url: String },
    /// Show a short message to the user.
    Notify { message: String },
}

pub type Effects = SmallVec<[Effect; 4]>;

pub struct Controller<P: PreferenceStore> {
    config: RewriteConfig,
    session: SessionState,
    prefs: P,
    tracker: SelectionTracker,
    control: ActionControl,
    panel: Option<RewritePanel>,
    last_ticket: Ticket,
}

impl<P: PreferenceStore> Controller<P> {
    pub fn new(config: RewriteConfig, session: SessionState, prefs: P) -> Self {
        let tracker = SelectionTracker::new(config.debounce_ms);
        Self {
            config,
            session,
            prefs,
            tracker,
            control: ActionControl::Hidden,
            panel: None,
            last_ticket: Ticket::default(),
        }
    }

    /// Effects to run once the host is wired up.
    pub fn start(&self) -> Effects {
        smallvec![Effect::RefreshSession]
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn preferences(&self) -> &P {
        &self.prefs
    }

    pub fn control(&self) -> &ActionControl {
        &self.control
    }

    pub fn panel(&self) -> Option<&RewritePanel> {
        self.panel.as_ref()
    }

    pub fn panel_view(&self) -> Option<PanelView> {
        self.panel.as_ref().map(RewritePanel::view)
    }

    /// Where the control or the panel currently sits; never both.
    pub fn placement_state(&self) -> PlacementState {
        let mut state = PlacementState::default();
        if let Some(panel) = &self.panel {
            state.show_panel(panel.placement());
        } else if let Some(placement) = self.control.placement() {
            state.show_control(placement);
        }
        state
    }

    /// Process one event.
    pub fn handle<H: EditableHost>(&mut self, event: HostEvent, host: &mut H) -> Effects {
        let mut fx = Effects::new();
        match event {
            HostEvent::SelectionChange { now_ms }
            | HostEvent::MouseUp { now_ms }
            | HostEvent::KeyUp { now_ms, .. } => {
                if self.panel.is_none() {
                    let delay_ms = self.tracker.observe(now_ms, host.snapshot_selection());
                    fx.push(Effect::ScheduleTick { delay_ms });
                }
            }
            HostEvent::Tick { now_ms } => self.on_tick(now_ms, host, &mut fx),
            HostEvent::KeyDown {
                key,
                modifiers,
                now_ms,
            } => match ShortcutMap::resolve(&key, modifiers) {
                Some(ShortcutAction::SelectAll) if self.panel.is_none() => {
                    let delay_ms = self.tracker.schedule_resample(now_ms);
                    fx.push(Effect::ScheduleTick { delay_ms });
                }
                Some(ShortcutAction::Dismiss) if self.panel.is_some() => {
                    self.close_panel();
                    fx.push(Effect::Render);
                }
                Some(ShortcutAction::Submit) if self.panel.is_some() => {
                    if self.panel.as_ref().is_some_and(|p| p.suggestion().is_some()) {
                        self.approve(host, &mut fx);
                    } else {
                        self.request_rewrite(&mut fx);
                    }
                }
                _ => {}
            },
            HostEvent::MouseDown { on_overlay } => {
                if on_overlay {
                    return fx;
                }
                match &mut self.panel {
                    Some(panel) => {
                        if panel.close_menu() {
                            fx.push(Effect::Render);
                        }
                    }
                    None => self.hide_control(&mut fx),
                }
            }
            HostEvent::Input => {
                if self.panel.is_none() {
                    self.hide_control(&mut fx);
                }
            }
            HostEvent::VisibilityChanged { visible } => {
                if visible {
                    fx.push(Effect::RefreshSession);
                }
            }
            HostEvent::ViewportResized => {
                let viewport = host.viewport();
                self.control.clamp_to(&viewport, &self.config.metrics);
                if let Some(panel) = &mut self.panel {
                    panel.clamp_to(&viewport, &self.config.metrics);
                }
                fx.push(Effect::Render);
            }

            HostEvent::ControlClicked => self.on_control_clicked(host, &mut fx),
            HostEvent::PanelPointerDown { x, y } => {
                if let Some(panel) = &mut self.panel {
                    panel.begin_drag(x, y);
                    if panel.close_menu() {
                        fx.push(Effect::Render);
                    }
                }
            }
            HostEvent::PanelPointerMove { x, y } => {
                if let Some(panel) = &mut self.panel
                    && panel.drag(x, y)
                {
                    fx.push(Effect::Reposition(panel.placement()));
                }
            }
            HostEvent::PanelPointerUp => {
                if let Some(panel) = &mut self.panel {
                    panel.end_drag();
                }
            }
            HostEvent::AgentMenuToggled => {
                if let Some(panel) = &mut self.panel {
                    panel.toggle_menu();
                    fx.push(Effect::Render);
                }
            }
            HostEvent::AgentChosen { agent } => {
                if let Some(panel) = &mut self.panel {
                    match panel.choose_agent(&agent) {
                        Ok(()) => {
                            self.prefs.save_last_agent(&agent);
                            fx.push(Effect::Render);
                        }
                        Err(e) => log::warn!("{e}"),
                    }
                }
            }
            HostEvent::NoteEdited { note } => {
                if let Some(panel) = &mut self.panel {
                    panel.set_note(note);
                }
            }
            HostEvent::RewriteClicked => self.request_rewrite(&mut fx),
            HostEvent::ApproveClicked => self.approve(host, &mut fx),
            HostEvent::CloseClicked => {
                if self.panel.is_some() {
                    self.close_panel();
                    fx.push(Effect::Render);
                }
            }

            HostEvent::SessionLoaded { token } => {
                self.session.set_token(token);
                log::info!(
                    "session refreshed: {}",
                    if self.session.logged_in() {
                        "logged in"
                    } else {
                        "logged out"
                    }
                );
            }
            HostEvent::AgentsLoaded { ticket, result } => {
                let last_used = self.prefs.last_agent();
                let applied = match &mut self.panel {
                    Some(panel) => panel.agents_loaded(ticket, result, last_used),
                    None => false,
                };
                if applied {
                    fx.push(Effect::Render);
                } else {
                    log::debug!("dropping stale agent list {ticket}");
                }
            }
            HostEvent::RewriteFinished { ticket, result } => {
                let applied = match &mut self.panel {
                    Some(panel) => panel.rewrite_finished(ticket, result),
                    None => false,
                };
                if applied {
                    fx.push(Effect::Render);
                } else {
                    log::debug!("dropping stale rewrite result {ticket}");
                }
            }
            HostEvent::ApprovalAcknowledged { result } => match result {
                Ok(()) => log::debug!("approval acknowledged"),
                Err(e) => log::warn!("{e}"),
            },
        }
        fx
    }

    // ─── Selection ───────────────────────────────────────────────────────

    fn on_tick<H: EditableHost>(&mut self, now_ms: f64, host: &H, fx: &mut Effects) {
        if self.panel.is_some() {
            return;
        }
        let update = if self.tracker.take_resample(now_ms) {
            self.tracker.evaluate(&host.snapshot_selection())
        } else {
            self.tracker.poll(now_ms)
        };
        match update {
            Some(TrackerUpdate::Captured(descriptor)) => {
                self.control
                    .show(descriptor, &host.viewport(), &self.config.metrics);
                fx.push(Effect::Render);
            }
            Some(TrackerUpdate::Cleared) => {
                if self.control.hide() {
                    fx.push(Effect::Render);
                }
            }
            None => {}
        }
        if let Some(delay_ms) = self.tracker.next_due(now_ms) {
            fx.push(Effect::ScheduleTick { delay_ms });
        }
    }

    fn hide_control(&mut self, fx: &mut Effects) {
        if self.control.hide() {
            self.tracker.reset();
            fx.push(Effect::Render);
        }
    }

    // ─── Control → panel ─────────────────────────────────────────────────

    fn on_control_clicked<H: EditableHost>(&mut self, host: &H, fx: &mut Effects) {
        if self.panel.is_some() {
            return;
        }
        if !self.session.logged_in() {
            log::info!("not logged in, opening login page");
            self.hide_control(fx);
            fx.push(Effect::OpenLogin {
                url: self.config.login_url.clone(),
            });
            // Pick up a login that finished in the new tab.
            fx.push(Effect::RefreshSession);
            return;
        }
        let Some((placement, descriptor)) = self.control.take() else {
            return;
        };
        let panel_placement = place_panel(placement, &host.viewport(), &self.config.metrics);
        let ticket = self.issue_ticket();
        log::debug!("panel {ticket} opened for {}", descriptor.element());
        self.panel = Some(RewritePanel::open(descriptor, panel_placement, ticket));
        fx.push(self.remote(ticket, RemoteRequest::ListAgents));
        fx.push(Effect::Render);
    }

    // ─── Panel actions ───────────────────────────────────────────────────

    fn request_rewrite(&mut self, fx: &mut Effects) {
        if self.panel.is_none() {
            return;
        }
        let ticket = self.issue_ticket();
        let Some(panel) = &mut self.panel else {
            return;
        };
        match panel.request_rewrite(ticket) {
            Ok(body) => {
                fx.push(self.remote(ticket, RemoteRequest::Generate(body)));
                fx.push(Effect::Render);
            }
            Err(e) => log::debug!("{e}"),
        }
    }

    fn approve<H: EditableHost>(&mut self, host: &mut H, fx: &mut Effects) {
        let suggestion = match self.panel.as_ref().map(RewritePanel::check_approve) {
            Some(Ok(suggestion)) => suggestion.clone(),
            Some(Err(e)) => {
                log::debug!("{e}");
                return;
            }
            None => return,
        };
        let Some(panel) = self.panel.take() else {
            return;
        };
        self.tracker.reset();

        match replace_selection(host, panel.descriptor(), &suggestion.suggested_text) {
            Ok(_) => {
                let ticket = self.issue_ticket();
                let ack = ApproveRequest {
                    activity_id: suggestion.activity_id.clone(),
                };
                fx.push(self.remote(ticket, RemoteRequest::MarkApproved(ack)));
            }
            Err(e) => fx.push(Effect::Notify {
                message: user_message(&e),
            }),
        }
        fx.push(Effect::Render);
    }

    fn close_panel(&mut self) {
        if self.panel.take().is_some() {
            log::debug!("panel closed");
        }
        self.tracker.reset();
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.last_ticket = self.last_ticket.next();
        self.last_ticket
    }

    fn remote(&self, ticket: Ticket, request: RemoteRequest) -> Effect {
        Effect::Remote(RemoteCall {
            ticket,
            token: self.session.token().map(str::to_string),
            request,
        })
    }
}

fn user_message(error: &RewriteError) -> String {
    match error {
        RewriteError::ReplacementTargetStale { .. } => {
            "The selected text changed, so the rewrite was not applied.".to_string()
        }
        other => other.to_string(),
    }
}

//! Wiring between the page, the controller and the browser.
//!
//! Listeners, the timer and finished requests all turn into `HostEvent`s fed
//! through `Runtime::dispatch`. Dispatch is re-entrant: an event raised while
//! the controller is busy (the synthetic `input` fired by a replacement, for
//! one) is queued and picked up by the outer drain loop.

use crate::bridge::{self, PageMessage};
use crate::fetch::FetchApi;
use crate::markup;
use crate::overlay::{Overlay, OverlayAction, action_of};
use crate::page::DomPage;
use crate::storage::LocalStoragePreferences;
use rw_core::{AgentId, RewriteConfig};
use rw_editor::{Controller, Effect, Effects, HostEvent, Modifiers, SessionState, perform};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Event, EventTarget, HtmlTextAreaElement, KeyboardEvent, MessageEvent, MouseEvent,
    Window,
};

type Handler = Closure<dyn FnMut(Event)>;

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Handler,
}

struct Timer {
    handle: i32,
    due_ms: f64,
}

pub struct Runtime {
    window: Window,
    document: Document,
    controller: RefCell<Controller<LocalStoragePreferences>>,
    page: RefCell<DomPage>,
    overlay: Overlay,
    api: Rc<FetchApi>,
    queue: RefCell<VecDeque<HostEvent>>,
    timer: RefCell<Option<Timer>>,
    tick: RefCell<Option<Closure<dyn FnMut()>>>,
    listeners: RefCell<Vec<Listener>>,
    alive: Cell<bool>,
}

fn now_ms() -> f64 {
    js_sys::Date::now()
}

impl Runtime {
    /// Inject the overlay, install listeners and ask for the session.
    pub fn start(config: RewriteConfig) -> Result<Rc<Self>, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let overlay = Overlay::mount(&document, &config.root_id)?;
        let mut page = DomPage::new(window.clone(), document.clone());
        page.set_overlay(Some(overlay.host().clone()));

        let prefs = LocalStoragePreferences::new(config.storage_key.clone());
        let api = Rc::new(FetchApi::new(config.api_base.clone()));
        let controller = Controller::new(config, SessionState::default(), prefs);
        let start = controller.start();

        let runtime = Rc::new(Self {
            window,
            document,
            controller: RefCell::new(controller),
            page: RefCell::new(page),
            overlay,
            api,
            queue: RefCell::new(VecDeque::new()),
            timer: RefCell::new(None),
            tick: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            alive: Cell::new(true),
        });
        runtime.install_tick();
        if let Err(e) = runtime.install_listeners() {
            runtime.teardown();
            return Err(e);
        }
        runtime.apply_all(start);
        Ok(runtime)
    }

    /// Remove listeners, the pending timer and the overlay.
    pub fn teardown(&self) {
        self.alive.set(false);
        for Listener {
            target,
            kind,
            callback,
        } in self.listeners.borrow_mut().drain(..)
        {
            let _ = target.remove_event_listener_with_callback(kind, callback.as_ref().unchecked_ref());
        }
        if let Some(timer) = self.timer.borrow_mut().take() {
            self.window.clear_timeout_with_handle(timer.handle);
        }
        self.tick.borrow_mut().take();
        self.overlay.remove();
    }

    // ─── Dispatch ────────────────────────────────────────────────────────

    pub fn dispatch(self: &Rc<Self>, event: HostEvent) {
        if !self.alive.get() {
            return;
        }
        self.queue.borrow_mut().push_back(event);
        let Ok(mut controller) = self.controller.try_borrow_mut() else {
            return;
        };
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            let effects = controller.handle(event, &mut *self.page.borrow_mut());
            for effect in effects {
                self.apply(effect, &controller);
            }
        }
    }

    fn apply_all(self: &Rc<Self>, effects: Effects) {
        let Ok(controller) = self.controller.try_borrow() else {
            return;
        };
        for effect in effects {
            self.apply(effect, &controller);
        }
    }

    fn apply(self: &Rc<Self>, effect: Effect, controller: &Controller<LocalStoragePreferences>) {
        match effect {
            Effect::ScheduleTick { delay_ms } => self.schedule(delay_ms),
            Effect::Render => {
                let html = markup::render(
                    &controller.placement_state(),
                    controller.panel_view().as_ref(),
                    &controller.config().metrics,
                );
                self.overlay.render(&html);
            }
            Effect::Reposition(placement) => self.overlay.reposition(placement),
            Effect::Remote(call) => {
                let api = Rc::clone(&self.api);
                let runtime = Rc::downgrade(self);
                spawn_local(async move {
                    let event = perform(&*api, call).await;
                    if let Some(runtime) = runtime.upgrade() {
                        runtime.dispatch(event);
                    }
                });
            }
            Effect::RefreshSession => {
                let runtime = Rc::downgrade(self);
                spawn_local(async move {
                    let token = bridge::fetch_token().await;
                    if let Some(runtime) = runtime.upgrade() {
                        runtime.dispatch(HostEvent::SessionLoaded { token });
                    }
                });
            }
            Effect::OpenLogin { url } => self.open_tab(&url),
            Effect::Notify { message } => {
                if self.window.alert_with_message(&message).is_err() {
                    log::warn!("{message}");
                }
            }
        }
    }

    fn open_tab(&self, url: &str) {
        if !matches!(self.window.open_with_url_and_target(url, "_blank"), Ok(Some(_))) {
            log::warn!("could not open {url}");
        }
    }

    // ─── Timer ───────────────────────────────────────────────────────────

    fn install_tick(self: &Rc<Self>) {
        let runtime = Rc::downgrade(self);
        let tick = Closure::<dyn FnMut()>::new(move || {
            if let Some(runtime) = runtime.upgrade() {
                runtime.timer.borrow_mut().take();
                runtime.dispatch(HostEvent::Tick { now_ms: now_ms() });
            }
        });
        *self.tick.borrow_mut() = Some(tick);
    }

    /// One timer at a time; the earliest deadline wins. A tick that comes
    /// early is harmless, the controller reschedules what is still pending.
    fn schedule(&self, delay_ms: f64) {
        let due_ms = now_ms() + delay_ms;
        let mut timer = self.timer.borrow_mut();
        if timer.as_ref().is_some_and(|t| t.due_ms <= due_ms) {
            return;
        }
        if let Some(old) = timer.take() {
            self.window.clear_timeout_with_handle(old.handle);
        }
        let tick = self.tick.borrow();
        let Some(callback) = tick.as_ref() else {
            return;
        };
        match self.window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            delay_ms.max(0.0).ceil() as i32,
        ) {
            Ok(handle) => *timer = Some(Timer { handle, due_ms }),
            Err(_) => log::warn!("could not schedule the selection timer"),
        }
    }

    // ─── Listeners ───────────────────────────────────────────────────────

    fn listen(
        self: &Rc<Self>,
        target: &EventTarget,
        kind: &'static str,
        handler: impl Fn(&Rc<Self>, Event) + 'static,
    ) -> Result<(), JsValue> {
        let runtime = Rc::downgrade(self);
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(runtime) = runtime.upgrade() {
                handler(&runtime, event);
            }
        });
        target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
        self.listeners.borrow_mut().push(Listener {
            target: target.clone(),
            kind,
            callback,
        });
        Ok(())
    }

    fn install_listeners(self: &Rc<Self>) -> Result<(), JsValue> {
        let document: EventTarget = self.document.clone().into();
        let window: EventTarget = self.window.clone().into();
        let overlay = self.overlay.events().clone();

        // ── Page ──
        self.listen(&document, "selectionchange", |rt, _| {
            rt.dispatch(HostEvent::SelectionChange { now_ms: now_ms() });
        })?;
        self.listen(&document, "mouseup", |rt, _| {
            rt.dispatch(HostEvent::PanelPointerUp);
            rt.dispatch(HostEvent::MouseUp { now_ms: now_ms() });
        })?;
        self.listen(&document, "mousedown", |rt, event| {
            let on_overlay = rt.overlay.contains(event.target().as_ref());
            rt.dispatch(HostEvent::MouseDown { on_overlay });
        })?;
        self.listen(&document, "mousemove", |rt, event| {
            if !rt.dragging() {
                return;
            }
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                rt.dispatch(HostEvent::PanelPointerMove {
                    x: mouse.client_x() as f64,
                    y: mouse.client_y() as f64,
                });
            }
        })?;
        self.listen(&document, "keyup", |rt, event| {
            if let Some((key, modifiers)) = key_of(&event) {
                rt.dispatch(HostEvent::KeyUp {
                    key,
                    modifiers,
                    now_ms: now_ms(),
                });
            }
        })?;
        self.listen(&document, "keydown", |rt, event| {
            if let Some((key, modifiers)) = key_of(&event) {
                rt.dispatch(HostEvent::KeyDown {
                    key,
                    modifiers,
                    now_ms: now_ms(),
                });
            }
        })?;
        self.listen(&document, "input", |rt, event| {
            if !rt.overlay.contains(event.target().as_ref()) {
                rt.dispatch(HostEvent::Input);
            }
        })?;
        self.listen(&document, "visibilitychange", |rt, _| {
            let visible = !rt.document.hidden();
            rt.dispatch(HostEvent::VisibilityChanged { visible });
        })?;
        self.listen(&window, "resize", |rt, _| rt.dispatch(HostEvent::ViewportResized))?;
        self.listen(&window, "message", |rt, event| rt.on_page_message(&event))?;

        // ── Overlay ──
        self.listen(&overlay, "mousedown", |rt, event| {
            match action_of(event.target()) {
                Some((OverlayAction::Drag, _)) => {
                    if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                        rt.dispatch(HostEvent::PanelPointerDown {
                            x: mouse.client_x() as f64,
                            y: mouse.client_y() as f64,
                        });
                    }
                }
                Some((OverlayAction::Note, _)) | None => {}
                // Keep the page selection alive while our buttons are pressed.
                Some(_) => event.prevent_default(),
            }
        })?;
        self.listen(&overlay, "click", |rt, event| {
            let Some((action, _)) = action_of(event.target()) else {
                return;
            };
            let event = match action {
                OverlayAction::Control => HostEvent::ControlClicked,
                OverlayAction::Close => HostEvent::CloseClicked,
                OverlayAction::Menu => HostEvent::AgentMenuToggled,
                OverlayAction::Agent(id) => HostEvent::AgentChosen {
                    agent: AgentId::new(id),
                },
                OverlayAction::Rewrite => HostEvent::RewriteClicked,
                OverlayAction::Approve => HostEvent::ApproveClicked,
                OverlayAction::Cta => {
                    let url = rt.controller.try_borrow().map(|c| c.config().cta_url.clone());
                    if let Ok(url) = url {
                        rt.open_tab(&url);
                    }
                    return;
                }
                OverlayAction::Note | OverlayAction::Drag => return,
            };
            rt.dispatch(event);
        })?;
        self.listen(&overlay, "input", |rt, event| {
            if let Some((OverlayAction::Note, part)) = action_of(event.target())
                && let Some(area) = part.dyn_ref::<HtmlTextAreaElement>()
            {
                rt.dispatch(HostEvent::NoteEdited { note: area.value() });
            }
        })?;
        Ok(())
    }

    fn dragging(&self) -> bool {
        self.controller
            .try_borrow()
            .is_ok_and(|c| c.panel().is_some_and(|p| p.is_dragging()))
    }

    /// Token hand-over from a page of the rewrite service. Only messages the
    /// window posted to itself count.
    fn on_page_message(self: &Rc<Self>, event: &Event) {
        let Some(message) = event.dyn_ref::<MessageEvent>() else {
            return;
        };
        let own = message
            .source()
            .is_some_and(|source| JsValue::from(source) == JsValue::from(self.window.clone()));
        if !own {
            return;
        }
        match bridge::classify(&message.data()) {
            Some(PageMessage::Token(token)) => self.dispatch(HostEvent::SessionLoaded { token }),
            Some(PageMessage::Check) => {
                let available = self
                    .controller
                    .try_borrow()
                    .is_ok_and(|c| c.session().logged_in());
                bridge::post_status(&self.window, available);
            }
            None => {}
        }
    }
}

fn key_of(event: &Event) -> Option<(String, Modifiers)> {
    let key = event.dyn_ref::<KeyboardEvent>()?;
    Some((
        key.key(),
        Modifiers::from_flags(key.shift_key(), key.ctrl_key(), key.alt_key(), key.meta_key()),
    ))
}

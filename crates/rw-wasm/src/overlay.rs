//! The injected root container and its shadow tree.

use crate::markup::{ACTION_ATTR, AGENT_ATTR, PANEL_SELECTOR};
use rw_core::Placement;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, EventTarget, HtmlElement, Node, ShadowRoot, ShadowRootInit, ShadowRootMode};

/// A click or keystroke on part of the overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayAction {
    Control,
    Close,
    Menu,
    Agent(String),
    Rewrite,
    Approve,
    Cta,
    Note,
    Drag,
}

pub struct Overlay {
    host: Element,
    shadow: ShadowRoot,
}

impl Overlay {
    /// Create the root container, replacing a leftover one with the same id.
    pub fn mount(document: &Document, root_id: &str) -> Result<Self, JsValue> {
        if let Some(stale) = document.get_element_by_id(root_id) {
            stale.remove();
        }
        let host = document.create_element("div")?;
        host.set_id(root_id);
        let shadow = host.attach_shadow(&ShadowRootInit::new(ShadowRootMode::Open))?;
        let parent: Node = match document.body() {
            Some(body) => body.into(),
            None => document
                .document_element()
                .ok_or_else(|| JsValue::from_str("document has no root element"))?
                .into(),
        };
        parent.append_child(&host)?;
        Ok(Self { host, shadow })
    }

    pub fn host(&self) -> &Element {
        &self.host
    }

    /// Event target for delegated listeners.
    pub fn events(&self) -> &EventTarget {
        self.shadow.as_ref()
    }

    /// Whether `target` is the overlay or inside it. Events from the shadow
    /// tree reach the document retargeted to the host.
    pub fn contains(&self, target: Option<&EventTarget>) -> bool {
        target
            .and_then(|t| t.dyn_ref::<Node>())
            .is_some_and(|n| self.host.contains(Some(n)))
    }

    pub fn render(&self, html: &str) {
        self.shadow.set_inner_html(html);
    }

    /// Move the panel without rebuilding it.
    pub fn reposition(&self, placement: Placement) {
        let panel = self
            .shadow
            .query_selector(PANEL_SELECTOR)
            .ok()
            .flatten()
            .and_then(|e| e.dyn_into::<HtmlElement>().ok());
        let Some(panel) = panel else {
            return;
        };
        let style = panel.style();
        let moved = style
            .set_property("top", &format!("{}px", placement.top))
            .and_then(|_| style.set_property("left", &format!("{}px", placement.left)));
        if moved.is_err() {
            log::debug!("could not move the panel");
        }
    }

    pub fn remove(&self) {
        self.host.remove();
    }
}

/// Resolve the overlay part an event inside the shadow tree landed on.
pub fn action_of(target: Option<EventTarget>) -> Option<(OverlayAction, Element)> {
    let element = target?.dyn_into::<Element>().ok()?;
    let part = element
        .closest(&format!("[{ACTION_ATTR}]"))
        .ok()
        .flatten()?;
    let action = match part.get_attribute(ACTION_ATTR)?.as_str() {
        "control" => OverlayAction::Control,
        "close" => OverlayAction::Close,
        "menu" => OverlayAction::Menu,
        "agent" => OverlayAction::Agent(part.get_attribute(AGENT_ATTR)?),
        "rewrite" => OverlayAction::Rewrite,
        "approve" => OverlayAction::Approve,
        "cta" => OverlayAction::Cta,
        "note" => OverlayAction::Note,
        "drag" => OverlayAction::Drag,
        _ => return None,
    };
    Some((action, part))
}

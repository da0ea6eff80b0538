//! `EditableHost` over the live DOM.
//!
//! Elements are handed to the core as `ElementId`s. The page keeps a small
//! registry from id to element; entries whose element left the document are
//! pruned whenever a new element is registered.

use rw_core::{EditableHost, ElementId, RawSelection, Rect, SurfaceKind, Viewport};
use std::cell::RefCell;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, Event, EventInit, HtmlElement, HtmlInputElement, HtmlTextAreaElement, Node,
    Range, Text, Window,
};

/// `<input>` types that expose `selectionStart`/`selectionEnd`.
const SELECTABLE_INPUT_TYPES: &[&str] = &["text", "search", "url", "tel", "password"];

pub struct DomPage {
    window: Window,
    document: Document,
    registry: RefCell<Vec<(ElementId, Element)>>,
    /// Our own overlay container; selections inside it are ignored.
    overlay: Option<Element>,
}

impl DomPage {
    pub fn new(window: Window, document: Document) -> Self {
        Self {
            window,
            document,
            registry: RefCell::new(Vec::new()),
            overlay: None,
        }
    }

    pub fn set_overlay(&mut self, overlay: Option<Element>) {
        self.overlay = overlay;
    }

    /// Handle for `element`, registering it if needed.
    pub fn id_for(&self, element: &Element) -> ElementId {
        let mut registry = self.registry.borrow_mut();
        if let Some((id, _)) = registry.iter().find(|(_, e)| e == element) {
            return *id;
        }
        registry.retain(|(_, e)| e.is_connected());
        let id = ElementId::next();
        registry.push((id, element.clone()));
        id
    }

    pub fn element(&self, id: ElementId) -> Option<Element> {
        self.registry
            .borrow()
            .iter()
            .find(|(i, _)| *i == id)
            .map(|(_, e)| e.clone())
    }

    fn in_overlay(&self, node: &Node) -> bool {
        self.overlay
            .as_ref()
            .is_some_and(|o| o.contains(Some(node)))
    }

    /// Bounding box of a client rect, in document coordinates.
    fn document_rect(&self, rect: &web_sys::DomRect) -> Rect {
        let vp = self.viewport();
        Rect::new(
            rect.top() + vp.scroll_y,
            rect.left() + vp.scroll_x,
            rect.bottom() + vp.scroll_y,
            rect.right() + vp.scroll_x,
        )
    }

    fn field_snapshot(&self, active: &Element) -> Option<RawSelection> {
        let (value, start, end) = if let Some(area) = active.dyn_ref::<HtmlTextAreaElement>() {
            (
                area.value(),
                area.selection_start().ok().flatten()?,
                area.selection_end().ok().flatten()?,
            )
        } else if let Some(input) = active.dyn_ref::<HtmlInputElement>() {
            if !is_selectable_input(input) {
                return None;
            }
            (
                input.value(),
                input.selection_start().ok().flatten()?,
                input.selection_end().ok().flatten()?,
            )
        } else {
            return None;
        };
        Some(RawSelection::Field {
            element: self.id_for(active),
            value,
            start: start as usize,
            end: end as usize,
            rect: self.document_rect(&active.get_bounding_client_rect()),
        })
    }

    fn range_snapshot(&self) -> Option<RawSelection> {
        let selection = self.window.get_selection().ok().flatten()?;
        if selection.range_count() == 0 || selection.is_collapsed() {
            return None;
        }
        let range = selection.get_range_at(0).ok()?;
        let common = range.common_ancestor_container().ok()?;
        if self.in_overlay(&common) {
            return None;
        }
        let text: String = range.to_string().into();
        let length = range.to_string().length() as usize;
        if length == 0 {
            return None;
        }
        let rect = self.document_rect(&range.get_bounding_client_rect());

        let Some(root) = editing_host(&common) else {
            return Some(RawSelection::Range {
                editable_root: None,
                text,
                start: 0,
                end: length,
                rect,
            });
        };
        let start = self.offset_within(&root, &range)?;
        Some(RawSelection::Range {
            editable_root: Some(self.id_for(&root)),
            text,
            start,
            end: start + length,
            rect,
        })
    }

    /// UTF-16 offset of the range start from the beginning of `root`.
    fn offset_within(&self, root: &Element, range: &Range) -> Option<usize> {
        let prefix = self.document.create_range().ok()?;
        prefix.select_node_contents(root).ok()?;
        prefix
            .set_end(&range.start_container().ok()?, range.start_offset().ok()?)
            .ok()?;
        Some(prefix.to_string().length() as usize)
    }
}

fn is_selectable_input(input: &HtmlInputElement) -> bool {
    let kind = input.type_();
    SELECTABLE_INPUT_TYPES.contains(&kind.as_str())
}

/// Outermost content-editable element containing `node`.
fn editing_host(node: &Node) -> Option<Element> {
    let start = match node.dyn_ref::<Element>() {
        Some(el) => el.clone(),
        None => node.parent_element()?,
    };
    let mut host = start.dyn_into::<HtmlElement>().ok()?;
    if !host.is_content_editable() {
        return None;
    }
    while let Some(parent) = host
        .parent_element()
        .and_then(|p| p.dyn_into::<HtmlElement>().ok())
        .filter(|p| p.is_content_editable())
    {
        host = parent;
    }
    Some(host.unchecked_into())
}

fn collect_text(node: &Node, out: &mut Vec<(Text, String)>) {
    let mut child = node.first_child();
    while let Some(current) = child {
        if let Some(text) = current.dyn_ref::<Text>() {
            out.push((text.clone(), text.data()));
        } else {
            collect_text(&current, out);
        }
        child = current.next_sibling();
    }
}

impl EditableHost for DomPage {
    type Run = Text;

    fn snapshot_selection(&self) -> RawSelection {
        if let Some(active) = self.document.active_element()
            && !self.in_overlay(&active)
            && let Some(snapshot) = self.field_snapshot(&active)
        {
            return snapshot;
        }
        self.range_snapshot().unwrap_or(RawSelection::Empty)
    }

    fn viewport(&self) -> Viewport {
        let number = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64());
        let fallback = Viewport::default();
        Viewport {
            width: number(self.window.inner_width()).unwrap_or(fallback.width),
            height: number(self.window.inner_height()).unwrap_or(fallback.height),
            scroll_x: self.window.scroll_x().unwrap_or(0.0),
            scroll_y: self.window.scroll_y().unwrap_or(0.0),
        }
    }

    fn is_connected(&self, element: ElementId) -> bool {
        self.element(element).is_some_and(|e| e.is_connected())
    }

    fn surface_kind(&self, element: ElementId) -> Option<SurfaceKind> {
        let el = self.element(element)?;
        if el.is_instance_of::<HtmlTextAreaElement>() {
            return Some(SurfaceKind::PlainInput);
        }
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            return is_selectable_input(input).then_some(SurfaceKind::PlainInput);
        }
        el.dyn_ref::<HtmlElement>()
            .filter(|h| h.is_content_editable())
            .map(|_| SurfaceKind::ContentEditable)
    }

    fn field_value(&self, element: ElementId) -> Option<String> {
        let el = self.element(element)?;
        if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
            return Some(area.value());
        }
        el.dyn_ref::<HtmlInputElement>().map(|i| i.value())
    }

    fn set_field_value(&mut self, element: ElementId, value: &str) {
        let Some(el) = self.element(element) else {
            return;
        };
        if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        }
    }

    fn set_field_selection(&mut self, element: ElementId, start: usize, end: usize) {
        let Some(el) = self.element(element) else {
            return;
        };
        let (start, end) = (start as u32, end as u32);
        let result = if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
            area.set_selection_range(start, end)
        } else if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            input.set_selection_range(start, end)
        } else {
            Ok(())
        };
        if result.is_err() {
            log::debug!("could not restore the selection in {element}");
        }
    }

    fn text_runs(&self, element: ElementId) -> Vec<(Text, String)> {
        let mut runs = Vec::new();
        if let Some(el) = self.element(element) {
            collect_text(&el, &mut runs);
        }
        runs
    }

    fn set_run_text(&mut self, run: &Text, text: &str) {
        run.set_data(text);
    }

    fn remove_run(&mut self, run: &Text) {
        run.remove();
    }

    fn insert_run_after(&mut self, run: &Text, text: &str) -> Option<Text> {
        let parent = run.parent_node()?;
        let node = self.document.create_text_node(text);
        parent
            .insert_before(&node, run.next_sibling().as_ref())
            .ok()?;
        Some(node)
    }

    fn collapse_selection_after(&mut self, run: &Text) {
        let placed = (|| {
            let range = self.document.create_range().ok()?;
            range.set_start_after(run).ok()?;
            range.collapse_with_to_start(true);
            let selection = self.window.get_selection().ok().flatten()?;
            selection.remove_all_ranges().ok()?;
            selection.add_range(&range).ok()
        })();
        if placed.is_none() {
            log::debug!("could not move the caret after the replacement");
        }
    }

    fn focus(&mut self, element: ElementId) {
        if let Some(el) = self.element(element).and_then(|e| e.dyn_into::<HtmlElement>().ok()) {
            let _ = el.focus();
        }
    }

    fn dispatch_input(&mut self, element: ElementId) {
        let Some(el) = self.element(element) else {
            return;
        };
        let init = EventInit::new();
        init.set_bubbles(true);
        match Event::new_with_event_init_dict("input", &init) {
            Ok(event) => {
                let _ = el.dispatch_event(&event);
            }
            Err(_) => log::debug!("could not create input event"),
        }
    }
}

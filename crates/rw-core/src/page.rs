//! In-memory page used to drive the rewrite flow without a browser.
//!
//! The page is a tree of elements and text nodes stored in a petgraph
//! `StableDiGraph` (edges are parent→child containment) with an explicit
//! child order per parent, so inserting a node between siblings keeps
//! document order. It implements `EditableHost` with the same semantics
//! the DOM bridge has: fields keep `value` plus a selection range, rich
//! surfaces are editing hosts whose text lives in descendant text nodes,
//! and detached elements read as gone.

use crate::geometry::Viewport;
use crate::host::{EditableHost, RawSelection};
use crate::id::ElementId;
use crate::model::{Rect, SurfaceKind};
use crate::text::{absolute_offset, slice_utf16, utf16_len};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use std::collections::HashMap;

/// A node in the page tree.
#[derive(Debug, Clone)]
pub enum PageNode {
    Element(ElementNode),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub id: ElementId,
    pub tag: String,
    /// Set on editing hosts (`contenteditable="true"`); descendants inherit.
    pub content_editable: bool,
    /// Present on `<input>` and `<textarea>`.
    pub field: Option<FieldState>,
    pub rect: Rect,
}

/// Value and selection of a plain text field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldState {
    pub value: String,
    pub selection_start: usize,
    pub selection_end: usize,
}

/// A point in a text node, offset in UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TextPoint {
    node: NodeIndex,
    offset: usize,
}

pub struct HeadlessPage {
    graph: StableDiGraph<PageNode, ()>,
    root: NodeIndex,
    root_id: ElementId,
    id_index: HashMap<ElementId, NodeIndex>,
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
    focused: Option<ElementId>,
    selection: Option<(TextPoint, TextPoint)>,
    caret_after: Option<NodeIndex>,
    input_events: HashMap<ElementId, usize>,
    viewport: Viewport,
}

impl Default for HeadlessPage {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPage {
    /// A page containing an empty `<body>`.
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let id = ElementId::next();
        let root = graph.add_node(PageNode::Element(ElementNode {
            id,
            tag: "body".to_string(),
            content_editable: false,
            field: None,
            rect: Rect::default(),
        }));
        let mut id_index = HashMap::new();
        id_index.insert(id, root);
        Self {
            graph,
            root,
            root_id: id,
            id_index,
            child_order: HashMap::new(),
            focused: None,
            selection: None,
            caret_after: None,
            input_events: HashMap::new(),
            viewport: Viewport::default(),
        }
    }

    pub fn body(&self) -> ElementId {
        self.root_id
    }

    // ─── Building ────────────────────────────────────────────────────────

    /// Append a plain element (e.g. `<p>`, `<b>`) under `parent`.
    pub fn add_element(&mut self, parent: ElementId, tag: &str) -> ElementId {
        self.add_element_node(parent, tag, false, None)
    }

    /// Append a `contenteditable` editing host under `parent`.
    pub fn add_editable(&mut self, parent: ElementId) -> ElementId {
        self.add_element_node(parent, "div", true, None)
    }

    pub fn add_textarea(&mut self, parent: ElementId, value: &str) -> ElementId {
        self.add_field(parent, "textarea", value)
    }

    pub fn add_input(&mut self, parent: ElementId, value: &str) -> ElementId {
        self.add_field(parent, "input", value)
    }

    /// Append a text node under `parent`.
    pub fn add_text(&mut self, parent: ElementId, text: &str) -> NodeIndex {
        let parent_idx = self.id_index[&parent];
        self.append(parent_idx, PageNode::Text(text.to_string()))
    }

    /// Resize or scroll the window.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_rect(&mut self, element: ElementId, rect: Rect) {
        if let Some(e) = self.element_mut(element) {
            e.rect = rect;
        }
    }

    fn add_field(&mut self, parent: ElementId, tag: &str, value: &str) -> ElementId {
        let len = utf16_len(value);
        self.add_element_node(
            parent,
            tag,
            false,
            Some(FieldState {
                value: value.to_string(),
                selection_start: len,
                selection_end: len,
            }),
        )
    }

    fn add_element_node(
        &mut self,
        parent: ElementId,
        tag: &str,
        content_editable: bool,
        field: Option<FieldState>,
    ) -> ElementId {
        let parent_idx = self.id_index[&parent];
        let id = ElementId::next();
        let idx = self.append(
            parent_idx,
            PageNode::Element(ElementNode {
                id,
                tag: tag.to_string(),
                content_editable,
                field,
                rect: Rect::default(),
            }),
        );
        self.id_index.insert(id, idx);
        id
    }

    fn append(&mut self, parent: NodeIndex, node: PageNode) -> NodeIndex {
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.child_order.entry(parent).or_default().push(idx);
        idx
    }

    // ─── User actions ────────────────────────────────────────────────────

    /// Focus a field and select `[start, end)` inside it.
    pub fn select_in_field(&mut self, element: ElementId, start: usize, end: usize) {
        self.set_field_selection(element, start, end);
        self.focused = Some(element);
        self.selection = None;
    }

    /// Select from `(anchor, offset)` to `(focus, offset)` across text nodes.
    /// The enclosing editing host, if any, takes focus.
    pub fn select_text(&mut self, anchor: (NodeIndex, usize), focus: (NodeIndex, usize)) {
        let a = TextPoint {
            node: anchor.0,
            offset: anchor.1,
        };
        let f = TextPoint {
            node: focus.0,
            offset: focus.1,
        };
        self.focused = self
            .common_ancestor(a.node, f.node)
            .and_then(|c| self.editing_host(c))
            .and_then(|h| self.element(h).map(|e| e.id));
        self.selection = Some((a, f));
        self.caret_after = None;
    }

    /// Click somewhere neutral: drop focus and any selection.
    pub fn blur(&mut self) {
        self.focused = None;
        self.selection = None;
    }

    /// Remove an element and its subtree from the page.
    pub fn detach(&mut self, element: ElementId) {
        let Some(&idx) = self.id_index.get(&element) else {
            return;
        };
        if idx == self.root {
            return;
        }
        if let Some(parent) = self.parent(idx)
            && let Some(order) = self.child_order.get_mut(&parent)
        {
            order.retain(|c| *c != idx);
        }
        let mut stack = vec![idx];
        while let Some(n) = stack.pop() {
            stack.extend(self.children(n));
            if let Some(PageNode::Element(e)) = self.graph.remove_node(n) {
                self.id_index.remove(&e.id);
                if self.focused == Some(e.id) {
                    self.focused = None;
                }
            }
            self.child_order.remove(&n);
        }
        self.selection = None;
    }

    /// Overwrite a field's value as page script would.
    pub fn type_into_field(&mut self, element: ElementId, value: &str) {
        if let Some(field) = self.element_mut(element).and_then(|e| e.field.as_mut()) {
            field.value = value.to_string();
        }
    }

    /// Overwrite a text node's data as page script would.
    pub fn edit_text_node(&mut self, node: NodeIndex, text: &str) {
        if let Some(PageNode::Text(t)) = self.graph.node_weight_mut(node) {
            *t = text.to_string();
        }
    }

    // ─── Inspection ──────────────────────────────────────────────────────

    pub fn field(&self, element: ElementId) -> Option<&FieldState> {
        self.element_by_id(element).and_then(|e| e.field.as_ref())
    }

    /// Concatenated text of all text nodes under `element`.
    pub fn text_content(&self, element: ElementId) -> String {
        self.text_runs(element)
            .into_iter()
            .map(|(_, text)| text)
            .collect()
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    /// The text node the caret was last collapsed after.
    pub fn caret_after(&self) -> Option<&str> {
        match self.caret_after.and_then(|n| self.graph.node_weight(n)) {
            Some(PageNode::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn input_event_count(&self, element: ElementId) -> usize {
        self.input_events.get(&element).copied().unwrap_or(0)
    }

    // ─── Tree helpers ────────────────────────────────────────────────────

    fn element(&self, idx: NodeIndex) -> Option<&ElementNode> {
        match self.graph.node_weight(idx) {
            Some(PageNode::Element(e)) => Some(e),
            _ => None,
        }
    }

    fn element_by_id(&self, id: ElementId) -> Option<&ElementNode> {
        self.id_index.get(&id).and_then(|idx| self.element(*idx))
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut ElementNode> {
        let idx = *self.id_index.get(&id)?;
        match self.graph.node_weight_mut(idx) {
            Some(PageNode::Element(e)) => Some(e),
            _ => None,
        }
    }

    fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.child_order.get(&idx).cloned().unwrap_or_default()
    }

    fn ancestors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = vec![idx];
        let mut cur = idx;
        while let Some(p) = self.parent(cur) {
            chain.push(p);
            cur = p;
        }
        chain
    }

    fn common_ancestor(&self, a: NodeIndex, b: NodeIndex) -> Option<NodeIndex> {
        let of_b = self.ancestors(b);
        self.ancestors(a).into_iter().find(|n| of_b.contains(n))
    }

    /// Outermost `contenteditable` ancestor-or-self of `idx`.
    fn editing_host(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.ancestors(idx)
            .into_iter()
            .filter(|n| self.element(*n).is_some_and(|e| e.content_editable))
            .last()
    }

    fn runs_under(&self, idx: NodeIndex, out: &mut Vec<(NodeIndex, String)>) {
        match self.graph.node_weight(idx) {
            Some(PageNode::Text(t)) => out.push((idx, t.clone())),
            Some(PageNode::Element(_)) => {
                for child in self.children(idx) {
                    self.runs_under(child, out);
                }
            }
            None => {}
        }
    }

    fn range_snapshot(&self, a: TextPoint, f: TextPoint) -> RawSelection {
        let Some(common) = self.common_ancestor(a.node, f.node) else {
            return RawSelection::Empty;
        };
        let host = self.editing_host(common);
        let scope = host.unwrap_or(self.root);
        let mut runs = Vec::new();
        self.runs_under(scope, &mut runs);
        let lens: Vec<usize> = runs.iter().map(|(_, t)| utf16_len(t)).collect();
        let offset_of = |p: TextPoint| {
            runs.iter()
                .position(|(n, _)| *n == p.node)
                .and_then(|i| absolute_offset(&lens, i, p.offset))
        };
        let (Some(x), Some(y)) = (offset_of(a), offset_of(f)) else {
            return RawSelection::Empty;
        };
        let (start, end) = (x.min(y), x.max(y));
        let content: String = runs.iter().map(|(_, t)| t.as_str()).collect();
        let Some(text) = slice_utf16(&content, start, end) else {
            return RawSelection::Empty;
        };
        let host_el = host.and_then(|h| self.element(h));
        RawSelection::Range {
            editable_root: host_el.map(|e| e.id),
            text: text.to_string(),
            start,
            end,
            rect: self.element(scope).map(|e| e.rect).unwrap_or_default(),
        }
    }
}

impl EditableHost for HeadlessPage {
    type Run = NodeIndex;

    fn snapshot_selection(&self) -> RawSelection {
        if let Some(id) = self.focused
            && let Some(el) = self.element_by_id(id)
            && let Some(field) = &el.field
        {
            return RawSelection::Field {
                element: id,
                value: field.value.clone(),
                start: field.selection_start,
                end: field.selection_end,
                rect: el.rect,
            };
        }
        match self.selection {
            Some((a, f)) => self.range_snapshot(a, f),
            None => RawSelection::Empty,
        }
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn is_connected(&self, element: ElementId) -> bool {
        self.id_index.contains_key(&element)
    }

    fn surface_kind(&self, element: ElementId) -> Option<SurfaceKind> {
        let idx = *self.id_index.get(&element)?;
        let el = self.element(idx)?;
        if el.field.is_some() {
            Some(SurfaceKind::PlainInput)
        } else if self.editing_host(idx).is_some() {
            Some(SurfaceKind::ContentEditable)
        } else {
            None
        }
    }

    fn field_value(&self, element: ElementId) -> Option<String> {
        self.field(element).map(|f| f.value.clone())
    }

    fn set_field_value(&mut self, element: ElementId, value: &str) {
        if let Some(field) = self.element_mut(element).and_then(|e| e.field.as_mut()) {
            field.value = value.to_string();
            let len = utf16_len(value);
            field.selection_start = len;
            field.selection_end = len;
        }
    }

    fn set_field_selection(&mut self, element: ElementId, start: usize, end: usize) {
        if let Some(field) = self.element_mut(element).and_then(|e| e.field.as_mut()) {
            let len = utf16_len(&field.value);
            field.selection_start = start.min(len);
            field.selection_end = end.min(len).max(field.selection_start);
        }
    }

    fn text_runs(&self, element: ElementId) -> Vec<(NodeIndex, String)> {
        let mut runs = Vec::new();
        if let Some(&idx) = self.id_index.get(&element) {
            self.runs_under(idx, &mut runs);
        }
        runs
    }

    fn set_run_text(&mut self, run: &NodeIndex, text: &str) {
        self.edit_text_node(*run, text);
    }

    fn remove_run(&mut self, run: &NodeIndex) {
        if let Some(parent) = self.parent(*run)
            && let Some(order) = self.child_order.get_mut(&parent)
        {
            order.retain(|c| c != run);
        }
        self.graph.remove_node(*run);
    }

    fn insert_run_after(&mut self, run: &NodeIndex, text: &str) -> Option<NodeIndex> {
        let parent = self.parent(*run)?;
        let idx = self.graph.add_node(PageNode::Text(text.to_string()));
        self.graph.add_edge(parent, idx, ());
        let order = self.child_order.entry(parent).or_default();
        let pos = order.iter().position(|c| c == run).map_or(order.len(), |p| p + 1);
        order.insert(pos, idx);
        Some(idx)
    }

    fn collapse_selection_after(&mut self, run: &NodeIndex) {
        self.selection = None;
        self.caret_after = Some(*run);
    }

    fn focus(&mut self, element: ElementId) {
        if self.is_connected(element) {
            self.focused = Some(element);
        }
    }

    fn dispatch_input(&mut self, element: ElementId) {
        *self.input_events.entry(element).or_default() += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn field_selection_snapshot() {
        let mut page = HeadlessPage::new();
        let body = page.body();
        let ta = page.add_textarea(body, "hello world");
        page.select_in_field(ta, 0, 5);
        match page.snapshot_selection() {
            RawSelection::Field {
                element,
                value,
                start,
                end,
                ..
            } => {
                assert_eq!(element, ta);
                assert_eq!(value, "hello world");
                assert_eq!((start, end), (0, 5));
            }
            other => panic!("expected field selection, got {other:?}"),
        }
    }

    #[test]
    fn range_offsets_are_relative_to_editing_host() {
        let mut page = HeadlessPage::new();
        let body = page.body();
        page.add_text(body, "outside ");
        let host = page.add_editable(body);
        page.add_text(host, "one ");
        let bold = page.add_element(host, "b");
        let t = page.add_text(bold, "two");
        let tail = page.add_text(host, " three");
        page.select_text((t, 1), (tail, 3));

        assert_eq!(page.focused(), Some(host));
        assert_eq!(
            page.snapshot_selection(),
            RawSelection::Range {
                editable_root: Some(host),
                text: "wo th".to_string(),
                start: 5,
                end: 10,
                rect: Rect::default(),
            }
        );
    }

    #[test]
    fn backwards_selection_is_normalized() {
        let mut page = HeadlessPage::new();
        let host = page.add_editable(page.body());
        let t = page.add_text(host, "abcdef");
        page.select_text((t, 4), (t, 1));
        match page.snapshot_selection() {
            RawSelection::Range { start, end, text, .. } => {
                assert_eq!((start, end), (1, 4));
                assert_eq!(text, "bcd");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_editable_range_has_no_root() {
        let mut page = HeadlessPage::new();
        let p = page.add_element(page.body(), "p");
        let t = page.add_text(p, "static text");
        page.select_text((t, 0), (t, 6));
        assert!(matches!(
            page.snapshot_selection(),
            RawSelection::Range {
                editable_root: None,
                ..
            }
        ));
    }

    #[test]
    fn detached_elements_are_gone() {
        let mut page = HeadlessPage::new();
        let wrapper = page.add_element(page.body(), "div");
        let ta = page.add_textarea(wrapper, "x");
        page.select_in_field(ta, 0, 1);
        page.detach(wrapper);
        assert!(!page.is_connected(ta));
        assert!(!page.is_connected(wrapper));
        assert_eq!(page.field_value(ta), None);
        assert_eq!(page.focused(), None);
        assert_eq!(page.snapshot_selection(), RawSelection::Empty);
    }

    #[test]
    fn insert_after_keeps_document_order() {
        let mut page = HeadlessPage::new();
        let host = page.add_editable(page.body());
        let a = page.add_text(host, "a");
        page.add_text(host, "c");
        page.insert_run_after(&a, "b");
        assert_eq!(page.text_content(host), "abc");
    }

    #[test]
    fn surface_kinds() {
        let mut page = HeadlessPage::new();
        let body = page.body();
        let input = page.add_input(body, "");
        let host = page.add_editable(body);
        let inner = page.add_element(host, "span");
        let plain = page.add_element(body, "p");
        assert_eq!(page.surface_kind(input), Some(SurfaceKind::PlainInput));
        assert_eq!(page.surface_kind(host), Some(SurfaceKind::ContentEditable));
        assert_eq!(page.surface_kind(inner), Some(SurfaceKind::ContentEditable));
        assert_eq!(page.surface_kind(plain), None);
    }
}

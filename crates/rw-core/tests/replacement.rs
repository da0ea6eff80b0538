//! Replacement engine driven against the in-memory page.

use pretty_assertions::assert_eq;
use rw_core::page::HeadlessPage;
use rw_core::{
    EditableHost, Rect, RewriteError, SelectionDescriptor, SurfaceKind, replace_selection,
};

fn field_descriptor(page: &HeadlessPage, element: rw_core::ElementId, start: usize, end: usize) -> SelectionDescriptor {
    let value = page.field_value(element).unwrap();
    SelectionDescriptor::capture(
        SurfaceKind::PlainInput,
        element,
        &value,
        start,
        end,
        Rect::default(),
    )
    .unwrap()
}

fn rich_descriptor(page: &HeadlessPage, root: rw_core::ElementId, start: usize, end: usize) -> SelectionDescriptor {
    let content = page.text_content(root);
    SelectionDescriptor::capture(
        SurfaceKind::ContentEditable,
        root,
        &content,
        start,
        end,
        Rect::default(),
    )
    .unwrap()
}

// ─── Plain fields ────────────────────────────────────────────────────────

#[test]
fn textarea_prefix_is_replaced_and_caret_follows() {
    let mut page = HeadlessPage::new();
    let ta = page.add_textarea(page.body(), "hello world");
    let desc = field_descriptor(&page, ta, 0, 5);

    let done = replace_selection(&mut page, &desc, "hi").unwrap();

    assert_eq!(page.field_value(ta).as_deref(), Some("hi world"));
    assert_eq!(done.cursor, 2);
    let field = page.field(ta).unwrap();
    assert_eq!((field.selection_start, field.selection_end), (0, 2));
    assert_eq!(page.focused(), Some(ta));
    assert_eq!(page.input_event_count(ta), 1);
}

#[test]
fn input_suffix_with_empty_replacement() {
    let mut page = HeadlessPage::new();
    let input = page.add_input(page.body(), "keep this drop");
    let desc = field_descriptor(&page, input, 9, 14);

    let done = replace_selection(&mut page, &desc, "").unwrap();

    assert_eq!(page.field_value(input).as_deref(), Some("keep this"));
    assert_eq!(done.cursor, 9);
}

#[test]
fn field_offsets_are_utf16() {
    let mut page = HeadlessPage::new();
    // "🙂" is two UTF-16 code units.
    let ta = page.add_textarea(page.body(), "a🙂 old b");
    let desc = field_descriptor(&page, ta, 4, 7);
    assert_eq!(desc.text(), "old");

    let done = replace_selection(&mut page, &desc, "néw");

    assert_eq!(page.field_value(ta).as_deref(), Some("a🙂 néw b"));
    assert_eq!(done.unwrap().cursor, 7);
}

#[test]
fn edited_field_is_left_alone() {
    let mut page = HeadlessPage::new();
    let ta = page.add_textarea(page.body(), "hello world");
    let desc = field_descriptor(&page, ta, 0, 5);
    page.type_into_field(ta, "howdy world");

    let err = replace_selection(&mut page, &desc, "hi").unwrap_err();

    assert!(matches!(err, RewriteError::ReplacementTargetStale { .. }));
    assert_eq!(page.field_value(ta).as_deref(), Some("howdy world"));
    assert_eq!(page.input_event_count(ta), 0);
}

#[test]
fn shortened_field_is_stale() {
    let mut page = HeadlessPage::new();
    let ta = page.add_textarea(page.body(), "hello world");
    let desc = field_descriptor(&page, ta, 6, 11);
    page.type_into_field(ta, "hello");

    assert!(matches!(
        replace_selection(&mut page, &desc, "there"),
        Err(RewriteError::ReplacementTargetStale { .. })
    ));
    assert_eq!(page.field_value(ta).as_deref(), Some("hello"));
}

#[test]
fn removed_field_fails_cleanly() {
    let mut page = HeadlessPage::new();
    let ta = page.add_textarea(page.body(), "hello world");
    let desc = field_descriptor(&page, ta, 0, 5);
    page.detach(ta);

    let err = replace_selection(&mut page, &desc, "hi").unwrap_err();
    assert!(matches!(err, RewriteError::ReplacementTargetStale { .. }));
}

#[test]
fn replacement_does_not_read_the_live_selection() {
    let mut page = HeadlessPage::new();
    let body = page.body();
    let ta = page.add_textarea(body, "hello world");
    let other = page.add_input(body, "elsewhere");
    let desc = field_descriptor(&page, ta, 6, 11);
    page.select_in_field(other, 0, 4);

    replace_selection(&mut page, &desc, "there").unwrap();

    assert_eq!(page.field_value(ta).as_deref(), Some("hello there"));
    assert_eq!(page.field_value(other).as_deref(), Some("elsewhere"));
}

// ─── Rich surfaces ───────────────────────────────────────────────────────

#[test]
fn single_text_node_is_split_around_the_replacement() {
    let mut page = HeadlessPage::new();
    let root = page.add_editable(page.body());
    page.add_text(root, "The quick fox");
    let desc = rich_descriptor(&page, root, 4, 9);

    let done = replace_selection(&mut page, &desc, "slow").unwrap();

    assert_eq!(page.text_content(root), "The slow fox");
    assert_eq!(done.cursor, 8);
    assert_eq!(page.caret_after(), Some("slow"));
    assert_eq!(page.input_event_count(root), 1);
}

#[test]
fn text_outside_the_span_keeps_its_markup() {
    // <div>Hello <b>big</b> wide <i>world</i>!</div>
    let mut page = HeadlessPage::new();
    let root = page.add_editable(page.body());
    page.add_text(root, "Hello ");
    let b = page.add_element(root, "b");
    page.add_text(b, "big");
    page.add_text(root, " wide ");
    let i = page.add_element(root, "i");
    page.add_text(i, "world");
    page.add_text(root, "!");

    // "ig wide wor"
    let desc = rich_descriptor(&page, root, 7, 18);
    assert_eq!(desc.text(), "ig wide wor");

    replace_selection(&mut page, &desc, "IG").unwrap();

    assert_eq!(page.text_content(root), "Hello bIGld!");
    // Boundary nodes were trimmed in place, so the unselected parts of
    // <b> and <i> are still inside their elements.
    assert_eq!(page.text_content(b), "bIG");
    assert_eq!(page.text_content(i), "ld");
}

#[test]
fn span_covering_a_whole_node_is_replaced_inside_it() {
    let mut page = HeadlessPage::new();
    let root = page.add_editable(page.body());
    page.add_text(root, "one ");
    let span = page.add_element(root, "span");
    page.add_text(span, "two");
    page.add_text(root, " three");

    let desc = rich_descriptor(&page, root, 4, 7);
    assert_eq!(desc.text(), "two");
    replace_selection(&mut page, &desc, "2").unwrap();

    assert_eq!(page.text_content(root), "one 2 three");
    assert_eq!(page.text_content(span), "2");
}

#[test]
fn whole_content_replacement() {
    let mut page = HeadlessPage::new();
    let root = page.add_editable(page.body());
    page.add_text(root, "alpha ");
    let em = page.add_element(root, "em");
    page.add_text(em, "beta");

    let desc = rich_descriptor(&page, root, 0, 10);
    let done = replace_selection(&mut page, &desc, "gamma").unwrap();

    assert_eq!(page.text_content(root), "gamma");
    assert_eq!(done.cursor, 5);
    assert_eq!(page.text_content(em), "");
}

#[test]
fn rich_edit_after_capture_is_stale() {
    let mut page = HeadlessPage::new();
    let root = page.add_editable(page.body());
    let t = page.add_text(root, "hello world");
    let desc = rich_descriptor(&page, root, 0, 5);
    page.edit_text_node(t, "jello world");

    assert!(matches!(
        replace_selection(&mut page, &desc, "hi"),
        Err(RewriteError::ReplacementTargetStale { .. })
    ));
    assert_eq!(page.text_content(root), "jello world");
    assert_eq!(page.input_event_count(root), 0);
}

#[test]
fn removed_editing_host_fails_cleanly() {
    let mut page = HeadlessPage::new();
    let root = page.add_editable(page.body());
    page.add_text(root, "hello world");
    let desc = rich_descriptor(&page, root, 0, 5);
    page.detach(root);

    assert!(matches!(
        replace_selection(&mut page, &desc, "hi"),
        Err(RewriteError::ReplacementTargetStale { .. })
    ));
}

#[test]
fn surface_kind_mismatch_is_stale() {
    let mut page = HeadlessPage::new();
    let ta = page.add_textarea(page.body(), "hello world");
    let desc = SelectionDescriptor::capture(
        SurfaceKind::ContentEditable,
        ta,
        "hello world",
        0,
        5,
        Rect::default(),
    )
    .unwrap();

    assert!(matches!(
        replace_selection(&mut page, &desc, "hi"),
        Err(RewriteError::ReplacementTargetStale { .. })
    ));
}

#[test]
fn non_editable_element_is_unsupported() {
    let mut page = HeadlessPage::new();
    let p = page.add_element(page.body(), "p");
    page.add_text(p, "static");
    let desc = SelectionDescriptor::capture(
        SurfaceKind::ContentEditable,
        p,
        "static",
        0,
        3,
        Rect::default(),
    )
    .unwrap();

    assert_eq!(
        replace_selection(&mut page, &desc, "x"),
        Err(RewriteError::UnsupportedSurface)
    );
}

#[test]
fn rich_offsets_are_utf16() {
    let mut page = HeadlessPage::new();
    let root = page.add_editable(page.body());
    page.add_text(root, "👋 ");
    let b = page.add_element(root, "b");
    page.add_text(b, "hey");

    let desc = rich_descriptor(&page, root, 3, 6);
    assert_eq!(desc.text(), "hey");
    replace_selection(&mut page, &desc, "hello").unwrap();

    assert_eq!(page.text_content(root), "👋 hello");
}

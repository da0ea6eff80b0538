//! Debounce and visibility rules of the selection tracker, through the
//! controller.

use pretty_assertions::assert_eq;
use rw_core::{HeadlessPage, Rect, RewriteConfig, Viewport};
use rw_editor::{Controller, Effect, HostEvent, MemoryPreferences, Modifiers, SessionState};

fn controller() -> Controller<MemoryPreferences> {
    Controller::new(
        RewriteConfig::default(),
        SessionState::new(Some("tok".into())),
        MemoryPreferences::default(),
    )
}

fn renders(fx: &[Effect]) -> usize {
    fx.iter().filter(|e| **e == Effect::Render).count()
}

#[test]
fn burst_of_events_is_evaluated_once_with_the_last_selection() {
    let mut page = HeadlessPage::new();
    let ta = page.add_textarea(page.body(), "one two three");
    let mut c = controller();
    let mut fx = Vec::new();

    for (i, end) in [3, 7, 13].into_iter().enumerate() {
        page.select_in_field(ta, 0, end);
        let at = i as f64 * 20.0;
        fx.extend(c.handle(HostEvent::SelectionChange { now_ms: at }, &mut page));
    }
    assert_eq!(
        fx,
        vec![Effect::ScheduleTick { delay_ms: 100.0 }; 3],
        "each event restarts the window"
    );

    // Ticks from the first two timers arrive before the window closes.
    assert!(c.handle(HostEvent::Tick { now_ms: 100.0 }, &mut page).len() <= 1);
    assert!(!c.control().is_visible());

    let fx = c.handle(HostEvent::Tick { now_ms: 140.0 }, &mut page);
    assert_eq!(renders(&fx), 1);
    let control = c.control().clone();
    let rw_editor::ActionControl::Visible { descriptor, .. } = control else {
        panic!("control should be visible");
    };
    assert_eq!(descriptor.text(), "one two three");

    // Nothing left to evaluate.
    assert!(c.handle(HostEvent::Tick { now_ms: 500.0 }, &mut page).is_empty());
}

#[test]
fn repeated_identical_selection_causes_no_churn() {
    let mut page = HeadlessPage::new();
    let ta = page.add_textarea(page.body(), "hello world");
    page.select_in_field(ta, 0, 5);
    let mut c = controller();

    c.handle(HostEvent::MouseUp { now_ms: 0.0 }, &mut page);
    assert_eq!(renders(&c.handle(HostEvent::Tick { now_ms: 100.0 }, &mut page)), 1);

    c.handle(HostEvent::MouseUp { now_ms: 200.0 }, &mut page);
    assert_eq!(renders(&c.handle(HostEvent::Tick { now_ms: 300.0 }, &mut page)), 0);
    assert!(c.control().is_visible());
}

#[test]
fn clearing_the_selection_hides_the_control() {
    let mut page = HeadlessPage::new();
    let ta = page.add_textarea(page.body(), "hello world");
    page.select_in_field(ta, 0, 5);
    let mut c = controller();
    c.handle(HostEvent::MouseUp { now_ms: 0.0 }, &mut page);
    c.handle(HostEvent::Tick { now_ms: 100.0 }, &mut page);

    page.select_in_field(ta, 3, 3);
    c.handle(
        HostEvent::KeyUp {
            key: "ArrowLeft".into(),
            modifiers: Modifiers::NONE,
            now_ms: 200.0,
        },
        &mut page,
    );
    let fx = c.handle(HostEvent::Tick { now_ms: 300.0 }, &mut page);
    assert_eq!(renders(&fx), 1);
    assert!(!c.control().is_visible());
    assert!(c.placement_state().control().is_none());
}

#[test]
fn pressing_outside_or_typing_hides_the_control() {
    let mut page = HeadlessPage::new();
    let ta = page.add_textarea(page.body(), "hello world");
    page.select_in_field(ta, 0, 5);
    let mut c = controller();
    c.handle(HostEvent::MouseUp { now_ms: 0.0 }, &mut page);
    c.handle(HostEvent::Tick { now_ms: 100.0 }, &mut page);

    assert!(
        c.handle(HostEvent::MouseDown { on_overlay: true }, &mut page)
            .is_empty()
    );
    assert!(c.control().is_visible());

    let fx = c.handle(HostEvent::MouseDown { on_overlay: false }, &mut page);
    assert_eq!(fx.into_vec(), vec![Effect::Render]);
    assert!(!c.control().is_visible());

    // The same selection qualifies again after the reset.
    c.handle(HostEvent::MouseUp { now_ms: 200.0 }, &mut page);
    c.handle(HostEvent::Tick { now_ms: 300.0 }, &mut page);
    assert!(c.control().is_visible());

    let fx = c.handle(HostEvent::Input, &mut page);
    assert_eq!(fx.into_vec(), vec![Effect::Render]);
    assert!(!c.control().is_visible());
}

#[test]
fn select_all_is_read_back_after_one_window() {
    let mut page = HeadlessPage::new();
    let ta = page.add_textarea(page.body(), "everything here");
    page.select_in_field(ta, 0, 0);
    let mut c = controller();

    let fx = c.handle(
        HostEvent::KeyDown {
            key: "a".into(),
            modifiers: Modifiers::from_flags(false, false, false, true),
            now_ms: 0.0,
        },
        &mut page,
    );
    assert_eq!(fx.into_vec(), vec![Effect::ScheduleTick { delay_ms: 100.0 }]);

    // The browser applies select-all after the keydown.
    page.select_in_field(ta, 0, 15);
    c.handle(HostEvent::Tick { now_ms: 100.0 }, &mut page);
    assert!(c.control().is_visible());
}

#[test]
fn control_sits_above_a_selection_in_the_lower_half() {
    let mut page = HeadlessPage::new();
    page.set_viewport(Viewport {
        width: 1000.0,
        height: 600.0,
        scroll_x: 0.0,
        scroll_y: 200.0,
    });
    let ta = page.add_textarea(page.body(), "hello world");
    // Document coordinates; 200px of scroll puts the bottom at 500 in the viewport.
    page.set_rect(ta, Rect::new(660.0, 960.0, 700.0, 1100.0));
    page.select_in_field(ta, 0, 5);
    let mut c = controller();
    c.handle(HostEvent::MouseUp { now_ms: 0.0 }, &mut page);
    c.handle(HostEvent::Tick { now_ms: 100.0 }, &mut page);

    let placement = c.placement_state().control().unwrap();
    assert!(placement.is_bottom);
    assert_eq!(placement.top, 460.0 - 10.0 - 24.0);
    assert_eq!(placement.left, 940.0);
}

#[test]
fn same_text_in_another_field_rebinds_the_control() {
    let mut page = HeadlessPage::new();
    let first = page.add_textarea(page.body(), "hello");
    let second = page.add_textarea(page.body(), "hello");
    let mut c = controller();

    page.select_in_field(first, 0, 5);
    c.handle(HostEvent::MouseUp { now_ms: 0.0 }, &mut page);
    c.handle(HostEvent::Tick { now_ms: 100.0 }, &mut page);

    page.select_in_field(second, 0, 5);
    c.handle(
        HostEvent::KeyUp {
            key: "Tab".into(),
            modifiers: Modifiers::NONE,
            now_ms: 200.0,
        },
        &mut page,
    );
    let fx = c.handle(HostEvent::Tick { now_ms: 300.0 }, &mut page);
    assert_eq!(renders(&fx), 1);

    let rw_editor::ActionControl::Visible { descriptor, .. } = c.control().clone() else {
        panic!("control should be visible");
    };
    assert_eq!(descriptor.element(), second);
}

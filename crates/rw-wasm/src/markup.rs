//! HTML for the overlay: the floating control and the rewrite panel.
//!
//! Plain string building so it can be tested off the browser. Every
//! clickable part carries a `data-action` attribute; the overlay delegates
//! events on the shadow root by that attribute.

use rw_core::{Placement, PlacementMetrics, PlacementState};
use rw_editor::{PanelPhase, PanelView};
use std::fmt::Write;

pub const ACTION_ATTR: &str = "data-action";
pub const AGENT_ATTR: &str = "data-agent";
pub const PANEL_SELECTOR: &str = "[data-role=panel]";

const STYLE: &str = "\
:host{all:initial}\
.fr-float{position:fixed;z-index:2147483647;font:13px/1.4 system-ui,sans-serif;color:#1f2328}\
.fr-control{border:0;border-radius:6px;background:#4f46e5;color:#fff;cursor:pointer;font:inherit;padding:0}\
.fr-panel{background:#fff;border:1px solid #d0d7de;border-radius:8px;box-shadow:0 8px 24px rgba(0,0,0,.18);display:flex;flex-direction:column;box-sizing:border-box}\
.fr-head{display:flex;align-items:center;justify-content:space-between;padding:6px 10px;cursor:move;border-bottom:1px solid #eaeef2;user-select:none}\
.fr-body{padding:8px 10px;overflow:auto;flex:1;display:flex;flex-direction:column;gap:6px}\
.fr-text{background:#f6f8fa;border-radius:4px;padding:4px 6px;white-space:pre-wrap;max-height:80px;overflow:auto}\
.fr-menu{position:relative}\
.fr-options{position:absolute;left:0;right:0;background:#fff;border:1px solid #d0d7de;border-radius:4px;margin:2px 0 0;padding:2px 0;list-style:none;z-index:1}\
.fr-options li{padding:4px 8px;cursor:pointer}\
.fr-options li[aria-selected=true]{font-weight:600}\
.fr-note{width:100%;box-sizing:border-box;resize:vertical;min-height:40px;font:inherit}\
.fr-error{color:#cf222e}\
.fr-actions{display:flex;gap:6px;justify-content:flex-end}\
button{font:inherit;cursor:pointer}\
button:disabled{cursor:default;opacity:.5}";

/// Escape text for element content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `style` attribute value placing a fixed element.
pub fn position_style(placement: Placement) -> String {
    format!("top:{}px;left:{}px", placement.top, placement.left)
}

/// Full shadow-root content for the current state.
pub fn render(state: &PlacementState, panel: Option<&PanelView>, metrics: &PlacementMetrics) -> String {
    let mut html = format!("<style>{STYLE}</style>");
    match (panel, state.control()) {
        (Some(view), _) => panel_html(&mut html, view, metrics),
        (None, Some(placement)) => control_html(&mut html, placement, metrics),
        (None, None) => {}
    }
    html
}

fn control_html(out: &mut String, placement: Placement, metrics: &PlacementMetrics) {
    let _ = write!(
        out,
        r#"<button class="fr-float fr-control" {ACTION_ATTR}="control" title="Rewrite with AI" style="{};width:{}px;height:{}px">AI</button>"#,
        position_style(placement),
        metrics.control_width,
        metrics.control_height,
    );
}

fn panel_html(out: &mut String, view: &PanelView, metrics: &PlacementMetrics) {
    let _ = write!(
        out,
        r#"<div class="fr-float fr-panel" data-role="panel" style="{};width:{}px;max-height:{}px">"#,
        position_style(view.placement),
        metrics.panel_width,
        metrics.panel_height,
    );
    let _ = write!(
        out,
        r#"<div class="fr-head" {ACTION_ATTR}="drag"><strong>Fast AI Rewrite</strong><button {ACTION_ATTR}="close" title="Close">&times;</button></div>"#
    );
    out.push_str(r#"<div class="fr-body">"#);

    if view.show_cta {
        let _ = write!(
            out,
            r#"<p>You have no active agent yet.</p><button {ACTION_ATTR}="cta">Create an agent</button>"#
        );
        out.push_str("</div></div>");
        return;
    }

    agent_menu(out, view);

    let _ = write!(
        out,
        r#"<div class="fr-text" title="Selected text">{}</div>"#,
        escape(&view.original_text)
    );
    let _ = write!(
        out,
        r#"<textarea class="fr-note" {ACTION_ATTR}="note" placeholder="Optional instructions"{}>{}</textarea>"#,
        disabled(view.phase == PanelPhase::Fetching),
        escape(&view.note)
    );

    if view.phase == PanelPhase::Fetching {
        out.push_str("<p>Rewriting…</p>");
    }
    if let Some(suggestion) = &view.suggestion {
        let _ = write!(out, r#"<div class="fr-text">{}</div>"#, escape(suggestion));
    }
    if let Some(error) = &view.error {
        let _ = write!(out, r#"<p class="fr-error">{}</p>"#, escape(error));
    }

    out.push_str(r#"<div class="fr-actions">"#);
    let rewrite_label = if view.suggestion.is_some() {
        "Try again"
    } else {
        "Rewrite"
    };
    let _ = write!(
        out,
        r#"<button {ACTION_ATTR}="rewrite"{}>{rewrite_label}</button>"#,
        disabled(!view.can_rewrite)
    );
    if view.suggestion.is_some() {
        let _ = write!(
            out,
            r#"<button {ACTION_ATTR}="approve"{}>Approve</button>"#,
            disabled(!view.can_approve)
        );
    }
    out.push_str("</div></div></div>");
}

fn agent_menu(out: &mut String, view: &PanelView) {
    if view.agents_loading {
        out.push_str("<p>Loading agents…</p>");
        return;
    }
    if view.agents.is_empty() {
        return;
    }
    let label = view.chosen_agent_name.as_deref().unwrap_or("Choose an agent");
    let _ = write!(
        out,
        r#"<div class="fr-menu"><button {ACTION_ATTR}="menu" aria-expanded="{}">{} ▾</button>"#,
        view.menu_open,
        escape(label)
    );
    if view.menu_open {
        out.push_str(r#"<ul class="fr-options" role="listbox">"#);
        for agent in &view.agents {
            let selected = view.chosen_agent.as_ref() == Some(&agent.id);
            let _ = write!(
                out,
                r#"<li role="option" {ACTION_ATTR}="agent" {AGENT_ATTR}="{}" aria-selected="{selected}">{}</li>"#,
                escape(agent.id.as_str()),
                escape(&agent.name)
            );
        }
        out.push_str("</ul>");
    }
    out.push_str("</div>");
}

fn disabled(yes: bool) -> &'static str {
    if yes { " disabled" } else { "" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rw_core::AgentId;
    use rw_editor::panel::AgentOption;

    fn view() -> PanelView {
        PanelView {
            placement: Placement {
                top: 40.0,
                left: 12.5,
                is_bottom: false,
            },
            phase: PanelPhase::AwaitingInput,
            agents_loading: false,
            agents: vec![
                AgentOption {
                    id: AgentId::new("a1"),
                    name: "Formal".into(),
                },
                AgentOption {
                    id: AgentId::new("a2"),
                    name: "Casual <3".into(),
                },
            ],
            chosen_agent: Some(AgentId::new("a2")),
            chosen_agent_name: Some("Casual <3".into()),
            menu_open: false,
            show_cta: false,
            original_text: "x < y && \"z\"".into(),
            note: String::new(),
            suggestion: None,
            error: None,
            can_rewrite: true,
            can_approve: false,
        }
    }

    fn metrics() -> PlacementMetrics {
        PlacementMetrics::default()
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape("héllo 👋"), "héllo 👋");
    }

    #[test]
    fn nothing_shown_renders_only_styles() {
        let html = render(&PlacementState::default(), None, &metrics());
        assert!(html.starts_with("<style>"));
        assert!(!html.contains(ACTION_ATTR));
    }

    #[test]
    fn control_sits_at_its_placement() {
        let mut state = PlacementState::default();
        state.show_control(Placement {
            top: 110.0,
            left: 300.0,
            is_bottom: true,
        });
        let html = render(&state, None, &metrics());
        assert!(html.contains(r#"data-action="control""#));
        assert!(html.contains("top:110px;left:300px;width:60px;height:24px"));
    }

    #[test]
    fn panel_escapes_user_text() {
        let html = render(&PlacementState::default(), Some(&view()), &metrics());
        assert!(html.contains("x &lt; y &amp;&amp; &quot;z&quot;"));
        assert!(html.contains("Casual &lt;3 ▾"));
        assert!(!html.contains("<3"));
        assert!(html.contains("top:40px;left:12.5px;width:256px"));
    }

    #[test]
    fn open_menu_lists_agents_and_marks_the_chosen_one() {
        let mut v = view();
        v.menu_open = true;
        let html = render(&PlacementState::default(), Some(&v), &metrics());
        assert!(html.contains(r#"data-agent="a1" aria-selected="false">Formal</li>"#));
        assert!(html.contains(r#"data-agent="a2" aria-selected="true">Casual &lt;3</li>"#));
    }

    #[test]
    fn approve_appears_with_a_suggestion() {
        let mut v = view();
        assert!(!render(&PlacementState::default(), Some(&v), &metrics()).contains("approve"));
        v.phase = PanelPhase::SuggestionReady;
        v.suggestion = Some("hi world".into());
        v.can_approve = true;
        let html = render(&PlacementState::default(), Some(&v), &metrics());
        assert!(html.contains(r#"<button data-action="approve">Approve</button>"#));
        assert!(html.contains(">Try again</button>"));
    }

    #[test]
    fn fetching_disables_the_controls() {
        let mut v = view();
        v.phase = PanelPhase::Fetching;
        v.can_rewrite = false;
        let html = render(&PlacementState::default(), Some(&v), &metrics());
        assert!(html.contains(r#"<button data-action="rewrite" disabled>Rewrite</button>"#));
        assert!(html.contains("Rewriting…"));
    }

    #[test]
    fn no_active_agent_offers_creation() {
        let mut v = view();
        v.show_cta = true;
        v.agents.clear();
        let html = render(&PlacementState::default(), Some(&v), &metrics());
        assert!(html.contains(r#"data-action="cta""#));
        assert!(!html.contains(r#"data-action="rewrite""#));
    }

    #[test]
    fn error_is_shown() {
        let mut v = view();
        v.error = Some("Rewrite failed: HTTP 500".into());
        let html = render(&PlacementState::default(), Some(&v), &metrics());
        assert!(html.contains(r#"<p class="fr-error">Rewrite failed: HTTP 500</p>"#));
    }
}

//! Text replacement engine.
//!
//! Splices a suggestion into the surface a `SelectionDescriptor` was
//! captured from, using only the descriptor's element and offsets. The live
//! selection is never consulted: by the time the user approves, it has
//! usually collapsed or moved to the panel.
//!
//! Before touching anything the engine re-reads the surface and checks that
//! the element is still attached, the offsets are still in range, and the
//! text at those offsets is still what was selected. Any mismatch aborts
//! with `ReplacementTargetStale` and leaves the page as it was. Callers run
//! this exactly once per approval; there is no retry.

use crate::error::RewriteError;
use crate::host::EditableHost;
use crate::id::ElementId;
use crate::model::{SelectionDescriptor, SurfaceKind};
use crate::text::{plan_run_splice, slice_utf16, splice_utf16, utf16_len, utf16_to_byte};

/// Outcome of a successful replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replaced {
    pub element: ElementId,
    /// Caret position (UTF-16) right after the inserted text.
    pub cursor: usize,
}

/// Replace the descriptor's span with `replacement`.
pub fn replace_selection<H: EditableHost>(
    host: &mut H,
    descriptor: &SelectionDescriptor,
    replacement: &str,
) -> Result<Replaced, RewriteError> {
    let element = descriptor.element();
    if !host.is_connected(element) {
        return Err(RewriteError::stale("element is no longer in the page"));
    }
    match host.surface_kind(element) {
        None => return Err(RewriteError::UnsupportedSurface),
        Some(kind) if kind != descriptor.surface() => {
            return Err(RewriteError::stale("element is no longer the same kind of field"));
        }
        Some(_) => {}
    }

    let result = match descriptor.surface() {
        SurfaceKind::PlainInput => replace_in_field(host, descriptor, replacement),
        SurfaceKind::ContentEditable => replace_in_rich(host, descriptor, replacement),
    };
    match &result {
        Ok(done) => log::debug!("replaced {element} span, cursor at {}", done.cursor),
        Err(e) => log::warn!("replacement in {element} aborted: {e}"),
    }
    result
}

fn replace_in_field<H: EditableHost>(
    host: &mut H,
    descriptor: &SelectionDescriptor,
    replacement: &str,
) -> Result<Replaced, RewriteError> {
    let element = descriptor.element();
    let value = host
        .field_value(element)
        .ok_or(RewriteError::UnsupportedSurface)?;
    let (start, end) = (descriptor.start(), descriptor.end());
    check_span(&value, start, end, descriptor.text())?;

    let updated = splice_utf16(&value, start, end, replacement)
        .ok_or_else(|| RewriteError::stale("offsets no longer fit the field"))?;
    let cursor = start + utf16_len(replacement);

    host.set_field_value(element, &updated);
    host.set_field_selection(element, start, cursor);
    host.focus(element);
    host.dispatch_input(element);
    Ok(Replaced { element, cursor })
}

fn replace_in_rich<H: EditableHost>(
    host: &mut H,
    descriptor: &SelectionDescriptor,
    replacement: &str,
) -> Result<Replaced, RewriteError> {
    let element = descriptor.element();
    let runs = host.text_runs(element);
    let content: String = runs.iter().map(|(_, text)| text.as_str()).collect();
    let (start, end) = (descriptor.start(), descriptor.end());
    check_span(&content, start, end, descriptor.text())?;

    let lens: Vec<usize> = runs.iter().map(|(_, text)| utf16_len(text)).collect();
    let plan = plan_run_splice(&lens, start, end)
        .ok_or_else(|| RewriteError::stale("offsets no longer fit the text"))?;

    let (first, first_text) = &runs[plan.start_run];
    let (last, last_text) = &runs[plan.end_run];
    let prefix = utf16_prefix(first_text, plan.start_offset)?;
    let suffix = utf16_suffix(last_text, plan.end_offset)?;

    // Everything below mutates the page; all checks are done.
    host.set_run_text(first, prefix);
    let inserted = host
        .insert_run_after(first, replacement)
        .ok_or_else(|| RewriteError::stale("could not insert text"))?;
    if plan.is_single_run() {
        if !suffix.is_empty() {
            host.insert_run_after(&inserted, suffix);
        }
    } else {
        for (run, _) in &runs[plan.interior_runs()] {
            host.remove_run(run);
        }
        if suffix.is_empty() {
            host.remove_run(last);
        } else {
            host.set_run_text(last, suffix);
        }
    }

    host.collapse_selection_after(&inserted);
    host.focus(element);
    host.dispatch_input(element);
    Ok(Replaced {
        element,
        cursor: start + utf16_len(replacement),
    })
}

/// The surface must still hold the captured text at the captured offsets.
fn check_span(content: &str, start: usize, end: usize, expected: &str) -> Result<(), RewriteError> {
    if end > utf16_len(content) {
        return Err(RewriteError::stale("offsets exceed the current text"));
    }
    match slice_utf16(content, start, end) {
        Some(current) if current == expected => Ok(()),
        Some(_) => Err(RewriteError::stale("selected text was edited")),
        None => Err(RewriteError::stale("offsets split a character")),
    }
}

fn utf16_prefix(s: &str, offset: usize) -> Result<&str, RewriteError> {
    utf16_to_byte(s, offset)
        .map(|b| &s[..b])
        .ok_or_else(|| RewriteError::stale("offsets split a character"))
}

fn utf16_suffix(s: &str, offset: usize) -> Result<&str, RewriteError> {
    utf16_to_byte(s, offset)
        .map(|b| &s[b..])
        .ok_or_else(|| RewriteError::stale("offsets split a character"))
}

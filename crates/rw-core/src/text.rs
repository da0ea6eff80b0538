//! Offset arithmetic for page text.
//!
//! The DOM counts `selectionStart`, range offsets and `Text.length` in
//! UTF-16 code units, while Rust strings index by bytes. Everything in this
//! module converts between the two and refuses offsets that would split a
//! surrogate pair.

/// Length of `s` in UTF-16 code units.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Convert a UTF-16 offset into a byte index into `s`.
///
/// Returns `None` past the end or in the middle of a surrogate pair.
pub fn utf16_to_byte(s: &str, offset: usize) -> Option<usize> {
    let mut units = 0;
    for (byte, ch) in s.char_indices() {
        if units == offset {
            return Some(byte);
        }
        units += ch.len_utf16();
        if units > offset {
            return None;
        }
    }
    (units == offset).then_some(s.len())
}

/// Borrow `s[start..end)` where the bounds are UTF-16 offsets.
pub fn slice_utf16(s: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let a = utf16_to_byte(s, start)?;
    let b = utf16_to_byte(s, end)?;
    Some(&s[a..b])
}

/// Build `s[..start] + replacement + s[end..]` with UTF-16 bounds.
pub fn splice_utf16(s: &str, start: usize, end: usize, replacement: &str) -> Option<String> {
    if start > end {
        return None;
    }
    let a = utf16_to_byte(s, start)?;
    let b = utf16_to_byte(s, end)?;
    let mut out = String::with_capacity(s.len() - (b - a) + replacement.len());
    out.push_str(&s[..a]);
    out.push_str(replacement);
    out.push_str(&s[b..]);
    Some(out)
}

// ─── Text runs ───────────────────────────────────────────────────────────

/// Where a `[start, end)` span begins and ends inside a sequence of text
/// runs (text nodes in document order).
///
/// Runs strictly between `start_run` and `end_run` are covered entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSplice {
    pub start_run: usize,
    /// Offset inside `start_run` where the span begins.
    pub start_offset: usize,
    pub end_run: usize,
    /// Offset inside `end_run` where the span ends.
    pub end_offset: usize,
}

impl RunSplice {
    pub fn is_single_run(&self) -> bool {
        self.start_run == self.end_run
    }

    /// Indices of the runs the span covers completely.
    pub fn interior_runs(&self) -> std::ops::Range<usize> {
        (self.start_run + 1)..self.end_run.max(self.start_run + 1)
    }
}

/// Map a `[start, end)` span over runs of the given UTF-16 lengths.
///
/// Each boundary goes to the run holding the character next to it: a start
/// on a boundary between two runs begins the later run, an end on a boundary
/// finishes the earlier one. Returns `None` for inverted spans or spans past
/// the total length.
pub fn plan_run_splice(run_lens: &[usize], start: usize, end: usize) -> Option<RunSplice> {
    if start > end {
        return None;
    }
    let (start_run, start_offset) = locate(run_lens, start, 0, start < end)?;
    let (end_run, end_offset) = locate(run_lens, end, start_run, false)?;
    // A span ending in the start run must not end before it begins.
    if end_run == start_run && end_offset < start_offset {
        return None;
    }
    Some(RunSplice {
        start_run,
        start_offset,
        end_run,
        end_offset,
    })
}

/// Absolute offset of `local` inside run `run`.
pub fn absolute_offset(run_lens: &[usize], run: usize, local: usize) -> Option<usize> {
    let len = *run_lens.get(run)?;
    if local > len {
        return None;
    }
    Some(run_lens[..run].iter().sum::<usize>() + local)
}

/// Run containing `offset`. With `before_char` the offset must sit before a
/// character of the run, so a boundary resolves to the later run.
fn locate(
    run_lens: &[usize],
    offset: usize,
    from_run: usize,
    before_char: bool,
) -> Option<(usize, usize)> {
    let mut base: usize = run_lens.get(..from_run)?.iter().sum();
    for (i, &len) in run_lens.iter().enumerate().skip(from_run) {
        let inside = if before_char {
            offset < base + len
        } else {
            offset <= base + len
        };
        if inside {
            return Some((i, offset - base));
        }
        base += len;
    }
    None
}

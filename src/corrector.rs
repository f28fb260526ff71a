//! Application of translated edit actions to the original buffer.
//!
//! Edits are collected, normalized to `(range, replacement)` pairs, sorted
//! by position, and applied in one pass. Overlapping edits are resolved by
//! keeping the first and dropping the rest, so one bad correction cannot
//! corrupt the rewrite.

use tracing::warn;

use crate::cops::{EditAction, EditKind};
use crate::source::Range;

/// A rewriter over one original buffer.
pub struct Corrector<'a> {
    source: &'a str,
    edits: Vec<(Range, String)>,
}

impl<'a> Corrector<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    /// Queue one action whose range is already in original coordinates.
    pub fn push(&mut self, action: &EditAction) {
        debug_assert!(
            action.range.end <= self.source.len(),
            "edit range {} outside buffer of length {}",
            action.range,
            self.source.len()
        );
        let (range, text) = match action.kind {
            EditKind::Remove => (action.range, String::new()),
            EditKind::Replace => (action.range, action.text.clone()),
            EditKind::InsertBefore => (Range::empty(action.range.begin), action.text.clone()),
            EditKind::InsertAfter => (Range::empty(action.range.end), action.text.clone()),
        };
        self.edits.push((range, text));
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply all queued edits and return the rewritten buffer.
    pub fn rewrite(mut self) -> String {
        // Stable sort keeps queue order for edits at the same position.
        self.edits.sort_by_key(|(range, _)| range.begin);

        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0usize;
        for (range, text) in &self.edits {
            if range.begin < cursor {
                warn!(range = %range, "dropping overlapping correction edit");
                continue;
            }
            out.push_str(&self.source[cursor..range.begin]);
            out.push_str(text);
            cursor = range.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

//! Bidirectional range mapping between the IR and the original template.
//!
//! The map is an append-only log of `(dest, origin)` entries recording what
//! the transpiler wrote where. Lookups fall back in a fixed order: exact
//! match, endpoint translation, empty insertion point, relative translation
//! through a length-preserving entry, and finally spanning translation of
//! the two endpoints separately. Entries are scanned in insertion order and
//! the first match wins, so a broad whole-tag entry recorded before a
//! narrower code entry takes precedence for exact lookups.

use crate::source::Range;

/// One transpiler emission: the IR bytes `dest` stand in for the original
/// bytes `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEntry {
    pub dest: Range,
    pub origin: Range,
}

impl MapEntry {
    /// Length-preserving entries support relative (containment) lookup;
    /// all entries support endpoint lookup.
    pub fn is_length_preserving(&self) -> bool {
        self.dest.len() == self.origin.len()
    }
}

/// Append-only log of map entries.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    entries: Vec<MapEntry>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Dest begins must be non-decreasing; nested or
    /// duplicate dest ranges are allowed (a whole-tag span followed by its
    /// code sub-span).
    pub fn add(&mut self, origin: Range, dest: Range) {
        debug_assert!(
            self.entries
                .last()
                .map(|last| last.dest.begin <= dest.begin)
                .unwrap_or(true),
            "source map entries must be appended in dest order: {:?} after {:?}",
            dest,
            self.entries.last()
        );
        self.entries.push(MapEntry { dest, origin });
    }

    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    /// Translate an IR range to an original range, or `None` when no part
    /// of the map covers it.
    pub fn translate(&self, range: Range) -> Option<Range> {
        if let Some(entry) = self.entries.iter().find(|e| e.dest == range) {
            return Some(entry.origin);
        }

        let begin = self.translate_beginning(range.begin);
        if range.is_empty() {
            if let Some(b) = begin {
                return Some(Range::empty(b));
            }
        }
        if let (Some(b), Some(e)) = (begin, self.translate_ending(range.end)) {
            return Some(Range::new(b.min(e), e.max(b)));
        }

        if let Some(shifted) = self.relative(range) {
            return Some(shifted);
        }

        // Spanning: resolve each endpoint independently through (possibly
        // different) length-preserving entries.
        let s = self.relative(Range::empty(range.begin))?;
        let t = self.relative(Range::empty(range.end))?;
        Some(Range::new(s.begin.min(t.begin), t.begin.max(s.begin)))
    }

    /// Origin position of the first entry whose dest begins at `pos`.
    pub fn translate_beginning(&self, pos: usize) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.dest.begin == pos)
            .map(|e| e.origin.begin)
    }

    /// Origin position of the first entry whose dest ends at `pos`.
    pub fn translate_ending(&self, pos: usize) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.dest.end == pos)
            .map(|e| e.origin.end)
    }

    /// Shift `range` through the first length-preserving entry containing it.
    fn relative(&self, range: Range) -> Option<Range> {
        self.entries
            .iter()
            .find(|e| e.is_length_preserving() && !e.dest.is_empty() && e.dest.contains(range))
            .map(|e| {
                let delta_begin = range.begin - e.dest.begin;
                let delta_end = range.end - e.dest.begin;
                Range::new(e.origin.begin + delta_begin, e.origin.begin + delta_end)
            })
    }
}

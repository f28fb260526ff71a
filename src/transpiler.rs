//! AST-to-IR transpilation.
//!
//! The transpiler walks the flat document tree and emits a block-structured
//! pseudo-program whose whitespace mirrors the template byte-for-byte: for
//! every template line the IR holds a line with identical leading whitespace
//! and a plausible code token in place of the markup. Tag nesting becomes
//! `{ ... }` blocks, attributes become argument lists, embedded code is
//! spliced in at the tag's column, and `<pre>` subtrees are opaque.
//!
//! Every emission records a source-map entry; equal-length emissions are
//! relatively translatable, the rest translate at their endpoints. Embedded
//! code tags additionally record a whole-span entry before their sub-spans
//! so exact lookups resolve to the full `<% ... %>` range.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::ast::{Comment, Document, Embedded, Indicator, Node, Tag, TagKind, Text, TextPart};
use crate::source::{ProcessedSource, Range};
use crate::source_map::SourceMap;

lazy_static! {
    /// A code chunk ending in a block opener: `... do`, `... do |x, y|`,
    /// `... {` or `... { |x|`.
    static ref TRAILING_BLOCK: Regex =
        Regex::new(r"(?:\bdo|\{)(?:\s*\|[^|\r\n]*\|)?\s*\z").expect("trailing block regex");
}

/// Build an identifier of exactly `len` bytes by cycling `token`.
fn repeat_token(token: &str, len: usize) -> String {
    token.bytes().cycle().take(len).map(char::from).collect()
}

/// Visitor state for one transpilation session. Created per template, used
/// once, discarded; only the emitted text and map survive.
pub struct IrTranspiler<'a> {
    src: &'a ProcessedSource,
    out: String,
    map: SourceMap,
    tag_stack: Vec<String>,
    /// Depth of nested `<pre>` tags; content is skipped while > 0.
    pre_depth: usize,
}

impl<'a> IrTranspiler<'a> {
    pub fn new(src: &'a ProcessedSource) -> Self {
        Self {
            src,
            out: String::with_capacity(src.len()),
            map: SourceMap::new(),
            tag_stack: Vec::new(),
            pre_depth: 0,
        }
    }

    /// Transpile the document, consuming the session.
    pub fn transpile(mut self, doc: &Document) -> (String, SourceMap) {
        for node in &doc.children {
            self.visit_node(node);
        }
        (self.out, self.map)
    }

    // -------------------------------------------------------------------
    // Emission primitives
    // -------------------------------------------------------------------

    /// Append `text` and record a map entry from the new IR range back to
    /// `origin`. Length-preserving iff the lengths match.
    fn emit(&mut self, origin: Range, text: &str) {
        let begin = self.out.len();
        self.out.push_str(text);
        self.map.add(origin, Range::new(begin, self.out.len()));
    }

    /// Copy original bytes verbatim (always length-preserving).
    fn copy(&mut self, origin: Range) {
        let src = self.src;
        self.emit(origin, src.slice(origin));
    }

    /// Append without mapping; the caller records entries itself.
    fn push_raw(&mut self, text: &str) -> Range {
        let begin = self.out.len();
        self.out.push_str(text);
        Range::new(begin, self.out.len())
    }

    // -------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------

    fn visit_node(&mut self, node: &Node) {
        if self.pre_depth > 0 {
            // Everything inside <pre> is indentation-opaque. Only track
            // nesting so the matching close exits pre mode.
            if let Node::Tag(tag) = node {
                if tag.name_eq("pre") {
                    match tag.kind {
                        TagKind::Opening => self.pre_depth += 1,
                        TagKind::Closing => {
                            self.pre_depth -= 1;
                            if self.pre_depth == 0 {
                                self.close_pre(tag);
                                return;
                            }
                        }
                        TagKind::SelfClosing => {}
                    }
                }
            }
            trace!(range = %node.range(), "skipping node inside <pre>");
            return;
        }

        match node {
            Node::Tag(tag) => match tag.kind {
                TagKind::Opening => self.visit_opening_tag(tag),
                TagKind::Closing => self.visit_closing_tag(tag),
                TagKind::SelfClosing => self.visit_self_closing_tag(tag),
            },
            Node::Text(text) => self.visit_text(text),
            Node::Embedded(embedded) => self.visit_embedded(embedded),
            Node::Comment(comment) => self.visit_comment(comment),
        }
    }

    // -------------------------------------------------------------------
    // Tags
    // -------------------------------------------------------------------

    /// Emit `tagt(linelineli, ...)` for `<name attr attr2>`: a same-width
    /// identifier for the `<name` prefix, one same-width token per
    /// attribute so the argument-alignment rule sees the original columns,
    /// and `)` over the tag close.
    fn emit_tag_head(&mut self, tag: &Tag) {
        let prefix = tag.prefix_range();
        self.emit(prefix, &repeat_token("tag", prefix.len()));

        let mut cursor = prefix.end;
        if let Some(first) = tag.attributes.first() {
            if first.range.begin > cursor {
                // The paren replaces one separator byte, keeping the first
                // attribute at its original column.
                self.emit(Range::new(cursor, cursor + 1), "(");
                cursor += 1;
                if first.range.begin > cursor {
                    self.copy(Range::new(cursor, first.range.begin));
                }
            } else {
                self.emit(Range::empty(cursor), "(");
            }

            let last = tag.attributes.len() - 1;
            for (i, attr) in tag.attributes.iter().enumerate() {
                self.emit(attr.range, &repeat_token("line", attr.range.len()));
                cursor = attr.range.end;
                if i < last {
                    self.emit(Range::empty(cursor), ",");
                    let next = tag.attributes[i + 1].range.begin;
                    if next > cursor {
                        self.copy(Range::new(cursor, next));
                    }
                }
            }
        } else {
            self.emit(Range::empty(cursor), "(");
        }

        self.emit(Range::new(cursor.min(tag.range.end), tag.range.end), ")");
    }

    fn visit_opening_tag(&mut self, tag: &Tag) {
        self.emit_tag_head(tag);
        if tag.is_void() {
            self.emit(Range::empty(tag.range.end), ";");
            return;
        }

        self.emit(Range::empty(tag.range.end), " {");
        self.tag_stack.push(tag.name.to_ascii_lowercase());

        if tag.name_eq("pre") {
            self.pre_depth = 1;
            self.open_pre(tag);
        }
    }

    fn visit_self_closing_tag(&mut self, tag: &Tag) {
        self.emit_tag_head(tag);
        self.emit(Range::empty(tag.range.end), ";");
    }

    fn visit_closing_tag(&mut self, tag: &Tag) {
        if tag.is_void() {
            // Stray closers for void elements are invalid HTML; tolerate.
            trace!(name = %tag.name, "ignoring close tag for void element");
            return;
        }
        self.tag_stack.pop();
        self.emit_close_brace(tag);
    }

    fn emit_close_brace(&mut self, tag: &Tag) {
        self.emit(tag.range, "}");
        self.emit(Range::empty(tag.range.end), ";");
    }

    /// On entering `<pre>`, carry the following line break so the open
    /// brace's line terminates where the template's does.
    fn open_pre(&mut self, tag: &Tag) {
        let bytes = self.src.text().as_bytes();
        let mut p = tag.range.end;
        while p < bytes.len() && matches!(bytes[p], b' ' | b'\t' | b'\r') {
            p += 1;
        }
        if p >= bytes.len() || bytes[p] != b'\n' {
            return;
        }
        let newline = p;
        let mut ws_end = newline + 1;
        while ws_end < bytes.len() && matches!(bytes[ws_end], b' ' | b'\t') {
            ws_end += 1;
        }
        self.copy(Range::new(newline, ws_end));
    }

    /// On leaving `<pre>`, restore the close tag's line and column before
    /// emitting its brace.
    fn close_pre(&mut self, tag: &Tag) {
        self.tag_stack.pop();
        let line_start = self.src.line_start(self.src.line_index_of(tag.range.begin));
        let indent = &self.src.text()[line_start..tag.range.begin];
        if indent.bytes().all(|b| matches!(b, b' ' | b'\t')) {
            if line_start > 0 {
                self.copy(Range::new(line_start - 1, tag.range.begin));
            } else if !indent.is_empty() {
                self.copy(Range::new(line_start, tag.range.begin));
            }
        }
        self.emit_close_brace(tag);
    }

    // -------------------------------------------------------------------
    // Text
    // -------------------------------------------------------------------

    fn visit_text(&mut self, text: &Text) {
        for part in &text.parts {
            match part {
                TextPart::Literal(range) => self.emit_literal(*range),
                TextPart::Embedded(embedded) => self.visit_embedded(embedded),
            }
        }
    }

    /// Literal text: whitespace runs (newlines included) are copied
    /// byte-for-byte; each line's payload becomes a same-width `text` token
    /// terminated by `;` (a bare `;` when a single byte).
    fn emit_literal(&mut self, range: Range) {
        let bytes = self.src.text().as_bytes();
        let mut p = range.begin;
        while p < range.end {
            if bytes[p].is_ascii_whitespace() {
                let ws_begin = p;
                while p < range.end && bytes[p].is_ascii_whitespace() {
                    p += 1;
                }
                self.copy(Range::new(ws_begin, p));
            } else {
                let content_begin = p;
                let mut line_end = p;
                while line_end < range.end && bytes[line_end] != b'\n' {
                    line_end += 1;
                }
                let mut content_end = line_end;
                while content_end > content_begin && bytes[content_end - 1].is_ascii_whitespace() {
                    content_end -= 1;
                }
                let content = Range::new(content_begin, content_end);
                if content.len() >= 2 {
                    self.emit(content, &repeat_token("text", content.len()));
                    self.emit(Range::empty(content.end), ";");
                } else {
                    self.emit(content, ";");
                }
                p = content_end;
            }
        }
    }

    // -------------------------------------------------------------------
    // Embedded code
    // -------------------------------------------------------------------

    fn visit_embedded(&mut self, e: &Embedded) {
        let src = self.src;
        let code = src.slice(e.code);
        let trimmed = code.trim();
        let lead_len = code.len() - code.trim_start().len();
        let trim_begin = e.code.begin + lead_len;
        let trim_end = trim_begin + trimmed.len();
        let open_delim = Range::new(e.range.begin, e.code.begin);
        let close_delim = Range::new(e.code.end, e.range.end);

        let ir_begin = self.out.len();
        // (origin, dest) pairs recorded after the whole-span entry, so that
        // exact lookups prefer the full tag range.
        let mut subs: Vec<(Range, Range)> = Vec::new();

        if e.indicator == Indicator::Comment {
            let dest = self.push_raw("#");
            subs.push((open_delim, dest));
            if !code.is_empty() {
                let dest = self.push_raw(code);
                subs.push((e.code, dest));
            }
        } else {
            let starts_on_newline = code.starts_with('\n') || code.starts_with("\r\n");
            let is_multiline = trimmed.contains('\n');
            let trailing_block = TRAILING_BLOCK
                .find(trimmed)
                .map(|m| trimmed[m.start()..].trim_end());
            let (ends_line, at_eof) = tag_ends_its_line(src, e.range.end);

            if let Some(opener) = trailing_block.filter(|_| is_multiline && starts_on_newline) {
                // The chunk begins on its own line and ends opening a block:
                // wrapping it in begin/end would misreport the block body, so
                // only the block opener survives into the IR.
                let opener_origin = Range::new(trim_end - opener.len(), trim_end);
                let dest = self.push_raw("__with_block ");
                subs.push((Range::new(e.range.begin, opener_origin.begin), dest));
                let dest = self.push_raw(opener);
                subs.push((opener_origin, dest));
            } else if is_multiline && starts_on_newline {
                let dest = self.push_raw("begin");
                subs.push((open_delim, dest));
                if lead_len > 0 {
                    let lead = Range::new(e.code.begin, trim_begin);
                    let dest = self.push_raw(src.slice(lead));
                    subs.push((lead, dest));
                }
                let dest = self.push_raw(trimmed);
                subs.push((Range::new(trim_begin, trim_end), dest));
                if trim_end < e.code.end {
                    let trail = Range::new(trim_end, e.code.end);
                    let dest = self.push_raw(src.slice(trail));
                    subs.push((trail, dest));
                }
                let dest = self.push_raw("end");
                subs.push((close_delim, dest));
            } else if is_multiline {
                // Starts on the `<%` line: a placeholder reserves the open
                // delimiter's columns, one column given up to the `;`.
                let width = (open_delim.len() + lead_len).saturating_sub(1);
                let dest = self.push_raw(&repeat_token("erb", width));
                subs.push((Range::new(e.range.begin, trim_begin), dest));
                let dest = self.push_raw(";");
                subs.push((Range::empty(trim_begin), dest));
                let dest = self.push_raw(trimmed);
                subs.push((Range::new(trim_begin, trim_end), dest));
            } else if ends_line {
                if !trimmed.is_empty() {
                    let dest = self.push_raw(trimmed);
                    subs.push((Range::new(trim_begin, trim_end), dest));
                    if at_eof {
                        let dest = self.push_raw(";");
                        subs.push((Range::empty(e.range.end), dest));
                    }
                }
            } else {
                // Mid-line tag: placeholders on both sides keep the columns
                // of whatever shares the line.
                let pre_width = (open_delim.len() + lead_len).saturating_sub(1);
                let dest = self.push_raw(&repeat_token("erb", pre_width));
                subs.push((Range::new(e.range.begin, trim_begin), dest));
                let dest = self.push_raw(";");
                subs.push((Range::empty(trim_begin), dest));
                if !trimmed.is_empty() {
                    let dest = self.push_raw(trimmed);
                    subs.push((Range::new(trim_begin, trim_end), dest));
                }
                let post_width = ((e.code.end - trim_end) + close_delim.len()).saturating_sub(1);
                let dest = self.push_raw(&repeat_token("erb", post_width));
                subs.push((Range::new(trim_end, e.range.end), dest));
                let dest = self.push_raw(";");
                subs.push((Range::empty(e.range.end), dest));
            }
        }

        self.map
            .add(e.range, Range::new(ir_begin, self.out.len()));
        for (origin, dest) in subs {
            self.map.add(origin, dest);
        }
    }

    // -------------------------------------------------------------------
    // Comments
    // -------------------------------------------------------------------

    /// A standalone comment that opens its line becomes a checkable
    /// statement; anywhere else it is suppressed, since a mid-line token
    /// would pull the following content's indent to the comment's column.
    fn visit_comment(&mut self, c: &Comment) {
        let line_start = self.src.line_start(self.src.line_index_of(c.range.begin));
        let prefix = &self.src.text()[line_start..c.range.begin];
        if !prefix.bytes().all(|b| matches!(b, b' ' | b'\t')) {
            trace!(range = %c.range, "suppressing mid-line comment");
            return;
        }
        self.emit(c.range, "__comment");
        self.emit(Range::empty(c.range.end), ";");
    }
}

/// Whether only horizontal whitespace separates `pos` from the next line
/// break. The second flag is set when the buffer ends first.
fn tag_ends_its_line(src: &ProcessedSource, pos: usize) -> (bool, bool) {
    let bytes = src.text().as_bytes();
    let mut p = pos;
    while p < bytes.len() && matches!(bytes[p], b' ' | b'\t' | b'\r') {
        p += 1;
    }
    if p >= bytes.len() {
        (true, true)
    } else {
        (bytes[p] == b'\n', false)
    }
}

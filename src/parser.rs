//! Tolerant ERB template parser.
//!
//! Produces the flat [`Document`] the transpiler consumes: opening and
//! closing tags as separate nodes, text runs with interleaved embedded code
//! tags, and standalone `<%# %>` comments. The parser never fails; malformed
//! input degrades to text or to a best-effort node that covers the rest of
//! the buffer. HTML comments (`<!-- -->`) and doctypes are opaque text.

use crate::ast::{
    Attribute, Comment, Document, Embedded, Indicator, Node, Tag, TagKind, Text, TextPart,
};
use crate::source::{ProcessedSource, Range};

/// Parse a template into a flat document tree.
pub fn parse(source: &ProcessedSource) -> Document {
    Parser::new(source.text()).run()
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    children: Vec<Node>,
    /// Parts of the text run currently being collected.
    parts: Vec<TextPart>,
    /// Start of the pending literal slice, if one is open.
    literal_begin: Option<usize>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            children: Vec::new(),
            parts: Vec::new(),
            literal_begin: None,
        }
    }

    fn run(mut self) -> Document {
        while self.pos < self.bytes.len() {
            match self.peek_construct() {
                Construct::Erb => self.scan_erb(),
                Construct::OpeningTag => self.scan_tag(TagKind::Opening),
                Construct::ClosingTag => self.scan_tag(TagKind::Closing),
                Construct::HtmlComment => self.scan_opaque(b"-->"),
                Construct::Doctype => self.scan_opaque(b">"),
                Construct::Literal => self.scan_literal_byte(),
            }
        }
        self.flush_text();
        Document {
            range: Range::new(0, self.bytes.len()),
            children: self.children,
        }
    }

    // -------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------

    fn peek_construct(&self) -> Construct {
        if self.bytes[self.pos] != b'<' {
            return Construct::Literal;
        }
        match self.bytes.get(self.pos + 1) {
            Some(b'%') => Construct::Erb,
            Some(b'/') if self.peek_name_start(self.pos + 2) => Construct::ClosingTag,
            Some(b'!') => {
                if self.bytes[self.pos..].starts_with(b"<!--") {
                    Construct::HtmlComment
                } else {
                    Construct::Doctype
                }
            }
            Some(_) if self.peek_name_start(self.pos + 1) => Construct::OpeningTag,
            _ => Construct::Literal,
        }
    }

    fn peek_name_start(&self, at: usize) -> bool {
        self.bytes
            .get(at)
            .map(|b| b.is_ascii_alphabetic())
            .unwrap_or(false)
    }

    // -------------------------------------------------------------------
    // Text runs
    // -------------------------------------------------------------------

    fn scan_literal_byte(&mut self) {
        if self.literal_begin.is_none() {
            self.literal_begin = Some(self.pos);
        }
        self.pos += 1;
    }

    /// Consume an opaque construct (HTML comment, doctype) as literal text.
    fn scan_opaque(&mut self, terminator: &[u8]) {
        if self.literal_begin.is_none() {
            self.literal_begin = Some(self.pos);
        }
        let rest = &self.bytes[self.pos..];
        self.pos += find(rest, terminator)
            .map(|i| i + terminator.len())
            .unwrap_or(rest.len());
    }

    fn close_literal(&mut self) {
        if let Some(begin) = self.literal_begin.take() {
            if begin < self.pos {
                self.parts.push(TextPart::Literal(Range::new(begin, self.pos)));
            }
        }
    }

    /// Finish the current text run and emit it as a node. A run holding a
    /// single embedded tag and no literal bytes becomes a direct Embedded
    /// child instead of a one-part text node.
    fn flush_text(&mut self) {
        self.close_literal();
        if self.parts.is_empty() {
            return;
        }
        let parts = std::mem::take(&mut self.parts);
        if parts.len() == 1 {
            if let TextPart::Embedded(embedded) = &parts[0] {
                self.children.push(Node::Embedded(embedded.clone()));
                return;
            }
        }
        let begin = match &parts[0] {
            TextPart::Literal(r) => r.begin,
            TextPart::Embedded(e) => e.range.begin,
        };
        let end = match parts.last().unwrap() {
            TextPart::Literal(r) => r.end,
            TextPart::Embedded(e) => e.range.end,
        };
        self.children.push(Node::Text(Text {
            range: Range::new(begin, end),
            parts,
        }));
    }

    // -------------------------------------------------------------------
    // Embedded code tags
    // -------------------------------------------------------------------

    fn scan_erb(&mut self) {
        let begin = self.pos;
        let indicator = match self.bytes.get(begin + 2) {
            Some(b'=') => Indicator::Expression,
            Some(b'#') => Indicator::Comment,
            Some(b'-') => Indicator::Trim,
            _ => Indicator::None,
        };
        let code_begin = begin + 2 + indicator.width();
        let rest = &self.bytes[code_begin.min(self.bytes.len())..];
        let (code_end, end) = match find(rest, b"%>") {
            Some(i) => {
                let close = code_begin + i;
                // A dash immediately before `%>` is a trim marker, not code.
                let trimmed = close > code_begin && self.bytes[close - 1] == b'-';
                (close - trimmed as usize, close + 2)
            }
            // Unterminated tag: the rest of the buffer is the code body.
            None => (self.bytes.len(), self.bytes.len()),
        };
        self.pos = end;

        let embedded = Embedded {
            range: Range::new(begin, end),
            indicator,
            code: Range::new(code_begin.min(code_end), code_end),
        };

        if indicator == Indicator::Comment && self.run_is_blank_so_far() {
            // A comment not glued to surrounding text stands on its own.
            self.flush_text();
            self.children.push(Node::Comment(Comment {
                range: embedded.range,
            }));
        } else {
            self.close_literal();
            self.parts.push(TextPart::Embedded(embedded));
        }
    }

    /// Whether the text run collected so far holds nothing but whitespace
    /// literals, i.e. the construct at `pos` is not glued to real text.
    fn run_is_blank_so_far(&self) -> bool {
        let literal_blank = |r: &Range| {
            self.bytes[r.begin..r.end]
                .iter()
                .all(|b| b.is_ascii_whitespace())
        };
        let pending = self
            .literal_begin
            .map(|b| literal_blank(&Range::new(b, self.pos)))
            .unwrap_or(true);
        pending
            && self.parts.iter().all(|p| match p {
                TextPart::Literal(r) => literal_blank(r),
                TextPart::Embedded(_) => false,
            })
    }

    // -------------------------------------------------------------------
    // HTML tags
    // -------------------------------------------------------------------

    fn scan_tag(&mut self, kind: TagKind) {
        let begin = self.pos;
        let name_begin = begin + 1 + matches!(kind, TagKind::Closing) as usize;
        let mut p = name_begin;
        while p < self.bytes.len() && is_name_byte(self.bytes[p]) {
            p += 1;
        }
        let name = String::from_utf8_lossy(&self.bytes[name_begin..p]).into_owned();

        let mut attributes = Vec::new();
        let mut kind = kind;
        loop {
            while p < self.bytes.len() && self.bytes[p].is_ascii_whitespace() {
                p += 1;
            }
            match self.bytes.get(p) {
                None => break,
                Some(b'>') => {
                    p += 1;
                    break;
                }
                Some(b'/') if self.bytes.get(p + 1) == Some(&b'>') => {
                    p += 2;
                    if matches!(kind, TagKind::Opening) {
                        kind = TagKind::SelfClosing;
                    }
                    break;
                }
                Some(_) => {
                    let chunk_begin = p;
                    p = self.scan_attribute_chunk(p);
                    if matches!(kind, TagKind::Opening | TagKind::SelfClosing) {
                        attributes.push(Attribute {
                            range: Range::new(chunk_begin, p),
                        });
                    }
                    if p == chunk_begin {
                        // Defensive against a stuck scan on garbage bytes.
                        p += 1;
                    }
                }
            }
        }

        self.flush_text();
        self.pos = p;
        self.children.push(Node::Tag(Tag {
            range: Range::new(begin, p),
            kind,
            name,
            attributes,
        }));
    }

    /// Consume one attribute chunk: bytes up to unquoted whitespace or the
    /// tag end. Quoted values and embedded tags are atomic, so spaces inside
    /// `class="a b"` or `<%= ... %>` do not split the chunk.
    fn scan_attribute_chunk(&self, mut p: usize) -> usize {
        while p < self.bytes.len() {
            match self.bytes[p] {
                b'"' | b'\'' => {
                    let quote = self.bytes[p];
                    p += 1;
                    while p < self.bytes.len() && self.bytes[p] != quote {
                        p += 1;
                    }
                    p = (p + 1).min(self.bytes.len());
                }
                b'<' if self.bytes.get(p + 1) == Some(&b'%') => {
                    let rest = &self.bytes[p..];
                    p += find(rest, b"%>").map(|i| i + 2).unwrap_or(rest.len());
                }
                b'>' => break,
                b'/' if self.bytes.get(p + 1) == Some(&b'>') => break,
                b if b.is_ascii_whitespace() => break,
                _ => p += 1,
            }
        }
        p
    }
}

enum Construct {
    Erb,
    OpeningTag,
    ClosingTag,
    HtmlComment,
    Doctype,
    Literal,
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b':'
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(text: &str) -> Document {
        parse(&ProcessedSource::new("test.erb", text))
    }

    fn tag_names(doc: &Document) -> Vec<(&str, TagKind)> {
        doc.children
            .iter()
            .filter_map(|n| match n {
                Node::Tag(t) => Some((t.name.as_str(), t.kind)),
                _ => None,
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Tags and attributes
    // ---------------------------------------------------------------------

    #[test]
    fn test_flat_tag_sequence() {
        let doc = parse_str("<div>\n  <span>bar</span>\n</div>\n");
        assert_eq!(
            tag_names(&doc),
            vec![
                ("div", TagKind::Opening),
                ("span", TagKind::Opening),
                ("span", TagKind::Closing),
                ("div", TagKind::Closing),
            ]
        );
    }

    #[test]
    fn test_attribute_ranges() {
        let text = "<a class=\"class1 class2\"\n  href=\"foo\">";
        let doc = parse_str(text);
        let Node::Tag(tag) = &doc.children[0] else {
            panic!("expected a tag, got {:?}", doc.children[0]);
        };
        assert_eq!(tag.attributes.len(), 2);
        assert_eq!(
            &text[tag.attributes[0].range.begin..tag.attributes[0].range.end],
            "class=\"class1 class2\""
        );
        assert_eq!(
            &text[tag.attributes[1].range.begin..tag.attributes[1].range.end],
            "href=\"foo\""
        );
    }

    #[test]
    fn test_self_closing_tag() {
        let doc = parse_str("<br/><input type=\"text\" />");
        let kinds = tag_names(&doc);
        assert_eq!(kinds[0], ("br", TagKind::SelfClosing));
        assert_eq!(kinds[1], ("input", TagKind::SelfClosing));
    }

    #[test]
    fn test_erb_inside_attribute_area() {
        let doc = parse_str("<div class=\"<%= classes %>\" <%= data %>>x</div>");
        let Node::Tag(tag) = &doc.children[0] else {
            panic!("expected tag");
        };
        assert_eq!(tag.attributes.len(), 2);
    }

    #[test]
    fn test_unterminated_tag_reaches_eof() {
        let doc = parse_str("<div class=\"x\"");
        let Node::Tag(tag) = &doc.children[0] else {
            panic!("expected tag");
        };
        assert_eq!(tag.range, Range::new(0, 14));
        assert_eq!(tag.attributes.len(), 1);
    }

    // ---------------------------------------------------------------------
    // Embedded tags, comments, text runs
    // ---------------------------------------------------------------------

    #[test]
    fn test_text_run_with_embedded() {
        let doc = parse_str("<div>\n  <%= hello %>\n</div>");
        let Node::Text(text) = &doc.children[1] else {
            panic!("expected text run, got {:?}", doc.children[1]);
        };
        assert_eq!(text.parts.len(), 3);
        assert!(matches!(text.parts[0], TextPart::Literal(_)));
        assert!(matches!(text.parts[1], TextPart::Embedded(_)));
        assert!(matches!(text.parts[2], TextPart::Literal(_)));
    }

    #[test]
    fn test_lone_embedded_between_tags() {
        let doc = parse_str("<div><%= x %></div>");
        assert!(matches!(doc.children[1], Node::Embedded(_)));
    }

    #[test]
    fn test_indicator_and_code_range() {
        let text = "<%= hello_world %>";
        let doc = parse_str(text);
        let Node::Embedded(erb) = &doc.children[0] else {
            panic!("expected embedded");
        };
        assert_eq!(erb.indicator, Indicator::Expression);
        assert_eq!(&text[erb.code.begin..erb.code.end], " hello_world ");
    }

    #[test]
    fn test_trim_markers() {
        let text = "<%- code -%>";
        let doc = parse_str(text);
        let Node::Embedded(erb) = &doc.children[0] else {
            panic!("expected embedded");
        };
        assert_eq!(erb.indicator, Indicator::Trim);
        assert_eq!(&text[erb.code.begin..erb.code.end], " code ");
    }

    #[test]
    fn test_standalone_comment_node() {
        let doc = parse_str("<div>\n  <%# note %>\n</div>");
        assert!(
            doc.children.iter().any(|n| matches!(n, Node::Comment(_))),
            "comment between tags must be a Comment node: {:?}",
            doc.children
        );
    }

    #[test]
    fn test_comment_glued_to_text_stays_in_run() {
        let doc = parse_str("<div>bar <%# note %>\n</div>");
        let glued = doc.children.iter().any(|n| match n {
            Node::Text(t) => t.parts.iter().any(|p| {
                matches!(
                    p,
                    TextPart::Embedded(Embedded {
                        indicator: Indicator::Comment,
                        ..
                    })
                )
            }),
            _ => false,
        });
        assert!(glued, "mid-line comment must stay inside the text run");
    }

    #[test]
    fn test_unterminated_erb_reaches_eof() {
        let text = "<%= truncated";
        let doc = parse_str(text);
        let Node::Embedded(erb) = &doc.children[0] else {
            panic!("expected embedded");
        };
        assert_eq!(erb.range, Range::new(0, text.len()));
        assert_eq!(&text[erb.code.begin..erb.code.end], " truncated");
    }

    #[test]
    fn test_html_comment_is_opaque_text() {
        let doc = parse_str("<!-- <div> --><span></span>");
        assert_eq!(tag_names(&doc), vec![
            ("span", TagKind::Opening),
            ("span", TagKind::Closing),
        ]);
        assert!(matches!(doc.children[0], Node::Text(_)));
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        let doc = parse_str("1 < 2 <div></div>");
        assert_eq!(tag_names(&doc).len(), 2);
    }
}

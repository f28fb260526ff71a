//! ERB syntax tree consumed by the transpiler.
//!
//! The tree is flat: opening and closing tags are separate sibling nodes and
//! nesting is recovered by the transpiler's tag stack. Every node carries a
//! half-open byte range into the original template. The tree owns its nodes;
//! nothing in it borrows the source buffer.

use lazy_static::lazy_static;
use rustc_hash::FxHashSet;

use crate::source::Range;

lazy_static! {
    /// HTML void elements: no closing tag, no children.
    static ref VOID_ELEMENTS: FxHashSet<&'static str> = [
        "area", "base", "br", "col", "command", "embed", "hr", "img", "input",
        "keygen", "link", "menuitem", "meta", "param", "source", "track", "wbr",
    ]
    .into_iter()
    .collect();
}

/// Whether `name` (any case) is an HTML void element.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(name.to_ascii_lowercase().as_str())
}

/// Root of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub range: Range,
    pub children: Vec<Node>,
}

/// A top-level node. Dispatch on the variant; there is no inheritance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Tag(Tag),
    Text(Text),
    Embedded(Embedded),
    Comment(Comment),
}

impl Node {
    pub fn range(&self) -> Range {
        match self {
            Node::Tag(t) => t.range,
            Node::Text(t) => t.range,
            Node::Embedded(e) => e.range,
            Node::Comment(c) => c.range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Opening,
    Closing,
    SelfClosing,
}

/// An HTML tag. `name` is stored as written; case-insensitive comparisons
/// are the consumer's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub range: Range,
    pub kind: TagKind,
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl Tag {
    pub fn is_void(&self) -> bool {
        is_void_element(&self.name)
    }

    pub fn name_eq(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }

    /// Byte range of the `<name` (or `</name`) prefix.
    pub fn prefix_range(&self) -> Range {
        let slash = matches!(self.kind, TagKind::Closing) as usize;
        Range::new(self.range.begin, self.range.begin + 1 + slash + self.name.len())
    }
}

/// One attribute, delimited as a single chunk: `name`, `name=value`,
/// `name="quoted value"` or an embedded tag used in attribute position.
/// Only the byte range matters to the transpiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub range: Range,
}

/// A run of template text: literal slices interleaved with embedded code
/// tags that sit inside the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub range: Range,
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPart {
    Literal(Range),
    Embedded(Embedded),
}

/// Indicator character of an embedded code tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// `<% ... %>`
    None,
    /// `<%= ... %>`
    Expression,
    /// `<%# ... %>`
    Comment,
    /// `<%- ... %>`
    Trim,
}

impl Indicator {
    /// Byte width of the indicator character (0 for plain `<%`).
    pub fn width(&self) -> usize {
        match self {
            Indicator::None => 0,
            _ => 1,
        }
    }
}

/// An embedded code tag `<%[indicator] code %>`.
///
/// `code` covers the body bytes including their leading and trailing
/// whitespace, excluding the delimiters, the indicator and a trailing trim
/// marker (`-%>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embedded {
    pub range: Range,
    pub indicator: Indicator,
    pub code: Range,
}

/// An ERB comment tag `<%# ... %>` standing on its own between tags.
/// Comments inside a text run are represented as [`Embedded`] nodes with the
/// [`Indicator::Comment`] indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub range: Range,
}

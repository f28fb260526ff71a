//! The intermediate representation bundle.
//!
//! An [`Ir`] ties together the original source, the transpiled text and the
//! source map, and offers the single forward operation the rest of the
//! pipeline needs: translating IR byte ranges back onto the template.

use std::sync::Arc;

use crate::ast::Document;
use crate::source::{ProcessedSource, Range};
use crate::source_map::SourceMap;
use crate::transpiler::IrTranspiler;

#[derive(Debug)]
pub struct Ir {
    source: Arc<ProcessedSource>,
    text: String,
    map: SourceMap,
}

impl Ir {
    /// Transpile `doc` against `source` into a fresh IR.
    pub fn new(source: Arc<ProcessedSource>, doc: &Document) -> Self {
        let (text, map) = IrTranspiler::new(&source).transpile(doc);
        Self { source, text, map }
    }

    pub fn source(&self) -> &ProcessedSource {
        &self.source
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn map(&self) -> &SourceMap {
        &self.map
    }

    /// A bare IR over `text` with an empty map, for exercising cops on
    /// hand-written IR fragments.
    #[cfg(test)]
    pub(crate) fn for_tests(text: &str) -> Self {
        Self {
            source: Arc::new(ProcessedSource::new("test.ir", text)),
            text: text.to_string(),
            map: SourceMap::new(),
        }
    }

    /// Translate an IR range to an original range.
    ///
    /// A successful translation always lands inside the original buffer; a
    /// violation means the map itself is corrupt.
    pub fn translate(&self, range: Range) -> Option<Range> {
        let translated = self.map.translate(range)?;
        debug_assert!(
            translated.end <= self.source.len(),
            "source map produced out-of-buffer range {translated} (len {})",
            self.source.len()
        );
        Some(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn build(text: &str) -> Ir {
        let source = Arc::new(ProcessedSource::new("test.erb", text));
        let doc = parser::parse(&source);
        Ir::new(source, &doc)
    }

    #[test]
    fn test_translate_whitespace_relatively() {
        let template = "<div>\n   <span>x</span>\n</div>\n";
        let ir = build(template);
        // The second line's indentation: IR "tagt() {\n   ..." holds the
        // three spaces at [9, 12), the template at [6, 9).
        let ir_indent = ir.text().find("\n   ").unwrap() + 1;
        assert_eq!(
            ir.translate(Range::new(ir_indent, ir_indent + 3)),
            Some(Range::new(6, 9))
        );
    }

    #[test]
    fn test_translate_unmapped_region() {
        let ir = build("<div></div>");
        let past_end = ir.text().len() + 10;
        assert_eq!(ir.translate(Range::new(past_end, past_end + 1)), None);
    }
}

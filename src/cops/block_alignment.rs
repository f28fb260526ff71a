//! Layout/BlockAlignment: block closers line up with their opener.
//!
//! The plain cop reports in IR coordinates. The adapter wraps it for the
//! team: same rule name, same findings, but messages quote the original
//! template's stripped lines and line/column, obtained by translating the
//! closer and opener spans through the IR's source map.

use crate::config::{AlignWith, LintConfig};
use crate::ir::Ir;
use crate::offense::Severity;
use crate::source::Range;

use super::structure::{BlockKind, Structure};
use super::{Cop, Correction, Diagnostic, EditAction};

/// One misaligned closer, before message formatting.
struct Mismatch {
    /// Token span of the closer's line.
    closer_span: Range,
    closer_line: usize,
    closer_col: usize,
    /// Token span from the statement's first line to the opener's line end.
    opener_span: Range,
    /// Line the opening statement starts on.
    stmt_line: usize,
    /// Column the correction moves the closer to.
    expected: usize,
}

fn find_mismatches(structure: &Structure, style: AlignWith) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    for block in &structure.blocks {
        if !matches!(block.kind, BlockKind::Brace | BlockKind::Do) || !block.is_multiline() {
            continue;
        }
        let Some(closer) = block.closer else {
            continue;
        };
        if !structure.is_line_first(&closer) {
            continue;
        }

        let start_of_block = structure.line_indent(block.opener.line);
        let start_of_line = block.stmt_indent;
        let aligned = match style {
            AlignWith::StartOfBlock => closer.col == start_of_block,
            AlignWith::StartOfLine => closer.col == start_of_line,
            AlignWith::Either => {
                closer.col == start_of_block || closer.col == start_of_line
            }
        };
        if aligned {
            continue;
        }

        let expected = match style {
            AlignWith::StartOfBlock => start_of_block,
            AlignWith::StartOfLine | AlignWith::Either => start_of_line,
        };
        let (Some(closer_span), Some(stmt_span), Some(opener_line_span)) = (
            structure.line_span(closer.line),
            structure.line_span(block.stmt_line),
            structure.line_span(block.opener.line),
        ) else {
            continue;
        };
        mismatches.push(Mismatch {
            closer_span,
            closer_line: closer.line,
            closer_col: closer.col,
            opener_span: Range::new(stmt_span.begin, opener_line_span.end),
            stmt_line: block.stmt_line,
            expected,
        });
    }

    mismatches
}

fn correction(structure: &Structure, m: &Mismatch) -> Correction {
    let line_start = structure.line_start(m.closer_line);
    Correction::single(EditAction::replace(
        Range::new(line_start, line_start + m.closer_col),
        " ".repeat(m.expected),
    ))
}

/// The un-adapted rule; messages carry IR coordinates.
#[derive(Default)]
pub struct BlockAlignment;

impl Cop for BlockAlignment {
    fn name(&self) -> &'static str {
        "Layout/BlockAlignment"
    }

    fn check(&self, ir: &Ir, structure: &Structure, config: &LintConfig) -> Vec<Diagnostic> {
        let ir_lines: Vec<&str> = ir.text().lines().collect();
        find_mismatches(structure, config.block_align_with)
            .into_iter()
            .map(|m| {
                let closer_text = ir_lines
                    .get(m.closer_line)
                    .map(|l| l.trim())
                    .unwrap_or_default();
                let opener_text = ir_lines
                    .get(m.stmt_line)
                    .map(|l| l.trim())
                    .unwrap_or_default();
                Diagnostic {
                    cop: self.name(),
                    severity: Severity::Convention,
                    range: m.closer_span,
                    message: format!(
                        "`{}` at {}, {} is not aligned with `{}` at {}, {}.",
                        closer_text,
                        m.closer_line + 1,
                        m.closer_col,
                        opener_text,
                        m.stmt_line + 1,
                        m.opener_span.begin - structure.line_start(m.stmt_line),
                    ),
                    correction: Some(correction(structure, &m)),
                }
            })
            .collect()
    }
}

/// The adapted rule used by the standard team. Identity (the rule name) is
/// preserved; only message formatting changes.
#[derive(Default)]
pub struct BlockAlignmentAdapter {
    inner: BlockAlignment,
}

impl BlockAlignmentAdapter {
    pub fn new() -> Self {
        Self {
            inner: BlockAlignment,
        }
    }
}

impl Cop for BlockAlignmentAdapter {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn check(&self, ir: &Ir, structure: &Structure, config: &LintConfig) -> Vec<Diagnostic> {
        find_mismatches(structure, config.block_align_with)
            .into_iter()
            .filter_map(|m| {
                // Both spans must land in the template; otherwise the
                // driver would drop the diagnostic anyway.
                let src_closer = ir.translate(m.closer_span)?;
                let src_opener = ir.translate(m.opener_span)?;
                let source = ir.source();
                let (closer_line, closer_col) = source.line_col(src_closer.begin);
                let (opener_line, opener_col) = source.line_col(src_opener.begin);
                Some(Diagnostic {
                    cop: self.name(),
                    severity: Severity::Convention,
                    range: m.closer_span,
                    message: format!(
                        "`{}` at {}, {} is not aligned with `{}` at {}, {}.",
                        source.stripped_line_at(src_closer.begin),
                        closer_line,
                        closer_col,
                        source.stripped_line_at(src_opener.begin),
                        opener_line,
                        opener_col,
                    ),
                    correction: Some(correction(structure, &m)),
                })
            })
            .collect()
    }
}

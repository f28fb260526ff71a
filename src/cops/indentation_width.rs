//! Layout/IndentationWidth: bodies indent one step from their block.

use crate::config::LintConfig;
use crate::ir::Ir;
use crate::offense::Severity;
use crate::source::Range;

use super::structure::{BlockKind, Structure};
use super::{Cop, Correction, Diagnostic, EditAction};

/// Checks that the first statement of every multi-line block body (and of
/// every clause segment) sits exactly one indentation step from the block's
/// baseline. For brace and do blocks the baseline is the closer's column
/// when the closer begins its own line, so a misaligned `end` is measured
/// against itself and reported separately by the alignment rules. Keyword
/// and begin blocks use the keyword column.
#[derive(Default)]
pub struct IndentationWidth;

impl Cop for IndentationWidth {
    fn name(&self) -> &'static str {
        "Layout/IndentationWidth"
    }

    fn check(&self, _ir: &Ir, structure: &Structure, config: &LintConfig) -> Vec<Diagnostic> {
        let width = config.width;
        let mut diagnostics = Vec::new();

        for block in &structure.blocks {
            if !block.is_multiline() {
                continue;
            }
            let baseline = match block.kind {
                BlockKind::Brace | BlockKind::Do => match block.closer {
                    Some(closer) if structure.is_line_first(&closer) => closer.col,
                    _ => continue,
                },
                BlockKind::Begin | BlockKind::Keyword(_) => block.opener.col,
            };
            let expected = baseline + width;

            for segment in &block.segments {
                let Some(first) = segment.first() else {
                    continue;
                };
                if first.line == block.opener.line || !structure.is_line_first(first) {
                    continue;
                }
                let actual = first.col;
                if actual == expected {
                    continue;
                }

                let line_start = structure.line_start(first.line);
                let base = baseline.min(actual);
                let range = Range::new(line_start + base, line_start + actual);
                let delta = actual as isize - baseline as isize;
                diagnostics.push(Diagnostic {
                    cop: self.name(),
                    severity: Severity::Convention,
                    range,
                    message: format!("Use {width} (not {delta}) spaces for indentation."),
                    correction: Some(Correction::single(EditAction::replace(
                        range,
                        " ".repeat(expected - base),
                    ))),
                });
            }
        }

        diagnostics
    }
}

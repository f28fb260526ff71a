//! Layout/IndentationConsistency: siblings share one indentation.

use crate::config::LintConfig;
use crate::ir::Ir;
use crate::offense::Severity;
use crate::source::Range;

use super::structure::Structure;
use super::{Cop, Correction, Diagnostic, EditAction};

/// Checks that every statement in a body segment is indented like the
/// segment's first statement. Whether that first statement itself sits at
/// the right depth is Layout/IndentationWidth's concern.
#[derive(Default)]
pub struct IndentationConsistency;

impl Cop for IndentationConsistency {
    fn name(&self) -> &'static str {
        "Layout/IndentationConsistency"
    }

    fn check(&self, _ir: &Ir, structure: &Structure, _config: &LintConfig) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for block in &structure.blocks {
            for segment in &block.segments {
                let mut reference: Option<usize> = None;
                for stmt in segment {
                    if stmt.line == block.opener.line || !structure.is_line_first(stmt) {
                        continue;
                    }
                    let Some(expected) = reference else {
                        reference = Some(stmt.col);
                        continue;
                    };
                    if stmt.col == expected {
                        continue;
                    }

                    let line_start = structure.line_start(stmt.line);
                    let base = expected.min(stmt.col);
                    let range = Range::new(line_start + base, line_start + stmt.col);
                    diagnostics.push(Diagnostic {
                        cop: self.name(),
                        severity: Severity::Convention,
                        range,
                        message: "Inconsistent indentation detected.".to_string(),
                        correction: Some(Correction::single(EditAction::replace(
                            range,
                            " ".repeat(expected - base),
                        ))),
                    });
                }
            }
        }

        diagnostics
    }
}

//! Layout/BeginEndAlignment: `end` of a begin block lines up.

use crate::config::{AlignWith, LintConfig};
use crate::ir::Ir;
use crate::offense::Severity;
use crate::source::Range;

use super::structure::{BlockKind, Structure};
use super::{Cop, Correction, Diagnostic, EditAction};

#[derive(Default)]
pub struct BeginEndAlignment;

impl Cop for BeginEndAlignment {
    fn name(&self) -> &'static str {
        "Layout/BeginEndAlignment"
    }

    fn check(&self, _ir: &Ir, structure: &Structure, config: &LintConfig) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for block in &structure.blocks {
            if block.kind != BlockKind::Begin || !block.is_multiline() {
                continue;
            }
            let Some(closer) = block.closer else {
                continue;
            };
            if !structure.is_line_first(&closer) {
                continue;
            }

            let keyword_col = block.opener.col;
            let line_col = block.stmt_indent;
            let aligned = match config.begin_end_align_with {
                AlignWith::StartOfBlock => closer.col == keyword_col,
                AlignWith::StartOfLine => closer.col == line_col,
                AlignWith::Either => closer.col == keyword_col || closer.col == line_col,
            };
            if aligned {
                continue;
            }
            let expected = match config.begin_end_align_with {
                AlignWith::StartOfBlock => keyword_col,
                AlignWith::StartOfLine | AlignWith::Either => line_col,
            };

            let line_start = structure.line_start(closer.line);
            diagnostics.push(Diagnostic {
                cop: self.name(),
                severity: Severity::Convention,
                range: closer.range,
                message: format!(
                    "`end` at {}, {} is not aligned with `begin` at {}, {}.",
                    closer.line + 1,
                    closer.col,
                    block.opener.line + 1,
                    block.opener.col,
                ),
                correction: Some(Correction::single(EditAction::replace(
                    Range::new(line_start, line_start + closer.col),
                    " ".repeat(expected),
                ))),
            });
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cops::test_support::check_ir;

    #[test]
    fn test_aligned_begin_end_is_clean() {
        let diags = check_ir::<BeginEndAlignment>("  begin\n    foo\n  end\n");
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn test_misaligned_end() {
        let diags = check_ir::<BeginEndAlignment>("  begin\n    foo\nend\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].message,
            "`end` at 3, 0 is not aligned with `begin` at 1, 2."
        );
        let action = &diags[0].correction.as_ref().unwrap().actions[0];
        assert_eq!(action.text, "  ");
    }

    #[test]
    fn test_do_blocks_are_not_this_cops_business() {
        let diags = check_ir::<BeginEndAlignment>("x.map do\n  y\n    end\n");
        assert!(diags.is_empty(), "{diags:?}");
    }
}

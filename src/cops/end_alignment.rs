//! Layout/EndAlignment: `end` of keyword constructs lines up.

use crate::config::{EndAlignWith, LintConfig};
use crate::ir::Ir;
use crate::offense::Severity;
use crate::source::Range;

use super::structure::{BlockKind, Keyword, Structure};
use super::{Cop, Correction, Diagnostic, EditAction};

/// Covers `if`/`unless`/`case`/`while`/`until`/`for`; do blocks belong to
/// Layout/BlockAlignment and begin blocks to Layout/BeginEndAlignment.
#[derive(Default)]
pub struct EndAlignment;

impl Cop for EndAlignment {
    fn name(&self) -> &'static str {
        "Layout/EndAlignment"
    }

    fn check(&self, _ir: &Ir, structure: &Structure, config: &LintConfig) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for block in &structure.blocks {
            let BlockKind::Keyword(keyword) = block.kind else {
                continue;
            };
            if !matches!(
                keyword,
                Keyword::If
                    | Keyword::Unless
                    | Keyword::Case
                    | Keyword::While
                    | Keyword::Until
                    | Keyword::For
            ) || !block.is_multiline()
            {
                continue;
            }
            let Some(closer) = block.closer else {
                continue;
            };
            if !structure.is_line_first(&closer) {
                continue;
            }

            let expected = match config.end_align_with {
                EndAlignWith::Keyword => block.opener.col,
                EndAlignWith::Variable | EndAlignWith::StartOfLine => block.stmt_indent,
            };
            if closer.col == expected {
                continue;
            }

            let line_start = structure.line_start(closer.line);
            diagnostics.push(Diagnostic {
                cop: self.name(),
                severity: Severity::Convention,
                range: closer.range,
                message: format!(
                    "`end` at {}, {} is not aligned with `{}` at {}, {}.",
                    closer.line + 1,
                    closer.col,
                    keyword.as_str(),
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
    use crate::config::LintConfig;
    use crate::cops::test_support::{check_ir, check_ir_with};

    #[test]
    fn test_aligned_if_end_is_clean() {
        let diags = check_ir::<EndAlignment>("  if x\n    a\n  end\n");
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn test_misaligned_if_end() {
        let diags = check_ir::<EndAlignment>("  if x\n    a\n      end\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].message,
            "`end` at 3, 6 is not aligned with `if` at 1, 2."
        );
    }

    #[test]
    fn test_case_end() {
        let diags = check_ir::<EndAlignment>("case x\nwhen 1\n  a\n  end\n");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_variable_style_aligns_with_statement_start() {
        // `end` aligned with the keyword, but the statement starts at the
        // line's first column.
        let ir = "x = if y\n      a\n    end\n";
        let config = LintConfig {
            end_align_with: EndAlignWith::Variable,
            ..LintConfig::default()
        };
        let diags = check_ir_with::<EndAlignment>(ir, &config);
        assert_eq!(diags.len(), 1);
        let action = &diags[0].correction.as_ref().unwrap().actions[0];
        assert_eq!(action.text, "");
    }
}

//! Layout/ElseAlignment: `else`/`elsif` line up with their opener.

use crate::config::LintConfig;
use crate::ir::Ir;
use crate::offense::Severity;
use crate::source::Range;

use super::structure::{BlockKind, Keyword, Structure, TokenKind};
use super::{Cop, Correction, Diagnostic, EditAction};

#[derive(Default)]
pub struct ElseAlignment;

impl Cop for ElseAlignment {
    fn name(&self) -> &'static str {
        "Layout/ElseAlignment"
    }

    fn check(&self, _ir: &Ir, structure: &Structure, _config: &LintConfig) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for block in &structure.blocks {
            let opener_name = match block.kind {
                BlockKind::Begin => "begin",
                BlockKind::Keyword(kw) => kw.as_str(),
                // Braces have no else; clauses inside do blocks (rescue,
                // ensure) are out of scope for this rule.
                BlockKind::Brace | BlockKind::Do => continue,
            };

            for clause in &block.clauses {
                let keyword = match clause.kind {
                    TokenKind::Keyword(kw @ (Keyword::Else | Keyword::Elsif)) => kw,
                    _ => continue,
                };
                if !structure.is_line_first(clause) || clause.col == block.opener.col {
                    continue;
                }

                let line_start = structure.line_start(clause.line);
                diagnostics.push(Diagnostic {
                    cop: self.name(),
                    severity: Severity::Convention,
                    range: clause.range,
                    message: format!("Align `{}` with `{}`.", keyword.as_str(), opener_name),
                    correction: Some(Correction::single(EditAction::replace(
                        Range::new(line_start, line_start + clause.col),
                        " ".repeat(block.opener.col),
                    ))),
                });
            }
        }

        diagnostics
    }
}

//! Layout/ArgumentAlignment: multi-line argument lists line up.
//!
//! In the IR, argument lists come from multi-line opening tags: each
//! attribute is a same-width token, so checking token columns checks the
//! template's attribute columns.

use crate::config::{ArgumentStyle, LintConfig};
use crate::ir::Ir;
use crate::offense::Severity;
use crate::source::Range;

use super::structure::Structure;
use super::{Cop, Correction, Diagnostic, EditAction};

const ALIGN_MSG: &str = "Align the arguments of a method call if they span more than one line.";
const FIXED_MSG: &str =
    "Use one level of indentation for arguments following the first line of a multi-line method call.";

#[derive(Default)]
pub struct ArgumentAlignment;

impl Cop for ArgumentAlignment {
    fn name(&self) -> &'static str {
        "Layout/ArgumentAlignment"
    }

    fn check(&self, _ir: &Ir, structure: &Structure, config: &LintConfig) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for args in &structure.arg_lists {
            if !args.is_multiline() {
                continue;
            }
            let Some(first) = args.args.first() else {
                continue;
            };
            let (expected, message) = match config.argument_alignment {
                ArgumentStyle::WithFirstArgument => (first.col, ALIGN_MSG),
                ArgumentStyle::WithFixedIndentation => {
                    (args.stmt_indent + config.width, FIXED_MSG)
                }
            };

            for arg in &args.args[1..] {
                if !structure.is_line_first(arg) || arg.col == expected {
                    continue;
                }
                let line_start = structure.line_start(arg.line);
                diagnostics.push(Diagnostic {
                    cop: self.name(),
                    severity: Severity::Convention,
                    range: arg.range,
                    message: message.to_string(),
                    correction: Some(Correction::single(EditAction::replace(
                        Range::new(line_start, line_start + arg.col),
                        " ".repeat(expected),
                    ))),
                });
            }
        }

        diagnostics
    }
}

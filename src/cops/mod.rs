//! The host code-style analyzer: a team of layout rules over the IR text.
//!
//! Cops see only the IR (a small block-structured language) and report
//! diagnostics in IR byte coordinates; translating them onto the template
//! is the driver's job. Each correctable diagnostic carries a list of edit
//! actions, also in IR coordinates.

mod argument_alignment;
mod begin_end_alignment;
mod block_alignment;
mod else_alignment;
mod end_alignment;
mod indentation_consistency;
mod indentation_width;
pub mod structure;

pub use argument_alignment::ArgumentAlignment;
pub use begin_end_alignment::BeginEndAlignment;
pub use block_alignment::{BlockAlignment, BlockAlignmentAdapter};
pub use else_alignment::ElseAlignment;
pub use end_alignment::EndAlignment;
pub use indentation_consistency::IndentationConsistency;
pub use indentation_width::IndentationWidth;

use crate::config::LintConfig;
use crate::ir::Ir;
use crate::offense::Severity;
use crate::source::Range;
use structure::Structure;

/// A single edit action against a buffer, in the coordinates of the buffer
/// it was produced for (IR coordinates when emitted by a cop).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditAction {
    pub kind: EditKind,
    pub range: Range,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Remove,
    InsertBefore,
    InsertAfter,
    Replace,
}

impl EditAction {
    pub fn remove(range: Range) -> Self {
        Self {
            kind: EditKind::Remove,
            range,
            text: String::new(),
        }
    }

    pub fn insert_before(range: Range, text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::InsertBefore,
            range,
            text: text.into(),
        }
    }

    pub fn insert_after(range: Range, text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::InsertAfter,
            range,
            text: text.into(),
        }
    }

    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Replace,
            range,
            text: text.into(),
        }
    }
}

/// A correction: the flat action list for one diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub actions: Vec<EditAction>,
}

impl Correction {
    pub fn single(action: EditAction) -> Self {
        Self {
            actions: vec![action],
        }
    }
}

/// One finding of one cop, in IR coordinates.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Rule name, e.g. `"Layout/IndentationWidth"`.
    pub cop: &'static str,
    pub severity: Severity,
    /// IR byte range of the offense.
    pub range: Range,
    pub message: String,
    pub correction: Option<Correction>,
}

/// A layout rule.
pub trait Cop: Send + Sync {
    /// The rule name as it appears in messages.
    fn name(&self) -> &'static str;

    /// Inspect the IR and report findings in IR coordinates. The token and
    /// block structure is computed once per run and shared by the team.
    fn check(&self, ir: &Ir, structure: &Structure, config: &LintConfig) -> Vec<Diagnostic>;
}

/// The ordered team of rules making up the analyzer.
pub struct Team {
    cops: Vec<Box<dyn Cop>>,
}

impl Team {
    /// The standard team: indentation width, indentation consistency,
    /// block alignment (adapted to template coordinates), begin/end
    /// alignment, end alignment, else alignment, argument alignment.
    pub fn standard() -> Self {
        Self {
            cops: vec![
                Box::new(IndentationWidth),
                Box::new(IndentationConsistency),
                Box::new(BlockAlignmentAdapter::new()),
                Box::new(BeginEndAlignment),
                Box::new(EndAlignment),
                Box::new(ElseAlignment),
                Box::new(ArgumentAlignment),
            ],
        }
    }

    /// Run every cop in team order. Within a cop, diagnostics are sorted
    /// by position; across cops the team order is preserved, which is the
    /// order offenses are reported in.
    pub fn inspect(&self, ir: &Ir, config: &LintConfig) -> Vec<Diagnostic> {
        let structure = Structure::analyze(ir.text());
        let mut diagnostics = Vec::new();
        for cop in &self.cops {
            let mut found = cop.check(ir, &structure, config);
            found.sort_by_key(|d| (d.range.begin, d.range.end));
            diagnostics.extend(found);
        }
        diagnostics
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) fn check_ir<C: Cop + Default>(ir_text: &str) -> Vec<Diagnostic> {
        check_ir_with::<C>(ir_text, &LintConfig::default())
    }

    pub(crate) fn check_ir_with<C: Cop + Default>(
        ir_text: &str,
        config: &LintConfig,
    ) -> Vec<Diagnostic> {
        let ir = Ir::for_tests(ir_text);
        let structure = Structure::analyze(ir.text());
        C::default().check(&ir, &structure, config)
    }
}

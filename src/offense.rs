//! Offenses reported against the original template.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::cops::Correction;
use crate::ir::Ir;
use crate::source::Range;

/// Severity of an offense, ordered least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Convention,
    Warning,
    Refactor,
    Error,
    Fatal,
}

impl Severity {
    /// One-letter code used by the text output format.
    pub fn code(&self) -> char {
        match self {
            Severity::Convention => 'C',
            Severity::Warning => 'W',
            Severity::Refactor => 'R',
            Severity::Error => 'E',
            Severity::Fatal => 'F',
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Convention => "convention",
            Severity::Warning => "warning",
            Severity::Refactor => "refactor",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// Everything needed to auto-correct one offense: the rule's edit actions
/// (in IR coordinates) and a shared handle to the IR that translates them.
#[derive(Debug, Clone)]
pub struct CorrectionContext {
    pub correction: Correction,
    pub ir: Arc<Ir>,
}

/// A style violation located in the original template.
#[derive(Debug, Clone, Serialize)]
pub struct Offense {
    /// Byte range in the original source.
    pub location: Range,
    /// Full message, prefixed with the rule name.
    pub message: String,
    pub severity: Severity,
    /// Present iff the offense is auto-correctable.
    #[serde(skip)]
    pub context: Option<CorrectionContext>,
}

impl Offense {
    pub fn correctable(&self) -> bool {
        self.context.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_display_and_order() {
        assert_eq!(Severity::Convention.to_string(), "convention");
        assert_eq!(Severity::Fatal.to_string(), "fatal");
        assert!(Severity::Convention < Severity::Warning);
        assert!(Severity::Error < Severity::Fatal);
        assert_eq!(Severity::Convention.code(), 'C');
    }
}

//! The linter driver: transpile, analyze, translate, correct.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::ast::Document;
use crate::config::LintConfig;
use crate::cops::Team;
use crate::corrector::Corrector;
use crate::error::ConfigError;
use crate::ir::Ir;
use crate::offense::{CorrectionContext, Offense};
use crate::parser;
use crate::source::{ProcessedSource, Range};

/// Upper bound on correction passes. Indentation fixes can shift the
/// baseline other fixes are measured against, so correction iterates until
/// a pass changes nothing; real templates converge in two or three passes.
const MAX_CORRECTION_PASSES: usize = 10;

/// A configured linter. One instance may serve many templates; each run is
/// a pure function of (source, config).
pub struct Linter {
    config: LintConfig,
    team: Team,
}

impl Linter {
    /// Build a linter, rejecting an invalid configuration up front.
    pub fn new(config: LintConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            team: Team::standard(),
        })
    }

    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    /// Lint an already-parsed template.
    pub fn run(&self, source: Arc<ProcessedSource>, doc: &Document) -> Vec<Offense> {
        let ir = Arc::new(Ir::new(source, doc));
        let diagnostics = self.team.inspect(&ir, &self.config);
        debug!(count = diagnostics.len(), "analyzer diagnostics collected");

        let mut offenses = Vec::new();
        for diagnostic in diagnostics {
            let location = match ir.translate(diagnostic.range) {
                Some(range) => range,
                None => match ir.map().translate_beginning(diagnostic.range.begin) {
                    Some(begin) => Range::empty(begin),
                    None => {
                        debug!(
                            cop = diagnostic.cop,
                            range = %diagnostic.range,
                            "dropping untranslatable diagnostic"
                        );
                        continue;
                    }
                },
            };
            offenses.push(Offense {
                location,
                message: format!("{}: {}", diagnostic.cop, diagnostic.message.trim()),
                severity: diagnostic.severity,
                context: diagnostic.correction.map(|correction| CorrectionContext {
                    correction,
                    ir: Arc::clone(&ir),
                }),
            });
        }
        offenses
    }

    /// Parse and lint a template.
    pub fn run_template(&self, name: &str, template: &str) -> Vec<Offense> {
        let source = Arc::new(ProcessedSource::new(name, template));
        let doc = parser::parse(&source);
        self.run(source, &doc)
    }

    /// Apply one round of corrections to `template`, translating each edit
    /// action through the offense's IR. Actions that do not translate are
    /// dropped individually; the rest of the correction still applies.
    pub fn apply_corrections(&self, template: &str, offenses: &[Offense]) -> String {
        let mut corrector = Corrector::new(template);
        for offense in offenses {
            let Some(context) = &offense.context else {
                continue;
            };
            for action in &context.correction.actions {
                match context.ir.translate(action.range) {
                    Some(range) => corrector.push(&crate::cops::EditAction {
                        kind: action.kind,
                        range,
                        text: action.text.clone(),
                    }),
                    None => {
                        warn!(range = %action.range, "dropping untranslatable correction action");
                    }
                }
            }
        }
        corrector.rewrite()
    }

    /// Auto-correct a template to a fixed point.
    pub fn autocorrect(&self, name: &str, template: &str) -> String {
        let mut current = template.to_string();
        for pass in 0..MAX_CORRECTION_PASSES {
            let offenses = self.run_template(name, &current);
            if !offenses.iter().any(Offense::correctable) {
                debug!(passes = pass, "auto-correct converged");
                break;
            }
            let corrected = self.apply_corrections(&current, &offenses);
            if corrected == current {
                debug!(passes = pass + 1, "auto-correct made no further progress");
                break;
            }
            current = corrected;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linter() -> Linter {
        Linter::new(LintConfig::default()).expect("default config is valid")
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = LintConfig {
            width: 0,
            ..LintConfig::default()
        };
        assert!(Linter::new(config).is_err());
    }

    #[test]
    fn test_clean_template_has_no_offenses() {
        let offenses = linter().run_template("t.erb", "<div>\n  <span>x</span>\n</div>\n");
        assert!(offenses.is_empty(), "{offenses:?}");
    }

    #[test]
    fn test_offense_message_carries_rule_name() {
        let offenses = linter().run_template("t.erb", "<div>\n   <span>x</span>\n</div>\n");
        assert_eq!(offenses.len(), 1);
        assert!(
            offenses[0]
                .message
                .starts_with("Layout/IndentationWidth: "),
            "{}",
            offenses[0].message
        );
        assert!(offenses[0].correctable());
    }

    #[test]
    fn test_offense_locations_inside_buffer() {
        let template = "<div>\n    <% 3.times do %>\n  <%= 1 %>\n      <% end %>\n</div>\n";
        for offense in linter().run_template("t.erb", template) {
            assert!(offense.location.end <= template.len(), "{offense:?}");
            assert!(offense.location.begin <= offense.location.end);
        }
    }

    #[test]
    fn test_autocorrect_clean_template_unchanged() {
        let template = "<div>\n  <span>x</span>\n</div>\n";
        assert_eq!(linter().autocorrect("t.erb", template), template);
    }

    #[test]
    fn test_autocorrect_fixes_indentation() {
        let corrected = linter().autocorrect("t.erb", "<div>\n     <span>x</span>\n</div>\n");
        assert_eq!(corrected, "<div>\n  <span>x</span>\n</div>\n");
    }
}

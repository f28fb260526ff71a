//! Indentation checking and auto-correction for ERB templates.
//!
//! The engine transpiles an ERB parse tree into a block-structured
//! intermediate program whose whitespace mirrors the template, runs a team
//! of layout rules over that IR, and maps every diagnostic and edit back
//! onto the original template through a bidirectional source map.
//!
//! ```
//! use erb_tidy::{LintConfig, Linter};
//!
//! let linter = Linter::new(LintConfig::default()).unwrap();
//! let offenses = linter.run_template("t.erb", "<div>\n   <span>x</span>\n</div>\n");
//! assert_eq!(offenses.len(), 1);
//! let fixed = linter.autocorrect("t.erb", "<div>\n   <span>x</span>\n</div>\n");
//! assert_eq!(fixed, "<div>\n  <span>x</span>\n</div>\n");
//! ```

pub mod ast;
pub mod config;
pub mod cops;
pub mod corrector;
pub mod error;
pub mod ir;
pub mod linter;
pub mod offense;
pub mod output;
pub mod parser;
pub mod source;
pub mod source_map;
pub mod transpiler;

pub use config::{AlignWith, ArgumentStyle, EndAlignWith, LintConfig};
pub use error::{ConfigError, ConfigFieldError};
pub use ir::Ir;
pub use linter::Linter;
pub use offense::{Offense, Severity};
pub use output::{format_offense, format_offenses, to_json};
pub use parser::parse;
pub use source::{ProcessedSource, Range};
pub use source_map::SourceMap;
pub use transpiler::IrTranspiler;

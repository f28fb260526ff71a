//! Linter configuration.
//!
//! A [`LintConfig`] maps one-to-one onto the host rules' options: the
//! indentation step feeds the indentation-width rule, and each enforced
//! style feeds the rule of the same name. Configurations are validated
//! before a run starts; every offending field is reported at once.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigFieldError};

/// Alignment target for block and begin/end closers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignWith {
    /// Align with the line that contains the block opener.
    StartOfBlock,
    /// Align with the line where the statement begins.
    StartOfLine,
    /// Accept either alignment.
    Either,
}

impl AlignWith {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start_of_block" => Some(AlignWith::StartOfBlock),
            "start_of_line" => Some(AlignWith::StartOfLine),
            "either" => Some(AlignWith::Either),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlignWith::StartOfBlock => "start_of_block",
            AlignWith::StartOfLine => "start_of_line",
            AlignWith::Either => "either",
        }
    }
}

impl fmt::Display for AlignWith {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alignment target for `end` of keyword constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndAlignWith {
    Keyword,
    Variable,
    StartOfLine,
}

impl EndAlignWith {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "keyword" => Some(EndAlignWith::Keyword),
            "variable" => Some(EndAlignWith::Variable),
            "start_of_line" => Some(EndAlignWith::StartOfLine),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EndAlignWith::Keyword => "keyword",
            EndAlignWith::Variable => "variable",
            EndAlignWith::StartOfLine => "start_of_line",
        }
    }
}

impl fmt::Display for EndAlignWith {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Style for arguments of multi-line calls (multi-line tag attributes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentStyle {
    WithFirstArgument,
    WithFixedIndentation,
}

impl ArgumentStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "with_first_argument" => Some(ArgumentStyle::WithFirstArgument),
            "with_fixed_indentation" => Some(ArgumentStyle::WithFixedIndentation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArgumentStyle::WithFirstArgument => "with_first_argument",
            ArgumentStyle::WithFixedIndentation => "with_fixed_indentation",
        }
    }
}

impl fmt::Display for ArgumentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one linter instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Indentation step in spaces. Must be >= 1.
    pub width: usize,
    /// Layout/BlockAlignment EnforcedStyleAlignWith.
    pub block_align_with: AlignWith,
    /// Layout/BeginEndAlignment EnforcedStyleAlignWith.
    pub begin_end_align_with: AlignWith,
    /// Layout/EndAlignment EnforcedStyleAlignWith.
    pub end_align_with: EndAlignWith,
    /// Layout/ArgumentAlignment EnforcedStyle.
    pub argument_alignment: ArgumentStyle,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            width: 2,
            block_align_with: AlignWith::Either,
            begin_end_align_with: AlignWith::StartOfLine,
            end_align_with: EndAlignWith::Keyword,
            argument_alignment: ArgumentStyle::WithFirstArgument,
        }
    }
}

impl LintConfig {
    /// Build a configuration from raw option strings, collecting every
    /// invalid field instead of stopping at the first.
    pub fn from_options(
        width: usize,
        block_align_with: &str,
        begin_end_align_with: &str,
        end_align_with: &str,
        argument_alignment: &str,
    ) -> Result<Self, ConfigError> {
        let mut fields = Vec::new();

        if width < 1 {
            fields.push(ConfigFieldError {
                field: "width",
                value: width.to_string(),
                expected: "an integer >= 1",
            });
        }
        let block = AlignWith::parse(block_align_with).unwrap_or_else(|| {
            fields.push(ConfigFieldError {
                field: "enforced_style_block_align_with",
                value: block_align_with.to_string(),
                expected: "one of: start_of_block, start_of_line, either",
            });
            AlignWith::Either
        });
        let begin_end = AlignWith::parse(begin_end_align_with).unwrap_or_else(|| {
            fields.push(ConfigFieldError {
                field: "enforced_style_begin_end_align_with",
                value: begin_end_align_with.to_string(),
                expected: "one of: start_of_block, start_of_line, either",
            });
            AlignWith::StartOfLine
        });
        let end = EndAlignWith::parse(end_align_with).unwrap_or_else(|| {
            fields.push(ConfigFieldError {
                field: "enforced_style_end_align_with",
                value: end_align_with.to_string(),
                expected: "one of: keyword, variable, start_of_line",
            });
            EndAlignWith::Keyword
        });
        let argument = ArgumentStyle::parse(argument_alignment).unwrap_or_else(|| {
            fields.push(ConfigFieldError {
                field: "enforced_style_argument_alignment",
                value: argument_alignment.to_string(),
                expected: "one of: with_first_argument, with_fixed_indentation",
            });
            ArgumentStyle::WithFirstArgument
        });

        if !fields.is_empty() {
            return Err(ConfigError::InvalidFields(fields));
        }
        Ok(Self {
            width,
            block_align_with: block,
            begin_end_align_with: begin_end,
            end_align_with: end,
            argument_alignment: argument,
        })
    }

    /// Validate an already-typed configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 1 {
            return Err(ConfigError::InvalidFields(vec![ConfigFieldError {
                field: "width",
                value: self.width.to_string(),
                expected: "an integer >= 1",
            }]));
        }
        Ok(())
    }
}

//! Error types for the ERB indentation engine.

use std::fmt;

use thiserror::Error;

/// A single rejected configuration field.
///
/// Collected (not short-circuited) so that a caller sees every offending
/// field of a bad configuration at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFieldError {
    /// Name of the configuration field, e.g. `"width"`.
    pub field: &'static str,
    /// The value that was rejected, as given.
    pub value: String,
    /// What the field accepts.
    pub expected: &'static str,
}

impl fmt::Display for ConfigFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: got `{}`, expected {}",
            self.field, self.value, self.expected
        )
    }
}

/// Errors raised when a [`LintConfig`](crate::config::LintConfig) is
/// constructed or validated.
///
/// Configuration problems are rejected before any template is processed;
/// a run is never started with a bad configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {}", summarize_fields(.0))]
    InvalidFields(Vec<ConfigFieldError>),
}

impl ConfigError {
    /// The rejected fields, in declaration order.
    pub fn fields(&self) -> &[ConfigFieldError] {
        match self {
            ConfigError::InvalidFields(fields) => fields,
        }
    }
}

fn summarize_fields(fields: &[ConfigFieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ConfigError>;

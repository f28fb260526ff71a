//! Offense rendering.
//!
//! Two formats: a compact human-readable line per offense, and JSON for
//! machine consumers. Color and terminal handling belong to callers.

use serde::Serialize;

use crate::offense::Offense;
use crate::source::ProcessedSource;

/// `name:line:col: C message`, the conventional one-line form.
pub fn format_offense(source: &ProcessedSource, offense: &Offense) -> String {
    let (line, col) = source.line_col(offense.location.begin);
    format!(
        "{}:{}:{}: {} {}",
        source.name(),
        line,
        col + 1,
        offense.severity.code(),
        offense.message
    )
}

/// All offenses, one per line.
pub fn format_offenses(source: &ProcessedSource, offenses: &[Offense]) -> String {
    offenses
        .iter()
        .map(|offense| format_offense(source, offense))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct JsonOffense<'a> {
    file: &'a str,
    line: usize,
    column: usize,
    begin: usize,
    end: usize,
    severity: String,
    message: &'a str,
    correctable: bool,
}

/// Offenses as a JSON array.
pub fn to_json(source: &ProcessedSource, offenses: &[Offense]) -> serde_json::Result<String> {
    let rows: Vec<JsonOffense<'_>> = offenses
        .iter()
        .map(|offense| {
            let (line, column) = source.line_col(offense.location.begin);
            JsonOffense {
                file: source.name(),
                line,
                column,
                begin: offense.location.begin,
                end: offense.location.end,
                severity: offense.severity.to_string(),
                message: &offense.message,
                correctable: offense.correctable(),
            }
        })
        .collect();
    serde_json::to_string_pretty(&rows)
}

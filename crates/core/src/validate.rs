//! Document diagnostics for the editor's validation panel.

use crate::codec::{heading_depth, AttributeMap};
use crate::config::EngineConfig;
use crate::grid::{collect_ratio_errors, parse_column_ratio};
use crate::types::RatioError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-fatal problem found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Malformed `{ratio:alignment}` annotation.
    Ratio(RatioError),
    /// Heading title longer than the configured maximum.
    HeadingTooLong {
        line_number: usize,
        length: usize,
        max: usize,
    },
}

impl Diagnostic {
    /// 1-based document line the diagnostic refers to.
    pub fn line_number(&self) -> usize {
        match self {
            Self::Ratio(error) => error.line_number,
            Self::HeadingTooLong { line_number, .. } => *line_number,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ratio(error) => write!(f, "{error}"),
            Self::HeadingTooLong {
                line_number,
                length,
                max,
            } => write!(
                f,
                "line {line_number}: heading is {length} characters long (max {max})"
            ),
        }
    }
}

/// Collect every diagnostic for `content`, ordered by line.
///
/// Lines assigned an attribute through `map` are checked as if their text
/// spelled it out.
pub fn validate_document(
    content: &str,
    config: &EngineConfig,
    map: Option<&AttributeMap>,
) -> Vec<Diagnostic> {
    let codec = config.codec();
    let described = content
        .split('\n')
        .enumerate()
        .map(|(index, line)| codec.describe(line, map.and_then(|m| m.get(index))))
        .collect::<Vec<_>>();

    let mut diagnostics: Vec<Diagnostic> = collect_ratio_errors(&described.join("\n"), 0)
        .into_iter()
        .map(Diagnostic::Ratio)
        .collect();

    for (index, line) in described.iter().enumerate() {
        if heading_depth(line).is_none() {
            continue;
        }
        let length = parse_column_ratio(line).title.chars().count();
        if length > config.max_heading_chars {
            diagnostics.push(Diagnostic::HeadingTooLong {
                line_number: index + 1,
                length,
                max: config.max_heading_chars,
            });
        }
    }

    diagnostics.sort_by_key(Diagnostic::line_number);
    diagnostics
}

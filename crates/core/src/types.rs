//! Domain types shared by the engine's components.

use crate::attribute::Attribute;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, stable identifier of an editor line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(Uuid);

impl LineId {
    /// Allocate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One line of the editor's structured model.
///
/// `text` never contains the attribute prefix. Leading indentation is part of
/// `text` and preserved verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorLine {
    pub id: LineId,
    pub attribute: Option<Attribute>,
    pub text: String,
}

impl EditorLine {
    /// Create a line with a fresh identifier.
    pub fn new(attribute: Option<Attribute>, text: impl Into<String>) -> Self {
        Self {
            id: LineId::new(),
            attribute,
            text: text.into(),
        }
    }

    /// Render the line back to raw text, prefix included.
    pub fn to_raw(&self) -> String {
        match self.attribute {
            Some(attribute) => prefixed(attribute, &self.text),
            None => self.text.clone(),
        }
    }
}

/// Render `{indent}{token} {rest}` for an attributed line's text, dropping
/// the separator when there is no rest.
pub(crate) fn prefixed(attribute: Attribute, text: &str) -> String {
    let rest = text.trim_start_matches([' ', '\t']);
    let indent = &text[..text.len() - rest.len()];
    if rest.is_empty() {
        format!("{indent}{attribute}")
    } else {
        format!("{indent}{attribute} {rest}")
    }
}

/// The role a slide plays in the deck, inferred from its leading heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutVariant {
    Cover,
    Toc,
    Section,
    Summary,
    Normal,
}

impl LayoutVariant {
    /// Lowercase name, as used by the renderer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Toc => "toc",
            Self::Section => "section",
            Self::Summary => "summary",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for LayoutVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A slide cut from the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// 0-based position in the deck.
    pub index: usize,

    /// 0-based document line where the slide starts.
    pub start_line: usize,

    /// Self-describing slide text (map-only attributes re-injected).
    pub content: String,

    pub layout: LayoutVariant,
}

/// Vertical alignment of a grid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Top,
    Mid,
    Btm,
}

impl Alignment {
    /// Parse one of the annotation keywords `top`, `mid`, `btm`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "top" => Some(Self::Top),
            "mid" => Some(Self::Mid),
            "btm" => Some(Self::Btm),
            _ => None,
        }
    }

    /// The annotation keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Mid => "mid",
            Self::Btm => "btm",
        }
    }

    /// CSS `align-self` value for a grid item.
    pub fn css_align_self(&self) -> &'static str {
        match self {
            Self::Top => "start",
            Self::Mid => "center",
            Self::Btm => "end",
        }
    }
}

/// Column layout parsed from one heading's `{ratio:alignment}` annotation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Relative width; `None` means an equal share of 1.
    pub ratio: Option<f64>,
    pub alignment: Alignment,
    /// Heading text without prefix or annotation.
    pub title: String,
}

impl ColumnSpec {
    /// The ratio as consumed by the grid, defaulting to 1.
    pub fn effective_ratio(&self) -> f64 {
        self.ratio.unwrap_or(1.0)
    }
}

/// A malformed grid annotation. Reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioError {
    /// The offending token as written.
    pub raw_value: String,
    /// 1-based line number.
    pub line_number: usize,
    pub message: String,
}

impl fmt::Display for RatioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line_number, self.message)
    }
}

/// A heading collected for the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading level (1 for `#`).
    pub level: u8,
    pub title: String,
    /// 0-based document line of the heading.
    pub line: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_line_to_raw_keeps_indent() {
        let line = EditorLine::new(Some(Attribute::Dash), "\titem");
        assert_eq!(line.to_raw(), "\t- item");

        let plain = EditorLine::new(None, "  just text");
        assert_eq!(plain.to_raw(), "  just text");
    }

    #[test]
    fn test_empty_text_has_no_trailing_separator() {
        assert_eq!(EditorLine::new(Some(Attribute::Heading2), "").to_raw(), "##");
        assert_eq!(EditorLine::new(Some(Attribute::Dash), "\t").to_raw(), "\t-");
    }

    #[test]
    fn test_line_ids_are_unique() {
        assert_ne!(LineId::new(), LineId::new());
    }

    #[test]
    fn test_alignment_keywords() {
        assert_eq!(Alignment::from_keyword("mid"), Some(Alignment::Mid));
        assert_eq!(Alignment::from_keyword("middle"), None);
        assert_eq!(Alignment::Btm.css_align_self(), "end");
        assert_eq!(Alignment::default(), Alignment::Top);
    }

    #[test]
    fn test_layout_serializes_lowercase() {
        let json = serde_json::to_string(&LayoutVariant::Toc).unwrap();
        assert_eq!(json, "\"toc\"");
    }

    #[test]
    fn test_column_spec_default_ratio() {
        assert_eq!(ColumnSpec::default().effective_ratio(), 1.0);
    }
}

//! Slide layout classification.

use crate::attribute::Attribute;
use crate::codec::parse_line;
use crate::types::LayoutVariant;

/// Classify a slide by its first non-blank line.
///
/// Only that line matters: `#ttl` is a cover, `#agd` a table of contents,
/// `#!` a summary and a bare `#` heading a section divider. Prefixes are read
/// the way the codec reads them, glued forms included. Anything else,
/// including an empty slide, is a normal slide.
pub fn extract_slide_layout(slide_content: &str) -> LayoutVariant {
    let Some(first) = slide_content.lines().find(|line| !line.trim().is_empty()) else {
        return LayoutVariant::Normal;
    };

    match parse_line(first).attribute {
        Some(Attribute::Title) => LayoutVariant::Cover,
        Some(Attribute::Agenda) => LayoutVariant::Toc,
        Some(Attribute::Summary) => LayoutVariant::Summary,
        Some(Attribute::Heading1) => LayoutVariant::Section,
        _ => LayoutVariant::Normal,
    }
}

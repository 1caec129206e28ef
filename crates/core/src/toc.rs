//! Table of contents generation for agenda slides.

use crate::codec::{AttributeCodec, AttributeMap};
use crate::grid::parse_column_ratio;
use crate::types::Section;

fn is_fence(line: &str) -> bool {
    let body = line.trim_start();
    body.starts_with("```") || body.starts_with("~~~")
}

/// Collect the section headings of a whole document, up to `max_level`.
///
/// Layout headings (cover, agenda, summary) are not sections. Headings inside
/// fenced code blocks and headings with an empty title are skipped.
pub fn extract_section_headings(
    document: &str,
    max_level: u8,
    map: Option<&AttributeMap>,
) -> Vec<Section> {
    let codec = AttributeCodec::new();
    let mut sections = Vec::new();
    let mut in_fence = false;

    for (index, line) in document.split('\n').enumerate() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        let attribute = codec.resolve(line, index, map);
        if attribute.is_some_and(|a| a.is_layout_heading()) {
            continue;
        }
        let level = match attribute {
            Some(attribute) => attribute.heading_level(),
            None => codec.heading_depth(line),
        };
        let Some(level) = level.filter(|&level| level <= max_level) else {
            continue;
        };

        // A map-assigned heading replaces whatever prefix the text carries.
        let heading = codec.describe(line, attribute);
        let title = parse_column_ratio(&heading).title;
        if title.is_empty() {
            continue;
        }
        sections.push(Section {
            level,
            title,
            line: index,
        });
    }

    log::debug!("Collected {} TOC sections", sections.len());
    sections
}

/// Render sections as a nested Markdown list, indenting two spaces per level
/// below the shallowest section.
pub fn generate_table_of_contents(sections: &[Section]) -> String {
    let Some(base) = sections.iter().map(|section| section.level).min() else {
        return String::new();
    };

    sections
        .iter()
        .map(|section| {
            let indent = "  ".repeat(usize::from(section.level - base));
            format!("{indent}- {}", section.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

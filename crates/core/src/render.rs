//! Deck building and per-slide markup rendering.
//!
//! [`SlideDeck`] runs the whole engine over one document: segmentation,
//! layout classification, table of contents, grid wrapping, annotation
//! stripping and chart height injection. The output is Markdown with embedded
//! HTML, ready for the downstream renderer.

use crate::attribute::Attribute;
use crate::codec::{AttributeCodec, AttributeMap};
use crate::config::EngineConfig;
use crate::grid::{
    collect_ratio_errors, split_content_by_h2, strip_column_ratios, wrap_consecutive_h3_in_grid,
    wrap_h2_sections_in_grid,
};
use crate::layout::extract_slide_layout;
use crate::markers::{is_image_line, KEY_MESSAGE_OPEN};
use crate::segment::{SlideBoundaries, SlideSegmenter};
use crate::toc::{extract_section_headings, generate_table_of_contents};
use crate::types::{prefixed, LayoutVariant, RatioError, Section, Slide};
use serde::{Deserialize, Serialize};

/// Annotated markup for one slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedSlide {
    pub index: usize,
    pub layout: LayoutVariant,
    pub markup: String,
    /// Malformed annotations on this slide, with document line numbers.
    pub ratio_errors: Vec<RatioError>,
}

/// A document cut into classified slides.
#[derive(Debug, Clone)]
pub struct SlideDeck {
    config: EngineConfig,
    slides: Vec<Slide>,
    sections: Vec<Section>,
}

impl SlideDeck {
    /// Segment and classify `content`.
    pub fn build(content: &str, config: &EngineConfig, map: Option<&AttributeMap>) -> Self {
        let codec = config.codec();
        let segmenter = SlideSegmenter::new(config.split_level).with_codec(codec.clone());
        let lines: Vec<&str> = content.split('\n').collect();

        let slides: Vec<Slide> = SlideBoundaries::new(&lines, config.split_level.get(), map, &codec)
            .enumerate()
            .map(|(index, span)| {
                let content = segmenter.slide_text(&lines, span, map);
                Slide {
                    index,
                    start_line: span.start,
                    layout: extract_slide_layout(&content),
                    content,
                }
            })
            .collect();

        let sections = extract_section_headings(content, config.toc_level, map);

        log::debug!(
            "Built deck of {} slides ({} TOC sections)",
            slides.len(),
            sections.len()
        );

        Self {
            config: config.clone(),
            slides,
            sections,
        }
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Start line of every slide, for jump-to-slide navigation.
    pub fn start_lines(&self) -> Vec<usize> {
        self.slides.iter().map(|slide| slide.start_line).collect()
    }

    /// Index of the slide containing the 0-based document `line`.
    pub fn slide_at_line(&self, line: usize) -> Option<usize> {
        match self.slides.binary_search_by_key(&line, |slide| slide.start_line) {
            Ok(index) => Some(index),
            Err(0) => None,
            Err(index) => Some(index - 1),
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Table of contents for the whole document.
    pub fn table_of_contents(&self) -> String {
        generate_table_of_contents(&self.sections)
    }

    /// Malformed annotations across all slides, in document order.
    pub fn ratio_errors(&self) -> Vec<RatioError> {
        self.slides
            .iter()
            .flat_map(|slide| collect_ratio_errors(&slide.content, slide.start_line))
            .collect()
    }

    /// Render one slide, or `None` if `index` is out of range.
    pub fn render_slide(&self, index: usize) -> Option<RenderedSlide> {
        let slide = self.slides.get(index)?;
        Some(RenderedSlide {
            index,
            layout: slide.layout,
            markup: self.render_markup(slide),
            ratio_errors: collect_ratio_errors(&slide.content, slide.start_line),
        })
    }

    /// Render every slide.
    pub fn render_all(&self) -> Vec<RenderedSlide> {
        (0..self.slides.len())
            .filter_map(|index| self.render_slide(index))
            .collect()
    }

    fn render_markup(&self, slide: &Slide) -> String {
        let mut content = slide.content.clone();
        if slide.layout == LayoutVariant::Toc {
            content = insert_table_of_contents(&content, &self.table_of_contents());
        }

        let content = normalize_dialect(&content, &self.config.codec());

        let split = split_content_by_h2(&content);
        let gridded = if split.is_multi_column() {
            wrap_h2_sections_in_grid(&split)
        } else {
            wrap_consecutive_h3_in_grid(&content)
        };

        let stripped = strip_column_ratios(&gridded);
        self.config.estimator().inject_into_charts(&stripped)
    }
}

/// Insert a generated table of contents after the slide's first non-blank
/// line (the agenda heading).
fn insert_table_of_contents(content: &str, toc: &str) -> String {
    if toc.is_empty() {
        return content.to_string();
    }
    let mut lines: Vec<&str> = content.split('\n').collect();
    let heading = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(0);
    lines.insert(heading + 1, "");
    lines.insert(heading + 2, toc);
    lines.join("\n")
}

/// Rewrite dialect-only syntax into Markdown the renderer understands.
///
/// Layout headings become `#` headings, scoped numbered items become plain
/// ordered items, and the first key message becomes an emphasized block.
/// Only one key message takes effect per slide; later ones render as plain
/// paragraphs.
pub fn normalize_dialect(content: &str, codec: &AttributeCodec) -> String {
    let mut key_message_seen = false;

    content
        .split('\n')
        .map(|line| {
            if is_image_line(line) {
                return line.to_string();
            }

            let parsed = codec.parse_line(line);
            match parsed.attribute {
                Some(attribute) if attribute.is_layout_heading() => {
                    prefixed(Attribute::Heading1, parsed.text.trim_end())
                }
                Some(Attribute::KeyMessage) if !key_message_seen => {
                    key_message_seen = true;
                    format!("{KEY_MESSAGE_OPEN}{}</div>", parsed.text.trim())
                }
                Some(Attribute::KeyMessage) => parsed.text,
                Some(Attribute::Numbered { depth, number }) if depth > 0 => {
                    let rest = parsed.text.trim_start_matches([' ', '\t']);
                    let indent = &parsed.text[..parsed.text.len() - rest.len()];
                    format!("{indent}{number}. {rest}")
                }
                _ => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplitLevel;

    const DOC: &str = "#ttl Welcome\nsubtitle\n#agd Agenda\n# Chapter 1\n## Costs {2}\n<chart id=\"c\" />\n## Benefits {bad}\n- more\n# Chapter 2\n### A\na\n### B\nb\n#! Thanks\n! Remember\n! Also";

    fn deck() -> SlideDeck {
        let config = EngineConfig::default().with_split_level(SplitLevel::new(1).unwrap());
        SlideDeck::build(DOC, &config, None)
    }

    #[test]
    fn test_build_classifies_slides() {
        let deck = deck();
        let layouts: Vec<LayoutVariant> = deck.slides().iter().map(|s| s.layout).collect();
        assert_eq!(
            layouts,
            vec![
                LayoutVariant::Cover,
                LayoutVariant::Toc,
                LayoutVariant::Section,
                LayoutVariant::Section,
                LayoutVariant::Summary,
            ]
        );
        assert_eq!(deck.start_lines(), vec![0, 2, 3, 8, 13]);
    }

    #[test]
    fn test_slide_at_line() {
        let deck = deck();
        assert_eq!(deck.slide_at_line(0), Some(0));
        assert_eq!(deck.slide_at_line(1), Some(0));
        assert_eq!(deck.slide_at_line(5), Some(2));
        assert_eq!(deck.slide_at_line(100), Some(4));
    }

    #[test]
    fn test_cover_heading_normalized() {
        let rendered = deck().render_slide(0).unwrap();
        assert_eq!(rendered.markup, "# Welcome\nsubtitle");
    }

    #[test]
    fn test_toc_slide_lists_sections() {
        let rendered = deck().render_slide(1).unwrap();
        assert_eq!(rendered.layout, LayoutVariant::Toc);
        assert_eq!(
            rendered.markup,
            "# Agenda\n\n- Chapter 1\n  - Costs\n  - Benefits\n- Chapter 2"
        );
    }

    #[test]
    fn test_h2_columns_with_chart() {
        let rendered = deck().render_slide(2).unwrap();
        assert!(rendered.markup.starts_with("# Chapter 1\n\n<div class=\"h2-grid\""));
        assert!(rendered.markup.contains("grid-template-columns: 2fr 1fr;"));
        assert!(rendered.markup.contains("data-col-ratio=\"2\""));
        assert!(rendered.markup.contains("data-height-before="));
        assert!(!rendered.markup.contains("{bad}"));

        assert_eq!(rendered.ratio_errors.len(), 1);
        assert_eq!(rendered.ratio_errors[0].line_number, 7);
    }

    #[test]
    fn test_h3_grid_slide() {
        let rendered = deck().render_slide(3).unwrap();
        assert!(rendered.markup.contains("class=\"h3-grid\""));
        assert_eq!(rendered.markup.matches("h3-grid-item").count(), 2);
    }

    #[test]
    fn test_single_key_message_takes_effect() {
        let rendered = deck().render_slide(4).unwrap();
        assert_eq!(
            rendered.markup,
            "# Thanks\n<div class=\"key-message\">Remember</div>\nAlso"
        );
    }

    #[test]
    fn test_key_message_height_survives_rendering() {
        let slide = "## T\n! Key\n<chart id=\"c\" />";
        let deck = SlideDeck::build(slide, &EngineConfig::default(), None);
        let rendered = deck.render_slide(0).unwrap();

        assert!(rendered.markup.contains("data-height-before=\"4.2\""));
        assert_eq!(
            rendered.markup.lines().last(),
            crate::height::inject_content_height_to_charts(slide).lines().last()
        );
    }

    #[test]
    fn test_glued_headings_render() {
        let deck = SlideDeck::build("#ttlHello\n#Part", &EngineConfig::default(), None);
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.slides()[1].layout, LayoutVariant::Section);
        assert_eq!(deck.render_slide(0).unwrap().markup, "# Hello");
    }

    #[test]
    fn test_deck_ratio_errors() {
        let errors = deck().ratio_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].raw_value, "bad");
    }

    #[test]
    fn test_render_out_of_range() {
        assert!(deck().render_slide(99).is_none());
        assert_eq!(deck().render_all().len(), 5);
    }

    #[test]
    fn test_normalize_scoped_numbers_and_images() {
        let codec = AttributeCodec::new();
        assert_eq!(normalize_dialect("##3. item", &codec), "3. item");
        assert_eq!(normalize_dialect("  #1. item", &codec), "  1. item");
        assert_eq!(normalize_dialect("2. plain", &codec), "2. plain");
        assert_eq!(normalize_dialect("![a](b.png)", &codec), "![a](b.png)");
    }
}

//! Heuristic content height estimation.
//!
//! Scores lines with a fixed weight table instead of measuring rendered
//! output. Results are unit-less (roughly "lines of base font size") and are
//! scaled by the renderer. Used to tell chart markers how much of the slide
//! the surrounding content already takes.

use crate::attribute::Attribute;
use crate::codec::AttributeCodec;
use crate::error::{Error, Result};
use crate::markers::{
    format_number, is_html_wrapper_line, is_image_line, key_message_block, ElementMarker,
};
use serde::{Deserialize, Serialize};

/// Per-line-type weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightWeights {
    pub heading1: f64,
    pub heading2: f64,
    pub heading3: f64,
    /// `####` and deeper.
    pub heading_minor: f64,
    pub list_item: f64,
    pub paragraph: f64,
    pub key_message: f64,
    pub image: f64,
    pub blank: f64,
    /// Characters per rendered row before text wraps.
    pub chars_per_line: usize,
}

impl Default for HeightWeights {
    fn default() -> Self {
        Self {
            heading1: 2.4,
            heading2: 2.0,
            heading3: 1.6,
            heading_minor: 1.4,
            list_item: 1.5,
            paragraph: 1.5,
            key_message: 2.2,
            image: 10.0,
            blank: 0.5,
            chars_per_line: 48,
        }
    }
}

impl HeightWeights {
    pub(crate) fn validate(&self) -> Result<()> {
        let weights = [
            ("heading1", self.heading1),
            ("heading2", self.heading2),
            ("heading3", self.heading3),
            ("heading_minor", self.heading_minor),
            ("list_item", self.list_item),
            ("paragraph", self.paragraph),
            ("key_message", self.key_message),
            ("image", self.image),
            ("blank", self.blank),
        ];
        if let Some((name, value)) = weights
            .iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(Error::Config(format!(
                "height weight {name} must be a non-negative number, got {value}"
            )));
        }
        if self.chars_per_line == 0 {
            return Err(Error::Config(
                "height chars_per_line must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// What a line contributes to the rendered height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Heading(u8),
    ListItem,
    KeyMessage,
    Paragraph,
    Image,
    /// Chart/diagram markers and HTML wrapper tags.
    Excluded,
}

/// Scores lines with a [`HeightWeights`] table.
#[derive(Debug, Clone, Default)]
pub struct ContentHeightEstimator {
    weights: HeightWeights,
    codec: AttributeCodec,
}

impl ContentHeightEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(mut self, weights: HeightWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Read line prefixes with `codec`.
    pub fn with_codec(mut self, codec: AttributeCodec) -> Self {
        self.codec = codec;
        self
    }

    fn classify(&self, line: &str) -> LineKind {
        if line.trim().is_empty() {
            return LineKind::Blank;
        }
        if ElementMarker::parse(line).is_some() {
            return LineKind::Excluded;
        }
        if is_image_line(line) {
            return LineKind::Image;
        }
        if key_message_block(line).is_some() {
            return LineKind::KeyMessage;
        }
        if is_html_wrapper_line(line) {
            return LineKind::Excluded;
        }
        if let Some(level) = self.codec.heading_depth(line) {
            return LineKind::Heading(level);
        }
        match self.codec.parse_line(line).attribute {
            Some(Attribute::KeyMessage) => LineKind::KeyMessage,
            Some(attribute) if attribute.is_list_item() => LineKind::ListItem,
            _ => LineKind::Paragraph,
        }
    }

    /// Estimated height of a single line.
    pub fn line_height(&self, line: &str) -> f64 {
        let w = &self.weights;
        let measured = key_message_block(line).unwrap_or(line);
        let rows = || {
            let chars = measured.trim().chars().count();
            chars.div_ceil(w.chars_per_line.max(1)).max(1) as f64
        };

        match self.classify(line) {
            LineKind::Blank => w.blank,
            LineKind::Heading(1) => w.heading1,
            LineKind::Heading(2) => w.heading2,
            LineKind::Heading(3) => w.heading3,
            LineKind::Heading(_) => w.heading_minor,
            LineKind::ListItem => w.list_item * rows(),
            LineKind::KeyMessage => w.key_message * rows(),
            LineKind::Paragraph => w.paragraph * rows(),
            LineKind::Image => w.image,
            LineKind::Excluded => 0.0,
        }
    }

    /// Sum of line heights.
    pub fn estimate<S: AsRef<str>>(&self, lines: &[S]) -> f64 {
        lines.iter().map(|line| self.line_height(line.as_ref())).sum()
    }

    /// Annotate every chart marker with `data-height-before` and
    /// `data-height-after`: the estimated height of the slide content strictly
    /// above and below it.
    pub fn inject_into_charts(&self, content: &str) -> String {
        let lines: Vec<&str> = content.split('\n').collect();

        // prefix[i] is the height of lines[..i].
        let mut prefix = Vec::with_capacity(lines.len() + 1);
        prefix.push(0.0);
        for line in &lines {
            let last = prefix[prefix.len() - 1];
            prefix.push(last + self.line_height(line));
        }
        let total = prefix[lines.len()];

        lines
            .iter()
            .enumerate()
            .map(|(index, line)| match ElementMarker::parse(line) {
                Some(mut marker) if marker.is_chart() => {
                    marker.set("data-height-before", format_number(prefix[index]));
                    marker.set("data-height-after", format_number(total - prefix[index + 1]));
                    marker.render()
                }
                _ => line.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Estimate the height of `lines` with the default weights.
pub fn estimate_content_height<S: AsRef<str>>(lines: &[S]) -> f64 {
    ContentHeightEstimator::new().estimate(lines)
}

/// Annotate chart markers with before/after height estimates using the
/// default weights.
pub fn inject_content_height_to_charts(content: &str) -> String {
    ContentHeightEstimator::new().inject_into_charts(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_by_line_kind() {
        let estimator = ContentHeightEstimator::new();
        let w = HeightWeights::default();
        assert_eq!(estimator.line_height("# Title"), w.heading1);
        assert_eq!(estimator.line_height("#ttl Cover"), w.heading1);
        assert_eq!(estimator.line_height("## Point"), w.heading2);
        assert_eq!(estimator.line_height("### Detail"), w.heading3);
        assert_eq!(estimator.line_height("##### Tiny"), w.heading_minor);
        assert_eq!(estimator.line_height("- item"), w.list_item);
        assert_eq!(estimator.line_height("a. item"), w.list_item);
        assert_eq!(estimator.line_height("! key"), w.key_message);
        assert_eq!(estimator.line_height("text"), w.paragraph);
        assert_eq!(estimator.line_height("![img](a.png)"), w.image);
        assert_eq!(estimator.line_height(""), w.blank);
    }

    #[test]
    fn test_headings_follow_codec() {
        let estimator = ContentHeightEstimator::new();
        let w = HeightWeights::default();
        assert_eq!(estimator.line_height("#Title"), w.heading1);
        assert_eq!(estimator.line_height("####x"), w.heading_minor);
        assert_eq!(estimator.line_height("##3. item"), w.list_item);
    }

    #[test]
    fn test_rendered_key_message_keeps_weight() {
        let estimator = ContentHeightEstimator::new();
        assert_eq!(
            estimator.line_height("<div class=\"key-message\">Key</div>"),
            estimator.line_height("! Key")
        );
        let long = format!("<div class=\"key-message\">{}</div>", "x".repeat(48));
        assert_eq!(estimator.line_height(&long), HeightWeights::default().key_message);
    }

    #[test]
    fn test_markers_and_wrappers_excluded() {
        let estimator = ContentHeightEstimator::new();
        assert_eq!(estimator.line_height("<chart id=\"a\" />"), 0.0);
        assert_eq!(estimator.line_height("<diagram id=\"d\" />"), 0.0);
        assert_eq!(estimator.line_height("<div class=\"h3-grid\">"), 0.0);
        assert_eq!(estimator.line_height("</div>"), 0.0);
    }

    #[test]
    fn test_long_paragraph_wraps() {
        let estimator = ContentHeightEstimator::new();
        let long = "x".repeat(100);
        assert_eq!(estimator.line_height(&long), 3.0 * HeightWeights::default().paragraph);
    }

    #[test]
    fn test_estimate_sums() {
        let total = estimate_content_height(&["# Title", "", "text"]);
        let w = HeightWeights::default();
        assert!((total - (w.heading1 + w.blank + w.paragraph)).abs() < 1e-9);
        assert_eq!(estimate_content_height::<&str>(&[]), 0.0);
    }

    #[test]
    fn test_appending_never_decreases() {
        let mut lines: Vec<&str> = Vec::new();
        let mut previous = 0.0;
        for line in ["# A", "text", "- item", "<chart id=\"c\" />", "", "![i](x.png)", "! key"] {
            lines.push(line);
            let current = estimate_content_height(&lines);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_inject_heights_into_chart() {
        let content = "## Sales\n<chart id=\"s\" />\n- note";
        let injected = inject_content_height_to_charts(content);
        assert_eq!(
            injected,
            "## Sales\n<chart id=\"s\" data-height-before=\"2\" data-height-after=\"1.5\" />\n- note"
        );
    }

    #[test]
    fn test_inject_ignores_diagrams_and_other_charts() {
        let content = "<chart id=\"a\" />\n<diagram id=\"d\" />\n<chart id=\"b\" />";
        let injected = inject_content_height_to_charts(content);
        assert!(injected.contains("<chart id=\"a\" data-height-before=\"0\" data-height-after=\"0\" />"));
        assert!(injected.contains("<diagram id=\"d\" />"));
    }

    #[test]
    fn test_custom_weights() {
        let estimator = ContentHeightEstimator::new().with_weights(HeightWeights {
            paragraph: 1.0,
            ..HeightWeights::default()
        });
        assert_eq!(estimator.estimate(&["a", "b"]), 2.0);
    }
}

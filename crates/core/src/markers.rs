//! Embedded element markers and line-shape helpers.
//!
//! Charts and diagrams are embedded as single-line self-closing elements,
//! e.g. `<chart id="sales" />`. The grid annotator and the height estimator
//! add `data-*` attributes to these lines for the chart-sizing collaborator.

use regex::Regex;
use std::sync::LazyLock;

static MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)<(chart|diagram)\b([^>]*?)\s*/?>\s*$").unwrap());

static MARKER_ATTR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*"([^"]*)""#).unwrap());

/// Markdown image (`![alt](src)`) or an `<img>` tag on its own line.
static IMAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(!\[[^\]]*\]\([^)]*\)|<img\b[^>]*>)\s*$").unwrap()
});

/// A lone opening or closing HTML tag, such as a grid wrapper `<div ...>`.
static HTML_WRAPPER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*</?[A-Za-z][A-Za-z0-9-]*(\s[^>]*)?/?>\s*$").unwrap());

/// Kind of embedded element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Chart,
    Diagram,
}

impl MarkerKind {
    fn tag(&self) -> &'static str {
        match self {
            Self::Chart => "chart",
            Self::Diagram => "diagram",
        }
    }
}

/// A parsed element marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMarker {
    pub kind: MarkerKind,
    indent: String,
    attributes: Vec<(String, String)>,
}

impl ElementMarker {
    /// Parse a marker line, or `None` if the line is anything else.
    pub fn parse(line: &str) -> Option<Self> {
        let caps = MARKER_REGEX.captures(line)?;
        let kind = match &caps[2] {
            "chart" => MarkerKind::Chart,
            _ => MarkerKind::Diagram,
        };
        let attributes = MARKER_ATTR_REGEX
            .captures_iter(&caps[3])
            .map(|attr| (attr[1].to_string(), attr[2].to_string()))
            .collect();

        Some(Self {
            kind,
            indent: caps[1].to_string(),
            attributes,
        })
    }

    pub fn is_chart(&self) -> bool {
        self.kind == MarkerKind::Chart
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Render back to a single self-closing element line.
    pub fn render(&self) -> String {
        let mut out = format!("{}<{}", self.indent, self.kind.tag());
        for (key, value) in &self.attributes {
            out.push_str(&format!(" {key}=\"{value}\""));
        }
        out.push_str(" />");
        out
    }
}

/// Whether the line is an image on its own.
pub fn is_image_line(line: &str) -> bool {
    IMAGE_REGEX.is_match(line)
}

/// Whether the line is a bare HTML tag (wrapper markup, not content).
pub fn is_html_wrapper_line(line: &str) -> bool {
    HTML_WRAPPER_REGEX.is_match(line)
}

/// Opening tag of a rendered key message block.
pub const KEY_MESSAGE_OPEN: &str = "<div class=\"key-message\">";

/// Text of a rendered `<div class="key-message">...</div>` line.
pub fn key_message_block(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix(KEY_MESSAGE_OPEN)?
        .strip_suffix("</div>")
}

/// Format a number for markup: integral values without a fraction, others
/// rounded to two decimals.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded}")
}

//! Line-attribute codec.
//!
//! Converts between raw document text and the structured [`EditorLine`]
//! model, and reconciles out-of-band [`AttributeMap`]s against freshly parsed
//! lines.

use crate::attribute::Attribute;
use crate::types::{prefixed, EditorLine};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Marker patterns for one parsing pass, checked in priority order.
struct MarkerPatterns {
    alpha: Regex,
    numbered: Regex,
    symbol: Regex,
}

impl MarkerPatterns {
    fn build(separator: &str) -> Self {
        Self {
            alpha: Regex::new(&format!(r"^([A-Za-z])\.{separator}")).unwrap(),
            numbered: Regex::new(&format!(r"^(#{{1,3}})?([0-9]+)\.{separator}")).unwrap(),
            symbol: Regex::new(&format!(r"^(#ttl|#agd|#!|###|##|#|-|\*|!){separator}")).unwrap(),
        }
    }
}

/// Markers followed by exactly one space or tab, or ending the line.
static SPACED_MARKERS: LazyLock<MarkerPatterns> =
    LazyLock::new(|| MarkerPatterns::build("(?:[ \t]|$)"));

/// Markers glued directly to the text.
static GLUED_MARKERS: LazyLock<MarkerPatterns> = LazyLock::new(|| MarkerPatterns::build(""));

/// Result of parsing one raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub attribute: Option<Attribute>,
    /// Line text without the attribute prefix, indentation preserved.
    pub text: String,
}

/// Parser and serializer for the line-attribute dialect.
#[derive(Debug, Clone)]
pub struct AttributeCodec {
    /// Whether to retry without the trailing-space requirement.
    glued_fallback: bool,
}

impl Default for AttributeCodec {
    fn default() -> Self {
        Self {
            glued_fallback: true,
        }
    }
}

impl AttributeCodec {
    /// Create a codec with the glued fallback enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether markers glued to their text (`-item`, `##Title`) are
    /// recognized when no spaced marker matches.
    pub fn with_glued_fallback(mut self, enabled: bool) -> Self {
        self.glued_fallback = enabled;
        self
    }

    /// Split a raw line into its attribute and the remaining text.
    ///
    /// Lines without a recognizable prefix come back unchanged with no
    /// attribute.
    pub fn parse_line(&self, line: &str) -> ParsedLine {
        let body = line.trim_start_matches([' ', '\t']);
        let indent = &line[..line.len() - body.len()];

        let matched = match_marker(body, &SPACED_MARKERS).or_else(|| {
            if self.glued_fallback {
                match_marker(body, &GLUED_MARKERS)
            } else {
                None
            }
        });

        match matched {
            Some((attribute, rest)) => ParsedLine {
                attribute: Some(attribute),
                text: format!("{indent}{rest}"),
            },
            None => ParsedLine {
                attribute: None,
                text: line.to_string(),
            },
        }
    }

    /// Attribute of line `index`: the map entry when there is one, otherwise
    /// whatever the text spells out.
    pub fn resolve(&self, line: &str, index: usize, map: Option<&AttributeMap>) -> Option<Attribute> {
        match map.and_then(|m| m.get(index)) {
            Some(attribute) => Some(attribute),
            None => self.parse_line(line).attribute,
        }
    }

    /// Slide-splitting heading level of line `index`. Layout headings are
    /// level 1.
    pub fn resolve_heading_level(
        &self,
        line: &str,
        index: usize,
        map: Option<&AttributeMap>,
    ) -> Option<u8> {
        self.resolve(line, index, map)
            .and_then(|attribute| attribute.heading_level())
    }

    /// Heading depth of a raw line.
    ///
    /// `#` to `###` and the layout keywords follow [`Self::parse_line`], so
    /// `##B` is level 2 and `##3.` is a numbered item. Deeper runs of four to
    /// six `#`, which carry no attribute, count as minor headings.
    pub fn heading_depth(&self, line: &str) -> Option<u8> {
        if let Some(attribute) = self.parse_line(line).attribute {
            return attribute.heading_level();
        }
        let body = line.trim_start_matches([' ', '\t']);
        let depth = body.len() - body.trim_start_matches('#').len();
        (4..=6).contains(&depth).then_some(depth as u8)
    }

    /// `raw` rewritten so that its own text spells out `assigned`.
    ///
    /// Lines whose typed prefix already matches are returned unchanged.
    pub fn describe(&self, raw: &str, assigned: Option<Attribute>) -> String {
        let Some(attribute) = assigned else {
            return raw.to_string();
        };
        let parsed = self.parse_line(raw);
        if parsed.attribute == Some(attribute) {
            raw.to_string()
        } else {
            prefixed(attribute, &parsed.text)
        }
    }

    /// Reconcile `saved` against a fresh parse of `content`.
    pub fn reconcile(&self, content: &str, saved: &AttributeMap) -> AttributeMap {
        reconcile_attribute_map(&self.content_to_lines(content), saved)
    }

    /// Parse a whole document into editor lines with fresh identifiers.
    pub fn content_to_lines(&self, content: &str) -> Vec<EditorLine> {
        content
            .split('\n')
            .map(|raw| {
                let parsed = self.parse_line(raw);
                EditorLine::new(parsed.attribute, parsed.text)
            })
            .collect()
    }

    /// Re-parse a document, reusing the identifiers of `previous` line by
    /// line so that unchanged positions keep a stable id.
    pub fn relabel_lines(&self, content: &str, previous: &[EditorLine]) -> Vec<EditorLine> {
        let mut lines = self.content_to_lines(content);
        for (line, old) in lines.iter_mut().zip(previous) {
            line.id = old.id;
        }
        lines
    }
}

fn match_marker<'a>(body: &'a str, patterns: &MarkerPatterns) -> Option<(Attribute, &'a str)> {
    if let Some(caps) = patterns.alpha.captures(body) {
        let letter = caps[1].chars().next()?.to_ascii_uppercase();
        return Some((Attribute::Alpha(letter), &body[caps.get(0)?.end()..]));
    }

    if let Some(caps) = patterns.numbered.captures(body) {
        // Numbers too large for u32 are left to the symbol pass.
        if let Ok(number) = caps[2].parse::<u32>() {
            let depth = caps.get(1).map_or(0, |m| m.len()) as u8;
            let rest = &body[caps.get(0)?.end()..];
            return Some((Attribute::Numbered { depth, number }, rest));
        }
    }

    let caps = patterns.symbol.captures(body)?;
    let attribute = Attribute::from_token(&caps[1])?;
    let end = caps.get(0)?.end();
    let rest = &body[end..];
    // A glued heading token must take the whole `#` run: `####x` is not `###` + `#x`.
    let glued = end == caps.get(1)?.end();
    if glued && attribute.heading_level().is_some() && rest.starts_with('#') {
        return None;
    }
    Some((attribute, rest))
}

/// Parse one raw line with the default codec.
pub fn parse_line(line: &str) -> ParsedLine {
    AttributeCodec::new().parse_line(line)
}

/// Parse a document into editor lines with the default codec.
pub fn content_to_lines(content: &str) -> Vec<EditorLine> {
    AttributeCodec::new().content_to_lines(content)
}

/// Heading depth of a raw line with the default codec.
pub fn heading_depth(line: &str) -> Option<u8> {
    AttributeCodec::new().heading_depth(line)
}

/// Serialize editor lines back to raw document text.
///
/// Attributed lines render as `{indent}{token} {text}`, or just
/// `{indent}{token}` when the text is empty; plain lines render their text
/// verbatim.
pub fn lines_to_content(lines: &[EditorLine]) -> String {
    lines
        .iter()
        .map(|line| match line.attribute {
            Some(attribute) => prefixed(attribute, &line.text),
            None => line.text.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Attributes keyed by 0-based line index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap(BTreeMap<usize, Attribute>);

impl AttributeMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a map from the attributes carried by `lines`.
    pub fn from_lines(lines: &[EditorLine]) -> Self {
        lines
            .iter()
            .enumerate()
            .filter_map(|(index, line)| line.attribute.map(|a| (index, a)))
            .collect()
    }

    pub fn get(&self, line: usize) -> Option<Attribute> {
        self.0.get(&line).copied()
    }

    pub fn insert(&mut self, line: usize, attribute: Attribute) -> Option<Attribute> {
        self.0.insert(line, attribute)
    }

    pub fn remove(&mut self, line: usize) -> Option<Attribute> {
        self.0.remove(&line)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in line order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Attribute)> + '_ {
        self.0.iter().map(|(&line, &attribute)| (line, attribute))
    }
}

impl FromIterator<(usize, Attribute)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (usize, Attribute)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Merge a map derived from freshly parsed lines with a previously saved one.
///
/// Attributes parsed from the text always win. Saved entries for lines that
/// no longer spell out their attribute (set through the UI rather than typed)
/// survive while their line still exists; entries past the end are dropped.
pub fn reconcile_attribute_map(fresh: &[EditorLine], saved: &AttributeMap) -> AttributeMap {
    let line_count = fresh.len();
    let mut merged: AttributeMap = saved.iter().filter(|&(line, _)| line < line_count).collect();

    let pruned = saved.len() - merged.len();
    if pruned > 0 {
        log::debug!(
            "Dropped {} saved attribute(s) beyond line count {}",
            pruned,
            line_count
        );
    }

    for (line, attribute) in AttributeMap::from_lines(fresh).iter() {
        merged.insert(line, attribute);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> (Option<String>, String) {
        let p = parse_line(line);
        (p.attribute.map(|a| a.token()), p.text)
    }

    fn some(token: &str, text: &str) -> (Option<String>, String) {
        (Some(token.to_string()), text.to_string())
    }

    #[test]
    fn test_parse_headings() {
        assert_eq!(parsed("# Chapter"), some("#", "Chapter"));
        assert_eq!(parsed("## Point"), some("##", "Point"));
        assert_eq!(parsed("### Detail"), some("###", "Detail"));
        assert_eq!(parsed("#ttl Welcome"), some("#ttl", "Welcome"));
        assert_eq!(parsed("#agd Agenda"), some("#agd", "Agenda"));
        assert_eq!(parsed("#! Thanks"), some("#!", "Thanks"));
    }

    #[test]
    fn test_parse_lists_and_key_message() {
        assert_eq!(parsed("- item"), some("-", "item"));
        assert_eq!(parsed("* item"), some("*", "item"));
        assert_eq!(parsed("! Remember this"), some("!", "Remember this"));
        assert_eq!(parsed("12. twelfth"), some("12.", "twelfth"));
        assert_eq!(parsed("##3. scoped"), some("##3.", "scoped"));
        assert_eq!(parsed("###1. deep"), some("###1.", "deep"));
        assert_eq!(parsed("#2. shallow"), some("#2.", "shallow"));
    }

    #[test]
    fn test_parse_alpha_normalized_uppercase() {
        assert_eq!(parsed("a. first"), some("A.", "first"));
        assert_eq!(parsed("B. second"), some("B.", "second"));
    }

    #[test]
    fn test_indentation_kept_in_text() {
        assert_eq!(parsed("\t- nested"), some("-", "\tnested"));
        assert_eq!(parsed("    1. nested"), some("1.", "    nested"));
    }

    #[test]
    fn test_only_one_separator_consumed() {
        assert_eq!(parsed("##  wide"), some("##", " wide"));
    }

    #[test]
    fn test_no_attribute_returns_line_unchanged() {
        assert_eq!(parsed("Plain text"), (None, "Plain text".to_string()));
        assert_eq!(parsed("  indented"), (None, "  indented".to_string()));
        assert_eq!(parsed(""), (None, String::new()));
    }

    #[test]
    fn test_glued_fallback_priority() {
        assert_eq!(parsed("##Title"), some("##", "Title"));
        assert_eq!(parsed("-5"), some("-", "5"));
        assert_eq!(parsed("#ttlCover"), some("#ttl", "Cover"));
        assert_eq!(parsed("##"), some("##", ""));
    }

    #[test]
    fn test_heading_token_takes_whole_hash_run() {
        assert_eq!(parsed("####x"), (None, "####x".to_string()));
        assert_eq!(parsed("#### Deep"), (None, "#### Deep".to_string()));
        assert_eq!(parsed("###"), some("###", ""));
        assert_eq!(parsed("#!!"), some("#!", "!"));
        assert_eq!(parsed("### #tag"), some("###", "#tag"));
    }

    #[test]
    fn test_heading_depth_follows_codec() {
        assert_eq!(heading_depth("# Chapter"), Some(1));
        assert_eq!(heading_depth("#Chapter"), Some(1));
        assert_eq!(heading_depth("##B"), Some(2));
        assert_eq!(heading_depth("  ### Nested"), Some(3));
        assert_eq!(heading_depth("##"), Some(2));
        assert_eq!(heading_depth("## {2:mid}"), Some(2));
        assert_eq!(heading_depth("#agd Agenda"), Some(1));
        assert_eq!(heading_depth("#### Deep"), Some(4));
        assert_eq!(heading_depth("######"), Some(6));
        assert_eq!(heading_depth("####### Too deep"), None);
        assert_eq!(heading_depth("##3. item"), None);
        assert_eq!(heading_depth("- item"), None);
        assert_eq!(heading_depth("plain"), None);
    }

    #[test]
    fn test_strict_codec_heading_depth() {
        let codec = AttributeCodec::new().with_glued_fallback(false);
        assert_eq!(codec.heading_depth("##B"), None);
        assert_eq!(codec.heading_depth("##"), Some(2));
        assert_eq!(codec.heading_depth("## B"), Some(2));
    }

    #[test]
    fn test_resolve_prefers_map() {
        let codec = AttributeCodec::new();
        let mut map = AttributeMap::new();
        map.insert(1, Attribute::Dash);
        map.insert(2, Attribute::Heading2);

        assert_eq!(codec.resolve_heading_level("# Typed", 0, Some(&map)), Some(1));
        assert_eq!(codec.resolve_heading_level("# Overridden", 1, Some(&map)), None);
        assert_eq!(codec.resolve_heading_level("plain", 2, Some(&map)), Some(2));
        assert_eq!(codec.resolve_heading_level("plain", 2, None), None);
    }

    #[test]
    fn test_describe_injects_assigned_attribute() {
        let codec = AttributeCodec::new();
        assert_eq!(codec.describe("plain", Some(Attribute::Heading2)), "## plain");
        assert_eq!(codec.describe("- item", Some(Attribute::Heading1)), "# item");
        assert_eq!(codec.describe("## Typed", Some(Attribute::Heading2)), "## Typed");
        assert_eq!(codec.describe("text", None), "text");
    }

    #[test]
    fn test_empty_attributed_line_round_trips() {
        let doc = "##\n- a\n-\n\t#";
        assert_eq!(lines_to_content(&content_to_lines(doc)), doc);
    }

    #[test]
    fn test_strict_codec_skips_glued_markers() {
        let codec = AttributeCodec::new().with_glued_fallback(false);
        assert_eq!(codec.parse_line("-5").attribute, None);
        assert_eq!(codec.parse_line("##Title").text, "##Title");
        assert_eq!(codec.parse_line("- 5").attribute, Some(Attribute::Dash));
    }

    #[test]
    fn test_round_trip_canonical_document() {
        let doc = "#ttl Welcome\n\n## Point A {2:mid}\n- one\n\t- two\nA. alpha\n##1. numbered\n! Key\nplain text\n";
        assert_eq!(lines_to_content(&content_to_lines(doc)), doc);
    }

    #[test]
    fn test_content_to_lines_splits_every_newline() {
        let lines = content_to_lines("a\n\nb");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].text, "");
    }

    #[test]
    fn test_relabel_keeps_ids_by_position() {
        let codec = AttributeCodec::new();
        let before = codec.content_to_lines("# One\ntext");
        let after = codec.relabel_lines("# One\ntext changed\n- new", &before);
        assert_eq!(after[0].id, before[0].id);
        assert_eq!(after[1].id, before[1].id);
        assert_eq!(after[1].text, "text changed");
        assert!(before.iter().all(|l| l.id != after[2].id));
    }

    #[test]
    fn test_reconcile_prefers_fresh_and_prunes() {
        let fresh = content_to_lines("## Typed\nToggled via UI\nplain");
        let mut saved = AttributeMap::new();
        saved.insert(0, Attribute::Heading3);
        saved.insert(1, Attribute::Dash);
        saved.insert(7, Attribute::KeyMessage);

        let merged = reconcile_attribute_map(&fresh, &saved);
        assert_eq!(merged.get(0), Some(Attribute::Heading2));
        assert_eq!(merged.get(1), Some(Attribute::Dash));
        assert_eq!(merged.get(2), None);
        assert_eq!(merged.get(7), None);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_attribute_map_serializes_as_object() {
        let mut map = AttributeMap::new();
        map.insert(2, Attribute::Heading1);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r##"{"2":"#"}"##);
        let back: AttributeMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}

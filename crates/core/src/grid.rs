//! Multi-column grid annotation.
//!
//! Heading lines may end with a `{ratio}`, `{alignment}` or
//! `{ratio:alignment}` annotation (`## Costs {2:mid}`). Sibling headings are
//! packed into CSS grid containers whose column widths follow the ratios and
//! whose items align by the alignment keyword. Malformed annotations are
//! reported as [`RatioError`]s and otherwise treated as neutral.

use crate::codec::{heading_depth, parse_line};
use crate::markers::{format_number, ElementMarker};
use crate::types::{Alignment, ColumnSpec, RatioError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Trailing `{...}` annotation, with the whitespace before it.
static ANNOTATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\{([^{}]*)\}\s*$").unwrap());

/// Everything parsed from one heading line's annotation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnRatio {
    /// Parsed ratio; `None` when absent or malformed.
    pub ratio: Option<f64>,
    pub alignment: Alignment,
    /// Heading text without prefix or annotation.
    pub title: String,
    /// Whether the line carried a `{...}` annotation at all.
    pub has_ratio_syntax: bool,
    pub ratio_error: bool,
    pub alignment_error: bool,
    /// The offending token when either error flag is set.
    pub raw_value: Option<String>,
}

impl ColumnRatio {
    /// The usable column settings, errors neutralized.
    pub fn column_spec(&self) -> ColumnSpec {
        ColumnSpec {
            ratio: self.ratio,
            alignment: self.alignment,
            title: self.title.clone(),
        }
    }

    pub fn has_error(&self) -> bool {
        self.ratio_error || self.alignment_error
    }

    /// Diagnostic for this annotation at the given 1-based line, if malformed.
    pub fn error_at(&self, line_number: usize) -> Option<RatioError> {
        if !self.has_error() {
            return None;
        }
        let raw_value = self.raw_value.clone().unwrap_or_default();
        let message = match (self.ratio_error, self.alignment_error) {
            (true, true) => format!(
                "Invalid column annotation \"{{{raw_value}}}\": expected {{ratio}}, {{alignment}} or {{ratio:alignment}}"
            ),
            (true, false) => {
                format!("Invalid column ratio \"{raw_value}\": expected a positive number")
            }
            _ => format!("Invalid column alignment \"{raw_value}\": expected top, mid or btm"),
        };
        Some(RatioError {
            raw_value,
            line_number,
            message,
        })
    }
}

fn parse_ratio(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
}

fn parse_alignment(raw: &str) -> Option<Alignment> {
    Alignment::from_keyword(&raw.to_ascii_lowercase())
}

/// Heading text with its `#` run or layout keyword removed.
fn strip_heading_marker(line: &str) -> String {
    let parsed = parse_line(line);
    match parsed.attribute {
        Some(attribute) if attribute.heading_level().is_some() => parsed.text,
        _ if heading_depth(line).is_some() => line.trim_start().trim_start_matches('#').to_string(),
        _ => line.to_string(),
    }
}

/// Parse the column annotation of a heading line.
///
/// A single token is an alignment when it is a keyword and a ratio otherwise;
/// an empty part of a `ratio:alignment` pair falls back to its default.
pub fn parse_column_ratio(heading_line: &str) -> ColumnRatio {
    let mut parsed = ColumnRatio::default();

    let without_annotation = match ANNOTATION_REGEX.captures(heading_line) {
        Some(caps) => {
            parsed.has_ratio_syntax = true;
            apply_annotation(&mut parsed, caps[1].trim());
            &heading_line[..caps.get(0).map_or(heading_line.len(), |m| m.start())]
        }
        None => heading_line,
    };

    parsed.title = strip_heading_marker(without_annotation).trim().to_string();
    parsed
}

fn apply_annotation(parsed: &mut ColumnRatio, inner: &str) {
    match inner.split_once(':') {
        Some((ratio_raw, alignment_raw)) => {
            let ratio_raw = ratio_raw.trim();
            let alignment_raw = alignment_raw.trim();

            if !ratio_raw.is_empty() {
                parsed.ratio = parse_ratio(ratio_raw);
                parsed.ratio_error = parsed.ratio.is_none();
            }
            if !alignment_raw.is_empty() {
                match parse_alignment(alignment_raw) {
                    Some(alignment) => parsed.alignment = alignment,
                    None => parsed.alignment_error = true,
                }
            }

            parsed.raw_value = match (parsed.ratio_error, parsed.alignment_error) {
                (true, true) => Some(inner.to_string()),
                (true, false) => Some(ratio_raw.to_string()),
                (false, true) => Some(alignment_raw.to_string()),
                (false, false) => None,
            };
        }
        None => {
            if let Some(alignment) = parse_alignment(inner) {
                parsed.alignment = alignment;
            } else if let Some(ratio) = parse_ratio(inner) {
                parsed.ratio = Some(ratio);
            } else {
                parsed.ratio_error = true;
                parsed.raw_value = Some(inner.to_string());
            }
        }
    }
}

/// Remove a trailing `{...}` annotation from a heading line.
///
/// Non-heading lines are returned unchanged, so literal braces in body text
/// survive.
pub fn remove_column_ratio_from_line(line: &str) -> String {
    if heading_depth(line).is_none() {
        return line.to_string();
    }
    ANNOTATION_REGEX.replace(line, "").into_owned()
}

/// Strip annotations from every heading line of `content`.
pub fn strip_column_ratios(content: &str) -> String {
    content
        .split('\n')
        .map(remove_column_ratio_from_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Report every malformed annotation in `content`.
///
/// `line_offset` is the 0-based document line of the first line of
/// `content`; reported line numbers are 1-based document lines.
pub fn collect_ratio_errors(content: &str, line_offset: usize) -> Vec<RatioError> {
    content
        .split('\n')
        .enumerate()
        .filter(|(_, line)| heading_depth(line).is_some())
        .filter_map(|(index, line)| parse_column_ratio(line).error_at(line_offset + index + 1))
        .collect()
}

/// A slide separated into its H1 preamble and H2 column sections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct H2Split {
    /// Content before the first H2, or the whole slide when fewer than two
    /// H2 sections exist.
    pub h1_section: String,
    /// One entry per H2 section, heading line included (annotation removed).
    pub h2_sections: Vec<String>,
    pub h2_ratios: Vec<f64>,
    pub h2_alignments: Vec<Alignment>,
    /// Malformed H2 annotations, with 1-based line numbers within the slide.
    pub ratio_errors: Vec<RatioError>,
}

impl H2Split {
    /// Whether the slide is laid out in H2 columns.
    pub fn is_multi_column(&self) -> bool {
        !self.h2_sections.is_empty()
    }
}

/// Separate a slide into an H1 preamble and H2 sections.
///
/// Columns are produced only for two or more H2 sections; a single H2 stays
/// ordinary flow inside `h1_section`. Empty `##` headings start sections too.
pub fn split_content_by_h2(slide_content: &str) -> H2Split {
    let lines: Vec<&str> = slide_content.split('\n').collect();
    let starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| heading_depth(line) == Some(2))
        .map(|(index, _)| index)
        .collect();

    let ratio_errors: Vec<RatioError> = starts
        .iter()
        .filter_map(|&index| parse_column_ratio(lines[index]).error_at(index + 1))
        .collect();

    if starts.len() < 2 {
        return H2Split {
            h1_section: slide_content.to_string(),
            ratio_errors,
            ..H2Split::default()
        };
    }

    let mut split = H2Split {
        h1_section: lines[..starts[0]].join("\n"),
        ratio_errors,
        ..H2Split::default()
    };

    for (position, &start) in starts.iter().enumerate() {
        let end = starts.get(position + 1).copied().unwrap_or(lines.len());
        let column = parse_column_ratio(lines[start]);

        let mut section = vec![remove_column_ratio_from_line(lines[start])];
        section.extend(lines[start + 1..end].iter().map(|line| line.to_string()));

        split.h2_sections.push(section.join("\n"));
        split.h2_ratios.push(column.column_spec().effective_ratio());
        split.h2_alignments.push(column.alignment);
    }

    log::trace!("Split slide into {} H2 columns", split.h2_sections.len());
    split
}

/// One column of a grid container.
struct GridColumn {
    ratio: f64,
    alignment: Alignment,
    body: String,
}

/// Render columns as a CSS grid container.
///
/// Blank lines around each item body keep the renderer parsing the body as
/// Markdown inside the HTML block.
fn render_grid(class: &str, columns: &[GridColumn]) -> Vec<String> {
    let template = columns
        .iter()
        .map(|column| format!("{}fr", format_number(column.ratio)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = vec![format!(
        "<div class=\"{class}\" style=\"display: grid; grid-template-columns: {template}; gap: 1.5em;\">"
    )];
    for column in columns {
        out.push(format!(
            "<div class=\"{class}-item\" style=\"align-self: {};\">",
            column.alignment.css_align_self()
        ));
        out.push(String::new());
        out.push(column.body.trim_end().to_string());
        out.push(String::new());
        out.push("</div>".to_string());
    }
    out.push("</div>".to_string());
    out
}

/// Give chart markers in `body` their column's share of the grid.
///
/// With `keep_existing`, markers already annotated by an inner grid are left
/// alone.
fn annotate_charts(body: &str, ratio: f64, total: f64, count: usize, keep_existing: bool) -> String {
    body.split('\n')
        .map(|line| match ElementMarker::parse(line) {
            Some(mut marker)
                if marker.is_chart() && !(keep_existing && marker.get("data-col-count").is_some()) =>
            {
                marker.set("data-col-ratio", format_number(ratio));
                marker.set("data-total-ratio", format_number(total));
                marker.set("data-col-count", count.to_string());
                marker.render()
            }
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap every run of two or more consecutive H3 blocks in a grid.
///
/// A block runs from its H3 line to the next heading of any level; a run ends
/// at the first non-H3 heading or the end of input. Lone H3 blocks pass
/// through unchanged.
pub fn wrap_consecutive_h3_in_grid(content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let next_heading = |from: usize| {
        (from..lines.len())
            .find(|&index| heading_depth(lines[index]).is_some())
            .unwrap_or(lines.len())
    };

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut index = 0;
    while index < lines.len() {
        if heading_depth(lines[index]) != Some(3) {
            out.push(lines[index].to_string());
            index += 1;
            continue;
        }

        let mut blocks: Vec<(usize, usize)> = Vec::new();
        let mut start = index;
        loop {
            let end = next_heading(start + 1);
            blocks.push((start, end));
            if end < lines.len() && heading_depth(lines[end]) == Some(3) {
                start = end;
            } else {
                break;
            }
        }
        let run_end = blocks.last().map_or(index + 1, |&(_, end)| end);

        if blocks.len() < 2 {
            out.extend(lines[index..run_end].iter().map(|line| line.to_string()));
        } else {
            out.extend(render_h3_run(&lines, &blocks));
            if run_end < lines.len() {
                out.push(String::new());
            }
        }
        index = run_end;
    }

    out.join("\n")
}

fn render_h3_run(lines: &[&str], blocks: &[(usize, usize)]) -> Vec<String> {
    let specs: Vec<ColumnRatio> = blocks
        .iter()
        .map(|&(start, _)| parse_column_ratio(lines[start]))
        .collect();
    let total: f64 = specs.iter().map(|s| s.column_spec().effective_ratio()).sum();

    log::trace!("Wrapping {} consecutive H3 blocks in a grid", blocks.len());

    let columns: Vec<GridColumn> = blocks
        .iter()
        .zip(&specs)
        .map(|(&(start, end), spec)| {
            let ratio = spec.column_spec().effective_ratio();
            let mut body = vec![remove_column_ratio_from_line(lines[start])];
            body.extend(lines[start + 1..end].iter().map(|line| line.to_string()));
            GridColumn {
                ratio,
                alignment: spec.alignment,
                body: annotate_charts(&body.join("\n"), ratio, total, blocks.len(), false),
            }
        })
        .collect();

    render_grid("h3-grid", &columns)
}

/// Render an [`H2Split`] as a column grid after its H1 preamble.
///
/// H3 runs in the preamble and in each section are wrapped first; charts keep
/// the innermost grid's annotation. Returns the preamble unchanged when the
/// split has no columns.
pub fn wrap_h2_sections_in_grid(split: &H2Split) -> String {
    if !split.is_multi_column() {
        return split.h1_section.clone();
    }

    let total: f64 = split.h2_ratios.iter().sum();
    let count = split.h2_sections.len();
    let columns: Vec<GridColumn> = split
        .h2_sections
        .iter()
        .zip(&split.h2_ratios)
        .zip(&split.h2_alignments)
        .map(|((section, &ratio), &alignment)| GridColumn {
            ratio,
            alignment,
            body: annotate_charts(
                &wrap_consecutive_h3_in_grid(section),
                ratio,
                total,
                count,
                true,
            ),
        })
        .collect();

    let mut out: Vec<String> = Vec::new();
    let preamble = wrap_consecutive_h3_in_grid(&split.h1_section);
    let preamble = preamble.trim_end();
    if !preamble.is_empty() {
        out.push(preamble.to_string());
        out.push(String::new());
    }
    out.extend(render_grid("h2-grid", &columns));
    out.join("\n")
}

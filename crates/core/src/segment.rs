//! Slide segmentation by heading level.
//!
//! A single [`SlideBoundaries`] scan drives both the slide texts and their
//! start lines, so the two can never disagree.

use crate::codec::{AttributeCodec, AttributeMap};
use crate::config::SplitLevel;

/// Half-open range of document lines forming one slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideSpan {
    pub start: usize,
    pub end: usize,
}

/// Iterator over the slide spans of a document.
///
/// Non-blank content before the first qualifying heading forms an implicit
/// first slide; blank-only leading content is skipped. A document without any
/// qualifying heading is one slide starting at line 0.
///
/// A map entry decides a line's heading level; lines without one are read
/// with `codec`, exactly as [`AttributeCodec::parse_line`] reads them.
pub struct SlideBoundaries<'a> {
    lines: &'a [&'a str],
    level: u8,
    map: Option<&'a AttributeMap>,
    codec: &'a AttributeCodec,
    cursor: usize,
    started: bool,
}

impl<'a> SlideBoundaries<'a> {
    pub fn new(
        lines: &'a [&'a str],
        level: u8,
        map: Option<&'a AttributeMap>,
        codec: &'a AttributeCodec,
    ) -> Self {
        Self {
            lines,
            level,
            map,
            codec,
            cursor: 0,
            started: false,
        }
    }

    fn starts_slide(&self, index: usize) -> bool {
        self.codec
            .resolve_heading_level(self.lines[index], index, self.map)
            .is_some_and(|level| level <= self.level)
    }

    fn next_heading(&self, from: usize) -> Option<usize> {
        (from..self.lines.len()).find(|&index| self.starts_slide(index))
    }
}

impl Iterator for SlideBoundaries<'_> {
    type Item = SlideSpan;

    fn next(&mut self) -> Option<SlideSpan> {
        if !self.started {
            self.started = true;
            let Some(first) = self.next_heading(0) else {
                self.cursor = self.lines.len();
                return Some(SlideSpan {
                    start: 0,
                    end: self.lines.len(),
                });
            };
            self.cursor = first;
            let preamble = &self.lines[..first];
            if preamble.iter().any(|line| !line.trim().is_empty()) {
                return Some(SlideSpan {
                    start: 0,
                    end: first,
                });
            }
        }

        if self.cursor >= self.lines.len() {
            return None;
        }

        let start = self.cursor;
        let end = self.next_heading(start + 1).unwrap_or(self.lines.len());
        self.cursor = end;
        Some(SlideSpan { start, end })
    }
}

/// Cuts documents into slides at a fixed heading level.
#[derive(Debug, Clone, Default)]
pub struct SlideSegmenter {
    level: SplitLevel,
    codec: AttributeCodec,
}

impl SlideSegmenter {
    pub fn new(level: SplitLevel) -> Self {
        Self {
            level,
            codec: AttributeCodec::new(),
        }
    }

    /// Use `codec` to decide whether a line already spells out its attribute.
    pub fn with_codec(mut self, codec: AttributeCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn level(&self) -> SplitLevel {
        self.level
    }

    /// Slide spans of `content`.
    pub fn spans(&self, content: &str, map: Option<&AttributeMap>) -> Vec<SlideSpan> {
        let lines: Vec<&str> = content.split('\n').collect();
        SlideBoundaries::new(&lines, self.level.get(), map, &self.codec).collect()
    }

    /// Slide texts, with map-only attributes written back into each line.
    pub fn split(&self, content: &str, map: Option<&AttributeMap>) -> Vec<String> {
        let lines: Vec<&str> = content.split('\n').collect();
        let slides: Vec<String> = SlideBoundaries::new(&lines, self.level.get(), map, &self.codec)
            .map(|span| self.slide_text(&lines, span, map))
            .collect();

        log::debug!(
            "Split {} lines into {} slides at level {}",
            lines.len(),
            slides.len(),
            self.level.get()
        );
        slides
    }

    /// 0-based start line of every slide, parallel to [`Self::split`].
    pub fn start_lines(&self, content: &str, map: Option<&AttributeMap>) -> Vec<usize> {
        self.spans(content, map)
            .into_iter()
            .map(|span| span.start)
            .collect()
    }

    /// Text of one span, self-describing without the map.
    pub(crate) fn slide_text(
        &self,
        lines: &[&str],
        span: SlideSpan,
        map: Option<&AttributeMap>,
    ) -> String {
        (span.start..span.end)
            .map(|index| self.codec.describe(lines[index], map.and_then(|m| m.get(index))))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Split `content` into slide texts at headings of level `<= level`.
pub fn split_slides_by_heading(content: &str, level: u8, map: Option<&AttributeMap>) -> Vec<String> {
    let lines: Vec<&str> = content.split('\n').collect();
    let segmenter = SlideSegmenter::default();
    SlideBoundaries::new(&lines, level, map, &segmenter.codec)
        .map(|span| segmenter.slide_text(&lines, span, map))
        .collect()
}

/// 0-based start line of each slide [`split_slides_by_heading`] returns.
pub fn get_slide_start_lines(content: &str, level: u8, map: Option<&AttributeMap>) -> Vec<usize> {
    let lines: Vec<&str> = content.split('\n').collect();
    let codec = AttributeCodec::new();
    SlideBoundaries::new(&lines, level, map, &codec)
        .map(|span| span.start)
        .collect()
}

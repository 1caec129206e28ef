//! Slide markup engine: line-attribute codec, slide segmentation, layout
//! classification, table of contents, grid annotation and content height
//! estimation.

pub mod attribute;
pub mod codec;
pub mod config;
pub mod error;
pub mod grid;
pub mod height;
pub mod layout;
pub mod markers;
pub mod render;
pub mod segment;
pub mod toc;
pub mod types;
pub mod validate;

pub use attribute::Attribute;
pub use codec::{
    content_to_lines, heading_depth, lines_to_content, parse_line, reconcile_attribute_map,
    AttributeCodec, AttributeMap, ParsedLine,
};
pub use config::{EngineConfig, SplitLevel};
pub use error::{Error, Result};
pub use grid::{
    parse_column_ratio, remove_column_ratio_from_line, split_content_by_h2,
    wrap_consecutive_h3_in_grid, ColumnRatio, H2Split,
};
pub use height::{
    estimate_content_height, inject_content_height_to_charts, ContentHeightEstimator,
    HeightWeights,
};
pub use layout::extract_slide_layout;
pub use render::{RenderedSlide, SlideDeck};
pub use segment::{get_slide_start_lines, split_slides_by_heading, SlideSegmenter, SlideSpan};
pub use toc::{extract_section_headings, generate_table_of_contents};
pub use types::{
    Alignment, ColumnSpec, EditorLine, LayoutVariant, LineId, RatioError, Section, Slide,
};
pub use validate::{validate_document, Diagnostic};

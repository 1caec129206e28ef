//! WASM bindings for the slide markup engine.
//!
//! This crate exposes segmentation, rendering and validation to the browser
//! editor. Attribute maps cross the boundary as JS `Map`s keyed by line index
//! and are reconciled against the document before use; configurations cross
//! as plain objects (missing fields take their defaults).

use serde::Serialize;
use slidemark_core::{
    content_to_lines, extract_section_headings, generate_table_of_contents, lines_to_content,
    validate_document, AttributeMap, Diagnostic, EditorLine, EngineConfig, RenderedSlide, Slide,
    SlideDeck, SplitLevel,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Result of splitting a document.
#[derive(Debug, Serialize)]
pub struct SplitResult {
    /// Slides in document order.
    pub slides: Vec<Slide>,
    /// Start line of each slide, parallel to `slides`.
    pub start_lines: Vec<usize>,
    /// Generated table of contents for agenda slides.
    pub table_of_contents: String,
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn decode_map(value: JsValue) -> Result<Option<AttributeMap>, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(value)
        .map(Some)
        .map_err(|e| JsValue::from_str(&format!("Invalid attribute map: {}", e)))
}

fn decode_config(value: JsValue) -> Result<EngineConfig, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(EngineConfig::default());
    }
    let config: EngineConfig = serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
    config
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(config)
}

/// Reconcile a saved map, if any, against `content`.
fn reconciled(
    content: &str,
    config: &EngineConfig,
    saved: Option<AttributeMap>,
) -> Option<AttributeMap> {
    saved.map(|saved| config.codec().reconcile(content, &saved))
}

/// Split a document into slides.
///
/// # Arguments
/// * `content` - The raw document text
/// * `level` - Heading level that starts a slide (1-3)
/// * `attribute_map` - Optional saved attribute map (`Map<number, string>`)
#[wasm_bindgen]
pub fn split_slides(content: &str, level: u8, attribute_map: JsValue) -> Result<JsValue, JsValue> {
    let map = decode_map(attribute_map)?;
    let result = split_slides_impl(content, level, map.as_ref()).map_err(|e| JsValue::from_str(&e))?;
    to_js(&result)
}

fn split_slides_impl(
    content: &str,
    level: u8,
    map: Option<&AttributeMap>,
) -> Result<SplitResult, String> {
    let level = SplitLevel::new(level).map_err(|e| e.to_string())?;
    let config = EngineConfig::default().with_split_level(level);
    let map = reconciled(content, &config, map.cloned());
    let deck = SlideDeck::build(content, &config, map.as_ref());

    Ok(SplitResult {
        start_lines: deck.start_lines(),
        table_of_contents: deck.table_of_contents(),
        slides: deck.slides().to_vec(),
    })
}

/// Start line of every slide, for jump-to-slide navigation.
#[wasm_bindgen]
pub fn slide_start_lines(
    content: &str,
    level: u8,
    attribute_map: JsValue,
) -> Result<Vec<u32>, JsValue> {
    let map = decode_map(attribute_map)?;
    let result = split_slides_impl(content, level, map.as_ref()).map_err(|e| JsValue::from_str(&e))?;
    Ok(result.start_lines.into_iter().map(|line| line as u32).collect())
}

/// A fully rendered deck.
#[derive(Debug, Serialize)]
pub struct DeckResult {
    pub slides: Vec<Slide>,
    pub start_lines: Vec<usize>,
    pub table_of_contents: String,
    pub rendered: Vec<RenderedSlide>,
}

/// Segment, classify and render a whole document in one call.
///
/// # Returns
/// A JavaScript object with `slides`, `start_lines`, `table_of_contents` and
/// `rendered` (one entry per slide).
#[wasm_bindgen]
pub fn build_deck(content: &str, config: JsValue, attribute_map: JsValue) -> Result<JsValue, JsValue> {
    let config = decode_config(config)?;
    let map = decode_map(attribute_map)?;
    to_js(&build_deck_impl(content, &config, map.as_ref()))
}

fn build_deck_impl(content: &str, config: &EngineConfig, map: Option<&AttributeMap>) -> DeckResult {
    let map = reconciled(content, config, map.cloned());
    let deck = SlideDeck::build(content, config, map.as_ref());
    DeckResult {
        slides: deck.slides().to_vec(),
        start_lines: deck.start_lines(),
        table_of_contents: deck.table_of_contents(),
        rendered: deck.render_all(),
    }
}

/// Render one slide's annotated markup.
///
/// # Returns
/// A JavaScript object with `index`, `layout`, `markup` and `ratio_errors`.
#[wasm_bindgen]
pub fn render_slide(
    content: &str,
    index: usize,
    config: JsValue,
    attribute_map: JsValue,
) -> Result<JsValue, JsValue> {
    let config = decode_config(config)?;
    let map = decode_map(attribute_map)?;
    let rendered =
        render_slide_impl(content, index, &config, map.as_ref()).map_err(|e| JsValue::from_str(&e))?;
    to_js(&rendered)
}

fn render_slide_impl(
    content: &str,
    index: usize,
    config: &EngineConfig,
    map: Option<&AttributeMap>,
) -> Result<RenderedSlide, String> {
    let map = reconciled(content, config, map.cloned());
    let deck = SlideDeck::build(content, config, map.as_ref());
    deck.render_slide(index)
        .ok_or_else(|| format!("Slide {} out of range ({} slides)", index, deck.len()))
}

/// Parse a document into editor lines.
#[wasm_bindgen(js_name = content_to_lines)]
pub fn content_to_lines_js(content: &str) -> Result<JsValue, JsValue> {
    to_js(&content_to_lines(content))
}

/// Serialize editor lines back to document text.
#[wasm_bindgen(js_name = lines_to_content)]
pub fn lines_to_content_js(lines: JsValue) -> Result<String, JsValue> {
    let lines: Vec<EditorLine> = serde_wasm_bindgen::from_value(lines)
        .map_err(|e| JsValue::from_str(&format!("Invalid lines array: {}", e)))?;
    Ok(lines_to_content(&lines))
}

/// Reconcile a saved attribute map against the current document text.
#[wasm_bindgen(js_name = reconcile_attribute_map)]
pub fn reconcile_attribute_map_js(content: &str, saved: JsValue) -> Result<JsValue, JsValue> {
    let saved = decode_map(saved)?.unwrap_or_default();
    to_js(&reconcile_impl(content, &saved))
}

fn reconcile_impl(content: &str, saved: &AttributeMap) -> AttributeMap {
    EngineConfig::default().codec().reconcile(content, saved)
}

/// Table of contents of the whole document as a nested Markdown list.
#[wasm_bindgen]
pub fn table_of_contents(
    content: &str,
    max_level: u8,
    attribute_map: JsValue,
) -> Result<String, JsValue> {
    let map = decode_map(attribute_map)?;
    Ok(table_of_contents_impl(content, max_level, map))
}

fn table_of_contents_impl(content: &str, max_level: u8, map: Option<AttributeMap>) -> String {
    let map = reconciled(content, &EngineConfig::default(), map);
    generate_table_of_contents(&extract_section_headings(content, max_level, map.as_ref()))
}

/// Diagnostics for the validation panel.
#[wasm_bindgen]
pub fn validate(content: &str, config: JsValue, attribute_map: JsValue) -> Result<JsValue, JsValue> {
    let config = decode_config(config)?;
    let map = decode_map(attribute_map)?;
    to_js(&validate_impl(content, &config, map))
}

fn validate_impl(content: &str, config: &EngineConfig, map: Option<AttributeMap>) -> Vec<Diagnostic> {
    let map = reconciled(content, config, map);
    validate_document(content, config, map.as_ref())
}

use mdembed_core::{ParseOptions, ScanMatch};
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

// ============================================================================
// Render Config
// ============================================================================

/// Configuration accepted by `render_markdown`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WasmRenderConfig {
    #[serde(default)]
    pub gfm: Option<bool>,
    #[serde(default, alias = "allowRawHtml")]
    pub allow_raw_html: Option<bool>,
    #[serde(default, alias = "enableEmbeds")]
    pub embeds: Option<bool>,
}

fn parse_config(config: JsValue) -> Result<WasmRenderConfig, JsError> {
    if config.is_undefined() || config.is_null() {
        return Ok(WasmRenderConfig::default());
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))
}

/// Map the JS config onto core options; missing fields keep the defaults.
pub fn build_parse_options(cfg: &WasmRenderConfig) -> ParseOptions {
    let defaults = ParseOptions::markdown();
    ParseOptions {
        gfm: cfg.gfm.unwrap_or(defaults.gfm),
        raw_html: cfg.allow_raw_html.unwrap_or(defaults.raw_html),
        embeds: cfg.embeds.unwrap_or(defaults.embeds),
        ..defaults
    }
}

// ============================================================================
// Scan API Types
// ============================================================================

/// One source of a scanned directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEntry {
    pub mime_type: String,
    pub url: String,
}

/// A scanned directive as seen from JavaScript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Bytes covered by the directive, closing `)` included.
    pub consumed: usize,
    pub entries: Vec<ScanEntry>,
}

impl ScanResult {
    /// Convert a core match; invalid UTF-8 is replaced lossily.
    pub fn from_match(found: &ScanMatch) -> Self {
        Self {
            consumed: found.consumed,
            entries: found
                .directive
                .iter()
                .map(|entry| ScanEntry {
                    mime_type: String::from_utf8_lossy(&entry.mime_type).into_owned(),
                    url: String::from_utf8_lossy(&entry.url).into_owned(),
                })
                .collect(),
        }
    }
}

/// Scan `line` and convert the result, `None` when there is no directive.
pub fn scan_line(line: &str) -> Option<ScanResult> {
    mdembed_core::scan_embed(line.as_bytes()).map(|found| ScanResult::from_match(&found))
}

// ============================================================================
// Exports
// ============================================================================

/// Renders markdown to HTML, expanding `![](mime url ...)` embeds.
///
/// # Arguments
///
/// * `source` - The markdown text
/// * `config` - Optional `{ gfm, allowRawHtml, embeds }` object
#[wasm_bindgen(js_name = render_markdown)]
pub fn render_markdown(source: &str, config: JsValue) -> Result<String, JsError> {
    let cfg = parse_config(config)?;
    let options = build_parse_options(&cfg);
    mdembed_core::render_html(source, &options).map_err(|e| JsError::new(&e.to_string()))
}

/// Scans a single directive at the start of `line`.
///
/// Returns `null` when the line does not start with a valid directive, or
/// `{ consumed, entries: [{ mimeType, url }] }`.
#[wasm_bindgen(js_name = scan_directive)]
pub fn scan_directive(line: &str) -> Result<JsValue, JsError> {
    match scan_line(line) {
        Some(result) => serde_wasm_bindgen::to_value(&result)
            .map_err(|e| JsError::new(&format!("Serialization error: {}", e))),
        None => Ok(JsValue::NULL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_keeps_defaults() {
        let options = build_parse_options(&WasmRenderConfig::default());
        assert_eq!(options, ParseOptions::markdown());
    }

    #[test]
    fn config_overrides_fields() {
        let cfg: WasmRenderConfig =
            serde_json::from_str(r#"{"allowRawHtml": true, "enableEmbeds": false}"#).unwrap();
        let options = build_parse_options(&cfg);
        assert!(options.raw_html);
        assert!(!options.embeds);
        assert!(options.gfm);
    }

    #[test]
    fn scan_result_uses_camel_case() {
        let result = scan_line("![](video/mp4 a.mp4) rest").unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "consumed": 20,
                "entries": [{ "mimeType": "video/mp4", "url": "a.mp4" }]
            })
        );
    }

    #[test]
    fn scan_line_without_directive() {
        assert_eq!(scan_line("plain text"), None);
        assert_eq!(scan_line("![]()"), None);
    }
}

//! Result normalizer — pulls the artifact URL out of a provider's success payload.
//!
//! Shapes are tried in a fixed order and the first non-empty match wins:
//!
//! 1. `resultJson.resultUrls[0]` (`resultJson` may be a JSON-encoded string)
//! 2. `response.resultUrls[0]`
//! 3. `images[0].url`
//! 4. `data[0].url`, or `data[0]` as a plain string
//! 5. `output_url`
//! 6. `result.url`
//! 7. the payload itself as a string
//! 8. Gemini `candidates[0].content.parts[*]`: `fileData.fileUri`, or
//!    `inlineData` rendered as a `data:` URL
//!
//! Anything else is a `malformedResponse` carrying the raw payload.

use serde_json::Value;
use tracing::debug;

use mediagen_core::types::GenerationError;

use crate::classify;

/// Extract the artifact URL from a success payload.
pub fn extract_artifact_url(payload: &Value) -> Result<String, GenerationError> {
    let found = result_json(payload)
        .or_else(|| first_of(payload.pointer("/response/resultUrls")))
        .or_else(|| payload.pointer("/images/0/url").and_then(non_empty))
        .or_else(|| first_of(payload.get("data")))
        .or_else(|| payload.get("output_url").and_then(non_empty))
        .or_else(|| payload.pointer("/result/url").and_then(non_empty))
        .or_else(|| non_empty(payload))
        .or_else(|| gemini_part(payload));

    match found {
        Some(url) => {
            debug!(url = %mediagen_core::utils::preview(&url, 80), "artifact URL extracted");
            Ok(url)
        }
        None => Err(classify::malformed(
            "no artifact URL found in provider response",
            payload,
        )),
    }
}

/// `resultJson.resultUrls[0]`, decoding `resultJson` when it is a string.
fn result_json(payload: &Value) -> Option<String> {
    let field = payload.get("resultJson")?;
    match field {
        Value::String(s) => {
            let decoded: Value = serde_json::from_str(s).ok()?;
            first_of(decoded.get("resultUrls"))
        }
        other => first_of(other.get("resultUrls")),
    }
}

/// First element of an array, either a URL string or an object with `url`.
fn first_of(list: Option<&Value>) -> Option<String> {
    let first = list?.as_array()?.first()?;
    non_empty(first).or_else(|| first.get("url").and_then(non_empty))
}

fn non_empty(v: &Value) -> Option<String> {
    v.as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Gemini `generateContent` output parts.
fn gemini_part(payload: &Value) -> Option<String> {
    let parts = payload.pointer("/candidates/0/content/parts")?.as_array()?;
    parts.iter().find_map(|part| {
        if let Some(uri) = part.pointer("/fileData/fileUri").and_then(non_empty) {
            return Some(uri);
        }
        let inline = part.get("inlineData")?;
        let data = inline.get("data").and_then(non_empty)?;
        let mime = inline
            .get("mimeType")
            .and_then(Value::as_str)
            .unwrap_or("image/png");
        Some(format!("data:{mime};base64,{data}"))
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

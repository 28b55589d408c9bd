//! Payload builder — turns a `GenerationRequest` into a provider-native body.
//!
//! One builder per [`PayloadStyle`]; per-model differences come from the
//! descriptor's [`WireFields`]. Unsupported option values are clamped to the
//! descriptor's first supported value instead of failing. Only input that no
//! clamping can repair (missing required images, too many images, empty
//! prompt, wrong kind) is rejected, and always before any network call.

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use mediagen_core::types::{GenerationError, GenerationRequest, Provider};
use mediagen_core::utils::truncate_chars;

use crate::registry::{
    supports_feature, Feature, ImageField, ModelDescriptor, PayloadStyle,
};

/// A ready-to-submit request body plus the routing copied from its descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltPayload {
    pub provider: Provider,
    pub style: PayloadStyle,
    pub endpoint: &'static str,
    pub status_endpoint: Option<&'static str>,
    pub model_id: &'static str,
    pub body: Value,
    /// Video duration actually requested, in seconds.
    pub duration: Option<u32>,
}

// ─────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────

/// Reject requests no clamping can repair.
pub fn validate(request: &GenerationRequest, descriptor: &ModelDescriptor) -> Result<(), GenerationError> {
    if request.prompt.trim().is_empty() {
        return Err(GenerationError::validation("prompt must not be empty"));
    }

    if request.kind != descriptor.kind {
        return Err(GenerationError::validation(format!(
            "model '{}' generates {}, but a {} was requested",
            descriptor.key, descriptor.kind, request.kind
        )));
    }

    if request.image_urls.iter().any(|u| u.trim().is_empty()) {
        return Err(GenerationError::validation("reference image URLs must not be empty"));
    }

    let count = request.image_urls.len();
    if !supports_feature(descriptor, Feature::ReferenceImages(count)) {
        return Err(GenerationError::validation(format!(
            "model '{}' accepts at most {} reference image(s), got {}",
            descriptor.key, descriptor.max_reference_images, count
        )));
    }

    if descriptor.requires_image_input && count == 0 {
        return Err(GenerationError::validation(format!(
            "model '{}' requires at least one reference image",
            descriptor.key
        )));
    }

    Ok(())
}

// ─────────────────────────────────────────────
// Clamping
// ─────────────────────────────────────────────

/// Pick `value` if supported, else the first supported value. `None` if nothing is supported.
fn clamp_choice(
    value: Option<&str>,
    supported: &'static [&'static str],
    option: &str,
    model: &str,
) -> Option<&'static str> {
    let first = *supported.first()?;
    match value.filter(|v| !v.is_empty()) {
        Some(v) => match supported.iter().find(|s| **s == v) {
            Some(found) => Some(*found),
            None => {
                debug!(model, option, requested = v, clamped = first, "clamping unsupported value");
                Some(first)
            }
        },
        None => Some(first),
    }
}

fn clamp_duration(value: Option<u32>, descriptor: &ModelDescriptor) -> Option<u32> {
    let first = *descriptor.durations.first()?;
    match value {
        Some(v) if supports_feature(descriptor, Feature::Duration(v)) => Some(v),
        Some(v) => {
            debug!(model = descriptor.key, requested = v, clamped = first, "clamping unsupported duration");
            Some(first)
        }
        None => Some(first),
    }
}

fn clamp_prompt(prompt: &str, descriptor: &ModelDescriptor) -> String {
    let prompt = prompt.trim();
    if prompt.chars().count() > descriptor.max_prompt_len {
        debug!(model = descriptor.key, limit = descriptor.max_prompt_len, "truncating prompt");
    }
    truncate_chars(prompt, descriptor.max_prompt_len)
}

fn aspect_ratio(request: &GenerationRequest, descriptor: &ModelDescriptor) -> &'static str {
    clamp_choice(
        Some(request.aspect_ratio.as_str()),
        descriptor.aspect_ratios,
        "aspect_ratio",
        descriptor.key,
    )
    // Every descriptor declares at least one aspect ratio.
    .unwrap_or("1:1")
}

fn tail_image<'r>(request: &'r GenerationRequest, descriptor: &ModelDescriptor) -> Option<&'r str> {
    let tail = request.tail_image_url.as_deref().filter(|t| !t.is_empty())?;
    if supports_feature(descriptor, Feature::TailImage) {
        Some(tail)
    } else {
        warn!(model = descriptor.key, "model has no tail-image support, dropping tail image");
        None
    }
}

fn storyboard<'r>(request: &'r GenerationRequest, descriptor: &ModelDescriptor) -> Option<&'r [String]> {
    if request.storyboard.is_empty() {
        return None;
    }
    if supports_feature(descriptor, Feature::Storyboard) {
        Some(&request.storyboard)
    } else {
        warn!(model = descriptor.key, frames = request.storyboard.len(), "model has no storyboard support, dropping storyboard");
        None
    }
}

// ─────────────────────────────────────────────
// Builders
// ─────────────────────────────────────────────

/// Validate, clamp, and build the provider body for `request`.
///
/// `descriptor` must come from the registry (see `registry::lookup_or_default`).
pub fn build_payload(
    request: &GenerationRequest,
    descriptor: &'static ModelDescriptor,
) -> Result<BuiltPayload, GenerationError> {
    validate(request, descriptor)?;

    let model_id = descriptor.wire_model_id(request.has_images());
    let duration = clamp_duration(request.duration, descriptor);

    let body = match descriptor.style {
        PayloadStyle::KieTask => build_kie_task(request, descriptor, model_id, duration),
        PayloadStyle::KieVeo => build_kie_veo(request, descriptor, model_id),
        PayloadStyle::GeminiDirect => build_gemini(request, descriptor),
    };

    debug!(
        model = descriptor.key,
        model_id,
        style = ?descriptor.style,
        images = request.image_urls.len(),
        "payload built"
    );

    Ok(BuiltPayload {
        provider: descriptor.provider,
        style: descriptor.style,
        endpoint: descriptor.endpoint,
        status_endpoint: descriptor.status_endpoint,
        model_id,
        body,
        duration,
    })
}

/// KIE `jobs/createTask`: `{model, input: {...}}`.
fn build_kie_task(
    request: &GenerationRequest,
    d: &ModelDescriptor,
    model_id: &str,
    duration: Option<u32>,
) -> Value {
    let f = &d.fields;
    let mut input = Map::new();
    input.insert("prompt".into(), json!(clamp_prompt(&request.prompt, d)));

    if let Some(key) = f.aspect {
        let ratio = aspect_ratio(request, d);
        let value = f
            .aspect_aliases
            .iter()
            .find(|(from, _)| *from == ratio)
            .map_or(ratio, |(_, to)| *to);
        input.insert(key.into(), json!(value));
    }

    if let Some(key) = f.resolution {
        if let Some(res) = clamp_choice(request.resolution.as_deref(), d.resolutions, "resolution", d.key) {
            input.insert(key.into(), json!(res));
        }
    }

    if let (Some(key), Some(secs)) = (f.duration, duration) {
        input.insert(key.into(), json!(secs.to_string()));
    }

    match f.images {
        Some(ImageField::List(key)) if request.has_images() => {
            input.insert(key.into(), json!(request.image_urls));
        }
        Some(ImageField::Single(key)) => {
            if let Some(first) = request.image_urls.first() {
                input.insert(key.into(), json!(first));
            }
        }
        _ => {}
    }

    if let Some(tail) = tail_image(request, d) {
        if let Some(key) = f.tail_image {
            input.insert(key.into(), json!(tail));
        }
    }

    if let Some(frames) = storyboard(request, d) {
        if let Some(key) = f.storyboard {
            input.insert(key.into(), json!(frames));
        }
    }

    if let (Some(key), Some(neg)) = (f.negative_prompt, request.negative_prompt.as_deref()) {
        if !neg.trim().is_empty() {
            input.insert(key.into(), json!(neg.trim()));
        }
    }
    if let (Some(key), Some(seed)) = (f.seed, request.seed) {
        input.insert(key.into(), json!(seed));
    }
    if let (Some(key), Some(steps)) = (f.steps, request.steps) {
        input.insert(key.into(), json!(steps));
    }
    if let (Some(key), Some(guidance)) = (f.guidance, request.guidance) {
        input.insert(key.into(), json!(guidance));
    }

    for (key, value) in f.constants {
        input.insert((*key).into(), json!(value));
    }

    json!({
        "model": model_id,
        "input": Value::Object(input),
    })
}

/// Veo accepts 5-digit seeds only.
const VEO_SEED_RANGE: std::ops::RangeInclusive<u64> = 10_000..=99_999;

/// KIE Veo: `{prompt, model, aspectRatio, imageUrls?, generationType, seeds?}`.
///
/// Reference images and the tail frame share `imageUrls`; the tail goes last.
fn build_kie_veo(request: &GenerationRequest, d: &ModelDescriptor, model_id: &str) -> Value {
    let mut images: Vec<&str> = request.image_urls.iter().map(String::as_str).collect();
    let mut tail_used = false;
    if let Some(tail) = tail_image(request, d) {
        if images.len() < d.max_reference_images {
            images.push(tail);
            tail_used = true;
        } else {
            warn!(model = d.key, "no room for tail image alongside reference images, dropping it");
        }
    }

    let generation_type = match (images.len(), tail_used) {
        (0, _) => "TEXT_2_VIDEO",
        (n, false) if n > 2 => "REFERENCE_2_VIDEO",
        _ => "FIRST_AND_LAST_FRAMES_2_VIDEO",
    };

    let mut body = json!({
        "prompt": clamp_prompt(&request.prompt, d),
        "model": model_id,
        "aspectRatio": aspect_ratio(request, d),
        "generationType": generation_type,
        "enableTranslation": true,
    });

    if !images.is_empty() {
        body["imageUrls"] = json!(images);
    }
    if let Some(seed) = request.seed {
        if VEO_SEED_RANGE.contains(&seed) {
            body["seeds"] = json!(seed);
        } else {
            debug!(model = d.key, seed, "seed outside Veo range, omitting");
        }
    }

    body
}

/// Gemini `generateContent`: text part plus one `fileData` part per reference image.
fn build_gemini(request: &GenerationRequest, d: &ModelDescriptor) -> Value {
    let mut parts = vec![json!({ "text": clamp_prompt(&request.prompt, d) })];
    for url in &request.image_urls {
        parts.push(json!({
            "fileData": { "mimeType": guess_image_mime(url), "fileUri": url }
        }));
    }

    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "responseModalities": ["IMAGE"],
            "imageConfig": { "aspectRatio": aspect_ratio(request, d) }
        }
    })
}

/// Guess an image MIME type from a URL's extension.
fn guess_image_mime(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else if path.ends_with(".gif") {
        "image/gif"
    } else {
        "image/png"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{lookup, MODELS};
    use mediagen_core::types::{ErrorKind, GenerationKind};

    fn image_request(model: &str) -> GenerationRequest {
        GenerationRequest::image(model, "a lighthouse at dusk")
    }

    fn video_request(model: &str) -> GenerationRequest {
        GenerationRequest::video(model, "waves crashing in slow motion")
    }

    fn request_for(d: &ModelDescriptor) -> GenerationRequest {
        let req = match d.kind {
            GenerationKind::Image => image_request(d.key),
            GenerationKind::Video => video_request(d.key),
        };
        if d.requires_image_input {
            req.with_images(["https://cdn.example/ref.png"])
        } else {
            req
        }
    }

    /// Aspect value as it appears on the wire, whatever the style.
    fn wire_aspect(d: &ModelDescriptor, body: &Value) -> Option<String> {
        let v = match d.style {
            PayloadStyle::KieTask => body["input"][d.fields.aspect?].clone(),
            PayloadStyle::KieVeo => body["aspectRatio"].clone(),
            PayloadStyle::GeminiDirect => body["generationConfig"]["imageConfig"]["aspectRatio"].clone(),
        };
        v.as_str().map(String::from)
    }

    #[test]
    fn test_unsupported_aspect_is_clamped_for_every_model() {
        for d in MODELS {
            let req = request_for(d).with_aspect_ratio("7:3");
            let built = build_payload(&req, d).unwrap();
            if let Some(sent) = wire_aspect(d, &built.body) {
                let canonical = d
                    .fields
                    .aspect_aliases
                    .iter()
                    .find(|(_, to)| *to == sent)
                    .map_or(sent.as_str(), |(from, _)| *from);
                assert!(
                    d.aspect_ratios.contains(&canonical),
                    "{}: {} not in supported set",
                    d.key,
                    sent
                );
            }
        }
    }

    #[test]
    fn test_supported_aspect_is_kept() {
        let d = lookup("nano-banana-pro").unwrap();
        let built = build_payload(&image_request(d.key).with_aspect_ratio("21:9"), d).unwrap();
        assert_eq!(built.body["input"]["aspect_ratio"], "21:9");
        assert_eq!(built.body["model"], "nano-banana-pro");
        assert_eq!(built.endpoint, "/api/v1/jobs/createTask");
    }

    #[test]
    fn test_missing_options_use_first_supported() {
        let d = lookup("nano-banana-pro").unwrap();
        let built = build_payload(&image_request(d.key), d).unwrap();
        assert_eq!(built.body["input"]["aspect_ratio"], "1:1");
        assert_eq!(built.body["input"]["resolution"], "1K");
        assert_eq!(built.body["input"]["output_format"], "png");
        assert!(built.body["input"].get("image_input").is_none());
    }

    #[test]
    fn test_unsupported_resolution_clamped() {
        let d = lookup("flux-2-pro").unwrap();
        let mut req = image_request(d.key);
        req.resolution = Some("8K".into());
        let built = build_payload(&req, d).unwrap();
        assert_eq!(built.body["input"]["resolution"], "1K");
    }

    #[test]
    fn test_requires_image_without_images_is_validation_error() {
        for key in ["kling-2-6-i2v", "kling-2-1-pro", "hailuo-2-3"] {
            let d = lookup(key).unwrap();
            let err = build_payload(&video_request(key), d).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{key}");
            assert!(err.message.contains("requires"));
        }
    }

    #[test]
    fn test_too_many_images_is_validation_error() {
        let d = lookup("kling-2-6").unwrap();
        let req = video_request(d.key).with_images(["https://x/1.png", "https://x/2.png"]);
        let err = build_payload(&req, d).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("at most 1"));
    }

    #[test]
    fn test_empty_prompt_is_validation_error() {
        let d = lookup("nano-banana").unwrap();
        let err = build_payload(&GenerationRequest::image(d.key, "   "), d).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_kind_mismatch_is_validation_error() {
        let d = lookup("veo-3-1").unwrap();
        let err = build_payload(&image_request(d.key), d).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("video"));
    }

    #[test]
    fn test_prompt_truncated_to_ceiling() {
        let d = lookup("hailuo-2-3").unwrap();
        let long = "x".repeat(d.max_prompt_len + 500);
        let req = GenerationRequest::video(d.key, long).with_images(["https://x/a.png"]);
        let built = build_payload(&req, d).unwrap();
        let sent = built.body["input"]["prompt"].as_str().unwrap();
        assert_eq!(sent.chars().count(), d.max_prompt_len);
    }

    #[test]
    fn test_image_variant_model_id() {
        let d = lookup("nano-banana").unwrap();
        let built = build_payload(&image_request(d.key).with_images(["https://x/a.png"]), d).unwrap();
        assert_eq!(built.model_id, "google/nano-banana-edit");
        assert_eq!(built.body["model"], "google/nano-banana-edit");
        assert_eq!(built.body["input"]["image_urls"][0], "https://x/a.png");
        assert_eq!(built.body["input"]["image_size"], "1:1");
    }

    #[test]
    fn test_single_image_field_and_tail() {
        let d = lookup("kling-2-1-pro").unwrap();
        let mut req = video_request(d.key).with_images(["https://x/first.png"]);
        req.tail_image_url = Some("https://x/last.png".into());
        req.duration = Some(10);
        req.guidance = Some(0.5);
        req.negative_prompt = Some("blurry".into());
        let built = build_payload(&req, d).unwrap();
        let input = &built.body["input"];
        assert_eq!(input["image_url"], "https://x/first.png");
        assert_eq!(input["tail_image_url"], "https://x/last.png");
        assert_eq!(input["duration"], "10");
        assert_eq!(input["cfg_scale"], 0.5);
        assert_eq!(input["negative_prompt"], "blurry");
        assert_eq!(built.duration, Some(10));
    }

    #[test]
    fn test_tail_image_dropped_when_unsupported() {
        let d = lookup("kling-2-6-i2v").unwrap();
        let mut req = video_request(d.key).with_images(["https://x/first.png"]);
        req.tail_image_url = Some("https://x/last.png".into());
        let built = build_payload(&req, d).unwrap();
        assert!(!built.body.to_string().contains("last.png"));
    }

    #[test]
    fn test_unsupported_duration_clamped() {
        let d = lookup("wan-2-6").unwrap();
        let mut req = video_request(d.key);
        req.duration = Some(7);
        let built = build_payload(&req, d).unwrap();
        assert_eq!(built.body["input"]["duration"], "5");
        assert_eq!(built.duration, Some(5));
    }

    #[test]
    fn test_storyboard_and_aspect_alias() {
        let d = lookup("sora-2-storyboard").unwrap();
        let mut req = video_request(d.key).with_aspect_ratio("9:16");
        req.storyboard = vec!["https://x/s1.png".into(), "https://x/s2.png".into()];
        let built = build_payload(&req, d).unwrap();
        let input = &built.body["input"];
        assert_eq!(input["aspect_ratio"], "portrait");
        assert_eq!(input["storyboard_images"][1], "https://x/s2.png");
        assert_eq!(input["n_frames"], "10");
    }

    #[test]
    fn test_storyboard_dropped_when_unsupported() {
        let d = lookup("wan-2-6").unwrap();
        let mut req = video_request(d.key);
        req.storyboard = vec!["https://x/s1.png".into()];
        let built = build_payload(&req, d).unwrap();
        assert!(!built.body.to_string().contains("s1.png"));
    }

    #[test]
    fn test_veo_text_to_video() {
        let d = lookup("veo-3-1-fast").unwrap();
        let built = build_payload(&video_request(d.key).with_aspect_ratio("9:16"), d).unwrap();
        assert_eq!(built.endpoint, "/api/v1/veo/generate");
        assert_eq!(built.body["model"], "veo3_fast");
        assert_eq!(built.body["aspectRatio"], "9:16");
        assert_eq!(built.body["generationType"], "TEXT_2_VIDEO");
        assert!(built.body.get("imageUrls").is_none());
        assert_eq!(built.duration, Some(8));
    }

    #[test]
    fn test_veo_first_and_last_frames() {
        let d = lookup("veo-3-1").unwrap();
        let mut req = video_request(d.key).with_images(["https://x/first.png"]);
        req.tail_image_url = Some("https://x/last.png".into());
        let built = build_payload(&req, d).unwrap();
        assert_eq!(built.body["generationType"], "FIRST_AND_LAST_FRAMES_2_VIDEO");
        assert_eq!(built.body["imageUrls"], json!(["https://x/first.png", "https://x/last.png"]));
    }

    #[test]
    fn test_veo_reference_images() {
        let d = lookup("veo-3-1-fast").unwrap();
        let req = video_request(d.key).with_images(["https://x/1.png", "https://x/2.png", "https://x/3.png"]);
        let built = build_payload(&req, d).unwrap();
        assert_eq!(built.body["generationType"], "REFERENCE_2_VIDEO");
    }

    #[test]
    fn test_veo_dropped_tail_keeps_reference_mode() {
        let d = lookup("veo-3-1-fast").unwrap();
        let mut req = video_request(d.key).with_images(["https://x/1.png", "https://x/2.png", "https://x/3.png"]);
        req.tail_image_url = Some("https://x/last.png".into());
        let built = build_payload(&req, d).unwrap();
        assert_eq!(built.body["generationType"], "REFERENCE_2_VIDEO");
        assert_eq!(
            built.body["imageUrls"],
            json!(["https://x/1.png", "https://x/2.png", "https://x/3.png"])
        );
    }

    #[test]
    fn test_veo_seed_range() {
        let d = lookup("veo-3-1-fast").unwrap();
        let mut req = video_request(d.key);
        req.seed = Some(12345);
        assert_eq!(build_payload(&req, d).unwrap().body["seeds"], 12345);
        req.seed = Some(7);
        assert!(build_payload(&req, d).unwrap().body.get("seeds").is_none());
    }

    #[test]
    fn test_gemini_body() {
        let d = lookup("gemini-2-5-flash-image").unwrap();
        let req = image_request(d.key)
            .with_aspect_ratio("16:9")
            .with_images(["https://x/ref.JPG?sig=abc"]);
        let built = build_payload(&req, d).unwrap();
        assert!(built.status_endpoint.is_none());
        assert_eq!(built.provider, Provider::Gemini);
        let parts = &built.body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "a lighthouse at dusk");
        assert_eq!(parts[1]["fileData"]["mimeType"], "image/jpeg");
        assert_eq!(built.body["generationConfig"]["imageConfig"]["aspectRatio"], "16:9");
    }

    #[test]
    fn test_build_is_deterministic() {
        let d = lookup("seedream-4-5").unwrap();
        let mut req = image_request(d.key).with_aspect_ratio("4:3");
        req.seed = Some(99);
        assert_eq!(build_payload(&req, d).unwrap(), build_payload(&req, d).unwrap());
    }
}

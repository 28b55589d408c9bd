//! Model registry — static descriptors for every supported generation model.
//!
//! Each `ModelDescriptor` describes how to reach one logical model:
//! provider, wire model id, endpoints, supported option values, and the
//! wire field names its payload style needs. The table is `'static` and
//! never mutated; lookups are pure.

use tracing::warn;

use mediagen_core::types::{GenerationKind, Provider};

// ─────────────────────────────────────────────
// Endpoints
// ─────────────────────────────────────────────

pub const KIE_CREATE_TASK: &str = "/api/v1/jobs/createTask";
pub const KIE_RECORD_INFO: &str = "/api/v1/jobs/recordInfo";
pub const KIE_VEO_GENERATE: &str = "/api/v1/veo/generate";
pub const KIE_VEO_RECORD_INFO: &str = "/api/v1/veo/record-info";

/// Used when the configured default image model is itself unknown.
pub const BUILTIN_DEFAULT_IMAGE_MODEL: &str = "nano-banana-pro";
/// Used when the configured default video model is itself unknown.
pub const BUILTIN_DEFAULT_VIDEO_MODEL: &str = "kling-2-6";

// ─────────────────────────────────────────────
// Descriptor types
// ─────────────────────────────────────────────

/// Request-shape family. One payload builder exists per style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadStyle {
    /// KIE `jobs/createTask`: `{model, input: {...}}`.
    KieTask,
    /// KIE Veo: flat `{prompt, model, aspectRatio, imageUrls, generationType}`.
    KieVeo,
    /// Gemini `generateContent`, answered synchronously.
    GeminiDirect,
}

/// How reference images are placed in a `KieTask` input object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageField {
    /// Array of URLs under this key.
    List(&'static str),
    /// Single URL under this key.
    Single(&'static str),
}

/// Per-model wire field names. `None` means the model does not accept the option.
#[derive(Clone, Copy, Debug)]
pub struct WireFields {
    pub aspect: Option<&'static str>,
    /// Aspect ratio → provider-specific value (e.g. `"16:9"` → `"landscape"`).
    pub aspect_aliases: &'static [(&'static str, &'static str)],
    pub resolution: Option<&'static str>,
    pub duration: Option<&'static str>,
    pub images: Option<ImageField>,
    pub tail_image: Option<&'static str>,
    pub storyboard: Option<&'static str>,
    pub negative_prompt: Option<&'static str>,
    pub seed: Option<&'static str>,
    pub steps: Option<&'static str>,
    pub guidance: Option<&'static str>,
    /// Constant string fields always sent (e.g. `output_format: "png"`).
    pub constants: &'static [(&'static str, &'static str)],
}

impl WireFields {
    pub const NONE: WireFields = WireFields {
        aspect: None,
        aspect_aliases: &[],
        resolution: None,
        duration: None,
        images: None,
        tail_image: None,
        storyboard: None,
        negative_prompt: None,
        seed: None,
        steps: None,
        guidance: None,
        constants: &[],
    };
}

/// Static description of one model's capabilities and endpoints.
#[derive(Clone, Debug)]
pub struct ModelDescriptor {
    /// Logical model key (e.g. `"nano-banana-pro"`).
    pub key: &'static str,
    /// Human-readable name for listings.
    pub display_name: &'static str,
    pub kind: GenerationKind,
    pub provider: Provider,
    pub style: PayloadStyle,
    /// Provider wire model id.
    pub model_id: &'static str,
    /// Wire model id used instead when reference images are supplied.
    pub image_model_id: Option<&'static str>,
    /// Submission path, relative to the provider's API base.
    pub endpoint: &'static str,
    /// Status path for asynchronous providers. `None` means the submission answers directly.
    pub status_endpoint: Option<&'static str>,
    /// Supported aspect ratios; the first one is the default.
    pub aspect_ratios: &'static [&'static str],
    /// Supported resolutions; the first one is the default.
    pub resolutions: &'static [&'static str],
    /// Supported durations in seconds; the first one is the default.
    pub durations: &'static [u32],
    pub max_reference_images: usize,
    pub requires_image_input: bool,
    pub supports_tail_image: bool,
    pub supports_storyboard: bool,
    /// Prompt ceiling in characters. Longer prompts are truncated.
    pub max_prompt_len: usize,
    pub fields: WireFields,
}

impl ModelDescriptor {
    pub fn supports_image_input(&self) -> bool {
        self.max_reference_images > 0
    }

    pub fn is_async(&self) -> bool {
        self.status_endpoint.is_some()
    }

    /// Wire model id for a request with or without reference images.
    pub fn wire_model_id(&self, has_images: bool) -> &'static str {
        match (has_images, self.image_model_id) {
            (true, Some(id)) => id,
            _ => self.model_id,
        }
    }
}

/// A capability question asked by the payload builder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Feature<'a> {
    AspectRatio(&'a str),
    Resolution(&'a str),
    Duration(u32),
    ReferenceImages(usize),
    TailImage,
    Storyboard,
}

// ─────────────────────────────────────────────
// Shared option sets
// ─────────────────────────────────────────────

const NANO_BANANA_PRO_ASPECTS: &[&str] = &[
    "1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9",
];
const WIDE_ASPECTS: &[&str] = &["1:1", "9:16", "16:9", "3:4", "4:3", "3:2", "2:3", "5:4", "4:5", "21:9"];
const PHOTO_ASPECTS: &[&str] = &["1:1", "4:3", "3:4", "16:9", "9:16", "3:2", "2:3"];
const VIDEO_ASPECTS: &[&str] = &["16:9", "9:16", "1:1"];
const VEO_ASPECTS: &[&str] = &["16:9", "9:16", "Auto"];
const K_RESOLUTIONS: &[&str] = &["1K", "2K", "4K"];

// ─────────────────────────────────────────────
// All models
// ─────────────────────────────────────────────

/// Complete model table. Order is the listing order.
pub static MODELS: &[ModelDescriptor] = &[
    // ── Images ──
    ModelDescriptor {
        key: "nano-banana-pro",
        display_name: "Nano Banana Pro",
        kind: GenerationKind::Image,
        provider: Provider::Kie,
        style: PayloadStyle::KieTask,
        model_id: "nano-banana-pro",
        image_model_id: None,
        endpoint: KIE_CREATE_TASK,
        status_endpoint: Some(KIE_RECORD_INFO),
        aspect_ratios: NANO_BANANA_PRO_ASPECTS,
        resolutions: K_RESOLUTIONS,
        durations: &[],
        max_reference_images: 8,
        requires_image_input: false,
        supports_tail_image: false,
        supports_storyboard: false,
        max_prompt_len: 10_000,
        fields: WireFields {
            aspect: Some("aspect_ratio"),
            resolution: Some("resolution"),
            images: Some(ImageField::List("image_input")),
            constants: &[("output_format", "png")],
            ..WireFields::NONE
        },
    },
    ModelDescriptor {
        key: "nano-banana",
        display_name: "Nano Banana",
        kind: GenerationKind::Image,
        provider: Provider::Kie,
        style: PayloadStyle::KieTask,
        model_id: "google/nano-banana",
        image_model_id: Some("google/nano-banana-edit"),
        endpoint: KIE_CREATE_TASK,
        status_endpoint: Some(KIE_RECORD_INFO),
        aspect_ratios: WIDE_ASPECTS,
        resolutions: &[],
        durations: &[],
        max_reference_images: 10,
        requires_image_input: false,
        supports_tail_image: false,
        supports_storyboard: false,
        max_prompt_len: 5_000,
        fields: WireFields {
            aspect: Some("image_size"),
            images: Some(ImageField::List("image_urls")),
            constants: &[("output_format", "png")],
            ..WireFields::NONE
        },
    },
    ModelDescriptor {
        key: "seedream-4-5",
        display_name: "Seedream 4.5",
        kind: GenerationKind::Image,
        provider: Provider::Kie,
        style: PayloadStyle::KieTask,
        model_id: "seedream/4.5-text-to-image",
        image_model_id: Some("seedream/4.5-edit"),
        endpoint: KIE_CREATE_TASK,
        status_endpoint: Some(KIE_RECORD_INFO),
        aspect_ratios: &["1:1", "4:3", "3:4", "16:9", "9:16", "2:3", "3:2", "21:9"],
        resolutions: &["basic", "high"],
        durations: &[],
        max_reference_images: 14,
        requires_image_input: false,
        supports_tail_image: false,
        supports_storyboard: false,
        max_prompt_len: 3_000,
        fields: WireFields {
            aspect: Some("aspect_ratio"),
            resolution: Some("quality"),
            images: Some(ImageField::List("image_urls")),
            seed: Some("seed"),
            ..WireFields::NONE
        },
    },
    ModelDescriptor {
        key: "flux-2-pro",
        display_name: "FLUX.2 Pro",
        kind: GenerationKind::Image,
        provider: Provider::Kie,
        style: PayloadStyle::KieTask,
        model_id: "flux-2/pro-text-to-image",
        image_model_id: Some("flux-2/pro-image-to-image"),
        endpoint: KIE_CREATE_TASK,
        status_endpoint: Some(KIE_RECORD_INFO),
        aspect_ratios: PHOTO_ASPECTS,
        resolutions: &["1K", "2K"],
        durations: &[],
        max_reference_images: 8,
        requires_image_input: false,
        supports_tail_image: false,
        supports_storyboard: false,
        max_prompt_len: 5_000,
        fields: WireFields {
            aspect: Some("aspect_ratio"),
            resolution: Some("resolution"),
            images: Some(ImageField::List("input_urls")),
            seed: Some("seed"),
            steps: Some("steps"),
            guidance: Some("guidance"),
            ..WireFields::NONE
        },
    },
    ModelDescriptor {
        key: "gemini-2-5-flash-image",
        display_name: "Gemini 2.5 Flash Image",
        kind: GenerationKind::Image,
        provider: Provider::Gemini,
        style: PayloadStyle::GeminiDirect,
        model_id: "gemini-2.5-flash-image",
        image_model_id: None,
        endpoint: "/v1beta/models/gemini-2.5-flash-image:generateContent",
        status_endpoint: None,
        aspect_ratios: WIDE_ASPECTS,
        resolutions: &[],
        durations: &[],
        max_reference_images: 3,
        requires_image_input: false,
        supports_tail_image: false,
        supports_storyboard: false,
        max_prompt_len: 8_000,
        fields: WireFields::NONE,
    },
    // ── Videos ──
    ModelDescriptor {
        key: "kling-2-6",
        display_name: "Kling 2.6",
        kind: GenerationKind::Video,
        provider: Provider::Kie,
        style: PayloadStyle::KieTask,
        model_id: "kling-2.6/text-to-video",
        image_model_id: Some("kling-2.6/image-to-video"),
        endpoint: KIE_CREATE_TASK,
        status_endpoint: Some(KIE_RECORD_INFO),
        aspect_ratios: VIDEO_ASPECTS,
        resolutions: &[],
        durations: &[5, 10],
        max_reference_images: 1,
        requires_image_input: false,
        supports_tail_image: false,
        supports_storyboard: false,
        max_prompt_len: 2_500,
        fields: WireFields {
            aspect: Some("aspect_ratio"),
            duration: Some("duration"),
            images: Some(ImageField::List("image_urls")),
            negative_prompt: Some("negative_prompt"),
            ..WireFields::NONE
        },
    },
    ModelDescriptor {
        key: "kling-2-6-i2v",
        display_name: "Kling 2.6 Image-to-Video",
        kind: GenerationKind::Video,
        provider: Provider::Kie,
        style: PayloadStyle::KieTask,
        model_id: "kling-2.6/image-to-video",
        image_model_id: None,
        endpoint: KIE_CREATE_TASK,
        status_endpoint: Some(KIE_RECORD_INFO),
        aspect_ratios: VIDEO_ASPECTS,
        resolutions: &[],
        durations: &[5, 10],
        max_reference_images: 1,
        requires_image_input: true,
        supports_tail_image: false,
        supports_storyboard: false,
        max_prompt_len: 2_500,
        fields: WireFields {
            duration: Some("duration"),
            images: Some(ImageField::List("image_urls")),
            negative_prompt: Some("negative_prompt"),
            ..WireFields::NONE
        },
    },
    ModelDescriptor {
        key: "kling-2-1-pro",
        display_name: "Kling 2.1 Pro",
        kind: GenerationKind::Video,
        provider: Provider::Kie,
        style: PayloadStyle::KieTask,
        model_id: "kling/v2-1-pro",
        image_model_id: None,
        endpoint: KIE_CREATE_TASK,
        status_endpoint: Some(KIE_RECORD_INFO),
        aspect_ratios: VIDEO_ASPECTS,
        resolutions: &[],
        durations: &[5, 10],
        max_reference_images: 1,
        requires_image_input: true,
        supports_tail_image: true,
        supports_storyboard: false,
        max_prompt_len: 5_000,
        fields: WireFields {
            duration: Some("duration"),
            images: Some(ImageField::Single("image_url")),
            tail_image: Some("tail_image_url"),
            negative_prompt: Some("negative_prompt"),
            guidance: Some("cfg_scale"),
            ..WireFields::NONE
        },
    },
    ModelDescriptor {
        key: "wan-2-6",
        display_name: "Wan 2.6",
        kind: GenerationKind::Video,
        provider: Provider::Kie,
        style: PayloadStyle::KieTask,
        model_id: "wan/2-6-text-to-video",
        image_model_id: Some("wan/2-6-image-to-video"),
        endpoint: KIE_CREATE_TASK,
        status_endpoint: Some(KIE_RECORD_INFO),
        aspect_ratios: VIDEO_ASPECTS,
        resolutions: &["720p", "1080p"],
        durations: &[5, 10, 15],
        max_reference_images: 1,
        requires_image_input: false,
        supports_tail_image: false,
        supports_storyboard: false,
        max_prompt_len: 5_000,
        fields: WireFields {
            aspect: Some("aspect_ratio"),
            resolution: Some("resolution"),
            duration: Some("duration"),
            images: Some(ImageField::List("image_urls")),
            negative_prompt: Some("negative_prompt"),
            seed: Some("seed"),
            ..WireFields::NONE
        },
    },
    ModelDescriptor {
        key: "hailuo-2-3",
        display_name: "Hailuo 2.3 Pro",
        kind: GenerationKind::Video,
        provider: Provider::Kie,
        style: PayloadStyle::KieTask,
        model_id: "hailuo/2-3-image-to-video-pro",
        image_model_id: None,
        endpoint: KIE_CREATE_TASK,
        status_endpoint: Some(KIE_RECORD_INFO),
        aspect_ratios: &["16:9"],
        resolutions: &["768P", "1080P"],
        durations: &[6, 10],
        max_reference_images: 1,
        requires_image_input: true,
        supports_tail_image: false,
        supports_storyboard: false,
        max_prompt_len: 1_500,
        fields: WireFields {
            resolution: Some("resolution"),
            duration: Some("duration"),
            images: Some(ImageField::Single("image_url")),
            ..WireFields::NONE
        },
    },
    ModelDescriptor {
        key: "sora-2-storyboard",
        display_name: "Sora 2 Pro Storyboard",
        kind: GenerationKind::Video,
        provider: Provider::Kie,
        style: PayloadStyle::KieTask,
        model_id: "sora-2-pro-storyboard",
        image_model_id: None,
        endpoint: KIE_CREATE_TASK,
        status_endpoint: Some(KIE_RECORD_INFO),
        aspect_ratios: &["16:9", "9:16"],
        resolutions: &[],
        durations: &[10, 15, 25],
        max_reference_images: 1,
        requires_image_input: false,
        supports_tail_image: false,
        supports_storyboard: true,
        max_prompt_len: 5_000,
        fields: WireFields {
            aspect: Some("aspect_ratio"),
            aspect_aliases: &[("16:9", "landscape"), ("9:16", "portrait")],
            duration: Some("n_frames"),
            images: Some(ImageField::List("image_urls")),
            storyboard: Some("storyboard_images"),
            ..WireFields::NONE
        },
    },
    ModelDescriptor {
        key: "veo-3-1-fast",
        display_name: "Veo 3.1 Fast",
        kind: GenerationKind::Video,
        provider: Provider::Kie,
        style: PayloadStyle::KieVeo,
        model_id: "veo3_fast",
        image_model_id: None,
        endpoint: KIE_VEO_GENERATE,
        status_endpoint: Some(KIE_VEO_RECORD_INFO),
        aspect_ratios: VEO_ASPECTS,
        resolutions: &[],
        durations: &[8],
        max_reference_images: 3,
        requires_image_input: false,
        supports_tail_image: true,
        supports_storyboard: false,
        max_prompt_len: 5_000,
        fields: WireFields::NONE,
    },
    ModelDescriptor {
        key: "veo-3-1",
        display_name: "Veo 3.1 Quality",
        kind: GenerationKind::Video,
        provider: Provider::Kie,
        style: PayloadStyle::KieVeo,
        model_id: "veo3",
        image_model_id: None,
        endpoint: KIE_VEO_GENERATE,
        status_endpoint: Some(KIE_VEO_RECORD_INFO),
        aspect_ratios: VEO_ASPECTS,
        resolutions: &[],
        durations: &[8],
        max_reference_images: 2,
        requires_image_input: false,
        supports_tail_image: true,
        supports_storyboard: false,
        max_prompt_len: 5_000,
        fields: WireFields::NONE,
    },
];

// ─────────────────────────────────────────────
// Lookup functions
// ─────────────────────────────────────────────

/// Find a descriptor by exact model key.
pub fn lookup(model_key: &str) -> Option<&'static ModelDescriptor> {
    MODELS.iter().find(|m| m.key == model_key)
}

/// Outcome of a lookup that may have substituted a default model.
#[derive(Clone, Copy, Debug)]
pub struct Resolved {
    pub descriptor: &'static ModelDescriptor,
    /// True when the requested key was unknown and a default was used.
    pub substituted: bool,
}

/// Resolve a model key, falling back to the default for `kind` on unknown keys.
///
/// The fallback keeps the caller working when the UI sends a stale key.
/// It is logged so substitutions stay visible.
pub fn lookup_or_default(
    model_key: &str,
    kind: GenerationKind,
    default_image: &str,
    default_video: &str,
) -> Resolved {
    if let Some(descriptor) = lookup(model_key) {
        return Resolved {
            descriptor,
            substituted: false,
        };
    }

    let (configured, builtin) = match kind {
        GenerationKind::Image => (default_image, BUILTIN_DEFAULT_IMAGE_MODEL),
        GenerationKind::Video => (default_video, BUILTIN_DEFAULT_VIDEO_MODEL),
    };

    let descriptor = match configured_default(configured, kind) {
        Ok(d) => d,
        Err(reason) => {
            warn!(configured, builtin, reason, "configured default model is not usable, using built-in");
            builtin_default(kind)
        }
    };

    warn!(
        requested = model_key,
        substituted = descriptor.key,
        kind = %kind,
        "unknown model key, falling back to default"
    );

    Resolved {
        descriptor,
        substituted: true,
    }
}

/// The configured default for `kind`, or why it can't be used.
fn configured_default(key: &str, kind: GenerationKind) -> Result<&'static ModelDescriptor, &'static str> {
    match lookup(key) {
        None => Err("unknown model key"),
        Some(d) if d.kind != kind => Err("model generates a different kind"),
        Some(d) => Ok(d),
    }
}

fn builtin_default(kind: GenerationKind) -> &'static ModelDescriptor {
    let key = match kind {
        GenerationKind::Image => BUILTIN_DEFAULT_IMAGE_MODEL,
        GenerationKind::Video => BUILTIN_DEFAULT_VIDEO_MODEL,
    };
    // Table membership of the built-in keys is covered by tests.
    MODELS
        .iter()
        .find(|m| m.key == key)
        .unwrap_or(&MODELS[0])
}

/// Answer a capability question about a descriptor.
pub fn supports_feature(descriptor: &ModelDescriptor, feature: Feature<'_>) -> bool {
    match feature {
        Feature::AspectRatio(value) => descriptor.aspect_ratios.contains(&value),
        Feature::Resolution(value) => descriptor.resolutions.contains(&value),
        Feature::Duration(value) => descriptor.durations.contains(&value),
        Feature::ReferenceImages(count) => count <= descriptor.max_reference_images,
        Feature::TailImage => descriptor.supports_tail_image,
        Feature::Storyboard => descriptor.supports_storyboard,
    }
}

/// All descriptors of one kind, in table order.
pub fn models_for_kind(kind: GenerationKind) -> impl Iterator<Item = &'static ModelDescriptor> {
    MODELS.iter().filter(move |m| m.kind == kind)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

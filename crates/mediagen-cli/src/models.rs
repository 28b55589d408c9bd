//! `mediagen models` — list the model registry.

use colored::Colorize;

use mediagen_core::types::GenerationKind;
use mediagen_providers::registry::{models_for_kind, ModelDescriptor};

/// Run the models command.
pub fn run(kind: Option<GenerationKind>) {
    println!();
    for k in [GenerationKind::Image, GenerationKind::Video] {
        if kind.is_some_and(|wanted| wanted != k) {
            continue;
        }
        let title = match k {
            GenerationKind::Image => "Image models",
            GenerationKind::Video => "Video models",
        };
        println!("{}", title.cyan().bold());
        for descriptor in models_for_kind(k) {
            println!("  {:<24} {}", descriptor.key.bold(), describe(descriptor).dimmed());
        }
        println!();
    }
}

/// One-line capability summary for a descriptor.
pub fn describe(d: &ModelDescriptor) -> String {
    let mut parts = vec![format!("{} ({})", d.display_name, d.provider.name())];

    if !d.aspect_ratios.is_empty() {
        parts.push(format!("aspect {}", d.aspect_ratios.join("/")));
    }
    if !d.resolutions.is_empty() {
        parts.push(format!("res {}", d.resolutions.join("/")));
    }
    if !d.durations.is_empty() {
        let secs: Vec<String> = d.durations.iter().map(|s| format!("{s}s")).collect();
        parts.push(secs.join("/"));
    }

    let images = if d.requires_image_input {
        format!("1-{} images required", d.max_reference_images)
    } else {
        format!("up to {} images", d.max_reference_images)
    };
    parts.push(images);

    if d.supports_tail_image {
        parts.push("tail frame".into());
    }
    if d.supports_storyboard {
        parts.push("storyboard".into());
    }
    if !d.is_async() {
        parts.push("sync".into());
    }

    parts.join(" · ")
}

//! `mediagen generate` — run one generation job.
//!
//! Resolves the model, picks the matching provider key from config, and
//! dispatches. Ctrl-C cancels the job instead of killing the process
//! mid-request.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info};

use mediagen_core::config::{load_config, Config};
use mediagen_core::types::{GenerationError, GenerationKind, GenerationRequest, GenerationResult};
use mediagen_providers::registry::lookup;
use mediagen_providers::{DispatchOptions, Dispatcher};

use crate::helpers;
use crate::KindArg;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Model key (see `mediagen models`)
    #[arg(short, long)]
    pub model: String,

    /// Text prompt
    #[arg(short, long)]
    pub prompt: String,

    /// Image or video. Inferred from the model when omitted.
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,

    /// Aspect ratio, e.g. 16:9
    #[arg(long)]
    pub aspect_ratio: Option<String>,

    /// Resolution tier, e.g. 2K or 1080p
    #[arg(long)]
    pub resolution: Option<String>,

    /// Video duration in seconds
    #[arg(long)]
    pub duration: Option<u32>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub negative_prompt: Option<String>,

    /// Reference image URL (repeatable)
    #[arg(long = "image")]
    pub images: Vec<String>,

    /// Last-frame image URL (video)
    #[arg(long)]
    pub tail_image: Option<String>,

    /// Storyboard frame URL (repeatable)
    #[arg(long = "storyboard")]
    pub storyboard: Vec<String>,

    /// Seconds between status checks
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Give up after this many seconds
    #[arg(long)]
    pub max_wait: Option<u64>,

    /// Print the result (or error) as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub logs: bool,
}

/// Run the generate command.
pub async fn run(args: GenerateArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let dispatcher = Dispatcher::from_config(&config).context("failed to build HTTP transport")?;

    let mut request = build_request(&args);
    let resolved = dispatcher.resolve(&request);
    // Pin the resolved key so the dispatcher does not resolve (and warn) twice.
    request.model = resolved.descriptor.key.to_string();

    let provider = resolved.descriptor.provider;
    let credential = config.providers.get(provider).api_key.clone();
    if credential.is_empty() {
        debug!(provider = %provider, "no API key configured");
    }

    let options = build_options(&dispatcher, &config, &args);
    let cancel = options.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            cancel.cancel();
        }
    });

    if !args.json {
        eprintln!(
            "⠿ generating with {} via {}...",
            resolved.descriptor.display_name,
            provider.display_name()
        );
    }

    let outcome = dispatcher.dispatch(&request, &credential, &options).await;
    if !report(&outcome, args.json)? {
        // Already printed; skip anyhow's second report.
        std::process::exit(1);
    }
    Ok(())
}

/// Print the dispatch outcome. Returns whether it succeeded.
fn report(outcome: &Result<GenerationResult, GenerationError>, json: bool) -> Result<bool> {
    match outcome {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(result)?);
            } else {
                helpers::print_result(result);
            }
            Ok(true)
        }
        Err(e) => {
            if json {
                println!("{}", serde_json::to_string_pretty(e)?);
            } else {
                helpers::print_error(e);
            }
            Ok(false)
        }
    }
}

/// Turn CLI flags into a request.
pub fn build_request(args: &GenerateArgs) -> GenerationRequest {
    let kind = args
        .kind
        .map(GenerationKind::from)
        .or_else(|| lookup(&args.model).map(|d| d.kind))
        .unwrap_or_default();

    GenerationRequest {
        kind,
        prompt: args.prompt.clone(),
        negative_prompt: args.negative_prompt.clone(),
        model: args.model.clone(),
        aspect_ratio: args.aspect_ratio.clone().unwrap_or_default(),
        resolution: args.resolution.clone(),
        duration: args.duration,
        seed: args.seed,
        image_urls: args.images.clone(),
        tail_image_url: args.tail_image.clone(),
        storyboard: args.storyboard.clone(),
        ..Default::default()
    }
}

/// Poll settings from config, overridden by flags.
fn build_options(dispatcher: &Dispatcher, config: &Config, args: &GenerateArgs) -> DispatchOptions {
    let mut options = dispatcher.default_options();
    if let Some(secs) = args.poll_interval {
        options.poll.interval = Duration::from_secs(secs.max(1));
    }
    if let Some(secs) = args.max_wait {
        options.poll.max_wait = Duration::from_secs(secs);
    }
    debug!(
        interval_secs = options.poll.interval.as_secs(),
        max_wait_secs = options.poll.max_wait.as_secs(),
        max_status_errors = config.dispatcher.max_status_errors,
        "poll settings"
    );
    options
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

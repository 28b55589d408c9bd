//! `mediagen status` — show configuration and provider status.
//!
//! - Shows config path and dispatcher settings
//! - Shows API key status and endpoint for each provider

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use mediagen_core::config::{get_config_path, load_config};
use mediagen_core::types::Provider;

/// Run the status command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

    println!();
    println!("{}", "mediagen status".cyan().bold());
    println!();

    // Config
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        path.display(),
        if path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );

    // Dispatcher
    let d = &config.dispatcher;
    println!(
        "  {:<18} every {}s, give up after {}s",
        "Polling:".bold(),
        d.poll_interval_secs,
        d.max_wait_secs
    );
    println!(
        "  {:<18} {}",
        "Limits:".bold(),
        format!(
            "request timeout {}s | status errors {}",
            d.request_timeout_secs, d.max_status_errors
        )
        .dimmed()
    );
    println!(
        "  {:<18} image {} | video {}",
        "Defaults:".bold(),
        d.default_image_model,
        d.default_video_model
    );

    // Providers
    println!();
    println!("  {}", "Providers:".bold());
    for provider in Provider::ALL {
        let status = if config.providers.get(provider).is_configured() {
            format!("{} (key set)", "✓".green())
        } else {
            format!("{}", "· not configured".dimmed())
        };
        println!(
            "    {:<20} {} {}",
            provider.display_name(),
            status,
            config.providers.api_base(provider).dimmed()
        );
    }

    println!();

    Ok(())
}

//! Shared CLI helpers — path expansion and result printing.

use std::path::PathBuf;

use colored::Colorize;

use mediagen_core::types::{GenerationError, GenerationResult};
use mediagen_core::utils::preview;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print a successful generation to stdout.
pub fn print_result(result: &GenerationResult) {
    println!();
    println!("{}", "✓ Generation complete".green().bold());
    println!("  {:<12} {} ({})", "Model:".bold(), result.model_key, result.model_id.dimmed());
    println!("  {:<12} {}", "Provider:".bold(), result.provider.display_name());
    if let Some(task_id) = &result.task_id {
        println!("  {:<12} {}", "Task:".bold(), task_id.dimmed());
    }
    if let Some(duration) = result.duration {
        println!("  {:<12} {duration}s", "Duration:".bold());
    }
    println!("  {:<12} {}", "Artifact:".bold(), artifact_display(&result.artifact_url));
    println!();
}

/// Print a failed generation to stderr.
pub fn print_error(err: &GenerationError) {
    eprintln!();
    eprintln!("{} {}", "✗".red().bold(), err.message);
    eprintln!("  {:<12} {}", "Kind:".bold(), err.kind);
    if let Some(code) = &err.provider_code {
        eprintln!("  {:<12} {}", "Code:".bold(), code);
    }
    if let Some(msg) = &err.provider_message {
        eprintln!("  {:<12} {}", "Provider:".bold(), msg.yellow());
    }
    if err.is_retryable() {
        eprintln!("  {}", "(safe to retry)".dimmed());
    }
    eprintln!();
}

/// Inline `data:` URLs are huge; show only their head.
pub fn artifact_display(url: &str) -> String {
    if url.starts_with("data:") {
        format!("{} ({} bytes inline)", preview(url, 48), url.len())
    } else {
        url.to_string()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

//! Utility helpers — path resolution and string manipulation.

use std::path::PathBuf;

/// Get the mediagen data directory (e.g. `~/.mediagen/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".mediagen")
}

/// Truncate a string to at most `max_chars` characters. Unicode-safe, no ellipsis.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Shorten a string for log output, adding "..." if truncated.
pub fn preview(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", truncate_chars(s, max_len.saturating_sub(3)))
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}

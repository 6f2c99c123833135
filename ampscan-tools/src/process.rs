//! Helpers for locating and running external executables

use std::path::PathBuf;
use std::process::{Command, Output};

/// Resolve a command name or path to an executable on disk
pub(crate) fn resolve_binary(command: &str) -> Option<PathBuf> {
    which::which(command).ok()
}

/// Run a command to completion, returning a description of any failure.
///
/// A non-zero exit is always a failure, even when the tool left output
/// behind: a partially written result must never reach the parser.
pub(crate) fn run_tool(cmd: &mut Command, tool: &str) -> Result<Output, String> {
    tracing::debug!("Running {:?}", cmd);
    let output = cmd
        .output()
        .map_err(|e| format!("failed to start {}: {}", tool, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{} failed with exit code {}: {}",
            tool,
            output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "none (killed by signal)".to_string()),
            safe_truncate(stderr.trim(), 500)
        ));
    }
    Ok(output)
}

/// Safely truncate a string to max_chars characters
pub(crate) fn safe_truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::processor::BatchSummary;

/// Write `summary` as pretty-printed JSON, creating parent directories as needed
pub fn write_report(path: &Path, summary: &BatchSummary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    println!("Report written to {}", path.display());
    Ok(())
}

//! The `verify` and `cache` commands.

use anyhow::{Context, Result};
use console::style;
use roundtable::cache::AnalysisCache;
use roundtable::verify::currency::format_clp;
use roundtable::verify::{enforce_ceiling, verify_report};
use std::fs;
use std::path::Path;

/// Re-run the verification layer over a saved narrative, offline.
pub fn cmd_verify(report: &Path, ceiling: Option<i64>) -> Result<()> {
    let raw = fs::read_to_string(report)
        .with_context(|| format!("Failed to read report at {}", report.display()))?;

    let mut verified = verify_report(&raw);
    let exceeded = match ceiling {
        Some(limit) => enforce_ceiling(&mut verified, limit),
        None => false,
    };

    if verified.table_found {
        println!(
            "{} {}",
            style("Verified challenged total:").bold(),
            style(format_clp(verified.verified_total)).cyan().bold()
        );
    } else {
        println!(
            "{}",
            style("No qualifying synthesis table; narrative passed through unsummed.").dim()
        );
    }
    if exceeded {
        println!(
            "{}",
            style("⚠ Recomputed total exceeded the ceiling; capped and annotated.")
                .yellow()
                .bold()
        );
    }

    println!("\n{}", verified.content);
    Ok(())
}

/// Show memo-cache entry count and location.
pub fn cmd_cache_stats() -> Result<()> {
    let cache = open_cache()?;
    println!(
        "{} {} entries at {}",
        style("Cache:").bold(),
        cache.len(),
        cache.root().display()
    );
    Ok(())
}

/// Remove every cached record.
pub fn cmd_cache_clear() -> Result<()> {
    let cache = open_cache()?;
    let before = cache.len();
    cache.clear();
    println!("Cleared {before} cache entries.");
    Ok(())
}

fn open_cache() -> Result<AnalysisCache> {
    AnalysisCache::at_default_location()
        .context("No platform cache directory available on this system")
}

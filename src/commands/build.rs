// src/commands/build.rs

//! Pipeline commands: prepare, build/install, bi

use super::print_warnings;
use anyhow::Result;
use kiln::progress::status;
use kiln::{CookOptions, CookResult, Kitchen};
use tracing::info;

/// Fetch, extract and patch
///
/// Backs `fetch`, `extract` and `patch`: each runs all three steps.
pub fn cmd_prepare(kitchen: &Kitchen, name: &str) -> Result<()> {
    let recipe = kitchen.load_recipe(name)?;
    let work_dir = kitchen.prepare(&recipe)?;
    status::ok(&format!("Sources ready in {}", work_dir.display()));
    Ok(())
}

/// Run the whole pipeline through install and registration
pub fn cmd_build(kitchen: &Kitchen, name: &str) -> Result<()> {
    cook(kitchen, name, CookOptions::default())?;
    Ok(())
}

/// Build and install, then run the revdep check
pub fn cmd_bi(kitchen: &Kitchen, name: &str) -> Result<()> {
    let result = cook(kitchen, name, CookOptions { revdep: true })?;
    if let Some(report) = &result.revdep {
        if report.is_clean() && report.skipped.is_none() {
            status::ok(&format!("revdep: {} object(s) checked, none broken", report.scanned));
        } else if !report.broken.is_empty() {
            status::warn("revdep found issues (see log)");
        }
    }
    Ok(())
}

fn cook(kitchen: &Kitchen, name: &str, options: CookOptions) -> Result<CookResult> {
    let recipe = kitchen.load_recipe(name)?;
    info!("Building {} with {} job(s)", recipe.id(), kitchen.config().jobs);

    let result = kitchen.cook(&recipe, options)?;
    if let Some(strip) = &result.strip {
        if strip.is_clean() {
            status::ok(&format!("Stripped {} object(s)", strip.stripped));
        }
    }
    print_warnings(&result.warnings);
    status::ok(&format!(
        "Installed to DESTDIR: {} ({} files)",
        result.staging.display(),
        result.files
    ));
    Ok(result)
}


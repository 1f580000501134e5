// src/commands/package.rs

//! Packaging and revdep commands

use super::print_warnings;
use anyhow::Result;
use kiln::progress::status;
use kiln::recipe::kitchen::revdep_warnings;
use kiln::Kitchen;

/// Archive the staging root into packages/
pub fn cmd_package(kitchen: &Kitchen, name: &str) -> Result<()> {
    let recipe = kitchen.load_recipe(name)?;
    let path = kitchen.package(&recipe)?;
    status::ok(&format!("Package: {}", path.display()));
    Ok(())
}

/// Check the staging root for broken library links
///
/// Advisory only: findings are printed as warnings and never fail the command.
pub fn cmd_revdep(kitchen: &Kitchen, name: &str) -> Result<()> {
    let recipe = kitchen.load_recipe(name)?;
    let report = kitchen.revdep(&recipe)?;

    print_warnings(&revdep_warnings(&report));
    if report.is_clean() && report.skipped.is_none() {
        status::ok(&format!(
            "revdep: {} object(s) checked, none broken",
            report.scanned
        ));
    } else if !report.is_clean() {
        status::warn("revdep found issues (see log)");
    }
    Ok(())
}

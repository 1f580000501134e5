// src/commands/remove.rs

//! Remove command

use super::print_warnings;
use anyhow::Result;
use kiln::progress::status;
use kiln::Kitchen;

/// Undo an install using its manifest
pub fn cmd_remove(kitchen: &Kitchen, ident: &str) -> Result<()> {
    let outcome = kitchen.remove(ident)?;
    let removal = &outcome.removal;

    print_warnings(&outcome.warnings);
    status::ok(&format!(
        "Removed files from DESTDIR for {}: {}",
        removal.id, removal.removed
    ));
    if outcome.hook_ran {
        status::ok("postremove hook done");
    }
    Ok(())
}

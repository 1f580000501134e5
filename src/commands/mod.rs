// src/commands/mod.rs
//! Command handlers for the kiln CLI

mod build;
mod package;
mod recipe;
mod remove;

pub use build::{cmd_bi, cmd_build, cmd_prepare};
pub use package::{cmd_package, cmd_revdep};
pub use recipe::{cmd_info, cmd_search};
pub use remove::cmd_remove;

use kiln::progress::status;

/// Print advisory warnings collected by a stage
pub(crate) fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        status::warn(warning);
    }
}

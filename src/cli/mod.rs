// src/cli/mod.rs
//! CLI definitions for kiln
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! Recipe commands:
//! - `info` / `search` - Inspect recipes
//! - `fetch` / `extract` / `patch` - Prepare the working tree
//! - `build` / `install` / `bi` - Run the whole pipeline
//! - `package` - Archive the staging root
//! - `remove` - Undo an install using its manifest
//! - `revdep` - Check staged binaries for broken library links

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(version)]
#[command(about = "Build one package at a time from source recipes", long_about = None)]
pub struct Cli {
    /// Project root holding recipes/, sources/, work/, destdir/ and packages/
    #[arg(long, global = true, env = "KILN_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Strip binaries after install even if the recipe does not ask for it
    ///
    /// KILN_STRIP counts as set unless it is empty, `0`, `false`, `no` or `off`.
    #[arg(
        long,
        global = true,
        env = "KILN_STRIP",
        value_parser = FalseyValueParser::new()
    )]
    pub strip: bool,

    /// Parallel jobs exported to build phases (default: available CPUs)
    #[arg(short, long, global = true, env = "KILN_JOBS")]
    pub jobs: Option<u32>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a recipe
    Info {
        /// Recipe name
        name: String,
    },

    /// Search recipes by file name
    #[command(visible_alias = "srch")]
    Search {
        /// Substring to look for
        term: String,
    },

    /// Fetch sources (then extract and patch)
    #[command(visible_alias = "dl")]
    Fetch {
        name: String,
    },

    /// Extract sources into work/ (fetching and patching as needed)
    #[command(visible_alias = "ex")]
    Extract {
        name: String,
    },

    /// Apply patches (fetching and extracting as needed)
    #[command(visible_alias = "pt")]
    Patch {
        name: String,
    },

    /// Run the whole pipeline through install
    #[command(visible_alias = "b")]
    Build {
        name: String,
    },

    /// Install into the staging root (runs the whole pipeline)
    #[command(visible_alias = "i")]
    Install {
        name: String,
    },

    /// Build and install, then check for broken library links
    Bi {
        name: String,
    },

    /// Archive the staging root into packages/
    #[command(visible_alias = "pkg")]
    Package {
        name: String,
    },

    /// Remove an installed package using its manifest
    #[command(visible_alias = "rm")]
    Remove {
        /// Package name or name-version
        ident: String,
    },

    /// Check staged binaries for unresolved shared libraries
    Revdep {
        name: String,
    },
}

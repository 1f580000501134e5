// src/recipe/mod.rs

//! Recipe system for building packages from source
//!
//! Recipes define how to build one package from source:
//! - Where the sources come from (archive URL or git) and their checksum
//! - Patches to apply, in order
//! - Shell commands for each build phase
//! - Hooks run on removal
//!
//! # Culinary Terminology
//!
//! - **Recipe**: the build specification (an INI file)
//! - **Kitchen**: owns configuration and drives the stages
//! - **Cook**: one pipeline run for one recipe
//! - **Prep**: fetch sources
//! - **Simmer**: run the build phases
//! - **Plate**: record what was installed
//!
//! # Example Recipe
//!
//! ```ini
//! [package]
//! name=foo
//! version=1.0
//! source=https://example.org/foo-1.0.tar.gz
//! checksum=sha256:5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03
//!
//! [build]
//! config=./configure --prefix=/usr
//! build=make
//! install=make DESTDIR="$DESTDIR" install
//! ```

mod format;
pub mod index;
pub mod kitchen;
pub mod parser;

pub use format::{BuildPhases, Hooks, Phase, Recipe, SourceOrigin};
pub use index::RecipeIndex;
pub use kitchen::{Cook, CookOptions, CookResult, Kitchen, KitchenConfig, RemoveOutcome};
pub use parser::{parse_recipe, parse_recipe_file};

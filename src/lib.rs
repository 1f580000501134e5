// src/lib.rs

//! kiln: single-package source builds
//!
//! Takes one package from a declarative recipe to an installed file tree and
//! back again, without dependency resolution.
//!
//! # Architecture
//!
//! - Recipes: INI files under `recipes/`
//! - Kitchen: fetch, extract, patch, build phases, staging
//! - Registry: per-install manifest, the sole authority for removal
//! - External tools do the heavy lifting (curl, git, tar, patch, sh, strip,
//!   ldd); each call is logged to `logs/<name>-<version>.log`

pub mod compression;
pub mod config;
mod error;
pub mod hash;
pub mod progress;
pub mod recipe;
pub mod registry;

pub use compression::CompressionFormat;
pub use config::Layout;
pub use error::{Error, Result};
pub use recipe::{Cook, CookOptions, CookResult, Kitchen, KitchenConfig, Recipe, RemoveOutcome};
pub use registry::{Manifest, PackageMeta, Registry, RemoveResult};

// src/recipe/index.rs

//! Recipe lookup
//!
//! Resolution is two-step:
//! 1. Exact: `recipes/<name>/<name>.ini`
//! 2. Fallback: the first `*.ini` file, in sorted depth-first order of the
//!    recipes tree, whose file name contains `name`
//!
//! Sorting makes the fallback deterministic across filesystems.

use crate::error::{Error, Result};
use crate::recipe::format::Recipe;
use crate::recipe::parser::parse_recipe_file;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Recipe file extension
pub const RECIPE_EXTENSION: &str = "ini";

/// View over a recipes directory
#[derive(Debug, Clone)]
pub struct RecipeIndex {
    dir: PathBuf,
}

impl RecipeIndex {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Locate the recipe file for `name`
    pub fn find(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() {
            return Err(Error::RecipeNotFound(name.to_string()));
        }

        let exact = self
            .dir
            .join(name)
            .join(format!("{}.{}", name, RECIPE_EXTENSION));
        if exact.is_file() {
            return Ok(exact);
        }

        debug!("No exact recipe for {}, searching by substring", name);
        self.recipe_files()
            .into_iter()
            .find(|path| file_name(path).contains(name))
            .ok_or_else(|| Error::RecipeNotFound(name.to_string()))
    }

    /// Locate and parse the recipe for `name`
    pub fn load(&self, name: &str) -> Result<(PathBuf, Recipe)> {
        let path = self.find(name)?;
        let recipe = parse_recipe_file(&path)?;
        Ok((path, recipe))
    }

    /// All recipe files whose file name contains `term`, sorted
    pub fn search(&self, term: &str) -> Vec<PathBuf> {
        self.recipe_files()
            .into_iter()
            .filter(|path| file_name(path).contains(term))
            .collect()
    }

    fn recipe_files(&self) -> Vec<PathBuf> {
        if !self.dir.is_dir() {
            return Vec::new();
        }

        WalkDir::new(&self.dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == RECIPE_EXTENSION))
            .map(|e| e.into_path())
            .collect()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

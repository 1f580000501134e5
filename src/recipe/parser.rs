// src/recipe/parser.rs

//! Recipe file parsing
//!
//! Line-oriented INI: `[section]` headers, `key=value` data lines, blank lines
//! and lines starting with `#` or `;` ignored. Keys and values are trimmed; a
//! value wrapped in double quotes loses the quotes (no escape processing).
//! Unknown sections and keys are ignored so newer recipes still parse.

use crate::compression::CompressionFormat;
use crate::error::{Error, Result};
use crate::recipe::format::Recipe;
use std::path::Path;

/// Parse a recipe from INI text
///
/// `origin` names the source in error messages (usually the file path).
pub fn parse_recipe(content: &str, origin: &str) -> Result<Recipe> {
    let mut recipe = Recipe::default();
    let mut section = String::new();

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].trim().to_string();
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = unquote(value.trim());

        match section.as_str() {
            "package" => apply_package_key(&mut recipe, key, value),
            "build" => apply_build_key(&mut recipe, key, value),
            "hooks" => apply_hook_key(&mut recipe, key, value),
            _ => {}
        }
    }

    if recipe.name.is_empty() {
        return Err(Error::InvalidRecipe {
            path: origin.to_string(),
            reason: "missing name= in [package]".to_string(),
        });
    }

    Ok(recipe)
}

/// Parse a recipe from a file
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::InvalidRecipe {
        path: path.display().to_string(),
        reason: format!("cannot read file: {}", e),
    })?;

    parse_recipe(&content, &path.display().to_string())
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn apply_package_key(recipe: &mut Recipe, key: &str, value: &str) {
    match key {
        "name" => recipe.name = value.to_string(),
        "version" => recipe.version = value.to_string(),
        "homepage" => recipe.homepage = value.to_string(),
        "desc" => recipe.desc = value.to_string(),
        "license" => recipe.license = value.to_string(),
        "source" => recipe.source_url = non_empty(value),
        "git" => recipe.git_url = non_empty(value),
        "checksum" => recipe.checksum = non_empty(value),
        "strip" => recipe.strip = matches!(value, "1" | "true" | "yes"),
        "fakeroot" => recipe.fakeroot = !matches!(value, "0" | "false" | "no"),
        "pack" => recipe.pack = CompressionFormat::from_pack_option(value),
        "patches" => {
            recipe.patches = value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect();
        }
        _ => {}
    }
}

fn apply_build_key(recipe: &mut Recipe, key: &str, value: &str) {
    let phases = &mut recipe.phases;
    match key {
        "preconfig" => phases.preconfig = value.to_string(),
        "config" => phases.config = value.to_string(),
        "build" => phases.build = value.to_string(),
        "install" => phases.install = value.to_string(),
        "postinstall" => phases.postinstall = value.to_string(),
        _ => {}
    }
}

fn apply_hook_key(recipe: &mut Recipe, key: &str, value: &str) {
    match key {
        "postremove" => recipe.hooks.postremove = value.to_string(),
        "postsync" => recipe.hooks.postsync = value.to_string(),
        _ => {}
    }
}

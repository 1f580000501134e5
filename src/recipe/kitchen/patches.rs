// src/recipe/kitchen/patches.rs

//! Patch acquisition and application
//!
//! A patch specification is one of:
//! - `git+<url>`: a repository of patches, cloned once into the patch cache
//!   and pulled on later runs; every tracked `*.patch` file is applied in the
//!   order `git ls-files` lists them
//! - `http://` / `https://`: a single patch, downloaded once into the cache
//! - `file://<path>` or a bare path: a local file that must exist
//!
//! Cache entries are keyed by a hash of the specification string. Patches
//! are applied with `patch -p1` in declared order and the first failure stops
//! the run; the working tree is not rolled back.

use crate::error::{Error, Result};
use crate::hash;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::command::{CommandRunner, ExternalCommand};
use super::source::{download, sync_git};

/// A parsed patch specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchSpec {
    Git(String),
    Remote(String),
    Local(PathBuf),
}

impl PatchSpec {
    pub fn parse(spec: &str) -> Self {
        if let Some(url) = spec.strip_prefix("git+") {
            Self::Git(url.to_string())
        } else if spec.starts_with("http://") || spec.starts_with("https://") {
            Self::Remote(spec.to_string())
        } else if let Some(path) = spec.strip_prefix("file://") {
            Self::Local(PathBuf::from(path))
        } else {
            Self::Local(PathBuf::from(spec))
        }
    }
}

/// A specification resolved to local files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPatch {
    File(PathBuf),
    /// Checkout of a patch repository
    Series(PathBuf),
}

/// Resolves and applies patch specifications
pub struct PatchSet<'a> {
    cache: &'a Path,
    /// Base for relative local paths
    base: &'a Path,
    runner: &'a CommandRunner,
}

impl<'a> PatchSet<'a> {
    pub fn new(cache: &'a Path, base: &'a Path, runner: &'a CommandRunner) -> Self {
        Self { cache, base, runner }
    }

    /// Turn a specification into local patch file(s)
    pub fn acquire(&self, spec: &str) -> Result<ResolvedPatch> {
        let unresolvable = |e: Error| Error::PatchUnresolvable(format!("{}: {}", spec, e));

        match PatchSpec::parse(spec) {
            PatchSpec::Git(url) => {
                fs::create_dir_all(self.cache)?;
                let dir = self.cache.join(format!("patch-{}", hash::cache_key(spec)));
                sync_git(&url, &dir, self.runner, "patch git").map_err(unresolvable)?;
                Ok(ResolvedPatch::Series(dir))
            }
            PatchSpec::Remote(url) => {
                fs::create_dir_all(self.cache)?;
                let file = self
                    .cache
                    .join(format!("patch-{}.patch", hash::cache_key(spec)));
                if file.is_file() {
                    debug!("Using cached patch {}", file.display());
                } else {
                    download(&url, &file, self.runner, "download patch").map_err(unresolvable)?;
                }
                Ok(ResolvedPatch::File(file))
            }
            PatchSpec::Local(path) => {
                let path = if path.is_absolute() { path } else { self.base.join(path) };
                if !path.is_file() {
                    return Err(Error::PatchUnresolvable(format!(
                        "{}: no such file {}",
                        spec,
                        path.display()
                    )));
                }
                Ok(ResolvedPatch::File(path))
            }
        }
    }

    /// Apply every specification in order against `work_dir`
    ///
    /// Returns the number of patch files applied.
    pub fn apply_all(&self, specs: &[String], work_dir: &Path) -> Result<usize> {
        let mut applied = 0;
        for spec in specs {
            let files = match self.acquire(spec)? {
                ResolvedPatch::File(file) => vec![file],
                ResolvedPatch::Series(repo) => self.list_series(spec, &repo)?,
            };
            for file in files {
                self.apply(&file, work_dir, spec)?;
                applied += 1;
            }
        }
        if applied > 0 {
            info!("Applied {} patch file(s)", applied);
        }
        Ok(applied)
    }

    fn list_series(&self, spec: &str, repo: &Path) -> Result<Vec<PathBuf>> {
        let command = ExternalCommand::new("git")
            .arg("-C")
            .arg(repo)
            .args(["ls-files", "*.patch"]);
        let output = self.runner.capture(&command, "patch git ls-files")?;
        if !output.status.success() {
            return Err(Error::PatchUnresolvable(format!(
                "{}: cannot list patches in {}",
                spec,
                repo.display()
            )));
        }

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| repo.join(line))
            .collect())
    }

    fn apply(&self, file: &Path, work_dir: &Path, spec: &str) -> Result<()> {
        let file = std::path::absolute(file)?;
        let command = ExternalCommand::new("patch")
            .args(["-p1", "-i"])
            .arg(&file)
            .current_dir(work_dir);

        let label = format!(
            "apply patch {}",
            file.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| spec.to_string())
        );
        let outcome = self.runner.run(&command, &label)?;
        if !outcome.success() {
            return Err(Error::PatchApplicationFailed {
                patch: file.display().to_string(),
                code: outcome.code,
            });
        }
        Ok(())
    }
}

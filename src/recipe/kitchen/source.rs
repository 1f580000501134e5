// src/recipe/kitchen/source.rs

//! Source acquisition
//!
//! A recipe names either a git repository or an archive URL. Git sources are
//! cloned into `sources/<name>-<version>` and pulled on later runs. Archives
//! are downloaded into `sources/` under the URL's final path segment and are
//! never downloaded twice.
//!
//! Downloads land in `<file>.part` first; only a completed transfer is renamed
//! into place, so a half-written file never looks like a cached source.

use crate::config::Layout;
use crate::error::{Error, Result};
use crate::hash;
use crate::progress::status;
use crate::recipe::format::{Recipe, SourceOrigin};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::command::{CommandRunner, ExternalCommand};

/// Local result of a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedSource {
    /// Downloaded archive file
    Archive(PathBuf),
    /// Git working tree
    Checkout(PathBuf),
}

impl FetchedSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Archive(path) | Self::Checkout(path) => path,
        }
    }
}

/// Fetch the sources of `recipe` into the layout's `sources/` directory
pub fn fetch(recipe: &Recipe, layout: &Layout, runner: &CommandRunner) -> Result<FetchedSource> {
    fs::create_dir_all(&layout.sources)?;

    match recipe.origin() {
        Some(SourceOrigin::Git(url)) => {
            let checkout = layout.checkout_dir(&recipe.id());
            sync_git(url, &checkout, runner, "git")?;
            Ok(FetchedSource::Checkout(checkout))
        }
        Some(SourceOrigin::Archive(url)) => {
            let file = fetch_archive(url, &layout.sources, runner)?;
            if let Some(expected) = recipe.expected_checksum() {
                verify_checksum(&file, expected)?;
            }
            Ok(FetchedSource::Archive(file))
        }
        None => Err(Error::SourceUnresolved(recipe.id())),
    }
}

/// Clone `url` into `dir`, or pull if a checkout is already there
pub(crate) fn sync_git(url: &str, dir: &Path, runner: &CommandRunner, label: &str) -> Result<()> {
    let (command, what) = if dir.exists() {
        info!("Git checkout exists, pulling: {}", dir.display());
        (
            ExternalCommand::new("git")
                .arg("-C")
                .arg(dir)
                .args(["pull", "--rebase"]),
            format!("{} pull", label),
        )
    } else {
        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent)?;
        }
        (
            ExternalCommand::new("git").arg("clone").arg(url).arg(dir),
            format!("{} clone", label),
        )
    };

    let outcome = runner.run(&command, &what)?;
    if !outcome.success() {
        return Err(Error::TransferFailed {
            what: format!("{} of {}", what, url),
            code: outcome.code,
        });
    }
    Ok(())
}

/// File name an archive URL is stored under
pub fn archive_filename(url: &str) -> Option<&str> {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    let name = trimmed.rsplit('/').next()?;
    if name.is_empty() { None } else { Some(name) }
}

fn fetch_archive(url: &str, sources: &Path, runner: &CommandRunner) -> Result<PathBuf> {
    let name = archive_filename(url)
        .ok_or_else(|| Error::SourceUnresolved(format!("cannot derive a file name from {}", url)))?;
    let dest = sources.join(name);

    if dest.is_file() {
        info!("Source exists: {}", dest.display());
        status::info(&format!("Source exists: {}", dest.display()));
        return Ok(dest);
    }

    download(url, &dest, runner, "download")?;
    Ok(dest)
}

/// Download `url` to `dest` via curl, going through `<dest>.part`
pub(crate) fn download(url: &str, dest: &Path, runner: &CommandRunner, label: &str) -> Result<()> {
    let partial = partial_path(dest);
    let command = ExternalCommand::new("curl")
        .args(["-L", "--fail", "-sS", "-o"])
        .arg(&partial)
        .arg(url);

    let outcome = runner.run(&command, label)?;
    if !outcome.success() {
        let _ = fs::remove_file(&partial);
        return Err(Error::TransferFailed {
            what: format!("{} of {}", label, url),
            code: outcome.code,
        });
    }

    fs::rename(&partial, dest).map_err(|e| {
        let _ = fs::remove_file(&partial);
        Error::IoError(format!("cannot move {} into place: {}", dest.display(), e))
    })?;
    debug!("Downloaded {} to {}", url, dest.display());
    Ok(())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Compare the sha256 of `file` with `expected`, deleting the file on mismatch
pub fn verify_checksum(file: &Path, expected: &str) -> Result<()> {
    let actual = hash::sha256_file(file)?;
    if hash::checksum_matches(expected, &actual) {
        status::ok(&format!("sha256 verified: {}", actual));
        return Ok(());
    }

    warn!(
        file = %file.display(),
        expected = %hash::normalize_checksum(expected),
        actual = %actual,
        "checksum mismatch, discarding download"
    );
    if let Err(e) = fs::remove_file(file) {
        warn!("Failed to remove {}: {}", file.display(), e);
    }

    Err(Error::ChecksumMismatch {
        path: file.to_path_buf(),
        expected: hash::normalize_checksum(expected),
        actual,
    })
}

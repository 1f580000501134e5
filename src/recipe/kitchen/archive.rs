// src/recipe/kitchen/archive.rs

//! Archive utilities for the Kitchen
//!
//! Unpacking goes through the system `tar`/`unzip` so every format the host
//! supports works the same way it would by hand. Packing the staging root is
//! done in-process with the `tar` crate and our compression encoders.

use crate::compression::{CompressionFormat, Encoder};
use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::command::{CommandRunner, ExternalCommand};
use super::source::FetchedSource;

/// Source archive formats, dispatched by file name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarZstd,
    TarXz,
    TarBzip2,
    TarGzip,
    Zip,
}

impl ArchiveKind {
    /// Detect the format from a file name
    pub fn from_filename(name: &str) -> Result<Self> {
        if name.ends_with(".tar.zst") {
            Ok(Self::TarZstd)
        } else if name.ends_with(".tar.xz") {
            Ok(Self::TarXz)
        } else if name.ends_with(".tar.bz2") {
            Ok(Self::TarBzip2)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Ok(Self::TarGzip)
        } else if name.ends_with(".zip") {
            Ok(Self::Zip)
        } else {
            Err(Error::UnsupportedArchiveFormat(name.to_string()))
        }
    }

    /// tar decompression flag, `None` for zip
    fn tar_flag(&self) -> Option<&'static str> {
        match self {
            Self::TarZstd => Some("--zstd"),
            Self::TarXz => Some("-J"),
            Self::TarBzip2 => Some("-j"),
            Self::TarGzip => Some("-z"),
            Self::Zip => None,
        }
    }
}

/// Produce the working tree for a fetched source
///
/// Archives are unpacked into `work_dir` (wiped first) with their single
/// top-level directory stripped. A git checkout is used in place and
/// `work_dir` is ignored.
pub fn extract(source: &FetchedSource, work_dir: &Path, runner: &CommandRunner) -> Result<PathBuf> {
    let archive = match source {
        FetchedSource::Checkout(dir) => {
            if !dir.is_dir() {
                return Err(Error::ExtractionFailed(format!(
                    "git source dir not found: {}",
                    dir.display()
                )));
            }
            info!("Using git source at {}", dir.display());
            return Ok(dir.clone());
        }
        FetchedSource::Archive(file) => file,
    };

    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kind = ArchiveKind::from_filename(&name)?;

    if work_dir.exists() {
        fs::remove_dir_all(work_dir)?;
    }
    fs::create_dir_all(work_dir)?;

    match kind.tar_flag() {
        Some(flag) => {
            let command = ExternalCommand::new("tar")
                .arg(flag)
                .arg("-xf")
                .arg(archive)
                .arg("-C")
                .arg(work_dir)
                .arg("--strip-components=1");
            let outcome = runner.run(&command, "extract")?;
            if !outcome.success() {
                return Err(Error::ExtractionFailed(format!(
                    "tar could not unpack {} (code {:?})",
                    archive.display(),
                    outcome.code
                )));
            }
        }
        None => unzip_stripped(archive, work_dir, runner)?,
    }

    debug!("Extracted {} into {}", archive.display(), work_dir.display());
    Ok(work_dir.to_path_buf())
}

/// `unzip` has no strip option: unpack beside the work dir, then hoist
/// the contents of each top-level directory
fn unzip_stripped(archive: &Path, work_dir: &Path, runner: &CommandRunner) -> Result<()> {
    let parent = work_dir.parent().unwrap_or(work_dir);
    let scratch = tempfile::Builder::new()
        .prefix(".unzip-")
        .tempdir_in(parent)?;

    let command = ExternalCommand::new("unzip")
        .arg("-q")
        .arg(archive)
        .arg("-d")
        .arg(scratch.path());
    let outcome = runner.run(&command, "extract")?;
    if !outcome.success() {
        return Err(Error::ExtractionFailed(format!(
            "unzip could not unpack {} (code {:?})",
            archive.display(),
            outcome.code
        )));
    }

    for top in sorted_children(scratch.path())? {
        if !top.is_dir() {
            debug!("Dropping top-level file {}", top.display());
            continue;
        }
        for child in sorted_children(&top)? {
            if let Some(name) = child.file_name() {
                fs::rename(&child, work_dir.join(name))?;
            }
        }
    }
    Ok(())
}

fn sorted_children(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut children = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    children.sort();
    Ok(children)
}

/// Archive the contents of `staging` into `out`
///
/// Entries are relative to the staging root and added in sorted order.
/// The archive is written to `<out>.part` and renamed on success; on failure
/// no file is left behind.
pub fn pack_staging(staging: &Path, out: &Path, format: CompressionFormat) -> Result<PathBuf> {
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut partial = out.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    match write_archive(staging, &partial, format) {
        Ok(count) => {
            fs::rename(&partial, out)?;
            info!("Packed {} entries into {}", count, out.display());
            Ok(out.to_path_buf())
        }
        Err(e) => {
            if partial.exists() {
                if let Err(cleanup) = fs::remove_file(&partial) {
                    warn!("Failed to remove {}: {}", partial.display(), cleanup);
                }
            }
            Err(Error::PackagingFailed(format!("{}: {}", out.display(), e)))
        }
    }
}

fn write_archive(staging: &Path, dest: &Path, format: CompressionFormat) -> io::Result<usize> {
    if !staging.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("staging root {} does not exist", staging.display()),
        ));
    }

    let file = File::create(dest)?;
    let encoder = Encoder::new(BufWriter::new(file), format)?;
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    let mut count = 0;
    for entry in WalkDir::new(staging).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(staging)
            .map_err(io::Error::other)?;
        builder.append_path_with_name(entry.path(), rel)?;
        count += 1;
    }

    let encoder = builder.into_inner()?;
    let mut writer = encoder.finish()?;
    writer.flush()?;
    Ok(count)
}

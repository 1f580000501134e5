// src/recipe/kitchen/inspect.rs

//! Post-install inspection of the staging root
//!
//! - strip pass: every ELF object gets `strip -s`
//! - revdep check: every dynamically linked ELF object goes through `ldd`;
//!   a non-zero exit or a `not found` line marks it broken
//!
//! Both are advisory. Their outcomes are reports, never pipeline errors.

use crate::error::Result;
use goblin::elf::Elf;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::command::{CommandRunner, ExternalCommand};

const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Linkage of an ELF object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    Static,
    Dynamic,
}

/// Whether a file starts with the ELF magic
pub fn is_elf(path: &Path) -> io::Result<bool> {
    let mut magic = [0u8; 4];
    let mut file = File::open(path)?;
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == ELF_MAGIC),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Parse an ELF object and report its linkage
///
/// Returns `None` for non-ELF files and objects goblin cannot parse.
pub fn linkage(path: &Path) -> Option<Linkage> {
    if !is_elf(path).ok()? {
        return None;
    }
    let data = fs::read(path).ok()?;
    match Elf::parse(&data) {
        Ok(elf) => {
            if elf.interpreter.is_some() || !elf.libraries.is_empty() {
                Some(Linkage::Dynamic)
            } else {
                Some(Linkage::Static)
            }
        }
        Err(e) => {
            debug!("Unparsable ELF {}: {}", path.display(), e);
            None
        }
    }
}

/// Regular files under `root` that carry the ELF magic, sorted
pub fn elf_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_elf(e.path()).unwrap_or(false))
        .map(|e| e.into_path())
        .collect()
}

/// Outcome of the strip pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripReport {
    pub stripped: usize,
    pub failed: Vec<PathBuf>,
    /// Set when the pass did not run at all
    pub skipped: Option<String>,
}

impl StripReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_none()
    }
}

/// Strip every ELF object under `root`
pub fn strip_tree(root: &Path, strip_program: &str, runner: &CommandRunner) -> Result<StripReport> {
    let mut report = StripReport::default();
    if which::which(strip_program).is_err() {
        let reason = format!("{} not found in PATH", strip_program);
        warn!("Skipping strip pass: {}", reason);
        runner.log().note(&format!("=== strip skipped: {} ===", reason))?;
        report.skipped = Some(reason);
        return Ok(report);
    }

    for file in elf_files(root) {
        let command = ExternalCommand::new(strip_program).arg("-s").arg(&file);
        let outcome = runner.run(&command, "strip")?;
        if outcome.success() {
            report.stripped += 1;
        } else {
            warn!("strip failed for {}", file.display());
            report.failed.push(file);
        }
    }
    Ok(report)
}

/// A dynamically linked object whose libraries do not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenObject {
    pub path: PathBuf,
    /// Library names ldd reported as `not found`
    pub missing: Vec<String>,
}

/// Outcome of the revdep check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevdepReport {
    /// Dynamically linked objects examined
    pub scanned: usize,
    pub broken: Vec<BrokenObject>,
    pub skipped: Option<String>,
}

impl RevdepReport {
    pub fn is_clean(&self) -> bool {
        self.broken.is_empty()
    }
}

/// Check every dynamically linked object under `root` with ldd
pub fn revdep(root: &Path, ldd_program: &str, runner: &CommandRunner) -> Result<RevdepReport> {
    let mut report = RevdepReport::default();
    if which::which(ldd_program).is_err() {
        let reason = format!("{} not found in PATH", ldd_program);
        warn!("Skipping revdep check: {}", reason);
        report.skipped = Some(reason);
        return Ok(report);
    }

    for file in elf_files(root) {
        if linkage(&file) != Some(Linkage::Dynamic) {
            continue;
        }
        report.scanned += 1;

        let command = ExternalCommand::new(ldd_program).arg(&file);
        let output = runner.capture(&command, "revdep")?;
        let missing = missing_libraries(&output.stdout);
        if !output.status.success() || !missing.is_empty() {
            warn!(file = %file.display(), missing = ?missing, "broken shared library links");
            report.broken.push(BrokenObject { path: file, missing });
        }
    }
    Ok(report)
}

/// Library names from `ldd` lines of the form `libfoo.so.1 => not found`
pub fn missing_libraries(ldd_output: &str) -> Vec<String> {
    ldd_output
        .lines()
        .filter(|line| line.contains("not found"))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

// src/error.rs

//! Error types for the kiln library
//!
//! Every pipeline stage reports failure through [`Error`]. The variants follow
//! the stages of a build so the binary can turn them into distinct exit
//! statuses via [`Error::exit_code`].

use crate::recipe::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Recipe could not be parsed or has no package name
    #[error("Invalid recipe {path}: {reason}")]
    InvalidRecipe { path: String, reason: String },

    /// No recipe file matches the requested name
    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    /// Recipe names neither an archive nor a git source
    #[error("No source= or git= defined in recipe for {0}")]
    SourceUnresolved(String),

    /// Download or clone exited non-zero
    #[error("{what} failed{}", exit_suffix(.code))]
    TransferFailed { what: String, code: Option<i32> },

    /// Downloaded archive does not match the configured hash
    #[error("sha256 mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Archive suffix is not one we know how to unpack
    #[error("Unknown archive type: {0}")]
    UnsupportedArchiveFormat(String),

    /// Archive tool failed or the git checkout is missing
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Patch specification could not be turned into a local file
    #[error("Failed to acquire patch: {0}")]
    PatchUnresolvable(String),

    /// `patch` rejected a patch file
    #[error("Failed to apply patch {patch}{}", exit_suffix(.code))]
    PatchApplicationFailed { patch: String, code: Option<i32> },

    /// A build phase command exited non-zero
    #[error("{phase} phase failed{}", exit_suffix(.code))]
    PhaseFailed { phase: Phase, code: Option<i32> },

    /// `package` was requested before a successful install
    #[error("Nothing to package for {0}: build/install first")]
    NothingToPackage(String),

    /// Writing the package archive failed
    #[error("Packaging failed: {0}")]
    PackagingFailed(String),

    /// No registry entry matches the remove target
    #[error("No registry entry for: {0}")]
    NotRegistered(String),

    /// Registry entry exists but its manifest is gone
    #[error("Manifest missing for: {0}")]
    ManifestMissing(String),

    /// Generic I/O failure with context
    /// A pipeline step was called before the step it depends on
    #[error("{id}: {step} requires {needs} first")]
    OutOfOrder {
        id: String,
        step: &'static str,
        needs: &'static str,
    },

    #[error("I/O error: {0}")]
    IoError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" (code {})", code),
        None => " (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Process exit status for this failure
    ///
    /// Distinct per stage: recipe 1, fetch 2, extract 3, patch 4,
    /// phases 5-9, package 10-11, remove 12-13.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidRecipe { .. } | Self::RecipeNotFound(_) => 1,
            Self::SourceUnresolved(_) | Self::TransferFailed { .. } | Self::ChecksumMismatch { .. } => 2,
            Self::UnsupportedArchiveFormat(_) | Self::ExtractionFailed(_) => 3,
            Self::PatchUnresolvable(_) | Self::PatchApplicationFailed { .. } => 4,
            Self::PhaseFailed { phase, .. } => phase.exit_code(),
            Self::NothingToPackage(_) => 10,
            Self::PackagingFailed(_) => 11,
            Self::NotRegistered(_) => 12,
            Self::ManifestMissing(_) => 13,
            Self::OutOfOrder { .. } | Self::IoError(_) | Self::Io(_) => 1,
        }
    }
}

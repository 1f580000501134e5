// src/config.rs

//! On-disk project layout
//!
//! Everything kiln touches lives under one project root:
//!
//! ```text
//! <root>/
//!   recipes/<name>/<name>.ini
//!   sources/                      downloaded archives and git checkouts
//!   work/<name>-<version>/        extracted working tree
//!   destdir/<name>-<version>/     staging root
//!   packages/                     output archives
//!   logs/<name>-<version>.log     combined command output
//!   .kiln/installed/<id>/         registry entries (manifest + meta)
//!   .kiln/cache/                  patch cache
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the hidden state directory under the project root
pub const STATE_DIR: &str = ".kiln";

/// Resolved project directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub recipes: PathBuf,
    pub sources: PathBuf,
    pub work: PathBuf,
    pub destdir: PathBuf,
    pub packages: PathBuf,
    pub logs: PathBuf,
    pub state: PathBuf,
    pub registry: PathBuf,
    pub cache: PathBuf,
}

impl Layout {
    /// Derive the layout for a project root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let state = root.join(STATE_DIR);
        Self {
            recipes: root.join("recipes"),
            sources: root.join("sources"),
            work: root.join("work"),
            destdir: root.join("destdir"),
            packages: root.join("packages"),
            logs: root.join("logs"),
            registry: state.join("installed"),
            cache: state.join("cache"),
            state,
            root,
        }
    }

    /// Create every directory of the layout
    pub fn ensure(&self) -> io::Result<()> {
        for dir in [
            &self.recipes,
            &self.sources,
            &self.work,
            &self.destdir,
            &self.packages,
            &self.logs,
            &self.registry,
            &self.cache,
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Working tree for a package id (`name-version`)
    pub fn work_dir(&self, id: &str) -> PathBuf {
        self.work.join(id)
    }

    /// Staging root for a package id
    pub fn staging_dir(&self, id: &str) -> PathBuf {
        self.destdir.join(id)
    }

    /// Git checkout location for a package id
    pub fn checkout_dir(&self, id: &str) -> PathBuf {
        self.sources.join(id)
    }

    /// Per-package log file
    pub fn log_file(&self, id: &str) -> PathBuf {
        self.logs.join(format!("{}.log", id))
    }

    /// Registry entry directory for a package id
    pub fn registry_entry(&self, id: &str) -> PathBuf {
        self.registry.join(id)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = Layout::new("/srv/lfs");
        assert_eq!(layout.recipes, PathBuf::from("/srv/lfs/recipes"));
        assert_eq!(layout.registry, PathBuf::from("/srv/lfs/.kiln/installed"));
        assert_eq!(layout.cache, PathBuf::from("/srv/lfs/.kiln/cache"));
        assert_eq!(layout.staging_dir("foo-1.0"), PathBuf::from("/srv/lfs/destdir/foo-1.0"));
        assert_eq!(layout.log_file("foo-1.0"), PathBuf::from("/srv/lfs/logs/foo-1.0.log"));
        assert_eq!(
            layout.registry_entry("foo-1.0"),
            PathBuf::from("/srv/lfs/.kiln/installed/foo-1.0")
        );
    }

    #[test]
    fn test_ensure_creates_directories() {
        let temp = tempfile::tempdir().unwrap();
        let layout = Layout::new(temp.path());
        layout.ensure().unwrap();

        assert!(layout.sources.is_dir());
        assert!(layout.packages.is_dir());
        assert!(layout.registry.is_dir());
        assert!(layout.cache.is_dir());
    }
}

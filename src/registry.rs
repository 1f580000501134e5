// src/registry.rs

//! Installed-package registry
//!
//! Each install leaves an entry at `.kiln/installed/<name>-<version>/`:
//!
//! - `manifest`: one line per regular file or non-directory symlink of the
//!   staging root, written as an absolute path (`/usr/bin/foo`) but stored
//!   relative to that root
//! - `meta`: TOML record with name, version and install time
//!
//! The manifest is the only authority for removal: nothing outside the paths
//! it lists is deleted file by file. Entries are written wholesale and never
//! edited in place.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const MANIFEST_FILE: &str = "manifest";
pub const META_FILE: &str = "meta";

/// Metadata stored beside a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMeta {
    pub name: String,
    pub version: String,
    pub installed_at: DateTime<Utc>,
}

impl PackageMeta {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            installed_at: Utc::now(),
        }
    }

    pub fn id(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

/// Ordered list of installed files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<String>,
}

impl Manifest {
    /// Walk `staging` depth-first in sorted order, recording regular files
    /// and symlinks
    ///
    /// Symlinks are recorded as links, whatever they point at, unless they
    /// resolve to a directory. Names that are not valid UTF-8 are rejected
    /// since the manifest is a text file.
    pub fn capture(staging: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(staging).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::IoError(format!("cannot walk {}: {}", staging.display(), e)))?;
            let file_type = entry.file_type();
            let listed = file_type.is_file()
                || (file_type.is_symlink()
                    && !fs::metadata(entry.path()).map(|m| m.is_dir()).unwrap_or(false));
            if !listed {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(staging)
                .map_err(|e| Error::IoError(e.to_string()))?;
            let rel = rel.to_str().ok_or_else(|| {
                Error::IoError(format!(
                    "file name is not valid UTF-8: {}",
                    entry.path().display()
                ))
            })?;
            entries.push(format!("/{}", rel));
        }
        Ok(Self { entries })
    }

    /// Read manifest text; only empty lines are dropped
    pub fn parse(text: &str) -> Self {
        Self {
            entries: text
                .split('\n')
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_text(&self) -> String {
        let mut text = self.entries.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }

    /// Location of an entry under `root`, `None` if it would escape it
    pub fn resolve(entry: &str, root: &Path) -> Option<PathBuf> {
        let rel = Path::new(entry.trim_start_matches('/'));
        if rel.as_os_str().is_empty() {
            return None;
        }
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(root.join(rel))
    }
}

/// A registry entry on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub id: String,
    pub dir: PathBuf,
}

impl RegistryEntry {
    pub fn manifest(&self) -> Result<Manifest> {
        let path = self.dir.join(MANIFEST_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Manifest::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::ManifestMissing(self.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stored metadata, `None` if absent or unreadable
    pub fn meta(&self) -> Option<PackageMeta> {
        let text = fs::read_to_string(self.dir.join(META_FILE)).ok()?;
        match toml::from_str(&text) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!("Unreadable meta for {}: {}", self.id, e);
                None
            }
        }
    }
}

/// Outcome of a manifest-driven removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveResult {
    pub id: String,
    pub staging: PathBuf,
    /// Manifest entries
    pub listed: usize,
    /// Listed files that existed and were deleted
    pub removed: usize,
    /// Files left in the staging root that the manifest did not list
    pub unmanifested: usize,
}

/// The registry directory
#[derive(Debug, Clone)]
pub struct Registry {
    dir: PathBuf,
}

impl Registry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a registry entry, replacing any previous one for the same id
    pub fn record(&self, meta: &PackageMeta, manifest: &Manifest) -> Result<RegistryEntry> {
        let id = meta.id();
        let dir = self.dir.join(&id);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;

        fs::write(dir.join(MANIFEST_FILE), manifest.to_text())?;
        let meta_text = toml::to_string(meta)
            .map_err(|e| Error::IoError(format!("cannot serialize meta for {}: {}", id, e)))?;
        fs::write(dir.join(META_FILE), meta_text)?;

        info!("Registered {} ({} files)", id, manifest.len());
        Ok(RegistryEntry { id, dir })
    }

    /// All entries, sorted by id
    pub fn entries(&self) -> Result<Vec<RegistryEntry>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                entries.push(RegistryEntry {
                    id: entry.file_name().to_string_lossy().into_owned(),
                    dir: entry.path(),
                });
            }
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    /// Find the entry for `ident`: exact id first, then the first id
    /// starting with `<ident>-`
    pub fn resolve(&self, ident: &str) -> Result<RegistryEntry> {
        let entries = self.entries()?;
        let prefix = format!("{}-", ident);

        entries
            .iter()
            .find(|e| e.id == ident)
            .or_else(|| entries.iter().find(|e| e.id.starts_with(&prefix)))
            .cloned()
            .ok_or_else(|| Error::NotRegistered(ident.to_string()))
    }

    /// Delete an entry directory
    pub fn forget(&self, entry: &RegistryEntry) -> Result<()> {
        fs::remove_dir_all(&entry.dir)?;
        debug!("Removed registry entry {}", entry.id);
        Ok(())
    }
}

/// Delete the files listed in `manifest` from `staging`, then wipe `staging`
///
/// Missing files are tolerated. Files the manifest does not list are counted
/// before the wipe.
pub fn remove_staged(id: &str, manifest: &Manifest, staging: &Path) -> Result<RemoveResult> {
    let mut removed = 0;
    for entry in manifest.entries() {
        let Some(path) = Manifest::resolve(entry, staging) else {
            warn!("Ignoring manifest entry outside the staging root: {}", entry);
            continue;
        };
        match fs::symlink_metadata(&path) {
            Ok(meta) if !meta.is_dir() => {
                fs::remove_file(&path)?;
                removed += 1;
            }
            Ok(_) => debug!("Manifest entry is now a directory, leaving it: {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Already gone: {}", path.display());
            }
            Err(e) => return Err(e.into()),
        }
    }

    let mut unmanifested = 0;
    if staging.exists() {
        unmanifested = WalkDir::new(staging)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| !e.file_type().is_dir())
            .count();
        fs::remove_dir_all(staging)?;
    }

    Ok(RemoveResult {
        id: id.to_string(),
        staging: staging.to_path_buf(),
        listed: manifest.len(),
        removed,
        unmanifested,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populate(staging: &Path, files: &[&str]) {
        for file in files {
            let path = staging.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, file.as_bytes()).unwrap();
        }
    }

    #[test]
    fn test_capture_lists_exactly_regular_files() {
        let temp = tempfile::tempdir().unwrap();
        let staging = temp.path().join("foo-1.0");
        populate(&staging, &["usr/bin/foo", "usr/lib/libfoo.so.1", "etc/foo.conf"]);
        fs::create_dir_all(staging.join("usr/share/empty")).unwrap();

        let manifest = Manifest::capture(&staging).unwrap();
        assert_eq!(
            manifest.entries(),
            &["/etc/foo.conf", "/usr/bin/foo", "/usr/lib/libfoo.so.1"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_records_symlinks() {
        let temp = tempfile::tempdir().unwrap();
        let staging = temp.path().join("foo-1.0");
        populate(&staging, &["usr/lib/libfoo.so.1", "usr/share/foo/data"]);
        std::os::unix::fs::symlink("libfoo.so.1", staging.join("usr/lib/libfoo.so")).unwrap();
        // Absolute targets dangle inside the staging root
        std::os::unix::fs::symlink("/usr/lib/libfoo.so.1", staging.join("usr/lib/libfoo.so.1.0"))
            .unwrap();
        std::os::unix::fs::symlink("foo", staging.join("usr/share/foo-data")).unwrap();

        let manifest = Manifest::capture(&staging).unwrap();
        assert_eq!(
            manifest.entries(),
            &[
                "/usr/lib/libfoo.so",
                "/usr/lib/libfoo.so.1",
                "/usr/lib/libfoo.so.1.0",
                "/usr/share/foo/data",
            ]
        );

        let result = remove_staged("foo-1.0", &manifest, &staging).unwrap();
        assert_eq!(result.removed, 4);
        assert_eq!(result.unmanifested, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_rejects_non_utf8_names() {
        use std::os::unix::ffi::OsStrExt;

        let temp = tempfile::tempdir().unwrap();
        let staging = temp.path().join("foo-1.0");
        fs::create_dir_all(&staging).unwrap();
        let name = std::ffi::OsStr::from_bytes(b"bad\xffname");
        if fs::write(staging.join(name), "x").is_err() {
            eprintln!("Skipping: filesystem refuses non-UTF-8 names");
            return;
        }

        assert!(matches!(Manifest::capture(&staging), Err(Error::IoError(_))));
    }

    #[test]
    fn test_parse_keeps_surrounding_whitespace() {
        let manifest = Manifest::parse("/usr/share/doc/ notes.txt\n/etc/foo.conf \n\n");
        assert_eq!(manifest.entries(), &["/usr/share/doc/ notes.txt", "/etc/foo.conf "]);
    }

    #[test]
    fn test_manifest_text_round_trip() {
        let manifest = Manifest::parse("/usr/bin/foo\n\n/etc/foo.conf\n");
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.to_text(), "/usr/bin/foo\n/etc/foo.conf\n");
        assert_eq!(Manifest::default().to_text(), "");
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let root = Path::new("/stage");
        assert_eq!(
            Manifest::resolve("/usr/bin/foo", root),
            Some(PathBuf::from("/stage/usr/bin/foo"))
        );
        assert_eq!(Manifest::resolve("/../etc/passwd", root), None);
        assert_eq!(Manifest::resolve("/", root), None);
    }

    #[test]
    fn test_record_and_resolve() {
        let temp = tempfile::tempdir().unwrap();
        let registry = Registry::new(temp.path().join("installed"));
        let manifest = Manifest::parse("/usr/bin/foo\n");

        registry.record(&PackageMeta::new("foo", "1.0"), &manifest).unwrap();
        registry.record(&PackageMeta::new("foobar", "2.0"), &manifest).unwrap();

        assert_eq!(registry.resolve("foo-1.0").unwrap().id, "foo-1.0");
        assert_eq!(registry.resolve("foo").unwrap().id, "foo-1.0");
        assert_eq!(registry.resolve("foobar").unwrap().id, "foobar-2.0");
        assert!(matches!(registry.resolve("fo"), Err(Error::NotRegistered(_))));

        let entry = registry.resolve("foo").unwrap();
        assert_eq!(entry.manifest().unwrap(), manifest);
        let meta = entry.meta().unwrap();
        assert_eq!(meta.name, "foo");
        assert_eq!(meta.version, "1.0");
    }

    #[test]
    fn test_record_overwrites_wholesale() {
        let temp = tempfile::tempdir().unwrap();
        let registry = Registry::new(temp.path());
        let meta = PackageMeta::new("foo", "1.0");

        let entry = registry.record(&meta, &Manifest::parse("/a\n/b\n")).unwrap();
        fs::write(entry.dir.join("stray"), "x").unwrap();
        let entry = registry.record(&meta, &Manifest::parse("/c\n")).unwrap();

        assert_eq!(entry.manifest().unwrap().entries(), &["/c"]);
        assert!(!entry.dir.join("stray").exists());
    }

    #[test]
    fn test_missing_manifest() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("foo-1.0")).unwrap();
        let entry = Registry::new(temp.path()).resolve("foo").unwrap();
        assert!(matches!(entry.manifest(), Err(Error::ManifestMissing(_))));
        assert!(entry.meta().is_none());
    }

    #[test]
    fn test_remove_staged_counts() {
        let temp = tempfile::tempdir().unwrap();
        let staging = temp.path().join("foo-1.0");
        populate(&staging, &["usr/bin/foo", "usr/share/doc/foo.txt", "leftover.o"]);
        let manifest = Manifest::parse("/usr/bin/foo\n/usr/share/doc/foo.txt\n/usr/lib/gone.so\n");

        let result = remove_staged("foo-1.0", &manifest, &staging).unwrap();
        assert_eq!(result.listed, 3);
        assert_eq!(result.removed, 2);
        assert_eq!(result.unmanifested, 1);
        assert!(!staging.exists());
    }

    #[test]
    fn test_remove_staged_without_staging_root() {
        let temp = tempfile::tempdir().unwrap();
        let manifest = Manifest::parse("/usr/bin/foo\n");
        let result = remove_staged("foo-1.0", &manifest, &temp.path().join("gone")).unwrap();
        assert_eq!(result.removed, 0);
        assert_eq!(result.unmanifested, 0);
    }
}

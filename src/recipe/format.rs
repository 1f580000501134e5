// src/recipe/format.rs

//! Recipe data model
//!
//! A recipe is an INI file with three sections:
//!
//! ```ini
//! [package]
//! name=foo
//! version=1.0
//! source=https://example.org/foo-1.0.tar.gz
//! checksum=<sha256>
//! patches=https://example.org/fix.patch, git+https://example.org/patches.git
//! strip=true
//! fakeroot=true
//! pack=zst
//!
//! [build]
//! config=./configure --prefix=/usr
//! build=make
//! install=make DESTDIR="$DESTDIR" install
//!
//! [hooks]
//! postremove=ldconfig
//! ```

use crate::compression::CompressionFormat;
use std::fmt;

/// A parsed recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub name: String,
    pub version: String,
    pub homepage: String,
    pub desc: String,
    pub license: String,

    /// Archive URL (`source=`)
    pub source_url: Option<String>,
    /// Git repository URL (`git=`), preferred over `source_url` when both are set
    pub git_url: Option<String>,
    /// Optional sha256 of the archive source
    pub checksum: Option<String>,

    /// Patch specifications, applied in this order
    pub patches: Vec<String>,

    /// Strip ELF objects in the staging root after install
    pub strip: bool,
    /// Run the install phase under fakeroot
    pub fakeroot: bool,
    /// Compression of the output package
    pub pack: CompressionFormat,

    pub phases: BuildPhases,
    pub hooks: Hooks,
}

impl Default for Recipe {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            homepage: String::new(),
            desc: String::new(),
            license: String::new(),
            source_url: None,
            git_url: None,
            checksum: None,
            patches: Vec::new(),
            strip: false,
            fakeroot: true,
            pack: CompressionFormat::Zstd,
            phases: BuildPhases::default(),
            hooks: Hooks::default(),
        }
    }
}

impl Recipe {
    /// Package identifier: `name-version`
    pub fn id(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Where the sources come from, git winning over an archive URL
    pub fn origin(&self) -> Option<SourceOrigin<'_>> {
        if let Some(url) = self.git_url.as_deref() {
            return Some(SourceOrigin::Git(url));
        }
        self.source_url.as_deref().map(SourceOrigin::Archive)
    }

    /// Configured checksum, if any
    pub fn expected_checksum(&self) -> Option<&str> {
        self.checksum.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Output package file name: `<name>-<version>.<ext>`
    pub fn package_filename(&self) -> String {
        format!("{}.{}", self.id(), self.pack.archive_extension())
    }
}

/// Source origin of a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin<'a> {
    Archive(&'a str),
    Git(&'a str),
}

/// Shell command strings of the five build phases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPhases {
    pub preconfig: String,
    pub config: String,
    pub build: String,
    pub install: String,
    pub postinstall: String,
}

impl BuildPhases {
    /// Command configured for a phase (may be empty)
    pub fn command(&self, phase: Phase) -> &str {
        match phase {
            Phase::Preconfig => &self.preconfig,
            Phase::Config => &self.config,
            Phase::Build => &self.build,
            Phase::Install => &self.install,
            Phase::Postinstall => &self.postinstall,
        }
    }
}

/// Hook command strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hooks {
    pub postremove: String,
    pub postsync: String,
}

/// Build phases in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Preconfig,
    Config,
    Build,
    Install,
    Postinstall,
}

impl Phase {
    /// All phases in the order they run
    pub const ALL: [Phase; 5] = [
        Phase::Preconfig,
        Phase::Config,
        Phase::Build,
        Phase::Install,
        Phase::Postinstall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preconfig => "preconfig",
            Self::Config => "config",
            Self::Build => "build",
            Self::Install => "install",
            Self::Postinstall => "postinstall",
        }
    }

    /// Exit status reported when this phase fails
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Preconfig => 5,
            Self::Config => 6,
            Self::Build => 7,
            Self::Install => 8,
            Self::Postinstall => 9,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

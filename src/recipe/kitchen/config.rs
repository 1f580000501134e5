// src/recipe/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::config::Layout;
use crate::registry::RemoveResult;
use std::path::PathBuf;

use super::inspect::{RevdepReport, StripReport};

/// Configuration for the Kitchen
#[derive(Debug, Clone)]
pub struct KitchenConfig {
    /// Project directories
    pub layout: Layout,
    /// Number of parallel jobs exported to build phases
    pub jobs: u32,
    /// Installation prefix exported as `PREFIX`
    pub prefix: String,
    /// Strip binaries even when the recipe does not ask for it
    pub force_strip: bool,
    /// Show spinners and status lines
    pub interactive: bool,
    /// Program used to wrap the install phase
    pub fakeroot_program: String,
    pub strip_program: String,
    pub ldd_program: String,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        Self {
            layout: Layout::new("."),
            jobs,
            prefix: "/usr".to_string(),
            force_strip: false,
            interactive: false,
            fakeroot_program: "fakeroot".to_string(),
            strip_program: "strip".to_string(),
            ldd_program: "ldd".to_string(),
        }
    }
}

impl KitchenConfig {
    /// Configuration rooted at a project directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: Layout::new(root),
            ..Self::default()
        }
    }

    pub fn with_jobs(mut self, jobs: u32) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_force_strip(mut self, force: bool) -> Self {
        self.force_strip = force;
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }
}

/// Knobs for a single cook
#[derive(Debug, Clone, Copy, Default)]
pub struct CookOptions {
    /// Run the reverse-dependency scan after staging
    pub revdep: bool,
}

/// Result of cooking a recipe
#[derive(Debug)]
pub struct CookResult {
    /// Package identifier (`name-version`)
    pub id: String,
    /// Staging root holding the installed files
    pub staging: PathBuf,
    /// Registry entry written for the install
    pub registry_entry: PathBuf,
    /// Number of files recorded in the manifest
    pub files: usize,
    /// Strip outcome, when stripping ran
    pub strip: Option<StripReport>,
    /// Reverse-dependency scan, when requested
    pub revdep: Option<RevdepReport>,
    /// Warnings generated during the cook
    pub warnings: Vec<String>,
}

/// Result of removing an installed package
#[derive(Debug)]
pub struct RemoveOutcome {
    pub removal: RemoveResult,
    /// Whether a postremove hook ran and succeeded
    pub hook_ran: bool,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kitchen_config_default() {
        let config = KitchenConfig::default();
        assert!(config.jobs > 0);
        assert_eq!(config.prefix, "/usr");
        assert!(!config.force_strip);
        assert_eq!(config.fakeroot_program, "fakeroot");
    }

    #[test]
    fn test_kitchen_config_builders() {
        let config = KitchenConfig::new("/srv/lfs")
            .with_jobs(0)
            .with_force_strip(true);
        assert_eq!(config.jobs, 1);
        assert!(config.force_strip);
        assert_eq!(config.layout.root, PathBuf::from("/srv/lfs"));
    }
}

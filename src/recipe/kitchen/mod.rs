// src/recipe/kitchen/mod.rs

//! Kitchen: where recipes are cooked
//!
//! The Kitchen owns the explicit configuration and drives every stage of a
//! package's life:
//! - Fetching, extracting and patching sources
//! - Running the build phases into a private staging root
//! - Recording the manifest in the registry
//! - Packaging the staging root as a compressed tarball
//! - Removing an install and checking it for broken library links

mod archive;
pub mod command;
mod config;
mod cook;
pub mod inspect;
pub mod patches;
pub mod phases;
pub mod source;

pub use archive::{extract, pack_staging, ArchiveKind};
pub use command::{BuildLog, CommandRunner, CommandStatus, ExternalCommand};
pub use config::{CookOptions, CookResult, KitchenConfig, RemoveOutcome};
pub use cook::{Cook, Plated};
pub use inspect::{BrokenObject, RevdepReport, StripReport};
pub use source::FetchedSource;

use crate::config::Layout;
use crate::error::{Error, Result};
use crate::recipe::format::Recipe;
use crate::recipe::index::RecipeIndex;
use crate::registry::{remove_staged, Registry};
use phases::PhaseEnv;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The Kitchen: where recipes are cooked
pub struct Kitchen {
    config: KitchenConfig,
    recipes: RecipeIndex,
    registry: Registry,
}

impl Kitchen {
    /// Create a new Kitchen with the given configuration
    pub fn new(config: KitchenConfig) -> Self {
        let recipes = RecipeIndex::new(&config.layout.recipes);
        let registry = Registry::new(&config.layout.registry);
        Self {
            config,
            recipes,
            registry,
        }
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.config.layout
    }

    pub fn recipes(&self) -> &RecipeIndex {
        &self.recipes
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Find and parse a recipe by name
    pub fn load_recipe(&self, name: &str) -> Result<Recipe> {
        let (path, recipe) = self.recipes.load(name)?;
        debug!("Loaded recipe {} from {}", recipe.id(), path.display());
        Ok(recipe)
    }

    /// Start a cook without running any stage
    pub fn start<'a>(&'a self, recipe: &'a Recipe) -> Result<Cook<'a>> {
        self.layout().ensure()?;
        Cook::new(self, recipe)
    }

    /// Fetch, extract and patch; returns the working tree
    pub fn prepare(&self, recipe: &Recipe) -> Result<PathBuf> {
        let mut cook = self.start(recipe)?;
        cook.prep()?;
        let work_dir = cook.unpack()?.to_path_buf();
        cook.patch()?;
        Ok(work_dir)
    }

    /// Cook a recipe through install and registration
    ///
    /// ## Full Cooking Process
    /// 1. **Prep**: fetch sources
    /// 2. **Unpack**: extract into `work/<id>` (or use the git checkout)
    /// 3. **Patch**: apply patches in order
    /// 4. **Simmer**: run preconfig, config, build, install, postinstall
    /// 5. **Plate**: strip (recipe or config asks), manifest, registry entry
    /// 6. Optionally scan the staging root for broken library links
    pub fn cook(&self, recipe: &Recipe, options: CookOptions) -> Result<CookResult> {
        info!("Cooking {}", recipe.id());
        let mut cook = self.start(recipe)?;

        cook.prep()?;
        cook.unpack()?;
        cook.patch()?;
        cook.simmer()?;
        let plated = cook.plate(recipe.strip || self.config.force_strip)?;

        let mut warnings = cook.take_warnings();
        let revdep = if options.revdep {
            advisory_revdep(cook.staging(), &self.config.ldd_program, cook.runner(), &mut warnings)
        } else {
            None
        };

        Ok(CookResult {
            id: cook.id().to_string(),
            staging: cook.staging().to_path_buf(),
            registry_entry: plated.entry.dir,
            files: plated.files,
            strip: plated.strip,
            revdep,
            warnings,
        })
    }

    /// Package the staging root of a recipe
    ///
    /// Fails with [`Error::NothingToPackage`] when there is no staging root.
    pub fn package(&self, recipe: &Recipe) -> Result<PathBuf> {
        let id = recipe.id();
        let staging = self.layout().staging_dir(&id);
        if !staging.is_dir() {
            return Err(Error::NothingToPackage(id));
        }

        let out = self.layout().packages.join(recipe.package_filename());
        let path = pack_staging(&staging, &out, recipe.pack)?;
        let log = BuildLog::open(self.layout().log_file(&id))?;
        log.note(&format!("=== package: {} ===", path.display()))?;
        Ok(path)
    }

    /// Scan the staging root of a recipe for broken library links
    pub fn revdep(&self, recipe: &Recipe) -> Result<RevdepReport> {
        let id = recipe.id();
        let staging = self.layout().staging_dir(&id);
        if !staging.is_dir() {
            return Ok(RevdepReport {
                skipped: Some(format!("no staging root for {}", id)),
                ..Default::default()
            });
        }
        let runner = self.runner_for(&id)?;
        inspect::revdep(&staging, &self.config.ldd_program, &runner)
    }

    /// Remove an installed package by id or name
    ///
    /// Resolution and manifest loading happen before anything is touched.
    /// After the listed files are deleted and the staging root is wiped, the
    /// recipe's postremove hook runs if the recipe can still be found. The
    /// registry entry is deleted whether or not the hook succeeded.
    pub fn remove(&self, ident: &str) -> Result<RemoveOutcome> {
        let entry = self.registry.resolve(ident)?;
        let manifest = entry.manifest()?;
        let staging = self.layout().staging_dir(&entry.id);

        let removal = remove_staged(&entry.id, &manifest, &staging)?;
        info!(
            "Removed {} of {} listed files for {}",
            removal.removed, removal.listed, entry.id
        );

        let mut warnings = Vec::new();
        if removal.unmanifested > 0 {
            warnings.push(format!(
                "{} file(s) not in the manifest were wiped with {}",
                removal.unmanifested,
                staging.display()
            ));
        }

        let name = entry
            .meta()
            .map(|meta| meta.name)
            .unwrap_or_else(|| guess_name(&entry.id).to_string());
        let hook_ran = match self.run_postremove(&name, &entry.id, &staging) {
            Ok(ran) => ran,
            Err(e) => {
                warn!("postremove hook for {} failed: {}", entry.id, e);
                warnings.push(format!("postremove hook failed: {}", e));
                false
            }
        };

        self.registry.forget(&entry)?;
        Ok(RemoveOutcome {
            removal,
            hook_ran,
            warnings,
        })
    }

    fn run_postremove(&self, name: &str, id: &str, staging: &Path) -> Result<bool> {
        let recipe = match self.load_recipe(name) {
            Ok(recipe) => recipe,
            Err(e) => {
                debug!("No recipe for {} ({}), skipping postremove", name, e);
                return Ok(false);
            }
        };
        // Lookup falls back to substring matches; only the package's own hook runs
        if recipe.name != name {
            debug!(
                "Recipe lookup for {} found {}, skipping postremove",
                name, recipe.name
            );
            return Ok(false);
        }
        let hook = recipe.hooks.postremove.trim();
        if hook.is_empty() {
            return Ok(false);
        }

        let env = PhaseEnv {
            destdir: staging.to_path_buf(),
            prefix: self.config.prefix.clone(),
            jobs: self.config.jobs,
        };
        let runner = self.runner_for(id)?;
        let outcome = runner.run(&env.shell(hook, self.layout().root()), "postremove")?;
        if !outcome.success() {
            return Err(Error::IoError(format!(
                "postremove exited with {}",
                outcome
                    .code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string())
            )));
        }
        Ok(true)
    }

    fn runner_for(&self, id: &str) -> Result<CommandRunner> {
        let log = BuildLog::open(self.layout().log_file(id))?;
        Ok(CommandRunner::new(log, self.config.interactive))
    }
}

/// Warning lines for a revdep report
pub fn revdep_warnings(report: &RevdepReport) -> Vec<String> {
    let mut warnings: Vec<String> = report
        .broken
        .iter()
        .map(|b| {
            if b.missing.is_empty() {
                format!("broken: {}", b.path.display())
            } else {
                format!("broken: {} (missing {})", b.path.display(), b.missing.join(", "))
            }
        })
        .collect();
    if let Some(reason) = &report.skipped {
        warnings.push(format!("revdep skipped: {}", reason));
    }
    warnings
}

/// Run the revdep check after a successful install
///
/// The install is already registered, so a failure of the check itself only
/// adds a warning.
fn advisory_revdep(
    staging: &Path,
    ldd_program: &str,
    runner: &CommandRunner,
    warnings: &mut Vec<String>,
) -> Option<RevdepReport> {
    match inspect::revdep(staging, ldd_program, runner) {
        Ok(report) => {
            warnings.extend(revdep_warnings(&report));
            Some(report)
        }
        Err(e) => {
            warn!("revdep check of {} failed: {}", staging.display(), e);
            warnings.push(format!("revdep check failed: {}", e));
            None
        }
    }
}

/// Package name from an id, everything before the last `-`
fn guess_name(id: &str) -> &str {
    id.rsplit_once('-').map(|(name, _)| name).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Manifest, PackageMeta};
    use std::fs;

    fn kitchen(root: &Path) -> Kitchen {
        Kitchen::new(KitchenConfig::new(root))
    }

    #[test]
    fn test_guess_name() {
        assert_eq!(guess_name("foo-1.0"), "foo");
        assert_eq!(guess_name("foo-bar-2.1"), "foo-bar");
        assert_eq!(guess_name("foo"), "foo");
    }

    #[test]
    fn test_package_before_install() {
        let temp = tempfile::tempdir().unwrap();
        let kitchen = kitchen(temp.path());
        let recipe = Recipe {
            name: "foo".to_string(),
            version: "1.0".to_string(),
            ..Default::default()
        };

        let err = kitchen.package(&recipe).unwrap_err();
        assert!(matches!(err, Error::NothingToPackage(_)));
        assert_eq!(err.exit_code(), 10);
        assert!(!kitchen.layout().packages.join(recipe.package_filename()).exists());
    }

    #[test]
    fn test_remove_unknown_mutates_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let kitchen = kitchen(temp.path());

        let err = kitchen.remove("ghost").unwrap_err();
        assert!(matches!(err, Error::NotRegistered(_)));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_remove_without_recipe() {
        let temp = tempfile::tempdir().unwrap();
        let kitchen = kitchen(temp.path());
        let staging = kitchen.layout().staging_dir("foo-1.0");
        fs::create_dir_all(staging.join("usr/bin")).unwrap();
        fs::write(staging.join("usr/bin/foo"), "bin").unwrap();

        let manifest = Manifest::capture(&staging).unwrap();
        kitchen
            .registry()
            .record(&PackageMeta::new("foo", "1.0"), &manifest)
            .unwrap();

        let outcome = kitchen.remove("foo").unwrap();
        assert_eq!(outcome.removal.removed, 1);
        assert!(!outcome.hook_ran);
        assert!(!staging.exists());
        assert!(kitchen.registry().resolve("foo").is_err());
    }

    #[test]
    fn test_remove_ignores_recipe_of_another_package() {
        let temp = tempfile::tempdir().unwrap();
        let kitchen = kitchen(temp.path());
        let recipe_dir = kitchen.layout().recipes.join("foobar");
        fs::create_dir_all(&recipe_dir).unwrap();
        fs::write(
            recipe_dir.join("foobar.ini"),
            "[package]\nname=foobar\nversion=2.0\n\n[hooks]\npostremove=touch foobar-hook.ran\n",
        )
        .unwrap();

        let staging = kitchen.layout().staging_dir("foo-1.0");
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("foo"), "bin").unwrap();
        kitchen
            .registry()
            .record(&PackageMeta::new("foo", "1.0"), &Manifest::capture(&staging).unwrap())
            .unwrap();

        let outcome = kitchen.remove("foo").unwrap();
        assert!(!outcome.hook_ran);
        assert!(!temp.path().join("foobar-hook.ran").exists());
        assert!(kitchen.registry().resolve("foo").is_err());
    }

    #[test]
    fn test_steps_out_of_order() {
        let temp = tempfile::tempdir().unwrap();
        let kitchen = kitchen(temp.path());
        let recipe = Recipe {
            name: "foo".to_string(),
            version: "1.0".to_string(),
            ..Default::default()
        };
        let mut cook = kitchen.start(&recipe).unwrap();

        let err = cook.plate(false).unwrap_err();
        assert!(matches!(err, Error::OutOfOrder { step: "plate", needs: "simmer", .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(matches!(cook.unpack(), Err(Error::OutOfOrder { needs: "prep", .. })));
        assert!(matches!(cook.patch(), Err(Error::OutOfOrder { needs: "unpack", .. })));
        assert!(kitchen.registry().entries().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_revdep_failure_after_install_is_a_warning() {
        use std::os::unix::fs::PermissionsExt;

        let Some(binary) = which::which("sh")
            .ok()
            .and_then(|sh| fs::canonicalize(sh).ok())
            .filter(|sh| inspect::linkage(sh) == Some(inspect::Linkage::Dynamic))
        else {
            eprintln!("Skipping: no dynamically linked sh");
            return;
        };
        let temp = tempfile::tempdir().unwrap();
        let staging = temp.path().join("destdir/foo-1.0");
        fs::create_dir_all(staging.join("usr/bin")).unwrap();
        fs::copy(&binary, staging.join("usr/bin/foo")).unwrap();

        let ldd = temp.path().join("fake-ldd");
        fs::write(&ldd, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&ldd, fs::Permissions::from_mode(0o755)).unwrap();

        // A directory where the log should be makes every logged call fail
        let log = temp.path().join("logs/foo-1.0.log");
        fs::create_dir_all(&log).unwrap();
        let runner = CommandRunner::new(BuildLog::open(&log).unwrap(), false);

        let mut warnings = Vec::new();
        let report = advisory_revdep(&staging, &ldd.to_string_lossy(), &runner, &mut warnings);
        assert!(report.is_none());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("revdep check failed"));
    }

    #[test]
    fn test_revdep_without_staging_is_advisory() {
        let temp = tempfile::tempdir().unwrap();
        let kitchen = kitchen(temp.path());
        let recipe = Recipe {
            name: "foo".to_string(),
            version: "1.0".to_string(),
            ..Default::default()
        };
        let report = kitchen.revdep(&recipe).unwrap();
        assert!(report.is_clean());
        assert!(report.skipped.is_some());
    }
}

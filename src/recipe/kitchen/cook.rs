// src/recipe/kitchen/cook.rs

//! Cook: the pipeline run for a single recipe
//!
//! States advance strictly in order and every step requires the previous one:
//!
//! 1. **prep**: fetch the source (download or clone)
//! 2. **unpack**: produce the working tree
//! 3. **patch**: apply the recipe's patches
//! 4. **simmer**: recreate the staging root and run the build phases
//! 5. **plate**: optional strip pass, then manifest capture and registration
//!
//! A failure anywhere stops the run. The staging root of a failed simmer is
//! left in place for inspection.

use crate::error::{Error, Result};
use crate::recipe::format::Recipe;
use crate::registry::{Manifest, PackageMeta, RegistryEntry};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::archive::extract;
use super::command::{BuildLog, CommandRunner};
use super::inspect::{strip_tree, StripReport};
use super::patches::PatchSet;
use super::phases::{PhaseEnv, PhaseRunner};
use super::source::{fetch, FetchedSource};
use super::Kitchen;

/// A single cook operation
pub struct Cook<'a> {
    kitchen: &'a Kitchen,
    recipe: &'a Recipe,
    id: String,
    runner: CommandRunner,
    source: Option<FetchedSource>,
    work_dir: Option<PathBuf>,
    staging: PathBuf,
    simmered: bool,
    warnings: Vec<String>,
}

/// What plating produced
#[derive(Debug)]
pub struct Plated {
    pub entry: RegistryEntry,
    pub files: usize,
    pub strip: Option<StripReport>,
}

impl<'a> Cook<'a> {
    pub(super) fn new(kitchen: &'a Kitchen, recipe: &'a Recipe) -> Result<Self> {
        let layout = kitchen.layout();
        let id = recipe.id();
        let log = BuildLog::open(layout.log_file(&id))?;
        let runner = CommandRunner::new(log, kitchen.config().interactive);

        Ok(Self {
            kitchen,
            recipe,
            staging: layout.staging_dir(&id),
            id,
            runner,
            source: None,
            work_dir: None,
            simmered: false,
            warnings: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn staging(&self) -> &Path {
        &self.staging
    }

    pub fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    /// Phase 1: Prep - fetch the source
    pub fn prep(&mut self) -> Result<&FetchedSource> {
        let layout = self.kitchen.layout();
        self.runner
            .log()
            .note(&format!("### {} ###", self.id))?;
        let source = fetch(self.recipe, layout, &self.runner)?;
        debug!("Fetched {} to {}", self.id, source.path().display());
        Ok(self.source.insert(source))
    }

    /// Phase 2: Unpack - produce the working tree
    pub fn unpack(&mut self) -> Result<&Path> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| self.out_of_order("unpack", "prep"))?;
        let work_dir = extract(source, &self.kitchen.layout().work_dir(&self.id), &self.runner)?;
        Ok(self.work_dir.insert(work_dir))
    }

    /// Phase 3: Patch - apply patches in declared order
    pub fn patch(&mut self) -> Result<usize> {
        let work_dir = self.require_work_dir("patch")?;
        let layout = self.kitchen.layout();
        PatchSet::new(&layout.cache, layout.root(), &self.runner).apply_all(&self.recipe.patches, &work_dir)
    }

    /// Phase 4: Simmer - recreate the staging root and run the build phases
    pub fn simmer(&mut self) -> Result<()> {
        let work_dir = self.require_work_dir("simmer")?;

        if self.staging.exists() {
            fs::remove_dir_all(&self.staging)?;
        }
        fs::create_dir_all(&self.staging)?;

        let config = self.kitchen.config();
        let env = PhaseEnv {
            destdir: self.staging.clone(),
            prefix: config.prefix.clone(),
            jobs: config.jobs,
        };
        let fakeroot = self.recipe.fakeroot.then_some(config.fakeroot_program.as_str());

        PhaseRunner::new(&self.runner, env, &work_dir)
            .with_fakeroot(fakeroot)
            .run_all(self.recipe)?;

        self.simmered = true;
        info!("Installed {} to {}", self.id, self.staging.display());
        Ok(())
    }

    /// Phase 5: Plate - strip, capture the manifest, register
    ///
    /// Strip problems become warnings; the manifest reflects the tree as it
    /// is after the strip pass.
    pub fn plate(&mut self, strip: bool) -> Result<Plated> {
        if !self.simmered {
            return Err(self.out_of_order("plate", "simmer"));
        }

        let strip_report = if strip {
            let report = strip_tree(&self.staging, &self.kitchen.config().strip_program, &self.runner)?;
            if let Some(reason) = &report.skipped {
                self.warnings.push(format!("strip skipped: {}", reason));
            }
            for file in &report.failed {
                warn!("strip failed for {}", file.display());
                self.warnings.push(format!("strip failed: {}", file.display()));
            }
            Some(report)
        } else {
            None
        };

        let manifest = Manifest::capture(&self.staging)?;
        let meta = PackageMeta::new(&self.recipe.name, &self.recipe.version);
        let entry = self.kitchen.registry().record(&meta, &manifest)?;

        Ok(Plated {
            entry,
            files: manifest.len(),
            strip: strip_report,
        })
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub(super) fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    fn require_work_dir(&self, step: &'static str) -> Result<PathBuf> {
        self.work_dir
            .clone()
            .ok_or_else(|| self.out_of_order(step, "unpack"))
    }

    fn out_of_order(&self, step: &'static str, needs: &'static str) -> Error {
        Error::OutOfOrder {
            id: self.id.clone(),
            step,
            needs,
        }
    }
}

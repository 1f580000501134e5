// src/recipe/kitchen/phases.rs

//! Build phase execution
//!
//! Phases run strictly in order: preconfig, config, build, install,
//! postinstall. Each non-empty command runs as `sh -c "set -e; <cmd>"` in the
//! working tree with this environment:
//!
//! | Variable    | Value                      |
//! |-------------|----------------------------|
//! | `DESTDIR`   | staging root               |
//! | `PREFIX`    | install prefix (`/usr`)    |
//! | `JOBS`      | parallelism hint           |
//! | `MAKEFLAGS` | `-j<JOBS>`                 |
//!
//! An empty command skips its phase. Install is special: it falls back to
//! [`DEFAULT_INSTALL`] and may run under a fakeroot wrapper.

use crate::error::{Error, Result};
use crate::progress::status;
use crate::recipe::format::{Phase, Recipe};
use std::path::{Path, PathBuf};
use tracing::info;

use super::command::{CommandRunner, ExternalCommand};

/// Install command used when a recipe leaves `install=` blank
pub const DEFAULT_INSTALL: &str = r#"make DESTDIR="$DESTDIR" install"#;

/// Environment exported to phase and hook commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseEnv {
    pub destdir: PathBuf,
    pub prefix: String,
    pub jobs: u32,
}

impl PhaseEnv {
    pub fn vars(&self) -> Vec<(String, String)> {
        vec![
            ("DESTDIR".to_string(), self.destdir.display().to_string()),
            ("PREFIX".to_string(), self.prefix.clone()),
            ("JOBS".to_string(), self.jobs.to_string()),
            ("MAKEFLAGS".to_string(), format!("-j{}", self.jobs)),
        ]
    }

    /// `sh -c "set -e; <script>"` in `cwd` with this environment
    pub fn shell(&self, script: &str, cwd: &Path) -> ExternalCommand {
        ExternalCommand::new("sh")
            .arg("-c")
            .arg(format!("set -e; {}", script))
            .current_dir(cwd)
            .envs(self.vars())
    }
}

/// What happened to a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Ran,
    Skipped,
}

/// Runs the phases of one recipe
pub struct PhaseRunner<'a> {
    runner: &'a CommandRunner,
    env: PhaseEnv,
    work_dir: &'a Path,
    /// Wrapper for the install phase, when enabled
    fakeroot: Option<&'a str>,
}

impl<'a> PhaseRunner<'a> {
    pub fn new(runner: &'a CommandRunner, env: PhaseEnv, work_dir: &'a Path) -> Self {
        Self {
            runner,
            env,
            work_dir,
            fakeroot: None,
        }
    }

    pub fn with_fakeroot(mut self, program: Option<&'a str>) -> Self {
        self.fakeroot = program;
        self
    }

    /// Command that a phase would run, `None` when the phase is skipped
    pub fn command_for(&self, recipe: &Recipe, phase: Phase) -> Option<ExternalCommand> {
        let script = recipe.phases.command(phase).trim();
        let script = match (phase, script.is_empty()) {
            (Phase::Install, true) => DEFAULT_INSTALL,
            (_, true) => return None,
            (_, false) => script,
        };

        let command = self.env.shell(script, self.work_dir);
        match (phase, self.fakeroot) {
            (Phase::Install, Some(wrapper)) => Some(command.wrapped_in(wrapper)),
            _ => Some(command),
        }
    }

    /// Run a single phase
    pub fn run(&self, recipe: &Recipe, phase: Phase) -> Result<PhaseOutcome> {
        let Some(command) = self.command_for(recipe, phase) else {
            info!("Skipping empty {} phase", phase);
            self.runner.log().note(&format!("=== {} skipped (empty) ===", phase))?;
            status::info(&format!("skip {}", phase));
            return Ok(PhaseOutcome::Skipped);
        };

        let outcome = self.runner.run(&command, phase.as_str())?;
        if !outcome.success() {
            return Err(Error::PhaseFailed {
                phase,
                code: outcome.code,
            });
        }
        Ok(PhaseOutcome::Ran)
    }

    /// Run all phases in order, stopping at the first failure
    pub fn run_all(&self, recipe: &Recipe) -> Result<Vec<(Phase, PhaseOutcome)>> {
        Phase::ALL
            .iter()
            .map(|&phase| self.run(recipe, phase).map(|outcome| (phase, outcome)))
            .collect()
    }
}

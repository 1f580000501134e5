// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use kiln::progress::status;
use kiln::{Kitchen, KitchenConfig};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        status::fail(&format!("{:#}", err));
        let code = err
            .downcast_ref::<kiln::Error>()
            .map(kiln::Error::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let root = std::path::absolute(&cli.root)
        .with_context(|| format!("Invalid project root: {}", cli.root.display()))?;

    let mut config = KitchenConfig::new(root)
        .with_force_strip(cli.strip)
        .with_interactive(true);
    if let Some(jobs) = cli.jobs {
        config = config.with_jobs(jobs);
    }
    let kitchen = Kitchen::new(config);

    match cli.command {
        Commands::Info { name } => commands::cmd_info(&kitchen, &name),
        Commands::Search { term } => commands::cmd_search(&kitchen, &term),
        Commands::Fetch { name } | Commands::Extract { name } | Commands::Patch { name } => {
            commands::cmd_prepare(&kitchen, &name)
        }
        Commands::Build { name } | Commands::Install { name } => {
            commands::cmd_build(&kitchen, &name)
        }
        Commands::Bi { name } => commands::cmd_bi(&kitchen, &name),
        Commands::Package { name } => commands::cmd_package(&kitchen, &name),
        Commands::Remove { ident } => commands::cmd_remove(&kitchen, &ident),
        Commands::Revdep { name } => commands::cmd_revdep(&kitchen, &name),
    }
}

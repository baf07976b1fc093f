//! Monodeploy - batch deploy runner for a monorepo of static sites.

#![allow(dead_code)]

mod cli;
mod deploy;
mod git;
mod logger;
mod manifest;
mod secrets;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, CommandFactory, Parser};
use cli::Cli;
use deploy::DeployOptions;
use git::Identity;
use secrets::EnvSecrets;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    logger::set_verbose(cli.verbose);

    // No root argument: print usage and exit cleanly.
    let Some(root) = cli.root else {
        Cli::command().print_help()?;
        return Ok(());
    };
    let root = root.canonicalize().unwrap_or(root);

    preflight(&cli.pm);

    let opts = DeployOptions {
        root,
        package_manager: cli.pm,
        only_sites: cli.sites,
        dry_run: cli.dry_run,
        identity: Identity {
            name: cli.author_name,
            email: cli.author_email,
        },
    };

    // A failed run is logged, not propagated: partial failure still exits 0.
    if let Err(err) = deploy::run(&opts, &EnvSecrets) {
        log!("error"; "{err:#}");
    }
    Ok(())
}

/// Warn up front about missing external tools. Nothing here is fatal; each
/// site fails on its own when a tool is actually needed.
fn preflight(pm: &str) {
    for tool in ["git", pm] {
        if which::which(tool).is_err() {
            log!("error"; "`{tool}` not found on PATH; deploys relying on it will fail");
        }
    }
}

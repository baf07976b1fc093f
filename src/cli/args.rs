//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Monodeploy batch deploy runner CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Monorepo root containing a `sites` directory.
    ///
    /// When omitted, usage is printed and the process exits cleanly.
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Package manager binary used for install and build
    #[arg(long, default_value = "npm", value_name = "BIN")]
    pub pm: String,

    /// Deploy only the named site (repeatable)
    #[arg(short, long = "site", value_name = "NAME")]
    pub sites: Vec<String>,

    /// Stop each site after the diff check and report what would be pushed
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Author name for deploy commits
    #[arg(long, default_value = "Deploy Bot", value_name = "NAME")]
    pub author_name: String,

    /// Author email for deploy commits
    #[arg(long, default_value = "deploy@localhost", value_name = "EMAIL")]
    pub author_email: String,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["monodeploy", "/srv/monorepo"]);
        assert_eq!(cli.root, Some(PathBuf::from("/srv/monorepo")));
        assert_eq!(cli.pm, "npm");
        assert!(cli.sites.is_empty());
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_root_is_optional() {
        let cli = Cli::parse_from(["monodeploy"]);
        assert!(cli.root.is_none());
    }

    #[test]
    fn test_repeatable_site_filter() {
        let cli = Cli::parse_from(["monodeploy", ".", "-s", "a", "--site", "b"]);
        assert_eq!(cli.sites, vec!["a", "b"]);
    }
}

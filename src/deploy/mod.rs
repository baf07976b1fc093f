//! The site deploy runner.
//!
//! Walks every immediate subdirectory of `<root>/sites`, and for each one
//! runs the full pipeline: manifest discovery, install and build, clone of
//! the deployment repository, diff check, and a conditional commit-and-push.
//! Sites are processed strictly one after another; any per-site failure is
//! logged and the run moves on to the next site.

mod outcome;


pub use outcome::{Outcome, SkipReason};

use crate::git::{self, Identity, remote::RemoteUrl};
use crate::manifest::SiteManifest;
use crate::secrets::SecretStore;
use crate::utils::exec::{Cmd, NPM_FILTER, SILENT_FILTER};
use crate::utils::fsx::copy_dir_into;
use crate::{debug, log};
use anyhow::{Context, Result, bail};
use rand::seq::IndexedRandom;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Decorative symbols for deploy commit messages.
const COMMIT_SYMBOLS: &[&str] = &[
    "\u{1f680}", // rocket
    "\u{1f4e6}", // package
    "\u{2728}",  // sparkles
    "\u{1f38a}", // confetti
    "\u{1f331}", // seedling
    "\u{1f527}", // wrench
];

/// Encrypted deploy key expected inside the deployment repository.
const ENCRYPTED_KEY_FILE: &str = "id_rsa.enc";

/// Options for a whole deploy run.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Monorepo root, containing the `sites` directory.
    pub root: PathBuf,

    /// Package manager binary; install is `<pm> install`, build is
    /// `<pm> run build`.
    pub package_manager: String,

    /// When non-empty, only sites with these names are deployed.
    pub only_sites: Vec<String>,

    /// Stop each site after the diff check and report instead of pushing.
    pub dry_run: bool,

    /// Identity for deploy commits.
    pub identity: Identity,
}

/// Deploy every site under `<root>/sites`.
///
/// Per-site failures never propagate out of the loop; the only error this
/// returns is an unreadable `sites` directory.
pub fn run(opts: &DeployOptions, secrets: &dyn SecretStore) -> Result<Vec<(String, Outcome)>> {
    let sites_dir = opts.root.join("sites");
    let sites = list_sites(&sites_dir, &opts.only_sites)?;

    let names: Vec<_> = sites
        .iter()
        .map(|p| p.file_name().unwrap_or_default().to_string_lossy().into_owned())
        .collect();
    log!("deploy"; "starting deploy run for [ {} ]", names.join(", "));

    let mut results = Vec::with_capacity(sites.len());
    for (site_dir, name) in sites.iter().zip(names) {
        let outcome = deploy_site(&name, site_dir, opts, secrets);
        log!("deploy"; "{name}: {outcome}");
        results.push((name, outcome));
    }

    print_summary(&results);
    Ok(results)
}

/// Enumerate site directories, sorted by name for a stable run order.
fn list_sites(sites_dir: &Path, only: &[String]) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(sites_dir)
        .with_context(|| format!("Failed to read sites directory {}", sites_dir.display()))?;

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| {
            only.is_empty()
                || p.file_name()
                    .map(|n| n.to_string_lossy())
                    .is_some_and(|n| only.iter().any(|s| *s == n))
        })
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Final one-line-per-site report.
fn print_summary(results: &[(String, Outcome)]) {
    log!("deploy"; "run finished:");
    for (name, outcome) in results {
        log!("deploy"; "  {:<12} {name}", outcome.label());
    }
}

/// Run the full pipeline for one site.
///
/// State machine: Discovered -> Configured -> Built -> Cloned ->
/// DiffChecked -> {Unchanged | Pushed | Failed}. Every early return is a
/// terminal state for this site only. The temporary clone is removed on
/// every path when the [`TempDir`] guard drops.
pub fn deploy_site(
    name: &str,
    site_dir: &Path,
    opts: &DeployOptions,
    secrets: &dyn SecretStore,
) -> Outcome {
    // Discovered -> Configured
    let manifest = match SiteManifest::load(site_dir) {
        Ok(Some(manifest)) => manifest,
        Ok(None) => {
            log!("skip"; "no {} for {name}", crate::manifest::MANIFEST_FILE);
            return Outcome::Skipped(SkipReason::NoManifest);
        }
        Err(err) => {
            log!("skip"; "bad deploy config for {name}: {err}");
            return Outcome::Skipped(SkipReason::BadManifest(err));
        }
    };

    // Configured -> Built
    log!("build"; "installing and building {name}");
    if let Err(err) = install_and_build(site_dir, &opts.package_manager) {
        log!("skip"; "error installing or building {name}");
        debug!("build"; "{err:#}");
        return Outcome::Skipped(SkipReason::BuildFailed(format!("{err:#}")));
    }

    // Built -> Cloned
    let remote = RemoteUrl::parse(&manifest.repository_url);
    let clone = match clone_and_populate(name, site_dir, &manifest, &remote) {
        Ok(clone) => clone,
        Err(err) => {
            log!("skip"; "problem cloning {name}");
            debug!("clone"; "{err:#}");
            return Outcome::Skipped(SkipReason::CloneFailed(format!("{err:#}")));
        }
    };

    // Cloned -> DiffChecked
    let changed = match check_for_changes(clone.path(), &manifest) {
        Ok(changed) => changed,
        Err(err) => return Outcome::Failed(format!("{err:#}")),
    };
    if !changed {
        log!("deploy"; "no changes to {name}");
        return Outcome::Unchanged;
    }
    if opts.dry_run {
        return Outcome::WouldPush;
    }

    // DiffChecked -> {Pushed | Failed}
    match commit_and_push(name, clone.path(), &manifest, &remote, opts, secrets) {
        Ok(sha) => Outcome::Pushed { sha },
        Err(err) => {
            log!("error"; "error pushing to {name} deployment repo");
            debug!("push"; "{err:#}");
            Outcome::Failed(format!("{err:#}"))
        }
    }
}

/// Run `<pm> install` then `<pm> run build` in the site directory.
///
/// A PTY is used when attached to a terminal so npm-style progress output
/// renders normally; under CI or tests the plain capture path is taken.
fn install_and_build(site_dir: &Path, pm: &str) -> Result<()> {
    let tty = std::io::stdout().is_terminal();

    Cmd::new(pm)
        .arg("install")
        .cwd(site_dir)
        .pty(tty)
        .filter(&NPM_FILTER)
        .run()
        .context("install failed")?;

    Cmd::new(pm)
        .args(["run", "build"])
        .cwd(site_dir)
        .pty(tty)
        .filter(&NPM_FILTER)
        .run()
        .context("build failed")?;

    Ok(())
}

/// Clone the deployment repo into a fresh temp dir and copy the build
/// output over it.
fn clone_and_populate(
    name: &str,
    site_dir: &Path,
    manifest: &SiteManifest,
    remote: &RemoteUrl,
) -> Result<TempDir> {
    log!("clone"; "cloning {name} deployment repo");
    let clone = TempDir::new().context("Failed to create temp dir")?;
    git::clone_quiet(&remote.https, clone.path())?;

    let build_output = site_dir.join(&manifest.build_dir);
    copy_dir_into(&build_output, clone.path())?;
    Ok(clone)
}

/// Stage with intent-to-add and diff the working tree, excluding the
/// manifest's ignore globs.
fn check_for_changes(clone: &Path, manifest: &SiteManifest) -> Result<bool> {
    git::add_intent(clone)?;
    git::diff_quiet(clone, manifest.ignore_diff.as_deref())
}

/// Commit everything and push to the SSH remote. Returns the monorepo HEAD
/// hash embedded in the commit message.
fn commit_and_push(
    name: &str,
    clone: &Path,
    manifest: &SiteManifest,
    remote: &RemoteUrl,
    opts: &DeployOptions,
    secrets: &dyn SecretStore,
) -> Result<String> {
    let sha = git::head_sha(&opts.root)?;

    git::add_all(clone)?;
    git::commit(clone, &commit_message(&sha), &opts.identity)?;

    let ssh_key = match &manifest.key_iv {
        Some((key_name, iv_name)) => {
            let key = secrets.resolve(key_name)?;
            let iv = secrets.resolve(iv_name)?;
            Some(decrypt_deploy_key(clone, &key, &iv)?)
        }
        None => None,
    };

    log!("push"; "pushing changes to {name} deployment repo");
    git::push(clone, &remote.ssh, &manifest.branch, ssh_key.as_deref())?;
    Ok(sha)
}

/// Deploy commit message: a random decorative symbol plus the monorepo
/// HEAD hash the output was built from.
fn commit_message(sha: &str) -> String {
    let symbol = COMMIT_SYMBOLS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or_default();
    format!("Deploy! {symbol} {sha}")
}

/// Decrypt the pre-committed deploy key in place and restrict its
/// permissions so ssh accepts it.
fn decrypt_deploy_key(clone: &Path, key: &str, iv: &str) -> Result<PathBuf> {
    let encrypted = clone.join(ENCRYPTED_KEY_FILE);
    if !encrypted.exists() {
        bail!("{ENCRYPTED_KEY_FILE} not found in deployment repository");
    }

    let decrypted = clone.join("id_rsa");
    Cmd::new("openssl")
        .args(["aes-256-cbc", "-d", "-K", key, "-iv", iv, "-in"])
        .arg(&encrypted)
        .arg("-out")
        .arg(&decrypted)
        .filter(&SILENT_FILTER)
        .run()
        .context("Failed to decrypt deploy key")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&decrypted, std::fs::Permissions::from_mode(0o600))
            .context("Failed to restrict deploy key permissions")?;
    }

    Ok(decrypted)
}

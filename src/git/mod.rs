//! Subprocess git operations used by the deploy pipeline.
//!
//! Every operation here shells out to the `git` binary through the
//! [`Cmd`](crate::utils::exec::Cmd) builder. Commit identity is threaded
//! explicitly into each commit via environment variables; nothing touches
//! the user's global git configuration.

pub mod pathspec;
pub mod remote;

use crate::utils::exec::{Cmd, GIT_FILTER};
use anyhow::{Context, Result, bail};
use std::path::Path;

/// Commit identity applied to deploy commits.
///
/// Passed to `git commit` as author/committer environment variables so the
/// ambient `user.name`/`user.email` configuration is never consulted or
/// modified.
#[derive(Debug, Clone)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    fn env_vars(&self) -> [(&'static str, &str); 4] {
        [
            ("GIT_AUTHOR_NAME", self.name.as_str()),
            ("GIT_AUTHOR_EMAIL", self.email.as_str()),
            ("GIT_COMMITTER_NAME", self.name.as_str()),
            ("GIT_COMMITTER_EMAIL", self.email.as_str()),
        ]
    }
}

/// Clone `url` into `dest` quietly.
pub fn clone_quiet(url: &str, dest: &Path) -> Result<()> {
    Cmd::new("git")
        .args(["clone", "--quiet", url])
        .arg(dest)
        .filter(&GIT_FILTER)
        .run()
        .with_context(|| format!("Failed to clone {url}"))?;
    Ok(())
}

/// Stage all paths with intent-to-add so `git diff` reports the full
/// content of untracked files as additions.
pub fn add_intent(repo: &Path) -> Result<()> {
    Cmd::new("git").args(["add", "-N", "."]).cwd(repo).run()?;
    Ok(())
}

/// Check whether the working tree differs from the index, excluding the
/// given ignore list (comma-separated, see [`pathspec::ignore_pathspecs`]).
///
/// Returns `true` when at least one path outside the ignore globs changed.
/// The exit code of `git diff --quiet` is the answer (0 clean, 1 dirty);
/// any other code is a real error.
pub fn diff_quiet(repo: &Path, ignores: Option<&str>) -> Result<bool> {
    let output = Cmd::new("git")
        .args(["diff", "--quiet", "--", "."])
        .args(pathspec::ignore_pathspecs(ignores))
        .cwd(repo)
        .capture()?;

    match output.status.code() {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        _ => bail!(
            "git diff failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ),
    }
}

/// Read the current commit hash of a repository.
pub fn head_sha(repo: &Path) -> Result<String> {
    let output = Cmd::new("git")
        .args(["rev-parse", "--verify", "HEAD"])
        .cwd(repo)
        .run()
        .context("Failed to read HEAD of the monorepo")?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Stage every change, including deletions and untracked files.
pub fn add_all(repo: &Path) -> Result<()> {
    Cmd::new("git").args(["add", "-A", "."]).cwd(repo).run()?;
    Ok(())
}

/// Create a commit with the given message and explicit identity.
pub fn commit(repo: &Path, message: &str, identity: &Identity) -> Result<()> {
    Cmd::new("git")
        .args(["commit", "-m", message])
        .cwd(repo)
        .envs(identity.env_vars())
        .run()?;
    Ok(())
}

/// Push `HEAD` to `branch` on `remote_url`.
///
/// When `ssh_key` is set, the push runs with a `GIT_SSH_COMMAND` override
/// that uses exactly that key and skips host-key verification, matching a
/// non-interactive CI environment with no known_hosts file.
pub fn push(repo: &Path, remote_url: &str, branch: &str, ssh_key: Option<&Path>) -> Result<()> {
    let mut cmd = Cmd::new("git")
        .arg("push")
        .arg(remote_url)
        .arg(format!("HEAD:{branch}"))
        .cwd(repo)
        .filter(&GIT_FILTER);

    if let Some(key) = ssh_key {
        cmd = cmd.env(
            "GIT_SSH_COMMAND",
            format!(
                "ssh -i {} -o IdentitiesOnly=yes -o StrictHostKeyChecking=no",
                key.display()
            ),
        );
    }

    cmd.run()
        .with_context(|| format!("Failed to push to {remote_url}"))?;
    Ok(())
}

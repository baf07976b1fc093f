//! Per-site deploy outcomes.
//!
//! A site's run always ends in exactly one of these states. The no-change
//! case is a first-class outcome, not an error: the original control flow
//! signalled it through a failing diff command, which made every reader
//! squint.

use crate::manifest::ManifestError;
use std::fmt;

/// Why a site was skipped before reaching the commit stage.
#[derive(Debug)]
pub enum SkipReason {
    /// The site directory has no manifest file.
    NoManifest,

    /// The manifest exists but cannot be used for deployment.
    BadManifest(ManifestError),

    /// Package install or build exited non-zero.
    BuildFailed(String),

    /// Cloning the deployment repository or copying build output failed.
    CloneFailed(String),
}

/// Terminal state of one site's deploy attempt.
#[derive(Debug)]
pub enum Outcome {
    /// Site never reached the diff check.
    Skipped(SkipReason),

    /// Build output matches the deployment repository; nothing to push.
    Unchanged,

    /// Dry run: changes detected, commit and push withheld.
    WouldPush,

    /// A commit was created and pushed.
    Pushed {
        /// Monorepo HEAD hash embedded in the commit message.
        sha: String,
    },

    /// Commit or push failed after changes were detected.
    Failed(String),
}

impl Outcome {
    /// One-word status for the run summary.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped(_) => "skipped",
            Self::Unchanged => "unchanged",
            Self::WouldPush => "would push",
            Self::Pushed { .. } => "pushed",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoManifest => write!(f, "no manifest file"),
            Self::BadManifest(err) => write!(f, "bad deploy config: {err}"),
            Self::BuildFailed(_) => write!(f, "install or build failed"),
            Self::CloneFailed(_) => write!(f, "clone or copy failed"),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::Unchanged => write!(f, "no changes"),
            Self::WouldPush => write!(f, "would push (dry run)"),
            Self::Pushed { sha } => write!(f, "pushed ({sha})"),
            Self::Failed(reason) => write!(f, "push failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Outcome::Unchanged.label(), "unchanged");
        assert_eq!(Outcome::Skipped(SkipReason::NoManifest).label(), "skipped");
        assert_eq!(Outcome::Pushed { sha: "abc".into() }.label(), "pushed");
    }

    #[test]
    fn test_skip_reason_display_names_field() {
        let reason = SkipReason::BadManifest(ManifestError::MissingRepositoryUrl);
        assert!(reason.to_string().contains("repository.url"));
    }
}

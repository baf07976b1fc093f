//! Site manifest discovery and validation.
//!
//! Each site directory may carry a `package.json` with a `deploy` section:
//!
//! ```json
//! {
//!   "scripts": { "build": "webpack --mode production" },
//!   "repository": { "url": "git+https://github.com/wwwtf/vegetables.com.git" },
//!   "deploy": {
//!     "buildDir": "dist",
//!     "ignoreDiff": "CNAME,robots.txt",
//!     "branch": "master",
//!     "key": "encrypted_abc123_key",
//!     "iv": "encrypted_abc123_iv"
//!   }
//! }
//! ```
//!
//! A missing manifest or a missing required field is not an error for the
//! run as a whole: the caller logs the reason and skips the site.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Manifest file name looked up inside each site directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Branch pushed to when `deploy.branch` is absent.
pub const DEFAULT_BRANCH: &str = "master";

/// Why a site manifest could not be used for deployment.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {0}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid JSON in {0}")]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("no `deploy` section")]
    MissingDeploy,

    #[error("no `deploy.buildDir`")]
    MissingBuildDir,

    #[error("no `repository.url`")]
    MissingRepositoryUrl,

    #[error("no `build` script")]
    MissingBuildScript,

    #[error("`deploy.key` and `deploy.iv` must be set together")]
    KeyIvPair,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    deploy: Option<RawDeploy>,
    repository: Option<RawRepository>,
    #[serde(default)]
    scripts: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDeploy {
    build_dir: Option<PathBuf>,
    ignore_diff: Option<String>,
    branch: Option<String>,
    key: Option<String>,
    iv: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    url: Option<String>,
}

/// Validated deploy configuration for one site.
///
/// Read once at the start of the site's processing, never mutated.
#[derive(Debug, Clone)]
pub struct SiteManifest {
    /// Build output directory, relative to the site directory.
    pub build_dir: PathBuf,

    /// Comma-separated paths excluded from the change diff.
    pub ignore_diff: Option<String>,

    /// Target branch on the deployment repository.
    pub branch: String,

    /// Deployment repository URL as configured.
    pub repository_url: String,

    /// Names of the secrets holding the AES key and iv for the deploy key.
    /// `None` when the push relies on ambient credentials.
    pub key_iv: Option<(String, String)>,
}

impl SiteManifest {
    /// Load and validate the manifest for a site directory.
    ///
    /// Returns `Ok(None)` when the site has no manifest file at all.
    pub fn load(site_dir: &Path) -> Result<Option<Self>, ManifestError> {
        let path = site_dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| ManifestError::Io(path.clone(), e))?;
        let manifest = Self::parse(&raw).map_err(|e| match e {
            ManifestError::Json(_, err) => ManifestError::Json(path.clone(), err),
            other => other,
        })?;
        Ok(Some(manifest))
    }

    /// Parse and validate manifest JSON.
    pub fn parse(raw: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_json::from_str(raw)
            .map_err(|e| ManifestError::Json(PathBuf::from(MANIFEST_FILE), e))?;

        let deploy = raw.deploy.ok_or(ManifestError::MissingDeploy)?;
        let build_dir = deploy.build_dir.ok_or(ManifestError::MissingBuildDir)?;
        let repository_url = raw
            .repository
            .and_then(|r| r.url)
            .ok_or(ManifestError::MissingRepositoryUrl)?;

        if !raw.scripts.contains_key("build") {
            return Err(ManifestError::MissingBuildScript);
        }

        let key_iv = match (deploy.key, deploy.iv) {
            (Some(key), Some(iv)) => Some((key, iv)),
            (None, None) => None,
            _ => return Err(ManifestError::KeyIvPair),
        };

        Ok(Self {
            build_dir,
            ignore_diff: deploy.ignore_diff,
            branch: deploy.branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            repository_url,
            key_iv,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "scripts": { "build": "webpack" },
        "repository": { "url": "https://github.com/acme/site.git" },
        "deploy": {
            "buildDir": "dist",
            "ignoreDiff": "CNAME,robots.txt",
            "key": "encrypted_key",
            "iv": "encrypted_iv"
        }
    }"#;

    #[test]
    fn test_parse_full_manifest() {
        let m = SiteManifest::parse(FULL).unwrap();
        assert_eq!(m.build_dir, PathBuf::from("dist"));
        assert_eq!(m.ignore_diff.as_deref(), Some("CNAME,robots.txt"));
        assert_eq!(m.branch, "master");
        assert_eq!(m.repository_url, "https://github.com/acme/site.git");
        assert_eq!(
            m.key_iv,
            Some(("encrypted_key".to_string(), "encrypted_iv".to_string()))
        );
    }

    #[test]
    fn test_parse_minimal_manifest() {
        let m = SiteManifest::parse(
            r#"{
                "scripts": { "build": "true" },
                "repository": { "url": "/srv/git/site.git" },
                "deploy": { "buildDir": "public" }
            }"#,
        )
        .unwrap();
        assert!(m.ignore_diff.is_none());
        assert!(m.key_iv.is_none());
    }

    #[test]
    fn test_missing_deploy_section() {
        let err = SiteManifest::parse(r#"{"scripts": {"build": "x"}}"#).unwrap_err();
        assert!(matches!(err, ManifestError::MissingDeploy));
    }

    #[test]
    fn test_missing_build_dir() {
        let err = SiteManifest::parse(
            r#"{
                "scripts": { "build": "x" },
                "repository": { "url": "u" },
                "deploy": {}
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::MissingBuildDir));
    }

    #[test]
    fn test_missing_repository_url() {
        let err = SiteManifest::parse(
            r#"{
                "scripts": { "build": "x" },
                "repository": {},
                "deploy": { "buildDir": "dist" }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::MissingRepositoryUrl));
    }

    #[test]
    fn test_missing_build_script() {
        let err = SiteManifest::parse(
            r#"{
                "scripts": { "start": "x" },
                "repository": { "url": "u" },
                "deploy": { "buildDir": "dist" }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::MissingBuildScript));
    }

    #[test]
    fn test_key_without_iv_rejected() {
        let err = SiteManifest::parse(
            r#"{
                "scripts": { "build": "x" },
                "repository": { "url": "u" },
                "deploy": { "buildDir": "dist", "key": "only_key" }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::KeyIvPair));
    }

    #[test]
    fn test_custom_branch() {
        let m = SiteManifest::parse(
            r#"{
                "scripts": { "build": "x" },
                "repository": { "url": "u" },
                "deploy": { "buildDir": "dist", "branch": "gh-pages" }
            }"#,
        )
        .unwrap();
        assert_eq!(m.branch, "gh-pages");
    }

    #[test]
    fn test_load_absent_manifest() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(SiteManifest::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "{ not json").unwrap();
        let err = SiteManifest::load(dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Json(..)));
    }
}

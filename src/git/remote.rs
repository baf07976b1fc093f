//! Deployment repository URL derivation.
//!
//! The manifest configures a single repository URL, but the pipeline needs
//! two forms of it: HTTPS for the read-only clone (no pre-shared key
//! required) and SSH for the authenticated push. Both are derived here from
//! whatever shape the manifest carries.

/// The two remote forms used by the deploy pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    /// URL used for the anonymous clone.
    pub https: String,

    /// URL used for the authenticated push.
    pub ssh: String,
}

impl RemoteUrl {
    /// Derive both remote forms from a configured repository URL.
    ///
    /// Recognized shapes: `https://` / `http://` (and npm-style `git+` prefixes),
    /// scp-style `git@host:path`, `ssh://git@host/path`, and `git://host/path`.
    /// Anything else, e.g. a local path, is used unchanged for both forms.
    pub fn parse(url: &str) -> Self {
        let url = url.trim();
        let url = url.strip_prefix("git+").unwrap_or(url);

        if let Some(rest) = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
        {
            return Self {
                https: format!("https://{rest}"),
                ssh: scp_form(rest),
            };
        }

        if url.starts_with("git@") {
            return Self {
                https: https_form(&url["git@".len()..]),
                ssh: url.to_string(),
            };
        }

        if let Some(rest) = url.strip_prefix("ssh://") {
            let rest = rest.strip_prefix("git@").unwrap_or(rest);
            return Self {
                https: format!("https://{rest}"),
                ssh: scp_form(rest),
            };
        }

        if let Some(rest) = url.strip_prefix("git://") {
            return Self {
                https: format!("https://{rest}"),
                ssh: scp_form(rest),
            };
        }

        // Unrecognized shape (e.g. filesystem path): use as-is for both.
        Self {
            https: url.to_string(),
            ssh: url.to_string(),
        }
    }
}

/// `host/owner/repo.git` -> `git@host:owner/repo.git`
fn scp_form(host_path: &str) -> String {
    match host_path.split_once('/') {
        Some((host, path)) => format!("git@{host}:{path}"),
        None => host_path.to_string(),
    }
}

/// `host:owner/repo.git` -> `https://host/owner/repo.git`
fn https_form(host_path: &str) -> String {
    match host_path.split_once(':') {
        Some((host, path)) => format!("https://{host}/{path}"),
        None => format!("https://{host_path}"),
    }
}

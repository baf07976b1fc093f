//! Ignore pathspec construction for the change diff.
//!
//! The manifest's `deploy.ignoreDiff` is a comma-separated path list. Each
//! entry becomes a `:(glob,exclude)` pathspec passed to `git diff` as its
//! own argv entry after the `.` target, so no shell quoting is involved.

/// Build exclude pathspecs from a comma-separated ignore list.
///
/// Empty and whitespace-only entries are dropped.
pub fn ignore_pathspecs(ignores: Option<&str>) -> Vec<String> {
    let Some(ignores) = ignores else {
        return Vec::new();
    };

    ignores
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(|path| format!(":(glob,exclude){path}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_yields_no_pathspecs() {
        assert!(ignore_pathspecs(None).is_empty());
    }

    #[test]
    fn test_two_entries() {
        assert_eq!(
            ignore_pathspecs(Some("a,b")),
            vec![":(glob,exclude)a", ":(glob,exclude)b"]
        );
    }

    #[test]
    fn test_whitespace_and_empty_entries_dropped() {
        assert_eq!(
            ignore_pathspecs(Some(" CNAME , ,robots.txt,")),
            vec![":(glob,exclude)CNAME", ":(glob,exclude)robots.txt"]
        );
    }

    #[test]
    fn test_glob_entry_passes_through() {
        assert_eq!(
            ignore_pathspecs(Some("assets/**/*.map")),
            vec![":(glob,exclude)assets/**/*.map"]
        );
    }
}

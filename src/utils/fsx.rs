//! Filesystem helpers for populating the deployment clone.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Copy the contents of `src` into `dst`, overwriting existing files.
///
/// Equivalent to `cp -Rf src/* dst/`: the directory itself is not copied,
/// only what is inside it. `dst` must already exist.
pub fn copy_dir_into(src: &Path, dst: &Path) -> Result<()> {
    let entries = fs::read_dir(src)
        .with_context(|| format!("Failed to read build output dir {}", src.display()))?;

    for entry in entries {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            fs::create_dir_all(&to)
                .with_context(|| format!("Failed to create {}", to.display()))?;
            copy_dir_into(&from, &to)?;
        } else {
            fs::copy(&from, &to).with_context(|| {
                format!("Failed to copy {} to {}", from.display(), to.display())
            })?;
        }
    }

    Ok(())
}

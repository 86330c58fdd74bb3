//! Directory operations for creating, copying, inspecting and removing trees.
//!
//! Every function attaches the offending path to its error so a failed run
//! can be recovered by hand from the logs and the backup.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// # Returns
///
/// - `Ok(())` if the directory exists or was successfully created
/// - `Err` if the path exists but is not a directory, or creation fails
///
/// # Examples
///
/// ```rust,no_run
/// use eeup_cli::utils::fs::ensure_dir;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// ensure_dir(Path::new("backups/290/db"))?;
/// # Ok(())
/// # }
/// ```
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Ensures that the parent directory of a file path exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Copy one file, creating the destination's parent directories.
///
/// An existing destination file is overwritten.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    ensure_parent_dir(dst)?;
    fs::copy(src, dst).with_context(|| {
        format!("Failed to copy file from {} to {}", src.display(), dst.display())
    })?;
    Ok(())
}

/// Recursively copies a directory and all its contents to a new location.
///
/// Each file is logged at debug level with `label` before it is copied, so
/// the last line in a verbose log names the file a failure stopped at.
/// Symlinks and special files are skipped.
///
/// # Returns
///
/// The number of files copied.
///
/// # Examples
///
/// ```rust,no_run
/// use eeup_cli::utils::fs::copy_dir;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let copied = copy_dir(
///     Path::new("system/expressionengine/third_party/seo_lite"),
///     Path::new("backups/290/system/expressionengine/third_party/seo_lite"),
///     "Backup",
/// )?;
/// println!("{copied} files backed up");
/// # Ok(())
/// # }
/// ```
pub fn copy_dir(src: &Path, dst: &Path, label: &str) -> Result<usize> {
    ensure_dir(dst)?;

    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(false).min_depth(1) {
        let entry =
            entry.with_context(|| format!("Failed to read directory: {}", src.display()))?;
        let relative = entry.path().strip_prefix(src).with_context(|| {
            format!("{} is outside {}", entry.path().display(), src.display())
        })?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else if entry.file_type().is_file() {
            debug!("{}: {}", label, relative.display());
            copy_file(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Recursively removes a directory and all its contents.
///
/// Missing directories are not an error.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Whether anything other than a directory exists at or below `path`.
///
/// A tree consisting only of empty directories returns `false`.
pub fn holds_files(path: &Path) -> Result<bool> {
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to inspect {}", path.display()))?;
        if !entry.file_type().is_dir() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Names of the immediate subdirectories of `path`, sorted.
///
/// A missing directory yields an empty list.
pub fn list_subdirs(path: &Path) -> Result<Vec<String>> {
    if !path.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in
        fs::read_dir(path).with_context(|| format!("Failed to read directory: {}", path.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir() {
        let temp = tempdir().unwrap();
        let test_dir = temp.path().join("a/b");

        ensure_dir(&test_dir).unwrap();
        assert!(test_dir.is_dir());
        ensure_dir(&test_dir).unwrap();
    }

    #[test]
    fn test_ensure_dir_on_file() {
        let temp = tempdir().unwrap();
        let file_path = temp.path().join("file.txt");
        fs::write(&file_path, "content").unwrap();

        assert!(ensure_dir(&file_path).is_err());
    }

    #[test]
    fn test_copy_dir_preserves_subpaths() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("nested/deeper")).unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::write(src.join("top.php"), "top").unwrap();
        fs::write(src.join("nested/deeper/leaf.php"), "leaf").unwrap();

        let dst = temp.path().join("dst");
        let copied = copy_dir(&src, &dst, "Copy").unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dst.join("top.php")).unwrap(), "top");
        assert_eq!(fs::read_to_string(dst.join("nested/deeper/leaf.php")).unwrap(), "leaf");
        assert!(dst.join("empty").is_dir());
    }

    #[test]
    fn test_copy_dir_missing_source_fails() {
        let temp = tempdir().unwrap();
        assert!(copy_dir(&temp.path().join("nope"), &temp.path().join("dst"), "Copy").is_err());
    }

    #[test]
    fn test_holds_files() {
        let temp = tempdir().unwrap();
        let scaffold = temp.path().join("scaffold");
        fs::create_dir_all(scaffold.join("a/b")).unwrap();
        assert!(!holds_files(&scaffold).unwrap());

        fs::write(scaffold.join("a/file"), "x").unwrap();
        assert!(holds_files(&scaffold).unwrap());
    }

    #[test]
    fn test_list_subdirs_sorted() {
        let temp = tempdir().unwrap();
        for name in ["zeta", "alpha", "mid"] {
            fs::create_dir(temp.path().join(name)).unwrap();
        }
        fs::write(temp.path().join("file.txt"), "").unwrap();

        assert_eq!(list_subdirs(temp.path()).unwrap(), vec!["alpha", "mid", "zeta"]);
        assert!(list_subdirs(&temp.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_remove_dir_all_missing_is_ok() {
        let temp = tempdir().unwrap();
        remove_dir_all(&temp.path().join("missing")).unwrap();
    }
}

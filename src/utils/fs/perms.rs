//! Unix permission helpers.

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::EeupError;

/// Set the Unix mode of `path`.
///
/// The path must exist. On non-Unix platforms this only checks existence.
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    if !path.exists() {
        return Err(EeupError::FileSystemError {
            operation: format!("chmod {mode:o}"),
            path: path.display().to_string(),
        }
        .into());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .with_context(|| format!("Failed to chmod {:o} {}", mode, path.display()))?;
    }

    #[cfg(not(unix))]
    {
        let _ = mode;
        tracing::debug!("Skipping chmod on this platform: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_path_is_error() {
        let temp = tempdir().unwrap();
        let err = set_mode(&temp.path().join("nope"), 0o666).unwrap_err();
        assert!(matches!(err.downcast_ref::<EeupError>(), Some(EeupError::FileSystemError { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let file = temp.path().join("config.php");
        std::fs::write(&file, "").unwrap();

        set_mode(&file, 0o666).unwrap();
        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o666);
    }
}

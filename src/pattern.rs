//! Glob matching for copy manifests.
//!
//! Copy manifests name their sources as glob patterns relative to a working
//! directory, the way a release is described: `system/**/*` for the whole
//! system tree, `*.php` for the top-level entry scripts. This module turns
//! such a pattern into the list of relative paths it selects.
//!
//! # Pattern Syntax
//!
//! - `*` matches any sequence of characters within a single path component
//! - `**` matches any sequence of path components (recursive matching)
//! - `?` matches any single character
//! - `[abc]` matches any character in the set
//!
//! Unlike plain [`glob::Pattern::matches`], `*` never crosses a `/`, so
//! `*.php` selects `index.php` but not `system/index.php`.
//!
//! # Safety
//!
//! Patterns containing `..` or an absolute path are rejected by
//! [`validate_pattern_safety`], and traversal never follows symlinks.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Pattern matcher for selecting files below a working directory.
///
/// # Examples
///
/// ```rust,no_run
/// use eeup_cli::pattern::PatternMatcher;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let matcher = PatternMatcher::new("themes/**/*")?;
///
/// assert!(matcher.matches(Path::new("themes/cp_themes/default/css/login.css")));
/// assert!(!matcher.matches(Path::new("system/index.php")));
///
/// let matches = matcher.find_matches(Path::new("/releases/ee-2.9.0"))?;
/// println!("Found {} entries", matches.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: Pattern,
    original_pattern: String,
}

impl PatternMatcher {
    /// Creates a new pattern matcher from a glob pattern string.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is unsafe (see
    /// [`validate_pattern_safety`]) or contains invalid glob syntax.
    pub fn new(pattern_str: &str) -> Result<Self> {
        validate_pattern_safety(pattern_str)?;
        let pattern = Pattern::new(pattern_str)
            .with_context(|| format!("Invalid glob pattern: {pattern_str}"))?;

        Ok(Self {
            pattern,
            original_pattern: pattern_str.to_string(),
        })
    }

    /// Finds every file and directory below `base_path` matching the pattern.
    ///
    /// Returned paths are relative to `base_path` and sorted, so directories
    /// come before their contents. The base directory itself is never
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_path` does not exist or cannot be traversed.
    pub fn find_matches(&self, base_path: &Path) -> Result<Vec<PathBuf>> {
        debug!("Searching for pattern '{}' in {}", self.original_pattern, base_path.display());

        let base_path = base_path
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize path: {}", base_path.display()))?;

        let mut matches = Vec::new();
        for entry in WalkDir::new(&base_path).follow_links(false).min_depth(1) {
            let entry = entry
                .with_context(|| format!("Failed to traverse {}", base_path.display()))?;

            if let Ok(relative_path) = entry.path().strip_prefix(&base_path) {
                trace!("Checking path: {}", relative_path.display());

                if self.matches(relative_path) {
                    matches.push(relative_path.to_path_buf());
                }
            }
        }

        matches.sort();
        debug!("Found {} matches for pattern '{}'", matches.len(), self.original_pattern);
        Ok(matches)
    }

    /// Checks whether a relative path matches the pattern, without filesystem access.
    pub fn matches(&self, path: &Path) -> bool {
        // Patterns always use '/', whatever the platform separator is
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.pattern.matches_with(&path_str, MATCH_OPTIONS)
    }

    /// Returns the original pattern string.
    pub fn pattern(&self) -> &str {
        &self.original_pattern
    }
}

/// Rejects patterns that could escape the working directory.
///
/// # Errors
///
/// Returns an error if the pattern contains `..` or is absolute.
pub fn validate_pattern_safety(pattern: &str) -> Result<()> {
    if pattern.contains("..") {
        anyhow::bail!("Pattern contains path traversal (..): {pattern}");
    }

    if cfg!(unix) && pattern.starts_with('/') {
        anyhow::bail!("Pattern contains absolute path: {pattern}");
    }

    if cfg!(windows) && (pattern.contains(':') || pattern.starts_with('\\')) {
        anyhow::bail!("Pattern contains absolute path: {pattern}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_star_stays_within_component() {
        let pattern = PatternMatcher::new("*.php").unwrap();

        assert!(pattern.matches(Path::new("index.php")));
        assert!(pattern.matches(Path::new("admin.php")));
        assert!(!pattern.matches(Path::new("system/index.php")));
        assert!(!pattern.matches(Path::new("index.php.bak")));
    }

    #[test]
    fn test_recursive_globstar() {
        let pattern = PatternMatcher::new("system/**/*").unwrap();

        assert!(pattern.matches(Path::new("system/index.php")));
        assert!(pattern.matches(Path::new("system/expressionengine/config/config.php")));
        assert!(!pattern.matches(Path::new("themes/site.css")));
        assert!(!pattern.matches(Path::new("system")));
    }

    #[test]
    fn test_find_matches_sorted_and_relative() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();

        fs::create_dir_all(base.join("system/expressionengine/cache")).unwrap();
        fs::write(base.join("system/index.php"), "").unwrap();
        fs::write(base.join("system/expressionengine/boot.php"), "").unwrap();
        fs::write(base.join("index.php"), "").unwrap();
        fs::write(base.join("readme.txt"), "").unwrap();

        let matches = PatternMatcher::new("system/**/*").unwrap().find_matches(base).unwrap();
        assert_eq!(
            matches,
            vec![
                PathBuf::from("system/expressionengine"),
                PathBuf::from("system/expressionengine/boot.php"),
                PathBuf::from("system/expressionengine/cache"),
                PathBuf::from("system/index.php"),
            ]
        );

        let matches = PatternMatcher::new("*.php").unwrap().find_matches(base).unwrap();
        assert_eq!(matches, vec![PathBuf::from("index.php")]);
    }

    #[test]
    fn test_find_matches_missing_base_fails() {
        let temp_dir = TempDir::new().unwrap();
        let pattern = PatternMatcher::new("**/*").unwrap();
        assert!(pattern.find_matches(&temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_validate_pattern_security_checks() {
        assert!(validate_pattern_safety("system/**/*").is_ok());
        assert!(validate_pattern_safety("../etc/passwd").is_err());
        assert!(PatternMatcher::new("system/../../x").is_err());

        #[cfg(unix)]
        assert!(validate_pattern_safety("/etc/passwd").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_find_matches_does_not_follow_symlinks() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("release");
        let outside = temp_dir.path().join("outside");
        fs::create_dir_all(&base).unwrap();
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("secret.php"), "").unwrap();
        symlink(&outside, base.join("link")).unwrap();

        let matches = PatternMatcher::new("**/*.php").unwrap().find_matches(&base).unwrap();
        assert!(matches.is_empty());
    }
}

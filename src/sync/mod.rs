//! Copy and rename manifests.
//!
//! Each phase of a workflow that moves files is described as data: a
//! [`CopyManifest`] is an ordered list of [`CopyEntry`] values and a
//! [`RenameManifest`] an ordered list of [`RenameEntry`] values. Entries run
//! in declared order; an entry marked [`Presence::Required`] stops the
//! manifest when it has nothing to act on, an [`Presence::Optional`] one is
//! skipped.
//!
//! The concrete manifests used by the workflows live in [`manifests`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use eeup_cli::sync::{CopyEntry, CopyManifest};
//!
//! # fn example() -> anyhow::Result<()> {
//! let manifest = CopyManifest::new("install")
//!     .with(CopyEntry::glob("/releases/ee-2.9.0", "system/**/*", "/srv/site"))
//!     .with(CopyEntry::glob("/releases/ee-2.9.0", "images/**/*", "/srv/site/public").optional());
//!
//! let copied = manifest.execute()?;
//! println!("{copied} files copied");
//! # Ok(())
//! # }
//! ```

pub mod manifests;

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::core::EeupError;
use crate::pattern::PatternMatcher;
use crate::utils::fs::{copy_dir, copy_file, ensure_dir, ensure_parent_dir, holds_files, remove_dir_all};

/// Whether an entry must find something to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Nothing to copy or rename is an error ([`EeupError::MissingSource`]).
    Required,
    /// Nothing to copy or rename is skipped.
    Optional,
}

/// One copy instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyEntry {
    /// Treat `source` as a glob relative to `cwd`, preserving relative paths under `dest`.
    ///
    /// When false, `cwd/source` names one file or directory that is copied
    /// to `dest/<file name>`.
    pub expand: bool,
    /// Base directory of `source`
    pub cwd: PathBuf,
    /// Glob pattern or file name
    pub source: String,
    /// Destination directory
    pub dest: PathBuf,
    /// What to do when nothing matches
    pub presence: Presence,
}

impl CopyEntry {
    /// A required glob entry.
    pub fn glob(
        cwd: impl Into<PathBuf>,
        pattern: impl Into<String>,
        dest: impl Into<PathBuf>,
    ) -> Self {
        Self {
            expand: true,
            cwd: cwd.into(),
            source: pattern.into(),
            dest: dest.into(),
            presence: Presence::Required,
        }
    }

    /// A required entry copying `cwd/name` into `dest`.
    pub fn file(cwd: impl Into<PathBuf>, name: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            expand: false,
            cwd: cwd.into(),
            source: name.into(),
            dest: dest.into(),
            presence: Presence::Required,
        }
    }

    /// Mark the entry optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    /// Run this entry, returning the number of files copied.
    fn execute(&self) -> Result<usize> {
        if self.expand {
            self.execute_glob()
        } else {
            self.execute_single()
        }
    }

    fn execute_glob(&self) -> Result<usize> {
        let matches = if self.cwd.is_dir() {
            PatternMatcher::new(&self.source)?.find_matches(&self.cwd)?
        } else {
            Vec::new()
        };

        if matches.is_empty() {
            return self.nothing_to_copy();
        }

        let mut copied = 0;
        for relative in matches {
            let src = self.cwd.join(&relative);
            let dst = self.dest.join(&relative);
            let metadata = fs::symlink_metadata(&src)
                .with_context(|| format!("Failed to inspect {}", src.display()))?;

            if metadata.is_dir() {
                ensure_dir(&dst)?;
            } else if metadata.is_file() {
                debug!("Copy: {}", relative.display());
                copy_file(&src, &dst)?;
                copied += 1;
            } else {
                debug!("Skipping non-regular file {}", src.display());
            }
        }
        Ok(copied)
    }

    fn execute_single(&self) -> Result<usize> {
        let src = self.cwd.join(&self.source);
        let Some(name) = src.file_name() else {
            return self.nothing_to_copy();
        };
        let dst = self.dest.join(name);

        if src.is_dir() {
            copy_dir(&src, &dst, "Copy")
        } else if src.is_file() {
            debug!("Copy: {}", src.display());
            copy_file(&src, &dst)?;
            Ok(1)
        } else {
            self.nothing_to_copy()
        }
    }

    fn nothing_to_copy(&self) -> Result<usize> {
        let source = self.cwd.join(&self.source);
        match self.presence {
            Presence::Required => Err(EeupError::MissingSource {
                path: source.display().to_string(),
            }
            .into()),
            Presence::Optional => {
                debug!("Nothing matches {}, skipping", source.display());
                Ok(0)
            }
        }
    }
}

/// An ordered list of copy entries.
#[derive(Debug, Clone, Default)]
pub struct CopyManifest {
    name: String,
    entries: Vec<CopyEntry>,
}

impl CopyManifest {
    /// Create an empty manifest; `name` appears in logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    #[must_use]
    pub fn with(mut self, entry: CopyEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Run every entry in order and return the total number of files copied.
    ///
    /// Destination files that no entry targets are left untouched. The
    /// first failing entry stops the manifest; files copied before it stay
    /// in place.
    pub fn execute(&self) -> Result<usize> {
        info!("Copying {}", self.name);
        let mut total = 0;
        for entry in &self.entries {
            total += entry.execute().with_context(|| format!("Copy step '{}' failed", self.name))?;
        }
        info!("Copied {} files ({})", total, self.name);
        Ok(total)
    }
}

/// One rename instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEntry {
    /// Existing path
    pub from: PathBuf,
    /// New path
    pub to: PathBuf,
    /// What to do when `from` is missing
    pub presence: Presence,
}

impl RenameEntry {
    /// A required rename.
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            presence: Presence::Required,
        }
    }

    /// Mark the entry optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    /// Run this entry. Returns whether anything was renamed.
    fn execute(&self) -> Result<bool> {
        let from_exists = self.from.exists();
        let to_exists = self.to.exists();

        if !from_exists {
            if to_exists {
                return Err(EeupError::AlreadyRenamed {
                    from: self.from.display().to_string(),
                    to: self.to.display().to_string(),
                }
                .into());
            }
            return match self.presence {
                Presence::Required => Err(EeupError::MissingSource {
                    path: self.from.display().to_string(),
                }
                .into()),
                Presence::Optional => {
                    debug!("{} does not exist, skipping", self.from.display());
                    Ok(false)
                }
            };
        }

        if to_exists {
            if holds_files(&self.to)? {
                return Err(EeupError::RenameTargetExists {
                    from: self.from.display().to_string(),
                    to: self.to.display().to_string(),
                }
                .into());
            }
            // Only empty directories, e.g. the backup scaffold
            remove_dir_all(&self.to)?;
        }

        ensure_parent_dir(&self.to)?;
        fs::rename(&self.from, &self.to).with_context(|| {
            format!("Failed to rename {} to {}", self.from.display(), self.to.display())
        })?;
        info!("Renamed {} -> {}", self.from.display(), self.to.display());
        Ok(true)
    }
}

/// An ordered list of rename entries.
#[derive(Debug, Clone, Default)]
pub struct RenameManifest {
    name: String,
    entries: Vec<RenameEntry>,
}

impl RenameManifest {
    /// Create an empty manifest; `name` appears in logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    #[must_use]
    pub fn with(mut self, entry: RenameEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Run every entry in order and return how many renames happened.
    pub fn execute(&self) -> Result<usize> {
        let mut renamed = 0;
        for entry in &self.entries {
            if entry.execute().with_context(|| format!("Rename step '{}' failed", self.name))? {
                renamed += 1;
            }
        }
        Ok(renamed)
    }
}

//! Workflows as typed step lists, executed by a suspendable runner.
//!
//! A [`Workflow`] is a named list of [`Step`]s built by the functions in
//! [`plans`]. A [`WorkflowRunner`] executes the steps in order. When it
//! reaches a checkpoint that needs the operator it returns
//! [`Progress::Suspended`]; the caller answers with [`WorkflowRunner::resume`]
//! and calls [`WorkflowRunner::run`] again. When no steps remain it returns
//! [`Progress::Completed`] with a [`Report`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use eeup_cli::config::Settings;
//! use eeup_cli::workflow::{plans, Progress, Resume, WorkflowRunner};
//!
//! # async fn example(settings: Settings) -> anyhow::Result<()> {
//! let mut runner = WorkflowRunner::new(&settings, plans::update(true));
//! let report = loop {
//!     match runner.run().await? {
//!         Progress::Suspended(checkpoint) => {
//!             println!("{}", checkpoint.message());
//!             runner.resume(Resume::Continue)?;
//!         }
//!         Progress::Completed(report) => break report,
//!     }
//! };
//! report.into_result()?;
//! # Ok(())
//! # }
//! ```

pub mod plans;

use anyhow::Result;
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::addon::{AddonDescriptor, AddonUpdate, AddonUpdater};
use crate::backup::{BackupDirectory, BackupPlanner};
use crate::config::Settings;
use crate::constants::{CONFIG_DIR, CONFIG_FILE};
use crate::core::EeupError;
use crate::db::{DatabaseDumper, MysqlDump};
use crate::sync::manifests;
use crate::utils::fs::{ensure_dir, remove_dir_all, set_mode};
use crate::version::{InstalledVersion, VersionProbe, probe_for};

/// How an add-on update step gets its backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonMode {
    /// Uses the backup and add-on validated by earlier steps.
    Standalone,
    /// Validates the add-on and plans its own backup. A missing add-on is
    /// recorded and the run continues.
    Bulk,
}

/// One unit of work in a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Read the installed version.
    ProbeVersion,
    /// Fail with [`EeupError::InstallationExists`] if a system directory exists.
    RequireEmptyLocation,
    /// Create the web root.
    CreateWebroot,
    /// Reserve a backup directory labelled with the version and an optional suffix.
    PlanBackup {
        /// Label suffix, e.g. `before-update-seo_lite`
        suffix: Option<String>,
    },
    /// Dump the database into the backup.
    DumpDatabase,
    /// Rename the live installation into the backup.
    MoveLiveToBackup,
    /// Copy the release over the installation.
    InstallRelease,
    /// Copy the release into an empty location.
    InstallNew,
    /// Reset cache and configuration file permissions.
    SetPermissions,
    /// Park the third-party directory.
    SetAsideThirdParty,
    /// Undo [`Step::SetAsideThirdParty`].
    BringBackThirdParty,
    /// Copy backed-up add-ons back into the third-party directory.
    RestoreThirdParty,
    /// Copy control panel stylesheet overrides back from the backup.
    RestoreCpOverrides,
    /// Remove the installer directory.
    DeleteInstaller {
        /// Only delete if the operator confirmed at [`Checkpoint::BrowserUpgrade`]
        gated: bool,
    },
    /// List available backups.
    ListBackups,
    /// Select the backup to switch to; ends the workflow if it is the installed version.
    SelectTarget(String),
    /// Copy the selected backup into place.
    RestoreTarget,
    /// Check that an add-on is installed and packaged.
    ValidateAddon(String),
    /// Queue an update and checkpoint for every installed add-on.
    QueueInstalledAddons,
    /// Replace one add-on.
    UpdateAddon {
        /// Add-on name
        name: String,
        /// Where its backup comes from
        mode: AddonMode,
    },
    /// Wait for the operator.
    Checkpoint(Checkpoint),
}

/// A point where the run waits for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkpoint {
    /// The new release is in place; the operator runs the browser upgrade.
    ///
    /// [`Resume::Continue`] deletes the installer afterwards,
    /// [`Resume::Abort`] keeps it.
    BrowserUpgrade,
    /// One add-on of a bulk run is done.
    ///
    /// [`Resume::Abort`] drops the remaining add-ons.
    AfterAddon {
        /// The add-on just processed
        name: String,
        /// Add-ons still queued
        remaining: usize,
    },
}

impl Checkpoint {
    /// The question shown to the operator.
    pub fn message(&self) -> String {
        match self {
            Self::BrowserUpgrade => "Load the website in your browser now and run the upgrade. \
                 When it is finished answer Y to delete the installer"
                .to_string(),
            Self::AfterAddon {
                name,
                remaining,
            } => format!("{name} done. Continue to next add-on ({remaining} left) or abort?"),
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BrowserUpgrade => f.write_str("browser upgrade"),
            Self::AfterAddon {
                name, ..
            } => write!(f, "after add-on {name}"),
        }
    }
}

/// The operator's answer at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Carry on (the default answer)
    Continue,
    /// Stop or skip, depending on the checkpoint
    Abort,
}

/// Result of [`WorkflowRunner::run`].
#[derive(Debug)]
pub enum Progress {
    /// Waiting at a checkpoint.
    Suspended(Checkpoint),
    /// No steps remain.
    Completed(Report),
}

/// A named list of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    name: &'static str,
    steps: Vec<Step>,
}

impl Workflow {
    /// Create a workflow.
    pub fn new(name: &'static str, steps: Vec<Step>) -> Self {
        Self {
            name,
            steps,
        }
    }

    /// Workflow name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// What a completed run did.
#[derive(Debug, Default)]
pub struct Report {
    /// Workflow name
    pub workflow: &'static str,
    /// Installed version when the run started
    pub version: Option<InstalledVersion>,
    /// Backup directory reserved by the run (the last one, for bulk runs)
    pub backup: Option<BackupDirectory>,
    /// Database dump written
    pub dump_file: Option<PathBuf>,
    /// Backups found by [`Step::ListBackups`]
    pub backups: Vec<String>,
    /// Files copied by all manifests
    pub files_copied: usize,
    /// Add-ons replaced
    pub updated_addons: Vec<AddonUpdate>,
    /// Add-ons that could not be updated, with the reason
    pub failed_addons: Vec<(String, String)>,
    /// The operator aborted at a checkpoint
    pub aborted: bool,
    /// The requested switch target is already installed
    pub already_current: bool,
    /// The installer directory was removed
    pub installer_deleted: bool,
}

impl Report {
    /// Turn recorded add-on failures into an error.
    ///
    /// # Errors
    ///
    /// [`EeupError::AddonFailures`] if any add-on failed.
    pub fn into_result(self) -> Result<Self> {
        if self.failed_addons.is_empty() {
            Ok(self)
        } else {
            Err(EeupError::AddonFailures {
                names: self.failed_addons.iter().map(|(name, _)| name.clone()).collect(),
            }
            .into())
        }
    }
}

/// Executes a [`Workflow`] against one installation.
pub struct WorkflowRunner<'a> {
    settings: &'a Settings,
    probe: Box<dyn VersionProbe>,
    dumper: Box<dyn DatabaseDumper>,
    steps: VecDeque<Step>,
    suspended: Option<Checkpoint>,
    delete_installer: bool,
    target: Option<BackupDirectory>,
    addon: Option<AddonDescriptor>,
    report: Report,
}

impl<'a> WorkflowRunner<'a> {
    /// Create a runner using the configured version probe and `mysqldump`.
    pub fn new(settings: &'a Settings, workflow: Workflow) -> Self {
        Self {
            settings,
            probe: probe_for(settings),
            dumper: Box::new(MysqlDump::from_settings(settings)),
            steps: workflow.steps.into(),
            suspended: None,
            delete_installer: false,
            target: None,
            addon: None,
            report: Report {
                workflow: workflow.name,
                ..Report::default()
            },
        }
    }

    /// Replace the version probe.
    #[must_use]
    pub fn with_probe(mut self, probe: Box<dyn VersionProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Replace the database dumper.
    #[must_use]
    pub fn with_dumper(mut self, dumper: Box<dyn DatabaseDumper>) -> Self {
        self.dumper = dumper;
        self
    }

    /// Execute steps until a checkpoint or the end of the workflow.
    ///
    /// Calling `run` while suspended returns the same checkpoint again.
    ///
    /// # Errors
    ///
    /// The first failing step stops the run; later steps are not executed.
    pub async fn run(&mut self) -> Result<Progress> {
        if let Some(checkpoint) = &self.suspended {
            return Ok(Progress::Suspended(checkpoint.clone()));
        }

        while let Some(step) = self.steps.pop_front() {
            debug!("Step: {:?}", step);
            if let Step::Checkpoint(checkpoint) = step {
                self.suspended = Some(checkpoint.clone());
                return Ok(Progress::Suspended(checkpoint));
            }
            self.execute(step).await?;
        }

        Ok(Progress::Completed(std::mem::take(&mut self.report)))
    }

    /// Answer the pending checkpoint.
    ///
    /// # Errors
    ///
    /// [`EeupError::WorkflowNotSuspended`] if the runner is not waiting.
    pub fn resume(&mut self, answer: Resume) -> Result<()> {
        let checkpoint = self.suspended.take().ok_or(EeupError::WorkflowNotSuspended)?;

        match (checkpoint, answer) {
            (Checkpoint::BrowserUpgrade, Resume::Continue) => self.delete_installer = true,
            (Checkpoint::BrowserUpgrade, Resume::Abort) => {
                info!("Keeping the installer directory");
                self.delete_installer = false;
            }
            (Checkpoint::AfterAddon { .. }, Resume::Continue) => {}
            (Checkpoint::AfterAddon { .. }, Resume::Abort) => {
                info!("Aborting; {} queued step(s) dropped", self.steps.len());
                self.steps.clear();
                self.report.aborted = true;
            }
        }
        Ok(())
    }

    async fn execute(&mut self, step: Step) -> Result<()> {
        match step {
            Step::ProbeVersion => {
                let system_dir = self.settings.system_dir();
                if !system_dir.is_dir() {
                    return Err(EeupError::MissingInstallation {
                        path: system_dir.display().to_string(),
                    }
                    .into());
                }
                let version = self.probe.probe(&self.settings.config_file()).await?;
                info!("Current EE version: {} ({} probe)", version, self.probe.name());
                self.report.version = Some(version);
            }
            Step::RequireEmptyLocation => {
                let system_dir = self.settings.system_dir();
                if system_dir.exists() {
                    return Err(EeupError::InstallationExists {
                        path: system_dir.display().to_string(),
                    }
                    .into());
                }
            }
            Step::CreateWebroot => ensure_dir(&self.settings.webroot_dir())?,
            Step::PlanBackup {
                suffix,
            } => {
                let version = self.version()?.clone();
                let backup =
                    BackupPlanner::new(self.settings).plan(&version, suffix.as_deref()).await?;
                self.report.backup = Some(backup);
            }
            Step::DumpDatabase => {
                let backup = self.backup()?;
                let dump_file = self.dumper.dump(backup).await?;
                self.report.dump_file = Some(dump_file);
            }
            Step::MoveLiveToBackup => {
                manifests::move_live_to_backup(self.settings, self.backup()?).execute()?;
            }
            Step::InstallRelease => {
                let copied = manifests::install_release(self.settings, self.backup()?).execute()?;
                self.report.files_copied += copied;
            }
            Step::InstallNew => {
                self.report.files_copied += manifests::install_new(self.settings).execute()?;
            }
            Step::SetPermissions => {
                for (path, mode) in manifests::permission_targets(self.settings) {
                    set_mode(&path, mode)?;
                    debug!("chmod {:o} {}", mode, path.display());
                }
                info!("Permissions set");
            }
            Step::SetAsideThirdParty => {
                manifests::set_aside_third_party(self.settings).execute()?;
            }
            Step::BringBackThirdParty => {
                manifests::bring_back_third_party(self.settings).execute()?;
            }
            Step::RestoreThirdParty => {
                let copied =
                    manifests::restore_third_party(self.settings, self.backup()?).execute()?;
                self.report.files_copied += copied;
            }
            Step::RestoreCpOverrides => {
                let copied =
                    manifests::restore_cp_overrides(self.settings, self.backup()?).execute()?;
                self.report.files_copied += copied;
            }
            Step::DeleteInstaller {
                gated,
            } => self.delete_installer(gated)?,
            Step::ListBackups => {
                let backups = BackupPlanner::new(self.settings).list_backups()?;
                if backups.is_empty() {
                    info!("No backups available to switch to");
                }
                for label in &backups {
                    info!("{label}");
                }
                self.report.backups = backups;
            }
            Step::SelectTarget(label) => {
                if self.version()? == &label.as_str() {
                    info!("{label} is already the installed version; nothing to do");
                    self.report.already_current = true;
                    self.steps.clear();
                    return Ok(());
                }
                let target = BackupPlanner::new(self.settings).resolve(&label)?;
                let config = target.join(&self.settings.system).join(CONFIG_DIR).join(CONFIG_FILE);
                if !config.is_file() {
                    return Err(EeupError::IncompleteBackup {
                        label,
                        missing: config.display().to_string(),
                    }
                    .into());
                }
                info!("Backing up {} ...", self.version()?);
                self.target = Some(target);
            }
            Step::RestoreTarget => {
                let target = self.target.as_ref().ok_or_else(|| missing_state("switch target"))?;
                self.report.files_copied +=
                    manifests::restore_backup_target(self.settings, target).execute()?;
            }
            Step::ValidateAddon(name) => {
                self.addon = Some(AddonUpdater::new(self.settings).validate(&name)?);
            }
            Step::QueueInstalledAddons => self.queue_installed_addons()?,
            Step::UpdateAddon {
                name,
                mode,
            } => self.update_addon(&name, mode).await?,
            Step::Checkpoint(_) => {}
        }
        Ok(())
    }

    fn delete_installer(&mut self, gated: bool) -> Result<()> {
        let installer = self.settings.installer_dir();
        if gated && !self.delete_installer {
            info!("Installer left in place: {}", installer.display());
            return Ok(());
        }
        if installer.exists() {
            remove_dir_all(&installer)?;
            info!("Deleted {}", installer.display());
            self.report.installer_deleted = true;
        } else {
            info!("No installer directory at {}", installer.display());
        }
        Ok(())
    }

    fn queue_installed_addons(&mut self) -> Result<()> {
        let names = AddonUpdater::new(self.settings).installed()?;
        if names.is_empty() {
            warn!("No add-ons found in {}", self.settings.third_party_dir().display());
        }

        let total = names.len();
        let mut queued = Vec::with_capacity(total * 2);
        for (index, name) in names.into_iter().enumerate() {
            let remaining = total - index - 1;
            queued.push(Step::UpdateAddon {
                name: name.clone(),
                mode: AddonMode::Bulk,
            });
            if remaining > 0 {
                queued.push(Step::Checkpoint(Checkpoint::AfterAddon {
                    name,
                    remaining,
                }));
            }
        }

        for step in queued.into_iter().rev() {
            self.steps.push_front(step);
        }
        Ok(())
    }

    async fn update_addon(&mut self, name: &str, mode: AddonMode) -> Result<()> {
        let updater = AddonUpdater::new(self.settings);

        let update = match mode {
            AddonMode::Standalone => {
                let addon = self.addon.take().ok_or_else(|| missing_state("validated add-on"))?;
                updater.update(&addon, self.backup()?)?
            }
            AddonMode::Bulk => {
                let addon = match updater.validate(name) {
                    Ok(addon) => addon,
                    Err(e) => {
                        return match e.downcast_ref::<EeupError>() {
                            Some(EeupError::AddonNotFound { .. }) => {
                                warn!("Skipping {name}: {e}");
                                self.report.failed_addons.push((name.to_string(), e.to_string()));
                                Ok(())
                            }
                            _ => Err(e),
                        };
                    }
                };
                let version = self.version()?.clone();
                let backup = BackupPlanner::new(self.settings)
                    .plan(&version, Some(&format!("before-update-{name}")))
                    .await?;
                let update = updater.update(&addon, &backup)?;
                self.report.backup = Some(backup);
                update
            }
        };

        self.report.updated_addons.push(update);
        Ok(())
    }

    fn version(&self) -> Result<&InstalledVersion> {
        self.report.version.as_ref().ok_or_else(|| missing_state("installed version"))
    }

    fn backup(&self) -> Result<&BackupDirectory> {
        self.report.backup.as_ref().ok_or_else(|| missing_state("backup directory"))
    }
}

fn missing_state(what: &str) -> anyhow::Error {
    EeupError::Other {
        message: format!("Workflow step needs a {what}, but no earlier step provided one"),
    }
    .into()
}

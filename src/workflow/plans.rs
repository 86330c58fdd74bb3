//! Step lists for each workflow.

use super::{AddonMode, Checkpoint, Step, Workflow};

/// Report the installed version.
pub fn info() -> Workflow {
    Workflow::new("info", vec![Step::ProbeVersion])
}

/// Install a release into an empty location.
pub fn install() -> Workflow {
    Workflow::new(
        "install",
        vec![Step::RequireEmptyLocation, Step::CreateWebroot, Step::InstallNew, Step::SetPermissions],
    )
}

/// Upgrade the installation to the release in `ee_path`.
pub fn update(dump_db: bool) -> Workflow {
    let mut steps = vec![Step::ProbeVersion, Step::PlanBackup { suffix: None }];
    if dump_db {
        steps.push(Step::DumpDatabase);
    }
    steps.extend([
        Step::MoveLiveToBackup,
        Step::InstallRelease,
        Step::SetPermissions,
        Step::SetAsideThirdParty,
        Step::Checkpoint(Checkpoint::BrowserUpgrade),
        Step::BringBackThirdParty,
        Step::RestoreThirdParty,
        Step::DeleteInstaller { gated: true },
        Step::RestoreCpOverrides,
    ]);
    Workflow::new("update", steps)
}

/// Replace one add-on from its package.
pub fn update_addon(name: &str, dump_db: bool) -> Workflow {
    let mut steps = vec![
        Step::ProbeVersion,
        Step::ValidateAddon(name.to_string()),
        Step::PlanBackup {
            suffix: Some(format!("before-update-{name}")),
        },
    ];
    if dump_db {
        steps.push(Step::DumpDatabase);
    }
    steps.push(Step::UpdateAddon {
        name: name.to_string(),
        mode: AddonMode::Standalone,
    });
    Workflow::new("update-addon", steps)
}

/// Replace every installed add-on, pausing after each one.
pub fn update_addons() -> Workflow {
    Workflow::new("update-addons", vec![Step::ProbeVersion, Step::QueueInstalledAddons])
}

/// List backups and, with a target, switch the installation to that backup.
pub fn switch(target: Option<&str>, dump_db: bool) -> Workflow {
    let mut steps = vec![Step::ProbeVersion, Step::ListBackups];
    if let Some(target) = target {
        steps.push(Step::SelectTarget(target.to_string()));
        steps.push(Step::PlanBackup { suffix: None });
        if dump_db {
            steps.push(Step::DumpDatabase);
        }
        steps.extend([Step::MoveLiveToBackup, Step::RestoreTarget, Step::SetPermissions]);
    }
    Workflow::new("switch", steps)
}

/// Remove the installer directory.
pub fn clean() -> Workflow {
    Workflow::new("clean", vec![Step::DeleteInstaller { gated: false }])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_order() {
        let workflow = update(true);
        let steps = workflow.steps();

        let position = |wanted: &Step| steps.iter().position(|s| s == wanted).unwrap();
        assert!(position(&Step::DumpDatabase) < position(&Step::MoveLiveToBackup));
        assert!(position(&Step::SetAsideThirdParty) < position(&Step::Checkpoint(Checkpoint::BrowserUpgrade)));
        assert!(
            position(&Step::Checkpoint(Checkpoint::BrowserUpgrade)) < position(&Step::BringBackThirdParty)
        );
        assert_eq!(steps.last(), Some(&Step::RestoreCpOverrides));
    }

    #[test]
    fn test_no_db_dump_drops_only_the_dump() {
        assert_eq!(update(true).steps().len(), update(false).steps().len() + 1);
        assert!(!update(false).steps().contains(&Step::DumpDatabase));
        assert!(!update_addon("seo_lite", false).steps().contains(&Step::DumpDatabase));
    }

    #[test]
    fn test_update_addon_validates_before_backup() {
        let workflow = update_addon("seo_lite", true);
        assert_eq!(workflow.steps()[1], Step::ValidateAddon("seo_lite".to_string()));
        assert_eq!(
            workflow.steps()[2],
            Step::PlanBackup {
                suffix: Some("before-update-seo_lite".to_string())
            }
        );
    }

    #[test]
    fn test_switch_without_target_only_lists() {
        assert_eq!(switch(None, true).steps(), &[Step::ProbeVersion, Step::ListBackups]);
        assert!(switch(Some("280"), true).steps().contains(&Step::RestoreTarget));
    }
}

//! Database dumps taken before the installation is touched.
//!
//! The dump is a collaborator of the workflows, hidden behind
//! [`DatabaseDumper`] so tests can count dumps without a database server.
//! [`MysqlDump`] runs `mysqldump` and writes `<backup>/db/<db_name>.sql`.
//!
//! The password is handed over in the `MYSQL_PWD` environment variable, not
//! on the command line where other users could read it from the process
//! list. Dumps always carry `DROP TABLE` statements so importing an old
//! dump after an upgrade removes tables the upgrade created.

use anyhow::Result;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tracing::info;

use crate::backup::BackupDirectory;
use crate::config::Settings;
use crate::constants::DB_DUMP_TIMEOUT;
use crate::process::ToolCommand;
use crate::utils::fs::ensure_dir;

/// Writes a dump of the installation's database into a backup directory.
pub trait DatabaseDumper: Send + Sync {
    /// Dump the database into `backup` and return the dump file's path.
    ///
    /// # Errors
    ///
    /// [`EeupError::ExternalProcessError`](crate::core::EeupError::ExternalProcessError)
    /// when the dump tool cannot run or fails.
    fn dump<'a>(
        &'a self,
        backup: &'a BackupDirectory,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf>> + Send + 'a>>;
}

/// Dumps a MySQL database with `mysqldump`.
#[derive(Debug, Clone)]
pub struct MysqlDump {
    binary: String,
    database: String,
    user: String,
    password: String,
    host: String,
}

impl MysqlDump {
    /// Build from the database settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            binary: settings.mysqldump_binary.clone(),
            database: settings.db_name.clone(),
            user: settings.db_username.clone(),
            password: settings.db_password.clone(),
            host: settings.db_host.clone(),
        }
    }

    /// Where the dump for `backup` is written.
    pub fn dump_file(&self, backup: &BackupDirectory) -> PathBuf {
        backup.db_dir().join(format!("{}.sql", self.database))
    }

    /// Command-line arguments, without the password.
    pub fn arguments(&self, dump_file: &std::path::Path) -> Vec<String> {
        vec![
            format!("--user={}", self.user),
            format!("--host={}", self.host),
            "--add-drop-table".to_string(),
            format!("--result-file={}", dump_file.display()),
            self.database.clone(),
        ]
    }
}

impl DatabaseDumper for MysqlDump {
    fn dump<'a>(
        &'a self,
        backup: &'a BackupDirectory,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf>> + Send + 'a>> {
        Box::pin(async move {
            let dump_file = self.dump_file(backup);
            ensure_dir(&backup.db_dir())?;

            info!("Dumping database {} to {}", self.database, dump_file.display());
            ToolCommand::new(self.binary.clone())
                .args(self.arguments(&dump_file))
                .secret_env("MYSQL_PWD", self.password.clone())
                .timeout(DB_DUMP_TIMEOUT)
                .with_context(format!("Dumping {}", self.database))
                .execute()
                .await?;

            info!("Database dump complete: {}", dump_file.display());
            Ok(dump_file)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BackupPlanner;
    use crate::core::EeupError;
    use crate::test_utils::InstallationFixture;
    use crate::version::InstalledVersion;
    use std::path::Path;

    #[tokio::test]
    async fn test_arguments_keep_password_out_of_argv() {
        let fixture = InstallationFixture::new().await.unwrap();
        let settings = fixture.settings();
        let dumper = MysqlDump::from_settings(&settings);

        let args = dumper.arguments(Path::new("/b/db/site.sql"));
        assert_eq!(
            args,
            vec![
                "--user=site_user",
                "--host=localhost",
                "--add-drop-table",
                "--result-file=/b/db/site.sql",
                "site",
            ]
        );
        assert!(args.iter().all(|a| !a.contains(&settings.db_password)));
    }

    #[tokio::test]
    async fn test_missing_tool_is_external_process_error() {
        let fixture = InstallationFixture::new().await.unwrap();
        let mut settings = fixture.settings();
        settings.mysqldump_binary = "eeup-no-such-mysqldump".to_string();
        let backup =
            BackupPlanner::new(&settings).plan(&InstalledVersion::new("290"), None).await.unwrap();

        let err = MysqlDump::from_settings(&settings).dump(&backup).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EeupError>(),
            Some(EeupError::ExternalProcessError { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dump_runs_configured_tool() {
        use std::os::unix::fs::PermissionsExt;

        let fixture = InstallationFixture::new().await.unwrap();
        let mut settings = fixture.settings();

        // Stand-in for mysqldump: writes its password and last argument into --result-file
        let script = fixture.root().join("fake-mysqldump");
        std::fs::write(
            &script,
            "#!/bin/sh\nfor a in \"$@\"; do case \"$a\" in --result-file=*) out=\"${a#--result-file=}\";; esac; last=\"$a\"; done\necho \"$MYSQL_PWD $last\" > \"$out\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        settings.mysqldump_binary = script.display().to_string();

        let backup =
            BackupPlanner::new(&settings).plan(&InstalledVersion::new("290"), None).await.unwrap();
        let dump_file = MysqlDump::from_settings(&settings).dump(&backup).await.unwrap();

        assert_eq!(dump_file, backup.db_dir().join("site.sql"));
        assert_eq!(std::fs::read_to_string(&dump_file).unwrap().trim(), "site_password site");
    }
}

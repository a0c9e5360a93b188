use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use super::archive::{collect_files, write_file_list, zip_command};
use super::ssh::{RemoteSpec, remote_join};
use crate::shell::CommandRunner;

pub const STAMP_FORMAT: &str = "%Y_%m_%d_%H%M%S";
const ZIP_FOLDER: &str = "zip_files";

/// Local time stamp naming one sync.
pub fn timestamp() -> String {
    chrono::Local::now().format(STAMP_FORMAT).to_string()
}

/// Stages a project on a remote host: zip, `scp`, unzip.
pub struct RemoteSync<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    spec: &'a RemoteSpec,
    local_user: &'a str,
    scratch_dir: PathBuf,
}

impl<'a, R: CommandRunner + ?Sized> RemoteSync<'a, R> {
    pub fn new(runner: &'a R, spec: &'a RemoteSpec, local_user: &'a str) -> Self {
        Self {
            runner,
            spec,
            local_user,
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Parent of the private directory holding the local archive and its
    /// file list.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// `<remote_folder>/<local user>/<project name>`, created on the host.
    pub fn create_remote_dir(&self, project_dir: &Path) -> Result<String> {
        let dir = remote_join(
            &remote_join(&self.spec.remote_folder, self.local_user),
            &project_name(project_dir),
        );
        self.runner.capture(&self.spec.target.mkdir_p(&dir))?;
        Ok(dir)
    }

    /// Ship the project into `<remote_dir>/<stamp>` and return that path.
    pub fn push(
        &self,
        project_dir: &Path,
        remote_dir: &str,
        ignore: &[String],
        stamp: &str,
    ) -> Result<String> {
        let files = collect_files(project_dir, ignore)?;
        if files.is_empty() {
            bail!("nothing to sync in {}", project_dir.display());
        }

        let base = format!("{}_{stamp}", project_name(project_dir));
        // Removed with its contents when dropped.
        let staging = tempfile::Builder::new()
            .prefix(&format!("{base}."))
            .tempdir_in(&self.scratch_dir)
            .with_context(|| {
                format!("failed to create a staging dir in {}", self.scratch_dir.display())
            })?;
        let archive = staging.path().join(format!("{base}.zip"));
        let list = staging.path().join(format!("{base}.files"));

        self.transfer(project_dir, remote_dir, stamp, &files, &archive, &list)
    }

    fn transfer(
        &self,
        project_dir: &Path,
        remote_dir: &str,
        stamp: &str,
        files: &[PathBuf],
        archive: &Path,
        list: &Path,
    ) -> Result<String> {
        let target = &self.spec.target;

        write_file_list(files, list)?;
        info!(files = files.len(), archive = %archive.display(), "zipping project");
        self.runner.capture(&zip_command(project_dir, archive, list))?;

        let zip_dir = remote_join(remote_dir, ZIP_FOLDER);
        self.runner.capture(&target.mkdir_p(&zip_dir))?;

        info!(destination = %target.destination(), "copying archive");
        self.runner.capture(&target.scp_to(archive, &zip_dir))?;

        let file_name = archive
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        let remote_zip = remote_join(&zip_dir, &file_name);
        let unpacked = remote_join(remote_dir, stamp);

        self.runner.capture(&target.mkdir_p(&unpacked))?;
        self.runner.capture(&target.wrap(&format!(
            "unzip -q -o {} -d {}",
            shell_words::quote(&remote_zip),
            shell_words::quote(&unpacked)
        )))?;

        info!(path = %unpacked, "project staged on remote host");
        Ok(unpacked)
    }

    /// Create the remote directory and push a freshly stamped copy.
    pub fn sync(&self, project_dir: &Path, ignore: &[String]) -> Result<String> {
        let remote_dir = self.create_remote_dir(project_dir)?;
        self.push(project_dir, &remote_dir, ignore, &timestamp())
    }
}

fn project_name(project_dir: &Path) -> String {
    project_dir
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

use anyhow::Result;
use shell_words::quote;
use tracing::{info, warn};

use crate::error::BwdError;
use crate::project::{self, DOCKERFILES_DIR};
use crate::remote::{SshTarget, remote_join};
use crate::shell::CommandRunner;

/// Where the project's `Dockerfiles` folder lives.
#[derive(Debug, Clone)]
pub enum DockerfileSource {
    Local(PathBuf),
    Remote { target: SshTarget, project_dir: String },
}

/// Builds a project's images from its `Dockerfiles` folder.
pub struct ImageBuilder<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    repository: String,
    source: DockerfileSource,
}

impl<'a, R: CommandRunner + ?Sized> ImageBuilder<'a, R> {
    pub fn local(runner: &'a R, project_dir: &Path) -> Self {
        Self {
            runner,
            repository: project::repository_name(project_dir),
            source: DockerfileSource::Local(project_dir.to_path_buf()),
        }
    }

    /// Images are named after the local project; files come from its staged
    /// copy at `remote_dir`.
    pub fn remote(
        runner: &'a R,
        project_dir: &Path,
        target: SshTarget,
        remote_dir: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            repository: project::repository_name(project_dir),
            source: DockerfileSource::Remote {
                target,
                project_dir: remote_dir.into(),
            },
        }
    }

    /// Dockerfiles folder path and the Dockerfile names in it.
    fn list(&self) -> Result<(String, Vec<String>)> {
        match &self.source {
            DockerfileSource::Local(project_dir) => {
                let dir = project::dockerfiles_dir(project_dir)?;
                let files = project::list_dockerfiles(&dir)?;
                Ok((dir.to_string_lossy().into_owned(), files))
            }
            DockerfileSource::Remote {
                target,
                project_dir,
            } => {
                let entries = self.runner.capture(&target.ls(project_dir))?;
                if !entries.lines().any(|line| line.trim() == DOCKERFILES_DIR) {
                    return Err(BwdError::DockerFolderMissing(project_dir.into()).into());
                }

                let dir = remote_join(project_dir, DOCKERFILES_DIR);
                let files = project::filter_dockerfiles(self.runner.capture(&target.ls(&dir))?.lines());
                if files.is_empty() {
                    return Err(BwdError::DockerFilesMissing(dir.into()).into());
                }
                Ok((dir, files))
            }
        }
    }

    /// `tag → docker build ...` for every Dockerfile, sorted by tag.
    ///
    /// Tags are lowercased, so `GPU.Dockerfile` and `gpu.Dockerfile` collide;
    /// the first name in sorted order wins.
    pub fn commands(&self) -> Result<BTreeMap<String, String>> {
        let (dir, files) = self.list()?;
        let mut commands = BTreeMap::new();
        let mut sources: BTreeMap<String, String> = BTreeMap::new();
        for file in files {
            let tag = project::image_tag(&file);
            match sources.entry(tag.clone()) {
                Entry::Occupied(kept) => {
                    warn!(
                        tag = %tag,
                        "{file} maps to the same image tag as {}, skipping it",
                        kept.get()
                    );
                    continue;
                }
                Entry::Vacant(slot) => {
                    slot.insert(file.clone());
                }
            }
            let cmd = build_command(&self.repository, &tag, &remote_join(&dir, &file), &dir);
            let cmd = match &self.source {
                DockerfileSource::Local(_) => cmd,
                DockerfileSource::Remote { target, .. } => target.wrap(&cmd),
            };
            commands.insert(tag, cmd);
        }
        Ok(commands)
    }

    /// Build every image; stops at the first failure. Returns the tags built.
    pub fn build_all(&self) -> Result<Vec<String>> {
        let commands = self.commands()?;
        let mut built = Vec::with_capacity(commands.len());
        for (tag, cmd) in commands {
            info!(image = %format!("{}:{tag}", self.repository), "building");
            self.runner.stream_checked(&cmd)?;
            built.push(tag);
        }
        Ok(built)
    }

    /// Build one image by tag (`cpu` or `cpu.Dockerfile`).
    pub fn build_one(&self, name: &str) -> Result<()> {
        let tag = project::image_tag(name);
        let mut commands = self.commands()?;
        let Some(cmd) = commands.remove(&tag) else {
            return Err(BwdError::UnknownImage {
                name: name.to_string(),
                available: commands.into_keys().collect(),
            }
            .into());
        };

        info!(image = %format!("{}:{tag}", self.repository), "building");
        self.runner.stream_checked(&cmd)
    }
}

pub fn build_command(repository: &str, tag: &str, dockerfile: &str, context: &str) -> String {
    format!(
        "docker build -t {}:{} -f {} {}",
        repository,
        tag,
        quote(dockerfile),
        quote(context)
    )
}

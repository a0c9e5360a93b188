use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::BwdError;

pub const DOCKERFILES_DIR: &str = "Dockerfiles";
pub const DOCKERFILE_SUFFIX: &str = ".Dockerfile";

/// `<repository>:<tag>` of a project image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub repository: String,
    pub tag: String,
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// Image repository for a project: its folder name, lowercased.
pub fn repository_name(project_dir: &Path) -> String {
    project_dir
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_lowercase()
}

/// `cpu.Dockerfile` becomes `cpu`.
pub fn image_tag(file_name: &str) -> String {
    file_name
        .strip_suffix(DOCKERFILE_SUFFIX)
        .unwrap_or(file_name)
        .to_lowercase()
}

pub fn dockerfiles_dir(project_dir: &Path) -> Result<PathBuf> {
    let dir = project_dir.join(DOCKERFILES_DIR);
    if !dir.is_dir() {
        return Err(BwdError::DockerFolderMissing(project_dir.to_path_buf()).into());
    }
    Ok(dir)
}

/// Keep only `*.Dockerfile` names, sorted.
pub fn filter_dockerfiles<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut files: Vec<String> = names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| n.len() > DOCKERFILE_SUFFIX.len() && n.ends_with(DOCKERFILE_SUFFIX))
        .collect();
    files.sort();
    files
}

/// Dockerfile names in a local `Dockerfiles` folder.
pub fn list_dockerfiles(dir: &Path) -> Result<Vec<String>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    let files = filter_dockerfiles(names);
    if files.is_empty() {
        return Err(BwdError::DockerFilesMissing(dir.to_path_buf()).into());
    }
    Ok(files)
}

/// Resolve the image a build setting's `docker_file` refers to.
pub fn resolve_image(project_dir: &Path, docker_file: &str) -> Result<ImageRef> {
    let dir = dockerfiles_dir(project_dir)?;
    let wanted = image_tag(
        Path::new(docker_file)
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .as_ref(),
    );

    let found = list_dockerfiles(&dir)?
        .iter()
        .any(|name| image_tag(name) == wanted);
    if !found {
        return Err(BwdError::FileMissing(docker_file.to_string()).into());
    }

    Ok(ImageRef {
        repository: repository_name(project_dir),
        tag: wanted,
    })
}

use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::BwdError;

/// What follows the exec prefix in the container command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecTarget {
    /// Path relative to the project root, e.g. `scripts/train.py`.
    File(PathBuf),
    /// Dotted module path, e.g. `scripts.train`.
    Module(String),
}

impl fmt::Display for ExecTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecTarget::File(path) => write!(f, "{}", path.display()),
            ExecTarget::Module(module) => f.write_str(module),
        }
    }
}

/// Make `path` absolute against the current directory and fold `.`/`..`.
/// Symlinks are left alone.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    Ok(normalize(&absolute))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Script path relative to the project root.
pub fn relative_path(project_dir: &Path, script: &Path) -> Result<PathBuf> {
    let relative = script
        .strip_prefix(project_dir)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .ok_or_else(|| BwdError::ScriptOutsideProject {
            script: script.to_path_buf(),
            project: project_dir.to_path_buf(),
        })?;
    Ok(relative.to_path_buf())
}

/// Dotted module path: `<root>/pkg/sub/run.py` becomes `pkg.sub.run`.
pub fn module_path(project_dir: &Path, script: &Path) -> Result<String> {
    let relative = relative_path(project_dir, script)?;
    let mut parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(last) = parts.last_mut()
        && let Some(stem) = last.strip_suffix(".py")
    {
        *last = stem.to_string();
    }

    Ok(parts.join("."))
}

pub fn exec_target(project_dir: &Path, script: &Path, as_module: bool) -> Result<ExecTarget> {
    if as_module {
        module_path(project_dir, script).map(ExecTarget::Module)
    } else {
        relative_path(project_dir, script).map(ExecTarget::File)
    }
}

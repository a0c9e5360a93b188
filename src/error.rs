use std::path::PathBuf;

use thiserror::Error;

/// Domain failures. Wrapped in `anyhow::Error` at API boundaries; recover
/// the variant with `downcast_ref::<BwdError>()`.
#[derive(Debug, Error)]
pub enum BwdError {
    #[error("could not find a bwd.json config file in {}", .0.display())]
    ConfigMissing(PathBuf),

    #[error("no build settings found")]
    NoBuildSettings,

    #[error("make sure you have a folder called Dockerfiles in the root of {}", .0.display())]
    DockerFolderMissing(PathBuf),

    #[error("could not find a .Dockerfile in {}", .0.display())]
    DockerFilesMissing(PathBuf),

    #[error("specified dockerfile '{0}' not found in the Dockerfiles folder")]
    FileMissing(String),

    #[error("you need to specify what script to execute")]
    ExecutionScriptMissing,

    #[error("you need to specify which Dockerfile to use as image")]
    NoDockerfileSpecified,

    #[error("no image named '{name}' (available: {})", .available.join(", "))]
    UnknownImage { name: String, available: Vec<String> },

    #[error("script {} is not inside project {}", .script.display(), .project.display())]
    ScriptOutsideProject { script: PathBuf, project: PathBuf },

    #[error("incomplete ssh settings, missing: {}", .missing.join(", "))]
    IncompleteSsh { missing: Vec<&'static str> },

    #[error("gpu index {0} has no container-name letter")]
    InvalidGpuIndex(u32),

    #[error("command failed (exit {code:?}): {command}{}", stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

use anyhow::{Context, Result};
use tracing::info;

use super::types::{ImageSelection, PipelineInput, PipelineOutcome};
use crate::config::{BuildConfig, COMMON_KEY, select};
use crate::console;
use crate::docker::{self, ImageBuilder, RunCommand};
use crate::remote::{RemoteSpec, RemoteSync};
use crate::shell::CommandRunner;

/// Resolve the build setting, stage the project remotely if configured,
/// rebuild images if asked, then assemble and run the container command.
///
/// Every external command goes through `runner`. The outcome carries the
/// exit code of the container command (0 when no script was given).
///
/// A run that only builds images does not need a build setting; with none
/// configured the images are built locally.
pub fn run_pipeline<R: CommandRunner + ?Sized>(
    input: &PipelineInput,
    runner: &R,
) -> Result<PipelineOutcome> {
    let project_dir = &input.project_dir;

    // ── Build setting ────────────────────────────────────────────────
    let config = BuildConfig::load(project_dir)?;
    let settings = config.settings_for(&input.user);
    let setting = if input.script.is_none() && settings.is_empty() {
        info!("no build settings, building images locally");
        None
    } else {
        let setting = select(&settings, input.build_name.as_deref()).with_context(|| {
            format!("looking up build settings for '{}' and '{COMMON_KEY}'", input.user)
        })?;
        info!(build = setting.name(), "using build setting");
        Some(setting)
    };

    // ── Remote sync ──────────────────────────────────────────────────
    let remote = setting
        .as_ref()
        .map(RemoteSpec::from_setting)
        .transpose()?
        .flatten();
    let remote_dir = match &remote {
        Some(spec) => {
            let mut sync = RemoteSync::new(runner, spec, &input.user);
            if let Some(dir) = &input.scratch_dir {
                sync = sync.with_scratch_dir(dir);
            }
            let ignore = setting.as_ref().map_or(&[][..], |s| s.ignore_paths.as_slice());
            Some(sync.sync(project_dir, ignore)?)
        }
        None => None,
    };

    // ── Images ───────────────────────────────────────────────────────
    let mut images_built = Vec::new();
    if let Some(selection) = &input.build_image {
        let builder = match (&remote, &remote_dir) {
            (Some(spec), Some(dir)) => {
                ImageBuilder::remote(runner, project_dir, spec.target.clone(), dir.clone())
            }
            _ => ImageBuilder::local(runner, project_dir),
        };
        match selection {
            ImageSelection::All => {
                images_built = builder.build_all()?;
                console::success("Finished building all docker images");
            }
            ImageSelection::One(name) => {
                builder.build_one(name)?;
                console::success(&format!("Finished building {name} docker image"));
                images_built.push(crate::project::image_tag(name));
            }
        }
    }

    let (Some(script), Some(chosen)) = (&input.script, &setting) else {
        return Ok(PipelineOutcome {
            setting,
            remote_dir,
            images_built,
            command: None,
            exit_code: 0,
        });
    };

    // ── Run ──────────────────────────────────────────────────────────
    let mut run = RunCommand::new(project_dir, &input.user, remote_dir.as_deref());
    run.apply(chosen, script)?;
    let mut command = run.build()?;
    match &remote {
        Some(spec) => command = spec.target.wrap_tty(&command),
        None if input.check_docker => {
            let version = docker::ensure_available(runner)?;
            info!(%version, "docker daemon available");
        }
        None => {}
    }

    console::command(&command);
    let exit_code = runner.stream(&command)?;
    info!(exit_code, "container finished");

    Ok(PipelineOutcome {
        setting,
        remote_dir,
        images_built,
        command: Some(command),
        exit_code,
    })
}

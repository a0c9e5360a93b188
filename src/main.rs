use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgGroup, CommandFactory, Parser};
use tracing::info;

use bwd::config::{self, BuildConfig};
use bwd::console;
use bwd::docker;
use bwd::pipeline::{self, ImageSelection, PipelineInput};
use bwd::project;
use bwd::shell::ShellRunner;

#[derive(Debug, Parser)]
#[command(
    name = "bwd",
    version,
    about = "Run a project's scripts inside its Docker images, locally or over SSH"
)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .multiple(true)
        .args(["script", "build_image", "list_builds"])
))]
struct Args {
    /// Script to run inside the container
    #[arg(short = 's', long)]
    script: Option<PathBuf>,

    /// Project root (defaults to the current directory)
    #[arg(long)]
    proj: Option<PathBuf>,

    /// Build setting from "common" or "$USER" to use; defaults to the first
    #[arg(long)]
    build_name: Option<String>,

    /// Build one of the project's images first, or "all" of them
    #[arg(long, value_name = "TAG|all")]
    build_image: Option<ImageSelection>,

    /// List the build settings available to the current user and exit
    #[arg(long)]
    list_builds: bool,

    /// Log every shell command
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    bwd::init_tracing(args.verbose);

    match run(args) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            console::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<i32> {
    let project_dir = match &args.proj {
        Some(dir) => project::absolutize(dir)?,
        None => {
            let cwd = std::env::current_dir()?;
            info!("no project specified, assuming {} is project root", cwd.display());
            cwd
        }
    };

    if !BuildConfig::exists(&project_dir) {
        Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!(
                    "could not find {} in {}",
                    config::CONFIG_FILE,
                    project_dir.display()
                ),
            )
            .exit();
    }

    let user = docker::current_user()?;

    if args.list_builds {
        let settings = BuildConfig::load(&project_dir)?.settings_for(&user);
        console::list_settings(&settings);
        return Ok(0);
    }

    let script = args
        .script
        .as_deref()
        .map(project::absolutize)
        .transpose()?;

    let input = PipelineInput {
        project_dir,
        script,
        build_name: args.build_name,
        build_image: args.build_image,
        user,
        scratch_dir: None,
        check_docker: true,
    };

    let outcome = pipeline::run_pipeline(&input, &ShellRunner)?;
    Ok(outcome.exit_code)
}

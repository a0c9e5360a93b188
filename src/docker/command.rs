use std::path::{Path, PathBuf};

use anyhow::Result;
use shell_words::quote;

use crate::config::{BuildSetting, GpuRuntime};
use crate::error::BwdError;
use crate::project::{self, ExecTarget, ImageRef};

const GUI_FLAGS: &str =
    r#"-e DISPLAY=$DISPLAY -v /tmp/.X11-unix:/tmp/.X11-unix --env="QT_X11_NO_MITSHM=1""#;

/// Accumulates the pieces of a `docker run` shell command.
///
/// Fragments render in a fixed order regardless of the order they were
/// added: volumes, ports, GUI, custom, `--name` + image, exec.
#[derive(Debug, Clone)]
pub struct RunCommand {
    project_dir: PathBuf,
    user: String,
    volumes: Vec<String>,
    ports: Vec<String>,
    gpus: Vec<u32>,
    gpu_runtime: GpuRuntime,
    gui: bool,
    custom: Vec<String>,
    image: Option<ImageRef>,
    exec: Option<String>,
}

impl RunCommand {
    /// Start a command whose working directory is the project root.
    ///
    /// The project is mounted at its own path; when it was staged on a
    /// remote host, `remote_folder` is mounted there instead.
    pub fn new(project_dir: &Path, user: &str, remote_folder: Option<&str>) -> Self {
        let mut cmd = Self {
            project_dir: project_dir.to_path_buf(),
            user: user.to_string(),
            volumes: Vec::new(),
            ports: Vec::new(),
            gpus: Vec::new(),
            gpu_runtime: GpuRuntime::default(),
            gui: false,
            custom: Vec::new(),
            image: None,
            exec: None,
        };

        let project = project_dir.to_string_lossy().into_owned();
        match remote_folder {
            None => {
                cmd.add_volume(&project);
            }
            Some(remote) => {
                cmd.add_custom(&format!("-v {}", quote(&format!("{remote}:{project}"))));
            }
        }
        cmd
    }

    /// Mount `volume` at the same path inside the container.
    pub fn add_volume(&mut self, volume: &str) -> &mut Self {
        self.volumes.push(volume.to_string());
        self
    }

    pub fn add_port(&mut self, port: &str) -> &mut Self {
        self.ports.push(port.to_string());
        self
    }

    /// Append a raw fragment. Blank fragments are dropped.
    pub fn add_custom(&mut self, fragment: &str) -> &mut Self {
        let fragment = fragment.trim();
        if !fragment.is_empty() {
            self.custom.push(fragment.to_string());
        }
        self
    }

    pub fn set_gui(&mut self, enabled: bool) -> &mut Self {
        self.gui = enabled;
        self
    }

    pub fn set_gpus(&mut self, indices: &[u32], runtime: GpuRuntime) -> &mut Self {
        self.gpus = indices.to_vec();
        self.gpu_runtime = runtime;
        self
    }

    pub fn set_image(&mut self, image: ImageRef) -> &mut Self {
        self.image = Some(image);
        self
    }

    pub fn set_exec(&mut self, prefix: &str, target: &ExecTarget) -> &mut Self {
        self.exec = Some(format!("{} {}", prefix, quote(&target.to_string())));
        self
    }

    /// Fill everything in from a build setting and the script to run.
    pub fn apply(&mut self, setting: &BuildSetting, script: &Path) -> Result<&mut Self> {
        for volume in &setting.volumes {
            self.add_volume(volume);
        }
        for port in &setting.ports {
            self.add_port(port);
        }
        if let Some(docker_file) = &setting.docker_file {
            self.set_image(project::resolve_image(&self.project_dir, docker_file)?);
        }
        self.set_gpus(&setting.gpu, setting.gpu_runtime);
        self.set_gui(setting.gui);
        for fragment in &setting.custom_cmd {
            self.add_custom(fragment);
        }

        let target = project::exec_target(&self.project_dir, script, setting.run_as_module)?;
        self.set_exec(setting.exec_prefix(), &target);
        Ok(self)
    }

    /// Container name: `<user>_<repo>`, or `GPU_<letters>_<user>_<repo>`.
    pub fn container_name(&self, image: &ImageRef) -> Result<String> {
        let base = format!("{}_{}", self.user, image.repository);
        if self.gpus.is_empty() {
            return Ok(base);
        }

        let letters = self
            .gpus
            .iter()
            .map(|&index| gpu_letter(index))
            .collect::<Result<String, _>>()?;
        Ok(format!("GPU_{letters}_{base}"))
    }

    /// Render the full shell command.
    pub fn build(&self) -> Result<String> {
        let exec = self.exec.as_ref().ok_or(BwdError::ExecutionScriptMissing)?;
        let image = self.image.as_ref().ok_or(BwdError::NoDockerfileSpecified)?;

        let mut parts = vec![format!(
            "docker run -t --rm -w {}",
            quote(&self.project_dir.to_string_lossy())
        )];

        let gpu_ids = self
            .gpus
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        if !self.gpus.is_empty() && self.gpu_runtime == GpuRuntime::Docker {
            parts.push(format!("--gpus '\"device={gpu_ids}\"'"));
        }

        parts.extend(
            self.volumes
                .iter()
                .map(|v| format!("-v {}", quote(&format!("{v}:{v}")))),
        );
        parts.extend(self.ports.iter().map(|p| format!("-p {}", quote(p))));
        if self.gui {
            parts.push(GUI_FLAGS.to_string());
        }
        parts.extend(self.custom.iter().cloned());
        parts.push(format!("--name {} {}", self.container_name(image)?, image));
        parts.push(exec.clone());

        let cmd = parts.join(" ");
        if !self.gpus.is_empty() && self.gpu_runtime == GpuRuntime::NvidiaDocker {
            return Ok(format!("NV_GPU={gpu_ids} nvidia-{cmd}"));
        }
        Ok(cmd)
    }
}

fn gpu_letter(index: u32) -> Result<char, BwdError> {
    u8::try_from(index)
        .ok()
        .filter(|&i| i < 26)
        .map(|i| char::from(b'A' + i))
        .ok_or(BwdError::InvalidGpuIndex(index))
}

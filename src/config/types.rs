use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// How GPUs are handed to the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GpuRuntime {
    /// `NV_GPU=<ids> nvidia-docker run ...`
    #[default]
    NvidiaDocker,
    /// `docker run --gpus "device=<ids>" ...`
    Docker,
}

impl GpuRuntime {
    pub fn as_str(&self) -> &'static str {
        match self {
            GpuRuntime::NvidiaDocker => "nvidia-docker",
            GpuRuntime::Docker => "docker",
        }
    }
}

/// One build variant from `bwd.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSetting {
    pub build_name: Option<String>,
    pub docker_file: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub volumes: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub ports: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub gpu: Vec<u32>,
    pub gpu_runtime: GpuRuntime,
    #[serde(rename = "GUI", alias = "gui", deserialize_with = "flag")]
    pub gui: bool,
    pub ssh_ip: Option<String>,
    pub ssh_user: Option<String>,
    pub remote_folder: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub run_as_module: bool,
    pub build_cmd: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub custom_cmd: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub ignore_paths: Vec<String>,

    /// Top-level key this entry was listed under.
    #[serde(skip)]
    pub user: String,
}

impl BuildSetting {
    /// Name of this setting; empty until defaults have been applied.
    pub fn name(&self) -> &str {
        self.build_name.as_deref().unwrap_or_default()
    }

    /// Shell prefix placed before the script argument.
    pub fn exec_prefix(&self) -> &str {
        match self.build_cmd.as_deref() {
            Some(cmd) if !cmd.trim().is_empty() => cmd.trim(),
            _ if self.run_as_module => "python -m",
            _ => "python",
        }
    }

    pub fn has_ssh(&self) -> bool {
        self.ssh_ip.is_some() || self.ssh_user.is_some() || self.remote_folder.is_some()
    }
}

/// Raw `bwd.json`: user name (or `common`) to its build settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildConfig {
    pub users: HashMap<String, Vec<BuildSetting>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

/// Accepts `null`, a single value, or a list.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}

/// Accepts `null` or a bool.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_fields_become_lists() {
        let setting: BuildSetting = serde_json::from_str(
            r#"{"volumes": "/data", "ports": "8888:8888", "gpu": 1, "custom_cmd": "--ipc=host"}"#,
        )
        .unwrap();
        assert_eq!(setting.volumes, vec!["/data"]);
        assert_eq!(setting.ports, vec!["8888:8888"]);
        assert_eq!(setting.gpu, vec![1]);
        assert_eq!(setting.custom_cmd, vec!["--ipc=host"]);
    }

    #[test]
    fn nulls_and_missing_fields_default() {
        let setting: BuildSetting =
            serde_json::from_str(r#"{"volumes": null, "GUI": null, "gpu": null}"#).unwrap();
        assert!(setting.volumes.is_empty());
        assert!(setting.gpu.is_empty());
        assert!(!setting.gui);
        assert!(!setting.run_as_module);
        assert_eq!(setting.gpu_runtime, GpuRuntime::NvidiaDocker);
    }

    #[test]
    fn gui_accepts_either_case() {
        let upper: BuildSetting = serde_json::from_str(r#"{"GUI": true}"#).unwrap();
        let lower: BuildSetting = serde_json::from_str(r#"{"gui": true}"#).unwrap();
        assert!(upper.gui);
        assert!(lower.gui);
    }

    #[test]
    fn gpu_runtime_parses_kebab_case() {
        let setting: BuildSetting =
            serde_json::from_str(r#"{"gpu": [0, 1], "gpu_runtime": "docker"}"#).unwrap();
        assert_eq!(setting.gpu_runtime, GpuRuntime::Docker);
        assert_eq!(setting.gpu_runtime.as_str(), "docker");
    }

    #[test]
    fn exec_prefix_defaults_follow_run_mode() {
        let mut setting = BuildSetting::default();
        assert_eq!(setting.exec_prefix(), "python");
        setting.run_as_module = true;
        assert_eq!(setting.exec_prefix(), "python -m");
        setting.build_cmd = Some("python3 -u".into());
        assert_eq!(setting.exec_prefix(), "python3 -u");
    }

    #[test]
    fn config_is_a_map_of_user_lists() {
        let cfg: BuildConfig = serde_json::from_str(
            r#"{"alice": [{"build_name": "cpu"}], "common": [{}, {}]}"#,
        )
        .unwrap();
        assert_eq!(cfg.users["alice"].len(), 1);
        assert_eq!(cfg.users["common"].len(), 2);
    }
}

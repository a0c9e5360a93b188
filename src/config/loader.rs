use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::types::{BuildConfig, BuildSetting};
use crate::error::BwdError;

pub const CONFIG_FILE: &str = "bwd.json";
pub const COMMON_KEY: &str = "common";

impl BuildConfig {
    pub fn path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE)
    }

    pub fn exists(project_dir: &Path) -> bool {
        Self::path(project_dir).is_file()
    }

    /// Load `bwd.json` from the project root.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = Self::path(project_dir);
        if !path.is_file() {
            return Err(BwdError::ConfigMissing(project_dir.to_path_buf()).into());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: BuildConfig = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Settings visible to `user`: their own entries, then the `common` ones.
    ///
    /// Entries are tagged with the key they came from. Unnamed entries get
    /// `<key>_<index>`, indexed by position in the merged list.
    pub fn settings_for(&self, user: &str) -> Vec<BuildSetting> {
        let mut merged = Vec::new();
        for key in [user, COMMON_KEY] {
            if let Some(entries) = self.users.get(key) {
                merged.extend(entries.iter().cloned().map(|mut setting| {
                    setting.user = key.to_string();
                    setting
                }));
            }
            if user == COMMON_KEY {
                break;
            }
        }

        for (index, setting) in merged.iter_mut().enumerate() {
            if setting.build_cmd.is_none() {
                warn!(
                    user = %setting.user,
                    "build_cmd not set, defaulting to '{}'",
                    setting.exec_prefix()
                );
            }
            if setting.build_name.is_none() {
                let generated = format!("{}_{}", setting.user, index);
                warn!(user = %setting.user, "build_name not set, generated '{generated}'");
                setting.build_name = Some(generated);
            }
        }

        merged
    }
}

/// Pick the requested build setting, falling back to the first one.
pub fn select(settings: &[BuildSetting], requested: Option<&str>) -> Result<BuildSetting> {
    let first = settings.first().ok_or(BwdError::NoBuildSettings)?;

    let Some(name) = requested else {
        info!("no build name specified, using '{}'", first.name());
        return Ok(first.clone());
    };

    match settings.iter().find(|s| s.name() == name) {
        Some(setting) => Ok(setting.clone()),
        None => {
            warn!(
                "could not find '{name}' in build config, using '{}' instead",
                first.name()
            );
            Ok(first.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = r#"{
        "alice": [
            {"build_name": "cpu", "docker_file": "cpu", "build_cmd": "python -m"},
            {"docker_file": "gpu", "gpu": [0]}
        ],
        "bob": [{"build_name": "bobs"}],
        "common": [
            {"build_name": "shared", "docker_file": "cpu", "build_cmd": "python"},
            {"docker_file": "cpu"}
        ]
    }"#;

    fn sample() -> BuildConfig {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BuildConfig::load(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BwdError>(),
            Some(BwdError::ConfigMissing(_))
        ));
        assert!(!BuildConfig::exists(dir.path()));
    }

    #[test]
    fn load_reads_file_from_project_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), SAMPLE).unwrap();
        assert!(BuildConfig::exists(dir.path()));
        let cfg = BuildConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.users.len(), 3);
    }

    #[test]
    fn load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        let err = BuildConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn settings_merge_user_before_common() {
        let settings = sample().settings_for("alice");
        let users: Vec<_> = settings.iter().map(|s| s.user.as_str()).collect();
        assert_eq!(users, ["alice", "alice", "common", "common"]);
    }

    #[test]
    fn unnamed_settings_get_positional_names() {
        let settings = sample().settings_for("alice");
        let names: Vec<_> = settings.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["cpu", "alice_1", "shared", "common_3"]);
    }

    #[test]
    fn unknown_user_only_sees_common() {
        let settings = sample().settings_for("carol");
        assert_eq!(settings.len(), 2);
        assert_eq!(settings[1].name(), "common_1");
    }

    #[test]
    fn common_user_is_not_listed_twice() {
        let settings = sample().settings_for("common");
        assert_eq!(settings.len(), 2);
    }

    #[test]
    fn select_defaults_to_first() {
        let settings = sample().settings_for("alice");
        let chosen = select(&settings, None).unwrap();
        assert_eq!(chosen.name(), "cpu");
    }

    #[test]
    fn select_finds_common_entry_by_name() {
        let settings = sample().settings_for("alice");
        let chosen = select(&settings, Some("shared")).unwrap();
        assert_eq!(chosen.user, "common");
        assert_eq!(chosen.build_cmd.as_deref(), Some("python"));
    }

    #[test]
    fn select_falls_back_when_name_unknown() {
        let settings = sample().settings_for("alice");
        let chosen = select(&settings, Some("nope")).unwrap();
        assert_eq!(chosen.name(), "cpu");
    }

    #[test]
    fn select_errors_without_settings() {
        let cfg: BuildConfig = serde_json::from_str(r#"{"bob": []}"#).unwrap();
        let settings = cfg.settings_for("alice");
        let err = select(&settings, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BwdError>(),
            Some(BwdError::NoBuildSettings)
        ));
    }
}

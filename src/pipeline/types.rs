use std::path::PathBuf;
use std::str::FromStr;

use crate::config::BuildSetting;

/// Which images to (re)build before running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSelection {
    All,
    One(String),
}

impl FromStr for ImageSelection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(ImageSelection::All)
        } else {
            Ok(ImageSelection::One(s.to_string()))
        }
    }
}

/// Input to a `bwd` run.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    /// Absolute project root.
    pub project_dir: PathBuf,
    /// Absolute path of the script to run, if any.
    pub script: Option<PathBuf>,
    pub build_name: Option<String>,
    pub build_image: Option<ImageSelection>,
    /// Local user name; picks config entries and names containers.
    pub user: String,
    /// Where the sync archive is written. Defaults to the system temp dir.
    pub scratch_dir: Option<PathBuf>,
    /// Check the local Docker daemon before running locally.
    pub check_docker: bool,
}

/// What a run did.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Absent only for an images-only run without any configured setting.
    pub setting: Option<BuildSetting>,
    /// Staged copy on the remote host, when ssh settings were present.
    pub remote_dir: Option<String>,
    pub images_built: Vec<String>,
    /// The final shell command, when a script was given.
    pub command: Option<String>,
    pub exit_code: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_selection_parses_all_case_insensitively() {
        assert_eq!("all".parse::<ImageSelection>().unwrap(), ImageSelection::All);
        assert_eq!("ALL".parse::<ImageSelection>().unwrap(), ImageSelection::All);
        assert_eq!(
            "cpu".parse::<ImageSelection>().unwrap(),
            ImageSelection::One("cpu".into())
        );
    }
}

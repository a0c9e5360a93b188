use std::path::Path;

use anyhow::Result;
use shell_words::quote;

use crate::config::BuildSetting;
use crate::error::BwdError;

/// A `user@host` reachable with the system `ssh`/`scp` binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub user: String,
    pub host: String,
}

impl SshTarget {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
        }
    }

    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Run `cmd` in the remote login shell.
    pub fn wrap(&self, cmd: &str) -> String {
        format!("ssh {} {}", self.destination(), quote(cmd))
    }

    /// Like [`wrap`](Self::wrap) but allocates a terminal, for interactive runs.
    pub fn wrap_tty(&self, cmd: &str) -> String {
        format!("ssh -t {} {}", self.destination(), quote(cmd))
    }

    pub fn mkdir_p(&self, dir: &str) -> String {
        self.wrap(&format!("mkdir -p {}", quote(dir)))
    }

    pub fn ls(&self, dir: &str) -> String {
        self.wrap(&format!("ls {}", quote(dir)))
    }

    pub fn scp_to(&self, local: &Path, remote_dir: &str) -> String {
        let local = local.to_string_lossy();
        format!(
            "scp -q {} {}:{}",
            quote(&local),
            self.destination(),
            quote(remote_dir)
        )
    }
}

/// Where on which host a project is staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSpec {
    pub target: SshTarget,
    pub remote_folder: String,
}

impl RemoteSpec {
    /// `None` when no ssh keys are set; all three of `ssh_ip`, `ssh_user`
    /// and `remote_folder` are required otherwise.
    pub fn from_setting(setting: &BuildSetting) -> Result<Option<Self>> {
        if !setting.has_ssh() {
            return Ok(None);
        }

        match (&setting.ssh_ip, &setting.ssh_user, &setting.remote_folder) {
            (Some(ip), Some(user), Some(folder)) => Ok(Some(Self {
                target: SshTarget::new(user, ip),
                remote_folder: folder.clone(),
            })),
            (ip, user, folder) => {
                let missing = [("ssh_ip", ip), ("ssh_user", user), ("remote_folder", folder)]
                    .into_iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(key, _)| key)
                    .collect();
                Err(BwdError::IncompleteSsh { missing }.into())
            }
        }
    }
}

/// Join POSIX path segments for the remote side.
pub fn remote_join(base: &str, part: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        part.trim_start_matches('/')
    )
}

use anyhow::{Context, Result};

use crate::shell::CommandRunner;

const SERVER_VERSION: &str = "docker version --format '{{.Server.Version}}'";

/// Check that the local Docker daemon answers; returns its version.
pub fn ensure_available<R: CommandRunner + ?Sized>(runner: &R) -> Result<String> {
    let version = runner
        .capture(SERVER_VERSION)
        .context("docker daemon is not reachable; is docker installed and running?")?;
    Ok(version.trim().to_string())
}

const USER_VARS: [&str; 4] = ["LOGNAME", "USER", "LNAME", "USERNAME"];

/// Name of the invoking user: the usual environment variables first, then
/// the password database.
pub fn current_user() -> Result<String> {
    lookup_user(|var| std::env::var(var).ok(), passwd_name)
        .context("could not determine the current user name")
}

/// First non-blank value among [`USER_VARS`], in order, else `fallback`.
fn lookup_user(
    var: impl Fn(&str) -> Option<String>,
    fallback: impl FnOnce() -> Option<String>,
) -> Option<String> {
    USER_VARS
        .iter()
        .filter_map(|name| var(name))
        .find(|value| !value.trim().is_empty())
        .or_else(fallback)
}

#[cfg(unix)]
fn passwd_name() -> Option<String> {
    // SAFETY: getpwuid returns a pointer into static storage or null; the
    // name is copied out before any other passwd call can overwrite it.
    unsafe {
        let pw = libc::getpwuid(libc::geteuid());
        if pw.is_null() || (*pw).pw_name.is_null() {
            return None;
        }
        let name = std::ffi::CStr::from_ptr((*pw).pw_name);
        Some(name.to_string_lossy().into_owned())
    }
}

#[cfg(not(unix))]
fn passwd_name() -> Option<String> {
    None
}

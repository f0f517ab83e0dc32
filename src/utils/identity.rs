// Process identity helpers

use crate::error::InstallError;

/// Environment variables probed, in order, for the invoking (non-root) user.
pub const RUNNING_USER_ENV_VARS: [&str; 3] = ["SUDO_USER", "LOGNAME", "USER"];

/// True when the effective uid is 0.
#[cfg(unix)]
pub fn is_running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_running_as_root() -> bool {
    false
}

pub fn require_root(is_root: bool) -> Result<(), InstallError> {
    if is_root {
        return Ok(());
    }
    Err(InstallError::precondition(
        "This installer must be run with root privileges.",
        "Re-run it with sudo: sudo automated-installer ...",
    ))
}

/// Resolve the user delegated tools run as.
///
/// Order: explicit override, then `SUDO_USER`, `LOGNAME`, `USER` as returned by `lookup`.
/// Empty values and `root` are skipped: tsm must not run as the superuser.
pub fn resolve_running_user<F>(override_user: Option<&str>, lookup: F) -> Result<String, InstallError>
where
    F: Fn(&str) -> Option<String>,
{
    let candidates = override_user
        .map(|s| s.to_string())
        .into_iter()
        .chain(RUNNING_USER_ENV_VARS.iter().filter_map(|k| lookup(*k)));

    for candidate in candidates {
        let name = candidate.trim();
        if name.is_empty() || name == "root" {
            continue;
        }
        return Ok(name.to_string());
    }

    Err(InstallError::precondition(
        "Unable to determine the non-root user to run tsm as.",
        "Run the installer through sudo from a regular account, or pass -a <username>.",
    ))
}

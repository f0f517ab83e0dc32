use anyhow::Result;
use std::path::{Path, PathBuf};

pub const PACKAGES_ROOT: &str = "/opt/tableau/tableau_server/packages";
pub const ENVIRONMENT_FILE: &str = "/etc/opt/tableau/tableau_server/environment.bash";
pub const LOG_DIR: &str = "/var/log/tableau-automated-installer";
pub const LOG_DIR_ENV: &str = "AUTOMATED_INSTALLER_LOG_DIR";

/// Filesystem locations the installer reads from or executes out of.
///
/// Production code uses `InstallLayout::default()`; tests point the roots at a temp dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub packages_root: PathBuf,
    pub environment_file: PathBuf,
}

impl Default for InstallLayout {
    fn default() -> Self {
        Self {
            packages_root: PathBuf::from(PACKAGES_ROOT),
            environment_file: PathBuf::from(ENVIRONMENT_FILE),
        }
    }
}

impl InstallLayout {
    pub fn initialize_tsm(&self, version: &str) -> PathBuf {
        self.packages_root
            .join(format!("scripts.{}", version))
            .join("initialize-tsm")
    }

    pub fn tsm(&self, version: &str) -> PathBuf {
        self.packages_root
            .join(format!("customer-bin.{}", version))
            .join("tsm")
    }

    pub fn tabcmd(&self, version: &str) -> PathBuf {
        self.packages_root
            .join(format!("bin.{}", version))
            .join("tabcmd")
    }
}

/// Per-node port file written by the TSM controller during initialization.
pub fn workgroup_yml(data_dir: &Path, config_name: &str, version: &str) -> PathBuf {
    data_dir
        .join("data")
        .join(config_name)
        .join("config")
        .join(format!("tabadmincontroller_0.{}", version))
        .join("workgroup.yml")
}

/// Directory whose `*.conf` files hold the environment tsm expects.
pub fn user_environment_dir(home: &Path) -> PathBuf {
    home.join(".config")
        .join("systemd")
        .join("tableau_server.conf.d")
}

/// Resolve deployment folder (absolute path)
pub fn resolve_deployment_folder() -> Result<PathBuf> {
    // Prefer the folder where the executable lives
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(dir) = exe_path.parent() {
            return Ok(dir.to_path_buf());
        }
    }

    // Fallback: current working directory
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    Ok(cwd)
}

/// Resolve log folder (absolute path), creating it if needed.
pub fn resolve_log_folder() -> Result<PathBuf> {
    let preferred = std::env::var_os(LOG_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(LOG_DIR));

    if std::fs::create_dir_all(&preferred).is_ok() {
        return Ok(preferred);
    }

    // Fallback: next to the executable (best-effort).
    let base = resolve_deployment_folder()?;
    let log_dir = base.join("automated-installer-logs");
    std::fs::create_dir_all(&log_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create log folder: {}", e))?;
    Ok(log_dir)
}

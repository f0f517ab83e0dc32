// Validated installation configuration
//
// Built exactly once by `preflight::build_install_config` and only read afterwards.

use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "/var/opt/tableau/tableau_server";
pub const DEFAULT_CONFIG_NAME: &str = "tabsvc";
pub const DEFAULT_UNPRIVILEGED_USER: &str = "tableau";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Rpm,
    Deb,
}

impl PackageKind {
    /// Classify a package by file extension. Anything other than .rpm / .deb is unsupported.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("rpm") => Some(PackageKind::Rpm),
            Some("deb") => Some(PackageKind::Deb),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            PackageKind::Rpm => ".rpm",
            PackageKind::Deb => ".deb",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallMode {
    Fresh,
    JoinCluster { bootstrap_file: PathBuf },
}

impl InstallMode {
    pub fn is_fresh(&self) -> bool {
        matches!(self, InstallMode::Fresh)
    }

    pub fn label(&self) -> &'static str {
        match self {
            InstallMode::Fresh => "fresh",
            InstallMode::JoinCluster { .. } => "join-cluster",
        }
    }
}

/// Network ports forwarded to initialize-tsm. Zero means "let the tool pick its default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortSettings {
    pub coordination_client: u16,
    pub coordination_peer: u16,
    pub coordination_leader: u16,
    pub license_vendor_daemon: u16,
    pub agent_filetransfer: u16,
    pub controller: u16,
    pub range_min: u16,
    pub range_max: u16,
}

#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub package_file: PathBuf,
    pub package_kind: PackageKind,
    /// Name the package registers under (rpm NAME / deb Package).
    pub package_name: String,
    pub version: String,
    pub mode: InstallMode,
    /// Operator-supplied data directory; `None` leaves initialize-tsm's default in place.
    pub data_dir: Option<PathBuf>,
    pub config_name: Option<String>,
    /// Empty means trial activation.
    pub license_key: String,
    pub config_file: PathBuf,
    pub registration_file: PathBuf,
    pub verbose: bool,
    pub debug: bool,
    pub accept_eula: bool,
    pub force: bool,
    pub ports: PortSettings,
    pub disable_port_remapping: bool,
    pub unprivileged_user: Option<String>,
    pub tsm_authorized_group: Option<String>,
    pub disable_account_creation: bool,
    pub skip_group_membership: bool,
    pub group_user: Option<String>,
}

impl InstallConfig {
    pub fn effective_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    pub fn effective_config_name(&self) -> &str {
        self.config_name.as_deref().unwrap_or(DEFAULT_CONFIG_NAME)
    }

    pub fn uses_trial_license(&self) -> bool {
        self.license_key.trim().is_empty()
    }

    pub fn bootstrap_file(&self) -> Option<&Path> {
        match &self.mode {
            InstallMode::JoinCluster { bootstrap_file } => Some(bootstrap_file),
            InstallMode::Fresh => None,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_config(version: &str) -> InstallConfig {
    InstallConfig {
        package_file: PathBuf::from(format!("/tmp/tableau-server-{}.x86_64.rpm", version)),
        package_kind: PackageKind::Rpm,
        package_name: format!("tableau-server-{}", version),
        version: version.to_string(),
        mode: InstallMode::Fresh,
        data_dir: None,
        config_name: None,
        license_key: String::new(),
        config_file: PathBuf::from("/tmp/config.json"),
        registration_file: PathBuf::from("/tmp/reg.json"),
        verbose: false,
        debug: false,
        accept_eula: true,
        force: false,
        ports: PortSettings::default(),
        disable_port_remapping: false,
        unprivileged_user: None,
        tsm_authorized_group: None,
        disable_account_creation: false,
        skip_group_membership: false,
        group_user: None,
    }
}

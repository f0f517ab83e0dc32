// End-of-run summary, logged as JSON for support tickets.

use serde::Serialize;

use crate::models::config::PackageKind;
use crate::models::status::ServerStatus;

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub mode: &'static str,
    pub version: String,
    pub package_kind: PackageKind,
    /// False when the package was already registered and installation was skipped.
    pub package_installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_status: Option<ServerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_port: Option<u16>,
    pub duration_ms: u128,
}

// Native package installation (RPM via yum, DEB via gdebi)
//
// Installation is the only idempotent step of the workflow: an already registered
// package is left alone.

use log::{info, warn};
use std::path::Path;
use std::time::Instant;

use crate::error::{InstallError, InstallResult};
use crate::installation::linux_parsers::package_base_name;
use crate::installation::{run_delegated, CommandRunner, DelegatedCommand, PROBE_TIMEOUT};
use crate::models::config::{InstallConfig, PackageKind};

/// Dependency resolver used to install .deb files together with their dependencies.
pub const GDEBI_PACKAGE: &str = "gdebi-core";

/// Native tool used to read a package file's metadata name.
pub fn metadata_query_tool(kind: PackageKind) -> &'static str {
    match kind {
        PackageKind::Rpm => "rpm",
        PackageKind::Deb => "dpkg-deb",
    }
}

/// Ask the native package tool for the name the package registers under.
pub async fn query_package_name(
    runner: &dyn CommandRunner,
    package_file: &Path,
    kind: PackageKind,
) -> InstallResult<String> {
    let file = package_file.to_string_lossy().to_string();
    let cmd = match kind {
        PackageKind::Rpm => DelegatedCommand::new("rpm_query_package_name", "rpm")
            .args(["-qp", "--queryformat", "%{NAME}"])
            .arg(file),
        PackageKind::Deb => DelegatedCommand::new("dpkg_deb_query_package_name", "dpkg-deb")
            .arg("-f")
            .arg(file)
            .arg("Package"),
    }
    .with_timeout(PROBE_TIMEOUT);

    let out = run_delegated(runner, &cmd).await?;
    let name = out.stdout.trim().to_string();
    if name.is_empty() {
        return Err(InstallError::precondition(
            format!(
                "Unable to read the package name from {}",
                package_file.display()
            ),
            "Make sure the package file is a complete, uncorrupted Tableau Server package.",
        ));
    }
    Ok(name)
}

/// Whether `probe` exits 0. A non-zero exit means "not installed", not an error.
async fn is_registered(runner: &dyn CommandRunner, probe: DelegatedCommand) -> InstallResult<bool> {
    let out = runner
        .run(&probe.with_timeout(PROBE_TIMEOUT))
        .await
        .map_err(InstallError::Internal)?;
    Ok(out.success())
}

async fn rpm_is_installed(runner: &dyn CommandRunner, name: &str) -> InstallResult<bool> {
    is_registered(
        runner,
        DelegatedCommand::new("rpm_query_installed", "rpm").args(["-q", name]),
    )
    .await
}

async fn dpkg_is_installed(runner: &dyn CommandRunner, name: &str) -> InstallResult<bool> {
    is_registered(
        runner,
        DelegatedCommand::new("dpkg_query_installed", "dpkg").args(["-s", name]),
    )
    .await
}

/// Install the package unless it is already registered.
///
/// Returns `true` when the native installer ran, `false` when installation was skipped.
pub async fn install_package(
    runner: &dyn CommandRunner,
    config: &InstallConfig,
) -> InstallResult<bool> {
    let started = Instant::now();
    let file = config.package_file.to_string_lossy().to_string();
    info!(
        "[PHASE: package] [STEP: install] install_package entered (kind={:?}, file={})",
        config.package_kind, file
    );

    let installed = match config.package_kind {
        PackageKind::Rpm => {
            let base = package_base_name(&config.package_file).ok_or_else(|| {
                InstallError::precondition(
                    format!("Invalid package file name: {}", file),
                    "Pass the path to the Tableau Server .rpm file.",
                )
            })?;
            if rpm_is_installed(runner, &base).await? {
                warn!(
                    "[PHASE: package] [STEP: install] Package {} is already installed; skipping installation",
                    base
                );
                false
            } else {
                let cmd = DelegatedCommand::new("yum_install", "yum")
                    .args(["install", "-y", file.as_str()]);
                run_delegated(runner, &cmd).await?;
                true
            }
        }
        PackageKind::Deb => {
            if !dpkg_is_installed(runner, GDEBI_PACKAGE).await? {
                info!(
                    "[PHASE: package] [STEP: gdebi] {} not present; installing it",
                    GDEBI_PACKAGE
                );
                run_delegated(
                    runner,
                    &DelegatedCommand::new("apt_get_update", "apt-get").arg("update"),
                )
                .await?;
                run_delegated(
                    runner,
                    &DelegatedCommand::new("apt_get_install_gdebi", "apt-get")
                        .args(["install", "-y", GDEBI_PACKAGE]),
                )
                .await?;
            }

            if dpkg_is_installed(runner, &config.package_name).await? {
                warn!(
                    "[PHASE: package] [STEP: install] Package {} is already installed; skipping installation",
                    config.package_name
                );
                false
            } else {
                let cmd = DelegatedCommand::new("gdebi_install", "gdebi")
                    .args(["-n", file.as_str()]);
                run_delegated(runner, &cmd).await?;
                true
            }
        }
    };

    info!(
        "[PHASE: package] [STEP: install] install_package exit ok (installed={}, duration_ms={})",
        installed,
        started.elapsed().as_millis()
    );
    Ok(installed)
}

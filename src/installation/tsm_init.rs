// initialize-tsm invocation
//
// Translates the validated configuration into initialize-tsm's own flag vocabulary.
// The command runs as root with an argument vector, so no shell quoting is involved.

use log::info;
use std::time::Instant;

use crate::error::InstallResult;
use crate::installation::{run_delegated, CommandRunner, DelegatedCommand};
use crate::models::config::InstallConfig;
use crate::models::secrets::Secrets;
use crate::utils::path_resolver::InstallLayout;

/// Build the initialize-tsm argument list in a fixed order.
///
/// Note the inverted verbosity mapping: the installer is verbose on request, initialize-tsm
/// is verbose by default, so "not verbose" becomes `-q`.
pub fn build_initialize_args(config: &InstallConfig, secrets: &Secrets) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    if config.accept_eula {
        args.push("--accepteula".to_string());
    }
    if config.force {
        args.push("-f".to_string());
    }
    if !config.verbose {
        args.push("-q".to_string());
    }
    if config.skip_group_membership {
        args.push("-g".to_string());
    }
    if let Some(name) = &config.config_name {
        args.extend(["-c".to_string(), name.clone()]);
    }
    if let Some(dir) = &config.data_dir {
        args.extend(["-d".to_string(), dir.to_string_lossy().to_string()]);
    }
    if let Some(user) = &config.group_user {
        args.extend(["-a".to_string(), user.clone()]);
    }

    let ports = &config.ports;
    for (flag, port) in [
        ("-i", ports.coordination_client),
        ("-e", ports.coordination_peer),
        ("-m", ports.coordination_leader),
        ("-t", ports.license_vendor_daemon),
        ("-n", ports.agent_filetransfer),
        ("-o", ports.controller),
        ("-l", ports.range_min),
        ("-x", ports.range_max),
    ] {
        if port != 0 {
            args.extend([flag.to_string(), port.to_string()]);
        }
    }

    if config.disable_port_remapping {
        args.push("--disable-port-remapping".to_string());
    }
    if let Some(user) = &config.unprivileged_user {
        args.push(format!("--unprivileged-user={}", user));
    }
    if let Some(group) = &config.tsm_authorized_group {
        args.push(format!("--tsm-authorized-group={}", group));
    }
    if config.disable_account_creation {
        args.push("--disable-account-creation".to_string());
    }
    if config.debug {
        args.push("--debug".to_string());
    }

    if let Some(bootstrap) = config.bootstrap_file() {
        args.extend([
            "-b".to_string(),
            bootstrap.to_string_lossy().to_string(),
            "-u".to_string(),
            secrets.tsm_admin_user.clone(),
            "-p".to_string(),
            secrets.tsm_admin_pass.clone(),
        ]);
    }

    args
}

pub fn build_initialize_command(
    config: &InstallConfig,
    secrets: &Secrets,
    layout: &InstallLayout,
) -> DelegatedCommand {
    let mut cmd = DelegatedCommand::new(
        "initialize_tsm",
        layout.initialize_tsm(&config.version).to_string_lossy(),
    )
    .args(build_initialize_args(config, secrets));
    if config.bootstrap_file().is_some() {
        cmd = cmd.with_secret(&secrets.tsm_admin_pass);
    }
    cmd
}

/// Run initialize-tsm. Any non-zero exit aborts the workflow; nothing is rolled back.
pub async fn initialize_tsm(
    runner: &dyn CommandRunner,
    config: &InstallConfig,
    secrets: &Secrets,
    layout: &InstallLayout,
) -> InstallResult<()> {
    let started = Instant::now();
    info!(
        "[PHASE: tsm_init] [STEP: initialize] Initializing TSM (mode={}, version={})",
        config.mode.label(),
        config.version
    );

    let cmd = build_initialize_command(config, secrets, layout);
    run_delegated(runner, &cmd).await?;

    info!(
        "[PHASE: tsm_init] [STEP: initialize] TSM initialized (duration_ms={})",
        started.elapsed().as_millis()
    );
    Ok(())
}

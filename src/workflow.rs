// End-to-end install workflow
//
// intake -> credentials -> package -> initialize-tsm -> (fresh installs) first-time setup.
// Every stage either succeeds or ends the run; nothing already done is rolled back.

use log::{info, warn};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cli::CliArgs;
use crate::error::InstallResult;
use crate::installation::package::install_package;
use crate::installation::setup::{run_setup, SetupContext, PROPAGATION_DELAY};
use crate::installation::tsm_init::initialize_tsm;
use crate::installation::CommandRunner;
use crate::models::report::InstallReport;
use crate::preflight::build_install_config;
use crate::security::PasswordPrompt;
use crate::utils::identity::{resolve_running_user, RUNNING_USER_ENV_VARS};
use crate::utils::path_resolver::InstallLayout;

/// Process-level collaborators the workflow depends on.
pub struct InstallContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub prompt: &'a dyn PasswordPrompt,
    pub layout: InstallLayout,
    pub is_root: bool,
    /// Snapshot of the environment variables used to find the invoking user.
    pub env: HashMap<String, String>,
    pub propagation_delay: Duration,
}

impl<'a> InstallContext<'a> {
    /// Context for a real run against the local system.
    pub fn system(runner: &'a dyn CommandRunner, prompt: &'a dyn PasswordPrompt) -> Self {
        let env = RUNNING_USER_ENV_VARS
            .iter()
            .filter_map(|k| std::env::var(k).ok().map(|v| (k.to_string(), v)))
            .collect();
        Self {
            runner,
            prompt,
            layout: InstallLayout::default(),
            is_root: crate::utils::identity::is_running_as_root(),
            env,
            propagation_delay: PROPAGATION_DELAY,
        }
    }
}

pub async fn run_install(args: &CliArgs, ctx: &InstallContext<'_>) -> InstallResult<InstallReport> {
    let started = Instant::now();
    info!("[PHASE: workflow] Automated installation started");

    let (config, secrets) = build_install_config(args, ctx.runner, ctx.is_root).await?;
    let secrets = crate::security::resolve_secrets(secrets, ctx.prompt)?;

    // Setup tools run as the invoking user; resolve it before touching the system.
    let running_user = if config.mode.is_fresh() {
        let user = resolve_running_user(config.group_user.as_deref(), |k| ctx.env.get(k).cloned())?;
        info!("[PHASE: workflow] tsm and tabcmd will run as '{}'", user);
        Some(user)
    } else {
        None
    };

    let package_installed = install_package(ctx.runner, &config).await?;
    initialize_tsm(ctx.runner, &config, &secrets, &ctx.layout).await?;

    let mut report = InstallReport {
        mode: config.mode.label(),
        version: config.version.clone(),
        package_kind: config.package_kind,
        package_installed,
        server_status: None,
        gateway_port: None,
        duration_ms: 0,
    };

    match running_user {
        Some(user) => {
            let setup = SetupContext {
                runner: ctx.runner,
                config: &config,
                secrets: &secrets,
                layout: &ctx.layout,
                running_user: &user,
                propagation_delay: ctx.propagation_delay,
            };
            let outcome = run_setup(&setup).await?;
            report.server_status = Some(outcome.status);
            report.gateway_port = Some(outcome.gateway_port);
        }
        None => {
            warn!(
                "[PHASE: workflow] Joined an existing cluster; first-time setup is left to the initial node"
            );
        }
    }

    report.duration_ms = started.elapsed().as_millis();
    match serde_json::to_string(&report) {
        Ok(json) => info!("[PHASE: workflow] [STEP: report] {}", json),
        Err(e) => warn!("[PHASE: workflow] [STEP: report] Failed to serialize report: {}", e),
    }
    info!(
        "[PHASE: workflow] Installation complete (duration_ms={})",
        report.duration_ms
    );
    Ok(report)
}

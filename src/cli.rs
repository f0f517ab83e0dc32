// Command-line surface
//
// Flag letters mirror the ones `initialize-tsm` itself understands so operators can
// carry their muscle memory over. Validation beyond "is this a known flag with a
// well-formed value" happens in `preflight`.

use clap::error::{ContextKind, ErrorKind};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{InstallError, InstallResult};

pub const USAGE: &str = "automated-installer -s <secrets file> -f <config file> -r <registration file> --accepteula [optional arguments] <package file>";

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "automated-installer",
    about = "Install Tableau Server and run first-time setup without interaction",
    override_usage = USAGE,
    disable_version_flag = true,
    after_help = "Templates for the secrets, config and registration files ship next to this installer \
                  (secrets.template, config.template.json, reg_templ.json)."
)]
pub struct CliArgs {
    /// Secrets file with tsm and Tableau Server administrator credentials
    #[arg(short = 's', value_name = "SECRETS_FILE")]
    pub secrets_file: Option<PathBuf>,

    /// Configuration (topology) JSON file imported after initialization
    #[arg(short = 'f', value_name = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Registration JSON file
    #[arg(short = 'r', value_name = "REGISTRATION_FILE")]
    pub registration_file: Option<PathBuf>,

    /// Data directory (default: /var/opt/tableau/tableau_server)
    #[arg(short = 'd', value_name = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Service configuration name (default: tabsvc)
    #[arg(short = 'c', value_name = "CONFIG_NAME")]
    pub config_name: Option<String>,

    /// Product key; a trial license is activated when omitted
    #[arg(short = 'k', value_name = "LICENSE_KEY")]
    pub license_key: Option<String>,

    /// Do not add the running user to the tsm authorized group
    #[arg(short = 'g')]
    pub skip_group_membership: bool,

    /// Add this user (instead of the sudo invoker) to the tsm authorized group
    #[arg(short = 'a', value_name = "USERNAME")]
    pub group_user: Option<String>,

    /// Bootstrap file from an existing node; joins that cluster instead of a fresh install
    #[arg(short = 'b', value_name = "BOOTSTRAP_FILE")]
    pub bootstrap_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Coordination service client port
    #[arg(short = 'i', value_name = "PORT", default_value_t = 0)]
    pub coordination_client_port: u16,

    /// Coordination service peer port
    #[arg(short = 'e', value_name = "PORT", default_value_t = 0)]
    pub coordination_peer_port: u16,

    /// Coordination service leader port
    #[arg(short = 'm', value_name = "PORT", default_value_t = 0)]
    pub coordination_leader_port: u16,

    /// License vendor daemon port
    #[arg(short = 't', value_name = "PORT", default_value_t = 0)]
    pub license_vendor_daemon_port: u16,

    /// Agent file transfer port
    #[arg(short = 'n', value_name = "PORT", default_value_t = 0)]
    pub agent_filetransfer_port: u16,

    /// TSM controller port
    #[arg(short = 'o', value_name = "PORT", default_value_t = 0)]
    pub controller_port: u16,

    /// Lower bound of the dynamic port range
    #[arg(short = 'l', value_name = "PORT", default_value_t = 0)]
    pub port_range_min: u16,

    /// Upper bound of the dynamic port range
    #[arg(short = 'x', value_name = "PORT", default_value_t = 0)]
    pub port_range_max: u16,

    /// Accept the end user license agreement (required)
    #[arg(long = "accepteula")]
    pub accept_eula: bool,

    /// Continue even when the node looks already initialized
    #[arg(long = "force")]
    pub force: bool,

    /// Do not remap ports that are already in use
    #[arg(long = "disable-port-remapping")]
    pub disable_port_remapping: bool,

    /// Unprivileged account the services run as
    #[arg(long = "unprivileged-user", value_name = "USER", require_equals = true)]
    pub unprivileged_user: Option<String>,

    /// Group whose members may run tsm
    #[arg(long = "tsm-authorized-group", value_name = "GROUP", require_equals = true)]
    pub tsm_authorized_group: Option<String>,

    /// Do not create the unprivileged account or the authorized group
    #[arg(long = "disable-account-creation")]
    pub disable_account_creation: bool,

    /// Pass --debug to initialize-tsm and log at debug level
    #[arg(long = "debug")]
    pub debug: bool,

    /// Tableau Server package (.rpm or .deb)
    #[arg(value_name = "PACKAGE_FILE")]
    pub package_files: Vec<PathBuf>,
}

/// Outcome of parsing the raw argument list.
#[derive(Debug)]
pub enum CliCommand {
    Install(Box<CliArgs>),
    /// `-h`/`--help`: the rendered help text, printed by the caller, exit 0.
    Help(String),
}

pub fn parse_args<I, T>(args: I) -> InstallResult<CliCommand>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match CliArgs::try_parse_from(args) {
        Ok(parsed) => Ok(CliCommand::Install(Box::new(parsed))),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => Ok(CliCommand::Help(e.render().to_string())),
            ErrorKind::UnknownArgument => {
                let option = e
                    .get(ContextKind::InvalidArg)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "<unrecognized>".to_string());
                Err(InstallError::Usage(format!(
                    "unknown option: {}\nUsage: {}",
                    option, USAGE
                )))
            }
            _ => Err(InstallError::Usage(format!(
                "{}\nUsage: {}",
                e.render().to_string().trim_end(),
                USAGE
            ))),
        },
    }
}

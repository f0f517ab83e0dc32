// Unattended Tableau Server installer
// Library entry point: logging setup and the process-level run loop.

pub mod cli;
pub mod error;
pub mod installation;
pub mod models;
pub mod preflight;
pub mod security;
pub mod utils;
pub mod workflow;

use log::{error, info};
use std::ffi::OsString;

use crate::cli::{parse_args, CliCommand};
use crate::error::{InstallError, InstallResult, EXIT_FAILURE, EXIT_OK};
use crate::installation::SystemCommandRunner;
use crate::security::DialoguerPrompt;
use crate::utils::identity::{is_running_as_root, require_root};
use crate::workflow::{run_install, InstallContext};

/// Initialize logging with dual file formats (JSON + human-readable) plus stdout.
///
/// Files always receive debug output; stdout gets info unless `verbose` is set.
fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = utils::path_resolver::resolve_log_folder()?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");
    let json_log_file = log_dir.join(format!("automated-installer-{}.log", timestamp));
    let txt_log_file = log_dir.join(format!("automated-installer-{}.txt", timestamp));

    let stdout_level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    fern::Dispatch::new()
        .level(log::LevelFilter::Debug)
        .chain(
            fern::Dispatch::new()
                .level(stdout_level)
                .format(move |out, message, record| {
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    out.finish(format_args!(
                        "{}",
                        utils::logging::format_human_readable_log(
                            &chrono::Local::now().format("%H:%M:%S").to_string(),
                            record.level(),
                            record.target(),
                            &cleaned_message,
                            phase.as_deref(),
                            step.as_deref(),
                        )
                    ));
                })
                .chain(std::io::stdout()),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let json_line = utils::logging::format_json_log(
                        &chrono::Utc::now().to_rfc3339(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", json_line));
                })
                .chain(fern::log_file(json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &chrono::Local::now()
                            .format("%Y-%m-%d %H:%M:%S%.3f")
                            .to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(fern::log_file(txt_log_file)?),
        )
        .apply()?;

    info!(
        "[PHASE: startup] Logging initialized (log_dir={})",
        log_dir.display()
    );
    Ok(())
}

fn report_failure(err: &InstallError) -> i32 {
    error!("[PHASE: workflow] Installation failed: {}", err);
    eprintln!("Error: {}", err);
    err.exit_code()
}

/// Help is always available; everything else, argument errors included, requires root.
fn admit_cli(parsed: InstallResult<CliCommand>, is_root: bool) -> InstallResult<CliCommand> {
    match parsed {
        Ok(CliCommand::Help(text)) => Ok(CliCommand::Help(text)),
        other => {
            require_root(is_root)?;
            other
        }
    }
}

/// Parse `args`, run the installer and return the process exit code.
pub fn run<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    run_as(args, is_running_as_root())
}

fn run_as<I, T>(args: I, is_root: bool) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = match admit_cli(parse_args(args), is_root) {
        Ok(CliCommand::Install(args)) => args,
        Ok(CliCommand::Help(text)) => {
            println!("{}", text);
            return EXIT_OK;
        }
        Err(e) => {
            eprintln!("{}", e);
            return e.exit_code();
        }
    };

    if let Err(e) = init_logging(args.verbose || args.debug) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            return EXIT_FAILURE;
        }
    };

    let runner = SystemCommandRunner;
    let prompt = DialoguerPrompt;
    let ctx = InstallContext::system(&runner, &prompt);
    match runtime.block_on(run_install(&args, &ctx)) {
        Ok(report) => {
            println!(
                "Tableau Server {} installed ({}).",
                report.version, report.mode
            );
            EXIT_OK
        }
        Err(e) => report_failure(&e),
    }
}

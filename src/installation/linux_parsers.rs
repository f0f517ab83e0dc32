// Parsing utilities (pure functions, testable without a live system)
//
// Everything the installer learns from tool output or generated files goes through here,
// so the orchestration code never touches raw text formats directly.

use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Prefix stripped from the package's metadata name to obtain the version string.
pub const PACKAGE_NAME_PREFIX: &str = "tableau-server-";

pub const GATEWAY_PORT_KEY: &str = "worker0.gateway.port";
pub const CONTROLLER_PORT_KEY: &str = "worker0.tabadmincontroller.port";

/// Derive the version string from a package metadata name
/// (`tableau-server-10.0.0` -> `10.0.0`).
pub fn version_from_package_name(name: &str) -> Option<String> {
    let rest = name.trim().strip_prefix(PACKAGE_NAME_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_string())
}

/// Base name of a package file with its extension stripped, as rpm registers it.
pub fn package_base_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

/// Parse shell-style `KEY=VALUE` assignments without evaluating them.
///
/// Handles `export KEY=VALUE`, single and double quotes, comments and blank lines.
/// Lines that are not simple assignments are ignored.
pub fn parse_env_assignments(contents: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();

    for line in contents.lines() {
        let line = line.trim();
        // Skip comments and empty lines
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                continue;
            }
            let value = value.trim();
            // Remove surrounding quotes if present
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            out.insert(key.to_string(), value.to_string());
        }
    }

    out
}

/// Read the numeric value of `key` from a `key: value` file such as workgroup.yml.
pub fn parse_port_value(contents: &str, key: &str) -> Option<u16> {
    let pattern = format!(
        r#"(?m)^\s*{}\s*:\s*["']?(\d+)["']?\s*$"#,
        regex::escape(key)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(contents)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok())
}

/// Extract the status token from `tsm status` output (`Status: RUNNING`).
pub fn parse_status_token(output: &str) -> Option<String> {
    let re = Regex::new(r"(?mi)^\s*status\s*:\s*([A-Za-z_]+)").ok()?;
    re.captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Home directory field of a `getent passwd` line.
pub fn parse_passwd_home(line: &str) -> Option<PathBuf> {
    let home = line.trim().split(':').nth(5)?;
    if home.is_empty() {
        return None;
    }
    Some(PathBuf::from(home))
}

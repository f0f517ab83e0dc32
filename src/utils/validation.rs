// Input validation and quoting utilities

use std::path::Path;

use crate::error::InstallError;

/// Require that `path` names an existing regular file.
///
/// `what` names the input in the error ("Secrets file"), `remediation` tells the operator
/// how to produce one.
pub fn require_file(path: &Path, what: &str, remediation: &str) -> Result<(), InstallError> {
    if path.is_file() {
        return Ok(());
    }
    Err(InstallError::precondition(
        format!("{} not found: {}", what, path.display()),
        remediation,
    ))
}

/// Escape a value for use inside a double-quoted shell string.
///
/// Inside double quotes the shell still interprets `"`, `\`, `$` and backtick; each is
/// prefixed with a backslash so the value cannot end the quoting context or expand.
pub fn escape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Wrap a value in double quotes with `escape_double_quoted` applied.
pub fn shell_double_quote(value: &str) -> String {
    format!("\"{}\"", escape_double_quoted(value))
}

/// Validate a POSIX account or group name before it is used in a command line.
pub fn validate_account_name(name: &str) -> Result<(), InstallError> {
    let valid = !name.is_empty()
        && name.len() <= 32
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '$'));
    if valid {
        Ok(())
    } else {
        Err(InstallError::precondition(
            format!("Invalid account name: '{}'", name),
            "Account and group names may contain letters, digits, '_', '-', '.' and must not start with '-'.",
        ))
    }
}

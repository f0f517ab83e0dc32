// Installer credentials
//
// The secrets file is a list of `key=value` assignments. It is parsed, never executed:
// only the four known keys are accepted and anything else rejects the whole file.

use std::fmt;

pub const TSM_ADMIN_USER: &str = "tsm_admin_user";
pub const TSM_ADMIN_PASS: &str = "tsm_admin_pass";
pub const SERVER_ADMIN_USER: &str = "tableau_server_admin_user";
pub const SERVER_ADMIN_PASS: &str = "tableau_server_admin_pass";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    pub tsm_admin_user: String,
    pub tsm_admin_pass: String,
    pub server_admin_user: String,
    pub server_admin_pass: String,
}

// Passwords must never reach logs, even through `{:?}`.
impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("tsm_admin_user", &self.tsm_admin_user)
            .field("tsm_admin_pass", &redacted(&self.tsm_admin_pass))
            .field("server_admin_user", &self.server_admin_user)
            .field("server_admin_pass", &redacted(&self.server_admin_pass))
            .finish()
    }
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "***"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretsParseError {
    pub line: usize,
    pub reason: String,
}

impl fmt::Display for SecretsParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

impl Secrets {
    /// Parse secrets file contents.
    ///
    /// Accepts `key=value`, `key="value"` and `key='value'`, blank lines and `#` comments.
    /// Inside double quotes `\"` and `\\` are unescaped. Unknown keys, duplicate keys and
    /// anything that is not a plain assignment (commands, substitutions, `export`) are errors.
    pub fn parse(contents: &str) -> Result<Self, SecretsParseError> {
        let mut secrets = Secrets::default();
        let mut seen: Vec<&str> = Vec::new();

        for (idx, raw) in contents.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let err = |reason: &str| SecretsParseError {
                line: line_no,
                reason: reason.to_string(),
            };

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| err("expected key=value"))?;
            let key = key.trim_end();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(err("invalid key"));
            }
            let value = unquote(value).map_err(|reason| err(&reason))?;

            let slot = match key {
                TSM_ADMIN_USER => &mut secrets.tsm_admin_user,
                TSM_ADMIN_PASS => &mut secrets.tsm_admin_pass,
                SERVER_ADMIN_USER => &mut secrets.server_admin_user,
                SERVER_ADMIN_PASS => &mut secrets.server_admin_pass,
                other => {
                    return Err(err(&format!("unrecognized key '{}'", other)));
                }
            };
            if seen.contains(&key) {
                return Err(err(&format!("duplicate key '{}'", key)));
            }
            seen.push(key);
            *slot = value;
        }

        Ok(secrets)
    }

    /// Name of the first required field that is still empty, in file order.
    pub fn first_missing_field(&self) -> Option<&'static str> {
        [
            (TSM_ADMIN_USER, &self.tsm_admin_user),
            (TSM_ADMIN_PASS, &self.tsm_admin_pass),
            (SERVER_ADMIN_USER, &self.server_admin_user),
            (SERVER_ADMIN_PASS, &self.server_admin_pass),
        ]
        .into_iter()
        .find(|(_, v)| v.is_empty())
        .map(|(k, _)| k)
    }
}

fn unquote(value: &str) -> Result<String, String> {
    let v = value.trim();
    if v.is_empty() {
        return Ok(String::new());
    }

    if let Some(inner) = v.strip_prefix('\'') {
        let inner = inner
            .strip_suffix('\'')
            .ok_or_else(|| "unterminated single quote".to_string())?;
        if inner.contains('\'') {
            return Err("unexpected single quote".to_string());
        }
        return Ok(inner.to_string());
    }

    if let Some(inner) = v.strip_prefix('"') {
        let mut out = String::new();
        let mut chars = inner.chars();
        loop {
            match chars.next() {
                None => return Err("unterminated double quote".to_string()),
                Some('\\') => match chars.next() {
                    Some(c @ ('"' | '\\' | '$' | '`')) => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => return Err("unterminated double quote".to_string()),
                },
                Some('"') => {
                    if chars.as_str().trim().is_empty() {
                        break;
                    }
                    return Err("trailing characters after closing quote".to_string());
                }
                Some('$') | Some('`') => {
                    return Err("shell substitutions are not allowed".to_string());
                }
                Some(c) => out.push(c),
            }
        }
        return Ok(out);
    }

    // Bare words: reject anything the shell would have interpreted.
    if v
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, ';' | '&' | '|' | '$' | '`' | '(' | ')' | '<' | '>' | '"' | '\'' | '\\'))
    {
        return Err("unquoted value contains shell metacharacters".to_string());
    }
    Ok(v.to_string())
}

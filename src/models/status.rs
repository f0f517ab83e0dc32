use serde::Serialize;
use std::fmt;

/// Server state as reported by `tsm status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerStatus {
    Running,
    Degraded,
    Stopped,
    Error,
    Unlicensed,
    Unknown(String),
}

impl ServerStatus {
    /// The single translation point from tool text to a status value.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => ServerStatus::Running,
            "DEGRADED" => ServerStatus::Degraded,
            "STOPPED" => ServerStatus::Stopped,
            "ERROR" => ServerStatus::Error,
            "UNLICENSED" => ServerStatus::Unlicensed,
            _ => ServerStatus::Unknown(token.trim().to_string()),
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerStatus::Running => f.write_str("RUNNING"),
            ServerStatus::Degraded => f.write_str("DEGRADED"),
            ServerStatus::Stopped => f.write_str("STOPPED"),
            ServerStatus::Error => f.write_str("ERROR"),
            ServerStatus::Unlicensed => f.write_str("UNLICENSED"),
            ServerStatus::Unknown(raw) if raw.is_empty() => f.write_str("<none>"),
            ServerStatus::Unknown(raw) => f.write_str(raw),
        }
    }
}

// Installer error taxonomy
//
// Every failure is fatal and surfaces to the operator once, in `main`.
// Usage errors exit 2; everything else exits 1.

use thiserror::Error;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

#[derive(Debug, Error)]
pub enum InstallError {
    /// Bad or missing flags, wrong number of positional arguments.
    #[error("{0}")]
    Usage(String),

    /// A required input is missing or invalid. `remediation` tells the operator how to fix it.
    #[error("{message}\n{remediation}")]
    Precondition {
        message: String,
        remediation: String,
    },

    /// A native installer or delegated tool returned a non-zero exit code.
    #[error("{operation} failed (exit_code={exit_code:?}): {detail}")]
    Delegated {
        operation: String,
        exit_code: Option<i32>,
        detail: String,
    },

    /// The server ended up in a state the workflow cannot continue from.
    #[error("{0}")]
    RuntimeState(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl InstallError {
    pub fn precondition(message: impl Into<String>, remediation: impl Into<String>) -> Self {
        InstallError::Precondition {
            message: message.into(),
            remediation: remediation.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::Usage(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

pub type InstallResult<T> = std::result::Result<T, InstallError>;

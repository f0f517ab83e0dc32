// Secrets resolution
//
// Passwords may be left empty in the secrets file and entered at the terminal instead.
// Usernames are never prompted for. After prompting every field must be non-empty.

use anyhow::{Context, Result};
use log::{debug, info};

use crate::error::{InstallError, InstallResult};
use crate::models::secrets::{Secrets, SERVER_ADMIN_PASS, TSM_ADMIN_PASS};
use crate::preflight::SECRETS_TEMPLATE;

/// Source of passwords the secrets file did not provide.
pub trait PasswordPrompt {
    /// Read one password without echoing it.
    fn prompt_password(&self, label: &str) -> Result<String>;
}

/// Terminal prompt backed by dialoguer; input is not echoed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerPrompt;

impl PasswordPrompt for DialoguerPrompt {
    fn prompt_password(&self, label: &str) -> Result<String> {
        dialoguer::Password::new()
            .with_prompt(label)
            .allow_empty_password(true)
            .interact()
            .with_context(|| format!("Failed to read password for '{}'", label))
    }
}

fn prompt_if_empty(
    prompt: &dyn PasswordPrompt,
    value: &mut String,
    field: &str,
    user: &str,
) -> InstallResult<()> {
    if !value.is_empty() {
        return Ok(());
    }
    debug!("[PHASE: secrets] {} not set in secrets file; prompting", field);
    let label = if user.is_empty() {
        format!("Password for {}", field)
    } else {
        format!("Password for {} ({})", user, field)
    };
    *value = prompt.prompt_password(&label)?;
    Ok(())
}

/// Fill empty passwords from `prompt`, then require every field to be set.
pub fn resolve_secrets(mut secrets: Secrets, prompt: &dyn PasswordPrompt) -> InstallResult<Secrets> {
    let tsm_user = secrets.tsm_admin_user.clone();
    prompt_if_empty(prompt, &mut secrets.tsm_admin_pass, TSM_ADMIN_PASS, &tsm_user)?;
    let server_user = secrets.server_admin_user.clone();
    prompt_if_empty(
        prompt,
        &mut secrets.server_admin_pass,
        SERVER_ADMIN_PASS,
        &server_user,
    )?;

    if let Some(field) = secrets.first_missing_field() {
        return Err(InstallError::precondition(
            format!("'{}' is empty after reading the secrets file.", field),
            format!(
                "Set {} in the secrets file (see {}) or enter it when prompted.",
                field, SECRETS_TEMPLATE
            ),
        ));
    }

    info!("[PHASE: secrets] Credentials resolved ({:?})", secrets);
    Ok(secrets)
}

// Credential handling: interactive prompting for passwords the secrets file leaves empty.

pub mod resolver;

pub use resolver::{resolve_secrets, DialoguerPrompt, PasswordPrompt};

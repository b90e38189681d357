use thiserror::Error;

/// Failures that end a provisioning stage.
///
/// Only `EntryInstallFailed` is non-fatal; it is produced for the end-of-run
/// summary and never propagated with `?`.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("manifest unavailable from {location}: {reason}")]
    ManifestUnavailable { location: String, reason: String },

    #[error("prerequisite '{what}' failed to install: {reason}")]
    PrerequisiteInstallFailed { what: String, reason: String },

    #[error("failed to install '{identifier}': {reason}")]
    EntryInstallFailed { identifier: String, reason: String },

    #[error("dotfiles sync from {url} failed: {reason}")]
    SyncFailed { url: String, reason: String },

    #[error("user '{0}' does not exist")]
    UnknownUser(String),

    #[error("cannot prepare {}: {reason}", .path.display())]
    CheckoutRootUnavailable {
        path: std::path::PathBuf,
        reason: String,
    },
}

impl ProvisionError {
    /// Name of the stage that produced the error, used in fatal messages.
    pub fn stage(&self) -> &'static str {
        match self {
            ProvisionError::ManifestUnavailable { .. } => "manifest",
            ProvisionError::PrerequisiteInstallFailed { .. } => "prerequisites",
            ProvisionError::EntryInstallFailed { .. } => "packages",
            ProvisionError::SyncFailed { .. } => "dotfiles",
            ProvisionError::UnknownUser(_) => "user",
            ProvisionError::CheckoutRootUnavailable { .. } => "checkout",
        }
    }
}

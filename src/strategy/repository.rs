use crate::context::InstallContext;
use crate::execution::{ExecutionError, Executor, Invocation};
use crate::manifest::ManifestEntry;

use super::{Backends, InstallOutcome, Strategy};

/// Native packages through pacman, as root.
pub struct RepositoryStrategy;

/// `pacman --noconfirm --needed -S <name>`
pub fn install_native(
    executor: &dyn Executor,
    pacman: &str,
    name: &str,
) -> Result<(), ExecutionError> {
    let inv = Invocation::new(pacman).args(["--noconfirm", "--needed", "-S", name]);
    executor.run(&inv)
}

impl Strategy for RepositoryStrategy {
    fn source_label(&self) -> &'static str {
        "from the repositories"
    }

    fn install(
        &self,
        entry: &ManifestEntry,
        _ctx: &InstallContext,
        backends: &Backends<'_>,
    ) -> InstallOutcome {
        if backends.installed.has_native(&entry.identifier) {
            return InstallOutcome::Skipped;
        }

        match install_native(
            backends.executor,
            &backends.config.repository.command,
            &entry.identifier,
        ) {
            Ok(()) => InstallOutcome::Installed,
            Err(e) => InstallOutcome::Failed(e.to_string()),
        }
    }
}

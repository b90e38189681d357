use crate::context::InstallContext;
use crate::execution::Invocation;
use crate::manifest::ManifestEntry;

use super::{Backends, InstallOutcome, Strategy};

/// AUR packages through the helper, never as root.
pub struct ForeignStrategy;

impl Strategy for ForeignStrategy {
    fn source_label(&self) -> &'static str {
        "from the AUR"
    }

    fn install(
        &self,
        entry: &ManifestEntry,
        ctx: &InstallContext,
        backends: &Backends<'_>,
    ) -> InstallOutcome {
        if backends.installed.has_foreign(&entry.identifier) {
            return InstallOutcome::Skipped;
        }

        let inv = Invocation::new(&backends.config.foreign.helper)
            .args(["-S", "--noconfirm", entry.identifier.as_str()])
            .identity(ctx.user_identity());

        match backends.executor.run(&inv) {
            Ok(()) => InstallOutcome::Installed,
            Err(e) => InstallOutcome::Failed(e.to_string()),
        }
    }
}

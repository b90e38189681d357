use crate::common::git::{self, CheckoutKind};
use crate::context::{InstallContext, checkout_name};
use crate::manifest::ManifestEntry;
use crate::ui::prelude::*;

use super::{Backends, InstallOutcome, Strategy};

/// Shallow clone (or refresh) a repository, then build and install it.
pub struct SourceBuildStrategy;

impl Strategy for SourceBuildStrategy {
    fn source_label(&self) -> &'static str {
        "via git and make"
    }

    fn install(
        &self,
        entry: &ManifestEntry,
        ctx: &InstallContext,
        backends: &Backends<'_>,
    ) -> InstallOutcome {
        let config = backends.config;
        let Some(name) = checkout_name(&entry.identifier) else {
            return InstallOutcome::Failed(format!(
                "no checkout name in repository URL {}",
                entry.identifier
            ));
        };
        let dir = ctx.checkout_dir(&name);

        let kind = match git::clone_or_pull(
            backends.executor,
            &ctx.user,
            &entry.identifier,
            &dir,
            config.default_branch.as_deref(),
        ) {
            Ok(kind) => kind,
            Err(e) => return InstallOutcome::Failed(e.to_string()),
        };
        if kind == CheckoutKind::Updated {
            emit(
                Level::Debug,
                "strategy.source.updated",
                &format!(
                    "{} Updated existing checkout {}",
                    char::from(NerdFont::GitBranch),
                    dir.display()
                ),
                None,
            );
        }

        let invocations = (config.build_invocation(&ctx.user), config.install_invocation());
        let (build, install) = match invocations {
            (Ok(build), Ok(install)) => (build.in_dir(&dir), install.in_dir(&dir)),
            (Err(e), _) | (_, Err(e)) => return InstallOutcome::Failed(e.to_string()),
        };

        if let Err(e) = backends.executor.run(&build) {
            return InstallOutcome::Failed(format!("build: {}", e));
        }
        match backends.executor.run(&install) {
            Ok(()) => InstallOutcome::Installed,
            Err(e) => InstallOutcome::Failed(format!("install: {}", e)),
        }
    }
}

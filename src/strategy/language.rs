use crate::context::InstallContext;
use crate::execution::Invocation;
use crate::manifest::ManifestEntry;
use crate::ui::prelude::*;

use super::repository::install_native;
use super::{Backends, InstallOutcome, Strategy};

/// Packages from a language package manager (pip by default), as root.
pub struct LanguagePackageStrategy;

impl Strategy for LanguagePackageStrategy {
    fn source_label(&self) -> &'static str {
        "via pip"
    }

    fn install(
        &self,
        entry: &ManifestEntry,
        _ctx: &InstallContext,
        backends: &Backends<'_>,
    ) -> InstallOutcome {
        let language = &backends.config.language;

        if !backends.executor.has_program(&language.command) {
            emit(
                Level::Info,
                "strategy.language.bootstrap",
                &format!(
                    "{} {} not found, installing {}",
                    char::from(NerdFont::Python),
                    language.command,
                    language.bootstrap_package
                ),
                None,
            );
            if let Err(e) = install_native(
                backends.executor,
                &backends.config.repository.command,
                &language.bootstrap_package,
            ) {
                return InstallOutcome::Failed(format!(
                    "could not install {}: {}",
                    language.bootstrap_package, e
                ));
            }
        }

        let inv = Invocation::new(&language.command)
            .args(language.install_args.iter().map(String::as_str))
            .arg(entry.identifier.as_str());

        match backends.executor.run(&inv) {
            Ok(()) => InstallOutcome::Installed,
            Err(e) => InstallOutcome::Failed(e.to_string()),
        }
    }
}

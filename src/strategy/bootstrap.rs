//! Steps that must succeed before the manifest loop: keyring refresh,
//! prerequisite packages and the AUR helper.

use crate::common::git;
use crate::config::Config;
use crate::context::{InstallContext, checkout_name};
use crate::error::ProvisionError;
use crate::execution::{Executor, Invocation};
use crate::probe;
use crate::ui::prelude::*;

use super::repository::install_native;

/// Refresh `archlinux-keyring`. Failure only warns.
pub fn refresh_keyring(executor: &dyn Executor, config: &Config) {
    if !config.refresh_keyring {
        return;
    }
    emit(
        Level::Info,
        "bootstrap.keyring.refresh",
        &format!("{} Refreshing Arch keyring...", char::from(NerdFont::Shield)),
        None,
    );
    let inv = Invocation::new(&config.repository.command).args([
        "--noconfirm",
        "-S",
        "archlinux-keyring",
    ]);
    if let Err(e) = executor.run(&inv) {
        emit(
            Level::Warn,
            "bootstrap.keyring.failed",
            &format!(
                "{} Keyring refresh failed ({}); continuing",
                char::from(NerdFont::Warning),
                e
            ),
            None,
        );
    }
}

/// Install every configured prerequisite, stopping at the first failure.
pub fn install_prerequisites(
    executor: &dyn Executor,
    config: &Config,
) -> Result<(), ProvisionError> {
    for package in &config.prerequisites {
        emit(
            Level::Info,
            "bootstrap.prerequisite",
            &format!(
                "{} Installing `{}` which is required to install and configure other programs.",
                char::from(NerdFont::Package),
                package
            ),
            None,
        );
        install_native(executor, &config.repository.command, package).map_err(|e| {
            ProvisionError::PrerequisiteInstallFailed {
                what: package.clone(),
                reason: e.to_string(),
            }
        })?;
    }
    Ok(())
}

/// Build and install the AUR helper with makepkg unless it is already present.
pub fn bootstrap_helper(
    executor: &dyn Executor,
    ctx: &InstallContext,
    config: &Config,
) -> Result<(), ProvisionError> {
    let foreign = &config.foreign;
    if !foreign.bootstrap {
        return Ok(());
    }
    if probe::is_installed(executor, &config.repository.command, &foreign.helper_package) {
        emit(
            Level::Debug,
            "bootstrap.helper.present",
            &format!("{} is already installed", foreign.helper_package),
            None,
        );
        return Ok(());
    }

    emit(
        Level::Info,
        "bootstrap.helper.start",
        &format!(
            "{} Installing `{}` manually.",
            char::from(NerdFont::Download),
            foreign.helper_package
        ),
        None,
    );

    let fatal = |reason: String| ProvisionError::PrerequisiteInstallFailed {
        what: foreign.helper_package.clone(),
        reason,
    };

    let name = checkout_name(&foreign.bootstrap_url).ok_or_else(|| {
        fatal(format!(
            "no checkout name in bootstrap URL {}",
            foreign.bootstrap_url
        ))
    })?;
    let dir = ctx.checkout_dir(&name);
    git::clone_or_pull(
        executor,
        &ctx.user,
        &foreign.bootstrap_url,
        &dir,
        config.default_branch.as_deref(),
    )
    .map_err(|e| fatal(e.to_string()))?;

    let makepkg = Invocation::new("makepkg")
        .args(["--noconfirm", "-si"])
        .as_user(&ctx.user)
        .in_dir(&dir);
    executor.run(&makepkg).map_err(|e| fatal(e.to_string()))?;

    emit(
        Level::Success,
        "bootstrap.helper.done",
        &format!(
            "{} Installed {}",
            char::from(NerdFont::Check),
            foreign.helper_package
        ),
        None,
    );
    Ok(())
}

//! Drives a provisioning run: preparation, the manifest loop and dotfiles.

use serde_json::json;

use crate::common::progress::{create_spinner, finish_spinner};
use crate::config::Config;
use crate::context::InstallContext;
use crate::dotfiles::{self, SyncReport};
use crate::error::ProvisionError;
use crate::execution::{Executor, TargetUser};
use crate::manifest::{self, ManifestEntry};
use crate::probe;
use crate::strategy::{Backends, InstallOutcome, bootstrap, strategy_for};
use crate::ui::prelude::*;
use std::path::Path;

pub mod summary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub index: usize,
    pub entry: ManifestEntry,
    pub outcome: InstallOutcome,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<EntryRecord>,
    /// Final value of the progress counter.
    pub processed: usize,
    pub dotfiles: Option<SyncReport>,
}

impl RunReport {
    fn count(&self, label: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome.label() == label)
            .count()
    }

    pub fn installed(&self) -> usize {
        self.count("installed")
    }

    pub fn skipped(&self) -> usize {
        self.count("skipped")
    }

    pub fn failed(&self) -> usize {
        self.count("failed")
    }

    /// Non-fatal entry failures, in manifest order.
    pub fn failures(&self) -> Vec<ProvisionError> {
        self.records
            .iter()
            .filter_map(|r| match &r.outcome {
                InstallOutcome::Failed(reason) => Some(ProvisionError::EntryInstallFailed {
                    identifier: r.entry.identifier.clone(),
                    reason: reason.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

/// Dispatch every entry in order. Failures are recorded and the loop goes on.
pub fn run_manifest(
    entries: &[ManifestEntry],
    ctx: &mut InstallContext,
    backends: &Backends<'_>,
) -> RunReport {
    let mut report = RunReport::default();

    for entry in entries {
        let index = ctx.advance();
        let strategy = strategy_for(entry.tag);

        let mut message = format!(
            "{} Installing `{}` {} {}.",
            char::from(NerdFont::Package),
            entry.identifier,
            ctx.progress_label(),
            strategy.source_label()
        );
        if !entry.note.is_empty() {
            message.push(' ');
            message.push_str(&entry.note);
        }
        emit(
            Level::Info,
            "provision.entry.start",
            &message,
            Some(json!({
                "index": index,
                "total": ctx.total,
                "tag": entry.tag.display_name(),
                "identifier": entry.identifier,
            })),
        );

        let spinner = (!backends.executor.is_dry_run())
            .then(|| create_spinner(format!("Working on {}...", entry.identifier)));
        let outcome = strategy.install(entry, ctx, backends);
        if let Some(pb) = spinner {
            finish_spinner(pb);
        }

        let data = Some(json!({
            "index": index,
            "identifier": entry.identifier,
            "outcome": outcome.label(),
        }));
        match &outcome {
            InstallOutcome::Installed => emit(
                Level::Success,
                "provision.entry.installed",
                &format!("{} Installed {}", char::from(NerdFont::Check), entry.identifier),
                data,
            ),
            InstallOutcome::Skipped => emit(
                Level::Info,
                "provision.entry.skipped",
                &format!(
                    "{} {} is already installed",
                    char::from(NerdFont::Skip),
                    entry.identifier
                ),
                data,
            ),
            InstallOutcome::Failed(reason) => emit(
                Level::Warn,
                "provision.entry.failed",
                &format!(
                    "{} Failed to install {}: {}",
                    char::from(NerdFont::Cross),
                    entry.identifier,
                    reason
                ),
                data,
            ),
        }

        report.records.push(EntryRecord {
            index,
            entry: entry.clone(),
            outcome,
        });
    }

    report.processed = ctx.current();
    report
}

/// Everything `provision` needs besides the executor.
pub struct ProvisionRequest<'a> {
    pub config: &'a Config,
    pub user: TargetUser,
    /// Manifest path or URL.
    pub manifest: &'a str,
    pub sync_dotfiles: bool,
}

/// Result of a run that got through the package stage.
///
/// The dotfiles stage fails on its own so the package summary survives it.
#[derive(Debug)]
pub struct ProvisionOutcome {
    pub report: RunReport,
    pub dotfiles: Result<Option<SyncReport>, ProvisionError>,
}

/// Create the shared checkout root owned by `user`. Dry runs leave it alone.
pub fn prepare_checkout_root(
    executor: &dyn Executor,
    user: &TargetUser,
    checkout_root: &Path,
) -> Result<(), ProvisionError> {
    if executor.is_dry_run() {
        return Ok(());
    }
    user.ensure_owned_dir(checkout_root)
        .map_err(|e| ProvisionError::CheckoutRootUnavailable {
            path: checkout_root.to_path_buf(),
            reason: format!("{:#}", e),
        })
}

/// Full run after privileges and the target user are settled.
pub fn provision(
    executor: &dyn Executor,
    request: ProvisionRequest<'_>,
) -> Result<ProvisionOutcome, ProvisionError> {
    let ProvisionRequest {
        config,
        user,
        manifest: source,
        sync_dotfiles,
    } = request;

    let checkout_root = config.checkout_root_for(&user);
    prepare_checkout_root(executor, &user, &checkout_root)?;

    let entries = manifest::load(source)?;
    emit(
        Level::Info,
        "manifest.loaded",
        &format!(
            "{} {} entries in manifest",
            char::from(NerdFont::Archive),
            entries.len()
        ),
        Some(json!({ "entries": entries.len() })),
    );

    bootstrap::refresh_keyring(executor, config);
    bootstrap::install_prerequisites(executor, config)?;

    let mut ctx = InstallContext::new(user, checkout_root, entries.len());
    bootstrap::bootstrap_helper(executor, &ctx, config)?;

    let installed = probe::snapshot(executor, &config.repository.command);
    let backends = Backends {
        executor,
        installed: &installed,
        config,
    };

    separator(true);
    let mut report = run_manifest(&entries, &mut ctx, &backends);
    separator(true);

    let dotfiles = if sync_dotfiles {
        sync_configured_dotfiles(executor, config, &ctx)
    } else {
        Ok(None)
    };
    if let Ok(Some(sync)) = &dotfiles {
        report.dotfiles = Some(sync.clone());
    }

    Ok(ProvisionOutcome { report, dotfiles })
}

/// Sync the configured dotfiles repository, if any, then prune metadata.
pub fn sync_configured_dotfiles(
    executor: &dyn Executor,
    config: &Config,
    ctx: &InstallContext,
) -> Result<Option<SyncReport>, ProvisionError> {
    let Some(url) = config.dotfiles.repository.as_deref() else {
        emit(
            Level::Debug,
            "dotfiles.skipped",
            "No dotfiles repository configured",
            None,
        );
        return Ok(None);
    };

    let destination = config.dotfiles_destination_for(&ctx.user);
    let staging = dotfiles::staging_dir(ctx.checkout_root(), url).ok_or_else(|| {
        ProvisionError::SyncFailed {
            url: url.to_string(),
            reason: "no checkout name in repository URL".to_string(),
        }
    })?;
    let report = dotfiles::sync(
        executor,
        &ctx.user,
        url,
        &destination,
        config.dotfiles.branch.as_deref(),
        &staging,
    )?;

    if !executor.is_dry_run() {
        for path in dotfiles::prune(&destination, &config.dotfiles.prune) {
            emit(
                Level::Debug,
                "dotfiles.prune.removed",
                &format!("Removed {}", path.display()),
                None,
            );
        }
    }

    Ok(Some(report))
}

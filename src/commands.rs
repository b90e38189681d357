//! Command handlers behind the CLI.

use anyhow::{Result, bail};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde_json::json;
use std::path::Path;

use crate::config::{Config, DRY_RUN_FLAG};
use crate::context::InstallContext;
use crate::execution::identity::{ensure_root, is_root};
use crate::execution::{DryRunExecutor, Executor, SystemExecutor, TargetUser};
use crate::manifest::{self, ManifestEntry};
use crate::orchestrator::{self, ProvisionRequest, summary};
use crate::strategy::strategy_for;
use crate::ui::prelude::*;

pub struct InstallArgs {
    pub manifest: Option<String>,
    pub user: Option<String>,
    pub dotfiles: Option<String>,
    pub branch: Option<String>,
    pub dry_run: bool,
    pub skip_dotfiles: bool,
}

/// Dry runs are forced system-wide by the presence of the flag file.
fn dry_run_requested(flag: bool) -> bool {
    flag || Path::new(DRY_RUN_FLAG).exists()
}

fn executor_for(dry_run: bool) -> Box<dyn Executor> {
    if dry_run {
        emit(
            Level::Info,
            "riceup.dry_run",
            &format!(
                "{} Dry run: commands are printed, nothing is changed",
                char::from(NerdFont::Info)
            ),
            None,
        );
        Box::new(DryRunExecutor::new())
    } else {
        Box::new(SystemExecutor)
    }
}

/// `--user`, then the config file, then the account that invoked sudo.
/// An unprivileged dry run falls back to the invoking account.
fn resolve_user(flag: Option<String>, config: &Config) -> Result<TargetUser> {
    let name = flag
        .or_else(|| config.user.clone())
        .or_else(|| std::env::var("SUDO_USER").ok().filter(|u| u != "root"));
    let user = match name {
        Some(name) => TargetUser::lookup(&name)?,
        None if !is_root() => TargetUser::current()?,
        None => bail!("No target user: pass --user or set `user` in the config file"),
    };
    emit(
        Level::Debug,
        "riceup.user",
        &format!("Target user {} ({})", user.name, user.home.display()),
        None,
    );
    Ok(user)
}

pub fn handle_install(config_path: &Path, args: InstallArgs) -> Result<()> {
    let dry_run = dry_run_requested(args.dry_run);
    if !dry_run {
        ensure_root()?;
    }

    let mut config = Config::load(config_path)?;
    if let Some(url) = args.dotfiles {
        config.dotfiles.repository = Some(url);
    }
    if let Some(branch) = args.branch {
        config.dotfiles.branch = Some(branch);
    }
    let manifest = args.manifest.unwrap_or_else(|| config.manifest.clone());
    let user = resolve_user(args.user, &config)?;

    let executor = executor_for(dry_run);
    let outcome = orchestrator::provision(
        executor.as_ref(),
        ProvisionRequest {
            config: &config,
            user,
            manifest: &manifest,
            sync_dotfiles: !args.skip_dotfiles,
        },
    )?;

    summary::print_summary(&outcome.report);
    outcome.dotfiles?;
    Ok(())
}

fn plan_table(entries: &[ManifestEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Strategy", "Package", "Note"]);
    for (i, entry) in entries.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            entry.tag.display_name().to_string(),
            entry.identifier.clone(),
            entry.note.clone(),
        ]);
    }
    table
}

pub fn handle_plan(config_path: &Path, manifest: Option<String>) -> Result<()> {
    let config = Config::load(config_path)?;
    let source = manifest.unwrap_or(config.manifest);
    let entries = manifest::load(&source)?;

    if get_output_format() == OutputFormat::Json {
        for (i, entry) in entries.iter().enumerate() {
            emit(
                Level::Info,
                "plan.entry",
                &format!("{} {}", entry.tag, entry.identifier),
                Some(json!({
                    "index": i + 1,
                    "total": entries.len(),
                    "tag": entry.tag.display_name(),
                    "marker": entry.tag.marker(),
                    "source": strategy_for(entry.tag).source_label(),
                    "identifier": entry.identifier,
                    "note": entry.note,
                })),
            );
        }
        return Ok(());
    }

    println!("{}", plan_table(&entries));
    emit(
        Level::Info,
        "plan.total",
        &format!("{} entries from {}", entries.len(), source),
        None,
    );
    Ok(())
}

pub fn handle_dotfiles(
    config_path: &Path,
    user: Option<String>,
    repository: Option<String>,
    branch: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let dry_run = dry_run_requested(dry_run);
    if !dry_run {
        ensure_root()?;
    }

    let mut config = Config::load(config_path)?;
    if repository.is_some() {
        config.dotfiles.repository = repository;
    }
    if branch.is_some() {
        config.dotfiles.branch = branch;
    }
    if config.dotfiles.repository.is_none() {
        bail!("No dotfiles repository: pass --repository or set [dotfiles] repository");
    }

    let user = resolve_user(user, &config)?;
    let checkout_root = config.checkout_root_for(&user);
    let executor = executor_for(dry_run);
    orchestrator::prepare_checkout_root(executor.as_ref(), &user, &checkout_root)?;
    let ctx = InstallContext::new(user, checkout_root, 0);

    let synced = orchestrator::sync_configured_dotfiles(executor.as_ref(), &config, &ctx)?;
    if let Some(report) = synced {
        emit(
            Level::Debug,
            "dotfiles.report",
            &format!(
                "{:?} checkout, {} files, {} links",
                report.checkout, report.files, report.links
            ),
            None,
        );
    }
    Ok(())
}

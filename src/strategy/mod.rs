//! Installation strategies, one per manifest tag.
//!
//! Every strategy follows the same shape: an idempotency check, then the
//! action. Command failures become [`InstallOutcome::Failed`]; nothing here
//! aborts the run.

use std::fmt;

use crate::config::Config;
use crate::context::InstallContext;
use crate::execution::Executor;
use crate::manifest::{ManifestEntry, Tag};
use crate::probe::InstalledSet;

pub mod bootstrap;
mod foreign;
mod language;
mod repository;
mod source;

pub use foreign::ForeignStrategy;
pub use language::LanguagePackageStrategy;
pub use repository::RepositoryStrategy;
pub use source::SourceBuildStrategy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Skipped,
    Installed,
    Failed(String),
}

impl InstallOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, InstallOutcome::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            InstallOutcome::Skipped => "skipped",
            InstallOutcome::Installed => "installed",
            InstallOutcome::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallOutcome::Failed(reason) => write!(f, "failed: {}", reason),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// What strategies act through: the executor, the pre-loop snapshot and the
/// configured commands.
pub struct Backends<'a> {
    pub executor: &'a dyn Executor,
    pub installed: &'a InstalledSet,
    pub config: &'a Config,
}

pub trait Strategy {
    /// Short phrase used in progress messages, e.g. "from the AUR".
    fn source_label(&self) -> &'static str;

    fn install(
        &self,
        entry: &ManifestEntry,
        ctx: &InstallContext,
        backends: &Backends<'_>,
    ) -> InstallOutcome;
}

/// Resolve a tag to its strategy.
pub fn strategy_for(tag: Tag) -> &'static dyn Strategy {
    match tag {
        Tag::Foreign => &ForeignStrategy,
        Tag::SourceBuild => &SourceBuildStrategy,
        Tag::LanguagePackage => &LanguagePackageStrategy,
        Tag::Repository => &RepositoryStrategy,
    }
}

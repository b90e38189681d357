use std::path::{Path, PathBuf};

use crate::execution::{Identity, TargetUser};

/// State shared by every strategy call during one provisioning run.
#[derive(Debug, Clone)]
pub struct InstallContext {
    pub user: TargetUser,
    pub checkout_root: PathBuf,
    pub total: usize,
    current: usize,
}

impl InstallContext {
    pub fn new(user: TargetUser, checkout_root: PathBuf, total: usize) -> Self {
        Self {
            user,
            checkout_root,
            total,
            current: 0,
        }
    }

    /// Move on to the next manifest entry. Returns the new 1-based position.
    pub fn advance(&mut self) -> usize {
        self.current += 1;
        self.current
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// `(n of total)` for the entry being processed.
    pub fn progress_label(&self) -> String {
        format!("({} of {})", self.current, self.total)
    }

    pub fn user_identity(&self) -> Identity {
        Identity::User(self.user.clone())
    }

    /// Per-package directory under the shared checkout root.
    pub fn checkout_dir(&self, name: &str) -> PathBuf {
        self.checkout_root.join(name)
    }

    pub fn checkout_root(&self) -> &Path {
        &self.checkout_root
    }
}

/// Directory name for a repository URL: last path segment without `.git`.
///
/// `None` when that segment is empty or would escape the checkout root.
pub fn checkout_name(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    match trimmed.rsplit(['/', ':']).next()? {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

//! Shallow clone, or force-refresh an existing checkout.
//!
//! All git commands run as the target user so checkouts are never root-owned.

use git2::Repository;
use std::path::Path;
use thiserror::Error;

use crate::execution::{ExecutionError, Executor, Invocation, TargetUser};
use crate::ui::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutKind {
    Cloned,
    Updated,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("could not clone {url} and {} does not exist: {source}", .dir.display())]
    Unavailable {
        url: String,
        dir: std::path::PathBuf,
        #[source]
        source: ExecutionError,
    },

    #[error("could not refresh {}: {source}", .dir.display())]
    PullFailed {
        dir: std::path::PathBuf,
        #[source]
        source: ExecutionError,
    },
}

/// Whether `dir` already holds a usable git checkout.
pub fn is_checkout(dir: &Path) -> bool {
    Repository::open(dir).is_ok()
}

fn clone_invocation(url: &str, dir: &Path, branch: Option<&str>) -> Invocation {
    let mut inv = Invocation::new("git").args([
        "clone",
        "--depth",
        "1",
        "--single-branch",
        "--no-tags",
        "-q",
    ]);
    if let Some(branch) = branch {
        inv = inv.args(["--branch", branch]);
    }
    inv.arg(url).arg(dir.to_string_lossy())
}

/// Fetch the branch tip and hard-reset onto it, discarding local divergence.
pub fn force_pull(
    executor: &dyn Executor,
    user: &TargetUser,
    dir: &Path,
    branch: Option<&str>,
) -> Result<(), CheckoutError> {
    let fetch = Invocation::new("git")
        .args(["fetch", "--depth", "1", "--no-tags", "-q", "origin"])
        .arg(branch.unwrap_or("HEAD"))
        .as_user(user)
        .in_dir(dir);
    let reset = Invocation::new("git")
        .args(["reset", "--hard", "-q", "FETCH_HEAD"])
        .as_user(user)
        .in_dir(dir);

    executor
        .run(&fetch)
        .and_then(|_| executor.run(&reset))
        .map_err(|source| CheckoutError::PullFailed {
            dir: dir.to_path_buf(),
            source,
        })
}

/// Clone `url` into `dir`, or update `dir` in place when it is already there.
///
/// An existing checkout is pulled without attempting a clone. A failed clone
/// falls back to pulling only when `dir` exists.
pub fn clone_or_pull(
    executor: &dyn Executor,
    user: &TargetUser,
    url: &str,
    dir: &Path,
    branch: Option<&str>,
) -> Result<CheckoutKind, CheckoutError> {
    if is_checkout(dir) {
        emit(
            Level::Debug,
            "git.checkout.existing",
            &format!("{} is already checked out, pulling", dir.display()),
            None,
        );
        force_pull(executor, user, dir, branch)?;
        return Ok(CheckoutKind::Updated);
    }

    let clone = clone_invocation(url, dir, branch).as_user(user);
    match executor.run(&clone) {
        Ok(()) => Ok(CheckoutKind::Cloned),
        Err(source) if !dir.is_dir() => Err(CheckoutError::Unavailable {
            url: url.to_string(),
            dir: dir.to_path_buf(),
            source,
        }),
        Err(e) => {
            emit(
                Level::Debug,
                "git.clone.fallback",
                &format!("Clone into {} failed ({}), pulling instead", dir.display(), e),
                None,
            );
            force_pull(executor, user, dir, branch)?;
            Ok(CheckoutKind::Updated)
        }
    }
}

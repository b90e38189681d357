//! Dotfiles synchronizer: refresh a staging checkout and copy it over the
//! target user's home.

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::{lchown, symlink};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::common::git::{self, CheckoutKind};
use crate::context::checkout_name;
use crate::error::ProvisionError;
use crate::execution::{Executor, TargetUser};
use crate::ui::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub checkout: CheckoutKind,
    pub files: usize,
    pub links: usize,
}

/// Persistent staging checkout for a dotfiles repository.
pub fn staging_dir(checkout_root: &Path, url: &str) -> Option<PathBuf> {
    checkout_name(url).map(|name| checkout_root.join("dotfiles").join(name))
}

/// Bring `destination` in line with the repository at `url`.
///
/// Files in the repository overwrite their counterparts; everything else in
/// `destination` is left alone.
pub fn sync(
    executor: &dyn Executor,
    user: &TargetUser,
    url: &str,
    destination: &Path,
    branch: Option<&str>,
    staging: &Path,
) -> Result<SyncReport, ProvisionError> {
    let failed = |reason: String| ProvisionError::SyncFailed {
        url: url.to_string(),
        reason,
    };

    emit(
        Level::Info,
        "dotfiles.sync.start",
        &format!(
            "{} Downloading and installing config files...",
            char::from(NerdFont::Sync)
        ),
        None,
    );

    if !executor.is_dry_run() {
        user.ensure_owned_dir(destination)
            .map_err(|e| failed(format!("{:#}", e)))?;
        if let Some(parent) = staging.parent() {
            user.ensure_owned_dir(parent)
                .map_err(|e| failed(format!("{:#}", e)))?;
        }
    }

    let checkout = git::clone_or_pull(executor, user, url, staging, branch)
        .map_err(|e| failed(e.to_string()))?;

    if executor.is_dry_run() {
        emit(
            Level::Info,
            "dotfiles.sync.dry_run",
            &format!(
                "[DRY RUN] copy {} over {}",
                staging.display(),
                destination.display()
            ),
            None,
        );
        return Ok(SyncReport {
            checkout,
            files: 0,
            links: 0,
        });
    }

    let (files, links) =
        copy_tree(staging, destination, user).map_err(|e| failed(format!("{:#}", e)))?;

    emit(
        Level::Success,
        "dotfiles.sync.done",
        &format!(
            "{} Copied {} files and {} links into {}",
            char::from(NerdFont::Folder),
            files,
            links,
            destination.display()
        ),
        Some(serde_json::json!({
            "files": files,
            "links": links,
            "destination": destination.display().to_string(),
        })),
    );

    Ok(SyncReport {
        checkout,
        files,
        links,
    })
}

fn chown_link(path: &Path, user: &TargetUser) -> Result<()> {
    lchown(path, Some(user.uid), Some(user.gid))
        .with_context(|| format!("Failed to chown {} to {}", path.display(), user.name))
}

/// Remove whatever sits at `path` unless it is a real directory.
fn clear_slot(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => {
            anyhow::bail!("{} is a directory", path.display())
        }
        Ok(_) => fs::remove_file(path)
            .with_context(|| format!("removing {}", path.display())),
        Err(_) => Ok(()),
    }
}

/// Copy `from` over `to`, skipping `.git`. Returns (files, links) copied.
fn copy_tree(from: &Path, to: &Path, user: &TargetUser) -> Result<(usize, usize)> {
    let mut files = 0;
    let mut links = 0;

    let walker = WalkDir::new(from)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", from.display()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .with_context(|| format!("{} is outside {}", entry.path().display(), from.display()))?;
        let target = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if !target.is_dir() {
                fs::create_dir_all(&target)
                    .with_context(|| format!("creating {}", target.display()))?;
                user.take_ownership(&target)?;
            }
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())
                .with_context(|| format!("reading link {}", entry.path().display()))?;
            clear_slot(&target)?;
            symlink(&link, &target)
                .with_context(|| format!("linking {}", target.display()))?;
            chown_link(&target, user)?;
            links += 1;
        } else {
            if fs::symlink_metadata(&target).is_ok_and(|m| m.file_type().is_symlink()) {
                clear_slot(&target)?;
            }
            fs::copy(entry.path(), &target)
                .with_context(|| format!("copying {}", target.display()))?;
            user.take_ownership(&target)?;
            files += 1;
        }
    }

    Ok((files, links))
}

/// Delete repository metadata that should not live in the destination.
pub fn prune(destination: &Path, names: &[String]) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    for name in names {
        let path = destination.join(name);
        let result = match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&path),
            Ok(_) => fs::remove_file(&path),
            Err(_) => continue,
        };
        match result {
            Ok(()) => removed.push(path),
            Err(e) => emit(
                Level::Warn,
                "dotfiles.prune.failed",
                &format!(
                    "{} Could not remove {}: {}",
                    char::from(NerdFont::Warning),
                    path.display(),
                    e
                ),
                None,
            ),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::testing::{RecordingExecutor, fail};

    fn populate_staging(staging: &Path) {
        git2::Repository::init(staging).unwrap();
        fs::create_dir_all(staging.join(".config/nvim")).unwrap();
        fs::write(staging.join(".config/nvim/init.vim"), "set number").unwrap();
        fs::write(staging.join(".zprofile"), "export EDITOR=nvim").unwrap();
        fs::write(staging.join("README.md"), "my dots").unwrap();
        symlink(".zprofile", staging.join(".profile")).unwrap();
    }

    #[test]
    fn test_staging_dir_is_per_repository() {
        let root = Path::new("/home/alice/.local/src");
        assert_eq!(
            staging_dir(root, "https://github.com/me/voidrice.git"),
            Some(PathBuf::from("/home/alice/.local/src/dotfiles/voidrice"))
        );
        assert_eq!(staging_dir(root, "https://github.com/me/.."), None);
    }

    #[test]
    fn test_sync_overwrites_and_preserves() {
        let user = TargetUser::current().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let staging = tmp.path().join("src/dotfiles/dots");
        let home = tmp.path().join("home");
        populate_staging(&staging);
        fs::create_dir_all(&home).unwrap();
        fs::write(home.join(".zprofile"), "old").unwrap();
        fs::write(home.join(".bashrc"), "untouched").unwrap();
        fs::write(home.join(".profile"), "plain file").unwrap();

        let exec = RecordingExecutor::new();
        let url = "https://example.com/dots.git";
        let report = sync(&exec, &user, url, &home, None, &staging).unwrap();

        assert_eq!(report.checkout, CheckoutKind::Updated);
        assert_eq!(report.files, 3);
        assert_eq!(report.links, 1);
        assert_eq!(fs::read_to_string(home.join(".zprofile")).unwrap(), "export EDITOR=nvim");
        assert_eq!(fs::read_to_string(home.join(".bashrc")).unwrap(), "untouched");
        assert_eq!(
            fs::read_to_string(home.join(".config/nvim/init.vim")).unwrap(),
            "set number"
        );
        assert_eq!(fs::read_link(home.join(".profile")).unwrap(), PathBuf::from(".zprofile"));
        assert!(!home.join(".git").exists());
        assert_eq!(exec.count_matching("git clone"), 0);
    }

    #[test]
    fn test_unreachable_repository_is_sync_failure() {
        let user = TargetUser::current().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let staging = tmp.path().join("src/dotfiles/dots");
        let home = tmp.path().join("home");

        let exec = RecordingExecutor::responding(fail);
        let url = "https://example.com/dots.git";
        let err = sync(&exec, &user, url, &home, None, &staging).unwrap_err();

        assert_eq!(err.stage(), "dotfiles");
        assert!(home.is_dir());
    }

    #[test]
    fn test_prune_removes_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path();
        fs::create_dir_all(home.join(".git/objects")).unwrap();
        fs::write(home.join("README.md"), "x").unwrap();
        fs::write(home.join(".zshrc"), "x").unwrap();

        let names: Vec<String> = [".git", "README.md", "LICENSE"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let removed = prune(home, &names);

        assert_eq!(removed.len(), 2);
        assert!(!home.join(".git").exists());
        assert!(!home.join("README.md").exists());
        assert!(home.join(".zshrc").exists());
    }
}

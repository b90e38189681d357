use anyhow::{Context, Result};
use nix::unistd::{Gid, Uid, User, chown};
use std::path::{Path, PathBuf};

use crate::error::ProvisionError;

/// The unprivileged account that owns checkouts and runs builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUser {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
}

impl TargetUser {
    /// Resolve an existing account from the passwd database.
    pub fn lookup(name: &str) -> Result<Self, ProvisionError> {
        match User::from_name(name) {
            Ok(Some(user)) => Ok(Self::from_user(user)),
            _ => Err(ProvisionError::UnknownUser(name.to_string())),
        }
    }

    /// The account running this process.
    pub fn current() -> Result<Self> {
        let user = User::from_uid(nix::unistd::getuid())
            .context("Failed to read passwd entry for current user")?
            .context("Current user has no passwd entry")?;
        Ok(Self::from_user(user))
    }

    fn from_user(user: User) -> Self {
        Self {
            name: user.name,
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
            home: user.dir,
        }
    }

    /// Hand a path over to this user.
    pub fn take_ownership(&self, path: &Path) -> Result<()> {
        chown(
            path,
            Some(Uid::from_raw(self.uid)),
            Some(Gid::from_raw(self.gid)),
        )
        .with_context(|| format!("Failed to chown {} to {}", path.display(), self.name))
    }

    /// Create `path` (and parents) and make the leaf directory owned by this user.
    pub fn ensure_owned_dir(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("creating directory {}", path.display()))?;
        self.take_ownership(path)
    }

    /// Expand `~` against this user's home rather than the invoking account's.
    pub fn expand_path(&self, raw: &str) -> PathBuf {
        let home = self.home.to_string_lossy().to_string();
        let expanded = shellexpand::tilde_with_context(raw, || Some(home.clone()));
        PathBuf::from(expanded.as_ref())
    }
}

/// Effective root, either as the root user or through a setuid binary.
pub fn is_root() -> bool {
    !matches!(sudo::check(), sudo::RunningAs::User)
}

/// Re-run the current command through sudo unless already root.
pub fn ensure_root() -> Result<()> {
    if let sudo::RunningAs::User = sudo::check() {
        sudo::with_env(&["RUST_BACKTRACE", "RUST_LOG"])
            .map_err(|e| anyhow::anyhow!("Failed to escalate privileges: {}", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> TargetUser {
        TargetUser {
            name: "alice".into(),
            uid: 1000,
            gid: 1000,
            home: PathBuf::from("/home/alice"),
        }
    }

    #[test]
    fn test_expand_path_uses_target_home() {
        let user = alice();
        assert_eq!(
            user.expand_path("~/.local/src"),
            PathBuf::from("/home/alice/.local/src")
        );
        assert_eq!(user.expand_path("/opt/src"), PathBuf::from("/opt/src"));
    }

    #[test]
    fn test_lookup_unknown_user() {
        let err = TargetUser::lookup("no-such-user-riceup-test").unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::UnknownUser(name) if name == "no-such-user-riceup-test"
        ));
    }

    #[test]
    fn test_is_root_matches_effective_uid() {
        assert_eq!(is_root(), nix::unistd::geteuid().is_root());
    }

    #[test]
    fn test_ensure_owned_dir_for_current_user() {
        let user = TargetUser::current().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b");
        user.ensure_owned_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }
}

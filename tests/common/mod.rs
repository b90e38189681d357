use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory holding a manifest and a config file for one test.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` as the manifest and return its path.
    pub fn write_manifest(&self, content: &str) -> Result<PathBuf> {
        let path = self.path().join("progs.csv");
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Config path that does not exist, so every run uses the defaults.
    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    /// Name of the account running the tests.
    pub fn current_user(&self) -> Result<String> {
        let user = nix::unistd::User::from_uid(nix::unistd::getuid())?
            .ok_or_else(|| anyhow::anyhow!("current uid has no passwd entry"))?;
        Ok(user.name)
    }
}

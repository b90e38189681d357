use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::execution::{Identity, Invocation, TargetUser};

pub const DEFAULT_CONFIG_FILE: &str = "/etc/riceup/config.toml";
pub const DRY_RUN_FLAG: &str = "/etc/riceup/dryrun";

fn default_manifest() -> String {
    "/etc/riceup/progs.csv".to_string()
}

fn default_checkout_root() -> String {
    "~/.local/src".to_string()
}

fn default_true() -> bool {
    true
}

fn default_prerequisites() -> Vec<String> {
    ["curl", "ca-certificates", "base-devel", "git", "ntp", "zsh"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Native package manager settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RepositoryConfig {
    pub command: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            command: "pacman".to_string(),
        }
    }
}

/// AUR helper settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ForeignConfig {
    /// Helper executable and the package that provides it.
    pub helper: String,
    pub helper_package: String,
    /// Build the helper from the AUR before the manifest runs.
    pub bootstrap: bool,
    pub bootstrap_url: String,
}

impl Default for ForeignConfig {
    fn default() -> Self {
        Self {
            helper: "yay".to_string(),
            helper_package: "yay-bin".to_string(),
            bootstrap: true,
            bootstrap_url: "https://aur.archlinux.org/yay-bin.git".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuildIdentity {
    #[default]
    User,
    Root,
}

/// Commands run inside a source checkout.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SourceBuildConfig {
    pub build: String,
    pub install: String,
    pub build_as: BuildIdentity,
}

impl Default for SourceBuildConfig {
    fn default() -> Self {
        Self {
            build: "make".to_string(),
            install: "make install".to_string(),
            build_as: BuildIdentity::User,
        }
    }
}

/// Language package manager settings (pip by default).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LanguageConfig {
    pub command: String,
    /// Native package that provides `command` when it is missing.
    pub bootstrap_package: String,
    pub install_args: Vec<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            command: "pip".to_string(),
            bootstrap_package: "python-pip".to_string(),
            install_args: vec!["install".to_string(), "--no-input".to_string()],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DotfilesConfig {
    pub repository: Option<String>,
    pub branch: Option<String>,
    /// Defaults to the target user's home.
    pub destination: Option<String>,
    /// Removed from the destination after a sync.
    pub prune: Vec<String>,
}

impl Default for DotfilesConfig {
    fn default() -> Self {
        Self {
            repository: None,
            branch: None,
            destination: None,
            prune: [".git", "README.md", "LICENSE", "FUNDING.yml"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default = "default_checkout_root")]
    pub checkout_root: String,
    #[serde(default = "default_manifest")]
    pub manifest: String,
    /// Branch pulled when refreshing an existing checkout; remote HEAD if unset.
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default = "default_true")]
    pub refresh_keyring: bool,
    #[serde(default = "default_prerequisites")]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub foreign: ForeignConfig,
    #[serde(default)]
    pub source_build: SourceBuildConfig,
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(default)]
    pub dotfiles: DotfilesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            user: None,
            checkout_root: default_checkout_root(),
            manifest: default_manifest(),
            default_branch: None,
            refresh_keyring: true,
            prerequisites: default_prerequisites(),
            repository: RepositoryConfig::default(),
            foreign: ForeignConfig::default(),
            source_build: SourceBuildConfig::default(),
            language: LanguageConfig::default(),
            dotfiles: DotfilesConfig::default(),
        }
    }
}

impl Config {
    /// Load the config from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&s).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(s: &str) -> Result<Config> {
        let c: Config = toml::from_str(s)?;
        Ok(c)
    }

    /// Shared checkout directory, with `~` meaning the target user's home.
    pub fn checkout_root_for(&self, user: &TargetUser) -> PathBuf {
        user.expand_path(&self.checkout_root)
    }

    pub fn dotfiles_destination_for(&self, user: &TargetUser) -> PathBuf {
        match &self.dotfiles.destination {
            Some(dest) => user.expand_path(dest),
            None => user.home.clone(),
        }
    }

    /// Build command for a source checkout.
    pub fn build_invocation(&self, user: &TargetUser) -> Result<Invocation> {
        let identity = match self.source_build.build_as {
            BuildIdentity::User => Identity::User(user.clone()),
            BuildIdentity::Root => Identity::Root,
        };
        let inv = Invocation::from_command_line(&self.source_build.build)
            .with_context(|| format!("invalid build command '{}'", self.source_build.build))?;
        Ok(inv.identity(identity))
    }

    /// Install command for a source checkout; always root.
    pub fn install_invocation(&self) -> Result<Invocation> {
        Invocation::from_command_line(&self.source_build.install)
            .with_context(|| format!("invalid install command '{}'", self.source_build.install))
    }
}

/// Icons used in provisioning output.
///
/// Requires a nerd font in the terminal; JSON output carries them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NerdFont {
    // Status and feedback
    Check,
    Cross,
    Warning,
    Info,
    Skip,

    // Sources
    Package,
    Archive,
    GitBranch,
    Python,
    Folder,
    Download,
    Sync,

    // System
    Terminal,
    Shield,
    Rocket,
}

impl NerdFont {
    pub fn unicode(&self) -> char {
        match self {
            Self::Check => '\u{f00c}',     // fa-check
            Self::Cross => '\u{f00d}',     // fa-times
            Self::Warning => '\u{f071}',   // fa-exclamation-triangle
            Self::Info => '\u{f129}',      // fa-info
            Self::Skip => '\u{f051}',      // fa-step-forward
            Self::Package => '\u{f487}',   // oct-package
            Self::Archive => '\u{f187}',   // fa-archive
            Self::GitBranch => '\u{e725}', // dev-git_branch
            Self::Python => '\u{e73c}',    // dev-python
            Self::Folder => '\u{f07b}',    // fa-folder
            Self::Download => '\u{f019}',  // fa-download
            Self::Sync => '\u{f021}',      // fa-refresh
            Self::Terminal => '\u{f120}',  // fa-terminal
            Self::Shield => '\u{f132}',    // fa-shield
            Self::Rocket => '\u{f135}',    // fa-rocket
        }
    }
}

impl std::fmt::Display for NerdFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.unicode())
    }
}

impl From<NerdFont> for char {
    fn from(icon: NerdFont) -> Self {
        icon.unicode()
    }
}

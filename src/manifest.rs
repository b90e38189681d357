//! The package manifest: `tag,identifier,note` lines in installation order.

use std::fmt;
use std::path::Path;

use crate::error::ProvisionError;
use crate::ui::prelude::*;

/// Which strategy installs an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Repository,
    Foreign,
    SourceBuild,
    LanguagePackage,
}

impl Tag {
    /// Map a manifest marker to a tag. Anything unrecognized installs from the
    /// native repositories.
    pub fn from_marker(marker: &str) -> Tag {
        match marker {
            "A" => Tag::Foreign,
            "G" => Tag::SourceBuild,
            "P" => Tag::LanguagePackage,
            _ => Tag::Repository,
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Tag::Repository => "",
            Tag::Foreign => "A",
            Tag::SourceBuild => "G",
            Tag::LanguagePackage => "P",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tag::Repository => "repository",
            Tag::Foreign => "aur",
            Tag::SourceBuild => "source",
            Tag::LanguagePackage => "pip",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub tag: Tag,
    /// Package name, or a repository URL for source builds.
    pub identifier: String,
    pub note: String,
}

impl ManifestEntry {
    pub fn new(tag: Tag, identifier: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            tag,
            identifier: identifier.into(),
            note: note.into(),
        }
    }
}

/// Remove one pair of wrapping double quotes.
fn unquote(note: &str) -> &str {
    note.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(note)
}

fn parse_line(line: &str) -> Option<ManifestEntry> {
    let mut fields = line.splitn(3, ',');
    let tag = Tag::from_marker(fields.next().unwrap_or_default().trim());
    let identifier = fields.next().unwrap_or_default().trim();
    let note = fields.next().unwrap_or_default();

    if identifier.is_empty() {
        return None;
    }

    Some(ManifestEntry::new(tag, identifier, unquote(note)))
}

/// Parse manifest text. Comment (`#`) and blank lines are dropped; lines
/// without an identifier are skipped with a warning.
pub fn parse(content: &str) -> Vec<ManifestEntry> {
    let mut entries = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(entry) => entries.push(entry),
            None => emit(
                Level::Warn,
                "manifest.line.skipped",
                &format!(
                    "{} Skipping manifest line {}: no package given",
                    char::from(NerdFont::Warning),
                    index + 1
                ),
                Some(serde_json::json!({ "line": index + 1, "content": line })),
            ),
        }
    }
    entries
}

fn fetch(url: &str) -> Result<String, String> {
    let response = reqwest::blocking::get(url).map_err(|e| e.to_string())?;
    let response = response.error_for_status().map_err(|e| e.to_string())?;
    response.text().map_err(|e| e.to_string())
}

/// Read the manifest from a local file, or fetch it when `source` is not one.
pub fn load(source: &str) -> Result<Vec<ManifestEntry>, ProvisionError> {
    let path = Path::new(source);
    let content = if path.is_file() {
        emit(
            Level::Debug,
            "manifest.load.local",
            &format!("Reading manifest from {}", path.display()),
            None,
        );
        std::fs::read_to_string(path).map_err(|e| ProvisionError::ManifestUnavailable {
            location: source.to_string(),
            reason: e.to_string(),
        })?
    } else {
        emit(
            Level::Info,
            "manifest.load.remote",
            &format!("{} Fetching manifest {}", char::from(NerdFont::Download), source),
            None,
        );
        fetch(source).map_err(|reason| ProvisionError::ManifestUnavailable {
            location: source.to_string(),
            reason,
        })?
    };

    Ok(parse(&content))
}

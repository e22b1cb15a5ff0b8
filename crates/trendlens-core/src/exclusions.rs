use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

/// Platform boilerplate tags that say nothing about the content itself.
pub const DEFAULT_EXCLUDED_HASHTAGS: &[&str] = &[
    "fyp",
    "fy",
    "fypage",
    "fypシ",
    "foryou",
    "foryoupage",
    "viral",
    "viralvideo",
    "goviral",
    "trending",
    "trend",
    "tiktok",
    "tiktokviral",
    "explore",
    "explorepage",
    "xyzbca",
    "capcut",
    "duet",
    "stitch",
    "parati",
];

/// Predicate used by the hashtag miners to drop generic tags.
pub trait HashtagExclusions {
    /// `tag` is already normalized (see [`normalize_hashtag`]).
    fn is_excluded(&self, tag: &str) -> bool;
}

impl<F> HashtagExclusions for F
where
    F: Fn(&str) -> bool,
{
    fn is_excluded(&self, tag: &str) -> bool {
        self(tag)
    }
}

/// Lowercase, trim, and strip any leading `#` characters.
#[must_use]
pub fn normalize_hashtag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').trim().to_lowercase()
}

/// Set-backed exclusion list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionList {
    tags: HashSet<String>,
}

impl Default for ExclusionList {
    fn default() -> Self {
        Self::from_tags(DEFAULT_EXCLUDED_HASHTAGS.iter().copied())
    }
}

impl ExclusionList {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tags: HashSet::new(),
        }
    }

    pub fn from_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            tags: tags
                .into_iter()
                .map(normalize_hashtag)
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl HashtagExclusions for ExclusionList {
    fn is_excluded(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

#[derive(Debug, Deserialize)]
pub struct ExclusionsFile {
    #[serde(default = "default_extend")]
    pub extend_defaults: bool,
    #[serde(default)]
    pub excluded_hashtags: Vec<String>,
}

fn default_extend() -> bool {
    true
}

/// Load an exclusion list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or contains
/// empty entries.
pub fn load_exclusions(path: &Path) -> Result<ExclusionList, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::ExclusionsFileIo {
            path: path.display().to_string(),
            source: e,
        })?;

    parse_exclusions(&content)
}

/// Parse exclusion-list YAML.
///
/// # Errors
///
/// Returns `ConfigError` on malformed YAML or empty entries.
pub fn parse_exclusions(content: &str) -> Result<ExclusionList, ConfigError> {
    let file: ExclusionsFile =
        serde_yaml::from_str(content).map_err(ConfigError::ExclusionsFileParse)?;

    validate_exclusions(&file)?;

    let mut list = if file.extend_defaults {
        ExclusionList::default()
    } else {
        ExclusionList::empty()
    };
    list.tags
        .extend(file.excluded_hashtags.iter().map(|t| normalize_hashtag(t)));
    Ok(list)
}

fn validate_exclusions(file: &ExclusionsFile) -> Result<(), ConfigError> {
    if let Some(pos) = file
        .excluded_hashtags
        .iter()
        .position(|t| normalize_hashtag(t).is_empty())
    {
        return Err(ConfigError::Validation(format!(
            "excluded_hashtags[{pos}] is empty"
        )));
    }
    Ok(())
}

//! Raw and analyzed short-form video records.
//!
//! Upstream payloads are loosely typed: counts may arrive as integers, floats,
//! numeric strings, `null`, or not at all. Decoding never fails on a bad count;
//! it degrades to [`MISSING_STAT_DEFAULT`] so one corrupt record turns into
//! zero-engagement data instead of failing the batch.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Value used for any count that is missing, `null`, non-numeric, or negative.
pub const MISSING_STAT_DEFAULT: u64 = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStats {
    #[serde(default, deserialize_with = "lenient_count")]
    pub play_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub comment_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub share_count: u64,
}

impl VideoStats {
    /// Likes + comments + shares.
    #[must_use]
    pub fn interactions(&self) -> u64 {
        self.like_count
            .saturating_add(self.comment_count)
            .saturating_add(self.share_count)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
}

/// A video as returned by the video-source collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVideo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_author")]
    pub author: Author,
    #[serde(default, deserialize_with = "lenient_stats")]
    pub stats: VideoStats,
    #[serde(default, deserialize_with = "lenient_hashtags")]
    pub hashtags: Vec<String>,
    /// Cover image URL. Dropped before analysis; never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// A [`RawVideo`] plus the metrics derived from it.
///
/// `rank` is view-only: it is reassigned every time a stored result is loaded
/// and must not be trusted from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedVideo {
    #[serde(flatten)]
    pub video: RawVideo,
    #[serde(default)]
    pub engagement_rate: f64,
    #[serde(default)]
    pub like_to_view_ratio: f64,
    #[serde(default)]
    pub rank: usize,
}

fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(f) = n.as_f64() {
                float_to_count(f)
            } else {
                MISSING_STAT_DEFAULT
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<u64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(float_to_count))
                .unwrap_or(MISSING_STAT_DEFAULT)
        }
        _ => MISSING_STAT_DEFAULT,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_to_count(f: f64) -> u64 {
    if f.is_finite() && f > 0.0 {
        f.trunc() as u64
    } else {
        MISSING_STAT_DEFAULT
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_count(&value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_author<'de, D>(deserializer: D) -> Result<Author, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_stats<'de, D>(deserializer: D) -> Result<VideoStats, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Accepts `["a", "b"]` as well as `[{"name": "a"}, {"title": "b"}]`.
fn lenient_hashtags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Object(map) => map
                .get("name")
                .or_else(|| map.get("title"))
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
            _ => None,
        })
        .filter(|tag| !tag.trim().is_empty())
        .collect())
}

/// Playlist domain types
use crate::media::infer_media_type;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

/// Identifier of the built-in "no active campaign" creative
pub const FALLBACK_CREATIVE_ID: &str = "fallback";

/// Display time of the built-in placeholder, in seconds
pub const FALLBACK_DURATION_SECS: u64 = 10;

const FALLBACK_URL: &str = "builtin://no-active-campaign";

/// Kind of media a creative carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Still image
    Image,
    /// Video clip
    Video,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Image => write!(f, "image"),
            MediaType::Video => write!(f, "video"),
        }
    }
}

/// A single creative scheduled on a screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeRef {
    /// Creative identifier, also the cache key
    pub creative_id: String,

    /// Media type; `None` until inferred when the server omits it
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_media_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub media_type: Option<MediaType>,

    /// Remote media URL
    pub url: String,

    /// Display time in seconds; fractional values from the server are rounded up
    #[serde(deserialize_with = "deserialize_duration")]
    pub duration: u64,

    /// Validated local copy, once materialized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl CreativeRef {
    /// Create a creative with no media type and no local copy
    pub fn new(creative_id: impl Into<String>, url: impl Into<String>, duration: u64) -> Self {
        Self {
            creative_id: creative_id.into(),
            media_type: None,
            url: url.into(),
            duration,
            local_path: None,
        }
    }

    /// Builder-style media type override
    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    /// The built-in placeholder shown when no campaign is active
    pub fn placeholder() -> Self {
        Self {
            creative_id: FALLBACK_CREATIVE_ID.to_string(),
            media_type: Some(MediaType::Image),
            url: FALLBACK_URL.to_string(),
            duration: FALLBACK_DURATION_SECS,
            local_path: None,
        }
    }

    /// Whether this is the built-in placeholder
    pub fn is_placeholder(&self) -> bool {
        self.creative_id == FALLBACK_CREATIVE_ID && self.url == FALLBACK_URL
    }

    /// Fill in a missing media type from the URL extension.
    pub fn resolve_media_type(&mut self) -> MediaType {
        *self
            .media_type
            .get_or_insert_with(|| infer_media_type(&self.url))
    }
}

/// Ordered sequence of creatives assigned to one screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Screen the playlist belongs to
    #[serde(default)]
    pub screen_id: String,

    /// Region of the screen
    #[serde(default)]
    pub region: Option<String>,

    /// City of the screen
    #[serde(default)]
    pub city: Option<String>,

    /// Opaque revision token used for conditional fetch
    #[serde(default)]
    pub config_hash: Option<String>,

    /// Creatives in display order. Malformed entries are dropped on parse.
    #[serde(rename = "playlist", default, deserialize_with = "deserialize_items")]
    pub items: Vec<CreativeRef>,
}

impl Playlist {
    /// Single-item playlist holding the placeholder creative
    pub fn fallback() -> Self {
        Self {
            screen_id: String::new(),
            region: None,
            city: None,
            config_hash: None,
            items: vec![CreativeRef::placeholder()],
        }
    }

    /// Whether this playlist is the built-in fallback
    pub fn is_fallback(&self) -> bool {
        self.items.len() == 1 && self.items[0].is_placeholder()
    }

    /// Infer media types for every creative that arrived without one
    pub fn resolve_media_types(&mut self) {
        for item in &mut self.items {
            item.resolve_media_type();
        }
    }

    /// Look up a creative by id
    pub fn find(&self, creative_id: &str) -> Option<&CreativeRef> {
        self.items.iter().find(|c| c.creative_id == creative_id)
    }

    /// Total display time of one pass, in seconds
    pub fn total_duration(&self) -> u64 {
        self.items.iter().map(|c| c.duration).sum()
    }
}

/// Accept `"image"`, `"video"`, an empty string, `null` or anything unknown.
///
/// Unknown values become `None` so the URL extension decides later.
fn deserialize_media_type<'de, D>(deserializer: D) -> Result<Option<MediaType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(match raw.as_deref().map(str::trim) {
        Some(s) if s.eq_ignore_ascii_case("image") => Some(MediaType::Image),
        Some(s) if s.eq_ignore_ascii_case("video") => Some(MediaType::Video),
        _ => None,
    })
}

/// Accept whole or fractional seconds, as a number or a numeric string.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDuration {
        Whole(u64),
        Fractional(f64),
        Text(String),
    }

    let secs = match RawDuration::deserialize(deserializer)? {
        RawDuration::Whole(secs) => return Ok(secs),
        RawDuration::Fractional(secs) => secs,
        RawDuration::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid duration {text:?}")))?,
    };

    if !secs.is_finite() || secs < 0.0 {
        return Err(D::Error::custom(format!("invalid duration {secs}")));
    }
    Ok(secs.ceil() as u64)
}

/// Parse creatives one at a time so a single bad entry does not cost the
/// whole playlist.
fn deserialize_items<'de, D>(deserializer: D) -> Result<Vec<CreativeRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(creative) => Some(creative),
            Err(e) => {
                warn!(index, error = %e, "Dropping malformed creative");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_playlist() {
        let json = r#"{
            "screen_id": "screen-1",
            "region": "north",
            "city": "Oslo",
            "config_hash": "abc123",
            "playlist": [
                {"creative_id": "c1", "type": "video", "url": "https://cdn/a.mp4", "duration": 15},
                {"creative_id": "c2", "type": "", "url": "https://cdn/b.mp4", "duration": 5},
                {"creative_id": "c3", "url": "https://cdn/c.png", "duration": 8}
            ]
        }"#;

        let mut playlist: Playlist = serde_json::from_str(json).unwrap();
        assert_eq!(playlist.items.len(), 3);
        assert_eq!(playlist.items[0].media_type, Some(MediaType::Video));
        assert_eq!(playlist.items[1].media_type, None);
        assert_eq!(playlist.items[2].media_type, None);

        playlist.resolve_media_types();
        assert_eq!(playlist.items[1].media_type, Some(MediaType::Video));
        assert_eq!(playlist.items[2].media_type, Some(MediaType::Image));
        assert_eq!(playlist.total_duration(), 28);
    }

    #[test]
    fn test_fractional_durations_round_up() {
        let json = r#"{
            "config_hash": "h2",
            "playlist": [
                {"creative_id": "c1", "url": "https://cdn/a.png", "duration": 5},
                {"creative_id": "c2", "url": "https://cdn/b.mp4", "duration": 7.5},
                {"creative_id": "c3", "url": "https://cdn/c.png", "duration": "4"}
            ]
        }"#;

        let playlist: Playlist = serde_json::from_str(json).unwrap();
        let durations: Vec<u64> = playlist.items.iter().map(|c| c.duration).collect();
        assert_eq!(durations, vec![5, 8, 4]);
    }

    #[test]
    fn test_malformed_creatives_are_dropped() {
        let json = r#"{
            "config_hash": "h3",
            "playlist": [
                {"creative_id": "ok-1", "url": "https://cdn/a.png", "duration": 5},
                {"creative_id": "no-duration", "url": "https://cdn/b.png"},
                {"creative_id": "negative", "url": "https://cdn/c.png", "duration": -3},
                {"url": "https://cdn/d.png", "duration": 5},
                "not an object",
                {"creative_id": "ok-2", "url": "https://cdn/e.mp4", "duration": 2.25}
            ]
        }"#;

        let playlist: Playlist = serde_json::from_str(json).unwrap();
        let ids: Vec<&str> = playlist.items.iter().map(|c| c.creative_id.as_str()).collect();
        assert_eq!(ids, vec!["ok-1", "ok-2"]);
        assert_eq!(playlist.items[1].duration, 3);
        assert_eq!(playlist.config_hash.as_deref(), Some("h3"));
    }

    #[test]
    fn test_null_or_missing_items_parse_as_empty() {
        let null_items: Playlist = serde_json::from_str(r#"{"playlist": null}"#).unwrap();
        assert!(null_items.items.is_empty());

        let missing: Playlist = serde_json::from_str(r#"{"screen_id": "s"}"#).unwrap();
        assert!(missing.items.is_empty());
    }

    #[test]
    fn test_explicit_type_wins_over_extension() {
        let mut creative =
            CreativeRef::new("c1", "https://cdn/a.mp4", 5).with_media_type(MediaType::Image);
        assert_eq!(creative.resolve_media_type(), MediaType::Image);
    }

    #[test]
    fn test_fallback_playlist() {
        let playlist = Playlist::fallback();
        assert!(playlist.is_fallback());
        assert_eq!(playlist.items[0].duration, FALLBACK_DURATION_SECS);
        assert!(playlist.items[0].is_placeholder());
    }

    #[test]
    fn test_local_path_round_trips_through_store_format() {
        let mut creative = CreativeRef::new("c1", "https://cdn/a.png", 5);
        creative.local_path = Some(PathBuf::from("/data/media/c1.png"));

        let json = serde_json::to_value(&creative).unwrap();
        assert_eq!(json["local_path"], "/data/media/c1.png");
        assert!(json.get("type").is_none());
    }
}

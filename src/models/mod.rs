//! Domain model types shared across the client core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One playlist entry, produced by the M3U parser.
///
/// The id is assigned sequentially during a parse pass (`channel_<n>`) and is
/// stable for the lifetime of that parse result. Channels are immutable once
/// emitted and replaced wholesale on every playlist refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub logo: Option<String>,
    pub staff_id: Option<String>,
    pub group_title: Option<String>,
    pub url: String,
    pub stream_props: StreamProperties,
}

/// Streaming/DRM properties carried by `#KODIPROP` playlist lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamProperties {
    pub manifest_type: Option<String>,
    pub license_type: Option<String>,
    pub license_key: Option<String>,
    pub stream_headers: Option<HashMap<String, String>>,
}

/// Clear-key license type identifier used by the playback surface.
pub const CLEARKEY_LICENSE_TYPE: &str = "org.w3.clearkey";

impl StreamProperties {
    /// Splits the `keyId:keyValue` license pair for clear-key DRM.
    ///
    /// A missing colon or missing value yields an empty key value rather than
    /// an error; the playback surface tolerates it the same way.
    pub fn clear_key_pair(&self) -> Option<(String, String)> {
        let raw = self.license_key.as_deref()?;
        let mut parts = raw.splitn(2, ':');
        let key_id = parts.next().unwrap_or_default().to_string();
        let key_value = parts.next().unwrap_or_default().to_string();
        Some((key_id, key_value))
    }
}

/// An ordered set of channels sharing one category label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelGroup {
    pub title: String,
    pub channels: Vec<Channel>,
}

/// Catch-all group label for channels with no declared category.
pub const OTHER_GROUP_TITLE: &str = "Other";

/// One scheduled program in the electronic program guide.
///
/// `duration_minutes` is redundant with start/end but trusted as given by
/// the feed, never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramEntry {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_minutes: i64,
}

/// Raw EPG representation consumed from the feed: channel id to ordered
/// program list.
pub type EpgData = HashMap<String, Vec<ProgramEntry>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Movie,
    #[serde(rename = "tv")]
    Series,
}

impl CatalogKind {
    /// Wire segment for this kind, as used by both the catalog site and the
    /// TMDB search endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Movie => "movie",
            CatalogKind::Series => "tv",
        }
    }
}

/// One movie or series entry from the remote catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: serde_json::Value,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CatalogKind,
    pub slug: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub seasons_count: Option<u32>,
}

impl CatalogItem {
    /// Opaque identifier as a string, regardless of whether the catalog
    /// serialized it as a number or a string.
    pub fn id_str(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// One episode of a catalog series, with its derived embed-page URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: serde_json::Value,
    pub number: u32,
    #[serde(default)]
    pub title: Option<String>,
    pub series_id: String,
    pub season_number: u32,
    pub iframe_url: String,
}

impl Episode {
    pub fn id_str(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A playable URL plus the header set required to fetch it, produced by the
/// catalog resolver. Normalized into a [`Channel`] by the playback module so
/// the playback surface has one uniform input type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlaybackTarget {
    pub url: String,
    pub headers: HashMap<String, String>,
}

/// Result of a load that may substitute placeholder data on failure.
///
/// Callers can distinguish real data from fallback instead of the
/// substitution being invisible.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    Fresh(T),
    Degraded { data: T, reason: String },
    Failed { reason: String },
}

impl<T> Loaded<T> {
    /// The carried data, if any (fresh or degraded).
    pub fn data(&self) -> Option<&T> {
        match self {
            Loaded::Fresh(data) | Loaded::Degraded { data, .. } => Some(data),
            Loaded::Failed { .. } => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Loaded::Fresh(data) | Loaded::Degraded { data, .. } => Some(data),
            Loaded::Failed { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Loaded::Degraded { .. })
    }
}

/// An authenticated user record, persisted through the credential store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_key_pair_splits_id_and_value() {
        let props = StreamProperties {
            license_key: Some("abc123:def456".to_string()),
            ..Default::default()
        };
        assert_eq!(
            props.clear_key_pair(),
            Some(("abc123".to_string(), "def456".to_string()))
        );
    }

    #[test]
    fn clear_key_pair_tolerates_missing_value() {
        let props = StreamProperties {
            license_key: Some("abc123".to_string()),
            ..Default::default()
        };
        assert_eq!(
            props.clear_key_pair(),
            Some(("abc123".to_string(), String::new()))
        );
    }

    #[test]
    fn clear_key_pair_absent_without_key_material() {
        assert_eq!(StreamProperties::default().clear_key_pair(), None);
    }

    #[test]
    fn catalog_item_id_str_handles_numeric_ids() {
        let item: CatalogItem = serde_json::from_value(serde_json::json!({
            "id": 5105,
            "name": "Some Movie",
            "type": "movie",
            "slug": "some-movie"
        }))
        .unwrap();
        assert_eq!(item.id_str(), "5105");
        assert_eq!(item.kind, CatalogKind::Movie);
    }
}

//! Playlist and EPG retrieval through the JSON API gateway.
//!
//! Network or parse failures never crash a load: the result is tagged
//! [`Loaded::Degraded`] and carries generated placeholder data so the
//! application stays interactive.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::errors::FetchError;
use crate::fetch::RemoteFetch;
use crate::models::{Channel, EpgData, Loaded, ProgramEntry, StreamProperties};
use crate::playlist::parse_m3u;

pub struct ApiClient {
    fetch: Arc<dyn RemoteFetch>,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(fetch: Arc<dyn RemoteFetch>, config: ApiConfig) -> Self {
        Self { fetch, config }
    }

    fn file_url(&self, path: &str) -> String {
        format!(
            "{}/api_json.php?path={}",
            self.config.base_url,
            urlencoding::encode(path)
        )
    }

    /// Raw playlist text from the gateway.
    pub async fn fetch_playlist(&self) -> Result<String, FetchError> {
        self.fetch
            .get_text(&self.file_url(&self.config.playlist_path), &[])
            .await
    }

    /// EPG document from the gateway: channel id to program list.
    pub async fn fetch_epg(&self) -> Result<EpgData, FetchError> {
        let url = self.file_url(&self.config.epg_path);
        let value = self.fetch.get_json(&url, &[]).await?;
        serde_json::from_value(value).map_err(|e| FetchError::decode(&url, e.to_string()))
    }

    /// Fetches and parses the playlist, substituting placeholder channels
    /// when the fetch fails, the content is empty or nothing parses.
    pub async fn load_channels(&self) -> Loaded<Vec<Channel>> {
        match self.fetch_playlist().await {
            Ok(content) if !content.trim().is_empty() => {
                let channels = parse_m3u(&content);
                if channels.is_empty() {
                    warn!("No channels parsed from playlist, using placeholder channels");
                    Loaded::Degraded {
                        data: mock_channels(),
                        reason: "playlist parsed to zero channels".to_string(),
                    }
                } else {
                    info!("Parsed {} channels from playlist", channels.len());
                    Loaded::Fresh(channels)
                }
            }
            Ok(_) => {
                warn!("Empty playlist received, using placeholder channels");
                Loaded::Degraded {
                    data: mock_channels(),
                    reason: "empty playlist".to_string(),
                }
            }
            Err(e) => {
                warn!("Playlist fetch failed: {}, using placeholder channels", e);
                Loaded::Degraded {
                    data: mock_channels(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Fetches the EPG, substituting a generated placeholder guide when the
    /// fetch or decode fails.
    pub async fn load_epg(&self) -> Loaded<EpgData> {
        match self.fetch_epg().await {
            Ok(data) => {
                info!("Loaded EPG for {} channels", data.len());
                Loaded::Fresh(data)
            }
            Err(e) => {
                warn!("EPG fetch failed: {}, using placeholder guide", e);
                Loaded::Degraded {
                    data: mock_epg(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Placeholder channel set used when the playlist is unavailable.
pub fn mock_channels() -> Vec<Channel> {
    let entries = [
        ("channel_1", "Rai 1", "RAI", "Nazionali"),
        ("channel_2", "Canale 5", "MEDIASET", "Nazionali"),
        ("channel_3", "Sky Sport", "SKY", "Sport"),
        ("channel_4", "DAZN 1", "DAZN", "Sport"),
        ("channel_5", "Sky Cinema", "SKY", "Film"),
    ];

    entries
        .iter()
        .enumerate()
        .map(|(i, (id, title, staff, group))| Channel {
            id: id.to_string(),
            title: title.to_string(),
            logo: Some("https://via.placeholder.com/150".to_string()),
            staff_id: Some(staff.to_string()),
            group_title: Some(group.to_string()),
            url: format!("https://example.com/stream{}.mpd", i + 1),
            stream_props: StreamProperties {
                manifest_type: Some("mpd".to_string()),
                license_type: Some(crate::models::CLEARKEY_LICENSE_TYPE.to_string()),
                license_key: Some(format!("key{}", i + 1)),
                stream_headers: Some(HashMap::from([(
                    "user-agent".to_string(),
                    "ExampleAgent".to_string(),
                )])),
            },
        })
        .collect()
}

/// Placeholder guide: hourly programs for the next 24 hours on the first
/// three placeholder channels.
pub fn mock_epg() -> EpgData {
    let now = Utc::now();
    let mut data: EpgData = HashMap::new();

    for channel_id in ["channel_1", "channel_2", "channel_3"] {
        let programs = (0..24)
            .map(|i| {
                let start = now + Duration::hours(i);
                ProgramEntry {
                    id: format!("{channel_id}_program_{i}"),
                    channel_id: channel_id.to_string(),
                    title: format!("Programma {}", i + 1),
                    description: Some(format!("Descrizione del programma {}", i + 1)),
                    start_time: start,
                    end_time: start + Duration::hours(1),
                    duration_minutes: 60,
                }
            })
            .collect();
        data.insert(channel_id.to_string(), programs);
    }

    data
}

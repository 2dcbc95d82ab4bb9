//! Remote movie/series catalog client.
//!
//! Talks to the third-party catalog site: configuration bootstrap, free-text
//! search, season/episode listing and genre browsing. Stream URL resolution
//! lives in [`resolver`].

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::CatalogSettings;
use crate::errors::FetchError;
use crate::fetch::RemoteFetch;
use crate::models::{CatalogItem, CatalogKind, Episode};

pub mod literal;
pub mod resolver;

/// Browser user agent presented on every catalog request.
pub const CATALOG_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Fixed cross-site request token the catalog expects on API calls.
pub const CATALOG_XSRF_TOKEN: &str = "eyJpdiI6IkVDK2VZUFVFUVhjTjFxeFhxQnVBZ0E9PSIsInZhbHVlIjoiZzQzWlhBQzdWM1Z6ZnJyOFl4MzdLMHJod0hKWEFFR3BPUUVhN0VXdkwzSWs1L0dNbkhRR1ZzUE5nSmJaRUdaeG45TjhlbTIvZWdsTEVSQ0FJYXRlejBZdHR4Y2ZoL0FmWldsNE1DL1NzSjlwaHMySWxuRTVKVHNGeWo5U1pEa3QiLCJtYWMiOiI5NjY1ZGUwZjhmYzJhYmFhMzA0YjA1Njg3NjAyNjcxZTNhZjAxMDk4YWEzNTY4ZWU2ZTMyOTYxMWU0ZGRkOWYzIiwidGFnIjoiIn0=";

/// Items per page served by the catalog archive endpoint.
const ARCHIVE_PAGE_SIZE: u32 = 60;

/// API key for TMDB metadata lookups.
const TMDB_API_KEY: &str = "ded5b7afc33c6be7e0eaefce452217b1";

/// Category labels offered by the browse surface, each mapped to the site
/// genre ids it covers. Order is the menu order.
pub const GENRE_CATEGORIES: &[(&str, &[u32])] = &[
    ("Animazione", &[19]),
    ("Azione", &[4, 13]),
    ("Avventura", &[11]),
    ("Commedia", &[12]),
    ("Fantascienza", &[10, 3]),
    ("Guerra", &[9, 17]),
    ("Horror", &[7]),
    ("Dramma", &[1]),
    ("Family", &[16, 25]),
    ("Crime", &[2]),
    ("Story", &[22]),
    ("Mistery", &[6]),
    ("Romance", &[15]),
    ("Thriller", &[5]),
    ("Western", &[20]),
];

/// Genre ids behind one category label.
pub fn genre_ids(category: &str) -> Option<&'static [u32]> {
    GENRE_CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, ids)| *ids)
}

/// Artwork and synopsis fields taken from the first TMDB search result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TmdbTitleInfo {
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

/// Catalog endpoint configuration, produced once at startup and threaded
/// into [`CatalogClient::new`]. No module-level mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub domain: String,
    pub inertia_version: String,
}

impl CatalogConfig {
    /// Configuration from compiled-in defaults, without touching the network.
    pub fn defaults(settings: &CatalogSettings) -> Self {
        Self {
            domain: settings.default_domain.clone(),
            inertia_version: settings.default_inertia_version.clone(),
        }
    }

    /// Fetches the current domain and protocol version from the repository
    /// endpoint. Each value is retrieved independently; a failure leaves the
    /// configured default in place rather than blocking initialization.
    pub async fn bootstrap(fetch: &dyn RemoteFetch, settings: &CatalogSettings) -> Self {
        let mut config = Self::defaults(settings);

        let domain_url = format!("{}/domain.txt", settings.repository_url);
        match fetch.get_text(&domain_url, &[]).await {
            Ok(text) if !text.trim().is_empty() => {
                config.domain = text.trim().to_string();
                info!("Retrieved catalog domain: {}", config.domain);
            }
            Ok(_) => warn!("Empty catalog domain from repository, keeping default"),
            Err(e) => warn!("Failed to get catalog domain from repository: {}", e),
        }

        let inertia_url = format!("{}/inertia.txt", settings.repository_url);
        match fetch.get_text(&inertia_url, &[]).await {
            Ok(text) if !text.trim().is_empty() => {
                config.inertia_version = text.trim().to_string();
                info!("Retrieved catalog protocol version: {}", config.inertia_version);
            }
            Ok(_) => warn!("Empty catalog protocol version, keeping default"),
            Err(e) => warn!("Failed to get catalog protocol version: {}", e),
        }

        config
    }

    pub fn base_url(&self) -> String {
        format!("https://{}/", self.domain)
    }
}

pub struct CatalogClient {
    fetch: Arc<dyn RemoteFetch>,
    config: CatalogConfig,
}

impl CatalogClient {
    pub fn new(fetch: Arc<dyn RemoteFetch>, config: CatalogConfig) -> Self {
        Self { fetch, config }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Descriptor headers attached to catalog page and API requests.
    fn base_headers(&self) -> Vec<(String, String)> {
        vec![
            ("User-Agent".to_string(), CATALOG_USER_AGENT.to_string()),
            ("X-Xsrf-Token".to_string(), CATALOG_XSRF_TOKEN.to_string()),
        ]
    }

    /// Header set for season-page requests served through the Inertia
    /// protocol, which returns structured JSON instead of HTML.
    fn inertia_headers(&self) -> Vec<(String, String)> {
        vec![
            ("Accept".to_string(), "text/html, application/xhtml+xml".to_string()),
            (
                "Accept-Language".to_string(),
                "it-IT,it;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Dnt".to_string(), "1".to_string()),
            ("Referer".to_string(), self.config.base_url()),
            ("User-Agent".to_string(), CATALOG_USER_AGENT.to_string()),
            ("X-Inertia".to_string(), "true".to_string()),
            (
                "X-Inertia-Version".to_string(),
                self.config.inertia_version.clone(),
            ),
            ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
            ("X-Xsrf-Token".to_string(), CATALOG_XSRF_TOKEN.to_string()),
        ]
    }

    /// Free-text search, filtered to one item kind.
    ///
    /// The search endpoint returns movies and series mixed; entries that do
    /// not deserialize (unknown kinds, missing fields) are skipped.
    pub async fn search(
        &self,
        query: &str,
        kind: CatalogKind,
    ) -> Result<Vec<CatalogItem>, FetchError> {
        let url = format!(
            "{}api/search?q={}",
            self.config.base_url(),
            urlencoding::encode(query)
        );
        let response = self.fetch.get_json(&url, &self.base_headers()).await?;

        let items = response
            .get("data")
            .and_then(|d| d.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value::<CatalogItem>(entry.clone()).ok())
                    .filter(|item| item.kind == kind)
                    .collect()
            })
            .unwrap_or_default();

        Ok(items)
    }

    /// Archive browse: movies for one genre, paginated.
    pub async fn browse_movies(
        &self,
        genre: u32,
        page: u32,
    ) -> Result<Vec<CatalogItem>, FetchError> {
        let offset = page.saturating_sub(1) * ARCHIVE_PAGE_SIZE;
        let url = format!(
            "{}api/archive?offset={}&type=movie&genre[]={}",
            self.config.base_url(),
            offset,
            genre
        );
        let response = self.fetch.get_json(&url, &self.base_headers()).await?;

        let items = response
            .get("titles")
            .and_then(|t| t.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value::<CatalogItem>(entry.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(items)
    }

    /// Archive browse by category label; the category's primary genre id
    /// drives the archive query. An unknown label browses nothing.
    pub async fn browse_category(
        &self,
        category: &str,
        page: u32,
    ) -> Result<Vec<CatalogItem>, FetchError> {
        match genre_ids(category).and_then(|ids| ids.first().copied()) {
            Some(genre) => self.browse_movies(genre, page).await,
            None => Ok(Vec::new()),
        }
    }

    /// TMDB metadata for a title, used to decorate search and browse results
    /// with artwork and a synopsis.
    ///
    /// Lookup failures and empty result sets both yield `None`; the metadata
    /// is decoration, never load-bearing.
    pub async fn tmdb_info(&self, title: &str, kind: CatalogKind) -> Option<TmdbTitleInfo> {
        let url = format!(
            "https://api.themoviedb.org/3/search/{}?api_key={}&language=it-IT&query={}",
            kind.as_str(),
            TMDB_API_KEY,
            urlencoding::encode(title)
        );

        let response = match self.fetch.get_json(&url, &[]).await {
            Ok(response) => response,
            Err(e) => {
                warn!("TMDB lookup failed for '{}': {}", title, e);
                return None;
            }
        };

        response
            .get("results")
            .and_then(|r| r.as_array())
            .and_then(|results| results.first())
            .and_then(|first| serde_json::from_value(first.clone()).ok())
    }

    /// Overwrites an item's artwork and overview with TMDB metadata, when
    /// the lookup finds a match.
    pub async fn enrich_item(&self, item: &mut CatalogItem) {
        if let Some(info) = self.tmdb_info(&item.name, item.kind).await {
            item.poster_path = info.poster_path;
            item.backdrop_path = info.backdrop_path;
            item.overview = info.overview;
        }
    }

    /// Number of seasons for a series, 0 when the preview carries none.
    pub async fn season_count(&self, series_id: &str) -> Result<u32, FetchError> {
        let url = format!("{}api/titles/preview/{}", self.config.base_url(), series_id);
        let response = self.fetch.post_json(&url, &self.base_headers()).await?;

        Ok(response
            .get("seasons_count")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32)
    }

    /// Episode list for one season, requested through the season page.
    ///
    /// `season_index` is 0-based; the site's season pages are 1-based.
    pub async fn episodes(
        &self,
        series_id: &str,
        slug: &str,
        season_index: u32,
    ) -> Result<Vec<Episode>, FetchError> {
        let base = self.config.base_url();
        let url = format!("{}titles/{}/stagione-{}", base, slug, season_index + 1);
        let response = self.fetch.get_json(&url, &self.inertia_headers()).await?;

        let episodes = response
            .pointer("/props/loadedSeason/episodes")
            .and_then(|e| e.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| self.episode_from_json(entry, series_id, season_index + 1))
                    .collect()
            })
            .unwrap_or_default();

        Ok(episodes)
    }

    fn episode_from_json(
        &self,
        entry: &serde_json::Value,
        series_id: &str,
        season_number: u32,
    ) -> Option<Episode> {
        let id = entry.get("id")?.clone();
        let number = entry.get("number").and_then(|n| n.as_u64())? as u32;
        let title = entry
            .get("name")
            .or_else(|| entry.get("title"))
            .and_then(|t| t.as_str())
            .map(str::to_string);

        let id_str = match &id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let iframe_url = format!(
            "{}iframe/{}?episode_id={}&next_episode=1",
            self.config.base_url(),
            series_id,
            id_str
        );

        Some(Episode {
            id,
            number,
            title,
            series_id: series_id.to_string(),
            season_number,
            iframe_url,
        })
    }
}

//! Stream URL resolution for catalog items.
//!
//! Two-hop extraction: the listing page embeds an iframe, the iframe page
//! inlines a script carrying the player state. From that state four
//! candidate playlist URLs are derived and probed in priority order.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use super::{CatalogClient, CATALOG_USER_AGENT, CATALOG_XSRF_TOKEN};
use crate::errors::ResolveError;
use crate::models::ResolvedPlaybackTarget;

/// Host serving the resolved playlists.
pub const PLAYER_HOST: &str = "https://vixcloud.co";

/// Player state extracted from the embed page's inline script.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedState {
    pub content_id: String,
    pub token: String,
    pub expires: String,
}

fn video_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"window\.video\s*=\s*(\{[^}]*\})").expect("static video pattern")
    })
}

fn params_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"params:\s*(\{[^}]*\})").expect("static params pattern"))
}

/// First inline frame source of a listing page.
pub fn extract_first_iframe_src(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("iframe").ok()?;
    document
        .select(&selector)
        .find_map(|element| element.value().attr("src"))
        .map(str::to_string)
}

/// Text of the first inline script of an embed page.
pub fn extract_first_script_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script").ok()?;
    let text: String = document.select(&selector).next()?.text().collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Extracts the player state from the embed script text.
///
/// Two fragments are pattern-matched: the object literal assigned to
/// `window.video` (carrying the content id) and the object literal of the
/// `params:` block (token and expiry). The params fragment uses single
/// quotes and may carry a trailing comma; both go through the lenient
/// object-literal decoder.
pub fn parse_embed_script(script: &str) -> Result<EmbedState, ResolveError> {
    let video_fragment = video_regex()
        .captures(script)
        .and_then(|caps| caps.get(1))
        .ok_or(ResolveError::MissingVideoObject)?;
    let params_fragment = params_regex()
        .captures(script)
        .and_then(|caps| caps.get(1))
        .ok_or(ResolveError::MissingParams)?;

    let video = super::literal::decode_object_literal(video_fragment.as_str())
        .map_err(|e| ResolveError::fragment(format!("video object: {e}")))?;
    let params = super::literal::decode_object_literal(params_fragment.as_str())
        .map_err(|e| ResolveError::fragment(format!("params block: {e}")))?;

    let content_id = scalar_field(&video, "id")
        .ok_or_else(|| ResolveError::fragment("video object has no id"))?;
    let token = scalar_field(&params, "token")
        .ok_or_else(|| ResolveError::fragment("params block has no token"))?;
    let expires = scalar_field(&params, "expires")
        .ok_or_else(|| ResolveError::fragment("params block has no expires"))?;

    Ok(EmbedState {
        content_id,
        token,
        expires,
    })
}

/// A scalar JSON field as a string, whether it was encoded as number or
/// string.
fn scalar_field(value: &serde_json::Value, field: &str) -> Option<String> {
    match value.get(field)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The four candidate playlist URLs, in probe priority order: the
/// cross-product of the `b=1` query flag and the trailing `h=1` suffix.
pub fn candidate_urls(state: &EmbedState) -> [String; 4] {
    let base = format!("{}/playlist/{}", PLAYER_HOST, state.content_id);
    let auth = format!("token={}&expires={}", state.token, state.expires);
    [
        format!("{base}?{auth}&h=1"),
        format!("{base}?b=1&{auth}&h=1"),
        format!("{base}?{auth}"),
        format!("{base}?b=1&{auth}"),
    ]
}

/// Header set required to fetch a resolved playlist URL.
pub fn playback_headers() -> HashMap<String, String> {
    HashMap::from([
        ("Referer".to_string(), format!("{PLAYER_HOST}/")),
        ("User-Agent".to_string(), CATALOG_USER_AGENT.to_string()),
    ])
}

impl CatalogClient {
    /// Resolves a playable URL for a movie.
    pub async fn resolve_movie(
        &self,
        movie_id: &str,
    ) -> Result<ResolvedPlaybackTarget, ResolveError> {
        let base = self.config().base_url();
        let listing_url = format!("{base}iframe/{movie_id}");
        let watch_url = format!("{base}watch/{movie_id}");
        self.resolve_from_listing(&listing_url, &watch_url).await
    }

    /// Resolves a playable URL for one episode of a series.
    pub async fn resolve_episode(
        &self,
        episode_id: &str,
        series_id: &str,
    ) -> Result<ResolvedPlaybackTarget, ResolveError> {
        let base = self.config().base_url();
        let listing_url = format!("{base}iframe/{series_id}?episode_id={episode_id}&next_episode=1");
        let watch_url = format!("{base}watch/{series_id}");
        self.resolve_from_listing(&listing_url, &watch_url).await
    }

    /// Two-hop extraction shared by the movie and episode paths.
    async fn resolve_from_listing(
        &self,
        listing_url: &str,
        watch_url: &str,
    ) -> Result<ResolvedPlaybackTarget, ResolveError> {
        debug!("Resolving catalog item via {}", listing_url);

        let mut headers = self.base_headers();
        headers.push(("Referer".to_string(), watch_url.to_string()));
        let listing_html = self.fetch.get_text(listing_url, &headers).await?;

        let embed_url =
            extract_first_iframe_src(&listing_html).ok_or(ResolveError::MissingIframe)?;
        debug!("Found embed URL: {}", embed_url);

        // Second hop carries the first hop as referer.
        let mut embed_headers = self.base_headers();
        embed_headers.push(("Referer".to_string(), listing_url.to_string()));
        let embed_html = self.fetch.get_text(&embed_url, &embed_headers).await?;

        let script = extract_first_script_text(&embed_html).ok_or(ResolveError::MissingScript)?;
        let state = parse_embed_script(&script)?;

        let url = self.probe_candidates(&state).await;
        Ok(ResolvedPlaybackTarget {
            url,
            headers: playback_headers(),
        })
    }

    /// Probes the candidates strictly in priority order and returns the
    /// first that answers. When every probe fails the top-priority candidate
    /// is returned anyway and the player surfaces the failure at play time.
    async fn probe_candidates(&self, state: &EmbedState) -> String {
        let candidates = candidate_urls(state);
        let probe_headers = vec![
            (
                "Referer".to_string(),
                format!("{}/embed/{}", PLAYER_HOST, state.content_id),
            ),
            ("User-Agent".to_string(), CATALOG_USER_AGENT.to_string()),
            ("X-Xsrf-Token".to_string(), CATALOG_XSRF_TOKEN.to_string()),
            (
                "X-Inertia-Version".to_string(),
                self.config().inertia_version.clone(),
            ),
        ];

        for candidate in &candidates {
            debug!("Probing candidate: {}", candidate);
            if self.fetch.head_ok(candidate, &probe_headers).await {
                info!("Resolved playback URL: {}", candidate);
                return candidate.clone();
            }
        }

        warn!("All candidate probes failed, falling back to first candidate");
        candidates[0].clone()
    }
}

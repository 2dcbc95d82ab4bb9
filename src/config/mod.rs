use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub catalog: CatalogSettings,
    pub refresh: RefreshConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// JSON API gateway serving playlist and EPG files
    pub base_url: String,
    /// Path of the M3U playlist behind the gateway
    pub playlist_path: String,
    /// Path of the EPG JSON document behind the gateway
    pub epg_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Endpoint serving the current catalog domain and protocol version
    pub repository_url: String,
    /// Fallback catalog domain used when the repository is unreachable
    pub default_domain: String,
    /// Fallback protocol version used when the repository is unreachable
    pub default_inertia_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between playlist+EPG refresh ticks
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout applied to every outbound fetch
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://monflix.de".to_string(),
                playlist_path: "playlist.m3u".to_string(),
                epg_path: "epg.json".to_string(),
            },
            catalog: CatalogSettings {
                repository_url: "https://repository.monflix.de".to_string(),
                default_domain: "streamingcommunity.family".to_string(),
                default_inertia_version: "6d3a7590e4575a0b17b82febe4ad8919".to_string(),
            },
            refresh: RefreshConfig { interval_secs: 60 },
            http: HttpConfig { timeout_secs: 15 },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(&config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(&config_file, contents)?;
            Ok(default_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.refresh.interval_secs, 60);
        assert_eq!(back.catalog.default_domain, "streamingcommunity.family");
        assert_eq!(back.http.timeout_secs, 15);
    }
}

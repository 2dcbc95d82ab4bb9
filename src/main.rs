use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use monflix_core::{
    api::ApiClient,
    catalog::{CatalogClient, CatalogConfig},
    config::Config,
    fetch::HttpFetcher,
    models::CatalogKind,
    playback,
    playlist::parse_m3u,
    refresh::{shared_state, RefreshService},
};

#[derive(Parser)]
#[command(name = "monflix-core")]
#[command(version = "0.1.0")]
#[command(about = "IPTV/VOD client core: playlists, EPG and catalog resolution")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the refresh service and keep the channel state current
    Run,
    /// Parse a local M3U file and print the category summary
    Parse { file: String },
    /// Search the remote catalog
    Search {
        query: String,
        /// Search series instead of movies
        #[arg(long)]
        series: bool,
    },
    /// Resolve a playable URL for a catalog item
    Resolve {
        id: String,
        /// Episode id, for series content
        #[arg(long)]
        episode: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("monflix_core={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MonFlix core v{}", env!("CARGO_PKG_VERSION"));

    std::env::set_var("CONFIG_FILE", &cli.config);
    let config = Config::load()?;
    info!("Configuration loaded from: {}", cli.config);

    let fetch = Arc::new(HttpFetcher::new(Duration::from_secs(
        config.http.timeout_secs,
    ))?);

    match cli.command {
        Command::Run => {
            let api = Arc::new(ApiClient::new(fetch.clone(), config.api.clone()));
            let state = shared_state();
            let (service, shutdown) = RefreshService::new(
                api,
                state.clone(),
                Duration::from_secs(config.refresh.interval_secs),
            );

            let refresh_task = tokio::spawn(service.run());

            tokio::signal::ctrl_c().await?;
            info!("Received shutdown signal");
            shutdown.shutdown();
            refresh_task.await?;

            let state = state.read().await;
            for group in &state.channel_groups {
                info!("{}: {} channels", group.title, group.channels.len());
            }
        }
        Command::Parse { file } => {
            let content = std::fs::read_to_string(&file)?;
            let channels = parse_m3u(&content);
            println!("Parsed {} channels", channels.len());
            for group in monflix_core::aggregate::group_channels(&channels) {
                println!("{}: {} channels", group.title, group.channels.len());
            }
        }
        Command::Search { query, series } => {
            let catalog_config = CatalogConfig::bootstrap(fetch.as_ref(), &config.catalog).await;
            let catalog = CatalogClient::new(fetch, catalog_config);
            let kind = if series {
                CatalogKind::Series
            } else {
                CatalogKind::Movie
            };

            let items = catalog.search(&query, kind).await?;
            if items.is_empty() {
                warn!("No results for '{}'", query);
            }
            for item in items {
                println!("{}  {}  ({})", item.id_str(), item.name, item.slug);
            }
        }
        Command::Resolve { id, episode } => {
            let catalog_config = CatalogConfig::bootstrap(fetch.as_ref(), &config.catalog).await;
            let catalog = CatalogClient::new(fetch, catalog_config);

            let target = match &episode {
                Some(episode_id) => catalog.resolve_episode(episode_id, &id).await?,
                None => catalog.resolve_movie(&id).await?,
            };
            let descriptor = playback::descriptor_for_resolved(&target, &id, &id);
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use pinfeed::app::{build_http_client, App, AppEvent, BrowserNavigator};
use pinfeed::config::Config;
use pinfeed::favicon::FaviconLoader;
use pinfeed::feed::PinboardSource;
use pinfeed::timeline::RefreshMode;
use pinfeed::ui;

/// Get the config file path (~/.config/pinfeed/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("pinfeed")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "pinfeed", about = "Terminal timeline for Pinboard bookmarks")]
struct Args {
    /// Pinboard user (overrides the config file)
    #[arg(long)]
    user: Option<String>,

    /// Path to the config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fetch the feeds one after the other or both at once (overrides the config file)
    #[arg(long, value_enum, value_name = "MODE")]
    refresh_mode: Option<RefreshMode>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; set RUST_LOG to see them.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?
        .with_env_secret(std::env::var("PINFEED_SECRET").ok());
    if let Some(user) = args.user {
        config.user = Some(user);
    }
    if let Some(mode) = args.refresh_mode {
        config.refresh_mode = mode;
    }
    tracing::debug!(config = ?config, "Effective configuration");

    let endpoints = match config.endpoints() {
        Ok(endpoints) => endpoints,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("Add your Pinboard user and feed secret to {}:", config_path.display());
            eprintln!("  user = \"yourname\"");
            eprintln!("  secret = \"...\"   # or export PINFEED_SECRET");
            std::process::exit(1);
        }
    };

    let client = build_http_client().context("Failed to create HTTP client")?;
    let timeline_source = Arc::new(PinboardSource::new(
        "timeline",
        endpoints.timeline,
        client.clone(),
    ));
    let bookmark_source = Arc::new(PinboardSource::new(
        "bookmarks",
        endpoints.bookmarks,
        client.clone(),
    ));
    let favicons = FaviconLoader::new(client, config.favicon_provider.clone());

    let mut app = App::new(
        timeline_source,
        bookmark_source,
        favicons,
        Box::new(BrowserNavigator),
    )
    .with_refresh_mode(config.refresh_mode)
    .with_banner_timeout(config.banner_timeout());

    // Channel for background task results
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_mode_flag() {
        let args = Args::try_parse_from(["pinfeed", "--refresh-mode", "concurrent"]).unwrap();
        assert_eq!(args.refresh_mode, Some(RefreshMode::Concurrent));

        let args = Args::try_parse_from(["pinfeed"]).unwrap();
        assert_eq!(args.refresh_mode, None);

        assert!(Args::try_parse_from(["pinfeed", "--refresh-mode", "parallel"]).is_err());
    }
}

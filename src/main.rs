mod app;
mod cache;
mod cart;
mod catalog;
mod commands;
mod config;
mod event;
mod logging;
mod query;
#[cfg(test)]
mod test_support;
mod ui;

use cache::{KeyValueStore, MemoryStore, NoopStore, ResourceCache, SqliteStore};
use catalog::{Catalog, HttpCatalogClient};
use clap::Parser;
use color_eyre::Result;
use config::CacheMode;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "raythu-admin")]
#[command(about = "A terminal admin console for the Raythu agri catalog")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/raythu-admin/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Backend base URL, overriding api.base_url
  #[arg(short, long)]
  base_url: Option<String>,

  /// Drop every cached list and exit
  #[arg(long)]
  clear_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override backend if specified on command line
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
    config.api.validated_base_url()?;
  }

  let _log_guard = logging::init(&config.log_level)?;
  info!(base_url = %config.api.base_url, cache = ?config.cache.mode, "Starting raythu-admin");

  let store: Arc<dyn KeyValueStore> = match config.cache.mode {
    CacheMode::Persistent => Arc::new(SqliteStore::open(&config.api.base_url)?),
    CacheMode::Memory => Arc::new(MemoryStore::new()),
    CacheMode::Disabled => Arc::new(NoopStore),
  };
  let client = HttpCatalogClient::new(&config)?;
  let catalog = Catalog::new(Arc::new(client), ResourceCache::new(store));

  if args.clear_cache {
    catalog.clear_cache()?;
    println!("Cache cleared");
    return Ok(());
  }

  // Initialize and run the app
  let ctx = app::AppContext::new(catalog, config.cart.vendor_number.clone());
  let mut app = app::App::new(ctx, config.display_title(), config.api.base_url.clone());
  app.run().await?;

  Ok(())
}

//! shelf-server binary.
//!
//! Reads `shelf.toml` (or the path specified with `--config`) plus `SHELF_*`
//! environment overrides, opens the SQLite store, initializes the registry
//! on first start, and serves the JSON API under `/api`.

mod settings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use shelf_core::store::LibraryStore as _;
use shelf_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, sync::broadcast::error::RecvError};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Shelf library registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "shelf.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path, server_cfg.fees)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  bootstrap(&store, &server_cfg).await?;
  spawn_event_logger(&store);

  let app = Router::new()
    .nest("/api", shelf_api::api_router(Arc::new(store)))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Initialize a fresh store from the configured owner. An initialized store
/// keeps its original owner whatever the configuration says.
async fn bootstrap(store: &SqliteStore, cfg: &ServerConfig) -> anyhow::Result<()> {
  if let Some(owner) = store.owner().await.context("failed to read registry owner")? {
    if owner.identity != cfg.owner_identity {
      warn!(
        owner = %owner.identity,
        configured = %cfg.owner_identity,
        "registry already initialized by a different owner; ignoring owner_identity"
      );
    }
    info!(owner = %owner.identity, "using existing registry");
    return Ok(());
  }

  store
    .initialize(cfg.owner_name.clone(), cfg.owner_identity.clone(), cfg.initial_funding)
    .await
    .context("failed to initialize registry")?;
  Ok(())
}

/// Mirror committed audit events into the log.
fn spawn_event_logger(store: &SqliteStore) {
  let mut feed = store.subscribe();
  tokio::spawn(async move {
    loop {
      match feed.recv().await {
        Ok(event) => debug!(
          seq = event.seq,
          book = %event.book_id,
          kind = %event.kind.event_type(),
          actor = %event.kind.actor(),
          "audit event"
        ),
        Err(RecvError::Lagged(n)) => warn!(skipped = n, "event logger fell behind"),
        Err(RecvError::Closed) => break,
      }
    }
  });
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

//! Runtime configuration.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use shelf_core::{fees::FeeSchedule, identity::Identity, ledger::Amount};

/// Prefix for environment overrides, e.g. `SHELF_PORT=9000` or
/// `SHELF_FEES__LISTING_FEE=0`.
pub const ENV_PREFIX: &str = "SHELF";

/// Runtime server configuration, deserialised from `shelf.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// Used only when the store has never been initialized.
  pub owner_name:      String,
  pub owner_identity:  Identity,
  #[serde(default)]
  pub initial_funding: Amount,
  #[serde(default)]
  pub fees:            FeeSchedule,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("shelf.db") }

impl ServerConfig {
  /// Layer the optional TOML file at `path` under `SHELF_*` environment
  /// variables.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_builder(
      Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
          Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
        ),
    )
  }

  fn from_builder(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
  ) -> Result<Self, ConfigError> {
    builder.build()?.try_deserialize()
  }
}

//! Layered settings: optional TOML file, then `PORTAL_*` environment
//! variables, then command-line flags.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
  pub base_url: String,
  #[serde(default)]
  pub token:    Option<String>,
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Default)]
pub struct Overrides {
  pub base_url: Option<String>,
  pub token:    Option<String>,
}

impl Settings {
  /// Load settings from `path` (missing is fine) and the environment, with
  /// `overrides` taking precedence over both.
  pub fn load(path: &Path, overrides: Overrides) -> Result<Self, ConfigError> {
    Config::builder()
      .set_default("base_url", DEFAULT_BASE_URL)?
      .add_source(File::from(path).required(false))
      .add_source(Environment::with_prefix("PORTAL"))
      .set_override_option("base_url", overrides.base_url)?
      .set_override_option("token", overrides.token)?
      .build()?
      .try_deserialize()
  }
}

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

const TOKEN_ENV: &str = "RAYTHU_API_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Custom title for header (defaults to the backend host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub cart: CartConfig,
  /// Used when RUST_LOG is not set
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

fn default_log_level() -> String {
  "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub base_url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Fetch category and virus links per product after listing products
  #[serde(default)]
  pub hydrate_product_relations: bool,
}

fn default_timeout_secs() -> u64 {
  30
}

impl ApiConfig {
  pub fn validated_base_url(&self) -> Result<Url> {
    let url = Url::parse(self.base_url.trim())
      .map_err(|e| eyre!("Invalid api.base_url '{}': {}", self.base_url, e))?;
    match url.scheme() {
      "http" | "https" => Ok(url),
      other => Err(eyre!(
        "Invalid api.base_url '{}': unsupported scheme '{}'",
        self.base_url,
        other
      )),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
  /// SQLite file under the user data directory
  #[default]
  Persistent,
  /// Kept for the lifetime of the process only
  Memory,
  /// Every read goes to the backend
  Disabled,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  #[serde(default)]
  pub mode: CacheMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartConfig {
  /// WhatsApp number orders are sent to, digits only with country code
  #[serde(default = "default_vendor_number")]
  pub vendor_number: String,
}

fn default_vendor_number() -> String {
  "916303343274".to_string()
}

impl Default for CartConfig {
  fn default() -> Self {
    Self {
      vendor_number: default_vendor_number(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./raythu-admin.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/raythu-admin/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/raythu-admin/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("raythu-admin.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("raythu-admin").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))?;
    config.api.validated_base_url()?;
    Ok(config)
  }

  /// Header title: explicit title, else the backend host.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    Url::parse(&self.api.base_url)
      .ok()
      .and_then(|u| u.host_str().map(String::from))
      .unwrap_or_else(|| "raythu-admin".to_string())
  }

  /// Bearer token for the backend, if one is configured.
  pub fn get_api_token() -> Option<String> {
    std::env::var(TOKEN_ENV)
      .ok()
      .map(|token| token.trim().to_string())
      .filter(|token| !token.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_uses_defaults() {
    let config = Config::parse("api:\n  base_url: http://localhost:5000\n").unwrap();
    assert_eq!(config.api.timeout_secs, 30);
    assert!(!config.api.hydrate_product_relations);
    assert_eq!(config.cache.mode, CacheMode::Persistent);
    assert_eq!(config.cart.vendor_number, "916303343274");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.display_title(), "localhost");
  }

  #[test]
  fn test_full_config() {
    let yaml = r#"
api:
  base_url: https://admin.raythu.in/api
  timeout_secs: 10
  hydrate_product_relations: true
title: Raythu Admin
cache:
  mode: memory
cart:
  vendor_number: "911234567890"
log_level: debug
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.api.timeout_secs, 10);
    assert!(config.api.hydrate_product_relations);
    assert_eq!(config.cache.mode, CacheMode::Memory);
    assert_eq!(config.cart.vendor_number, "911234567890");
    assert_eq!(config.display_title(), "Raythu Admin");
  }

  #[test]
  fn test_rejects_non_http_base_url() {
    assert!(Config::parse("api:\n  base_url: ftp://example.com\n").is_err());
    assert!(Config::parse("api:\n  base_url: not a url\n").is_err());
  }

  #[test]
  fn test_unknown_cache_mode_is_an_error() {
    let yaml = "api:\n  base_url: http://localhost\ncache:\n  mode: redis\n";
    assert!(Config::parse(yaml).is_err());
  }
}

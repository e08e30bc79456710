use color_eyre::{eyre::eyre, Result};
use gridpager::GridOptions;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Grid name, shown in the header and attached to every log line
  #[serde(default = "default_name")]
  pub name: String,
  pub api: ApiConfig,
  #[serde(default)]
  pub grid: GridOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub url: String,
  /// Sent with every page request, ahead of `grid.api_params`
  #[serde(default)]
  pub params: Map<String, Value>,
}

fn default_name() -> String {
  "grid".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./gridpager.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/gridpager/config.yaml
  ///
  /// With no file found, a `url` alone is enough to browse with default options.
  /// A `url` always overrides `api.url` from the file.
  pub fn load(explicit_path: Option<&Path>, url: Option<String>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match (path, url.as_deref()) {
      (Some(p), _) => Self::load_from_path(&p)?,
      (None, Some(url)) => Self::for_url(url),
      (None, None) => {
        return Err(eyre!(
          "No configuration file found. Create one at ~/.config/gridpager/config.yaml\n\
                 or pass --url."
        ))
      }
    };

    if let Some(url) = url {
      config.api.url = url;
    }
    Ok(config)
  }

  fn for_url(url: &str) -> Self {
    Self {
      name: default_name(),
      api: ApiConfig {
        url: url.to_string(),
        params: Map::new(),
      },
      grid: GridOptions::default(),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("gridpager.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("gridpager").join("config.yaml");
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
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  /// Grid options with `api.params` folded into the request parameters
  pub fn grid_options(&self) -> GridOptions {
    let mut options = self.grid.clone();
    let mut params = self.api.params.clone();
    params.extend(std::mem::take(&mut options.api_params));
    options.api_params = params;
    options
  }

  /// Bearer token for the API, from GRIDPAGER_API_TOKEN
  pub fn get_api_token() -> Option<String> {
    std::env::var("GRIDPAGER_API_TOKEN")
      .ok()
      .filter(|t| !t.is_empty())
  }

  /// Directory for log files
  pub fn log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("gridpager"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  const ORDERS: &str = r#"
name: orders
api:
  url: https://shop.example.com/api/orders
  params:
    status: open
    region: eu
grid:
  page_size: 20
  primary_key: orderId
  use_predictive_caching: true
  api_params:
    region: us
  styles:
    tbody: striped
  columns:
    - key: customerId
      hidden: false
      header: Customer
"#;

  #[test]
  fn test_parse_full_config() {
    let config = Config::parse(ORDERS).unwrap();
    assert_eq!(config.name, "orders");
    assert_eq!(config.api.url, "https://shop.example.com/api/orders");
    assert_eq!(config.grid.page_size, Some(20));
    assert_eq!(config.grid.primary_key.as_deref(), Some("orderId"));
    assert_eq!(config.grid.columns[0].header.as_deref(), Some("Customer"));
  }

  #[test]
  fn test_grid_params_win_over_api_params() {
    let config = Config::parse(ORDERS).unwrap();
    let options = config.grid_options();
    assert_eq!(options.api_params["status"], json!("open"));
    assert_eq!(options.api_params["region"], json!("us"));
  }

  #[test]
  fn test_minimal_config() {
    let config = Config::parse("api:\n  url: http://localhost:8080/items\n").unwrap();
    assert_eq!(config.name, "grid");
    assert!(config.grid.page_size.is_none());
  }

  #[test]
  fn test_missing_explicit_path_fails() {
    assert!(Config::load(Some(Path::new("/nonexistent/gridpager.yaml")), None).is_err());
  }
}

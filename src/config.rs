use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub store: StoreConfig,
  /// Custom title for the header (defaults to the store host if not set)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  /// Root URL of the remote database, e.g.
  /// https://your-project-default-rtdb.europe-west1.firebasedatabase.app
  pub url: String,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./t9s.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/t9s/config.yaml
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
        "No configuration file found. Create one at ~/.config/t9s/config.yaml\n\
                 (see config.example.yaml for the format) or pass --url."
      )),
    }
  }

  /// Build a configuration from just a store URL (the --url flag).
  pub fn from_url(url: impl Into<String>) -> Self {
    Self {
      store: StoreConfig { url: url.into() },
      title: None,
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("t9s.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("t9s").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Parsed store URL.
  pub fn store_url(&self) -> Result<Url> {
    Url::parse(&self.store.url).map_err(|e| eyre!("Invalid store url '{}': {}", self.store.url, e))
  }

  /// Header title: the configured one, or the store host.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    self
      .store_url()
      .ok()
      .and_then(|url| url.host_str().map(String::from))
      .unwrap_or_else(|| self.store.url.clone())
  }
}

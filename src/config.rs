use crate::presenter::{ReloadPolicy, DEFAULT_PLAYLIST};
use crate::youtube::client::{ClientConfig, YOUTUBE_API_URL};
use serde::Deserialize;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "tubelist.toml";
pub const API_KEY_VAR: &str = "YOUTUBE_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub playlist_id: String,
    pub base_url: String,
    pub timeout: Duration,
    pub system_proxy: bool,
    pub reload_policy: ReloadPolicy,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    api_key: Option<String>,
    playlist_id: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    system_proxy: Option<bool>,
    reload_policy: Option<ReloadPolicy>,
}

impl Default for Config {
    fn default() -> Self {
        PartialConfig::default().into()
    }
}

impl From<PartialConfig> for Config {
    fn from(partial: PartialConfig) -> Self {
        Self {
            api_key: partial.api_key.filter(|key| !key.is_empty()),
            playlist_id: partial
                .playlist_id
                .unwrap_or_else(|| DEFAULT_PLAYLIST.to_owned()),
            base_url: partial
                .base_url
                .unwrap_or_else(|| YOUTUBE_API_URL.to_owned()),
            timeout: Duration::from_secs(partial.timeout_secs.unwrap_or(10)),
            system_proxy: partial.system_proxy.unwrap_or(true),
            reload_policy: partial.reload_policy.unwrap_or_default(),
        }
    }
}

impl Config {
    /// Reads `path`, or `tubelist.toml` if it exists. A missing default file
    /// means defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        debug!("Loading config from file '{}'", path.display());
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file, using defaults");
                String::new()
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        let config =
            Config::from_toml(&text).map_err(|source| ConfigError::Parse { path, source })?;
        info!("Using config: {}", config);
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Config, toml::de::Error> {
        Ok(toml::from_str::<PartialConfig>(text)?.into())
    }

    /// An environment key wins over the file's key.
    pub fn with_api_key_override(mut self, api_key: Option<String>) -> Self {
        if let Some(api_key) = api_key.filter(|key| !key.is_empty()) {
            self.api_key = Some(api_key);
        }
        self
    }

    pub fn client(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout: self.timeout,
            system_proxy: self.system_proxy,
        }
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "api_key={} playlist_id={} base_url={} timeout={}s reload_policy={:?}",
            if self.api_key.is_some() { "<set>" } else { "<unset>" },
            self.playlist_id,
            self.base_url,
            self.timeout.as_secs(),
            self.reload_policy
        )
    }
}

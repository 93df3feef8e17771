//! Client configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `$XDG_CONFIG_HOME/chunkup/config.toml` (or `~/.config/...`)
//! - Windows: `%APPDATA%/chunkup/config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use chunkup_protocol::constants::REQUEST_TIMEOUT;
use chunkup_uploader::{DEFAULT_USER_ID, HttpServiceConfig, UploaderConfig};
use serde::{Deserialize, Serialize};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the upload service.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Bearer token for the upload service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// User id sent when `--user` is not given.
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Local store directory (platform default if unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,

    /// Run ledger GC before every command.
    #[serde(default = "default_true")]
    pub gc_on_startup: bool,
}

fn default_server_url() -> String {
    HttpServiceConfig::default().base_url
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.into()
}

fn default_timeout_secs() -> u64 {
    REQUEST_TIMEOUT.as_secs()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            auth_token: None,
            user_id: default_user_id(),
            request_timeout_secs: default_timeout_secs(),
            store_dir: None,
            gc_on_startup: default_true(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from the default location.
    ///
    /// A missing file is created with defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // The file may hold a bearer token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn service_config(&self) -> HttpServiceConfig {
        HttpServiceConfig {
            base_url: self.server_url.clone(),
            auth_token: self.auth_token.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn uploader_config(&self) -> UploaderConfig {
        UploaderConfig {
            default_user_id: self.user_id.clone(),
            ..UploaderConfig::default()
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    let dir = chunkup_store::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no configuration directory available"))?;
    Ok(dir.join("chunkup").join("config.toml"))
}

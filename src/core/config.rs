use super::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default port of the hydrus client API
pub const DEFAULT_API_PORT: &str = "45869";

/// Default number of results per page
pub const DEFAULT_PAGE_SIZE: usize = 16;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Values read from `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Client API access key, sent verbatim with every request
    pub access_key: String,
    /// Host running the hydrus client
    pub api_host: String,
    /// Port of the client API
    pub api_port: String,
    /// `http` or `https`
    pub scheme: String,
    /// Results shown per page
    pub page_size: usize,
    /// Where viewed files are saved (default: `<base_dir>/downloads`)
    pub download_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            api_host: "127.0.0.1".to_string(),
            api_port: DEFAULT_API_PORT.to_string(),
            scheme: "http".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            download_dir: None,
        }
    }
}

/// Configuration for hydrus-browser
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for hydrus-browser data
    pub base_dir: PathBuf,
    /// Path to the TOML settings file
    pub config_path: PathBuf,
    /// Directory for TUI log files
    pub log_dir: PathBuf,
    /// Effective settings (file values with CLI overrides applied)
    pub settings: Settings,
}

impl Config {
    /// Get the default configuration directory
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
            .map(|home| home.join(".hydrus-browser"))
    }

    /// Create a configuration with default settings rooted at `base_dir`
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.unwrap_or_else(|| {
            Self::default_base_dir().unwrap_or_else(|_| PathBuf::from(".hydrus-browser"))
        });

        Ok(Self {
            config_path: base_dir.join(CONFIG_FILE_NAME),
            log_dir: base_dir.join("logs"),
            base_dir,
            settings: Settings::default(),
        })
    }

    /// Load the configuration, reading `config.toml` when it exists.
    /// A missing file leaves the defaults in place. Settings are not
    /// validated here; call `validate` once overrides have been applied.
    pub fn load(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::new(base_dir)?;
        if config.config_path.exists() {
            config.settings = Self::read_settings(&config.config_path)?;
            tracing::debug!(path = %config.config_path.display(), "loaded settings");
        }
        Ok(config)
    }

    fn read_settings(path: &Path) -> Result<Settings> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Initialize the base directory and write a default `config.toml`
    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        let text = toml::to_string_pretty(&self.settings)
            .map_err(|e| Error::Config(format!("Failed to serialize settings: {}", e)))?;
        std::fs::write(&self.config_path, text)?;
        Ok(())
    }

    /// Check if the configuration file has been written
    pub fn is_initialized(&self) -> bool {
        self.config_path.exists()
    }

    /// Reject settings the client cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.settings.page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".to_string()));
        }
        self.settings
            .api_port
            .parse::<u16>()
            .map_err(|_| Error::Config(format!("Invalid api_port: {:?}", self.settings.api_port)))?;
        if !matches!(self.settings.scheme.as_str(), "http" | "https") {
            return Err(Error::Config(format!(
                "Unsupported scheme: {:?}",
                self.settings.scheme
            )));
        }
        Ok(())
    }

    /// Base URL of the client API, always ending with `/`
    pub fn api_url(&self) -> String {
        format!(
            "{}://{}:{}/",
            self.settings.scheme, self.settings.api_host, self.settings.api_port
        )
    }

    /// Directory that downloaded files are written to
    pub fn download_dir(&self) -> PathBuf {
        self.settings
            .download_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("downloads"))
    }
}

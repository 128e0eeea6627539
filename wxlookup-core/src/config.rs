use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Environment variable holding the OpenWeatherMap API key.
pub const API_KEY_ENV: &str = "OWM_API_KEY";

/// Dotenv file consulted when the variable is not set in the environment.
pub const DOTENV_FILE: &str = ".env";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UNITS: &str = "metric";
pub const DEFAULT_LANG: &str = "en";

/// Optional overrides stored on disk.
///
/// Example TOML:
/// ```toml
/// base_url = "https://api.openweathermap.org/data/2.5/weather"
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub units: Option<String>,
    pub lang: Option<String>,
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Path to the settings file.
    pub fn file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxlookup", "wxlookup")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Startup configuration, built once and passed to the weather client.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub units: String,
    pub lang: String,
}

impl Config {
    /// Config with default endpoint and parameters.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            units: DEFAULT_UNITS.to_owned(),
            lang: DEFAULT_LANG.to_owned(),
        }
    }

    /// Read the settings file and the API key from the environment or `./.env`.
    pub fn load() -> Result<Self> {
        let settings = Settings::load()?;
        let api_key = match env::var(API_KEY_ENV) {
            Ok(key) => Some(key),
            Err(_) => api_key_from_dotenv(Path::new(DOTENV_FILE))?,
        };

        Self::from_parts(settings, api_key)
    }

    /// Combine settings with an API key; a missing or blank key is an error.
    pub fn from_parts(settings: Settings, api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "Missing API key.\n\
                     Hint: set {API_KEY_ENV} in the environment or in a {DOTENV_FILE} file."
                )
            })?;

        let mut cfg = Self::new(api_key);
        if let Some(base_url) = settings.base_url {
            cfg.base_url = base_url;
        }
        if let Some(secs) = settings.timeout_secs {
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(units) = settings.units {
            cfg.units = units;
        }
        if let Some(lang) = settings.lang {
            cfg.lang = lang;
        }

        Ok(cfg)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Look up the API key in a dotenv file; a missing file yields `None`.
pub fn api_key_from_dotenv(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let entries = dotenvy::from_path_iter(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    for entry in entries {
        let (key, value) =
            entry.with_context(|| format!("Failed to parse {}", path.display()))?;
        if key == API_KEY_ENV {
            return Ok(Some(value));
        }
    }

    Ok(None)
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("units", &self.units)
            .field("lang", &self.lang)
            .finish()
    }
}

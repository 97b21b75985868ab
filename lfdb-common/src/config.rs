//! Configuration loading and root folder resolution
//!
//! Every value resolves with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or malformed TOML file never aborts startup: a warning is
//! logged and the remaining tiers apply. [`TomlConfig::read`] defers that
//! warning so the binary can emit it once its subscriber is installed.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Application name used for config and data directories
pub const APP_DIR_NAME: &str = "laptopfixdb";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "laptopfixdb.db";

/// Environment variable overriding the root folder
pub const ENV_ROOT_FOLDER: &str = "LFDB_ROOT_FOLDER";

pub const DEFAULT_BIND: &str = "127.0.0.1:5780";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:5780";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_WATCH_BASE_URL: &str = "https://www.youtube.com";

/// One day, the cadence of both background jobs
pub const DEFAULT_JOB_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Compiled fallback values for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub bind: String,
    pub public_url: String,
    pub log_level: String,
    pub gemini_model: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            bind: DEFAULT_BIND.to_string(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            log_level: "info".to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    pub level: Option<String>,
    /// Log file, relative paths resolve against the root folder
    pub file: Option<PathBuf>,
}

/// `[youtube]` section
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct YouTubeTomlConfig {
    pub api_key: Option<String>,
    pub channel_id: Option<String>,
    pub base_url: Option<String>,
}

/// `[gemini]` section
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct GeminiTomlConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// `[scheduler]` section
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_job_interval")]
    pub sync_interval_secs: u64,
    #[serde(default = "default_job_interval")]
    pub health_interval_secs: u64,
}

fn default_job_interval() -> u64 {
    DEFAULT_JOB_INTERVAL_SECS
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sync_interval_secs: DEFAULT_JOB_INTERVAL_SECS,
            health_interval_secs: DEFAULT_JOB_INTERVAL_SECS,
        }
    }
}

/// Contents of `config.toml`
///
/// Every field is optional so that partial files stay valid.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind: Option<String>,
    pub public_url: Option<String>,
    pub cron_secret: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub youtube: YouTubeTomlConfig,
    #[serde(default)]
    pub gemini: GeminiTomlConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load from an explicit path or the platform default location
    ///
    /// Falls back to an empty config (all defaults) when the file is
    /// missing or cannot be parsed, logging why.
    pub fn load(path: Option<&Path>) -> Self {
        let loaded = Self::read(path);
        loaded.log();
        loaded.config
    }

    /// Like [`TomlConfig::load`] but without logging
    pub fn read(path: Option<&Path>) -> LoadedConfig {
        let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(p) => p,
            None => {
                return LoadedConfig {
                    config: Self::default(),
                    source: ConfigSource::Defaults,
                }
            }
        };

        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| format!("could not read: {}", e))
            .and_then(|content| Self::from_toml_str(&content).map_err(|e| e.to_string()));

        match parsed {
            Ok(config) => LoadedConfig {
                config,
                source: ConfigSource::File(path),
            },
            Err(reason) => LoadedConfig {
                config: Self::default(),
                source: ConfigSource::Ignored { path, reason },
            },
        }
    }
}

/// Where the TOML tier came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// No config file exists
    Defaults,
    File(PathBuf),
    /// A file exists but was unusable
    Ignored { path: PathBuf, reason: String },
}

/// Result of [`TomlConfig::read`]
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

impl LoadedConfig {
    /// Report the config source through `tracing`
    pub fn log(&self) {
        match &self.source {
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::File(path) => debug!("Loaded config file: {}", path.display()),
            ConfigSource::Ignored { path, reason } => {
                warn!("Ignoring config file {}: {}", path.display(), reason)
            }
        }
    }
}

/// Locate the platform config file, if one exists
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR_NAME).join("config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/var/lib").join(APP_DIR_NAME))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support").join(APP_DIR_NAME))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData").join(APP_DIR_NAME))
    } else {
        PathBuf::from("./laptopfixdb_data")
    }
}

/// Resolves the root folder holding the database
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>) -> Self {
        Self {
            cli_arg,
            toml_value: None,
        }
    }

    pub fn with_toml(mut self, toml: &TomlConfig) -> Self {
        self.toml_value = toml.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        self.resolve_with_env(|name| std::env::var(name).ok())
    }

    /// Resolve with an injectable environment lookup
    pub fn resolve_with_env<F>(&self, env: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Some(path) = env(ENV_ROOT_FOLDER).filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(path);
        }

        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and derives file paths inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            debug!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// YouTube Data API settings after resolution
#[derive(Debug, Clone)]
pub struct YouTubeSettings {
    pub api_key: Option<String>,
    pub channel_id: Option<String>,
    pub base_url: String,
    pub watch_base_url: String,
}

/// Gemini settings after resolution
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

/// Values that may be supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub bind: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub bind: String,
    pub public_url: String,
    pub cron_secret: Option<String>,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub youtube: YouTubeSettings,
    pub gemini: GeminiSettings,
    pub scheduler: SchedulerConfig,
}

impl ServiceConfig {
    /// Resolve against the process environment
    pub fn resolve(cli: CliOverrides, toml: TomlConfig) -> Self {
        Self::resolve_with_env(cli, toml, |name| std::env::var(name).ok())
    }

    /// Resolve with an injectable environment lookup
    pub fn resolve_with_env<F>(cli: CliOverrides, toml: TomlConfig, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = CompiledDefaults::for_current_platform();
        // Blank environment values count as unset
        let env_value = |name: &str| env(name).filter(|v| is_valid_key(v));
        let toml_value = |v: Option<String>| v.filter(|v| is_valid_key(v));

        let root_folder = RootFolderResolver::new(cli.root_folder)
            .with_toml(&toml)
            .resolve_with_env(&env);

        let bind = cli
            .bind
            .or_else(|| env_value("LFDB_BIND"))
            .or_else(|| toml_value(toml.bind))
            .unwrap_or(defaults.bind);

        let public_url = env_value("LFDB_PUBLIC_URL")
            .or_else(|| toml_value(toml.public_url))
            .unwrap_or(defaults.public_url);

        let cron_secret = env_value("CRON_SECRET").or_else(|| toml_value(toml.cron_secret));

        let log_level = toml_value(toml.logging.level).unwrap_or(defaults.log_level);
        let log_file = toml.logging.file.map(|file| {
            if file.is_relative() {
                root_folder.join(file)
            } else {
                file
            }
        });

        let youtube = YouTubeSettings {
            api_key: env_value("YOUTUBE_API_KEY")
                .or_else(|| env_value("GOOGLE_API_KEY"))
                .or_else(|| toml_value(toml.youtube.api_key)),
            channel_id: env_value("YOUTUBE_CHANNEL_ID")
                .or_else(|| toml_value(toml.youtube.channel_id)),
            base_url: toml_value(toml.youtube.base_url)
                .unwrap_or_else(|| DEFAULT_YOUTUBE_BASE_URL.to_string()),
            watch_base_url: DEFAULT_WATCH_BASE_URL.to_string(),
        };

        let gemini = GeminiSettings {
            api_key: env_value("GEMINI_API_KEY").or_else(|| toml_value(toml.gemini.api_key)),
            model: env_value("GEMINI_MODEL")
                .or_else(|| toml_value(toml.gemini.model))
                .unwrap_or(defaults.gemini_model),
            base_url: toml_value(toml.gemini.base_url)
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        };

        Self {
            root_folder,
            bind,
            public_url: public_url.trim_end_matches('/').to_string(),
            cron_secret,
            log_level,
            log_file,
            youtube,
            gemini,
            scheduler: toml.scheduler,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}

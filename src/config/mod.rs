mod file_config;

pub use file_config::{FileConfig, ImportConfig, TmdbConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/original";
pub const DEFAULT_IMAGE_LANGUAGES: &str = "zh,en,null";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: Option<String>,
    pub ephemeral: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub data_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    /// Keep the catalog in memory only, nothing is written to `data_dir`.
    pub ephemeral: bool,

    // Feature configs (with defaults)
    pub tmdb: TmdbSettings,
    pub import: ImportSettings,
}

#[derive(Debug, Clone)]
pub struct TmdbSettings {
    pub api_key: String,
    pub base_url: String,
    pub image_base_url: String,
    /// Language of the stored textual fields.
    pub primary_language: String,
    /// Language the alternate tagline is fetched in.
    pub secondary_language: String,
    pub default_image_languages: String,
    pub search_timeout_sec: u64,
    pub details_timeout_sec: u64,
}

impl Default for TmdbSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            image_base_url: DEFAULT_TMDB_IMAGE_BASE_URL.to_string(),
            primary_language: "zh-CN".to_string(),
            secondary_language: "en-US".to_string(),
            default_image_languages: DEFAULT_IMAGE_LANGUAGES.to_string(),
            search_timeout_sec: 10,
            details_timeout_sec: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub delay: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            max_retries: 1,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("data_dir must be specified via --data-dir or in config file")
            })?;

        if !data_dir.exists() {
            bail!("Data directory does not exist: {:?}", data_dir);
        }
        if !data_dir.is_dir() {
            bail!("data_dir is not a directory: {:?}", data_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        // TMDB settings - merge file config with CLI and defaults
        let tmdb_file = file.tmdb.unwrap_or_default();
        let defaults = TmdbSettings::default();
        let tmdb = TmdbSettings {
            api_key: tmdb_file
                .api_key
                .or_else(|| cli.tmdb_api_key.clone())
                .unwrap_or_default(),
            base_url: tmdb_file
                .base_url
                .or_else(|| cli.tmdb_base_url.clone())
                .unwrap_or(defaults.base_url),
            image_base_url: tmdb_file.image_base_url.unwrap_or(defaults.image_base_url),
            primary_language: tmdb_file
                .primary_language
                .unwrap_or(defaults.primary_language),
            secondary_language: tmdb_file
                .secondary_language
                .unwrap_or(defaults.secondary_language),
            default_image_languages: tmdb_file
                .default_image_languages
                .unwrap_or(defaults.default_image_languages),
            search_timeout_sec: tmdb_file
                .search_timeout_sec
                .unwrap_or(defaults.search_timeout_sec),
            details_timeout_sec: tmdb_file
                .details_timeout_sec
                .unwrap_or(defaults.details_timeout_sec),
        };

        let import_file = file.import.unwrap_or_default();
        let import_defaults = ImportSettings::default();
        let import = ImportSettings {
            delay: import_file
                .delay_ms
                .map(Duration::from_millis)
                .unwrap_or(import_defaults.delay),
            max_retries: import_file
                .max_retries
                .unwrap_or(import_defaults.max_retries),
            initial_backoff: import_file
                .initial_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(import_defaults.initial_backoff),
            max_backoff: import_file
                .max_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(import_defaults.max_backoff),
            backoff_multiplier: import_file
                .backoff_multiplier
                .unwrap_or(import_defaults.backoff_multiplier),
        };
        if import.backoff_multiplier < 1.0 {
            bail!(
                "import.backoff_multiplier must be at least 1.0, got {}",
                import.backoff_multiplier
            );
        }

        Ok(Self {
            data_dir,
            port,
            logging_level,
            frontend_dir_path,
            ephemeral: cli.ephemeral,
            tmdb,
            import,
        })
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("movies.json")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

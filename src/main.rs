use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use movie_catalog_server::catalog::{
    CatalogService, CatalogStore, InMemoryCatalogStore, JsonFileCatalogStore, SharedCatalog,
};
use movie_catalog_server::config::{AppConfig, CliConfig, FileConfig};
use movie_catalog_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use movie_catalog_server::tmdb::{MetadataProvider, TmdbClient};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding movies.json and uploaded workbooks.
    #[clap(long, value_parser = parse_path)]
    pub data_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 7860)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// TMDB v3 API key.
    #[clap(long, env = "TMDB_API_KEY", hide_env_values = true)]
    pub tmdb_api_key: Option<String>,

    /// Override the TMDB API base URL.
    #[clap(long)]
    pub tmdb_base_url: Option<String>,

    /// Keep the catalog in memory only.
    #[clap(long)]
    pub ephemeral: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            data_dir: self.data_dir.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            frontend_dir_path: self.frontend_dir_path.clone(),
            tmdb_api_key: self.tmdb_api_key.clone(),
            tmdb_base_url: self.tmdb_base_url.clone(),
            ephemeral: self.ephemeral,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let store: Box<dyn CatalogStore> = if config.ephemeral {
        warn!("Running with an in-memory catalog, nothing will be saved");
        Box::new(InMemoryCatalogStore::default())
    } else {
        info!("Using catalog file {:?}", config.catalog_path());
        Box::new(JsonFileCatalogStore::new(config.catalog_path()))
    };
    let catalog = Arc::new(SharedCatalog::new(store));

    info!("TMDB API at {}", config.tmdb.base_url);
    let provider: Arc<dyn MetadataProvider> = Arc::new(TmdbClient::new(&config.tmdb)?);
    let service = Arc::new(CatalogService::new(
        catalog,
        provider,
        &config.tmdb,
        &config.import,
    ));

    let uploads_dir = config.uploads_dir();
    std::fs::create_dir_all(&uploads_dir)
        .with_context(|| format!("Failed to create uploads directory {:?}", uploads_dir))?;

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        frontend_dir_path: config.frontend_dir_path.clone(),
        uploads_dir,
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(server_config, service).await
}

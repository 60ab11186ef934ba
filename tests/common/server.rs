//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own data directory and its
//! own fake TMDB.

use super::constants::*;
use super::fake_tmdb::spawn_fake_tmdb;
use movie_catalog_server::catalog::{CatalogService, JsonFileCatalogStore, SharedCatalog};
use movie_catalog_server::config::{ImportSettings, TmdbSettings};
use movie_catalog_server::server::{server::make_app, RequestsLoggingLevel, ServerConfig};
use movie_catalog_server::tmdb::{MetadataProvider, TmdbClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated data directory
///
/// When dropped, the server and the fake TMDB shut down and the data
/// directory is removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// Path of the catalog file the server writes
    pub catalog_path: PathBuf,

    // Private fields - keep resources alive until drop
    _data_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    _tmdb_shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server with an empty catalog
    pub async fn spawn() -> Self {
        Self::spawn_with_catalog(None).await
    }

    /// Spawns a new test server whose catalog file starts with `catalog_json`
    ///
    /// # Panics
    ///
    /// Panics if the data directory can't be prepared, if port binding
    /// fails, or if the server doesn't become ready within timeout.
    pub async fn spawn_with_catalog(catalog_json: Option<serde_json::Value>) -> Self {
        let data_dir = TempDir::new().expect("Failed to create data dir");
        let catalog_path = data_dir.path().join("movies.json");
        if let Some(catalog_json) = catalog_json {
            std::fs::write(&catalog_path, catalog_json.to_string())
                .expect("Failed to seed catalog");
        }

        let (tmdb_url, tmdb_shutdown_tx) = spawn_fake_tmdb().await;
        let tmdb = TmdbSettings {
            api_key: TMDB_API_KEY.to_string(),
            base_url: tmdb_url,
            image_base_url: IMAGE_BASE_URL.to_string(),
            ..TmdbSettings::default()
        };
        let import = ImportSettings {
            delay: Duration::ZERO,
            max_retries: 0,
            ..ImportSettings::default()
        };

        let provider: Arc<dyn MetadataProvider> =
            Arc::new(TmdbClient::new(&tmdb).expect("Failed to create TMDB client"));
        let catalog = Arc::new(SharedCatalog::new(Box::new(JsonFileCatalogStore::new(
            &catalog_path,
        ))));
        let service = Arc::new(CatalogService::new(catalog, provider, &tmdb, &import));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
            uploads_dir: data_dir.path().join("uploads"),
        };
        let app = make_app(config, service);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            catalog_path,
            _data_dir: data_dir,
            _shutdown_tx: Some(shutdown_tx),
            _tmdb_shutdown_tx: Some(tmdb_shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Catalog file contents as JSON, or `None` if it was never written
    pub fn catalog_on_disk(&self) -> Option<serde_json::Value> {
        let content = std::fs::read_to_string(&self.catalog_path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Waits for the server to become ready by polling the home route
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(tx) = self._tmdb_shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

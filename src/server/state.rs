use axum::extract::FromRef;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

use crate::catalog::CatalogService;

use super::ServerConfig;

pub type GuardedCatalogService = Arc<CatalogService>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
    pub catalog_service: GuardedCatalogService,
    pub version: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, catalog_service: GuardedCatalogService) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            started_at: Utc::now(),
            catalog_service,
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

impl FromRef<ServerState> for GuardedCatalogService {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_service.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

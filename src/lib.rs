//! Movie Catalog Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog;
pub mod config;
pub mod reconcile;
pub mod server;
pub mod tmdb;

// Re-export commonly used types for convenience
pub use catalog::{CatalogService, InMemoryCatalogStore, JsonFileCatalogStore, SharedCatalog};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use tmdb::{MetadataProvider, TmdbClient};

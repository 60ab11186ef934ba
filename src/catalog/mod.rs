pub mod models;
pub mod normalize;
mod service;
pub mod store;

pub use models::{Catalog, CastMember, ListName, MovieRecord, ProviderIdentity, Recommendation};
pub use normalize::{EnrichedDetails, Normalizer};
pub use service::{CatalogService, ServiceError};
pub use store::{CatalogError, CatalogStore, InMemoryCatalogStore, JsonFileCatalogStore, SharedCatalog};

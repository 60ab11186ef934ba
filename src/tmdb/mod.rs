//! TMDB metadata provider.
//!
//! - `models`: wire types and the [`MediaDetails`] movie/series variant
//! - `provider`: the [`MetadataProvider`] seam used by the rest of the engine
//! - `client`: the reqwest-backed implementation

pub mod client;
pub mod models;
pub mod provider;

pub use client::TmdbClient;
pub use models::{Candidate, MediaDetails, MediaKind};
pub use provider::{MetadataProvider, ProviderError};

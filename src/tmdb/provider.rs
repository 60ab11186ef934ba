//! Metadata provider trait definition.

use super::models::{Candidate, MediaDetails, MediaKind};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the metadata provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timeout")]
    Timeout,

    #[error("API error (status {status})")]
    Api { status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether trying the same request again might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Connection(_) | ProviderError::Timeout => true,
            ProviderError::Api { status } => *status == 429 || *status >= 500,
            ProviderError::InvalidResponse(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if let Some(status) = err.status() {
            ProviderError::Api {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Connection(err.to_string())
        }
    }
}

/// Source of canonical title metadata.
///
/// The server talks to TMDB through [`super::TmdbClient`]; tests plug in
/// in-memory implementations.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Searches movies and series, most relevant first.
    ///
    /// `year` is forwarded to the provider as a hint; results with another
    /// year may still come back.
    async fn search(&self, query: &str, year: Option<&str>)
        -> Result<Vec<Candidate>, ProviderError>;

    /// Fetches a title's details together with credits, images and
    /// recommendations.
    ///
    /// # Arguments
    /// * `language` - Language of the textual fields (e.g. "zh-CN").
    /// * `image_languages` - Comma separated image languages to include
    ///   (e.g. "zh,en,null").
    async fn fetch_details(
        &self,
        tmdb_id: u64,
        media_type: MediaKind,
        language: &str,
        image_languages: &str,
    ) -> Result<MediaDetails, ProviderError>;
}

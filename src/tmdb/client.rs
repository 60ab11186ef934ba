//! HTTP client for the TMDB v3 API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::models::{Candidate, MediaDetails, MediaKind, MultiSearchResponse};
use super::provider::{MetadataProvider, ProviderError};
use crate::config::TmdbSettings;

/// Bundled sub-resources so a single request returns everything the
/// normalizer needs.
const APPEND_TO_RESPONSE: &str = "credits,images,recommendations";

/// HTTP client for the TMDB API.
pub struct TmdbClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    search_language: String,
    search_timeout: Duration,
    details_timeout: Duration,
}

impl TmdbClient {
    /// Create a new TMDB client from the resolved settings.
    pub fn new(settings: &TmdbSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        if settings.api_key.trim().is_empty() {
            warn!("No TMDB API key configured, provider requests will be rejected");
        }

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            search_language: settings.primary_language.clone(),
            search_timeout: Duration::from_secs(settings.search_timeout_sec),
            details_timeout: Duration::from_secs(settings.details_timeout_sec),
        })
    }

    async fn get_text(
        &self,
        url: &str,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!("TMDB request to {} failed with status {}", url, status);
            return Err(ProviderError::Api {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn search(
        &self,
        query: &str,
        year: Option<&str>,
    ) -> Result<Vec<Candidate>, ProviderError> {
        let url = format!("{}/search/multi", self.base_url);
        let mut params = vec![
            ("query", query),
            ("language", self.search_language.as_str()),
            ("include_adult", "false"),
        ];
        if let Some(year) = year.filter(|y| !y.is_empty()) {
            params.push(("primary_release_year", year));
        }

        let body = self.get_text(&url, &params, self.search_timeout).await?;
        let parsed: MultiSearchResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .filter_map(|item| item.into_candidate())
            .collect())
    }

    async fn fetch_details(
        &self,
        tmdb_id: u64,
        media_type: MediaKind,
        language: &str,
        image_languages: &str,
    ) -> Result<MediaDetails, ProviderError> {
        let url = format!("{}/{}/{}", self.base_url, media_type.as_str(), tmdb_id);
        let params = [
            ("language", language),
            ("append_to_response", APPEND_TO_RESPONSE),
            ("include_image_language", image_languages),
        ];

        let body = self.get_text(&url, &params, self.details_timeout).await?;
        MediaDetails::from_json(media_type, &body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

//! Catalog operations behind the HTTP handlers.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::models::{Catalog, ListName, MovieRecord, ProviderIdentity};
use super::normalize::Normalizer;
use super::store::{CatalogError, SharedCatalog};
use crate::config::{ImportSettings, TmdbSettings};
use crate::reconcile::{read_workbook, ImportReport, Matcher, ReconciliationPipeline, RetryPolicy};
use crate::tmdb::{Candidate, MediaKind, MetadataProvider, ProviderError};

/// Failures surfaced to callers. The display text is meant for end users;
/// details stay in the logs.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("\"{title}\" is already in your lists")]
    Duplicate { title: String },

    #[error("The movie database is unavailable right now, please try again later")]
    ProviderUnavailable(#[source] ProviderError),

    #[error("Could not import spreadsheet: {0}")]
    Import(String),

    #[error("Could not access the catalog")]
    Storage(#[source] anyhow::Error),
}

impl From<CatalogError> for ServiceError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Duplicate { title } => ServiceError::Duplicate { title },
            CatalogError::NotFound { list, id } => {
                ServiceError::NotFound(format!("No record {} in {}", id, list))
            }
            CatalogError::Storage(err) => ServiceError::Storage(err),
        }
    }
}

/// An unknown provider id is a missing title; anything else means the
/// provider couldn't answer.
fn provider_failure(err: ProviderError, what: &str) -> ServiceError {
    match err {
        ProviderError::Api { status: 404 } => {
            ServiceError::NotFound(format!("{} was not found in the movie database", what))
        }
        other => {
            warn!("Provider request for {} failed: {}", what, other);
            ServiceError::ProviderUnavailable(other)
        }
    }
}

pub struct CatalogService {
    catalog: Arc<SharedCatalog>,
    provider: Arc<dyn MetadataProvider>,
    normalizer: Normalizer,
    matcher: Matcher,
    pipeline: ReconciliationPipeline,
    default_image_languages: String,
}

impl CatalogService {
    pub fn new(
        catalog: Arc<SharedCatalog>,
        provider: Arc<dyn MetadataProvider>,
        tmdb: &TmdbSettings,
        import: &ImportSettings,
    ) -> Self {
        let normalizer = Normalizer::new(tmdb);
        let pipeline = ReconciliationPipeline::new(
            catalog.clone(),
            provider.clone(),
            normalizer.clone(),
            RetryPolicy::new(import),
            import.delay,
        );
        Self {
            catalog,
            matcher: Matcher::new(provider.clone()),
            provider,
            normalizer,
            pipeline,
            default_image_languages: tmdb.default_image_languages.clone(),
        }
    }

    fn image_languages<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .map(str::trim)
            .filter(|languages| !languages.is_empty())
            .unwrap_or(&self.default_image_languages)
    }

    pub async fn list(&self) -> Result<Catalog, ServiceError> {
        Ok(self.catalog.snapshot().await?)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Candidate>, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::BadRequest(
                "Search query must not be empty".to_string(),
            ));
        }
        self.provider
            .search(query, None)
            .await
            .map_err(|err| provider_failure(err, &format!("search '{}'", query)))
    }

    /// Adds a provider title at the front of `list`.
    ///
    /// Fails with [`ServiceError::Duplicate`] when the title is already in
    /// any list, checked again under the catalog lock right before insertion.
    pub async fn add(
        &self,
        tmdb_id: u64,
        media_type: MediaKind,
        list: ListName,
        image_languages: Option<&str>,
    ) -> Result<MovieRecord, ServiceError> {
        let identity = ProviderIdentity {
            tmdb_id,
            media_type,
        };

        let snapshot = self.catalog.snapshot().await?;
        if let Some((_, existing)) = snapshot.find_by_provider_id(identity) {
            return Err(ServiceError::Duplicate {
                title: existing.title.clone(),
            });
        }

        let details = self
            .normalizer
            .fetch_enriched(
                self.provider.as_ref(),
                tmdb_id,
                media_type,
                self.image_languages(image_languages),
            )
            .await
            .map_err(|err| provider_failure(err, &identity.to_string()))?;
        let record = self
            .normalizer
            .normalize(&details, MovieRecord::make_id(list, identity));

        let inserted = record.clone();
        self.catalog
            .mutate(move |catalog| {
                if let Some((_, existing)) = catalog.find_by_provider_id(identity) {
                    return Err(CatalogError::Duplicate {
                        title: existing.title.clone(),
                    });
                }
                catalog.insert(list, inserted);
                Ok(())
            })
            .await?;

        info!("Added '{}' ({}) to {}", record.title, identity, list);
        Ok(record)
    }

    /// Removes a record and returns its title. The catalog is not written
    /// when there is nothing to remove.
    pub async fn delete(&self, list: ListName, id: &str) -> Result<String, ServiceError> {
        let title = self
            .catalog
            .mutate(|catalog| {
                let title = catalog.get(list, id).map(|record| record.title.clone());
                match title {
                    Some(title) if catalog.remove_by_id(list, id) => Ok(title),
                    _ => Err(CatalogError::NotFound {
                        list,
                        id: id.to_string(),
                    }),
                }
            })
            .await?;
        info!("Deleted {} '{}' from {}", id, title, list);
        Ok(title)
    }

    pub async fn clear(&self) -> Result<(), ServiceError> {
        Ok(self.catalog.clear().await?)
    }

    /// Stored record refreshed with current provider data, without saving.
    ///
    /// Records with no provider identity are matched by title and year.
    /// Whenever the provider can't help, the stored record is returned as is.
    pub async fn enrich(
        &self,
        list: ListName,
        id: &str,
        image_languages: Option<&str>,
    ) -> Result<MovieRecord, ServiceError> {
        let snapshot = self.catalog.snapshot().await?;
        let stored = snapshot
            .get(list, id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("No record {} in {}", id, list)))?;

        let identity = match stored.provider_identity() {
            Some(identity) => identity,
            None => {
                let year = Some(stored.year.as_str()).filter(|year| !year.is_empty());
                match self.matcher.find_match(&stored.title, year).await {
                    Ok(Some(candidate)) => ProviderIdentity {
                        tmdb_id: candidate.tmdb_id,
                        media_type: candidate.media_type,
                    },
                    Ok(None) => return Ok(stored),
                    Err(err) => {
                        warn!("Could not match '{}': {}, using stored data", stored.title, err);
                        return Ok(stored);
                    }
                }
            }
        };

        let details = match self
            .normalizer
            .fetch_enriched(
                self.provider.as_ref(),
                identity.tmdb_id,
                identity.media_type,
                self.image_languages(image_languages),
            )
            .await
        {
            Ok(details) => details,
            Err(err) => {
                warn!(
                    "Could not refresh {} from the provider: {}, using stored data",
                    id, err
                );
                return Ok(stored);
            }
        };

        let mut record = self.normalizer.normalize(&details, stored.id.clone());
        if record.posters.is_empty() {
            record.posters = stored.posters;
        }
        if record.stills.is_empty() {
            record.stills = stored.stills;
        }
        record.extra = stored.extra;
        Ok(record)
    }

    /// A record built straight from the provider, not tied to any list.
    pub async fn provider_record(
        &self,
        media_type: MediaKind,
        tmdb_id: u64,
        image_languages: Option<&str>,
    ) -> Result<MovieRecord, ServiceError> {
        let details = self
            .normalizer
            .fetch_enriched(
                self.provider.as_ref(),
                tmdb_id,
                media_type,
                self.image_languages(image_languages),
            )
            .await
            .map_err(|err| provider_failure(err, &format!("{}/{}", media_type, tmdb_id)))?;
        Ok(self
            .normalizer
            .normalize(&details, format!("tmdb-{}", tmdb_id)))
    }

    /// Imports every recognized sheet of the workbook at `path`.
    pub async fn import_workbook(
        &self,
        path: PathBuf,
        image_languages: Option<&str>,
    ) -> Result<ImportReport, ServiceError> {
        let sheets = tokio::task::spawn_blocking(move || read_workbook(&path))
            .await
            .map_err(|err| ServiceError::Storage(err.into()))?
            .map_err(|err| {
                warn!("Failed to read workbook: {:#}", err);
                ServiceError::Import("the file is not a readable spreadsheet".to_string())
            })?;

        if sheets.is_empty() {
            return Err(ServiceError::Import(
                "no sheet named after a watch list was found".to_string(),
            ));
        }

        Ok(self
            .pipeline
            .run(sheets, self.image_languages(image_languages))
            .await?)
    }
}

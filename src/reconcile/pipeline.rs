//! Bulk import of spreadsheet rows into the catalog.
//!
//! Rows are matched and enriched without holding the catalog lock. The
//! accepted records are written in one go at the end, so an interrupted
//! import leaves the catalog as it was and re-running it is safe.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::matcher::Matcher;
use super::retry::RetryPolicy;
use super::spreadsheet::{ImportSheet, SheetRow};
use crate::catalog::models::{ListName, MovieRecord, ProviderIdentity};
use crate::catalog::normalize::{Normalizer, PLOT_PLACEHOLDER};
use crate::catalog::store::{CatalogError, SharedCatalog};
use crate::tmdb::{MediaKind, MetadataProvider};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    Added {
        id: String,
        tmdb_id: u64,
    },
    NoMatch,
    Duplicate {
        tmdb_id: u64,
        media_type: MediaKind,
        existing_list: ListName,
    },
    Failed {
        reason: String,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct RowReport {
    pub list: ListName,
    pub title: String,
    #[serde(flatten)]
    pub outcome: RowOutcome,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ImportReport {
    pub added: usize,
    pub duplicates: usize,
    pub no_match: usize,
    pub failed: usize,
    pub rows: Vec<RowReport>,
}

impl ImportReport {
    fn push(&mut self, list: ListName, title: &str, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Added { .. } => self.added += 1,
            RowOutcome::NoMatch => self.no_match += 1,
            RowOutcome::Duplicate { .. } => self.duplicates += 1,
            RowOutcome::Failed { .. } => self.failed += 1,
        }
        self.rows.push(RowReport {
            list,
            title: title.to_string(),
            outcome,
        });
    }

    /// Turns a staged addition into a duplicate after it lost to a record
    /// that reached the catalog first.
    fn demote_to_duplicate(&mut self, record_id: &str, media_type: MediaKind, existing: ListName) {
        let row = self.rows.iter_mut().find(
            |row| matches!(&row.outcome, RowOutcome::Added { id, .. } if id == record_id),
        );
        if let Some(row) = row {
            if let RowOutcome::Added { tmdb_id, .. } = row.outcome {
                row.outcome = RowOutcome::Duplicate {
                    tmdb_id,
                    media_type,
                    existing_list: existing,
                };
                self.added -= 1;
                self.duplicates += 1;
            }
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Imported {} titles ({} duplicates, {} not found, {} failed)",
            self.added, self.duplicates, self.no_match, self.failed
        )
    }
}

/// Fills gaps in a provider record with what the spreadsheet row supplied.
///
/// Provider data always wins: row images are only used when the provider
/// returned none of that kind, and row text only replaces empty fields.
pub fn merge_sheet_row(record: &mut MovieRecord, row: &SheetRow) {
    if record.posters.is_empty() {
        record.posters = row.posters.clone();
    }
    if record.stills.is_empty() {
        record.stills = row.stills.clone();
    }
    if record.director.is_empty() {
        record.director = row.director.clone();
    }
    if record.cast_summary.is_empty() {
        record.cast_summary = row.actors.clone();
    }
    if record.plot == PLOT_PLACEHOLDER && !row.plot.is_empty() {
        record.plot = row.plot.clone();
    }
}

pub struct ReconciliationPipeline {
    catalog: Arc<SharedCatalog>,
    provider: Arc<dyn MetadataProvider>,
    matcher: Matcher,
    normalizer: Normalizer,
    retry: RetryPolicy,
    delay: Duration,
}

impl ReconciliationPipeline {
    pub fn new(
        catalog: Arc<SharedCatalog>,
        provider: Arc<dyn MetadataProvider>,
        normalizer: Normalizer,
        retry: RetryPolicy,
        delay: Duration,
    ) -> Self {
        Self {
            catalog,
            matcher: Matcher::new(provider.clone()),
            provider,
            normalizer,
            retry,
            delay,
        }
    }

    /// Imports `sheets` in order and persists the accepted records once.
    pub async fn run(
        &self,
        sheets: Vec<ImportSheet>,
        image_languages: &str,
    ) -> Result<ImportReport, CatalogError> {
        let snapshot = self.catalog.snapshot().await?;
        let mut claimed: HashMap<ProviderIdentity, ListName> = snapshot
            .iter()
            .filter_map(|(list, record)| record.provider_identity().map(|identity| (identity, list)))
            .collect();

        let mut report = ImportReport::default();
        let mut staged: Vec<(ListName, MovieRecord)> = Vec::new();
        let mut first_row = true;

        for sheet in sheets {
            info!("Importing {} rows into {}", sheet.rows.len(), sheet.list);
            for row in &sheet.rows {
                if row.title.trim().is_empty() {
                    continue;
                }
                if !first_row && !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                first_row = false;

                let outcome = self
                    .process_row(sheet.list, row, &mut claimed, &mut staged, image_languages)
                    .await;
                report.push(sheet.list, &row.title, outcome);
            }
        }

        if staged.is_empty() {
            info!("{}", report.summary());
            return Ok(report);
        }

        let lost = self
            .catalog
            .mutate(|catalog| {
                let mut lost = Vec::new();
                for (list, record) in staged {
                    let existing = record
                        .provider_identity()
                        .and_then(|identity| catalog.find_by_provider_id(identity))
                        .map(|(existing, _)| existing);
                    match (existing, record.media_type) {
                        (Some(existing), Some(media_type)) => {
                            lost.push((record.id, media_type, existing));
                        }
                        _ => catalog.insert(list, record),
                    }
                }
                Ok(lost)
            })
            .await?;

        for (record_id, media_type, existing) in lost {
            warn!(
                "{} was added to {} while importing, skipping",
                record_id, existing
            );
            report.demote_to_duplicate(&record_id, media_type, existing);
        }

        info!("{}", report.summary());
        Ok(report)
    }

    async fn process_row(
        &self,
        list: ListName,
        row: &SheetRow,
        claimed: &mut HashMap<ProviderIdentity, ListName>,
        staged: &mut Vec<(ListName, MovieRecord)>,
        image_languages: &str,
    ) -> RowOutcome {
        let matcher = &self.matcher;
        let title = row.title.as_str();
        let year = row.year.as_deref();

        let candidate = match self
            .retry
            .run("search", move || matcher.find_match(title, year))
            .await
        {
            Ok(Some(candidate)) => candidate,
            Ok(None) => {
                info!("No match for '{}' ({}), skipping", title, year.unwrap_or("-"));
                return RowOutcome::NoMatch;
            }
            Err(err) => {
                warn!("Search for '{}' failed: {}", title, err);
                return RowOutcome::Failed {
                    reason: format!("Search failed: {}", err),
                };
            }
        };

        let identity = ProviderIdentity {
            tmdb_id: candidate.tmdb_id,
            media_type: candidate.media_type,
        };
        if let Some(existing) = claimed.get(&identity) {
            info!(
                "Skipping '{}', {} already in {}",
                title, identity, existing
            );
            return RowOutcome::Duplicate {
                tmdb_id: identity.tmdb_id,
                media_type: identity.media_type,
                existing_list: *existing,
            };
        }

        let normalizer = &self.normalizer;
        let provider = self.provider.as_ref();
        let details = match self
            .retry
            .run("details", move || {
                normalizer.fetch_enriched(
                    provider,
                    identity.tmdb_id,
                    identity.media_type,
                    image_languages,
                )
            })
            .await
        {
            Ok(details) => details,
            Err(err) => {
                warn!("Could not fetch details for {}: {}", identity, err);
                return RowOutcome::Failed {
                    reason: format!("Details unavailable: {}", err),
                };
            }
        };

        let id = MovieRecord::make_id(list, identity);
        let mut record = self.normalizer.normalize(&details, id.clone());
        merge_sheet_row(&mut record, row);

        info!("Matched '{}' to {} ({})", title, identity, record.title);
        claimed.insert(identity, list);
        staged.push((list, record));
        RowOutcome::Added {
            id,
            tmdb_id: identity.tmdb_id,
        }
    }
}

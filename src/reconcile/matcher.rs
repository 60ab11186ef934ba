//! Picks the provider title an uncertain spreadsheet title refers to.

use std::sync::Arc;
use tracing::debug;

use crate::tmdb::{Candidate, MetadataProvider, ProviderError};

pub struct Matcher {
    provider: Arc<dyn MetadataProvider>,
}

impl Matcher {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self { provider }
    }

    /// Returns the provider's most relevant hit for `title`, if any.
    ///
    /// The year only narrows the provider search; a hit from another year is
    /// still accepted. `Ok(None)` means nothing was found, which is expected
    /// for obscure or misspelled titles.
    pub async fn find_match(
        &self,
        title: &str,
        year: Option<&str>,
    ) -> Result<Option<Candidate>, ProviderError> {
        let year = year.and_then(normalize_year);
        let candidates = self.provider.search(title.trim(), year.as_deref()).await?;
        let best = candidates.into_iter().next();
        match &best {
            Some(candidate) => debug!(
                "Matched '{}' to {} {} ({})",
                title, candidate.media_type, candidate.tmdb_id, candidate.title
            ),
            None => debug!("No provider match for '{}'", title),
        }
        Ok(best)
    }
}

/// Cleans up a year cell: blank cells mean no year, and numeric cells read as
/// `2010.0` lose the fraction.
pub fn normalize_year(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let year = match trimmed.split_once('.') {
        Some((whole, fraction)) if fraction.chars().all(|c| c == '0') => whole,
        _ => trimmed,
    };
    if year.is_empty() {
        None
    } else {
        Some(year.to_string())
    }
}

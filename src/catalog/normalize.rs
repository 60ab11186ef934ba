//! Turns provider detail payloads into canonical [`MovieRecord`]s.

use tracing::warn;

use super::models::{CastMember, MovieRecord, Recommendation};
use crate::config::TmdbSettings;
use crate::tmdb::models::year_of;
use crate::tmdb::{MediaDetails, MediaKind, MetadataProvider, ProviderError};

pub const CAST_DETAILED_LIMIT: usize = 15;
pub const CAST_SUMMARY_LIMIT: usize = 10;
pub const RECOMMENDATIONS_LIMIT: usize = 10;
pub const PLOT_PLACEHOLDER: &str = "No synopsis available.";

const DIRECTOR_JOB: &str = "Director";
const NAME_SEPARATOR: &str = ", ";

/// Details of one title fetched in the primary language, plus the optional
/// secondary-language fetch that only contributes the alternate tagline.
#[derive(Clone, Debug)]
pub struct EnrichedDetails {
    pub primary: MediaDetails,
    pub secondary: Option<MediaDetails>,
}

/// Builds a record from provider details.
///
/// `image_base` is prepended to every image file path. The media kind comes
/// from the variant of `primary`.
pub fn normalize(
    primary: &MediaDetails,
    secondary: Option<&MediaDetails>,
    assigned_id: String,
    image_base: &str,
) -> MovieRecord {
    let common = primary.common();
    let media_type = primary.kind();

    let director = common
        .credits
        .crew
        .iter()
        .filter(|member| member.job.as_deref() == Some(DIRECTOR_JOB))
        .map(|member| member.name.as_str())
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR);

    let cast: Vec<CastMember> = common
        .credits
        .cast
        .iter()
        .take(CAST_DETAILED_LIMIT)
        .map(|credit| CastMember {
            name: credit.name.clone(),
            character: credit.character.clone().unwrap_or_default(),
            profile_path: credit.profile_path.clone(),
        })
        .collect();

    let cast_summary = cast
        .iter()
        .take(CAST_SUMMARY_LIMIT)
        .map(|member| member.name.as_str())
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR);

    let image_urls = |files: &[crate::tmdb::models::ImageFile]| -> Vec<String> {
        files
            .iter()
            .filter(|file| !file.file_path.is_empty())
            .map(|file| format!("{}{}", image_base, file.file_path))
            .collect()
    };

    let recommendations = common
        .recommendations
        .results
        .iter()
        .take(RECOMMENDATIONS_LIMIT)
        .map(|item| Recommendation {
            id: item.id,
            title: item.title.clone().or_else(|| item.name.clone()),
            poster_path: item.poster_path.clone(),
            media_type: Some(
                item.media_type
                    .as_deref()
                    .and_then(|kind| kind.parse::<MediaKind>().ok())
                    .unwrap_or(media_type),
            ),
        })
        .collect();

    let plot = common
        .overview
        .clone()
        .filter(|overview| !overview.trim().is_empty())
        .unwrap_or_else(|| PLOT_PLACEHOLDER.to_string());

    MovieRecord {
        id: assigned_id,
        tmdb_id: Some(common.id),
        media_type: Some(media_type),
        title: primary
            .title()
            .unwrap_or(crate::tmdb::models::UNKNOWN_TITLE)
            .to_string(),
        year: year_of(primary.release_date()),
        director,
        cast_summary,
        cast,
        plot,
        tagline: common.tagline.clone().unwrap_or_default(),
        tagline_alternate: secondary
            .and_then(|details| details.common().tagline.clone())
            .unwrap_or_default(),
        rating: common.vote_average.unwrap_or(0.0),
        budget: primary.budget(),
        revenue: primary.revenue(),
        posters: image_urls(&common.images.posters),
        stills: image_urls(&common.images.backdrops),
        recommendations,
        extra: Default::default(),
    }
}

/// Provider settings the normalizer needs, split out of [`TmdbSettings`].
#[derive(Clone, Debug)]
pub struct Normalizer {
    image_base_url: String,
    primary_language: String,
    secondary_language: String,
}

impl Normalizer {
    pub fn new(settings: &TmdbSettings) -> Self {
        Self {
            image_base_url: settings.image_base_url.clone(),
            primary_language: settings.primary_language.clone(),
            secondary_language: settings.secondary_language.clone(),
        }
    }

    pub fn normalize(&self, details: &EnrichedDetails, assigned_id: String) -> MovieRecord {
        normalize(
            &details.primary,
            details.secondary.as_ref(),
            assigned_id,
            &self.image_base_url,
        )
    }

    /// Fetches a title in both languages.
    ///
    /// Only the primary fetch can fail the call; a failed secondary fetch is
    /// logged and leaves the alternate tagline empty.
    pub async fn fetch_enriched(
        &self,
        provider: &dyn MetadataProvider,
        tmdb_id: u64,
        media_type: MediaKind,
        image_languages: &str,
    ) -> Result<EnrichedDetails, ProviderError> {
        let primary = provider
            .fetch_details(tmdb_id, media_type, &self.primary_language, image_languages)
            .await?;

        let secondary = match provider
            .fetch_details(tmdb_id, media_type, &self.secondary_language, image_languages)
            .await
        {
            Ok(details) => Some(details),
            Err(err) => {
                warn!(
                    "Secondary language fetch for {}/{} failed: {}",
                    media_type, tmdb_id, err
                );
                None
            }
        };

        Ok(EnrichedDetails { primary, secondary })
    }
}

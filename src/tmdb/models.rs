//! Models for TMDB API responses.
//!
//! These types match the JSON returned by the TMDB v3 API. Every field the
//! engine reads is optional or defaulted, so a response missing any of them
//! still decodes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Media kind
// =============================================================================

/// The two kinds of title the catalog tracks, named the way TMDB names them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    Series,
}

impl MediaKind {
    /// Path segment and `media_type` value used by TMDB.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaKind::Movie),
            "tv" => Ok(MediaKind::Series),
            other => Err(format!("Unsupported media type: {}", other)),
        }
    }
}

// =============================================================================
// Search
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct MultiSearchResponse {
    #[serde(default)]
    pub results: Vec<MultiSearchItem>,
}

/// One entry of `/search/multi`. People show up here too, hence the loose
/// `media_type`.
#[derive(Debug, Deserialize)]
pub(crate) struct MultiSearchItem {
    pub id: Option<u64>,
    pub media_type: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
}

/// A search hit the engine can act on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub tmdb_id: u64,
    pub media_type: MediaKind,
    pub title: String,
    pub year: String,
    pub overview: String,
    pub poster_path: Option<String>,
}

pub const UNKNOWN_TITLE: &str = "Unknown title";

/// First four characters of a TMDB date, or an empty string.
pub fn year_of(date: Option<&str>) -> String {
    date.unwrap_or("").chars().take(4).collect()
}

impl MultiSearchItem {
    /// Converts the raw item, dropping anything that isn't a movie or a series.
    pub(crate) fn into_candidate(self) -> Option<Candidate> {
        let media_type = self.media_type.as_deref()?.parse::<MediaKind>().ok()?;
        let tmdb_id = self.id?;
        let title = non_empty(self.title)
            .or_else(|| non_empty(self.name))
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let date = non_empty(self.release_date).or_else(|| non_empty(self.first_air_date));
        Some(Candidate {
            tmdb_id,
            media_type,
            title,
            year: year_of(date.as_deref()),
            overview: self.overview.unwrap_or_default(),
            poster_path: self.poster_path,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

// =============================================================================
// Details
// =============================================================================

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CastCredit {
    #[serde(default)]
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CrewCredit {
    #[serde(default)]
    pub name: String,
    pub job: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Credits {
    pub cast: Vec<CastCredit>,
    pub crew: Vec<CrewCredit>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ImageFile {
    #[serde(default)]
    pub file_path: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Images {
    pub posters: Vec<ImageFile>,
    pub backdrops: Vec<ImageFile>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RecommendationItem {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub poster_path: Option<String>,
    pub media_type: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Recommendations {
    pub results: Vec<RecommendationItem>,
}

/// Fields shared by movie and series detail payloads.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CommonDetails {
    #[serde(default)]
    pub id: u64,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub credits: Credits,
    #[serde(default)]
    pub images: Images,
    #[serde(default)]
    pub recommendations: Recommendations,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MovieDetails {
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub release_date: Option<String>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    #[serde(flatten)]
    pub common: CommonDetails,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SeriesDetails {
    pub name: Option<String>,
    pub original_name: Option<String>,
    pub first_air_date: Option<String>,
    #[serde(flatten)]
    pub common: CommonDetails,
}

/// A detail payload, tagged by the kind it was fetched as.
#[derive(Clone, Debug)]
pub enum MediaDetails {
    Movie(MovieDetails),
    Series(SeriesDetails),
}

impl MediaDetails {
    /// Decodes a detail body fetched from the `movie` or `tv` endpoint.
    pub fn from_json(kind: MediaKind, body: &str) -> serde_json::Result<Self> {
        Ok(match kind {
            MediaKind::Movie => MediaDetails::Movie(serde_json::from_str(body)?),
            MediaKind::Series => MediaDetails::Series(serde_json::from_str(body)?),
        })
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            MediaDetails::Movie(_) => MediaKind::Movie,
            MediaDetails::Series(_) => MediaKind::Series,
        }
    }

    pub fn common(&self) -> &CommonDetails {
        match self {
            MediaDetails::Movie(m) => &m.common,
            MediaDetails::Series(s) => &s.common,
        }
    }

    pub fn title(&self) -> Option<&str> {
        let (primary, original) = match self {
            MediaDetails::Movie(m) => (&m.title, &m.original_title),
            MediaDetails::Series(s) => (&s.name, &s.original_name),
        };
        primary
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| original.as_deref().filter(|t| !t.is_empty()))
    }

    /// Release date for movies, first air date for series.
    pub fn release_date(&self) -> Option<&str> {
        match self {
            MediaDetails::Movie(m) => m.release_date.as_deref(),
            MediaDetails::Series(s) => s.first_air_date.as_deref(),
        }
    }

    pub fn budget(&self) -> u64 {
        match self {
            MediaDetails::Movie(m) => clamp_amount(m.budget),
            MediaDetails::Series(_) => 0,
        }
    }

    pub fn revenue(&self) -> u64 {
        match self {
            MediaDetails::Movie(m) => clamp_amount(m.revenue),
            MediaDetails::Series(_) => 0,
        }
    }
}

fn clamp_amount(value: Option<i64>) -> u64 {
    value.unwrap_or(0).max(0) as u64
}

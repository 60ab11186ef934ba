//! Catalog data model.
//!
//! A [`Catalog`] is three ordered lists of [`MovieRecord`]s, newest first.
//! The JSON shape produced here is the on-disk format and the payload the
//! UI layer consumes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::tmdb::MediaKind;

// =============================================================================
// List names
// =============================================================================

/// One of the three watch-status buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListName {
    #[serde(rename = "watched")]
    Watched,
    #[serde(rename = "watching")]
    Watching,
    #[serde(rename = "wantToWatch")]
    WantToWatch,
}

impl ListName {
    pub const ALL: [ListName; 3] = [ListName::Watched, ListName::Watching, ListName::WantToWatch];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListName::Watched => "watched",
            ListName::Watching => "watching",
            ListName::WantToWatch => "wantToWatch",
        }
    }
}

impl fmt::Display for ListName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watched" => Ok(ListName::Watched),
            "watching" => Ok(ListName::Watching),
            "wantToWatch" | "want-to-watch" | "want_to_watch" => Ok(ListName::WantToWatch),
            other => Err(format!("Unknown list: {}", other)),
        }
    }
}

// =============================================================================
// Records
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Lightweight pointer to a related title, used for cross-linking only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub media_type: Option<MediaKind>,
}

/// A canonical, enriched catalog entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(deserialize_with = "text_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u64>,
    #[serde(default)]
    pub media_type: Option<MediaKind>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub title: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub year: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub director: String,
    #[serde(default, rename = "actors_string", deserialize_with = "text_or_number")]
    pub cast_summary: String,
    #[serde(default, rename = "actors", deserialize_with = "cast_or_legacy_string")]
    pub cast: Vec<CastMember>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub plot: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub tagline: String,
    #[serde(default, rename = "tagline_en", deserialize_with = "text_or_number")]
    pub tagline_alternate: String,
    #[serde(default, deserialize_with = "number_or_text")]
    pub rating: f64,
    #[serde(default)]
    pub budget: u64,
    #[serde(default)]
    pub revenue: u64,
    #[serde(default)]
    pub posters: Vec<String>,
    #[serde(default)]
    pub stills: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,

    /// Fields written by newer versions, kept so a save doesn't drop them.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Spreadsheet converters wrote cell values as they came, so a title like
/// `1917` or a year like `2010.0` can be a JSON number.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text),
        Some(Value::Number(number)) => Ok(match number.as_f64() {
            Some(value) if number.is_f64() && value.fract() == 0.0 && value.abs() < 1e15 => {
                format!("{}", value as i64)
            }
            _ => number.to_string(),
        }),
        Some(Value::Bool(flag)) => Ok(flag.to_string()),
        Some(other) => Err(D::Error::custom(format!(
            "expected text, found {}",
            other
        ))),
    }
}

/// Ratings typed into a spreadsheet may be text; blank means unrated.
fn number_or_text<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(number)) => Ok(number.as_f64().unwrap_or_default()),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(0.0),
        Some(Value::String(text)) => text
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected a rating, found {:?}", text))),
        Some(other) => Err(D::Error::custom(format!(
            "expected a rating, found {}",
            other
        ))),
    }
}

/// Early spreadsheet-only files stored `actors` as a plain string.
fn cast_or_legacy_string<'de, D>(deserializer: D) -> Result<Vec<CastMember>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CastField {
        List(Vec<CastMember>),
        Legacy(String),
        Missing(()),
    }

    Ok(match CastField::deserialize(deserializer)? {
        CastField::List(cast) => cast,
        CastField::Legacy(names) => names
            .split([',', '/', '、'])
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| CastMember {
                name: name.to_string(),
                ..Default::default()
            })
            .collect(),
        CastField::Missing(_) => Vec::new(),
    })
}

/// The pair that identifies a title at the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProviderIdentity {
    pub tmdb_id: u64,
    pub media_type: MediaKind,
}

impl fmt::Display for ProviderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type, self.tmdb_id)
    }
}

impl MovieRecord {
    /// Record id for an entry of `list` backed by `identity`.
    ///
    /// Movies keep the plain `{list}-{tmdb_id}` form older files use; series
    /// carry their kind (`{list}-tv-{tmdb_id}`) since TMDB numbers movies and
    /// series independently.
    pub fn make_id(list: ListName, identity: ProviderIdentity) -> String {
        match identity.media_type {
            MediaKind::Movie => format!("{}-{}", list, identity.tmdb_id),
            MediaKind::Series => format!("{}-{}-{}", list, identity.media_type, identity.tmdb_id),
        }
    }

    /// Provider identity of this record, if it has one.
    ///
    /// Older files don't carry `tmdb_id`; for those the id's numeric suffix
    /// is used, but only when the record also knows its media type.
    pub fn provider_identity(&self) -> Option<ProviderIdentity> {
        let media_type = self.media_type?;
        let tmdb_id = self.tmdb_id.or_else(|| {
            self.id
                .rsplit('-')
                .next()
                .and_then(|suffix| suffix.parse::<u64>().ok())
        })?;
        Some(ProviderIdentity {
            tmdb_id,
            media_type,
        })
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// The whole catalog: three lists, index 0 is the most recently added.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub watched: Vec<MovieRecord>,
    #[serde(default)]
    pub watching: Vec<MovieRecord>,
    #[serde(default, rename = "wantToWatch")]
    pub want_to_watch: Vec<MovieRecord>,
}

impl Catalog {
    pub fn list(&self, list: ListName) -> &[MovieRecord] {
        match list {
            ListName::Watched => &self.watched,
            ListName::Watching => &self.watching,
            ListName::WantToWatch => &self.want_to_watch,
        }
    }

    pub(crate) fn list_mut(&mut self, list: ListName) -> &mut Vec<MovieRecord> {
        match list {
            ListName::Watched => &mut self.watched,
            ListName::Watching => &mut self.watching,
            ListName::WantToWatch => &mut self.want_to_watch,
        }
    }

    /// All records of all lists, tagged with the list they live in.
    pub fn iter(&self) -> impl Iterator<Item = (ListName, &MovieRecord)> {
        ListName::ALL
            .into_iter()
            .flat_map(move |list| self.list(list).iter().map(move |record| (list, record)))
    }

    pub fn len(&self) -> usize {
        self.watched.len() + self.watching.len() + self.want_to_watch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, list: ListName, id: &str) -> Option<&MovieRecord> {
        self.list(list).iter().find(|record| record.id == id)
    }

    /// Looks for a provider identity across all three lists.
    pub fn find_by_provider_id(
        &self,
        identity: ProviderIdentity,
    ) -> Option<(ListName, &MovieRecord)> {
        self.iter()
            .find(|(_, record)| record.provider_identity() == Some(identity))
    }

    pub fn exists_by_provider_id(&self, identity: ProviderIdentity) -> bool {
        self.find_by_provider_id(identity).is_some()
    }

    /// Every provider identity already present in the catalog.
    pub fn claimed_identities(&self) -> HashSet<ProviderIdentity> {
        self.iter()
            .filter_map(|(_, record)| record.provider_identity())
            .collect()
    }

    /// Inserts at the front of `list`. Callers check for duplicates first.
    pub fn insert(&mut self, list: ListName, record: MovieRecord) {
        self.list_mut(list).insert(0, record);
    }

    /// Removes the record with `id` from `list`. Returns false when there was
    /// nothing to remove.
    pub fn remove_by_id(&mut self, list: ListName, id: &str) -> bool {
        let records = self.list_mut(list);
        match records.iter().position(|record| record.id == id) {
            Some(index) => {
                records.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.watched.clear();
        self.watching.clear();
        self.want_to_watch.clear();
    }
}

//! Catalog persistence.
//!
//! [`CatalogStore`] implementations only know how to load and save a whole
//! [`Catalog`]. [`SharedCatalog`] serializes every load-mutate-save sequence
//! behind a single lock so concurrent requests can't lose each other's
//! updates.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::models::{Catalog, ListName, MovieRecord};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("\"{title}\" is already in the catalog")]
    Duplicate { title: String },

    #[error("No record {id} in list {list}")]
    NotFound { list: ListName, id: String },

    #[error("Catalog storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub trait CatalogStore: Send + Sync {
    /// Loads the whole catalog. A missing or unreadable catalog is an empty
    /// one and records that don't decode are left out; only I/O failures that
    /// leave the state unknown are errors.
    fn load(&self) -> Result<Catalog>;

    fn save(&self, catalog: &Catalog) -> Result<()>;
}

impl<T: CatalogStore + ?Sized> CatalogStore for std::sync::Arc<T> {
    fn load(&self) -> Result<Catalog> {
        (**self).load()
    }

    fn save(&self, catalog: &Catalog) -> Result<()> {
        (**self).save(catalog)
    }
}

// =============================================================================
// JSON file
// =============================================================================

pub struct JsonFileCatalogStore {
    path: PathBuf,
}

impl JsonFileCatalogStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where a file that didn't fully decode is copied before it can be
    /// overwritten: `movies.json` -> `movies.json.corrupt`.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    fn back_up(&self) -> Result<()> {
        let backup = self.backup_path();
        std::fs::copy(&self.path, &backup)
            .with_context(|| format!("Failed to copy {:?} to {:?}", self.path, backup))?;
        warn!("Kept the original catalog file at {:?}", backup);
        Ok(())
    }
}

/// Decodes a catalog file one record at a time. Returns the records that
/// decoded and how many were dropped.
fn decode_catalog(content: &str) -> serde_json::Result<(Catalog, usize)> {
    let mut lists: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;
    let mut catalog = Catalog::default();
    let mut skipped = 0;

    for list in ListName::ALL {
        let records = match lists.remove(list.as_str()) {
            None | Some(serde_json::Value::Null) => continue,
            Some(serde_json::Value::Array(records)) => records,
            Some(other) => {
                warn!("List {} is not an array, ignoring it: {}", list, other);
                skipped += 1;
                continue;
            }
        };
        for (index, value) in records.into_iter().enumerate() {
            match serde_json::from_value::<MovieRecord>(value) {
                Ok(record) => catalog.list_mut(list).push(record),
                Err(err) => {
                    warn!("Skipping record #{} of {}: {}", index, list, err);
                    skipped += 1;
                }
            }
        }
    }

    Ok((catalog, skipped))
}

impl CatalogStore for JsonFileCatalogStore {
    fn load(&self) -> Result<Catalog> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No catalog at {:?}, starting empty", self.path);
                return Ok(Catalog::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {:?}", self.path))
            }
        };

        if content.trim().is_empty() {
            return Ok(Catalog::default());
        }

        match decode_catalog(&content) {
            Ok((catalog, 0)) => Ok(catalog),
            Ok((catalog, skipped)) => {
                warn!(
                    "Catalog file {:?} has {} unreadable records, loaded the other {}",
                    self.path,
                    skipped,
                    catalog.len()
                );
                self.back_up()?;
                Ok(catalog)
            }
            Err(err) => {
                warn!(
                    "Catalog file {:?} is not valid ({}), starting with an empty catalog",
                    self.path, err
                );
                self.back_up()?;
                Ok(Catalog::default())
            }
        }
    }

    fn save(&self, catalog: &Catalog) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let json = serde_json::to_vec_pretty(catalog).context("Failed to serialize catalog")?;

        let mut temp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {:?}", dir))?;
        temp.write_all(&json)
            .context("Failed to write catalog temp file")?;
        temp.as_file()
            .sync_all()
            .context("Failed to flush catalog temp file")?;
        temp.persist(&self.path)
            .with_context(|| format!("Failed to replace {:?}", self.path))?;

        debug!("Saved {} records to {:?}", catalog.len(), self.path);
        Ok(())
    }
}

// =============================================================================
// In memory
// =============================================================================

/// Keeps the catalog in memory only. Used by ephemeral runs and tests.
#[derive(Default)]
pub struct InMemoryCatalogStore {
    catalog: StdMutex<Catalog>,
    saves: StdMutex<usize>,
}

impl InMemoryCatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: StdMutex::new(catalog),
            saves: StdMutex::new(0),
        }
    }

    /// How many times `save` was called.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|saves| *saves).unwrap_or_default()
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn load(&self) -> Result<Catalog> {
        let catalog = self
            .catalog
            .lock()
            .map_err(|_| anyhow::anyhow!("In-memory catalog lock poisoned"))?;
        Ok(catalog.clone())
    }

    fn save(&self, catalog: &Catalog) -> Result<()> {
        *self
            .catalog
            .lock()
            .map_err(|_| anyhow::anyhow!("In-memory catalog lock poisoned"))? = catalog.clone();
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}

// =============================================================================
// Shared access
// =============================================================================

/// The one place catalog state is read and written from request handlers.
pub struct SharedCatalog {
    store: Mutex<Box<dyn CatalogStore>>,
}

impl SharedCatalog {
    pub fn new(store: Box<dyn CatalogStore>) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Current catalog contents.
    pub async fn snapshot(&self) -> Result<Catalog, CatalogError> {
        let store = self.store.lock().await;
        Ok(store.load()?)
    }

    /// Runs `f` on a freshly loaded catalog while holding the lock, and saves
    /// the result if `f` succeeds. Nothing is written when `f` fails.
    pub async fn mutate<T, F>(&self, f: F) -> Result<T, CatalogError>
    where
        F: FnOnce(&mut Catalog) -> Result<T, CatalogError>,
    {
        let store = self.store.lock().await;
        let mut catalog = store.load()?;
        let value = f(&mut catalog)?;
        store.save(&catalog)?;
        Ok(value)
    }

    /// Empties all three lists.
    pub async fn clear(&self) -> Result<(), CatalogError> {
        let removed = self
            .mutate(|catalog| {
                let removed = catalog.len();
                catalog.clear();
                Ok(removed)
            })
            .await?;
        info!("Cleared catalog ({} records removed)", removed);
        Ok(())
    }
}

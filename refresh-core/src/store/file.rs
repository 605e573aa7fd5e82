//! JSON-on-disk implementations of the persistence collaborators.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::{fs, sync::Mutex};

use super::{DaySummaryCache, FavoritesStore};
use crate::{
    error::StoreError,
    model::{DaySummary, FavoriteLocation},
};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `contents` next to `path` and rename it into place, so readers see
/// either the old file or the new one.
async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp = path.with_extension(format!("tmp.{}.{seq}", std::process::id()));

    fs::write(&tmp, contents).await?;
    if let Err(err) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}

/// Favorites kept as a JSON array in a single file.
#[derive(Debug)]
pub struct FileFavoritesStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileFavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<FavoriteLocation>, StoreError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents)
            .map_err(|e| StoreError::Corrupt { path: self.path.clone(), message: e.to_string() })
    }

    async fn store(&self, favorites: &[FavoriteLocation]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(favorites)
            .map_err(|e| StoreError::Corrupt { path: self.path.clone(), message: e.to_string() })?;
        write_atomic(&self.path, &json).await
    }

    /// Append a favorite. Duplicates are allowed; they belong to different users.
    pub async fn add(&self, favorite: FavoriteLocation) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut favorites = self.load().await?;
        favorites.push(favorite);
        self.store(&favorites).await
    }

    /// Remove every favorite with the given name. Returns how many were removed.
    pub async fn remove(&self, location_name: &str) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut favorites = self.load().await?;
        let before = favorites.len();
        favorites.retain(|f| f.location_name != location_name);
        let removed = before - favorites.len();

        if removed > 0 {
            self.store(&favorites).await?;
        }
        Ok(removed)
    }
}

#[async_trait]
impl FavoritesStore for FileFavoritesStore {
    async fn list_all(&self) -> Result<Vec<FavoriteLocation>, StoreError> {
        self.load().await
    }
}

/// One JSON file per `(latitude, longitude, date)` under a directory.
#[derive(Debug)]
pub struct FileDaySummaryCache {
    dir: PathBuf,
}

impl FileDaySummaryCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, lat: f64, lon: f64, date: &str) -> Result<PathBuf, StoreError> {
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(StoreError::InvalidKey(format!("date '{date}' is not YYYY-MM-DD")));
        }
        if !lat.is_finite() || !lon.is_finite() {
            return Err(StoreError::InvalidKey(format!("non-finite coordinate {lat},{lon}")));
        }

        // Adding 0.0 turns -0.0 into 0.0.
        let (lat, lon) = (lat + 0.0, lon + 0.0);
        Ok(self.dir.join(format!("{lat}_{lon}_{date}.json")))
    }
}

#[async_trait]
impl DaySummaryCache for FileDaySummaryCache {
    async fn get(&self, lat: f64, lon: f64, date: &str) -> Result<Option<DaySummary>, StoreError> {
        let path = self.entry_path(lat, lon, date)?;

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let summary = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Corrupt { path, message: e.to_string() })?;
        Ok(Some(summary))
    }

    async fn put(&self, lat: f64, lon: f64, date: &str, summary: DaySummary) -> Result<(), StoreError> {
        let path = self.entry_path(lat, lon, date)?;
        let json = serde_json::to_vec(&summary)
            .map_err(|e| StoreError::Corrupt { path: path.clone(), message: e.to_string() })?;
        write_atomic(&path, &json).await
    }
}

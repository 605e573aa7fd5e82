use std::{collections::HashMap, fmt::Debug};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    model::{DaySummary, FavoriteLocation},
};

pub mod file;

pub use file::{FileDaySummaryCache, FileFavoritesStore};

/// Source of every persisted favorite, across all users.
#[async_trait]
pub trait FavoritesStore: Send + Sync + Debug {
    async fn list_all(&self) -> Result<Vec<FavoriteLocation>, StoreError>;
}

/// Day summaries keyed by `(latitude, longitude, date)`.
#[async_trait]
pub trait DaySummaryCache: Send + Sync + Debug {
    async fn get(&self, lat: f64, lon: f64, date: &str) -> Result<Option<DaySummary>, StoreError>;

    /// Insert or overwrite. Writing the same key twice is harmless.
    async fn put(&self, lat: f64, lon: f64, date: &str, summary: DaySummary) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryFavoritesStore {
    favorites: RwLock<Vec<FavoriteLocation>>,
}

impl MemoryFavoritesStore {
    pub fn new(favorites: Vec<FavoriteLocation>) -> Self {
        Self { favorites: RwLock::new(favorites) }
    }

    pub async fn push(&self, favorite: FavoriteLocation) {
        self.favorites.write().await.push(favorite);
    }
}

#[async_trait]
impl FavoritesStore for MemoryFavoritesStore {
    async fn list_all(&self) -> Result<Vec<FavoriteLocation>, StoreError> {
        Ok(self.favorites.read().await.clone())
    }
}

type MemoryKey = (u64, u64, String);

fn memory_key(lat: f64, lon: f64, date: &str) -> MemoryKey {
    // 0.0 and -0.0 compare equal and must hit the same entry.
    let bits = |v: f64| if v == 0.0 { 0f64.to_bits() } else { v.to_bits() };
    (bits(lat), bits(lon), date.to_string())
}

#[derive(Debug, Default)]
pub struct MemoryDaySummaryCache {
    entries: RwLock<HashMap<MemoryKey, DaySummary>>,
}

impl MemoryDaySummaryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DaySummaryCache for MemoryDaySummaryCache {
    async fn get(&self, lat: f64, lon: f64, date: &str) -> Result<Option<DaySummary>, StoreError> {
        Ok(self.entries.read().await.get(&memory_key(lat, lon, date)).cloned())
    }

    async fn put(&self, lat: f64, lon: f64, date: &str, summary: DaySummary) -> Result<(), StoreError> {
        self.entries.write().await.insert(memory_key(lat, lon, date), summary);
        Ok(())
    }
}

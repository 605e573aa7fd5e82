//! Core library for the `weather-refresh` favorites cache refresher.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstractions over the favorites store, the day-summary cache and
//!   weather providers, with file-backed and in-memory implementations
//! - The [`FavoritesRefreshJob`] that keeps yesterday's day summaries cached
//!   for every favorite location
//!
//! It is used by `refresh-cli`, but can also be embedded in other binaries or services.

pub mod config;
pub mod error;
pub mod job;
pub mod model;
pub mod provider;
pub mod store;

pub use config::{Config, ProviderConfig, ServerConfig, StorageConfig};
pub use error::{LocationError, RefreshError, StoreError, UpstreamError};
pub use job::FavoritesRefreshJob;
pub use model::{
    DaySummary, FavoriteLocation, LocationOutcome, OutcomeStatus, RefreshOutcome, RunReport,
    RunResult,
};
pub use provider::{ProviderId, WeatherProvider};
pub use store::{
    DaySummaryCache, FavoritesStore, FileDaySummaryCache, FileFavoritesStore,
    MemoryDaySummaryCache, MemoryFavoritesStore,
};

//! Batch refresh of yesterday's day summaries for every favorite location.
//!
//! A run lists all favorites, collapses records sharing a coordinate, and
//! for each unique coordinate makes sure a day summary for the reference
//! date is cached, fetching it from the provider on a miss. Locations are
//! processed concurrently and each one's failure stays local to its entry
//! in the report. Only failing to list the favorites aborts the run.

use std::{collections::HashSet, sync::Arc};

use chrono::Local;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::{
    error::{LocationError, RefreshError},
    model::{DaySummary, FavoriteLocation, LocationOutcome, RefreshOutcome, RunResult, reference_date},
    provider::WeatherProvider,
    store::{DaySummaryCache, FavoritesStore},
};

#[derive(Debug, Clone)]
pub struct FavoritesRefreshJob {
    favorites: Arc<dyn FavoritesStore>,
    cache: Arc<dyn DaySummaryCache>,
    provider: Arc<dyn WeatherProvider>,
}

impl FavoritesRefreshJob {
    pub fn new(
        favorites: Arc<dyn FavoritesStore>,
        cache: Arc<dyn DaySummaryCache>,
        provider: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self { favorites, cache, provider }
    }

    /// Refresh using yesterday (local clock) as the reference date.
    pub async fn run(&self) -> Result<RefreshOutcome, RefreshError> {
        let date = reference_date(&Local::now());
        self.run_for_date(&date).await
    }

    /// Refresh every unique favorite for `date`. The same date is used for
    /// every location, however long the run takes.
    #[tracing::instrument(name = "refresh_favorites", skip(self))]
    pub async fn run_for_date(&self, date: &str) -> Result<RefreshOutcome, RefreshError> {
        let favorites = self.favorites.list_all().await.map_err(RefreshError::FavoritesUnavailable)?;

        if favorites.is_empty() {
            info!("No favorite locations found, nothing to refresh");
            return Ok(RefreshOutcome::NoFavorites);
        }

        let stored = favorites.len();
        let unique = dedupe(favorites);
        info!(stored, unique = unique.len(), "Refreshing day summaries for favorite locations");

        // join_all polls every future concurrently and returns outputs in input order.
        let details = join_all(unique.iter().map(|fav| self.refresh_location(fav, date))).await;
        let result = RunResult::from_outcomes(details);

        info!(
            total = result.total,
            successes = result.successes,
            errors = result.errors,
            "Favorites refresh finished"
        );

        Ok(RefreshOutcome::Completed(result))
    }

    async fn refresh_location(&self, favorite: &FavoriteLocation, date: &str) -> LocationOutcome {
        match self.ensure_day_summary(favorite, date).await {
            Ok(data) => LocationOutcome::success(&favorite.location_name, data),
            Err(err) => {
                warn!(location = %favorite.location_name, error = %err, "Failed to refresh day summary");
                LocationOutcome::error(&favorite.location_name, err)
            }
        }
    }

    async fn ensure_day_summary(
        &self,
        favorite: &FavoriteLocation,
        date: &str,
    ) -> Result<DaySummary, LocationError> {
        let (lat, lon) = favorite.coordinates()?;

        if let Some(cached) = self.cache.get(lat, lon, date).await? {
            debug!(location = %favorite.location_name, "Day summary already cached");
            return Ok(cached);
        }

        let summary = self.provider.fetch_day_summary(lat, lon, date).await?;
        debug!(location = %favorite.location_name, "Fetched day summary from provider");

        // A failed write does not demote the location: the fetch succeeded.
        if let Err(err) = self.cache.put(lat, lon, date, summary.clone()).await {
            warn!(location = %favorite.location_name, error = %err, "Fetched day summary but failed to cache it");
        }

        Ok(summary)
    }
}

/// Keep the first record seen for each `(latitude, longitude)`.
pub fn dedupe(favorites: Vec<FavoriteLocation>) -> Vec<FavoriteLocation> {
    let mut seen = HashSet::new();
    favorites.into_iter().filter(|fav| seen.insert(fav.key())).collect()
}

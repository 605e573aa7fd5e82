use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode};
use refresh_core::{
    Config, FavoriteLocation, FavoritesRefreshJob, FileDaySummaryCache, FileFavoritesStore,
    OutcomeStatus, ProviderId, RunReport, provider::default_provider_from_config,
};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-refresh",
    version,
    about = "Keeps yesterday's weather cached for every favorite location"
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Refresh the cache for all favorites once and print the report.
    Run {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Serve the refresh trigger over HTTP.
    Serve {
        /// Address to listen on; defaults to the configured one.
        #[arg(long)]
        bind: Option<String>,

        /// Also trigger a refresh every N minutes.
        #[arg(long, value_name = "MINUTES")]
        every: Option<u64>,
    },

    /// Manage stored favorite locations.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    /// List stored favorites.
    List,

    /// Store a favorite location.
    Add {
        /// Display name.
        name: String,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Remove every favorite with this name.
    Remove { name: String },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config_path = self.config.as_deref();
        let mut config = load_config(config_path)?;

        match self.command {
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;
                configure(&mut config, id)?;
                let saved_to = save_config(&config, config_path)?;
                println!("Saved configuration to {}", saved_to.display());
            }
            Command::Run { json } => {
                let job = build_job(&config)?;
                let report = job.run().await.context("Favorites refresh failed")?.into_report();
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print_report(&report);
                }
            }
            Command::Serve { bind, every } => {
                let job = Arc::new(build_job(&config)?);
                let bind = bind.unwrap_or_else(|| config.bind_addr().to_string());
                let every = every.map(|minutes| Duration::from_secs(minutes.max(1) * 60));
                server::serve(job, &bind, every).await?;
            }
            Command::Favorites { action } => {
                let store = FileFavoritesStore::new(config.favorites_path()?);
                favorites(&store, action).await?;
            }
        }

        Ok(())
    }
}

/// An explicit `--config` path, or the platform default.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Returns the path written to.
fn save_config(config: &Config, path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => {
            config.save_to(path)?;
            Ok(path.to_path_buf())
        }
        None => {
            config.save()?;
            Config::config_file_path()
        }
    }
}

/// Wire the file-backed stores and the configured provider into a job.
pub fn build_job(config: &Config) -> Result<FavoritesRefreshJob> {
    let provider = default_provider_from_config(config)?;
    let favorites = FileFavoritesStore::new(config.favorites_path()?);
    let cache = FileDaySummaryCache::new(config.day_summary_dir()?);

    Ok(FavoritesRefreshJob::new(Arc::new(favorites), Arc::new(cache), Arc::from(provider)))
}

fn configure(config: &mut Config, id: ProviderId) -> Result<()> {
    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.upsert_provider_api_key(id, api_key.trim().to_string());

    if config.default_provider.as_deref() != Some(id.as_str()) {
        let make_default = Confirm::new(&format!("Use {id} as the default provider?"))
            .with_default(true)
            .prompt()
            .context("Failed to read answer")?;
        if make_default {
            config.set_default_provider(id);
        }
    }

    Ok(())
}

async fn favorites(store: &FileFavoritesStore, action: FavoritesAction) -> Result<()> {
    use refresh_core::FavoritesStore;

    match action {
        FavoritesAction::List => {
            let all = store.list_all().await?;
            if all.is_empty() {
                println!("No favorites stored in {}", store.path().display());
            }
            for fav in all {
                println!("{}", format_favorite(&fav));
            }
        }
        FavoritesAction::Add { name, lat, lon } => {
            let fav = FavoriteLocation::new(lat, lon, name);
            fav.coordinates()?;
            store.add(fav.clone()).await?;
            println!("Added {}", format_favorite(&fav));
        }
        FavoritesAction::Remove { name } => {
            let removed = store.remove(&name).await?;
            println!("Removed {removed} favorite(s) named '{name}'");
        }
    }

    Ok(())
}

fn format_favorite(fav: &FavoriteLocation) -> String {
    let coord = |v: Option<f64>| v.map_or_else(|| "?".to_string(), |v| format!("{v:.4}"));
    format!("{:<24} {:>10} {:>10}", fav.location_name, coord(fav.latitude), coord(fav.longitude))
}

fn print_report(report: &RunReport) {
    let summary = &report.summary;
    println!(
        "{}: {} location(s), {} succeeded, {} failed",
        report.message, summary.total, summary.successes, summary.errors
    );

    for detail in &summary.details {
        match &detail.status {
            OutcomeStatus::Success { .. } => println!("  ok     {}", detail.location),
            OutcomeStatus::Error { error } => println!("  error  {}: {error}", detail.location),
        }
    }
}

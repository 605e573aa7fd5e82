//! HTTP trigger for the refresh job, plus an optional interval trigger.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use refresh_core::FavoritesRefreshJob;
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{error, info};

pub const REFRESH_PATH: &str = "/cron/refresh-favorites";

#[derive(Debug, Serialize)]
struct FailureBody {
    message: &'static str,
    error: String,
}

pub fn router(job: Arc<FavoritesRefreshJob>) -> Router {
    Router::new()
        .route(REFRESH_PATH, get(refresh_favorites).post(refresh_favorites))
        .with_state(job)
}

async fn refresh_favorites(State(job): State<Arc<FavoritesRefreshJob>>) -> Response {
    match job.run().await {
        Ok(outcome) => (StatusCode::OK, Json(outcome.into_report())).into_response(),
        Err(err) => {
            error!(error = %err, "Favorites refresh could not start");
            let body = FailureBody { message: "Favorites refresh failed", error: err.to_string() };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// Trigger the job every `period`. Runs are not serialized against HTTP
/// triggers; overlapping runs only repeat idempotent cache writes.
fn spawn_interval(job: Arc<FavoritesRefreshJob>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match job.run().await {
                Ok(outcome) => {
                    let report = outcome.into_report();
                    info!(
                        total = report.summary.total,
                        errors = report.summary.errors,
                        "Scheduled refresh done"
                    );
                }
                Err(err) => error!(error = %err, "Scheduled refresh could not start"),
            }
        }
    });
}

pub async fn serve(job: Arc<FavoritesRefreshJob>, bind: &str, every: Option<Duration>) -> Result<()> {
    if let Some(period) = every {
        info!(minutes = period.as_secs() / 60, "Scheduling periodic refresh");
        spawn_interval(job.clone(), period);
    }

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!("Refresh trigger listening on http://{bind}{REFRESH_PATH}");

    axum::serve(listener, router(job))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

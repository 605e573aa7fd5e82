//! Provider tests against a mock HTTP server.

use std::sync::Arc;

use refresh_core::{
    Config, DaySummary, DaySummaryCache, FavoriteLocation, FavoritesRefreshJob,
    MemoryDaySummaryCache, MemoryFavoritesStore, ProviderId, RefreshOutcome, WeatherProvider,
    provider::{
        openweather::OpenWeatherProvider, provider_from_config, weatherapi::WeatherApiProvider,
    },
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn day_summary_body() -> serde_json::Value {
    serde_json::json!({
        "lat": 40.71,
        "lon": -74.0,
        "date": "2024-05-01",
        "precipitation": { "total": 2.5 },
        "temperature": { "min": 11.2, "max": 19.8 }
    })
}

#[tokio::test]
async fn openweather_day_summary_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall/day_summary"))
        .and(query_param("lat", "40.71"))
        .and(query_param("lon", "-74"))
        .and(query_param("date", "2024-05-01"))
        .and(query_param("appid", "KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(day_summary_body()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenWeatherProvider::with_base_url("KEY".into(), server.uri());
    let summary = provider.fetch_day_summary(40.71, -74.0, "2024-05-01").await.unwrap();

    assert_eq!(summary, DaySummary(day_summary_body()));
}

#[tokio::test]
async fn openweather_non_success_carries_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall/day_summary"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"cod":401,"message":"Invalid API key"}"#),
        )
        .mount(&server)
        .await;

    let provider = OpenWeatherProvider::with_base_url("BAD".into(), server.uri());
    let err = provider.fetch_day_summary(1.0, 1.0, "2024-05-01").await.unwrap_err();

    assert_eq!(err.status, Some(401));
    assert!(err.message.contains("Invalid API key"));
}

#[tokio::test]
async fn openweather_invalid_json_is_an_error_without_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall/day_summary"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let provider = OpenWeatherProvider::with_base_url("KEY".into(), server.uri());
    let err = provider.fetch_day_summary(1.0, 1.0, "2024-05-01").await.unwrap_err();

    assert_eq!(err.status, None);
    assert!(err.message.contains("parse"));
}

#[tokio::test]
async fn weatherapi_history_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/history.json"))
        .and(query_param("key", "WKEY"))
        .and(query_param("q", "48.85,2.35"))
        .and(query_param("dt", "2024-05-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(day_summary_body()))
        .mount(&server)
        .await;

    let provider = WeatherApiProvider::with_base_url("WKEY".into(), server.uri());
    let summary = provider.fetch_day_summary(48.85, 2.35, "2024-05-01").await.unwrap();

    assert_eq!(summary.0["precipitation"]["total"], 2.5);
}

#[tokio::test]
async fn weatherapi_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/history.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let provider = WeatherApiProvider::with_base_url("WKEY".into(), server.uri());
    let err = provider.fetch_day_summary(1.0, 1.0, "2024-05-01").await.unwrap_err();

    assert_eq!(err.status, Some(500));
}

#[tokio::test]
async fn provider_from_config_honors_base_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall/day_summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(day_summary_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".into());
    config.providers.get_mut("openweather").unwrap().base_url = Some(server.uri());

    let provider = provider_from_config(ProviderId::OpenWeather, &config).unwrap();
    assert!(provider.fetch_day_summary(40.71, -74.0, "2024-05-01").await.is_ok());
}

#[tokio::test]
async fn job_fetches_misses_once_and_caches_them() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall/day_summary"))
        .and(query_param("lat", "40.71"))
        .respond_with(ResponseTemplate::new(200).set_body_json(day_summary_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall/day_summary"))
        .and(query_param("lat", "51.5"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryDaySummaryCache::new());
    let job = FavoritesRefreshJob::new(
        Arc::new(MemoryFavoritesStore::new(vec![
            FavoriteLocation::new(40.71, -74.0, "NYC"),
            FavoriteLocation::new(51.5, -0.12, "London"),
            FavoriteLocation::new(40.71, -74.0, "New York"),
        ])),
        cache.clone(),
        Arc::new(OpenWeatherProvider::with_base_url("KEY".into(), server.uri())),
    );

    let first = match job.run_for_date("2024-05-01").await.unwrap() {
        RefreshOutcome::Completed(result) => result,
        RefreshOutcome::NoFavorites => panic!("favorites were configured"),
    };
    assert_eq!((first.total, first.successes, first.errors), (2, 1, 1));
    assert_eq!(first.details[0].location, "NYC");
    assert_eq!(first.details[1].location, "London");
    assert!(cache.get(40.71, -74.0, "2024-05-01").await.unwrap().is_some());

    // NYC now comes from the cache; the mock's expect(1) verifies no second fetch.
    let second = job.run_for_date("2024-05-01").await.unwrap().into_report();
    assert_eq!(second.summary.details[0], first.details[0]);

    let json = serde_json::to_value(&second).unwrap();
    assert_eq!(json["message"], "Favorites weather refresh completed");
    assert_eq!(json["summary"]["details"][1]["status"], "error");
}

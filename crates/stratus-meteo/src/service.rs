//! Forecast orchestration: fetch all models, aggregate, cache.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use stratus_core::Config;
use stratus_ensemble::{aggregate, compare, ComparisonTable, EnsembleForecast, WeightTable};

use crate::cache::ForecastCache;
use crate::client::MeteoClient;
use crate::error::MeteoError;

/// The user-facing forecast surface: fans out per-model fetches,
/// merges them through the ensemble engine, and serves repeat requests
/// for the same spot from a short-TTL cache.
pub struct ForecastService {
    client: MeteoClient,
    cache: ForecastCache,
    weights: WeightTable,
}

impl ForecastService {
    /// Build the service from application configuration.
    ///
    /// # Errors
    ///
    /// [`MeteoError::Network`] when the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, MeteoError> {
        Ok(Self::new(
            MeteoClient::new(&config.meteo)?,
            config.meteo.weight_table(),
            Duration::from_secs(config.cache.ttl_minutes * 60),
        ))
    }

    pub fn new(client: MeteoClient, weights: WeightTable, cache_ttl: Duration) -> Self {
        Self {
            client,
            cache: ForecastCache::new(cache_ttl),
            weights,
        }
    }

    /// Merged ensemble forecast for a location.
    ///
    /// Models and the air-quality reading are fetched concurrently; the
    /// reading is optional and its absence never blocks the forecast.
    ///
    /// # Errors
    ///
    /// [`MeteoError::NoData`] when not a single model responded; the
    /// presentation layer shows a clean failure instead of a fabricated
    /// forecast.
    #[instrument(skip(self))]
    pub async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Arc<EnsembleForecast>, MeteoError> {
        if let Some(cached) = self.cache.get(latitude, longitude) {
            tracing::debug!("Serving cached forecast");
            return Ok(cached);
        }

        let (models, air_quality) = tokio::join!(
            self.client.fetch_all_models(latitude, longitude),
            self.client.fetch_air_quality(latitude, longitude),
        );

        if models.is_empty() {
            return Err(MeteoError::NoData);
        }

        let forecast = aggregate(&models, &self.weights, air_quality.as_ref())?;
        tracing::info!(
            models = models.len(),
            hourly = forecast.hourly.len(),
            daily = forecast.daily.len(),
            condition = forecast.current.condition().description(),
            "Built ensemble forecast"
        );

        Ok(self.cache.insert(latitude, longitude, forecast))
    }

    /// Side-by-side raw model predictions at an hour offset, plus the
    /// ensemble value for the same slot. Not cached: comparison views
    /// are ad hoc.
    ///
    /// # Errors
    ///
    /// [`MeteoError::NoData`] when not a single model responded.
    #[instrument(skip(self))]
    pub async fn comparison(
        &self,
        latitude: f64,
        longitude: f64,
        hour_offset: usize,
    ) -> Result<ComparisonTable, MeteoError> {
        let models = self.client.fetch_all_models(latitude, longitude).await;
        if models.is_empty() {
            return Err(MeteoError::NoData);
        }
        Ok(compare(&models, &self.weights, hour_offset)?)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn forecast_body(temp: f64) -> serde_json::Value {
        serde_json::json!({
            "latitude": 47.6,
            "longitude": -122.3,
            "timezone": "America/Los_Angeles",
            "current": {
                "temperature_2m": temp,
                "apparent_temperature": temp - 1.0,
                "relative_humidity_2m": 55.0,
                "precipitation": 0.0,
                "weather_code": 2,
                "wind_speed_10m": 9.0,
                "wind_direction_10m": 200.0
            },
            "hourly": {
                "time": ["2026-03-01T00:00", "2026-03-01T01:00"],
                "temperature_2m": [temp, temp + 1.0],
                "precipitation": [0.0, 0.0],
                "wind_speed_10m": [8.0, 8.5]
            },
            "daily": {
                "time": ["2026-03-01"],
                "temperature_2m_max": [temp + 4.0],
                "temperature_2m_min": [temp - 4.0],
                "sunrise": ["2026-03-01T06:45"],
                "sunset": ["2026-03-01T18:10"]
            }
        })
    }

    async fn mount_model(server: &MockServer, model: &str, temp: f64, expect: u64) {
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("models", model))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(temp)))
            .expect(expect)
            .mount(server)
            .await;
    }

    async fn mount_air_quality(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/air-quality"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current": { "us_aqi": 35 }
            })))
            .mount(server)
            .await;
    }

    fn service(server: &MockServer, models: &[&str], ttl: Duration) -> ForecastService {
        let client = MeteoClient::with_base_url(
            &server.uri(),
            models.iter().map(|m| m.to_string()).collect(),
        );
        ForecastService::new(client, WeightTable::default(), ttl)
    }

    #[tokio::test]
    async fn test_forecast_merges_models_and_attaches_aqi() {
        let server = MockServer::start().await;
        mount_model(&server, "gfs_seamless", 10.0, 1).await;
        mount_model(&server, "icon_seamless", 14.0, 1).await;
        mount_air_quality(&server).await;

        let service = service(&server, &["gfs_seamless", "icon_seamless"], Duration::ZERO);
        let forecast = service.forecast(47.6, -122.3).await.unwrap();

        // Equal production weights: plain mean of the two models.
        assert_eq!(forecast.current.temperature, 12.0);
        assert_eq!(forecast.current.aqi, Some(35));
        assert_eq!(forecast.hourly.len(), 2);
        assert_eq!(forecast.daily.len(), 1);
        assert_eq!(forecast.daily[0].sunrise.as_deref(), Some("2026-03-01T06:45"));
        assert_eq!(forecast.location.timezone, "America/Los_Angeles");
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let server = MockServer::start().await;
        // expect(1): the second service call must not refetch.
        mount_model(&server, "gfs_seamless", 10.0, 1).await;
        mount_air_quality(&server).await;

        let service = service(&server, &["gfs_seamless"], Duration::from_secs(60));
        let first = service.forecast(47.6, -122.3).await.unwrap();
        let second = service.forecast(47.6, -122.3).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_no_models_responding_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/air-quality"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = service(&server, &["gfs_seamless", "icon_seamless"], Duration::ZERO);
        let result = service.forecast(47.6, -122.3).await;

        assert!(matches!(result, Err(MeteoError::NoData)));
    }

    #[tokio::test]
    async fn test_missing_air_quality_does_not_block_forecast() {
        let server = MockServer::start().await;
        mount_model(&server, "gfs_seamless", 10.0, 1).await;
        Mock::given(method("GET"))
            .and(path("/air-quality"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = service(&server, &["gfs_seamless"], Duration::ZERO);
        let forecast = service.forecast(47.6, -122.3).await.unwrap();

        assert_eq!(forecast.current.aqi, None);
    }

    #[tokio::test]
    async fn test_comparison_rows_per_model() {
        let server = MockServer::start().await;
        mount_model(&server, "gfs_seamless", 10.0, 1).await;
        mount_model(&server, "icon_seamless", 14.0, 1).await;

        let service = service(&server, &["gfs_seamless", "icon_seamless"], Duration::ZERO);
        let table = service.comparison(47.6, -122.3, 1).await.unwrap();

        assert_eq!(table.models.len(), 2);
        assert_eq!(table.models[0].model, "gfs_seamless");
        assert_eq!(table.models[0].temperature, Some(11.0));
        assert_eq!(table.models[1].temperature, Some(15.0));
        assert_eq!(table.ensemble.temperature, 13.0);
    }
}

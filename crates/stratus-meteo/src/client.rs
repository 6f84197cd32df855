//! Open-Meteo API client: per-model forecasts and air quality.
//!
//! One pooled HTTP client serves all requests. Individual model
//! failures are logged and skipped so a partial provider outage thins
//! the ensemble instead of failing it; there are no automatic retries,
//! forecasts are ephemeral and the caller simply asks again.

use std::time::Duration;

use futures_util::future::join_all;
use reqwest::Client;
use tracing::instrument;

use stratus_core::MeteoConfig;
use stratus_ensemble::{AirQualityReading, RawModelForecast};

use crate::error::MeteoError;
use crate::types::{AirQualityPayload, ForecastPayload};

const REQUEST_TIMEOUT_SECS: u64 = 30;

// Query parameter sets, comma-joined the way the API expects them.
const HOURLY_PARAMS: &str = "temperature_2m,relative_humidity_2m,dew_point_2m,cloud_cover,precipitation,precipitation_probability,weather_code,wind_speed_10m,wind_direction_10m";
const DAILY_PARAMS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,precipitation_probability_max,weather_code,wind_speed_10m_max,sunrise,sunset";
const CURRENT_PARAMS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,precipitation,weather_code,wind_speed_10m,wind_direction_10m,uv_index,visibility";
const AIR_QUALITY_PARAMS: &str = "us_aqi,pm2_5,pm10";

#[derive(Debug, Clone)]
pub struct MeteoClient {
    pub(crate) client: Client,
    forecast_base: String,
    air_quality_base: String,
    pub(crate) geocoding_base: String,
    pub(crate) postal_base: String,
    models: Vec<String>,
    forecast_days: u8,
}

impl MeteoClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// [`MeteoError::Network`] when the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: &MeteoConfig) -> Result<Self, MeteoError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            forecast_base: config.forecast_api_url.trim_end_matches('/').to_string(),
            air_quality_base: config.air_quality_api_url.trim_end_matches('/').to_string(),
            geocoding_base: config.geocoding_api_url.trim_end_matches('/').to_string(),
            postal_base: config.postal_api_url.trim_end_matches('/').to_string(),
            models: config.models.clone(),
            forecast_days: config.forecast_days,
        })
    }

    /// Every endpoint pointed at one base URL, for mock-server tests.
    #[cfg(test)]
    pub(crate) fn with_base_url(base: &str, models: Vec<String>) -> Self {
        Self {
            client: Client::new(),
            forecast_base: base.to_string(),
            air_quality_base: base.to_string(),
            geocoding_base: base.to_string(),
            postal_base: base.to_string(),
            models,
            forecast_days: 10,
        }
    }

    /// Fetch one model's forecast.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        model: &str,
    ) -> Result<RawModelForecast, MeteoError> {
        let response = self
            .client
            .get(format!("{}/forecast", self.forecast_base))
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("hourly", HOURLY_PARAMS.to_string()),
                ("daily", DAILY_PARAMS.to_string()),
                ("current", CURRENT_PARAMS.to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", self.forecast_days.to_string()),
                ("models", model.to_string()),
            ])
            .send()
            .await?;

        let payload: ForecastPayload = handle_response(response).await?;
        payload.into_raw(model)
    }

    /// Fetch every configured model concurrently, preserving the
    /// configured model order in the result. The first configured model
    /// that responds becomes the ensemble's reference provider, so the
    /// ordering here is the stable ordering the aggregator relies on.
    #[instrument(skip(self))]
    pub async fn fetch_all_models(&self, latitude: f64, longitude: f64) -> Vec<RawModelForecast> {
        let fetches = self
            .models
            .iter()
            .map(|model| self.fetch_forecast(latitude, longitude, model));
        let results = join_all(fetches).await;

        let mut forecasts = Vec::with_capacity(self.models.len());
        for (model, result) in self.models.iter().zip(results) {
            match result {
                Ok(forecast) => forecasts.push(forecast),
                Err(e) => tracing::warn!("Skipping model {}: {}", model, e),
            }
        }
        forecasts
    }

    /// Fetch the current air-quality reading. Failures degrade to
    /// `None`; the forecast simply goes out without an AQI.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_air_quality(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Option<AirQualityReading> {
        let request = self
            .client
            .get(format!("{}/air-quality", self.air_quality_base))
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", AIR_QUALITY_PARAMS.to_string()),
                ("timezone", "auto".to_string()),
            ]);

        let result: Result<AirQualityPayload, MeteoError> = async {
            let response = request.send().await?;
            handle_response(response).await
        }
        .await;

        match result {
            Ok(payload) => payload.into_reading(),
            Err(e) => {
                tracing::warn!("Error fetching air quality: {}", e);
                None
            }
        }
    }
}

/// Decode a response, mapping non-success statuses to [`MeteoError::Api`].
pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, MeteoError> {
    let status = response.status();
    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| MeteoError::Parse(format!("JSON parse error: {}", e)))
    } else {
        let message = response.text().await.unwrap_or_default();
        Err(MeteoError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

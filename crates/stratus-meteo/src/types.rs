//! Open-Meteo wire types and their conversion into engine records.
//!
//! The API returns parallel arrays per block with `null` holes where a
//! model has no value for a slot; those deserialize to `None` and stay
//! `None` through the conversion.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use stratus_ensemble::{AirQualityReading, RawCurrent, RawDaily, RawHourly, RawModelForecast};

use crate::error::MeteoError;

/// One model's `/forecast` response.
#[derive(Debug, Deserialize)]
pub struct ForecastPayload {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub current: Option<CurrentBlock>,
    #[serde(default)]
    pub hourly: Option<HourlyBlock>,
    #[serde(default)]
    pub daily: Option<DailyBlock>,
}

impl ForecastPayload {
    /// Convert the wire payload into the engine's record for `model`.
    ///
    /// # Errors
    ///
    /// [`MeteoError::Parse`] when a timestamp in the payload is not in
    /// Open-Meteo's ISO local format.
    pub fn into_raw(self, model: &str) -> Result<RawModelForecast, MeteoError> {
        Ok(RawModelForecast {
            model: model.to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            timezone: self.timezone.unwrap_or_else(|| "UTC".to_string()),
            current: self.current.map(CurrentBlock::into_raw),
            hourly: match self.hourly {
                Some(block) => block.into_raw()?,
                None => RawHourly::default(),
            },
            daily: match self.daily {
                Some(block) => block.into_raw()?,
                None => RawDaily::default(),
            },
        })
    }
}

/// The `current` block. Parameter names follow WMO conventions:
/// `_2m` / `_10m` are measurement heights above ground.
#[derive(Debug, Default, Deserialize)]
pub struct CurrentBlock {
    #[serde(default, rename = "temperature_2m")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub apparent_temperature: Option<f64>,
    #[serde(default, rename = "relative_humidity_2m")]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub precipitation: Option<f64>,
    #[serde(default)]
    pub weather_code: Option<i32>,
    #[serde(default, rename = "wind_speed_10m")]
    pub wind_speed: Option<f64>,
    #[serde(default, rename = "wind_direction_10m")]
    pub wind_direction: Option<f64>,
    #[serde(default)]
    pub uv_index: Option<f64>,
    #[serde(default)]
    pub visibility: Option<f64>,
}

impl CurrentBlock {
    fn into_raw(self) -> RawCurrent {
        RawCurrent {
            temperature: self.temperature,
            apparent_temperature: self.apparent_temperature,
            humidity: self.humidity,
            precipitation: self.precipitation,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
            weather_code: self.weather_code,
            uv_index: self.uv_index,
            visibility: self.visibility,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HourlyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default, rename = "temperature_2m")]
    pub temperature: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability: Vec<Option<f64>>,
    #[serde(default, rename = "wind_speed_10m")]
    pub wind_speed: Vec<Option<f64>>,
    #[serde(default, rename = "wind_direction_10m")]
    pub wind_direction: Vec<Option<f64>>,
    #[serde(default, rename = "relative_humidity_2m")]
    pub humidity: Vec<Option<f64>>,
    #[serde(default, rename = "dew_point_2m")]
    pub dew_point: Vec<Option<f64>>,
    #[serde(default)]
    pub cloud_cover: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
}

impl HourlyBlock {
    fn into_raw(self) -> Result<RawHourly, MeteoError> {
        let time = self
            .time
            .iter()
            .map(|s| parse_hour(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RawHourly {
            time,
            temperature: self.temperature,
            precipitation: self.precipitation,
            precipitation_probability: self.precipitation_probability,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
            humidity: self.humidity,
            dew_point: self.dew_point,
            cloud_cover: self.cloud_cover,
            weather_code: self.weather_code,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DailyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default, rename = "temperature_2m_max")]
    pub temperature_max: Vec<Option<f64>>,
    #[serde(default, rename = "temperature_2m_min")]
    pub temperature_min: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default, rename = "wind_speed_10m_max")]
    pub wind_speed_max: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
    #[serde(default)]
    pub sunrise: Vec<Option<String>>,
    #[serde(default)]
    pub sunset: Vec<Option<String>>,
}

impl DailyBlock {
    fn into_raw(self) -> Result<RawDaily, MeteoError> {
        let time = self
            .time
            .iter()
            .map(|s| parse_day(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RawDaily {
            time,
            temperature_max: self.temperature_max,
            temperature_min: self.temperature_min,
            precipitation_sum: self.precipitation_sum,
            precipitation_probability_max: self.precipitation_probability_max,
            wind_speed_max: self.wind_speed_max,
            weather_code: self.weather_code,
            sunrise: self.sunrise,
            sunset: self.sunset,
        })
    }
}

/// The air-quality API response; only the current block matters here.
#[derive(Debug, Deserialize)]
pub struct AirQualityPayload {
    #[serde(default)]
    pub current: Option<AirQualityBlock>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AirQualityBlock {
    #[serde(default)]
    pub us_aqi: Option<f64>,
    #[serde(default)]
    pub pm2_5: Option<f64>,
    #[serde(default)]
    pub pm10: Option<f64>,
}

impl AirQualityPayload {
    pub fn into_reading(self) -> Option<AirQualityReading> {
        self.current.map(|block| AirQualityReading {
            us_aqi: block.us_aqi.map(|v| v.round() as i32),
            pm2_5: block.pm2_5,
            pm10: block.pm10,
        })
    }
}

/// Open-Meteo emits local timestamps without seconds ("2026-03-01T15:00").
fn parse_hour(value: &str) -> Result<NaiveDateTime, MeteoError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| MeteoError::Parse(format!("bad hourly timestamp {}: {}", value, e)))
}

fn parse_day(value: &str) -> Result<NaiveDate, MeteoError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| MeteoError::Parse(format!("bad daily date {}: {}", value, e)))
}

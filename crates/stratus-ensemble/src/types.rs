//! Forecast data model: raw per-provider inputs and the merged ensemble output.
//!
//! Absence is always an `Option`, never a sentinel value. A provider that
//! did not report a quantity for a slot carries `None` there, which the
//! statistics primitives skip; a legitimate zero stays a `Some(0.0)`.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::condition::WeatherCondition;

/// One provider's complete forecast payload for a single location.
///
/// Hourly and daily series are parallel vectors indexed by time slot.
/// All providers passed to [`crate::aggregate`] are assumed to be
/// positionally aligned: index `i` of every provider's hourly series
/// refers to the same real-world hour. The first provider in the input
/// sequence is the reference for location, timezone and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawModelForecast {
    /// Provider identifier, e.g. `ecmwf_ifs04`. Keys the weight table.
    pub model: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    /// Current snapshot; a provider may lack one.
    pub current: Option<RawCurrent>,
    pub hourly: RawHourly,
    pub daily: RawDaily,
}

/// A provider's current-conditions snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCurrent {
    pub temperature: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub weather_code: Option<i32>,
    pub uv_index: Option<f64>,
    /// Meters.
    pub visibility: Option<f64>,
}

/// A provider's hourly series, up to 7 days of hourly slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawHourly {
    /// Slot timestamps in the provider's local timezone.
    pub time: Vec<NaiveDateTime>,
    pub temperature: Vec<Option<f64>>,
    pub precipitation: Vec<Option<f64>>,
    pub precipitation_probability: Vec<Option<f64>>,
    pub wind_speed: Vec<Option<f64>>,
    pub wind_direction: Vec<Option<f64>>,
    pub humidity: Vec<Option<f64>>,
    pub dew_point: Vec<Option<f64>>,
    pub cloud_cover: Vec<Option<f64>>,
    pub weather_code: Vec<Option<i32>>,
}

/// A provider's daily series, up to 10 days.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDaily {
    pub time: Vec<NaiveDate>,
    pub temperature_max: Vec<Option<f64>>,
    pub temperature_min: Vec<Option<f64>>,
    pub precipitation_sum: Vec<Option<f64>>,
    pub precipitation_probability_max: Vec<Option<f64>>,
    pub wind_speed_max: Vec<Option<f64>>,
    pub weather_code: Vec<Option<i32>>,
    /// ISO local timestamps, passed through to the output verbatim.
    pub sunrise: Vec<Option<String>>,
    pub sunset: Vec<Option<String>>,
}

/// Externally sourced air-quality reading, attached to the merged
/// current conditions verbatim (never ensembled).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AirQualityReading {
    /// US AQI, 0-500.
    pub us_aqi: Option<i32>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
}

/// Canonical location of a merged forecast, taken from the reference provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

/// Merged current conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub weather_code: i32,
    pub uv_index: Option<f64>,
    pub visibility: Option<f64>,
    pub aqi: Option<i32>,
}

impl CurrentConditions {
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.weather_code)
    }
}

/// One merged hourly slot with its agreement-derived confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyEntry {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub precipitation: f64,
    pub precipitation_probability: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub humidity: f64,
    pub dew_point: f64,
    pub cloud_cover: f64,
    pub weather_code: i32,
    /// 0-100, higher means the providers agreed more closely.
    pub confidence: u8,
}

impl HourlyEntry {
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.weather_code)
    }
}

/// One merged daily slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub precipitation_sum: f64,
    pub precipitation_probability_max: f64,
    pub wind_speed_max: f64,
    pub weather_code: i32,
    /// 0-100, higher means the providers agreed more closely.
    pub confidence: u8,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
}

impl DailyEntry {
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.weather_code)
    }
}

/// Average inter-provider dispersion over the whole hourly horizon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelSpread {
    pub temperature: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
}

/// The aggregation output: one merged forecast for one location.
///
/// Immutable once built; safe to cache or serialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleForecast {
    pub location: Location,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyEntry>,
    pub daily: Vec<DailyEntry>,
    pub model_spread: ModelSpread,
}

/// One provider's raw prediction at a single hourly slot.
///
/// Values stay `None` when the provider did not report the quantity;
/// the comparison view renders absence, it does not zero-fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub model: String,
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// The ensemble's own value at the same slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnsemblePrediction {
    pub temperature: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
}

/// Side-by-side view of every provider's raw prediction at one hour,
/// plus the ensemble value for the same slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub latitude: f64,
    pub longitude: f64,
    /// Slot timestamp; `None` when the reference provider has an empty
    /// hourly series.
    pub time: Option<NaiveDateTime>,
    pub models: Vec<ModelPrediction>,
    pub ensemble: EnsemblePrediction,
}

//! The ensemble aggregator: merges per-provider forecasts into one
//! forecast with per-step confidence.

use chrono::NaiveDate;

use crate::confidence::combined_confidence;
use crate::error::EnsembleError;
use crate::stats::{mode, population_std_dev, weighted_mean};
use crate::types::{
    AirQualityReading, CurrentConditions, DailyEntry, EnsembleForecast, HourlyEntry, Location,
    ModelSpread, RawCurrent, RawDaily, RawHourly, RawModelForecast,
};
use crate::weights::WeightTable;

/// Hourly slots kept in the merged output: 7 days.
pub const MAX_HOURLY_STEPS: usize = 168;
/// Daily slots kept in the merged output.
pub const MAX_DAILY_STEPS: usize = 10;

/// Merge per-provider forecasts into a single ensemble forecast.
///
/// `models[0]` is the reference provider: its coordinates, timezone and
/// hourly/daily timestamp sequences are canonical for the output.
/// Providers are assumed positionally aligned (index `i` of every
/// series is the same real-world slot); no timestamp matching is done.
/// Missing values within a provider are skipped quantity by quantity
/// and never fail the aggregation.
///
/// # Errors
///
/// [`EnsembleError::NoModelData`] when `models` is empty. Callers that
/// could not fetch any provider must fail before this point instead of
/// presenting a fabricated forecast.
pub fn aggregate(
    models: &[RawModelForecast],
    weights: &WeightTable,
    air_quality: Option<&AirQualityReading>,
) -> Result<EnsembleForecast, EnsembleError> {
    let reference = models.first().ok_or(EnsembleError::NoModelData)?;
    let combiner = Combiner::new(models, weights);

    let current = build_current(&combiner, air_quality);
    let (hourly, spreads) = build_hourly(&combiner, reference);
    let daily = build_daily(&combiner, reference, &hourly);

    Ok(EnsembleForecast {
        location: Location {
            latitude: reference.latitude,
            longitude: reference.longitude,
            timezone: reference.timezone.clone(),
        },
        current,
        hourly,
        daily,
        model_spread: spreads.summarize(),
    })
}

/// Provider set with the resolved weight of each provider.
struct Combiner<'a> {
    models: &'a [RawModelForecast],
    weights: Vec<f64>,
}

impl<'a> Combiner<'a> {
    fn new(models: &'a [RawModelForecast], table: &WeightTable) -> Self {
        let weights = models.iter().map(|m| table.weight_of(&m.model)).collect();
        Self { models, weights }
    }

    /// Weighted mean and unweighted spread of one hourly quantity at one
    /// slot. The spread stays unweighted: every reporting provider
    /// counts equally toward disagreement.
    fn hourly_stat(
        &self,
        index: usize,
        field: impl Fn(&RawHourly, usize) -> Option<f64>,
    ) -> (f64, f64) {
        let mean = weighted_mean(
            self.models
                .iter()
                .zip(&self.weights)
                .map(|(m, &w)| (field(&m.hourly, index), w)),
        );
        let spread = population_std_dev(self.models.iter().map(|m| field(&m.hourly, index)));
        (mean, spread)
    }

    fn daily_stat(
        &self,
        index: usize,
        field: impl Fn(&RawDaily, usize) -> Option<f64>,
    ) -> (f64, f64) {
        let mean = weighted_mean(
            self.models
                .iter()
                .zip(&self.weights)
                .map(|(m, &w)| (field(&m.daily, index), w)),
        );
        let spread = population_std_dev(self.models.iter().map(|m| field(&m.daily, index)));
        (mean, spread)
    }

    fn hourly_mode(&self, index: usize) -> i32 {
        mode(self
            .models
            .iter()
            .map(|m| code_at(&m.hourly.weather_code, index)))
    }

    fn daily_mode(&self, index: usize) -> i32 {
        mode(self
            .models
            .iter()
            .map(|m| code_at(&m.daily.weather_code, index)))
    }

    fn current_mean(&self, field: impl Fn(&RawCurrent) -> Option<f64>) -> f64 {
        weighted_mean(
            self.models
                .iter()
                .zip(&self.weights)
                .map(|(m, &w)| (m.current.as_ref().and_then(&field), w)),
        )
    }
}

fn at(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten()
}

fn code_at(series: &[Option<i32>], index: usize) -> Option<i32> {
    series.get(index).copied().flatten()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn build_current(
    combiner: &Combiner,
    air_quality: Option<&AirQualityReading>,
) -> CurrentConditions {
    let models = combiner.models;
    let has_current = models.iter().any(|m| m.current.is_some());

    let (temperature, apparent, humidity, precipitation, wind_speed, wind_direction, weather_code) =
        if has_current {
            (
                combiner.current_mean(|c| c.temperature),
                combiner.current_mean(|c| c.apparent_temperature),
                combiner.current_mean(|c| c.humidity),
                combiner.current_mean(|c| c.precipitation),
                combiner.current_mean(|c| c.wind_speed),
                combiner.current_mean(|c| c.wind_direction),
                mode(models
                    .iter()
                    .map(|m| m.current.as_ref().and_then(|c| c.weather_code))),
            )
        } else {
            // No provider has a current snapshot: substitute each
            // provider's first hourly slot. Hourly series carry no
            // apparent temperature, so it mirrors the plain one.
            let (temperature, _) = combiner.hourly_stat(0, |h, i| at(&h.temperature, i));
            let (humidity, _) = combiner.hourly_stat(0, |h, i| at(&h.humidity, i));
            let (precipitation, _) = combiner.hourly_stat(0, |h, i| at(&h.precipitation, i));
            let (wind_speed, _) = combiner.hourly_stat(0, |h, i| at(&h.wind_speed, i));
            let (wind_direction, _) = combiner.hourly_stat(0, |h, i| at(&h.wind_direction, i));
            (
                temperature,
                temperature,
                humidity,
                precipitation,
                wind_speed,
                wind_direction,
                combiner.hourly_mode(0),
            )
        };

    // Not ensembled: taken verbatim from the first provider reporting
    // them. Providers rarely diverge on these.
    let uv_index = models
        .iter()
        .find_map(|m| m.current.as_ref().and_then(|c| c.uv_index));
    let visibility = models
        .iter()
        .find_map(|m| m.current.as_ref().and_then(|c| c.visibility));

    CurrentConditions {
        temperature: round1(temperature),
        apparent_temperature: round1(apparent),
        humidity: humidity.round(),
        precipitation: round1(precipitation),
        wind_speed: round1(wind_speed),
        wind_direction: wind_direction.round(),
        weather_code,
        uv_index,
        visibility,
        aqi: air_quality.and_then(|aq| aq.us_aqi),
    }
}

/// Per-slot spreads retained across the hourly pass for the summary.
#[derive(Default)]
struct SpreadTotals {
    temperature: Vec<f64>,
    precipitation: Vec<f64>,
    wind_speed: Vec<f64>,
}

impl SpreadTotals {
    fn summarize(&self) -> ModelSpread {
        ModelSpread {
            temperature: round1(mean_of(&self.temperature)),
            precipitation: round1(mean_of(&self.precipitation)),
            wind_speed: round1(mean_of(&self.wind_speed)),
        }
    }
}

fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn build_hourly(
    combiner: &Combiner,
    reference: &RawModelForecast,
) -> (Vec<HourlyEntry>, SpreadTotals) {
    let steps = reference.hourly.time.len().min(MAX_HOURLY_STEPS);
    let mut entries = Vec::with_capacity(steps);
    let mut spreads = SpreadTotals::default();

    for (index, &time) in reference
        .hourly
        .time
        .iter()
        .take(MAX_HOURLY_STEPS)
        .enumerate()
    {
        let (temperature, temperature_spread) =
            combiner.hourly_stat(index, |h, i| at(&h.temperature, i));
        let (precipitation, precipitation_spread) =
            combiner.hourly_stat(index, |h, i| at(&h.precipitation, i));
        let (precipitation_probability, _) =
            combiner.hourly_stat(index, |h, i| at(&h.precipitation_probability, i));
        let (wind_speed, wind_spread) = combiner.hourly_stat(index, |h, i| at(&h.wind_speed, i));
        let (wind_direction, _) = combiner.hourly_stat(index, |h, i| at(&h.wind_direction, i));
        let (humidity, _) = combiner.hourly_stat(index, |h, i| at(&h.humidity, i));
        let (dew_point, _) = combiner.hourly_stat(index, |h, i| at(&h.dew_point, i));
        let (cloud_cover, _) = combiner.hourly_stat(index, |h, i| at(&h.cloud_cover, i));

        entries.push(HourlyEntry {
            time,
            temperature: round1(temperature),
            precipitation: round1(precipitation),
            precipitation_probability: precipitation_probability.round(),
            wind_speed: round1(wind_speed),
            wind_direction: wind_direction.round(),
            humidity: humidity.round(),
            dew_point: round1(dew_point),
            cloud_cover: cloud_cover.round(),
            weather_code: combiner.hourly_mode(index),
            confidence: combined_confidence(temperature_spread, precipitation_spread, wind_spread),
        });

        spreads.temperature.push(temperature_spread);
        spreads.precipitation.push(precipitation_spread);
        spreads.wind_speed.push(wind_spread);
    }

    (entries, spreads)
}

fn build_daily(
    combiner: &Combiner,
    reference: &RawModelForecast,
    hourly: &[HourlyEntry],
) -> Vec<DailyEntry> {
    let mut entries = Vec::new();

    for (index, &date) in reference
        .daily
        .time
        .iter()
        .take(MAX_DAILY_STEPS)
        .enumerate()
    {
        let (temperature_max, temperature_spread) =
            combiner.daily_stat(index, |d, i| at(&d.temperature_max, i));
        let (temperature_min, _) = combiner.daily_stat(index, |d, i| at(&d.temperature_min, i));
        let (precipitation_sum, precipitation_spread) =
            combiner.daily_stat(index, |d, i| at(&d.precipitation_sum, i));
        let (precipitation_probability, _) =
            combiner.daily_stat(index, |d, i| at(&d.precipitation_probability_max, i));
        let (wind_speed_max, wind_spread) =
            combiner.daily_stat(index, |d, i| at(&d.wind_speed_max, i));

        // Some providers report a 0% daily probability even when their
        // hourly series shows rain within the day (the daily figure is a
        // separate product). Backfill from the day's maximum hourly
        // probability so short-lived events stay visible.
        let precipitation_probability = if precipitation_probability == 0.0 {
            max_hourly_probability(hourly, date).unwrap_or(precipitation_probability)
        } else {
            precipitation_probability
        };

        entries.push(DailyEntry {
            date,
            temperature_max: round1(temperature_max),
            temperature_min: round1(temperature_min),
            precipitation_sum: round1(precipitation_sum),
            precipitation_probability_max: precipitation_probability.round(),
            wind_speed_max: round1(wind_speed_max),
            weather_code: combiner.daily_mode(index),
            confidence: combined_confidence(temperature_spread, precipitation_spread, wind_spread),
            sunrise: reference.daily.sunrise.get(index).cloned().flatten(),
            sunset: reference.daily.sunset.get(index).cloned().flatten(),
        });
    }

    entries
}

/// Largest nonzero hourly precipitation probability on the given date.
fn max_hourly_probability(hourly: &[HourlyEntry], date: NaiveDate) -> Option<f64> {
    hourly
        .iter()
        .filter(|entry| entry.time.date() == date)
        .map(|entry| entry.precipitation_probability)
        .fold(None, |best: Option<f64>, p| {
            Some(best.map_or(p, |b| b.max(p)))
        })
        .filter(|&p| p > 0.0)
}

//! Side-by-side model comparison at a single hourly slot.

use crate::error::EnsembleError;
use crate::stats::weighted_mean;
use crate::types::{ComparisonTable, EnsemblePrediction, ModelPrediction, RawModelForecast};
use crate::weights::WeightTable;

/// Build a comparison table of every provider's raw prediction at the
/// given hour offset, plus the ensemble's weighted mean for the same
/// slot.
///
/// `hour_offset` is clamped to the reference provider's hourly range:
/// it is a user-adjustable view parameter, and clamping beats failing.
/// Raw values stay absent where a provider did not report; only the
/// synthetic ensemble row is always populated.
///
/// # Errors
///
/// [`EnsembleError::NoModelData`] when `models` is empty.
pub fn compare(
    models: &[RawModelForecast],
    weights: &WeightTable,
    hour_offset: usize,
) -> Result<ComparisonTable, EnsembleError> {
    let reference = models.first().ok_or(EnsembleError::NoModelData)?;
    let index = hour_offset.min(reference.hourly.time.len().saturating_sub(1));

    let rows: Vec<ModelPrediction> = models
        .iter()
        .map(|m| ModelPrediction {
            model: m.model.clone(),
            temperature: at(&m.hourly.temperature, index),
            precipitation: at(&m.hourly.precipitation, index),
            wind_speed: at(&m.hourly.wind_speed, index),
        })
        .collect();

    let model_weights: Vec<f64> = models.iter().map(|m| weights.weight_of(&m.model)).collect();
    let ensemble = EnsemblePrediction {
        temperature: round1(weighted_mean(
            rows.iter()
                .zip(&model_weights)
                .map(|(row, &w)| (row.temperature, w)),
        )),
        precipitation: round1(weighted_mean(
            rows.iter()
                .zip(&model_weights)
                .map(|(row, &w)| (row.precipitation, w)),
        )),
        wind_speed: round1(weighted_mean(
            rows.iter()
                .zip(&model_weights)
                .map(|(row, &w)| (row.wind_speed, w)),
        )),
    };

    Ok(ComparisonTable {
        latitude: reference.latitude,
        longitude: reference.longitude,
        time: reference.hourly.time.get(index).copied(),
        models: rows,
        ensemble,
    })
}

fn at(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

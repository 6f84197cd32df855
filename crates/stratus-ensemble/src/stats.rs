//! Numeric primitives over sparse per-provider samples.
//!
//! Every function tolerates absent entries: a `None` sample is excluded
//! from the computation entirely rather than treated as zero.

use std::collections::HashMap;

/// Weighted mean over `(value, weight)` pairs, skipping absent values.
///
/// Absent entries drop out of both the numerator and the weight sum, so
/// the weights of the providers that did report are implicitly rescaled
/// to sum to 1.0. If only 3 of 6 providers respond, the average is taken
/// over those 3 at their relative weights.
///
/// Returns 0.0 when every entry is absent (degenerate, not an error).
pub fn weighted_mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = (Option<f64>, f64)>,
{
    let mut sum = 0.0;
    let mut weight_sum = 0.0;
    for (value, weight) in values {
        if let Some(v) = value {
            sum += v * weight;
            weight_sum += weight;
        }
    }
    if weight_sum == 0.0 {
        0.0
    } else {
        sum / weight_sum
    }
}

/// Population standard deviation of the present values.
///
/// Unweighted: every reporting provider counts equally toward the
/// disagreement measure. Divides by n, not n-1. Returns 0.0 with fewer
/// than two present values, where spread is unmeasurable.
pub fn population_std_dev<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    if present.len() < 2 {
        return 0.0;
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let variance = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Most frequent present value, for categorical quantities.
///
/// Ties resolve toward the numerically larger value: weather codes are
/// ordered roughly by severity, so a tie picks the more severe
/// condition. Returns 0 when no values are present.
pub fn mode<I>(values: I) -> i32
where
    I: IntoIterator<Item = Option<i32>>,
{
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for value in values.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by_key(|&(value, count)| (count, value))
        .map(|(value, _)| value)
        .unwrap_or(0)
}

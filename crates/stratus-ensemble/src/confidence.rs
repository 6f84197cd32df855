//! Spread-to-confidence conversion.
//!
//! Confidence decays exponentially with inter-provider spread:
//!
//! ```text
//! confidence = round(100 * e^(-spread / typical_spread))
//! ```
//!
//! so zero spread scores exactly 100, a spread equal to the typical
//! value scores ~37 (e^-1), and twice typical scores ~14. The typical
//! spreads below were derived from historical model disagreement and
//! must stay fixed for output compatibility.

/// Degrees Celsius of spread at which temperature confidence hits ~37.
pub const TYPICAL_TEMPERATURE_SPREAD: f64 = 3.0;
/// Millimeters of spread at which precipitation confidence hits ~37.
pub const TYPICAL_PRECIPITATION_SPREAD: f64 = 5.0;
/// Km/h of spread at which wind-speed confidence hits ~37.
pub const TYPICAL_WIND_SPEED_SPREAD: f64 = 5.0;

/// Confidence score in [0, 100] for one quantity at one time step.
///
/// Monotonically decreasing in `spread`. No floor is applied: the
/// exponential never reaches zero but rounding can, and a large spread
/// is allowed to show as 0.
pub fn confidence_from_spread(spread: f64, typical_spread: f64) -> u8 {
    (100.0 * (-spread / typical_spread).exp()).round() as u8
}

/// Per-time-step confidence: the unweighted mean of the temperature,
/// precipitation and wind-speed confidences, rounded.
pub fn combined_confidence(temperature_spread: f64, precipitation_spread: f64, wind_spread: f64) -> u8 {
    let temperature = confidence_from_spread(temperature_spread, TYPICAL_TEMPERATURE_SPREAD);
    let precipitation = confidence_from_spread(precipitation_spread, TYPICAL_PRECIPITATION_SPREAD);
    let wind = confidence_from_spread(wind_spread, TYPICAL_WIND_SPEED_SPREAD);
    ((f64::from(temperature) + f64::from(precipitation) + f64::from(wind)) / 3.0).round() as u8
}

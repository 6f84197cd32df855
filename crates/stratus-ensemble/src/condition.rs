//! Weather condition categories mapped from WMO codes.

use serde::{Deserialize, Serialize};

/// Categorical weather condition derived from a WMO weather code.
/// See: https://open-meteo.com/en/docs#weathervariables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert a WMO weather code to a condition category.
    /// Unknown codes default to clear.
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::Sleet, // Freezing drizzle
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            66 | 67 => Self::Sleet, // Freezing rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Rough severity ordering, 0 = benign. WMO codes grow with
    /// severity, which is also why the categorical consensus breaks
    /// ties toward the larger code.
    pub fn severity_rank(&self) -> u8 {
        match self {
            Self::Clear => 0,
            Self::PartlyCloudy => 1,
            Self::Cloudy => 2,
            Self::Fog => 3,
            Self::Drizzle => 4,
            Self::Rain => 5,
            Self::Sleet => 6,
            Self::HeavyRain => 7,
            Self::Snow => 8,
            Self::Thunderstorm => 9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wmo_code_mapping() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(2), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_wmo_code(45), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::from_wmo_code(55), WeatherCondition::Drizzle);
        assert_eq!(WeatherCondition::from_wmo_code(63), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo_code(82), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_wmo_code(66), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_wmo_code(77), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_wmo_code(95), WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_unknown_codes_default_to_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(999), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Clear);
    }

    #[test]
    fn test_description() {
        assert_eq!(WeatherCondition::Clear.description(), "Clear");
        assert_eq!(WeatherCondition::Thunderstorm.description(), "Thunderstorm");
    }

    #[test]
    fn test_severity_tracks_code_order() {
        let clear = WeatherCondition::from_wmo_code(0);
        let rain = WeatherCondition::from_wmo_code(61);
        let storm = WeatherCondition::from_wmo_code(95);
        assert!(clear.severity_rank() < rain.severity_rank());
        assert!(rain.severity_rank() < storm.severity_rank());
    }
}

//! Weather-boundary error types.

use stratus_ensemble::EnsembleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeteoError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No forecast data available from any model")]
    NoData,
}

impl MeteoError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Api { status, .. } if *status >= 500 => {
                "The weather service is having issues. Please try again later.".to_string()
            }
            Self::Api { .. } => "Weather request failed. Please try again.".to_string(),
            Self::Parse(_) => "Received malformed weather data. Please try again.".to_string(),
            Self::NoData => "No forecast data is available right now.".to_string(),
        }
    }

    /// Whether this error is worth retrying at a higher layer.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::NoData => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Parse(_) => false,
        }
    }
}

impl From<EnsembleError> for MeteoError {
    fn from(_: EnsembleError) -> Self {
        // The engine's only failure mode is an empty model set.
        Self::NoData
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert!(MeteoError::NoData.user_message().contains("No forecast data"));
        let err = MeteoError::Api {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert!(err.user_message().contains("try again later"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(MeteoError::NoData.is_retryable());
        assert!(MeteoError::Api { status: 500, message: String::new() }.is_retryable());
        assert!(!MeteoError::Api { status: 404, message: String::new() }.is_retryable());
        assert!(!MeteoError::Parse("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_ensemble_error_maps_to_no_data() {
        let err: MeteoError = EnsembleError::NoModelData.into();
        assert!(matches!(err, MeteoError::NoData));
    }
}

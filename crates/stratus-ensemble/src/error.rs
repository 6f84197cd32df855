//! Ensemble-specific error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnsembleError {
    /// No provider payloads were supplied. Distinct from providers that
    /// responded with all-absent data, which aggregates to a zero-valued,
    /// zero-confidence forecast rather than failing.
    #[error("no model data available")]
    NoModelData,
}

impl EnsembleError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoModelData => "No forecast data is available right now. Please try again.",
        }
    }
}

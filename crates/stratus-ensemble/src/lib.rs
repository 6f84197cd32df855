//! Ensemble forecast engine for Stratus
//!
//! Combines per-model weather forecasts from independent numerical
//! weather-prediction providers into a single merged forecast, with a
//! confidence score per time step derived from how much the providers
//! agree. Pure and synchronous: callers fetch provider payloads
//! elsewhere and hand this crate plain data.

pub mod aggregate;
pub mod comparison;
pub mod condition;
pub mod confidence;
pub mod error;
pub mod stats;
pub mod types;
pub mod weights;

pub use aggregate::aggregate;
pub use comparison::compare;
pub use condition::WeatherCondition;
pub use error::EnsembleError;
pub use types::*;
pub use weights::WeightTable;

//! Weather data boundary for Stratus
//!
//! Fetches per-model forecasts, air quality and location search results
//! from Open-Meteo (plus Zippopotam for postal codes), and orchestrates
//! the ensemble aggregation behind a short-TTL forecast cache.

pub mod cache;
pub mod client;
pub mod error;
pub mod geocode;
pub mod service;
pub mod types;

pub use cache::ForecastCache;
pub use client::MeteoClient;
pub use error::MeteoError;
pub use geocode::{looks_like_postal_code, postal_country, GeocodingResult};
pub use service::ForecastService;

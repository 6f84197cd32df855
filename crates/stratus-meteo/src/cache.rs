//! Short-TTL in-memory cache for merged forecasts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use stratus_ensemble::EnsembleForecast;

/// Coordinates rounded to ~0.01 degrees, so lookups a few hundred
/// meters apart share an entry.
type CacheKey = (i64, i64);

struct CacheEntry {
    stored_at: Instant,
    forecast: Arc<EnsembleForecast>,
}

/// Forecasts keyed by rounded coordinates, valid for a fixed TTL.
///
/// The aggregation engine itself is stateless; this cache is owned by
/// the service layer and only short-circuits repeated fetches for the
/// same spot. Stale entries are evicted lazily on lookup.
pub struct ForecastCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ForecastCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// A fresh cached forecast for these coordinates, if one exists.
    pub fn get(&self, latitude: f64, longitude: f64) -> Option<Arc<EnsembleForecast>> {
        let key = cache_key(latitude, longitude);
        {
            let entries = self.entries.read();
            match entries.get(&key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    return Some(Arc::clone(&entry.forecast));
                }
                Some(_) => {} // expired, fall through to evict
                None => return None,
            }
        }
        self.entries.write().remove(&key);
        None
    }

    /// Store a forecast, returning the shared handle.
    pub fn insert(
        &self,
        latitude: f64,
        longitude: f64,
        forecast: EnsembleForecast,
    ) -> Arc<EnsembleForecast> {
        let forecast = Arc::new(forecast);
        self.entries.write().insert(
            cache_key(latitude, longitude),
            CacheEntry {
                stored_at: Instant::now(),
                forecast: Arc::clone(&forecast),
            },
        );
        forecast
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cache_key(latitude: f64, longitude: f64) -> CacheKey {
    (
        (latitude * 100.0).round() as i64,
        (longitude * 100.0).round() as i64,
    )
}

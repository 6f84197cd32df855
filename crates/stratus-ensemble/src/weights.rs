//! Relative trust weights per forecast provider.

use std::collections::HashMap;

/// Maps a provider identifier to its relative trust weight.
///
/// Weights are relative multipliers, renormalized over the providers
/// that actually reported a value at each aggregation step, so their
/// absolute scale does not matter. Unknown providers get a neutral
/// weight of 1.0. Loaded once from configuration and never mutated.
#[derive(Debug, Clone)]
pub struct WeightTable {
    weights: HashMap<String, f64>,
}

impl WeightTable {
    pub fn new(weights: HashMap<String, f64>) -> Self {
        Self { weights }
    }

    /// Weight for a provider; 1.0 for anything not configured.
    pub fn weight_of(&self, model: &str) -> f64 {
        self.weights.get(model).copied().unwrap_or(1.0)
    }
}

impl Default for WeightTable {
    /// Production defaults. ECMWF is weighted highest as it is
    /// generally the most accurate globally.
    fn default() -> Self {
        Self::new(HashMap::from([
            ("gfs_seamless".to_string(), 1.0),
            ("ecmwf_ifs04".to_string(), 1.2),
            ("icon_seamless".to_string(), 1.0),
            ("gem_seamless".to_string(), 0.9),
            ("jma_seamless".to_string(), 0.9),
            ("meteofrance_seamless".to_string(), 1.0),
        ]))
    }
}

impl FromIterator<(String, f64)> for WeightTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

use crate::IndexError;
use serde::{Deserialize, Serialize};

/// Free parameters of the Okapi BM25 model.
///
/// The defaults are the classic `k1 = 1.5`, `b = 0.75` and an idf floor of
/// `0.25 * average_idf`. Changing any of them changes rankings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length normalization strength, 0 disables it.
    pub b: f64,
    /// Multiplier on the average idf used as the floor for common terms.
    pub epsilon: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75, epsilon: 0.25 }
    }
}

impl Bm25Params {
    pub fn validate(&self) -> Result<(), IndexError> {
        if !self.k1.is_finite() || self.k1 <= 0.0 {
            return Err(IndexError::InvalidParams("k1 must be finite and positive"));
        }
        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(IndexError::InvalidParams("b must be within [0, 1]"));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(IndexError::InvalidParams("epsilon must be finite and non-negative"));
        }
        Ok(())
    }
}

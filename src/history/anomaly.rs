//! Anomaly detection against rolling bounds

use serde::{Deserialize, Serialize};

use crate::models::AnomalyKind;

/// Normal band around a mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    /// `mean ± sigma · std`
    #[must_use]
    pub fn around(mean: f64, std: f64, sigma: f64) -> Self {
        Self {
            lower: mean - sigma * std,
            upper: mean + sigma * std,
        }
    }

    #[must_use]
    pub fn classify(&self, value: f64) -> AnomalyKind {
        if value > self.upper {
            AnomalyKind::Positive
        } else if value < self.lower {
            AnomalyKind::Negative
        } else {
            AnomalyKind::Normal
        }
    }
}

/// Bounds from optional rolling statistics; missing statistics give no bounds
#[must_use]
pub fn rolling_bounds(mean: Option<f64>, std: Option<f64>, sigma: f64) -> Option<Bounds> {
    Some(Bounds::around(mean?, std?, sigma))
}

/// Classify a value; values without bounds are always normal
#[must_use]
pub fn detect(value: f64, bounds: Option<Bounds>) -> AnomalyKind {
    bounds.map_or(AnomalyKind::Normal, |b| b.classify(value))
}

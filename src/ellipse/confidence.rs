use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Confidence level of a two-dimensional error ellipse
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum ConfidenceLevel {
    P68,
    P95,
    P999,
}

impl ConfidenceLevel {
    pub const ALL: [Self; 3] = [Self::P68, Self::P95, Self::P999];

    /// Enclosed probability
    pub const fn probability(self) -> f64 {
        match self {
            Self::P68 => 0.68,
            Self::P95 => 0.95,
            Self::P999 => 0.999,
        }
    }

    /// Quantile of the chi-square distribution with two degrees of freedom
    pub const fn chi2_quantile(self) -> f64 {
        match self {
            Self::P68 => 2.27887,
            Self::P95 => 5.99146,
            Self::P999 => 13.81551,
        }
    }
}

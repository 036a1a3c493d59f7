//! Confidence ellipses of the flare position and the catalog cross-match
//!
//! The ellipses are built from the sample covariance of the chain's column and row marginal.
//! All levels share one eigenbasis and differ only by the chi-square scale. Catalog stars are
//! matched against the widest, 99.9% ellipse.

pub mod confidence;
pub use confidence::ConfidenceLevel;

pub mod flare_ellipse;
pub use flare_ellipse::{ConfidenceEllipses, FlareEllipse};

pub mod matching;
pub use matching::{StarDistance, StarMatch};

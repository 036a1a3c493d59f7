/// Error returned from the flare localization pipeline
///
/// All variants are fatal for the single target being processed. A batch driver is expected to
/// log them and continue with the next target.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LocalizationError {
    #[error("flare time {flare_time} is outside of the observed time range [{min}, {max}]")]
    FlareTimeOutOfRange { flare_time: f64, min: f64, max: f64 },

    #[error("{array} has {actual} entries, but images have {expected} cadences")]
    ShapeMismatch {
        array: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("cadence {index} is out of range for {n_cadences} cadences")]
    CadenceOutOfRange { index: usize, n_cadences: usize },

    #[error("flare image has no finite pixels, source cannot be localized")]
    NoUsableData,

    #[error("no pixel data for the requested target")]
    NoPixelData,

    #[error("{covering} of {candidates} pixel data candidates cover flare time {flare_time}")]
    AmbiguousPixelData {
        candidates: usize,
        covering: usize,
        flare_time: f64,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("catalog has no stars to match against")]
    EmptyCatalog,

    #[error("ensemble sampler failed: {0}")]
    Sampler(String),

    #[error("linear algebra failure: {0}")]
    LinearAlgebra(&'static str),
}

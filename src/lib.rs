#![doc = include_str!("../README.md")]

pub mod collaborators;
pub use collaborators::{
    CatalogEntry, CatalogSource, CatalogStar, PsfModel, TargetPixelData, WorldToPixel,
};

pub mod config;
pub use config::{FlareImageConfig, InstrumentConfig, LocalizationConfig, McmcConfig};

pub mod ellipse;
pub use ellipse::{ConfidenceEllipses, ConfidenceLevel, FlareEllipse, StarDistance, StarMatch};

mod error;
pub use error::LocalizationError;

pub mod flare_image;
pub use flare_image::{FlareImage, FlareImageBuilder, FlareTime};

mod localization;
pub use localization::{FlareLocalization, LocalizationResult};

pub mod polynomial;
pub use polynomial::Polynomial;

pub mod psf_fit;
pub use psf_fit::{
    Chain, EmceeSampler, EnsembleSampler, FitParameter, FitParameters, LnProbability, McmcEngine,
    McmcFit, Parameter,
};

pub mod quality;
pub use quality::{QualityFlag, QualityFlags};

pub mod selection;
pub use selection::select_pixel_data;

mod sorted_array;

pub use ndarray;

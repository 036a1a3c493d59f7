//! PSF fit of the flare image
//!
//! # Model
//!
//! The flare image is modelled as a point source rendered by the instrument PSF on top of a
//! constant offset. The offset absorbs both the residual background and the shift which made the
//! flare image non-negative. Four parameters are fitted, in the order of [FitParameter]:
//!
//! ```text
//! column, row, flux, offset
//! ```
//!
//! # Posterior
//!
//! - flux, column and row have hard bounds, the offset has a lower bound only
//! - column, row and offset have Gaussian priors around the initial guess
//! - the likelihood is Poisson, see [PsfPosterior]
//!
//! # Sampling
//!
//! [McmcEngine] runs an [EnsembleSampler] twice: a bootstrap pass from the data-driven guess and
//! a refinement pass from the bootstrap mean. The refined chain is moved to the pixel-center
//! convention and reduced to medians with 16th-84th percentile intervals.

pub mod chain;
pub use chain::{Chain, PIXEL_CENTER_SHIFT, RawChain};

pub mod mcmc;
pub use mcmc::{McmcEngine, McmcFit};

pub mod parameter;
pub use parameter::{FitParameter, FitParameters, Parameter};

pub mod posterior;
pub use posterior::{LnProbability, PsfPosterior};

pub mod sampler;
pub use sampler::{EmceeSampler, EnsembleSampler};

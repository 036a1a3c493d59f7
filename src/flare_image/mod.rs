//! Flare image construction
//!
//! The quiescent stellar flux of every pixel is approximated by a low-order polynomial fitted
//! to the cadences around the flare, the flare cadence and a short band around it excluded.
//! The flare image is the residual of the raw image over this baseline at the flare cadence.

mod builder;
pub use builder::{FlareImage, FlareImageBuilder};

mod cadence;
pub use cadence::{CadenceLookup, CadenceWindows, FlareTime, find_image_index, lookup_index};

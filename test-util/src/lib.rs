pub use catalog::VecCatalog;
pub use pixel_data::{SyntheticFlare, cubic, cubic_pixel_series};
pub use psf::GaussianPsf;
pub use wcs::LinearWcs;

mod catalog;
mod pixel_data;
mod psf;
mod wcs;

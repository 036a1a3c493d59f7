//! Contracts of the external collaborators
//!
//! The pipeline doesn't read files, query catalogs or evaluate the instrument PSF itself. These
//! traits describe what it needs from the code which does.

use crate::error::LocalizationError;

use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

/// Point-spread function evaluator matching the cutout's pixel grid
///
/// Image axis 0 is the CCD row, axis 1 is the CCD column. Positions are in absolute CCD
/// coordinates, the same ones the cutout origin is given in.
pub trait PsfModel {
    fn render(
        &self,
        center_col: f64,
        center_row: f64,
        flux: f64,
        scale_col: f64,
        scale_row: f64,
        rotation_angle: f64,
    ) -> Array2<f64>;
}

/// Sky to pixel transform of the cutout
pub trait WorldToPixel {
    /// Zero-based `(x, y)` pixel position, x follows columns and y follows rows, relative to the
    /// cutout origin
    fn world_to_pixel(&self, ra: f64, dec: f64) -> (f64, f64);
}

/// In-memory content of a target pixel file
#[derive(Clone, Debug)]
pub struct TargetPixelData<P, W> {
    /// Shape is `(cadence, row, column)`
    pub images: Array3<f64>,
    pub time: Array1<f64>,
    pub quality: Array1<u32>,
    /// CCD column of the cutout's first pixel
    pub column: f64,
    /// CCD row of the cutout's first pixel
    pub row: f64,
    pub ra: f64,
    pub dec: f64,
    /// Pipeline aperture mask, `(row, column)`
    pub aperture: Option<Array2<bool>>,
    pub wcs: W,
    pub psf: P,
}

impl<P, W> TargetPixelData<P, W>
where
    W: WorldToPixel,
{
    /// Check the invariant `images.shape[0] == time.shape[0] == quality.shape[0]`
    pub fn validate(&self) -> Result<(), LocalizationError> {
        let expected = self.images.shape()[0];
        for (array, actual) in [("time", self.time.len()), ("quality", self.quality.len())] {
            if actual != expected {
                return Err(LocalizationError::ShapeMismatch {
                    array,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Absolute `(column, row)` CCD position of a sky coordinate
    pub fn sky_to_ccd(&self, ra: f64, dec: f64) -> (f64, f64) {
        let (x, y) = self.wcs.world_to_pixel(ra, dec);
        (x + self.column, y + self.row)
    }

    /// Absolute `(column, row)` of the target itself
    pub fn target_ccd(&self) -> (f64, f64) {
        self.sky_to_ccd(self.ra, self.dec)
    }
}

/// Catalog row as returned by a cone search
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub source_id: u64,
    pub magnitude: f64,
    pub ra: f64,
    pub dec: f64,
}

impl CatalogEntry {
    /// Project the entry onto the cutout's CCD frame
    pub fn to_ccd<P, W>(&self, data: &TargetPixelData<P, W>) -> CatalogStar
    where
        W: WorldToPixel,
    {
        let (column, row) = data.sky_to_ccd(self.ra, self.dec);
        CatalogStar {
            source_id: self.source_id,
            magnitude: self.magnitude,
            column,
            row,
        }
    }
}

/// Catalog star in CCD pixel coordinates
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatalogStar {
    pub source_id: u64,
    pub magnitude: f64,
    pub column: f64,
    pub row: f64,
}

/// Astrometric catalog
pub trait CatalogSource {
    fn cone_search(
        &self,
        ra: f64,
        dec: f64,
        radius_arcsec: f64,
    ) -> Result<Vec<CatalogEntry>, LocalizationError>;
}

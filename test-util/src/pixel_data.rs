use crate::psf::GaussianPsf;
use crate::wcs::LinearWcs;

use conv::prelude::*;
use flare_localization::{PsfModel, TargetPixelData};
use ndarray::{Array1, Array2, Array3, Axis};

/// `t^3 - 0.5 t^2 + 10 t + 4`
pub fn cubic(t: f64) -> f64 {
    t.powi(3) - 0.5 * t.powi(2) + 10.0 * t + 4.0
}

/// 15 cadences at `linspace(0, 10, 15)`, every pixel follows [cubic]
pub fn cubic_pixel_series(n_rows: usize, n_cols: usize) -> (Array3<f64>, Array1<f64>) {
    let time = Array1::linspace(0.0, 10.0, 15);
    let mut images = Array3::zeros((time.len(), n_rows, n_cols));
    for (mut image, &t) in images.axis_iter_mut(Axis(0)).zip(time.iter()) {
        image.fill(cubic(t));
    }
    (images, time)
}

/// Noise-free target pixel data of a single flaring star
///
/// The quiescent star and a linearly drifting background are present at every cadence, the
/// flare adds `flare_flux` at `flare_cadence` only. Cadences are 30 minutes apart, time is in
/// days.
#[derive(Clone, Debug)]
pub struct SyntheticFlare {
    /// `(n_rows, n_cols)`
    pub shape: (usize, usize),
    /// CCD `(column, row)` of the first pixel
    pub origin: (f64, f64),
    pub n_cadences: usize,
    pub flare_cadence: usize,
    /// Position of the star as the PSF model takes it
    pub star_position: (f64, f64),
    pub quiescent_flux: f64,
    pub flare_flux: f64,
    pub background: f64,
    /// Background change per cadence
    pub drift: f64,
    pub sigma: f64,
    pub t0: f64,
}

impl Default for SyntheticFlare {
    fn default() -> Self {
        Self {
            shape: (9, 9),
            origin: (100.0, 200.0),
            n_cadences: 80,
            flare_cadence: 40,
            star_position: (104.5, 204.5),
            quiescent_flux: 5000.0,
            flare_flux: 1000.0,
            background: 50.0,
            drift: 0.05,
            sigma: 1.0,
            t0: 130.0,
        }
    }
}

impl SyntheticFlare {
    pub fn psf(&self) -> GaussianPsf {
        GaussianPsf::new(self.shape, self.origin, self.sigma)
    }

    /// WCS with the cutout center at `(290, 44)` degrees
    pub fn wcs(&self) -> LinearWcs {
        let (n_rows, n_cols) = self.shape;
        let center = (
            0.5 * n_cols.approx_as::<f64>().unwrap(),
            0.5 * n_rows.approx_as::<f64>().unwrap(),
        );
        LinearWcs::new(290.0, 44.0, center, LinearWcs::KEPLER_SCALE)
    }

    /// Sky position of an absolute CCD `(column, row)`
    pub fn sky_position(&self, column: f64, row: f64) -> (f64, f64) {
        self.wcs().pixel_to_world(column - self.origin.0, row - self.origin.1)
    }

    pub fn time(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.n_cadences, |k| {
            self.t0 + k.approx_as::<f64>().unwrap() / 48.0
        })
    }

    /// Flux added at the flare cadence
    pub fn flare_image(&self) -> Array2<f64> {
        let (column, row) = self.star_position;
        self.psf().render(column, row, self.flare_flux, 1.0, 1.0, 0.0)
    }

    pub fn images(&self) -> Array3<f64> {
        let (column, row) = self.star_position;
        let star = self.psf().render(column, row, self.quiescent_flux, 1.0, 1.0, 0.0);
        let flare = self.flare_image();
        let (n_rows, n_cols) = self.shape;
        let mut images = Array3::zeros((self.n_cadences, n_rows, n_cols));
        for (k, mut image) in images.axis_iter_mut(Axis(0)).enumerate() {
            let background = self.background + self.drift * k.approx_as::<f64>().unwrap();
            image.assign(&star);
            image.mapv_inplace(|x| x + background);
            if k == self.flare_cadence {
                image += &flare;
            }
        }
        images
    }

    /// Pixel data with the target at the given CCD position
    pub fn target_pixel_data(
        &self,
        target: (f64, f64),
    ) -> TargetPixelData<GaussianPsf, LinearWcs> {
        let (ra, dec) = self.sky_position(target.0, target.1);
        TargetPixelData {
            images: self.images(),
            time: self.time(),
            quality: Array1::zeros(self.n_cadences),
            column: self.origin.0,
            row: self.origin.1,
            ra,
            dec,
            aperture: None,
            wcs: self.wcs(),
            psf: self.psf(),
        }
    }
}

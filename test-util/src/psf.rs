use conv::prelude::*;
use flare_localization::PsfModel;
use ndarray::Array2;

/// Circular Gaussian PSF sampled at pixel centers
///
/// Pixel `(i, j)` of the cutout has its center at CCD position
/// `(origin.0 + j + 0.5, origin.1 + i + 0.5)`, so a source rendered at `(c, r)` peaks at the
/// pixel whose absolute index is `(c - 0.5, r - 0.5)`.
#[derive(Clone, Debug)]
pub struct GaussianPsf {
    /// `(n_rows, n_cols)`
    pub shape: (usize, usize),
    /// CCD `(column, row)` of the first pixel
    pub origin: (f64, f64),
    pub sigma: f64,
}

impl GaussianPsf {
    pub fn new(shape: (usize, usize), origin: (f64, f64), sigma: f64) -> Self {
        Self {
            shape,
            origin,
            sigma,
        }
    }
}

impl PsfModel for GaussianPsf {
    fn render(
        &self,
        center_col: f64,
        center_row: f64,
        flux: f64,
        scale_col: f64,
        scale_row: f64,
        rotation_angle: f64,
    ) -> Array2<f64> {
        let sigma_col = self.sigma * scale_col;
        let sigma_row = self.sigma * scale_row;
        let (sin, cos) = rotation_angle.to_radians().sin_cos();
        let norm = flux / (2.0 * std::f64::consts::PI * sigma_col * sigma_row);
        Array2::from_shape_fn(self.shape, |(i, j)| {
            let x = self.origin.0 + j.approx_as::<f64>().unwrap() + 0.5 - center_col;
            let y = self.origin.1 + i.approx_as::<f64>().unwrap() + 0.5 - center_row;
            let u = (x * cos + y * sin) / sigma_col;
            let v = (-x * sin + y * cos) / sigma_row;
            norm * f64::exp(-0.5 * (u * u + v * v))
        })
    }
}

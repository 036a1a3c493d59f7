use crate::config::{FlareImageConfig, InstrumentConfig};
use crate::error::LocalizationError;
use crate::flare_image::cadence::{
    CadenceLookup, CadenceWindows, FlareTime, find_image_index, lookup_index,
};
use crate::polynomial::Polynomial;

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView3, Axis, s};
use ndarray_stats::QuantileExt;
use serde::{Deserialize, Serialize};

/// Background-subtracted image of the flare and the by-products of its construction
///
/// All 2-D arrays have `(row, column)` shape of the cutout, 3-D arrays are
/// `(cadence, row, column)` restricted to the with-flare window. Pixels without data at the
/// flare cadence are NaN in every per-pixel output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlareImage {
    pub cadence: CadenceLookup,
    pub windows: CadenceWindows,
    /// Raw flux minus baseline at the flare cadence, shifted by `offset`
    pub image: Array2<f64>,
    /// Shift applied to `image` to make all its finite pixels non-negative
    pub offset: f64,
    /// Standard deviation of the baseline residuals over the without-flare window
    pub residual_std: Array2<f64>,
    pub baseline_window: Array3<f64>,
    pub baseline_at_flare: Array2<f64>,
    pub raw_at_flare: Array2<f64>,
    pub images_window: Array3<f64>,
    pub time_window: Array1<f64>,
}

impl FlareImage {
    pub fn n_finite(&self) -> usize {
        self.image.iter().filter(|x| x.is_finite()).count()
    }
}

/// Per-pixel quiescent baseline of one pixel
struct PixelBaseline {
    window: Array1<f64>,
    at_flare: f64,
    residual_std: f64,
}

/// Builds flare images from pixel time series
#[derive(Clone, Debug, Default)]
pub struct FlareImageBuilder {
    instrument: InstrumentConfig,
    config: FlareImageConfig,
}

impl FlareImageBuilder {
    pub fn new(instrument: InstrumentConfig, config: FlareImageConfig) -> Self {
        Self { instrument, config }
    }

    /// Window half-width in cadences
    pub fn window_length(&self) -> usize {
        self.instrument.cadences_in(self.config.window_length_hours)
    }

    /// Construct the flare image
    ///
    /// `images` is `(cadence, row, column)` and `time` is co-indexed with its first axis.
    /// The function returns [LocalizationError::NoUsableData] if no finite pixel is left in
    /// the flare image.
    pub fn build(
        &self,
        images: ArrayView3<f64>,
        time: ArrayView1<f64>,
        flare: FlareTime,
    ) -> Result<FlareImage, LocalizationError> {
        let n_cadences = images.len_of(Axis(0));
        if n_cadences != time.len() {
            return Err(LocalizationError::ShapeMismatch {
                array: "time",
                expected: n_cadences,
                actual: time.len(),
            });
        }

        let cadence = match flare {
            FlareTime::Time(t) => find_image_index(time, t)?,
            FlareTime::Index(i) => lookup_index(time, i)?,
        };
        let windows = CadenceWindows::new(
            cadence.index,
            self.window_length(),
            self.config.exclusion_before,
            self.config.exclusion_after,
            n_cadences,
        );

        let images_window = images.select(Axis(0), &windows.with_flare);
        let time_window = time.select(Axis(0), &windows.with_flare);
        let time_fit = time.select(Axis(0), &windows.without_flare);
        let images_fit = images.select(Axis(0), &windows.without_flare);
        let raw_at_flare = images.index_axis(Axis(0), cadence.index).to_owned();
        let t_flare = time[cadence.index];

        let (n_rows, n_cols) = raw_at_flare.dim();
        let mut residual_std = Array2::from_elem((n_rows, n_cols), f64::NAN);
        let mut baseline_at_flare = Array2::from_elem((n_rows, n_cols), f64::NAN);
        let mut baseline_window =
            Array3::from_elem((windows.with_flare.len(), n_rows, n_cols), f64::NAN);

        for ((i, j), &flux_at_flare) in raw_at_flare.indexed_iter() {
            if flux_at_flare.is_nan() {
                continue;
            }
            let flux_fit = images_fit.slice(s![.., i, j]);
            let Some(baseline) =
                self.pixel_baseline(time_fit.view(), flux_fit, time_window.view(), t_flare)?
            else {
                continue;
            };
            residual_std[[i, j]] = baseline.residual_std;
            baseline_at_flare[[i, j]] = baseline.at_flare;
            baseline_window
                .slice_mut(s![.., i, j])
                .assign(&baseline.window);
        }

        let mut image = &raw_at_flare - &baseline_at_flare;
        if !image.iter().any(|x| x.is_finite()) {
            return Err(LocalizationError::NoUsableData);
        }
        let offset = image.min_skipnan().abs();
        image.mapv_inplace(|x| x + offset);

        Ok(FlareImage {
            cadence,
            windows,
            image,
            offset,
            residual_std,
            baseline_window,
            baseline_at_flare,
            raw_at_flare,
            images_window,
            time_window,
        })
    }

    /// Fit the quiescent baseline of a single pixel, `None` if it has too few usable samples
    fn pixel_baseline(
        &self,
        time_fit: ArrayView1<f64>,
        flux_fit: ArrayView1<f64>,
        time_window: ArrayView1<f64>,
        t_flare: f64,
    ) -> Result<Option<PixelBaseline>, LocalizationError> {
        let (t, m): (Vec<_>, Vec<_>) = time_fit
            .iter()
            .zip(flux_fit.iter())
            .filter(|(t, m)| t.is_finite() && m.is_finite())
            .map(|(&t, &m)| (t, m))
            .unzip();
        if t.len() <= self.config.polynomial_order {
            return Ok(None);
        }
        let t = Array1::from_vec(t);
        let m = Array1::from_vec(m);

        let poly = Polynomial::fit(t.view(), m.view(), self.config.polynomial_order)?;
        Ok(Some(PixelBaseline {
            window: poly.eval_array(time_window),
            at_flare: poly.eval(t_flare),
            residual_std: poly.residual_std(t.view(), m.view()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use rand::prelude::*;
    use rand_distr::StandardNormal;

    fn cubic(t: f64) -> f64 {
        t.powi(3) - 0.5 * t.powi(2) + 10.0 * t + 4.0
    }

    /// 15 cadences of 3x3 pixels following the same cubic
    fn cubic_series() -> (Array3<f64>, Array1<f64>) {
        let time = Array1::linspace(0.0, 10.0, 15);
        let mut images = Array3::zeros((15, 3, 3));
        for (k, &t) in time.iter().enumerate() {
            images.index_axis_mut(Axis(0), k).fill(cubic(t));
        }
        (images, time)
    }

    /// Window of 7 cadences, covering the whole series for flare at 7
    fn builder() -> FlareImageBuilder {
        FlareImageBuilder::new(
            InstrumentConfig::new(2),
            FlareImageConfig::new(3.5, 2, 4, 3),
        )
    }

    #[test]
    fn cubic_baseline_is_exact() {
        let (images, time) = cubic_series();
        let flare = builder()
            .build(images.view(), time.view(), FlareTime::Index(7))
            .unwrap();
        assert_eq!(flare.windows.with_flare.len(), 15);
        assert_eq!(flare.windows.without_flare.len(), 8);
        for &std in flare.residual_std.iter() {
            assert_abs_diff_eq!(std, 0.0, epsilon = 1e-8);
        }
        for &b in flare.baseline_at_flare.iter() {
            assert_abs_diff_eq!(b, cubic(time[7]), epsilon = 1e-8);
        }
        for (k, &t) in flare.time_window.iter().enumerate() {
            for &b in flare.baseline_window.index_axis(Axis(0), k).iter() {
                assert_abs_diff_eq!(b, cubic(t), epsilon = 1e-8);
            }
        }
        for &x in flare.image.iter() {
            assert_abs_diff_eq!(x, 0.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn flare_pixel_stands_out() {
        let (mut images, time) = cubic_series();
        images[[7, 1, 2]] += 100.0;
        let flare = builder()
            .build(images.view(), time.view(), FlareTime::Time(time[7]))
            .unwrap();
        assert!(flare.cadence.exact);
        assert_abs_diff_eq!(flare.image[[1, 2]], 100.0, epsilon = 1e-6);
        assert_abs_diff_eq!(flare.image[[0, 0]], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(flare.raw_at_flare[[1, 2]], cubic(time[7]) + 100.0);
    }

    #[test]
    fn nan_pixel_propagates_only_to_itself() {
        let (mut images, time) = cubic_series();
        images[[7, 0, 2]] = f64::NAN;
        let flare = builder()
            .build(images.view(), time.view(), FlareTime::Index(7))
            .unwrap();
        assert!(flare.residual_std[[0, 2]].is_nan());
        assert!(flare.baseline_at_flare[[0, 2]].is_nan());
        assert!(flare.image[[0, 2]].is_nan());
        assert!(
            flare
                .baseline_window
                .slice(s![.., 0, 2])
                .iter()
                .all(|x| x.is_nan())
        );
        assert_eq!(flare.n_finite(), 8);
        for ((i, j), &std) in flare.residual_std.indexed_iter() {
            if (i, j) != (0, 2) {
                assert!(std.is_finite());
                assert!(flare.image[[i, j]].is_finite());
            }
        }
    }

    #[test]
    fn missing_cadence_outside_flare_is_skipped() {
        let (mut images, mut time) = cubic_series();
        images[[1, 1, 1]] = f64::NAN;
        time[13] = f64::NAN;
        let flare = builder()
            .build(images.view(), time.view(), FlareTime::Index(7))
            .unwrap();
        assert!(flare.image.iter().all(|x| x.is_finite()));
        assert_abs_diff_eq!(flare.residual_std[[1, 1]], 0.0, epsilon = 1e-8);
    }

    #[test]
    fn offset_makes_image_non_negative() {
        let (mut images, time) = cubic_series();
        let mut rng = StdRng::seed_from_u64(0);
        images.mapv_inplace(|x| {
            let eps: f64 = rng.sample(StandardNormal);
            x + 5.0 * eps
        });
        let flare = builder()
            .build(images.view(), time.view(), FlareTime::Index(7))
            .unwrap();
        let difference = &flare.raw_at_flare - &flare.baseline_at_flare;
        let min = difference.iter().copied().fold(f64::INFINITY, f64::min);
        assert_eq!(flare.offset, min.abs());
        let image_min = flare.image.iter().copied().fold(f64::INFINITY, f64::min);
        assert!(image_min >= 0.0);
    }

    #[test]
    fn all_nan_flare_cadence() {
        let (mut images, time) = cubic_series();
        images.index_axis_mut(Axis(0), 7).fill(f64::NAN);
        assert_eq!(
            builder()
                .build(images.view(), time.view(), FlareTime::Index(7))
                .unwrap_err(),
            LocalizationError::NoUsableData
        );
    }

    #[test]
    fn too_few_baseline_points() {
        let (images, time) = cubic_series();
        // 1-cadence window: only two baseline points are left for a cubic
        let builder = FlareImageBuilder::new(
            InstrumentConfig::new(2),
            FlareImageConfig::new(0.5, 0, 0, 3),
        );
        assert_eq!(
            builder
                .build(images.view(), time.view(), FlareTime::Index(7))
                .unwrap_err(),
            LocalizationError::NoUsableData
        );
    }

    #[test]
    fn window_is_clipped_at_the_edge() {
        let (images, time) = cubic_series();
        let flare = builder()
            .build(images.view(), time.view(), FlareTime::Index(13))
            .unwrap();
        assert_eq!(flare.windows.with_flare, (6..15).collect::<Vec<_>>());
        assert_eq!(flare.images_window.len_of(Axis(0)), 9);
        assert_eq!(flare.time_window.len(), 9);
        assert_eq!(flare.windows.flare_offset(), 7);
    }

    #[test]
    fn shape_mismatch() {
        let (images, _) = cubic_series();
        let time = Array1::linspace(0.0, 10.0, 14);
        assert_eq!(
            builder()
                .build(images.view(), time.view(), FlareTime::Index(7))
                .unwrap_err(),
            LocalizationError::ShapeMismatch {
                array: "time",
                expected: 15,
                actual: 14
            }
        );
    }
}

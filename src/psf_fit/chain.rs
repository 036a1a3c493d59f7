use crate::psf_fit::parameter::{FitParameter, Parameter};
use crate::sorted_array::SortedArray;

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayView3, Axis, s};
use serde::{Deserialize, Serialize};

/// Shift from the PSF model's pixel-corner convention to the pixel-center convention
pub const PIXEL_CENTER_SHIFT: f64 = -0.5;

/// Flattened post-burn-in samples of an ensemble run
///
/// Rows are samples, walker-major, columns follow [FitParameter] order. Positions are in the
/// convention of the PSF model.
#[derive(Clone, Debug, PartialEq)]
pub struct RawChain(Array2<f64>);

impl RawChain {
    /// Discard the first `n_discard` steps of every walker of a `(walker, step, parameter)`
    /// chain and flatten the rest
    pub fn from_walkers(walkers: ArrayView3<f64>, n_discard: usize) -> Self {
        let (n_walkers, n_steps, n_params) = walkers.dim();
        assert_eq!(n_params, FitParameter::COUNT, "wrong number of parameters");
        assert!(n_discard < n_steps, "burn-in must be shorter than the chain");
        let kept = walkers.slice(s![.., n_discard.., ..]);
        let samples = Array2::from_shape_fn(
            (n_walkers * (n_steps - n_discard), n_params),
            |(i, j)| kept[[i / (n_steps - n_discard), i % (n_steps - n_discard), j]],
        );
        Self(samples)
    }

    pub fn samples(&self) -> ArrayView2<'_, f64> {
        self.0.view()
    }

    /// Sample mean of every parameter
    pub fn mean(&self) -> [f64; FitParameter::COUNT] {
        let mean = self
            .0
            .mean_axis(Axis(0))
            .expect("chain has at least one sample");
        std::array::from_fn(|i| mean[i])
    }

    /// Move positions to the pixel-center convention, consuming the raw chain so the shift
    /// can't be applied twice
    pub fn center_pixels(mut self) -> Chain {
        for param in FitParameter::ALL.into_iter().filter(|p| p.is_position()) {
            self.0
                .column_mut(param.index())
                .mapv_inplace(|x| x + PIXEL_CENTER_SHIFT);
        }
        Chain(self.0)
    }
}

/// Pixel-centered chain
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Chain(Array2<f64>);

impl Chain {
    pub fn samples(&self) -> ArrayView2<'_, f64> {
        self.0.view()
    }

    pub fn n_samples(&self) -> usize {
        self.0.nrows()
    }

    pub fn column(&self, param: FitParameter) -> ArrayView1<'_, f64> {
        self.0.column(param.index())
    }

    /// `(n_samples, 2)` view of the column and row marginal
    pub fn position(&self) -> ArrayView2<'_, f64> {
        self.0.slice(s![.., ..2])
    }

    /// Median with the 16th and 84th percentiles as the asymmetric interval
    pub fn summarize(&self, param: FitParameter, init_value: f64) -> Parameter {
        let sorted = SortedArray::from(self.column(param));
        let p16 = sorted.percentile(16.0);
        let p50 = sorted.median();
        let p84 = sorted.percentile(84.0);
        let (minus, plus) = (p50 - p16, p84 - p50);
        log::info!("{}: {p50} -{minus} +{plus}", param.name());
        Parameter {
            min: p50 - minus,
            max: p50 + plus,
            value: Some(p50),
            init_value,
            err: minus + plus,
        }
    }
}

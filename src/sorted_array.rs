use conv::prelude::*;
use ndarray::{Array1, ArrayView1};
use std::ops::Deref;

// Underlying array is guaranteed to be sorted and contiguous
#[derive(Clone, Debug, PartialEq)]
pub struct SortedArray(pub Array1<f64>);

impl SortedArray {
    pub fn maximum(&self) -> f64 {
        self[self.len() - 1]
    }

    pub fn median(&self) -> f64 {
        self.percentile(50.0)
    }

    /// Percentile with linear interpolation between closest ranks, R-7 from
    /// https://en.wikipedia.org/wiki/Quantile
    ///
    /// `q` is in percents, it is the same estimator as `numpy.percentile` default.
    pub fn percentile(&self, q: f64) -> f64 {
        assert_ne!(self.len(), 0);
        assert!(
            (0.0..=100.0).contains(&q),
            "percentile should be between zero and one hundred"
        );
        let h = (self.len() - 1).approx_as::<f64>().unwrap() * q / 100.0;
        let h_floor = h.floor();
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let i = h_floor as usize;
        if i >= self.len() - 1 {
            self.maximum()
        } else {
            self[i] + (h - h_floor) * (self[i + 1] - self[i])
        }
    }
}

impl From<Vec<f64>> for SortedArray {
    fn from(mut v: Vec<f64>) -> Self {
        v[..].sort_unstable_by(f64::total_cmp);
        Self(Array1::from_vec(v))
    }
}

impl From<ArrayView1<'_, f64>> for SortedArray {
    fn from(v: ArrayView1<'_, f64>) -> Self {
        v.to_vec().into()
    }
}

impl Deref for SortedArray {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice().unwrap()
    }
}

//! Ordinary least-squares polynomial regression used for the quiescent baseline

use crate::error::LocalizationError;

use conv::prelude::*;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView1, Zip};

/// Polynomial fitted to `(x, y)` samples
///
/// The regression is solved for the standardized argument `(x - x_mean) / x_std`, which keeps
/// the Vandermonde matrix well-conditioned for time stamps of order `1e3` days. It doesn't
/// change the fitted function, only its internal representation.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    /// Coefficients of the standardized argument, lowest power first
    coeffs: Vec<f64>,
    x_mean: f64,
    x_std: f64,
}

impl Polynomial {
    /// Least-squares fit of a polynomial of `order` to `y` as a function of `x`
    ///
    /// `x` and `y` must have the same length, contain no NaN and have at least `order + 1`
    /// points. The caller is responsible for these preconditions.
    pub fn fit(
        x: ArrayView1<f64>,
        y: ArrayView1<f64>,
        order: usize,
    ) -> Result<Self, LocalizationError> {
        assert_eq!(x.len(), y.len(), "x and y should have the same size");
        let n = x.len();
        let n_f: f64 = n.approx_as::<f64>().unwrap();

        let x_mean = x.sum() / n_f;
        let x_std = {
            let std = (x.fold(0.0, |acc, &x| acc + (x - x_mean).powi(2)) / n_f).sqrt();
            if std > 0.0 { std } else { 1.0 }
        };

        let vandermonde = DMatrix::from_fn(n, order + 1, |i, j| {
            let u = (x[i] - x_mean) / x_std;
            u.powi(j as i32)
        });
        let rhs = DVector::from_iterator(n, y.iter().copied());
        let solution = vandermonde
            .svd(true, true)
            .solve(&rhs, f64::EPSILON)
            .map_err(LocalizationError::LinearAlgebra)?;

        Ok(Self {
            coeffs: solution.iter().copied().collect(),
            x_mean,
            x_std,
        })
    }

    pub fn order(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn eval(&self, x: f64) -> f64 {
        let u = (x - self.x_mean) / self.x_std;
        // Horner scheme
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * u + c)
    }

    pub fn eval_array(&self, x: ArrayView1<f64>) -> Array1<f64> {
        x.mapv(|x| self.eval(x))
    }

    /// Population standard deviation of `y - polynomial(x)`
    pub fn residual_std(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        let n: f64 = x.len().approx_as::<f64>().unwrap();
        let residuals: Array1<f64> = Zip::from(&x).and(&y).map_collect(|&x, &y| y - self.eval(x));
        let mean = residuals.sum() / n;
        (residuals.fold(0.0, |acc, &r| acc + (r - mean).powi(2)) / n).sqrt()
    }
}

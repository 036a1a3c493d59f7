use crate::error::LocalizationError;

use conv::prelude::*;
use ndarray::ArrayView2;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Fit parameters in the fixed order of the sampler's parameter vector and of the chain columns
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum FitParameter {
    Column = 0,
    Row = 1,
    Flux = 2,
    Offset = 3,
}

impl FitParameter {
    pub const COUNT: usize = 4;

    pub const ALL: [Self; Self::COUNT] = [Self::Column, Self::Row, Self::Flux, Self::Offset];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Column => "flare_column",
            Self::Row => "flare_row",
            Self::Flux => "flare_flux",
            Self::Offset => "offset_flux",
        }
    }

    /// Is it one of the two pixel-position parameters
    pub const fn is_position(self) -> bool {
        matches!(self, Self::Column | Self::Row)
    }
}

/// Single fit parameter
///
/// `min` and `max` are the hard prior bounds before fitting and the 16th and 84th percentiles
/// of the posterior after it. `err` is the Gaussian prior width before fitting and the
/// 16-84 percentile spread after it.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Parameter {
    pub min: f64,
    pub max: f64,
    pub value: Option<f64>,
    pub init_value: f64,
    pub err: f64,
}

impl Parameter {
    /// Prior center, falls back to the initial value for parameters without a point estimate
    pub fn center(&self) -> f64 {
        self.value.unwrap_or(self.init_value)
    }

    /// Strict check of `min < x < max`, NaN is never within bounds
    pub fn contains(&self, x: f64) -> bool {
        self.min < x && x < self.max
    }
}

/// All four fit parameters indexed by [FitParameter]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FitParameters([Parameter; FitParameter::COUNT]);

impl FitParameters {
    pub fn new(column: Parameter, row: Parameter, flux: Parameter, offset: Parameter) -> Self {
        Self([column, row, flux, offset])
    }

    /// Data-driven initial guess
    ///
    /// - flux is bounded by `[0, 2 * sum]` of the finite flare-image values and starts from
    ///   the sum, its width is `sqrt(aperture_pixels / pi) / 5`
    /// - column and row are bounded by the cutout footprint starting at `origin` and start
    ///   from `centroid`, both are absolute `(column, row)` CCD positions
    /// - offset is bounded from below by zero and starts from the mean finite value, its width
    ///   is the standard deviation of the finite values
    pub fn initial(
        image: ArrayView2<f64>,
        centroid: (f64, f64),
        origin: (f64, f64),
        aperture_pixels: usize,
    ) -> Result<Self, LocalizationError> {
        let finite: Vec<f64> = image.iter().copied().filter(|x| x.is_finite()).collect();
        if finite.is_empty() {
            return Err(LocalizationError::NoUsableData);
        }
        let n: f64 = finite.len().approx_as::<f64>().unwrap();
        let sum: f64 = finite.iter().sum();
        let mean = sum / n;
        let std = (finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let aperture: f64 = aperture_pixels.approx_as::<f64>().unwrap();

        let (n_rows, n_cols) = image.dim();
        let (column_0, row_0) = origin;
        let (column, row) = centroid;

        Ok(Self::new(
            Parameter {
                min: column_0,
                max: column_0 + n_cols.approx_as::<f64>().unwrap(),
                value: Some(column),
                init_value: column,
                err: 0.5,
            },
            Parameter {
                min: row_0,
                max: row_0 + n_rows.approx_as::<f64>().unwrap(),
                value: Some(row),
                init_value: row,
                err: 0.5,
            },
            Parameter {
                min: 0.0,
                max: 2.0 * sum,
                value: None,
                init_value: sum,
                err: (aperture / std::f64::consts::PI).sqrt() / 5.0,
            },
            Parameter {
                min: 0.0,
                max,
                value: Some(mean),
                init_value: mean,
                err: std,
            },
        ))
    }

    pub fn init_values(&self) -> [f64; FitParameter::COUNT] {
        std::array::from_fn(|i| self.0[i].init_value)
    }

    pub fn set_init_values(&mut self, values: [f64; FitParameter::COUNT]) {
        for (param, value) in self.0.iter_mut().zip(values) {
            param.init_value = value;
        }
    }
}

impl Index<FitParameter> for FitParameters {
    type Output = Parameter;

    fn index(&self, index: FitParameter) -> &Self::Output {
        &self.0[index.index()]
    }
}

impl IndexMut<FitParameter> for FitParameters {
    fn index_mut(&mut self, index: FitParameter) -> &mut Self::Output {
        &mut self.0[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn order_is_declared_once() {
        for (i, p) in FitParameter::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
        assert!(FitParameter::Column.is_position());
        assert!(FitParameter::Row.is_position());
        assert!(!FitParameter::Flux.is_position());
    }

    #[test]
    fn initial_guess_from_image() {
        let image = array![[1.0, 2.0, f64::NAN], [3.0, 4.0, 10.0]];
        let params = FitParameters::initial(image.view(), (101.2, 50.7), (100.0, 50.0), 9).unwrap();

        let column = &params[FitParameter::Column];
        assert_eq!((column.min, column.max), (100.0, 103.0));
        assert_eq!(column.init_value, 101.2);
        assert_eq!(column.err, 0.5);

        let row = &params[FitParameter::Row];
        assert_eq!((row.min, row.max), (50.0, 52.0));
        assert_eq!(row.value, Some(50.7));

        let flux = &params[FitParameter::Flux];
        assert_eq!((flux.min, flux.max), (0.0, 40.0));
        assert_eq!(flux.init_value, 20.0);
        assert_eq!(flux.value, None);
        assert_relative_eq!(flux.err, (9.0 / std::f64::consts::PI).sqrt() / 5.0);

        let offset = &params[FitParameter::Offset];
        assert_eq!((offset.min, offset.max), (0.0, 10.0));
        assert_eq!(offset.init_value, 4.0);
        assert_relative_eq!(offset.err, 10.0_f64.sqrt());
    }

    #[test]
    fn all_nan_image() {
        let image = array![[f64::NAN, f64::NAN]];
        assert_eq!(
            FitParameters::initial(image.view(), (0.0, 0.0), (0.0, 0.0), 1),
            Err(LocalizationError::NoUsableData)
        );
    }

    #[test]
    fn bounds_are_strict() {
        let p = Parameter {
            min: 0.0,
            max: 1.0,
            value: None,
            init_value: 0.5,
            err: 0.1,
        };
        assert!(p.contains(0.5));
        assert!(!p.contains(0.0));
        assert!(!p.contains(1.0));
        assert!(!p.contains(f64::NAN));
        assert_eq!(p.center(), 0.5);
    }

    #[test]
    fn init_values_follow_order() {
        let image = array![[1.0, 2.0], [3.0, 4.0]];
        let mut params = FitParameters::initial(image.view(), (0.5, 1.5), (0.0, 0.0), 4).unwrap();
        assert_eq!(params.init_values(), [0.5, 1.5, 10.0, 2.5]);
        params.set_init_values([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(params[FitParameter::Flux].init_value, 3.0);
        assert_eq!(params[FitParameter::Column].value, Some(0.5));
    }
}

use crate::ellipse::confidence::ConfidenceLevel;
use crate::error::LocalizationError;
use crate::psf_fit::Chain;

use nalgebra::Matrix2;
use ndarray::{Array2, ArrayView2, Axis};
use ndarray_stats::CorrelationExt;
use serde::{Deserialize, Serialize};

/// Covariance ellipse of the flare position
///
/// `width` and `height` are full axis lengths along the major and the minor eigenvector of the
/// position covariance, `theta` is the major axis direction in degrees, counted from the column
/// axis towards the row axis.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FlareEllipse {
    pub level: ConfidenceLevel,
    /// `(column, row)`
    pub center: (f64, f64),
    pub width: f64,
    pub height: f64,
    pub theta: f64,
}

/// Mean, descending eigenvalues and major axis angle of the position samples
struct PositionEigenbasis {
    center: (f64, f64),
    eigenvalues: [f64; 2],
    theta: f64,
}

impl PositionEigenbasis {
    /// `position` is `(n_samples, 2)` with column and row
    fn new(position: ArrayView2<f64>) -> Result<Self, LocalizationError> {
        let mean = position
            .mean_axis(Axis(0))
            .ok_or(LocalizationError::NoUsableData)?;
        // sample covariance needs at least two samples
        let cov = if position.nrows() > 1 {
            position
                .t()
                .cov(1.0)
                .map_err(|_| LocalizationError::NoUsableData)?
        } else {
            Array2::from_elem((2, 2), f64::NAN)
        };

        if cov.iter().any(|x| !x.is_finite()) {
            log::warn!("position covariance is not finite: {cov:?}");
            return Ok(Self {
                center: (mean[0], mean[1]),
                eigenvalues: [f64::NAN; 2],
                theta: f64::NAN,
            });
        }

        let eigen = Matrix2::new(cov[[0, 0]], cov[[0, 1]], cov[[1, 0]], cov[[1, 1]])
            .try_symmetric_eigen(f64::EPSILON, 1000)
            .ok_or(LocalizationError::LinearAlgebra(
                "eigendecomposition of the position covariance did not converge",
            ))?;
        let (major, minor) = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] {
            (0, 1)
        } else {
            (1, 0)
        };
        let direction = eigen.eigenvectors.column(major);
        Ok(Self {
            center: (mean[0], mean[1]),
            eigenvalues: [eigen.eigenvalues[major], eigen.eigenvalues[minor]],
            theta: direction[1].atan2(direction[0]).to_degrees(),
        })
    }

    fn ellipse(&self, level: ConfidenceLevel) -> FlareEllipse {
        let scale = 2.0 * level.chi2_quantile().sqrt();
        FlareEllipse {
            level,
            center: self.center,
            width: scale * self.eigenvalues[0].sqrt(),
            height: scale * self.eigenvalues[1].sqrt(),
            theta: self.theta,
        }
    }
}

impl FlareEllipse {
    /// Ellipse of `(n_samples, 2)` column and row samples
    pub fn from_positions(
        position: ArrayView2<f64>,
        level: ConfidenceLevel,
    ) -> Result<Self, LocalizationError> {
        Ok(PositionEigenbasis::new(position)?.ellipse(level))
    }

    /// Squared elliptical radius of a point, not larger than unity inside the ellipse
    ///
    /// The point is rotated by `180 - theta` degrees around the center.
    pub fn scaled_radius(&self, column: f64, row: f64) -> f64 {
        let (sin, cos) = (180.0 - self.theta).to_radians().sin_cos();
        let x = column - self.center.0;
        let y = row - self.center.1;
        let x_rot = x * cos - y * sin;
        let y_rot = x * sin + y * cos;
        (x_rot / (0.5 * self.width)).powi(2) + (y_rot / (0.5 * self.height)).powi(2)
    }

    pub fn contains(&self, column: f64, row: f64) -> bool {
        self.scaled_radius(column, row) <= 1.0
    }

    /// Euclidean distance to the center
    pub fn distance(&self, column: f64, row: f64) -> f64 {
        f64::hypot(column - self.center.0, row - self.center.1)
    }
}

/// The three nested ellipses of a chain
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceEllipses {
    pub p68: FlareEllipse,
    pub p95: FlareEllipse,
    pub p999: FlareEllipse,
}

impl ConfidenceEllipses {
    pub fn from_positions(position: ArrayView2<f64>) -> Result<Self, LocalizationError> {
        let basis = PositionEigenbasis::new(position)?;
        Ok(Self {
            p68: basis.ellipse(ConfidenceLevel::P68),
            p95: basis.ellipse(ConfidenceLevel::P95),
            p999: basis.ellipse(ConfidenceLevel::P999),
        })
    }

    pub fn from_chain(chain: &Chain) -> Result<Self, LocalizationError> {
        Self::from_positions(chain.position())
    }
}

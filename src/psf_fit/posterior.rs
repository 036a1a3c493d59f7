use crate::collaborators::PsfModel;
use crate::psf_fit::parameter::{FitParameter, FitParameters, Parameter};

use ndarray::{Array2, ArrayView2, Zip};

/// Log-probability density of a parameter vector of `NPARAMS` entries
pub trait LnProbability<const NPARAMS: usize> {
    fn ln_prior(&self, theta: &[f64; NPARAMS]) -> f64;

    fn ln_like(&self, theta: &[f64; NPARAMS]) -> f64;

    /// Likelihood is not evaluated when the prior is not finite
    fn ln_prob(&self, theta: &[f64; NPARAMS]) -> f64 {
        let ln_prior = self.ln_prior(theta);
        if !ln_prior.is_finite() {
            return f64::NEG_INFINITY;
        }
        ln_prior + self.ln_like(theta)
    }
}

/// Normal log-density with precomputed normalization
#[derive(Clone, Copy, Debug)]
struct NormalLnPrior {
    mu: f64,
    inv_std2: f64,
    ln_prob_coeff: f64,
}

impl NormalLnPrior {
    fn new(mu: f64, std: f64) -> Self {
        Self {
            mu,
            inv_std2: std.powi(-2),
            ln_prob_coeff: -f64::ln(std) - 0.5 * f64::ln(std::f64::consts::TAU),
        }
    }

    fn from_parameter(param: &Parameter) -> Self {
        Self::new(param.center(), param.err)
    }

    fn ln_prior(&self, x: f64) -> f64 {
        self.ln_prob_coeff - 0.5 * (x - self.mu).powi(2) * self.inv_std2
    }
}

/// Posterior of a point source rendered by the PSF on top of a constant offset
///
/// The prior is flat within the hard bounds of flux, column and row, has a lower bound for the
/// offset, and adds Gaussian terms for column, row and offset. The likelihood is Poisson:
/// `sum(data * ln(model) - model)` over the finite pixels of the data.
pub struct PsfPosterior<'a, P> {
    data: ArrayView2<'a, f64>,
    psf: &'a P,
    params: &'a FitParameters,
    column_prior: NormalLnPrior,
    row_prior: NormalLnPrior,
    offset_prior: NormalLnPrior,
}

impl<'a, P> PsfPosterior<'a, P>
where
    P: PsfModel,
{
    pub fn new(data: ArrayView2<'a, f64>, psf: &'a P, params: &'a FitParameters) -> Self {
        Self {
            data,
            psf,
            params,
            column_prior: NormalLnPrior::from_parameter(&params[FitParameter::Column]),
            row_prior: NormalLnPrior::from_parameter(&params[FitParameter::Row]),
            offset_prior: NormalLnPrior::from_parameter(&params[FitParameter::Offset]),
        }
    }

    /// Synthetic image: unit-scale non-rotated PSF plus the offset
    pub fn model_image(&self, theta: &[f64; FitParameter::COUNT]) -> Array2<f64> {
        let column = theta[FitParameter::Column.index()];
        let row = theta[FitParameter::Row.index()];
        let flux = theta[FitParameter::Flux.index()];
        let offset = theta[FitParameter::Offset.index()];
        self.psf.render(column, row, flux, 1.0, 1.0, 0.0) + offset
    }
}

impl<P> LnProbability<{ FitParameter::COUNT }> for PsfPosterior<'_, P>
where
    P: PsfModel,
{
    fn ln_prior(&self, theta: &[f64; FitParameter::COUNT]) -> f64 {
        let column = theta[FitParameter::Column.index()];
        let row = theta[FitParameter::Row.index()];
        let flux = theta[FitParameter::Flux.index()];
        let offset = theta[FitParameter::Offset.index()];

        let within_bounds = self.params[FitParameter::Flux].contains(flux)
            && self.params[FitParameter::Column].contains(column)
            && self.params[FitParameter::Row].contains(row)
            && self.params[FitParameter::Offset].min < offset;
        if !within_bounds {
            return f64::NEG_INFINITY;
        }

        self.column_prior.ln_prior(column)
            + self.row_prior.ln_prior(row)
            + self.offset_prior.ln_prior(offset)
    }

    /// Non-positive or non-finite model flux in a pixel with data gives negative infinity
    fn ln_like(&self, theta: &[f64; FitParameter::COUNT]) -> f64 {
        let model = self.model_image(theta);
        assert_eq!(
            model.dim(),
            self.data.dim(),
            "PSF must be rendered on the data's pixel grid"
        );
        Zip::from(&self.data)
            .and(&model)
            .fold(0.0, |acc, &data, &model| {
                if data.is_nan() {
                    acc
                } else if model > 0.0 && model.is_finite() {
                    acc + data * model.ln() - model
                } else {
                    f64::NEG_INFINITY
                }
            })
    }
}

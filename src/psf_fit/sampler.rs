use crate::error::LocalizationError;
use crate::psf_fit::posterior::LnProbability;

use emcee::{Guess, Prob};
use ndarray::Array3;

/// Ensemble MCMC sampler
///
/// Given the starting point of every walker, runs `n_steps` iterations and returns the full
/// chain of shape `(n_walkers, n_steps, NPARAMS)`.
pub trait EnsembleSampler {
    fn sample<LP, const NPARAMS: usize>(
        &mut self,
        ln_prob: &LP,
        initial: &[[f64; NPARAMS]],
        n_steps: usize,
    ) -> Result<Array3<f64>, LocalizationError>
    where
        LP: LnProbability<NPARAMS>;
}

/// Affine-invariant ensemble sampler of the [emcee] crate
///
/// `emcee` works in single precision. The likelihood is reported relative to its value at the
/// first walker's starting point, which doesn't change the sampling and keeps large Poisson
/// sums representable.
#[derive(Clone, Debug, Default)]
pub struct EmceeSampler {
    seed: Option<u64>,
    calls: u64,
}

impl EmceeSampler {
    /// `seed` makes the chains reproducible, every call of [EnsembleSampler::sample] uses its
    /// own seed derived from it
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed, calls: 0 }
    }
}

struct EmceeLnProb<'a, LP, const NPARAMS: usize> {
    ln_prob: &'a LP,
    ln_like_reference: f64,
}

impl<LP, const NPARAMS: usize> EmceeLnProb<'_, LP, NPARAMS> {
    fn theta(guess: &Guess) -> [f64; NPARAMS] {
        std::array::from_fn(|i| f64::from(guess.values[i]))
    }
}

impl<LP, const NPARAMS: usize> Prob for EmceeLnProb<'_, LP, NPARAMS>
where
    LP: LnProbability<NPARAMS>,
{
    fn lnlike(&self, params: &Guess) -> f32 {
        (self.ln_prob.ln_like(&Self::theta(params)) - self.ln_like_reference) as f32
    }

    fn lnprior(&self, params: &Guess) -> f32 {
        self.ln_prob.ln_prior(&Self::theta(params)) as f32
    }
}

impl EnsembleSampler for EmceeSampler {
    fn sample<LP, const NPARAMS: usize>(
        &mut self,
        ln_prob: &LP,
        initial: &[[f64; NPARAMS]],
        n_steps: usize,
    ) -> Result<Array3<f64>, LocalizationError>
    where
        LP: LnProbability<NPARAMS>,
    {
        let n_walkers = initial.len();
        let guesses: Vec<Guess> = initial
            .iter()
            .map(|x| Guess::new(&x.iter().map(|&x| x as f32).collect::<Vec<_>>()))
            .collect();

        let ln_like_reference = initial
            .first()
            .map(|x| ln_prob.ln_like(x))
            .filter(|x| x.is_finite())
            .unwrap_or(0.0);
        let emcee_ln_prob = EmceeLnProb {
            ln_prob,
            ln_like_reference,
        };

        let mut sampler = emcee::EnsembleSampler::new(n_walkers, NPARAMS, &emcee_ln_prob)
            .map_err(|e| LocalizationError::Sampler(format!("{e}")))?;
        if let Some(seed) = self.seed {
            let seed = seed.wrapping_add(self.calls) as usize;
            log::debug!("seeding emcee with {seed}");
            sampler.seed(&[seed]);
        }
        self.calls += 1;

        let mut chain = Array3::zeros((n_walkers, n_steps, NPARAMS));
        let mut step_index = 0;
        sampler
            .sample(&guesses, n_steps, |step| {
                for (walker, guess) in step.pos.iter().enumerate() {
                    for (dim, &x) in guess.values.iter().enumerate() {
                        chain[[walker, step_index, dim]] = f64::from(x);
                    }
                }
                step_index += 1;
            })
            .map_err(|e| LocalizationError::Sampler(format!("{e}")))?;

        Ok(chain)
    }
}

use crate::collaborators::PsfModel;
use crate::config::McmcConfig;
use crate::error::LocalizationError;
use crate::psf_fit::chain::{Chain, RawChain};
use crate::psf_fit::parameter::{FitParameter, FitParameters};
use crate::psf_fit::posterior::PsfPosterior;
use crate::psf_fit::sampler::EnsembleSampler;

use ndarray::{Array2, ArrayView2};
use rand::prelude::*;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Result of the two-pass PSF fit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct McmcFit {
    /// Pixel-centered chain of the second pass
    pub chain: Chain,
    pub parameters: FitParameters,
    /// PSF model rendered at the median parameters
    pub model: Array2<f64>,
    pub data: Array2<f64>,
    /// Mean of the first pass, used as the starting point of the second one
    pub bootstrap_mean: [f64; FitParameter::COUNT],
}

/// Ensemble MCMC fit of the PSF model to a flare image
///
/// The sampler runs twice. The first pass starts from the data-driven guess, the second one
/// starts from the mean of the first pass' chain. Both passes share the prior. Convergence is
/// not checked.
pub struct McmcEngine<S> {
    config: McmcConfig,
    sampler: S,
}

impl<S> McmcEngine<S>
where
    S: EnsembleSampler,
{
    pub fn new(config: McmcConfig, sampler: S) -> Self {
        Self { config, sampler }
    }

    pub fn run<P>(
        &mut self,
        data: ArrayView2<f64>,
        psf: &P,
        mut parameters: FitParameters,
    ) -> Result<McmcFit, LocalizationError>
    where
        P: PsfModel,
    {
        self.config.validate()?;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let bootstrap = self.run_pass(data, psf, &parameters, &mut rng)?;
        let bootstrap_mean = bootstrap.mean();
        log::debug!("bootstrap pass mean: {bootstrap_mean:?}");
        parameters.set_init_values(bootstrap_mean);

        let chain = self
            .run_pass(data, psf, &parameters, &mut rng)?
            .center_pixels();

        let fitted = FitParameters::new(
            chain.summarize(FitParameter::Column, parameters[FitParameter::Column].init_value),
            chain.summarize(FitParameter::Row, parameters[FitParameter::Row].init_value),
            chain.summarize(FitParameter::Flux, parameters[FitParameter::Flux].init_value),
            chain.summarize(FitParameter::Offset, parameters[FitParameter::Offset].init_value),
        );
        let medians: [f64; FitParameter::COUNT] =
            std::array::from_fn(|i| fitted[FitParameter::ALL[i]].center());
        let model = PsfPosterior::new(data.view(), psf, &fitted).model_image(&medians);

        Ok(McmcFit {
            chain,
            parameters: fitted,
            model,
            data: data.to_owned(),
            bootstrap_mean,
        })
    }

    fn run_pass<P>(
        &mut self,
        data: ArrayView2<f64>,
        psf: &P,
        parameters: &FitParameters,
        rng: &mut StdRng,
    ) -> Result<RawChain, LocalizationError>
    where
        P: PsfModel,
    {
        let p0 = parameters.init_values();
        log::debug!("walkers start around {p0:?}");
        let initial = walker_ball(&p0, self.config.n_walkers, self.config.jitter, rng);
        let posterior = PsfPosterior::new(data.view(), psf, parameters);
        let walkers = self
            .sampler
            .sample(&posterior, &initial, self.config.n_steps)?;
        Ok(RawChain::from_walkers(walkers.view(), self.config.n_discard))
    }
}

/// Starting points of the walkers: `p0` plus independent Gaussian jitter
fn walker_ball<const NPARAMS: usize>(
    p0: &[f64; NPARAMS],
    n_walkers: usize,
    jitter: f64,
    rng: &mut StdRng,
) -> Vec<[f64; NPARAMS]> {
    (0..n_walkers)
        .map(|_| {
            std::array::from_fn(|i| {
                let eps: f64 = rng.sample(StandardNormal);
                p0[i] + jitter * eps
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::psf_fit::posterior::LnProbability;

    use approx::assert_abs_diff_eq;
    use ndarray::{Array3, array};

    /// Flat PSF spreading the flux over the image
    struct FlatPsf;

    impl PsfModel for FlatPsf {
        fn render(
            &self,
            _center_col: f64,
            _center_row: f64,
            flux: f64,
            _scale_col: f64,
            _scale_row: f64,
            _rotation_angle: f64,
        ) -> Array2<f64> {
            Array2::from_elem((2, 2), flux / 4.0)
        }
    }

    /// Repeats the walkers' starting points shifted by the step number and records them
    #[derive(Default)]
    struct ReplaySampler {
        starts: Vec<Vec<[f64; 4]>>,
    }

    impl EnsembleSampler for ReplaySampler {
        fn sample<LP, const NPARAMS: usize>(
            &mut self,
            ln_prob: &LP,
            initial: &[[f64; NPARAMS]],
            n_steps: usize,
        ) -> Result<Array3<f64>, LocalizationError>
        where
            LP: LnProbability<NPARAMS>,
        {
            assert!(
                initial.iter().all(|x| ln_prob.ln_prob(x).is_finite()),
                "walkers must start within the prior support"
            );
            self.starts.push(
                initial
                    .iter()
                    .map(|x| std::array::from_fn(|i| x[i]))
                    .collect(),
            );
            Ok(Array3::from_shape_fn(
                (initial.len(), n_steps, NPARAMS),
                |(w, s, p)| initial[w][p] + 0.001 * (s as f64),
            ))
        }
    }

    fn parameters() -> FitParameters {
        let image = array![[1.0, 2.0], [3.0, 6.0]];
        FitParameters::initial(image.view(), (1.0, 1.0), (0.0, 0.0), 4).unwrap()
    }

    #[test]
    fn second_pass_starts_from_bootstrap_mean() {
        let data = array![[1.0, 2.0], [3.0, 6.0]];
        let config = McmcConfig::new(10, 20, 10, 0.01, Some(0));
        let mut engine = McmcEngine::new(config, ReplaySampler::default());
        let fit = engine.run(data.view(), &FlatPsf, parameters()).unwrap();

        let starts = &engine.sampler.starts;
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[0].len(), 10);

        // jitter is small around the initial guess
        let p0 = parameters().init_values();
        for walker in &starts[0] {
            for (x, p) in walker.iter().zip(p0.iter()) {
                assert!((x - p).abs() < 0.1);
            }
        }

        let second_mean: Vec<f64> = (0..4)
            .map(|i| starts[1].iter().map(|w| w[i]).sum::<f64>() / 10.0)
            .collect();
        for (mean, bootstrap) in second_mean.iter().zip(fit.bootstrap_mean.iter()) {
            assert_abs_diff_eq!(mean, bootstrap, epsilon = 0.05);
        }
    }

    #[test]
    fn reduction_centers_positions() {
        let data = array![[1.0, 2.0], [3.0, 6.0]];
        let config = McmcConfig::new(10, 20, 10, 0.01, Some(1));
        let mut engine = McmcEngine::new(config, ReplaySampler::default());
        let fit = engine.run(data.view(), &FlatPsf, parameters()).unwrap();

        assert_eq!(fit.chain.n_samples(), 100);
        let column = &fit.parameters[FitParameter::Column];
        let flux = &fit.parameters[FitParameter::Flux];
        // second pass is around the bootstrap mean, shifted to pixel centers
        assert_abs_diff_eq!(
            column.value.unwrap(),
            fit.bootstrap_mean[0] - 0.5,
            epsilon = 0.05
        );
        assert_abs_diff_eq!(flux.value.unwrap(), fit.bootstrap_mean[2], epsilon = 0.05);
        assert!(column.min <= column.value.unwrap() && column.value.unwrap() <= column.max);
        assert_abs_diff_eq!(column.err, column.max - column.min, epsilon = 1e-12);
    }

    #[test]
    fn best_fit_model_uses_medians() {
        let data = array![[1.0, 2.0], [3.0, 6.0]];
        let config = McmcConfig::new(10, 20, 10, 0.01, Some(2));
        let mut engine = McmcEngine::new(config, ReplaySampler::default());
        let fit = engine.run(data.view(), &FlatPsf, parameters()).unwrap();

        let flux = fit.parameters[FitParameter::Flux].value.unwrap();
        let offset = fit.parameters[FitParameter::Offset].value.unwrap();
        for &x in fit.model.iter() {
            assert_abs_diff_eq!(x, flux / 4.0 + offset, epsilon = 1e-12);
        }
        assert_eq!(fit.data, data);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let data = array![[1.0, 2.0], [3.0, 6.0]];
        let config = McmcConfig::new(10, 20, 10, 0.01, Some(3));
        let fit_a = McmcEngine::new(config.clone(), ReplaySampler::default())
            .run(data.view(), &FlatPsf, parameters())
            .unwrap();
        let fit_b = McmcEngine::new(config, ReplaySampler::default())
            .run(data.view(), &FlatPsf, parameters())
            .unwrap();
        assert_eq!(fit_a.chain, fit_b.chain);
    }

    #[test]
    fn borrowed_data_outlives_fit() {
        let fit = {
            let data = array![[1.0, 2.0], [3.0, 6.0]];
            let config = McmcConfig::new(10, 20, 10, 0.01, Some(4));
            McmcEngine::new(config, ReplaySampler::default())
                .run(data.view(), &FlatPsf, parameters())
                .unwrap()
        };
        assert_eq!(fit.data, array![[1.0, 2.0], [3.0, 6.0]]);
    }

    #[test]
    fn invalid_config_fails_before_sampling() {
        let mut config = McmcConfig::new(10, 20, 10, 0.01, Some(5));
        config.n_discard = config.n_steps;
        let mut engine = McmcEngine::new(config, ReplaySampler::default());
        let result = engine.run(
            array![[1.0, 2.0], [3.0, 6.0]].view(),
            &FlatPsf,
            parameters(),
        );
        assert!(matches!(
            result.unwrap_err(),
            LocalizationError::InvalidConfig(_)
        ));
        assert!(engine.sampler.starts.is_empty());
    }
}

//! Immutable configuration of the localization pipeline
//!
//! Every component receives its configuration at construction, so tests can run the pipeline
//! with non-default instrument cadences or short sampler chains.

use crate::error::LocalizationError;
use crate::psf_fit::parameter::FitParameter;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Properties of the instrument cadence
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct InstrumentConfig {
    pub cadences_per_hour: u32,
}

impl InstrumentConfig {
    pub fn new(cadences_per_hour: u32) -> Self {
        assert!(cadences_per_hour > 0, "cadences_per_hour must be positive");
        Self { cadences_per_hour }
    }

    /// Kepler long cadence is 30 minutes
    #[inline]
    pub fn default_cadences_per_hour() -> u32 {
        2
    }

    /// Number of cadences covering `hours`, rounded to the nearest integer
    pub fn cadences_in(&self, hours: f64) -> usize {
        let n = (hours * f64::from(self.cadences_per_hour)).round();
        if n > 0.0 {
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let n = n as usize;
            n
        } else {
            0
        }
    }
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self::new(Self::default_cadences_per_hour())
    }
}

/// Windows and polynomial order used to build the flare image
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FlareImageConfig {
    /// Half-width of the window around the flare cadence, hours
    pub window_length_hours: f64,
    /// Number of cadences right before the flare excluded from the baseline fit
    pub exclusion_before: usize,
    /// Number of cadences right after the flare excluded from the baseline fit
    pub exclusion_after: usize,
    pub polynomial_order: usize,
}

impl FlareImageConfig {
    pub fn new(
        window_length_hours: f64,
        exclusion_before: usize,
        exclusion_after: usize,
        polynomial_order: usize,
    ) -> Self {
        assert!(
            window_length_hours.is_finite() && window_length_hours > 0.0,
            "window_length_hours must be positive and finite"
        );
        Self {
            window_length_hours,
            exclusion_before,
            exclusion_after,
            polynomial_order,
        }
    }

    #[inline]
    pub fn default_window_length_hours() -> f64 {
        16.5
    }

    #[inline]
    pub fn default_exclusion_before() -> usize {
        2
    }

    #[inline]
    pub fn default_exclusion_after() -> usize {
        4
    }

    #[inline]
    pub fn default_polynomial_order() -> usize {
        3
    }
}

impl Default for FlareImageConfig {
    fn default() -> Self {
        Self::new(
            Self::default_window_length_hours(),
            Self::default_exclusion_before(),
            Self::default_exclusion_after(),
            Self::default_polynomial_order(),
        )
    }
}

/// Ensemble MCMC settings
///
/// Both sampling passes use the same settings. `seed` makes a run reproducible, `None` seeds
/// the walkers from the operating system.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(try_from = "McmcConfigParameters")]
pub struct McmcConfig {
    pub n_walkers: usize,
    pub n_steps: usize,
    pub n_discard: usize,
    /// Standard deviation of the Gaussian jitter of walker starting points
    pub jitter: f64,
    pub seed: Option<u64>,
}

impl McmcConfig {
    pub fn new(
        n_walkers: usize,
        n_steps: usize,
        n_discard: usize,
        jitter: f64,
        seed: Option<u64>,
    ) -> Self {
        let config = Self {
            n_walkers,
            n_steps,
            n_discard,
            jitter,
            seed,
        };
        if let Err(err) = config.validate() {
            panic!("{err}");
        }
        config
    }

    /// Check the settings the sampler relies on
    ///
    /// Fields are public, so [McmcEngine](crate::psf_fit::McmcEngine) checks them again before
    /// sampling.
    pub fn validate(&self) -> Result<(), LocalizationError> {
        let invalid = |message: &str| Err(LocalizationError::InvalidConfig(message.to_owned()));
        if self.n_walkers % 2 != 0 {
            return invalid("n_walkers must be even");
        }
        if self.n_walkers <= 2 * FitParameter::COUNT {
            return invalid("n_walkers must be larger than twice the number of fit parameters");
        }
        if self.n_discard >= self.n_steps {
            return invalid("n_discard must be smaller than n_steps");
        }
        if !(self.jitter.is_finite() && self.jitter > 0.0) {
            return invalid("jitter must be positive and finite");
        }
        Ok(())
    }

    #[inline]
    pub fn default_n_walkers() -> usize {
        32
    }

    #[inline]
    pub fn default_n_steps() -> usize {
        1200
    }

    #[inline]
    pub fn default_n_discard() -> usize {
        800
    }

    #[inline]
    pub fn default_jitter() -> f64 {
        0.01
    }

    #[inline]
    pub fn default_seed() -> Option<u64> {
        None
    }

    /// Number of retained samples per walker
    pub fn n_kept(&self) -> usize {
        self.n_steps - self.n_discard
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename = "McmcConfig")]
struct McmcConfigParameters {
    n_walkers: usize,
    n_steps: usize,
    n_discard: usize,
    jitter: f64,
    seed: Option<u64>,
}

impl TryFrom<McmcConfigParameters> for McmcConfig {
    type Error = LocalizationError;

    fn try_from(p: McmcConfigParameters) -> Result<Self, Self::Error> {
        let config = Self {
            n_walkers: p.n_walkers,
            n_steps: p.n_steps,
            n_discard: p.n_discard,
            jitter: p.jitter,
            seed: p.seed,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for McmcConfig {
    fn default() -> Self {
        Self::new(
            Self::default_n_walkers(),
            Self::default_n_steps(),
            Self::default_n_discard(),
            Self::default_jitter(),
            Self::default_seed(),
        )
    }
}

/// Configuration of the whole pipeline
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct LocalizationConfig {
    pub instrument: InstrumentConfig,
    pub flare_image: FlareImageConfig,
    pub mcmc: McmcConfig,
    /// Catalog cone radius around the target, arcseconds
    #[serde(default = "LocalizationConfig::default_catalog_radius_arcsec")]
    pub catalog_radius_arcsec: f64,
}

impl LocalizationConfig {
    #[inline]
    pub fn default_catalog_radius_arcsec() -> f64 {
        15.0
    }
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            instrument: InstrumentConfig::default(),
            flare_image: FlareImageConfig::default(),
            mcmc: McmcConfig::default(),
            catalog_radius_arcsec: Self::default_catalog_radius_arcsec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadences_in_rounds() {
        let instrument = InstrumentConfig::default();
        assert_eq!(instrument.cadences_in(16.5), 33);
        assert_eq!(instrument.cadences_in(1.2), 2);
        assert_eq!(instrument.cadences_in(1.3), 3);
        assert_eq!(InstrumentConfig::new(60).cadences_in(0.5), 30);
    }

    #[test]
    fn default_mcmc() {
        let mcmc = McmcConfig::default();
        assert_eq!(mcmc.n_walkers, 32);
        assert_eq!(mcmc.n_kept(), 400);
    }

    #[test]
    #[should_panic(expected = "n_discard must be smaller than n_steps")]
    fn discard_everything() {
        let _ = McmcConfig::new(32, 100, 100, 0.01, None);
    }

    #[test]
    #[should_panic(expected = "n_walkers must be even")]
    fn odd_walkers() {
        let _ = McmcConfig::new(33, 100, 10, 0.01, None);
    }

    #[test]
    fn validate_reports_burn_in() {
        let mut config = McmcConfig::default();
        config.n_discard = config.n_steps;
        assert_eq!(
            config.validate(),
            Err(LocalizationError::InvalidConfig(
                "n_discard must be smaller than n_steps".to_owned()
            ))
        );
    }

    #[test]
    fn deserialization_rejects_invalid_mcmc() {
        let mut value = serde_json::to_value(LocalizationConfig::default()).unwrap();
        value["mcmc"]["n_steps"] = 20.into();
        value["mcmc"]["n_discard"] = 20.into();
        let err = serde_json::from_value::<LocalizationConfig>(value).unwrap_err();
        assert!(err.to_string().contains("n_discard must be smaller than n_steps"));
    }

    #[test]
    fn deserialization_rejects_odd_walkers() {
        let json = r#"{"n_walkers": 15, "n_steps": 100, "n_discard": 10, "jitter": 0.01, "seed": null}"#;
        assert!(serde_json::from_str::<McmcConfig>(json).is_err());
    }

    #[test]
    fn serde_round_trip() {
        let config = LocalizationConfig {
            mcmc: McmcConfig::new(16, 200, 100, 0.01, Some(42)),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let restored: LocalizationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn catalog_radius_defaults_when_missing() {
        let mut value = serde_json::to_value(LocalizationConfig::default()).unwrap();
        value.as_object_mut().unwrap().remove("catalog_radius_arcsec");
        let restored: LocalizationConfig = serde_json::from_value(value).unwrap();
        assert_eq!(restored.catalog_radius_arcsec, 15.0);
    }

    #[test]
    fn json_schema_lists_sections() {
        let schema = schemars::schema_for!(LocalizationConfig);
        let json = serde_json::to_string(&schema).unwrap();
        for field in ["instrument", "flare_image", "mcmc", "catalog_radius_arcsec"] {
            assert!(json.contains(field), "schema misses {field}");
        }
    }
}

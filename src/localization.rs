use crate::collaborators::{CatalogSource, CatalogStar, PsfModel, TargetPixelData, WorldToPixel};
use crate::config::LocalizationConfig;
use crate::ellipse::{ConfidenceEllipses, StarMatch};
use crate::error::LocalizationError;
use crate::flare_image::{CadenceLookup, FlareImage, FlareImageBuilder, FlareTime};
use crate::psf_fit::{EnsembleSampler, FitParameter, FitParameters, McmcEngine, McmcFit};
use crate::quality::{QualityFlag, QualityFlags};

use serde::{Deserialize, Serialize};

/// Everything known about a localized flare
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalizationResult {
    pub quality: QualityFlags,
    pub quality_flags: Vec<QualityFlag>,
    pub flare_image: FlareImage,
    /// Parameters the first sampling pass started from
    pub initial_parameters: FitParameters,
    pub fit: McmcFit,
    pub ellipses: ConfidenceEllipses,
    /// Catalog stars around the target, CCD coordinates
    pub catalog: Vec<CatalogStar>,
    /// Cross-match with the 99.9% ellipse
    pub star_match: StarMatch,
}

impl LocalizationResult {
    pub fn cadence(&self) -> &CadenceLookup {
        &self.flare_image.cadence
    }

    pub fn parameters(&self) -> &FitParameters {
        &self.fit.parameters
    }

    /// Median `(column, row)` of the flare, pixel-center convention
    pub fn position(&self) -> (f64, f64) {
        (
            self.fit.parameters[FitParameter::Column].center(),
            self.fit.parameters[FitParameter::Row].center(),
        )
    }
}

/// Flare localization pipeline
///
/// Builds the flare image, fits the PSF model to it, derives confidence ellipses of the flare
/// position and cross-matches them with the catalog.
#[derive(Clone, Debug, Default)]
pub struct FlareLocalization {
    config: LocalizationConfig,
}

impl FlareLocalization {
    pub fn new(config: LocalizationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocalizationConfig {
        &self.config
    }

    pub fn run<P, W, C, S>(
        &self,
        data: &TargetPixelData<P, W>,
        flare: FlareTime,
        catalog: &C,
        sampler: S,
    ) -> Result<LocalizationResult, LocalizationError>
    where
        P: PsfModel,
        W: WorldToPixel,
        C: CatalogSource,
        S: EnsembleSampler,
    {
        data.validate()?;
        self.config.mcmc.validate()?;

        let builder =
            FlareImageBuilder::new(self.config.instrument, self.config.flare_image.clone());
        let flare_image = builder.build(data.images.view(), data.time.view(), flare)?;
        let cadence = &flare_image.cadence;
        log::info!(
            "flare image at cadence {} (t = {}), {} finite pixels, offset {}",
            cadence.index,
            cadence.nearest_time,
            flare_image.n_finite(),
            flare_image.offset,
        );

        let quality = QualityFlags(data.quality[cadence.index]);
        let quality_flags = quality.decode();
        if !quality.is_good() {
            log::warn!(
                "flare cadence has quality flags {}: {:?}",
                quality.0,
                quality.descriptions()
            );
        }

        let stars: Vec<_> = catalog
            .cone_search(data.ra, data.dec, self.config.catalog_radius_arcsec)?
            .iter()
            .map(|entry| entry.to_ccd(data))
            .collect();
        if stars.is_empty() {
            return Err(LocalizationError::EmptyCatalog);
        }

        let aperture_pixels = match &data.aperture {
            Some(mask) => mask.iter().filter(|&&x| x).count(),
            None => flare_image.n_finite(),
        };
        let initial_parameters = FitParameters::initial(
            flare_image.image.view(),
            data.target_ccd(),
            (data.column, data.row),
            aperture_pixels,
        )?;

        let mut engine = McmcEngine::new(self.config.mcmc.clone(), sampler);
        let fit = engine.run(flare_image.image.view(), &data.psf, initial_parameters.clone())?;

        let ellipses = ConfidenceEllipses::from_chain(&fit.chain)?;
        let star_match = StarMatch::new(&ellipses.p999, &stars)?;

        Ok(LocalizationResult {
            quality,
            quality_flags,
            flare_image,
            initial_parameters,
            fit,
            ellipses,
            catalog: stars,
            star_match,
        })
    }
}

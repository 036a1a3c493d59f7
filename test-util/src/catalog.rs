use flare_localization::{CatalogEntry, CatalogSource, LocalizationError};

/// In-memory catalog answering cone searches in the small-angle approximation
#[derive(Clone, Debug, Default)]
pub struct VecCatalog(pub Vec<CatalogEntry>);

impl CatalogSource for VecCatalog {
    fn cone_search(
        &self,
        ra: f64,
        dec: f64,
        radius_arcsec: f64,
    ) -> Result<Vec<CatalogEntry>, LocalizationError> {
        let radius = radius_arcsec / 3600.0;
        let cos_dec = dec.to_radians().cos();
        Ok(self
            .0
            .iter()
            .filter(|entry| {
                let d_ra = (entry.ra - ra) * cos_dec;
                let d_dec = entry.dec - dec;
                d_ra.hypot(d_dec) <= radius
            })
            .cloned()
            .collect())
    }
}

use flare_localization::WorldToPixel;

/// Tangent-plane approximation of a small cutout
///
/// Degrees on the sky map linearly to pixels, right ascension is compressed by `cos(dec0)`.
#[derive(Clone, Debug)]
pub struct LinearWcs {
    /// Sky position of the reference pixel
    pub ra0: f64,
    pub dec0: f64,
    /// Cutout-relative `(x, y)` of the reference pixel
    pub reference_pixel: (f64, f64),
    /// Degrees per pixel
    pub scale: f64,
}

impl LinearWcs {
    /// Kepler plate scale is close to four arcseconds per pixel
    pub const KEPLER_SCALE: f64 = 3.98 / 3600.0;

    pub fn new(ra0: f64, dec0: f64, reference_pixel: (f64, f64), scale: f64) -> Self {
        Self {
            ra0,
            dec0,
            reference_pixel,
            scale,
        }
    }

    /// Inverse transform of [WorldToPixel::world_to_pixel]
    pub fn pixel_to_world(&self, x: f64, y: f64) -> (f64, f64) {
        let ra = self.ra0
            + (x - self.reference_pixel.0) * self.scale / self.dec0.to_radians().cos();
        let dec = self.dec0 + (y - self.reference_pixel.1) * self.scale;
        (ra, dec)
    }
}

impl WorldToPixel for LinearWcs {
    fn world_to_pixel(&self, ra: f64, dec: f64) -> (f64, f64) {
        let x = self.reference_pixel.0
            + (ra - self.ra0) * self.dec0.to_radians().cos() / self.scale;
        let y = self.reference_pixel.1 + (dec - self.dec0) / self.scale;
        (x, y)
    }
}

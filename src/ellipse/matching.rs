use crate::collaborators::CatalogStar;
use crate::ellipse::flare_ellipse::FlareEllipse;
use crate::error::LocalizationError;

use serde::{Deserialize, Serialize};

/// Catalog star with its distance from the ellipse center, in pixels
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StarDistance {
    pub star: CatalogStar,
    pub distance: f64,
}

/// Outcome of the catalog cross-match
///
/// Either some stars are inside the ellipse, or none is and the nearest star is reported instead.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "stars")]
pub enum StarMatch {
    /// All stars inside the ellipse, in catalog order
    Inside(Vec<StarDistance>),
    /// No star is inside, the closest one to the center
    Nearest(StarDistance),
}

impl StarMatch {
    /// Cross-match catalog stars with an ellipse
    pub fn new(ellipse: &FlareEllipse, stars: &[CatalogStar]) -> Result<Self, LocalizationError> {
        let with_distance = |star: &CatalogStar| StarDistance {
            star: star.clone(),
            distance: ellipse.distance(star.column, star.row),
        };

        let inside: Vec<_> = stars
            .iter()
            .filter(|star| ellipse.contains(star.column, star.row))
            .map(with_distance)
            .collect();
        if !inside.is_empty() {
            log::info!(
                "{} catalog star(s) inside the {:?} ellipse",
                inside.len(),
                ellipse.level
            );
            return Ok(Self::Inside(inside));
        }

        let nearest = stars
            .iter()
            .map(with_distance)
            .reduce(|best, candidate| {
                if candidate.distance < best.distance || best.distance.is_nan() {
                    candidate
                } else {
                    best
                }
            })
            .ok_or(LocalizationError::EmptyCatalog)?;
        log::warn!(
            "no catalog star inside the {:?} ellipse, nearest is {} at {} pix",
            ellipse.level,
            nearest.star.source_id,
            nearest.distance
        );
        Ok(Self::Nearest(nearest))
    }

    pub fn is_inside(&self) -> bool {
        matches!(self, Self::Inside(_))
    }

    /// Stars inside the ellipse, empty for the nearest-star fallback
    pub fn inside(&self) -> &[StarDistance] {
        match self {
            Self::Inside(stars) => stars,
            Self::Nearest(_) => &[],
        }
    }

    /// Fallback star, `None` when some stars are inside the ellipse
    pub fn nearest(&self) -> Option<&StarDistance> {
        match self {
            Self::Inside(_) => None,
            Self::Nearest(star) => Some(star),
        }
    }
}

//! Choice between several pixel data candidates of the same target

use crate::collaborators::TargetPixelData;
use crate::error::LocalizationError;

use itertools::Itertools;
use itertools::MinMaxResult;
use ndarray::ArrayView1;

/// Whether the finite part of `time` strictly contains `flare_time`
pub fn covers(time: ArrayView1<f64>, flare_time: f64) -> bool {
    match time.iter().copied().filter(|t| t.is_finite()).minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => false,
        MinMaxResult::OneElement(_) => false,
        MinMaxResult::MinMax(min, max) => min < flare_time && flare_time < max,
    }
}

/// Select the candidate observing the flare
///
/// A single candidate is returned as is, its time range is checked later by the flare image
/// builder. Out of several candidates exactly one must cover the flare time.
pub fn select_pixel_data<P, W>(
    candidates: Vec<TargetPixelData<P, W>>,
    flare_time: f64,
) -> Result<TargetPixelData<P, W>, LocalizationError> {
    let n_candidates = candidates.len();
    if n_candidates <= 1 {
        return candidates
            .into_iter()
            .next()
            .ok_or(LocalizationError::NoPixelData);
    }

    log::warn!("{n_candidates} pixel data candidates, selecting by flare time {flare_time}");
    let mut covering: Vec<_> = candidates
        .into_iter()
        .filter(|data| covers(data.time.view(), flare_time))
        .collect();
    if covering.len() == 1 {
        Ok(covering.remove(0))
    } else {
        Err(LocalizationError::AmbiguousPixelData {
            candidates: n_candidates,
            covering: covering.len(),
            flare_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::{Array1, Array2, Array3, array};

    fn candidate(time: Array1<f64>) -> TargetPixelData<(), ()> {
        let n = time.len();
        TargetPixelData {
            images: Array3::zeros((n, 2, 2)),
            time,
            quality: Array1::zeros(n),
            column: 100.0,
            row: 200.0,
            ra: 290.0,
            dec: 44.0,
            aperture: Some(Array2::from_elem((2, 2), true)),
            wcs: (),
            psf: (),
        }
    }

    #[test]
    fn covering_is_strict_and_skips_nan() {
        let time = array![f64::NAN, 1.0, 2.0, 3.0, f64::NAN];
        assert!(covers(time.view(), 2.5));
        assert!(!covers(time.view(), 1.0));
        assert!(!covers(time.view(), 3.0));
        assert!(!covers(time.view(), 0.0));
        assert!(!covers(array![f64::NAN, f64::NAN].view(), 0.0));
    }

    #[test]
    fn no_candidates() {
        let candidates: Vec<TargetPixelData<(), ()>> = vec![];
        assert_eq!(
            select_pixel_data(candidates, 1.0).unwrap_err(),
            LocalizationError::NoPixelData
        );
    }

    #[test]
    fn single_candidate_is_not_checked() {
        let data = select_pixel_data(vec![candidate(array![1.0, 2.0])], 10.0).unwrap();
        assert_eq!(data.time, array![1.0, 2.0]);
    }

    #[test]
    fn covering_candidate_is_selected() {
        let candidates = vec![
            candidate(array![1.0, 2.0, 3.0]),
            candidate(array![4.0, 5.0, 6.0]),
            candidate(array![7.0, 8.0, 9.0]),
        ];
        let data = select_pixel_data(candidates, 5.5).unwrap();
        assert_eq!(data.time, array![4.0, 5.0, 6.0]);
    }

    #[test]
    fn no_covering_candidate() {
        let candidates = vec![candidate(array![1.0, 2.0]), candidate(array![4.0, 5.0])];
        assert_eq!(
            select_pixel_data(candidates, 3.0).unwrap_err(),
            LocalizationError::AmbiguousPixelData {
                candidates: 2,
                covering: 0,
                flare_time: 3.0
            }
        );
    }

    #[test]
    fn several_covering_candidates() {
        let candidates = vec![candidate(array![1.0, 5.0]), candidate(array![2.0, 6.0])];
        assert_eq!(
            select_pixel_data(candidates, 3.0).unwrap_err(),
            LocalizationError::AmbiguousPixelData {
                candidates: 2,
                covering: 2,
                flare_time: 3.0
            }
        );
    }
}

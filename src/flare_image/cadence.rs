use crate::error::LocalizationError;

use itertools::{Itertools, MinMaxResult};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Flare position in the time series, either a time stamp or a cadence index
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub enum FlareTime {
    Time(f64),
    Index(usize),
}

/// Result of the flare cadence lookup
///
/// `exact` is `false` when the requested time is not present in the time array and the nearest
/// cadence was substituted.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct CadenceLookup {
    pub index: usize,
    pub requested_time: f64,
    pub nearest_time: f64,
    pub exact: bool,
}

/// Find the cadence nearest to `flare_time`
///
/// NaN time stamps never match. Ties are resolved in favour of the lowest index. A time outside
/// of the finite time range is an error.
pub fn find_image_index(
    time: ArrayView1<f64>,
    flare_time: f64,
) -> Result<CadenceLookup, LocalizationError> {
    let (min, max) = match time.iter().copied().filter(|t| t.is_finite()).minmax() {
        MinMaxResult::NoElements => return Err(LocalizationError::NoPixelData),
        MinMaxResult::OneElement(t) => (t, t),
        MinMaxResult::MinMax(min, max) => (min, max),
    };
    if !(min..=max).contains(&flare_time) {
        return Err(LocalizationError::FlareTimeOutOfRange {
            flare_time,
            min,
            max,
        });
    }

    let (index, distance) = time
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_finite())
        .map(|(i, &t)| (i, (t - flare_time).abs()))
        .fold((0, f64::INFINITY), |(best_i, best_d), (i, d)| {
            if d < best_d { (i, d) } else { (best_i, best_d) }
        });
    let nearest_time = time[index];
    let exact = distance == 0.0;
    if !exact {
        log::warn!(
            "flare time {flare_time} is not present in the time array, nearest cadence {index} at {nearest_time} is used"
        );
    }
    Ok(CadenceLookup {
        index,
        requested_time: flare_time,
        nearest_time,
        exact,
    })
}

/// Exact lookup of a known cadence index
pub fn lookup_index(
    time: ArrayView1<f64>,
    index: usize,
) -> Result<CadenceLookup, LocalizationError> {
    let nearest_time = *time
        .get(index)
        .ok_or(LocalizationError::CadenceOutOfRange {
            index,
            n_cadences: time.len(),
        })?;
    Ok(CadenceLookup {
        index,
        requested_time: nearest_time,
        nearest_time,
        exact: true,
    })
}

/// Index sets around the flare cadence
///
/// `with_flare` is the contiguous window `flare - window ..= flare + window` clipped to the
/// array bounds. `without_flare` is the same window with the flare cadence and the exclusion
/// band around it removed, it is used to fit the quiescent baseline.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CadenceWindows {
    pub flare: usize,
    pub with_flare: Vec<usize>,
    pub without_flare: Vec<usize>,
}

impl CadenceWindows {
    pub fn new(
        flare: usize,
        window_length: usize,
        exclusion_before: usize,
        exclusion_after: usize,
        n_cadences: usize,
    ) -> Self {
        assert!(flare < n_cadences, "flare cadence must be within the array");
        let first = flare.saturating_sub(window_length);
        let last = usize::min(flare + window_length, n_cadences - 1);
        let with_flare: Vec<_> = (first..=last).collect();

        // Inclusive on both ends, so f - 2 and f + 4 stay out of the baseline too
        let excluded = flare.saturating_sub(exclusion_before)..=flare + exclusion_after;
        let without_flare = with_flare
            .iter()
            .copied()
            .filter(|i| !excluded.contains(i))
            .collect();

        Self {
            flare,
            with_flare,
            without_flare,
        }
    }

    /// Position of the flare cadence inside `with_flare`
    pub fn flare_offset(&self) -> usize {
        self.flare - self.with_flare[0]
    }
}

//! Kepler cadence quality flags

use serde::{Deserialize, Serialize};

/// Single bit of the Kepler quality bitmask
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum QualityFlag {
    AttitudeTweak,
    SafeMode,
    CoarsePoint,
    EarthPoint,
    Argabrightening,
    Desat,
    ApertureCosmic,
    ManualExclude,
    Discontinuity,
    ImpulsiveOutlier,
    CollateralCosmic,
    Straylight,
    Straylight2,
    PlanetSearchExclude,
    BadCalibrationExclude,
    InsufficientTargets,
}

impl QualityFlag {
    /// Flags in the bit order
    pub const ALL: [Self; 16] = [
        Self::AttitudeTweak,
        Self::SafeMode,
        Self::CoarsePoint,
        Self::EarthPoint,
        Self::Argabrightening,
        Self::Desat,
        Self::ApertureCosmic,
        Self::ManualExclude,
        Self::Discontinuity,
        Self::ImpulsiveOutlier,
        Self::CollateralCosmic,
        Self::Straylight,
        Self::Straylight2,
        Self::PlanetSearchExclude,
        Self::BadCalibrationExclude,
        Self::InsufficientTargets,
    ];

    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::AttitudeTweak => "Attitude tweak",
            Self::SafeMode => "Safe mode",
            Self::CoarsePoint => "Spacecraft is in coarse point",
            Self::EarthPoint => "Spacecraft is in Earth point",
            Self::Argabrightening => "Argabrightening event",
            Self::Desat => "Reaction wheel desaturation event",
            Self::ApertureCosmic => "Cosmic ray in optimal aperture pixel",
            Self::ManualExclude => "Manual exclude. The cadence was excluded because of an anomaly.",
            Self::Discontinuity => {
                "Discontinuity corrected between this cadence and the following one."
            }
            Self::ImpulsiveOutlier => "Impulsive outlier removed before cotrending.",
            Self::CollateralCosmic => "Cosmic ray detected on collateral pixel row or column.",
            Self::Straylight => "Straylight from Earth or Moon in camera FOV.",
            Self::Straylight2 => "Straylight2",
            Self::PlanetSearchExclude => "Planet Search Exclude",
            Self::BadCalibrationExclude => "Bad Calibration Exclude",
            Self::InsufficientTargets => "Insufficient Targets for Error Correction Exclude",
        }
    }
}

/// Raw quality bitmask of a cadence
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct QualityFlags(pub u32);

impl QualityFlags {
    pub fn is_good(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, flag: QualityFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Known flags set in the mask, in the bit order
    pub fn decode(self) -> Vec<QualityFlag> {
        QualityFlag::ALL
            .into_iter()
            .filter(|&flag| self.contains(flag))
            .collect()
    }

    /// Descriptions of [QualityFlags::decode]
    pub fn descriptions(self) -> Vec<&'static str> {
        self.decode().into_iter().map(QualityFlag::description).collect()
    }

    /// Bits which don't correspond to any known flag
    pub fn unknown_bits(self) -> u32 {
        let known = QualityFlag::ALL.iter().fold(0, |acc, flag| acc | flag.bit());
        self.0 & !known
    }
}

impl From<u32> for QualityFlags {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

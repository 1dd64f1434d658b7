//! Acquisition mode and detector area tags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Acquisition mode recorded in the run header ("insert" field).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AcquisitionMode {
    /// `20`: time-resolved spin-lattice relaxation.
    Slr,
    /// `2h`: time-resolved with alpha detectors.
    AlphaSlr,
    /// `1f`: frequency scan.
    Frequency,
    /// `1n`: neutral beam monitor scan over the Rb cell voltage.
    NeutralBeam,
    /// `1w`: generic x-parameter scan.
    Parameter,
    /// `1e`: magnet current scan.
    Magnet,
    /// `2e`: random-frequency scan.
    RandomFrequency,
    /// Any other code; asymmetries are not computed for it.
    Unknown(String),
}

impl AcquisitionMode {
    /// Parses the two-character mode code (case-insensitive, surrounding whitespace ignored).
    pub fn parse(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "20" => AcquisitionMode::Slr,
            "2h" => AcquisitionMode::AlphaSlr,
            "1f" => AcquisitionMode::Frequency,
            "1n" => AcquisitionMode::NeutralBeam,
            "1w" => AcquisitionMode::Parameter,
            "1e" => AcquisitionMode::Magnet,
            "2e" => AcquisitionMode::RandomFrequency,
            _ => AcquisitionMode::Unknown(code.to_string()),
        }
    }

    /// Returns the mode code as written in the run header.
    pub fn code(&self) -> &str {
        match self {
            AcquisitionMode::Slr => "20",
            AcquisitionMode::AlphaSlr => "2h",
            AcquisitionMode::Frequency => "1f",
            AcquisitionMode::NeutralBeam => "1n",
            AcquisitionMode::Parameter => "1w",
            AcquisitionMode::Magnet => "1e",
            AcquisitionMode::RandomFrequency => "2e",
            AcquisitionMode::Unknown(code) => code,
        }
    }

    /// Time-resolved modes share prebeam stripping and the time axis.
    pub fn is_time_resolved(&self) -> bool {
        matches!(self, AcquisitionMode::Slr | AcquisitionMode::AlphaSlr)
    }

    /// Scan modes carry an x-axis histogram and aggregate bins by x value.
    pub fn is_scan(&self) -> bool {
        matches!(
            self,
            AcquisitionMode::Frequency
                | AcquisitionMode::NeutralBeam
                | AcquisitionMode::Parameter
                | AcquisitionMode::Magnet
        )
    }

    /// True for the mode with alpha detector channels.
    pub fn has_alpha(&self) -> bool {
        matches!(self, AcquisitionMode::AlphaSlr)
    }

    /// True when no asymmetry strategy exists for the mode.
    pub fn is_unknown(&self) -> bool {
        matches!(self, AcquisitionMode::Unknown(_))
    }
}

impl From<String> for AcquisitionMode {
    fn from(value: String) -> Self {
        AcquisitionMode::parse(&value)
    }
}

impl From<AcquisitionMode> for String {
    fn from(value: AcquisitionMode) -> Self {
        value.code().to_string()
    }
}

impl fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Spectrometer that recorded the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Area {
    /// β-NMR: forward/backward counters.
    Bnmr,
    /// β-NQR: right/left counters.
    Bnqr,
    /// Anything else, kept verbatim.
    Other(String),
}

impl Area {
    /// Parses an area name (case-insensitive).
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "BNMR" => Area::Bnmr,
            "BNQR" => Area::Bnqr,
            _ => Area::Other(name.to_string()),
        }
    }

    /// Returns the canonical area name.
    pub fn name(&self) -> &str {
        match self {
            Area::Bnmr => "BNMR",
            Area::Bnqr => "BNQR",
            Area::Other(name) => name,
        }
    }
}

impl From<String> for Area {
    fn from(value: String) -> Self {
        Area::parse(&value)
    }
}

impl From<Area> for String {
    fn from(value: Area) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

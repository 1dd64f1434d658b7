//! Quantities derived from logged run variables.

use serde::{Deserialize, Serialize};

use crate::errors::{BnmrError, ErrorInfo};
use crate::mode::Area;
use crate::record::{InstrumentVar, RunData, RunRecord};

/// Mean lifetime of a probe nucleus, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    /// Lifetime in seconds.
    pub seconds: f64,
    /// One-sigma uncertainty, when published.
    pub error: Option<f64>,
}

const LIFETIMES: &[(&str, f64, Option<f64>)] = &[
    ("Li8", 1.2096, Some(0.0005)),
    ("Li9", 0.2572, Some(0.0006)),
    ("Li11", 0.0126, Some(0.0020)),
    ("Be11", 19.85, Some(0.10)),
    ("F20", 16.105, Some(0.012)),
    ("Mg29", 1.88, Some(0.17)),
    ("Mg31", 0.332, Some(0.029)),
    ("Ac230", 175.76, None),
    ("Ac232", 171.43, None),
    ("Ac234", 63.49, Some(10.1)),
];

/// Looks up the lifetime of a probe isotope (e.g. `"Li8"`).
pub fn lifetime(isotope: &str) -> Option<Lifetime> {
    LIFETIMES
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(isotope))
        .map(|&(_, seconds, error)| Lifetime { seconds, error })
}

/// Isotopes with a tabulated lifetime.
pub fn known_isotopes() -> impl Iterator<Item = &'static str> {
    LIFETIMES.iter().map(|(name, _, _)| *name)
}

fn derived_error(code: &str, message: impl Into<String>) -> BnmrError {
    BnmrError::Data(ErrorInfo::new(code, message))
}

impl RunRecord {
    fn beam_terms(&self, stat: fn(&InstrumentVar) -> f64) -> Result<[f64; 3], BnmrError> {
        let epics = |key: &str| {
            self.epics(key).map(stat).ok_or_else(|| {
                derived_error("missing-epics", format!("epics variable {key} not logged"))
                    .map_info(|info| info.with_context("run", self.header().id.to_string()))
            })
        };

        let target = epics("target_bias")? / 1000.0;
        let bias15 = epics("bias15")? / 1000.0;
        let platform = match &self.header().area {
            Area::Bnmr => epics("nmr_bias")?,
            Area::Bnqr => epics("nqr_bias")? / 1000.0,
            Area::Other(name) => {
                return Err(BnmrError::InvalidInput(
                    ErrorInfo::new("unknown-area", "platform bias requires BNMR or BNQR")
                        .with_context("area", name.clone()),
                ))
            }
        };
        Ok([target, bias15, platform])
    }

    /// Implantation energy in keV: target bias minus cell bias minus platform.
    pub fn beam_kev(&self) -> Result<f64, BnmrError> {
        let [target, bias15, platform] = self.beam_terms(InstrumentVar::mean)?;
        Ok(target - bias15 - platform)
    }

    /// Uncertainty of [`RunRecord::beam_kev`], quadrature sum of the term spreads.
    pub fn beam_kev_error(&self) -> Result<f64, BnmrError> {
        let terms = self.beam_terms(InstrumentVar::std)?;
        Ok(terms.iter().map(|t| t * t).sum::<f64>().sqrt())
    }

    /// Beam pulse length in seconds for pulsed measurements.
    pub fn pulse_s(&self) -> Result<f64, BnmrError> {
        let dwelltime = self.ppg_mean("dwelltime")?;
        let beam_on = self.ppg_mean("beam_on")?;
        match (dwelltime, beam_on) {
            (Some(dwelltime), Some(beam_on)) => Ok(dwelltime * beam_on / 1000.0),
            _ => Err(derived_error(
                "missing-ppg",
                "dwelltime and beam_on are required for the pulse length",
            )),
        }
    }
}

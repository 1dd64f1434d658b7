//! Detector channel selection and scan-axis resolution.

use bnmr_core::{AcquisitionMode, Area, BnmrError, ErrorInfo, RunData};
use serde::{Deserialize, Serialize};

use crate::formulas::Quad;

const BNMR_CHANNELS: [&str; 4] = ["F+", "F-", "B+", "B-"];
const BNQR_CHANNELS: [&str; 4] = ["R+", "R-", "L+", "L-"];
const NEUTRAL_BEAM_CHANNELS: [&str; 4] = ["NBMF+", "NBMF-", "NBMB+", "NBMB-"];
const ALPHA_CHANNELS: [&str; 8] = [
    "AL1+", "AL1-", "AL0+", "AL0-", "AL3+", "AL3-", "AL2+", "AL2-",
];

fn channel_error(code: &str, message: impl Into<String>) -> BnmrError {
    BnmrError::Data(ErrorInfo::new(code, message))
}

/// Owned copies of the counter channels used by one calculation.
///
/// The first four channels are the beta counters in `[c0+, c0-, c1+, c1-]`
/// order; any further channels (alpha-equipped runs only) form the alpha block.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSet {
    names: Vec<String>,
    beta: [Vec<f64>; 4],
    alpha: Vec<Vec<f64>>,
}

impl ChannelSet {
    /// Titles of the selected histograms, beta block first.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Borrowed beta channels.
    pub fn beta(&self) -> Quad<'_> {
        [
            &self.beta[0],
            &self.beta[1],
            &self.beta[2],
            &self.beta[3],
        ]
    }

    /// Borrowed alpha channels.
    pub fn alpha(&self) -> Vec<&[f64]> {
        self.alpha.iter().map(Vec::as_slice).collect()
    }

    /// Mutable access to every channel, beta block first.
    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut Vec<f64>> {
        self.beta.iter_mut().chain(self.alpha.iter_mut())
    }

    /// Number of bins in the first beta channel.
    pub fn n_bins(&self) -> usize {
        self.beta[0].len()
    }
}

/// Default histogram titles for a mode and area.
pub fn default_channel_names(
    mode: &AcquisitionMode,
    area: &Area,
    neutral_beam: bool,
) -> Result<Vec<&'static str>, BnmrError> {
    let mut names: Vec<&'static str> =
        if neutral_beam || matches!(mode, AcquisitionMode::NeutralBeam) {
            NEUTRAL_BEAM_CHANNELS.to_vec()
        } else {
            match area {
                Area::Bnmr => BNMR_CHANNELS.to_vec(),
                Area::Bnqr => BNQR_CHANNELS.to_vec(),
                Area::Other(name) => {
                    return Err(BnmrError::InvalidInput(
                        ErrorInfo::new("unknown-area", "no default channels for this area")
                            .with_context("area", name.clone())
                            .with_hint("pass an explicit histogram selection"),
                    ))
                }
            }
        };
    if mode.has_alpha() {
        names.extend(ALPHA_CHANNELS);
    }
    Ok(names)
}

/// Splits an explicit histogram selection on `,` and `;`.
///
/// At least four names are required.
pub fn parse_selection(selection: &str) -> Result<Vec<String>, BnmrError> {
    let names: Vec<String> = selection
        .split([',', ';'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    if names.len() < 4 {
        return Err(BnmrError::InvalidInput(
            ErrorInfo::new(
                "histogram-selection",
                "at least four histogram names are required",
            )
            .with_context("selection", selection),
        ));
    }
    Ok(names)
}

/// Copies the channels used by a calculation out of a run.
///
/// An explicit selection overrides the defaults. Alpha channels are only
/// collected for alpha-equipped modes.
pub fn select_channels<R: RunData + ?Sized>(
    run: &R,
    selection: Option<&str>,
    neutral_beam: bool,
) -> Result<ChannelSet, BnmrError> {
    let names: Vec<String> = match selection.filter(|s| !s.trim().is_empty()) {
        Some(selection) => parse_selection(selection)?,
        None => default_channel_names(run.mode(), run.area(), neutral_beam)?
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    let mut data = Vec::with_capacity(names.len());
    for name in &names {
        let hist = run.histogram(name).ok_or_else(|| {
            BnmrError::InvalidInput(
                ErrorInfo::new("missing-histogram", "selected histogram not present")
                    .with_context("histogram", name.clone())
                    .with_context("run", run.id().to_string()),
            )
        })?;
        data.push(hist.data().to_vec());
    }

    let alpha = if run.mode().has_alpha() {
        data.split_off(4)
    } else {
        data.truncate(4);
        Vec::new()
    };
    let mut beta = data.into_iter();
    let mut next = || beta.next().unwrap_or_default();
    let beta = [next(), next(), next(), next()];

    Ok(ChannelSet { names, beta, alpha })
}

/// X axis of a frequency-family scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanAxis {
    /// RF frequency (`1f`).
    Frequency,
    /// Generic x parameter (`1w`).
    Parameter,
    /// Magnet current (`1e`).
    MagnetCurrent,
    /// Rb cell voltage (`1n`).
    CellVoltage,
}

impl ScanAxis {
    /// Axis for a scan mode, `None` for other modes.
    pub fn for_mode(mode: &AcquisitionMode) -> Option<Self> {
        match mode {
            AcquisitionMode::Frequency => Some(ScanAxis::Frequency),
            AcquisitionMode::Parameter => Some(ScanAxis::Parameter),
            AcquisitionMode::Magnet => Some(ScanAxis::MagnetCurrent),
            AcquisitionMode::NeutralBeam => Some(ScanAxis::CellVoltage),
            _ => None,
        }
    }

    /// Key used for the axis in named results.
    pub fn key(self) -> &'static str {
        match self {
            ScanAxis::Frequency => "freq",
            ScanAxis::Parameter => "xpar",
            ScanAxis::MagnetCurrent => "mA",
            ScanAxis::CellVoltage => "mV",
        }
    }

    /// Title of the histogram holding the axis values.
    pub fn histogram_title<'a, R: RunData + ?Sized>(self, run: &'a R) -> Option<&'a str> {
        match self {
            ScanAxis::Frequency => Some("Frequency"),
            ScanAxis::Parameter => Some("x parameter"),
            ScanAxis::MagnetCurrent => Some("Magnet mA"),
            ScanAxis::CellVoltage => run
                .histogram_titles()
                .into_iter()
                .find(|title| title.to_lowercase().contains("cell")),
        }
    }

    /// Copies the axis values out of a run.
    pub fn values<R: RunData + ?Sized>(self, run: &R) -> Result<Vec<f64>, BnmrError> {
        self.histogram_title(run)
            .and_then(|title| run.histogram(title))
            .map(|hist| hist.data().to_vec())
            .ok_or_else(|| {
                channel_error("missing-x-histogram", "scan axis histogram not present")
                    .map_info(|info| {
                        info.with_context("axis", self.key())
                            .with_context("run", run.id().to_string())
                    })
            })
    }
}

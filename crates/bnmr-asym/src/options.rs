//! Option grammar and the serialisable asymmetry request.

use std::fmt;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;

use bnmr_core::{BnmrError, ErrorInfo};
use serde::{Deserialize, Serialize};

use crate::deadtime::validate_deadtime;

fn option_error(code: &str, message: impl Into<String>) -> BnmrError {
    BnmrError::InvalidInput(ErrorInfo::new(code, message))
}

/// Which asymmetry (or bundle of asymmetries) to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsymOption {
    /// Every series the mode supports.
    All,
    /// Positive helicity.
    Positive,
    /// Negative helicity.
    Negative,
    /// Both helicities.
    Helicity,
    /// Four-counter combination.
    Combined,
    /// Both counters.
    Counter,
    /// Forward (or right) counter.
    ForwardCounter,
    /// Backward (or left) counter.
    BackwardCounter,
    /// Per-bin helicities without scan aggregation.
    Raw,
    /// Alpha to beta count ratio.
    AlphaDiffusion,
    /// Asymmetries tagged by alpha coincidence.
    AlphaTagged,
    /// Combined asymmetry from slope extrapolation.
    SlopeCombined,
    /// Helicity asymmetries from slope extrapolation.
    SlopeHelicity,
    /// Combined asymmetry from the difference about the midpoint.
    DifferenceCombined,
    /// Helicity asymmetries from the difference about the midpoint.
    DifferenceHelicity,
    /// Combined asymmetry of every dwell bin.
    RawCombined,
    /// Helicity asymmetries of every dwell bin.
    RawHelicity,
}

const SYNONYMS: &[(AsymOption, &[&str])] = &[
    (AsymOption::All, &["", "all"]),
    (AsymOption::Positive, &["+", "p", "u", "up", "pos", "positive"]),
    (AsymOption::Negative, &["-", "n", "d", "down", "neg", "negative"]),
    (AsymOption::Helicity, &["h", "hel", "helicity"]),
    (AsymOption::Combined, &["c", "com", "combined"]),
    (AsymOption::Counter, &["cntr", "counter"]),
    (
        AsymOption::ForwardCounter,
        &["f", "fwd", "forward_counter", "right", "right_counter"],
    ),
    (
        AsymOption::BackwardCounter,
        &["b", "bck", "backward_counter", "left", "left_counter"],
    ),
    (AsymOption::Raw, &["r", "raw"]),
    (
        AsymOption::AlphaDiffusion,
        &["ad", "adif", "adiff", "alpha_diffusion"],
    ),
    (AsymOption::AlphaTagged, &["at", "atag", "alpha_tagged"]),
    (
        AsymOption::SlopeCombined,
        &["sc", "slc", "sl_c", "slope_combined"],
    ),
    (
        AsymOption::SlopeHelicity,
        &["sh", "slh", "sl_h", "slope_helicity"],
    ),
    (
        AsymOption::DifferenceCombined,
        &["dc", "dif_c", "difference_combined"],
    ),
    (
        AsymOption::DifferenceHelicity,
        &["dh", "dif_h", "difference_helicity"],
    ),
    (AsymOption::RawCombined, &["rc", "raw_c", "raw_combined"]),
    (AsymOption::RawHelicity, &["rh", "raw_h", "raw_helicity"]),
];

impl AsymOption {
    /// Resolves a token, case-insensitively, through the synonym table.
    pub fn parse(token: &str) -> Result<Self, BnmrError> {
        let token = token.trim().to_lowercase();
        SYNONYMS
            .iter()
            .find(|(_, names)| names.contains(&token.as_str()))
            .map(|(option, _)| *option)
            .ok_or_else(|| {
                BnmrError::InvalidInput(
                    ErrorInfo::new("option", "option not recognised")
                        .with_context("option", token.clone()),
                )
            })
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        SYNONYMS
            .iter()
            .find(|(option, _)| *option == self)
            .and_then(|(_, names)| names.last())
            .copied()
            .unwrap_or_default()
    }

    /// True for options that need alpha detector channels.
    pub fn needs_alpha(self) -> bool {
        matches!(self, AsymOption::AlphaDiffusion | AsymOption::AlphaTagged)
    }
}

impl FromStr for AsymOption {
    type Err = BnmrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AsymOption::parse(s)
    }
}

impl fmt::Display for AsymOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsymOption::All => f.write_str("all"),
            other => f.write_str(other.name()),
        }
    }
}

/// Bins to zero before aggregating a frequency-family scan.
///
/// Stored as inclusive ranges; indices are only expanded against a channel
/// length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillList(Vec<RangeInclusive<usize>>);

impl KillList {
    /// Parses bin indices and inclusive `a-b` ranges.
    ///
    /// Descending ranges select nothing.
    pub fn parse<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Result<Self, BnmrError> {
        let mut ranges = Vec::new();
        for token in tokens.into_iter().map(str::trim).filter(|t| !t.is_empty()) {
            let bad = || {
                BnmrError::InvalidInput(
                    ErrorInfo::new("kill-list", "bins must be indices or a-b ranges")
                        .with_context("token", token),
                )
            };
            let range = match token.split_once('-') {
                None => {
                    let bin: usize = token.parse().map_err(|_| bad())?;
                    bin..=bin
                }
                Some((first, last)) => {
                    let first: usize = first.trim().parse().map_err(|_| bad())?;
                    let last: usize = last.trim().parse().map_err(|_| bad())?;
                    first..=last
                }
            };
            if !range.is_empty() {
                ranges.push(range);
            }
        }
        Ok(Self(ranges))
    }

    /// Parsed ranges in input order, possibly overlapping or out of range.
    pub fn ranges(&self) -> &[RangeInclusive<usize>] {
        &self.0
    }

    /// Killed indices below `len`, in input order.
    pub fn bins_below(&self, len: usize) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .filter(move |_| len > 0)
            .flat_map(move |range| *range.start()..=(*range.end()).min(len - 1))
    }

    /// True when nothing is killed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn default_rebin() -> usize {
    1
}

/// Parameters of one asymmetry calculation.
///
/// Every field has a default, so an empty YAML document is a valid request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsymRequest {
    /// Option token optionally followed by kill-list tokens, e.g. `"raw 1 5-20"`.
    #[serde(default)]
    pub option: String,
    /// Explicit kill list; takes precedence over tokens trailing `option`.
    #[serde(default)]
    pub omit: String,
    /// Number of adjacent bins averaged into one.
    #[serde(default = "default_rebin")]
    pub rebin: usize,
    /// Histogram titles overriding the default channels, separated by `,` or `;`.
    #[serde(default)]
    pub histogram_selection: String,
    /// Use the neutral beam monitor counters.
    #[serde(default)]
    pub use_neutral_beam_monitor: bool,
    /// Detector deadtime in seconds.
    #[serde(default)]
    pub deadtime: f64,
}

impl Default for AsymRequest {
    fn default() -> Self {
        Self {
            option: String::new(),
            omit: String::new(),
            rebin: default_rebin(),
            histogram_selection: String::new(),
            use_neutral_beam_monitor: false,
            deadtime: 0.0,
        }
    }
}

/// Validated form of an [`AsymRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    /// Selected option.
    pub option: AsymOption,
    /// Bins to zero in scan modes.
    pub kill: KillList,
    /// Rebin factor, at least 1.
    pub rebin: usize,
    /// Explicit channel selection, if any.
    pub selection: Option<String>,
    /// Use the neutral beam monitor counters.
    pub neutral_beam: bool,
    /// Deadtime in seconds, non-negative.
    pub deadtime: f64,
}

impl AsymRequest {
    /// Request for a single option with default settings.
    pub fn new(option: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            ..Self::default()
        }
    }

    /// Sets the rebin factor.
    pub fn with_rebin(mut self, rebin: usize) -> Self {
        self.rebin = rebin;
        self
    }

    /// Sets the explicit kill list.
    pub fn with_omit(mut self, omit: impl Into<String>) -> Self {
        self.omit = omit.into();
        self
    }

    /// Sets the histogram selection.
    pub fn with_histograms(mut self, selection: impl Into<String>) -> Self {
        self.histogram_selection = selection.into();
        self
    }

    /// Switches to the neutral beam monitor counters.
    pub fn with_neutral_beam_monitor(mut self, enabled: bool) -> Self {
        self.use_neutral_beam_monitor = enabled;
        self
    }

    /// Sets the deadtime in seconds.
    pub fn with_deadtime(mut self, deadtime: f64) -> Self {
        self.deadtime = deadtime;
        self
    }

    /// Decodes a request from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, BnmrError> {
        serde_yaml::from_str(yaml).map_err(|err| {
            BnmrError::Config(ErrorInfo::new("yaml_deserialize", err.to_string()))
        })
    }

    /// Reads and decodes a YAML request file.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, BnmrError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|err| {
            BnmrError::Config(
                ErrorInfo::new("read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Parses the option grammar and validates every numeric field.
    pub fn resolve(&self) -> Result<ResolvedRequest, BnmrError> {
        let mut tokens = self.option.split_whitespace();
        let option = AsymOption::parse(tokens.next().unwrap_or_default())?;

        let kill = if self.omit.trim().is_empty() {
            KillList::parse(tokens)?
        } else {
            KillList::parse(self.omit.split_whitespace())?
        };

        if self.rebin == 0 {
            return Err(option_error("rebin", "rebin factor must be at least 1"));
        }
        validate_deadtime(self.deadtime)?;

        let selection = Some(self.histogram_selection.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(ResolvedRequest {
            option,
            kill,
            rebin: self.rebin,
            selection,
            neutral_beam: self.use_neutral_beam_monitor,
            deadtime: self.deadtime,
        })
    }
}

//! Shapes an asymmetry calculation can return.

use std::collections::BTreeMap;

use bnmr_core::{DataWarning, Measured};
use serde::{Deserialize, Serialize};

use crate::random_freq::RandomFrequencyAsym;

/// Values and errors indexed `[frequency][dwell bin]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasuredGrid {
    /// Central values, one row per frequency.
    pub value: Vec<Vec<f64>>,
    /// One-sigma errors with the same shape as `value`.
    pub error: Vec<Vec<f64>>,
}

impl MeasuredGrid {
    /// Stacks per-frequency rows.
    pub fn from_rows(rows: impl IntoIterator<Item = Measured>) -> Self {
        let (value, error) = rows.into_iter().map(Measured::into_parts).unzip();
        Self { value, error }
    }

    /// Number of frequency rows.
    pub fn n_rows(&self) -> usize {
        self.value.len()
    }

    /// Column `j` across all rows as a series.
    pub fn column(&self, j: usize) -> Measured {
        self.value
            .iter()
            .zip(&self.error)
            .map(|(v, e)| (v[j], e[j]))
            .collect()
    }
}

/// Result of an asymmetry calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "kebab-case")]
pub enum AsymResult {
    /// One series over an axis.
    Series {
        /// Axis name (`time_s`, `freq`, `xpar`, `mA`, `mV`).
        axis_key: String,
        /// Axis values.
        axis: Vec<f64>,
        /// Asymmetry over the axis.
        series: Measured,
    },
    /// Several series sharing an axis.
    Named {
        /// Axis name.
        axis_key: String,
        /// Axis values.
        axis: Vec<f64>,
        /// Series by key (`p`, `n`, `fwd`, `bck`, `c`, ...).
        series: BTreeMap<String, Measured>,
        /// Secondary axes, e.g. the counter axis of frequency scans.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        aux_axes: BTreeMap<String, Vec<f64>>,
    },
    /// Per-dwell-bin asymmetries of a random-frequency run.
    Grid {
        /// Frequencies in Hz, one per row.
        freq: Vec<f64>,
        /// Dwell-bin times in ms relative to the RF midpoint, one per column.
        time_ms: Vec<f64>,
        /// Grids by key (`p`, `n`, `c`).
        grids: BTreeMap<String, MeasuredGrid>,
    },
    /// Every random-frequency product.
    RandomFrequency(RandomFrequencyAsym),
}

impl AsymResult {
    pub(crate) fn series(axis_key: &str, axis: Vec<f64>, series: Measured) -> Self {
        AsymResult::Series {
            axis_key: axis_key.to_string(),
            axis,
            series,
        }
    }

    pub(crate) fn named<'a>(
        axis_key: &str,
        axis: Vec<f64>,
        series: impl IntoIterator<Item = (&'a str, Measured)>,
    ) -> Self {
        AsymResult::Named {
            axis_key: axis_key.to_string(),
            axis,
            series: series
                .into_iter()
                .map(|(key, m)| (key.to_string(), m))
                .collect(),
            aux_axes: BTreeMap::new(),
        }
    }

    /// Name of the primary axis.
    pub fn axis_key(&self) -> &str {
        match self {
            AsymResult::Series { axis_key, .. } | AsymResult::Named { axis_key, .. } => axis_key,
            AsymResult::Grid { .. } | AsymResult::RandomFrequency(_) => "freq",
        }
    }

    /// Primary axis values.
    pub fn axis(&self) -> &[f64] {
        match self {
            AsymResult::Series { axis, .. } | AsymResult::Named { axis, .. } => axis,
            AsymResult::Grid { freq, .. } => freq,
            AsymResult::RandomFrequency(bundle) => &bundle.freq,
        }
    }

    /// Looks up a series by key; a `Series` answers to any key.
    pub fn get(&self, key: &str) -> Option<&Measured> {
        match self {
            AsymResult::Series { series, .. } => Some(series),
            AsymResult::Named { series, .. } => series.get(key),
            AsymResult::Grid { .. } | AsymResult::RandomFrequency(_) => None,
        }
    }

    /// Series keys of a `Named` result, sorted.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            AsymResult::Named { series, .. } => series.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// A computed result and the warnings raised while computing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asymmetry {
    /// Calculated asymmetry.
    pub result: AsymResult,
    /// Recoverable issues, in the order they were raised.
    #[serde(default)]
    pub warnings: Vec<DataWarning>,
}

/// Outcome of an asymmetry call.
///
/// `Unsupported` means nothing was computed, which is different from a
/// computed asymmetry of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum AsymOutcome {
    /// The calculation ran.
    Computed(Asymmetry),
    /// The acquisition mode has no asymmetry strategy.
    Unsupported {
        /// Mode code as recorded.
        mode: String,
    },
}

impl AsymOutcome {
    /// Computed asymmetry, if any.
    pub fn computed(&self) -> Option<&Asymmetry> {
        match self {
            AsymOutcome::Computed(asym) => Some(asym),
            AsymOutcome::Unsupported { .. } => None,
        }
    }

    /// Consumes the outcome, returning the result when one was computed.
    pub fn into_result(self) -> Option<AsymResult> {
        match self {
            AsymOutcome::Computed(asym) => Some(asym.result),
            AsymOutcome::Unsupported { .. } => None,
        }
    }

    /// True when the mode was not supported.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, AsymOutcome::Unsupported { .. })
    }
}

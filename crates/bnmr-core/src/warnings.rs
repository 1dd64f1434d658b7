//! Recoverable data-quality findings.
//!
//! A warning never aborts a calculation. Every warning is emitted through
//! `tracing` when it is recorded and also kept on the returned value so that
//! batch callers can inspect it afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Recoverable condition detected while loading or analysing a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DataWarning {
    /// An instrument variable title has no entry in the naming table.
    UnknownVariableTitle {
        /// Raw variable title as logged.
        title: String,
        /// Variable description as logged.
        description: String,
        /// Variable units as logged.
        units: String,
    },
    /// The histograms disagree with the logged prebeam count by one bin.
    PrebeamOffByOne {
        /// Run identifier (`year.run`).
        run: String,
        /// Prebeam bin count read from the PPG.
        prebeam: usize,
    },
    /// Deadtime correction was requested but timing variables are missing.
    DeadtimeSkipped {
        /// Run identifier (`year.run`).
        run: String,
        /// Names of the missing or unusable timing variables.
        missing: Vec<String>,
    },
    /// Some bins are past the point where the deadtime model is defined.
    DeadtimeSaturated {
        /// Run identifier (`year.run`).
        run: String,
        /// Number of bins left uncorrected.
        bins: usize,
    },
    /// Deadtime correction is not available for the run's acquisition mode.
    DeadtimeUnsupported {
        /// Run identifier (`year.run`).
        run: String,
        /// Acquisition mode code.
        mode: String,
    },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::UnknownVariableTitle {
                title,
                description,
                units,
            } => write!(
                f,
                "\"{title}\" not found in the naming table (\"{description}\" in \"{units}\"); kept in the variable list only"
            ),
            DataWarning::PrebeamOffByOne { run, prebeam } => write!(
                f,
                "{run}: histogram counts disagree with the ppg prebeam setting ({prebeam}); removed one extra bin"
            ),
            DataWarning::DeadtimeSkipped { run, missing } => write!(
                f,
                "{run}: deadtime correction skipped, missing timing variables: {}",
                missing.join(", ")
            ),
            DataWarning::DeadtimeSaturated { run, bins } => write!(
                f,
                "{run}: {bins} bins exceed the deadtime model range and were left uncorrected"
            ),
            DataWarning::DeadtimeUnsupported { run, mode } => write!(
                f,
                "{run}: deadtime correction is not available in mode {mode}; ignored"
            ),
        }
    }
}

/// Ordered collection of warnings raised during one operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    warnings: Vec<DataWarning>,
}

impl Diagnostics {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and emits it on the `tracing` warn level.
    pub fn warn(&mut self, warning: DataWarning) {
        tracing::warn!(target: "bnmr", warning = %warning, "recoverable data issue");
        self.warnings.push(warning);
    }

    /// Returns the recorded warnings in the order they were raised.
    pub fn warnings(&self) -> &[DataWarning] {
        &self.warnings
    }

    /// Returns true when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Consumes the collection, returning the warnings.
    pub fn into_vec(self) -> Vec<DataWarning> {
        self.warnings
    }
}

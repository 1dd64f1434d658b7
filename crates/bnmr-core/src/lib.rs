#![deny(missing_docs)]
#![doc = "Core data model for β-NMR / β-NQR runs: typed run records, acquisition modes, instrument-variable naming, value/error series, structured errors and recoverable data warnings."]

pub mod derived;
pub mod errors;
pub mod hash;
pub mod measured;
pub mod mode;
pub mod names;
pub mod record;
pub mod warnings;

pub use derived::{known_isotopes, lifetime, Lifetime};
pub use errors::{BnmrError, ErrorInfo};
pub use hash::{float_digest, stable_hash_string};
pub use measured::Measured;
pub use mode::{AcquisitionMode, Area};
pub use names::{classify, normalized_key, VariableGroup};
pub use record::{
    Histogram, HistogramMeta, InstrumentVar, RunData, RunHeader, RunId, RunRecord,
    RunRecordParts, Timing,
};
pub use warnings::{DataWarning, Diagnostics};

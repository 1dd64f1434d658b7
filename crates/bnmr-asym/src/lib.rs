#![deny(missing_docs)]
#![doc = "Asymmetry engine for β-NMR runs: channel selection, deadtime correction, prebeam stripping, scan aggregation, random-frequency analysis, closed-form asymmetries and rebinning behind a single `asym` entry point."]

pub mod channels;
pub mod deadtime;
pub mod engine;
pub mod fit;
pub mod formulas;
pub mod options;
pub mod random_freq;
pub mod rebin;
pub mod result;
pub mod scan;

pub use channels::{default_channel_names, parse_selection, select_channels, ChannelSet, ScanAxis};
pub use engine::{asym, TIME_AXIS_KEY};
pub use fit::{estimate_deadtime, DeadtimeEstimate, DeadtimeObjective, GoldenSection, Minimizer};
pub use options::{AsymOption, AsymRequest, KillList, ResolvedRequest};
pub use random_freq::{HelicityTriple, RandomFrequencyAsym, RandomFrequencyLayout};
pub use rebin::{rebin, rebin_axis};
pub use result::{AsymOutcome, AsymResult, Asymmetry, MeasuredGrid};
pub use scan::{AxisKey, PREBEAM_SANITY_COUNTS};

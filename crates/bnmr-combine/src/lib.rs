#![deny(missing_docs)]
#![doc = "Multi-run combination for β-NMR asymmetries: joined views that recompute from concatenated or summed histograms, merged synthetic records, weighted means of per-run asymmetries and parallel batch evaluation."]

pub mod batch;
pub mod consistency;
pub mod histograms;
pub mod joined;
pub mod mean;
pub mod merged;

pub use batch::{asym_batch, BatchEntry, BatchOpts};
pub use consistency::{check_timing, common_mode_area, concatenated_id};
pub use histograms::combine_histograms;
pub use joined::JoinedRuns;
pub use mean::{asym_mean, weighted_mean};
pub use merged::{merge_runs, VARIANCE_FLOOR};

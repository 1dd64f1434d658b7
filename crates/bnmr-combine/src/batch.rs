//! Independent asymmetries for many runs at once.

use bnmr_asym::{asym, AsymOutcome, AsymRequest};
use bnmr_core::{BnmrError, RunData, RunId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

fn default_threads() -> usize {
    0
}

/// Options governing batch evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOpts {
    /// Worker threads; 0 uses the global rayon pool.
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl Default for BatchOpts {
    fn default() -> Self {
        Self {
            threads: default_threads(),
        }
    }
}

/// Outcome of one run in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Run the entry belongs to.
    pub id: RunId,
    /// Result of the asymmetry call; a failure does not stop the batch.
    pub outcome: Result<AsymOutcome, BnmrError>,
}

impl BatchEntry {
    /// True when the call returned without error.
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Computes the asymmetry of every run, in parallel, keeping input order.
///
/// Per-run errors are stored in their entries. Only a failure to build the
/// worker pool is returned as an error.
pub fn asym_batch<R: RunData>(
    runs: &[R],
    request: &AsymRequest,
    opts: &BatchOpts,
) -> Result<Vec<BatchEntry>, BnmrError> {
    let _span = info_span!("asym_batch", runs = runs.len(), threads = opts.threads).entered();
    let evaluate = || {
        runs.par_iter()
            .map(|run| {
                let _run = info_span!("run", id = %run.id()).entered();
                BatchEntry {
                    id: run.id().clone(),
                    outcome: asym(run, request),
                }
            })
            .collect::<Vec<_>>()
    };

    let entries = if opts.threads == 0 {
        evaluate()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.threads)
            .build()
            .map_err(|err| BnmrError::config("thread_pool", err.to_string()))?;
        pool.install(evaluate)
    };

    let failed = entries.iter().filter(|entry| !entry.is_ok()).count();
    info!(runs = entries.len(), failed, "batch complete");
    Ok(entries)
}

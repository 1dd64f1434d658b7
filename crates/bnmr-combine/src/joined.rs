//! A set of runs viewed as one for recomputing asymmetries.

use bnmr_asym::{AsymOutcome, AsymRequest};
use bnmr_core::{
    AcquisitionMode, Area, BnmrError, ErrorInfo, Histogram, RunData, RunId, RunRecord,
};
use rayon::prelude::*;
use tracing::info_span;

use crate::consistency::{common_mode_area, concatenated_id};
use crate::histograms::combine_histograms;
use crate::mean::asym_mean;

/// Runs kept side by side with joined histograms.
///
/// Scan runs have their channels and x axis concatenated in input order;
/// all other modes sum their channels bin by bin. PPG lookups must agree
/// across the runs.
#[derive(Debug, Clone)]
pub struct JoinedRuns {
    runs: Vec<RunRecord>,
    id: RunId,
    mode: AcquisitionMode,
    area: Area,
    histograms: Vec<Histogram>,
}

impl JoinedRuns {
    /// Joins `runs`; they must share acquisition mode and area.
    pub fn new(runs: Vec<RunRecord>) -> Result<Self, BnmrError> {
        let _span = info_span!("join_runs", runs = runs.len()).entered();
        let refs: Vec<&RunRecord> = runs.iter().collect();
        let (mode, area) = common_mode_area(&refs)?;
        let histograms = combine_histograms(&refs, mode.is_scan())?;
        let id = concatenated_id(&refs);
        Ok(Self {
            runs,
            id,
            mode,
            area,
            histograms,
        })
    }

    /// Constituent runs in input order.
    pub fn runs(&self) -> &[RunRecord] {
        &self.runs
    }

    /// Joined histograms.
    pub fn histograms(&self) -> &[Histogram] {
        &self.histograms
    }

    /// Applies `f` to every run in parallel; results keep the input order.
    pub fn collect<T, F>(&self, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&RunRecord) -> T + Sync + Send,
    {
        self.runs.par_iter().map(f).collect()
    }

    /// Weighted mean of the per-run asymmetries.
    pub fn asym_mean(&self, request: &AsymRequest) -> Result<AsymOutcome, BnmrError> {
        asym_mean(&self.runs, request)
    }
}

impl RunData for JoinedRuns {
    fn id(&self) -> &RunId {
        &self.id
    }

    fn mode(&self) -> &AcquisitionMode {
        &self.mode
    }

    fn area(&self) -> &Area {
        &self.area
    }

    fn duration(&self) -> f64 {
        self.runs.iter().map(RunData::duration).sum()
    }

    fn histogram(&self, title: &str) -> Option<&Histogram> {
        self.histograms.iter().find(|hist| hist.title() == title)
    }

    fn histogram_titles(&self) -> Vec<&str> {
        self.histograms.iter().map(Histogram::title).collect()
    }

    fn ppg_mean(&self, key: &str) -> Result<Option<f64>, BnmrError> {
        let values: Vec<Option<f64>> = self
            .runs
            .iter()
            .map(|run| run.ppg_mean(key))
            .collect::<Result<_, _>>()?;
        let first = values.first().copied().flatten();
        if values.iter().any(|value| *value != first) {
            return Err(BnmrError::Consistency(
                ErrorInfo::new("ppg-mismatch", "PPG parameter differs between joined runs")
                    .with_context("variable", key)
                    .with_context("runs", self.id.to_string())
                    .with_context("values", format!("{values:?}")),
            ));
        }
        Ok(first)
    }
}

#![allow(dead_code)]

use bnmr_core::{
    AcquisitionMode, Area, Histogram, HistogramMeta, InstrumentVar, RunHeader, RunRecord,
};

pub const BNMR: [&str; 4] = ["F+", "F-", "B+", "B-"];

pub struct RunBuilder {
    header: RunHeader,
    histograms: Vec<Histogram>,
    variables: Vec<InstrumentVar>,
}

impl RunBuilder {
    pub fn new(run: u32, mode: &str) -> Self {
        Self {
            header: RunHeader::new(run, 2021, AcquisitionMode::parse(mode), Area::Bnmr),
            histograms: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn header(mut self, edit: impl FnOnce(&mut RunHeader)) -> Self {
        edit(&mut self.header);
        self
    }

    pub fn hist(mut self, title: &str, data: &[f64]) -> Self {
        self.histograms.push(Histogram::new(title, data.to_vec()));
        self
    }

    pub fn hist_with_meta(mut self, title: &str, data: &[f64], meta: HistogramMeta) -> Self {
        self.histograms
            .push(Histogram::new(title, data.to_vec()).with_meta(meta));
        self
    }

    pub fn channels(self, data: [&[f64]; 4]) -> Self {
        BNMR.into_iter()
            .zip(data)
            .fold(self, |builder, (title, data)| builder.hist(title, data))
    }

    pub fn var(mut self, var: InstrumentVar) -> Self {
        self.variables.push(var);
        self
    }

    pub fn dwell(self, ms: f64) -> Self {
        self.var(InstrumentVar::new("/PPG/PPG20/Dwell time (ms)", ms, 0.0))
    }

    pub fn build(self) -> RunRecord {
        RunRecord::new(self.header, self.histograms, self.variables)
    }
}

/// Time-resolved run with the same counts in every channel pair.
pub fn slr(run: u32, forward: &[f64], backward: &[f64]) -> RunRecord {
    RunBuilder::new(run, "20")
        .channels([forward, backward, backward, forward])
        .dwell(10.0)
        .var(InstrumentVar::new("/PPG/PPG20/e20 prebeam dwelltimes", 0.0, 0.0))
        .build()
}

pub fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() <= tol, "{actual:?} vs {expected:?}");
    }
}

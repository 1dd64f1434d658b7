#![allow(dead_code)]

use bnmr_asym::{AsymOutcome, AsymResult, Asymmetry};
use bnmr_core::{AcquisitionMode, Area, Histogram, InstrumentVar, RunHeader, RunRecord};

const PPG_TITLES: &[(&str, &str)] = &[
    ("dwelltime", "/PPG/PPG20/Dwell time (ms)"),
    ("prebeam", "/PPG/PPG20/e20 prebeam dwelltimes"),
    ("beam_on", "/PPG/PPG20/e20 beam on dwelltimes"),
    ("beam_off", "/PPG/PPG20/e20 beam off dwelltimes"),
    ("hel_sleep", "/PPG/PPG20/helicity flip sleep (ms)"),
    ("freq_start", "/PPG/PPG2e/frequency start (Hz)"),
    ("freq_stop", "/PPG/PPG2e/frequency stop (Hz)"),
    ("freq_incr", "/PPG/PPG2e/frequency increment (Hz)"),
    ("ndwell_per_f", "/PPG/PPG2e/Number dwelltimes per freq"),
    ("rf_on_delay", "/PPG/PPG2e/RFon delay (dwelltimes)"),
    ("rf_on_ms", "/PPG/PPG2e/RF on time (ms)"),
];

pub struct RunBuilder {
    header: RunHeader,
    histograms: Vec<Histogram>,
    variables: Vec<InstrumentVar>,
}

impl RunBuilder {
    pub fn new(mode: &str, area: &str) -> Self {
        Self {
            header: RunHeader::new(40001, 2020, AcquisitionMode::parse(mode), Area::parse(area)),
            histograms: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn run(mut self, run: u32) -> Self {
        self.header.id = bnmr_core::RunId::Single { run, year: 2020 };
        self
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.header.duration = seconds;
        self
    }

    pub fn hist(mut self, title: &str, data: &[f64]) -> Self {
        self.histograms.push(Histogram::new(title, data.to_vec()));
        self
    }

    pub fn channels(self, titles: [&str; 4], data: [&[f64]; 4]) -> Self {
        titles
            .into_iter()
            .zip(data)
            .fold(self, |builder, (title, data)| builder.hist(title, data))
    }

    pub fn ppg(mut self, key: &str, value: f64) -> Self {
        let title = PPG_TITLES
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, title)| *title)
            .unwrap_or_else(|| panic!("no test title for {key}"));
        self.variables.push(InstrumentVar::new(title, value, 0.0));
        self
    }

    pub fn build(self) -> RunRecord {
        RunRecord::new(self.header, self.histograms, self.variables)
    }
}

pub const BNMR: [&str; 4] = ["F+", "F-", "B+", "B-"];

/// BNMR `20` run with identical data in all four channels.
pub fn uniform_slr(data: &[f64], prebeam: f64, dwelltime_ms: f64) -> RunRecord {
    RunBuilder::new("20", "BNMR")
        .channels(BNMR, [data, data, data, data])
        .ppg("dwelltime", dwelltime_ms)
        .ppg("prebeam", prebeam)
        .build()
}

pub fn computed(outcome: AsymOutcome) -> Asymmetry {
    match outcome {
        AsymOutcome::Computed(asym) => asym,
        AsymOutcome::Unsupported { mode } => panic!("mode {mode} unsupported"),
    }
}

pub fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() <= tol, "{actual:?} vs {expected:?}");
    }
}

pub fn named_keys(result: &AsymResult) -> Vec<&str> {
    result.keys()
}

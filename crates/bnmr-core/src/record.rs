//! Typed run records handed over by the file-decoding layer.

use std::collections::BTreeMap;
use std::fmt;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::errors::BnmrError;
use crate::mode::{AcquisitionMode, Area};
use crate::names::{normalized_key, VariableGroup};
use crate::warnings::{DataWarning, Diagnostics};

/// Bookkeeping attached to a histogram.
///
/// Fields that can become ambiguous when runs are combined are optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramMeta {
    /// Histogram index within the file.
    pub id_number: Option<u32>,
    /// MUD histogram type code.
    pub htype: Option<u32>,
    /// Size of the packed histogram payload.
    pub n_bytes: u64,
    /// Total number of recorded events.
    pub n_events: u64,
    /// Seconds per bin.
    pub s_per_bin: Option<f64>,
    /// Femtoseconds per bin.
    pub fs_per_bin: Option<f64>,
    /// Time zero in picoseconds.
    pub t0_ps: Option<f64>,
    /// Time zero bin.
    pub t0_bin: Option<u32>,
    /// First good bin.
    pub good_bin1: Option<u32>,
    /// Last good bin.
    pub good_bin2: Option<u32>,
    /// First background bin.
    pub background1: u64,
    /// Last background bin.
    pub background2: u64,
}

/// One detector channel (or x-axis) histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    title: String,
    data: Vec<f64>,
    #[serde(default)]
    meta: HistogramMeta,
}

impl Histogram {
    /// Creates a histogram with default metadata.
    pub fn new(title: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            title: title.into(),
            data,
            meta: HistogramMeta::default(),
        }
    }

    /// Replaces the metadata block.
    pub fn with_meta(mut self, meta: HistogramMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Histogram title, also its lookup key.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Bin contents.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.data.len()
    }

    /// Metadata block.
    pub fn meta(&self) -> &HistogramMeta {
        &self.meta
    }

    pub(crate) fn rename(&mut self, title: &str) {
        self.title = title.to_string();
    }
}

/// Summary statistics of a logged instrument variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentVar {
    #[serde(default)]
    id_number: u32,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    units: String,
    mean: f64,
    #[serde(default)]
    std: f64,
    #[serde(default)]
    low: f64,
    #[serde(default)]
    high: f64,
    #[serde(default)]
    skew: f64,
}

impl InstrumentVar {
    /// Creates a variable whose range collapses onto its mean.
    pub fn new(title: impl Into<String>, mean: f64, std: f64) -> Self {
        Self {
            id_number: 0,
            title: title.into(),
            description: String::new(),
            units: String::new(),
            mean,
            std,
            low: mean,
            high: mean,
            skew: 0.0,
        }
    }

    /// Sets the observed range.
    pub fn with_range(mut self, low: f64, high: f64) -> Self {
        self.low = low;
        self.high = high;
        self
    }

    /// Sets the skewness.
    pub fn with_skew(mut self, skew: f64) -> Self {
        self.skew = skew;
        self
    }

    /// Sets the free-text description and units.
    pub fn with_description(
        mut self,
        description: impl Into<String>,
        units: impl Into<String>,
    ) -> Self {
        self.description = description.into();
        self.units = units.into();
        self
    }

    /// Sets the index within the file.
    pub fn with_id(mut self, id_number: u32) -> Self {
        self.id_number = id_number;
        self
    }

    /// Index within the file.
    pub fn id_number(&self) -> u32 {
        self.id_number
    }

    /// Raw title as logged.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Free-text description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Units string.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Mean over the run.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Standard deviation over the run.
    pub fn std(&self) -> f64 {
        self.std
    }

    /// Minimum over the run.
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Maximum over the run.
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Skewness over the run (NaN for merged records).
    pub fn skew(&self) -> f64 {
        self.skew
    }
}

/// Identity of a run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RunId {
    /// A run loaded from one file.
    Single {
        /// Run number.
        run: u32,
        /// Year the run started.
        year: i32,
    },
    /// Digit concatenation of the constituent run numbers and years.
    ///
    /// This is a label, not a numeric identifier.
    Merged {
        /// Concatenated run numbers in ascending run order.
        run: String,
        /// Concatenated years in the same order.
        year: String,
    },
}

impl RunId {
    /// Run number of a single run.
    pub fn run_number(&self) -> Option<u32> {
        match self {
            RunId::Single { run, .. } => Some(*run),
            RunId::Merged { .. } => None,
        }
    }

    /// Year of a single run.
    pub fn year(&self) -> Option<i32> {
        match self {
            RunId::Single { year, .. } => Some(*year),
            RunId::Merged { .. } => None,
        }
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunId::Single { run, year } => write!(f, "{year}.{run}"),
            RunId::Merged { run, year } => write!(f, "{year}.{run}"),
        }
    }
}

fn default_mode() -> AcquisitionMode {
    AcquisitionMode::Unknown(String::new())
}

fn default_area() -> Area {
    Area::Other(String::new())
}

/// Descriptive run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHeader {
    /// Run identity.
    pub id: RunId,
    /// Acquisition mode.
    #[serde(default = "default_mode")]
    pub mode: AcquisitionMode,
    /// Spectrometer.
    #[serde(default = "default_area")]
    pub area: Area,
    /// Experiment number (`None` once merged runs disagree).
    #[serde(default)]
    pub exp: Option<u32>,
    /// Elapsed run time in seconds.
    #[serde(default)]
    pub duration: f64,
    /// Start of run, epoch seconds.
    #[serde(default)]
    pub start_time: i64,
    /// End of run, epoch seconds.
    #[serde(default)]
    pub end_time: i64,
    /// Run title.
    #[serde(default)]
    pub title: String,
    /// Facility name.
    #[serde(default)]
    pub lab: String,
    /// Collection method (e.g. `TI-bNMR`).
    #[serde(default)]
    pub method: String,
    /// Sample name.
    #[serde(default)]
    pub sample: String,
    /// Sample orientation.
    #[serde(default)]
    pub orientation: String,
    /// Data acquisition system.
    #[serde(default)]
    pub das: String,
    /// Experimenter names.
    #[serde(default)]
    pub experimenter: String,
    /// Apparatus name.
    #[serde(default)]
    pub apparatus: String,
    /// Free-text run description.
    #[serde(default)]
    pub description: String,
}

impl RunHeader {
    /// Minimal header for a single run; remaining fields are empty.
    pub fn new(run: u32, year: i32, mode: AcquisitionMode, area: Area) -> Self {
        Self {
            id: RunId::Single { run, year },
            mode,
            area,
            exp: None,
            duration: 0.0,
            start_time: 0,
            end_time: 0,
            title: String::new(),
            lab: String::new(),
            method: String::new(),
            sample: String::new(),
            orientation: String::new(),
            das: String::new(),
            experimenter: String::new(),
            apparatus: String::new(),
            description: String::new(),
        }
    }

    /// Sets the run duration in seconds.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    /// Human readable start time (UTC).
    pub fn start_date(&self) -> String {
        render_epoch(self.start_time)
    }

    /// Human readable end time (UTC).
    pub fn end_date(&self) -> String {
        render_epoch(self.end_time)
    }
}

fn render_epoch(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0)
        .map(|date| date.format("%a %b %e %H:%M:%S %Y").to_string())
        .unwrap_or_default()
}

/// PPG timing parameters used by prebeam stripping and deadtime correction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Timing {
    /// Dwell time per bin in milliseconds.
    pub dwelltime_ms: Option<f64>,
    /// Number of prebeam bins.
    pub prebeam: Option<f64>,
    /// Number of beam-on bins.
    pub beam_on: Option<f64>,
    /// Number of beam-off bins.
    pub beam_off: Option<f64>,
    /// Helicity flip settle time in milliseconds.
    pub hel_sleep_ms: Option<f64>,
}

/// Read access the asymmetry engine needs from a run-like source.
///
/// Implemented by single records, merged records and joined views.
pub trait RunData: Send + Sync {
    /// Identity used in diagnostics.
    fn id(&self) -> &RunId;

    /// Acquisition mode.
    fn mode(&self) -> &AcquisitionMode;

    /// Spectrometer.
    fn area(&self) -> &Area;

    /// Elapsed acquisition time in seconds.
    fn duration(&self) -> f64;

    /// Looks up a histogram by title.
    fn histogram(&self, title: &str) -> Option<&Histogram>;

    /// Histogram titles in file order.
    fn histogram_titles(&self) -> Vec<&str>;

    /// Mean of a PPG variable by normalised key.
    ///
    /// Sources built from several runs fail when the runs disagree.
    fn ppg_mean(&self, key: &str) -> Result<Option<f64>, BnmrError>;

    /// Collects the timing group from the PPG.
    fn timing(&self) -> Result<Timing, BnmrError> {
        Ok(Timing {
            dwelltime_ms: self.ppg_mean("dwelltime")?,
            prebeam: self.ppg_mean("prebeam")?,
            beam_on: self.ppg_mean("beam_on")?,
            beam_off: self.ppg_mean("beam_off")?,
            hel_sleep_ms: self.ppg_mean("hel_sleep")?,
        })
    }
}

/// Serialized layout of a [`RunRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecordParts {
    /// Descriptive metadata.
    pub header: RunHeader,
    /// Histograms in file order.
    #[serde(default)]
    pub histograms: Vec<Histogram>,
    /// Instrument variables in file order.
    #[serde(default)]
    pub variables: Vec<InstrumentVar>,
}

/// Immutable, normalised run record.
///
/// Variables are sorted into PPG, CAMP and EPICS groups by their normalised
/// names at construction time. Titles missing from the naming table stay in
/// [`RunRecord::variables`] and raise a [`DataWarning::UnknownVariableTitle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RunRecordParts", into = "RunRecordParts")]
pub struct RunRecord {
    header: RunHeader,
    histograms: Vec<Histogram>,
    variables: Vec<InstrumentVar>,
    groups: BTreeMap<(VariableGroup, &'static str), usize>,
    load_warnings: Vec<DataWarning>,
}

const LEGACY_2003_TITLES: &[(&str, &str)] = &[
    ("FREQ", "Frequency"),
    ("Bp", "B+"),
    ("Fp", "F+"),
    ("Bm", "B-"),
    ("Fm", "F-"),
    ("FluM", "FluM2"),
    ("PolLp", "L+"),
    ("PolRp", "R+"),
    ("PolLm", "L-"),
    ("PolRm", "R-"),
    ("NBMBp", "NBMB+"),
    ("NBMFp", "NBMF+"),
    ("NBMBm", "NBMB-"),
    ("NBMFm", "NBMF-"),
];

impl RunRecord {
    /// Builds a record, applying legacy header fixes and sorting variables.
    pub fn new(
        mut header: RunHeader,
        mut histograms: Vec<Histogram>,
        variables: Vec<InstrumentVar>,
    ) -> Self {
        normalize_legacy(&mut header, &mut histograms);

        let mut diagnostics = Diagnostics::new();
        let mut groups = BTreeMap::new();
        for (index, var) in variables.iter().enumerate() {
            match normalized_key(var.title()) {
                Some(key) => {
                    groups.insert(key, index);
                }
                None => diagnostics.warn(DataWarning::UnknownVariableTitle {
                    title: var.title().to_string(),
                    description: var.description().to_string(),
                    units: var.units().to_string(),
                }),
            }
        }

        Self {
            header,
            histograms,
            variables,
            groups,
            load_warnings: diagnostics.into_vec(),
        }
    }

    /// Decodes a record from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, BnmrError> {
        serde_json::from_str(json)
            .map_err(|err| BnmrError::config("record-json", err.to_string()))
    }

    /// Descriptive metadata.
    pub fn header(&self) -> &RunHeader {
        &self.header
    }

    /// Run number for single runs.
    pub fn run_number(&self) -> Option<u32> {
        self.header.id.run_number()
    }

    /// Start year for single runs.
    pub fn year(&self) -> Option<i32> {
        self.header.id.year()
    }

    /// Histograms in file order.
    pub fn histograms(&self) -> &[Histogram] {
        &self.histograms
    }

    /// All instrument variables in file order, including unnamed ones.
    pub fn variables(&self) -> &[InstrumentVar] {
        &self.variables
    }

    /// Warnings raised while the record was built.
    pub fn load_warnings(&self) -> &[DataWarning] {
        &self.load_warnings
    }

    fn grouped(&self, group: VariableGroup, key: &str) -> Option<&InstrumentVar> {
        let normalized = key.to_lowercase();
        self.groups
            .iter()
            .find(|((g, name), _)| *g == group && *name == normalized)
            .map(|(_, index)| &self.variables[*index])
    }

    /// Pulse programmer variable by normalised key.
    pub fn ppg(&self, key: &str) -> Option<&InstrumentVar> {
        self.grouped(VariableGroup::Ppg, key)
    }

    /// CAMP variable by normalised key.
    pub fn camp(&self, key: &str) -> Option<&InstrumentVar> {
        self.grouped(VariableGroup::Camp, key)
    }

    /// EPICS variable by normalised key.
    pub fn epics(&self, key: &str) -> Option<&InstrumentVar> {
        self.grouped(VariableGroup::Epics, key)
    }

    /// Searches CAMP, EPICS and PPG (in that order) for a normalised key.
    pub fn var(&self, key: &str) -> Option<&InstrumentVar> {
        self.camp(key)
            .or_else(|| self.epics(key))
            .or_else(|| self.ppg(key))
    }

    /// Normalised keys present in a group, sorted.
    pub fn keys(&self, group: VariableGroup) -> Vec<&'static str> {
        self.groups
            .keys()
            .filter(|(g, _)| *g == group)
            .map(|(_, name)| *name)
            .collect()
    }

    /// Returns the layout used for serialization.
    pub fn to_parts(&self) -> RunRecordParts {
        RunRecordParts {
            header: self.header.clone(),
            histograms: self.histograms.clone(),
            variables: self.variables.clone(),
        }
    }
}

impl From<RunRecordParts> for RunRecord {
    fn from(parts: RunRecordParts) -> Self {
        RunRecord::new(parts.header, parts.histograms, parts.variables)
    }
}

impl From<RunRecord> for RunRecordParts {
    fn from(record: RunRecord) -> Self {
        RunRecordParts {
            header: record.header,
            histograms: record.histograms,
            variables: record.variables,
        }
    }
}

impl RunData for RunRecord {
    fn id(&self) -> &RunId {
        &self.header.id
    }

    fn mode(&self) -> &AcquisitionMode {
        &self.header.mode
    }

    fn area(&self) -> &Area {
        &self.header.area
    }

    fn duration(&self) -> f64 {
        self.header.duration
    }

    fn histogram(&self, title: &str) -> Option<&Histogram> {
        self.histograms.iter().find(|hist| hist.title() == title)
    }

    fn histogram_titles(&self) -> Vec<&str> {
        self.histograms.iter().map(Histogram::title).collect()
    }

    fn ppg_mean(&self, key: &str) -> Result<Option<f64>, BnmrError> {
        Ok(self.ppg(key).map(InstrumentVar::mean))
    }
}

fn normalize_legacy(header: &mut RunHeader, histograms: &mut [Histogram]) {
    let Some(year) = header.id.year() else {
        return;
    };

    // early TI-bNMR runs never logged their mode
    if year < 2005 && header.mode.code().is_empty() && header.method == "TI-bNMR" {
        header.mode = AcquisitionMode::Frequency;
    }

    if year == 2003 {
        if header.area.name() == "ISAC" {
            let run = header.id.run_number().unwrap_or_default();
            header.area = if run >= 45000 { Area::Bnqr } else { Area::Bnmr };
        }

        if histograms.iter().any(|hist| hist.title() == "FREQ") {
            for hist in histograms.iter_mut() {
                if let Some((_, modern)) = LEGACY_2003_TITLES
                    .iter()
                    .find(|(legacy, _)| *legacy == hist.title())
                {
                    hist.rename(modern);
                }
            }
        }
    }
}

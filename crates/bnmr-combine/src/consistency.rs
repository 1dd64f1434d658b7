//! Agreement checks shared by every way of combining runs.

use bnmr_core::{AcquisitionMode, Area, BnmrError, ErrorInfo, RunData, RunId, RunRecord};

fn mismatch(code: &str, message: impl Into<String>) -> BnmrError {
    BnmrError::Consistency(ErrorInfo::new(code, message))
}

/// PPG timing keys that must agree before time-resolved runs are merged.
pub const TIMING_KEYS: [&str; 4] = ["dwelltime", "beam_on", "beam_off", "prebeam"];

/// Returns the acquisition mode and area shared by all runs.
pub fn common_mode_area(runs: &[&RunRecord]) -> Result<(AcquisitionMode, Area), BnmrError> {
    let Some(first) = runs.first() else {
        return Err(BnmrError::invalid_input("no-runs", "at least one run is required"));
    };
    for run in &runs[1..] {
        if run.mode() != first.mode() {
            return Err(mismatch("mode-mismatch", "runs differ in acquisition mode")
                .map_info(|info| {
                    info.with_context("first", format!("{} ({})", first.id(), first.mode()))
                        .with_context("other", format!("{} ({})", run.id(), run.mode()))
                }));
        }
        if run.area() != first.area() {
            return Err(mismatch("area-mismatch", "runs differ in detector area")
                .map_info(|info| {
                    info.with_context("first", format!("{} ({})", first.id(), first.area().name()))
                        .with_context("other", format!("{} ({})", run.id(), run.area().name()))
                }));
        }
    }
    Ok((first.mode().clone(), first.area().clone()))
}

/// Requires identical dwell, beam-on, beam-off and prebeam settings.
///
/// A key missing from every run passes; missing from only some does not.
pub fn check_timing(runs: &[&RunRecord]) -> Result<(), BnmrError> {
    for key in TIMING_KEYS {
        let values: Vec<Option<f64>> = runs
            .iter()
            .map(|run| run.ppg(key).map(|var| var.mean()))
            .collect();
        if let Some(first) = values.first() {
            if values.iter().any(|value| value != first) {
                return Err(BnmrError::Consistency(
                    ErrorInfo::new("timing-mismatch", "time-resolved runs differ in PPG timing")
                        .with_context("variable", key)
                        .with_context("values", format!("{values:?}")),
                ));
            }
        }
    }
    Ok(())
}

fn id_parts(id: &RunId) -> (String, String) {
    match id {
        RunId::Single { run, year } => (run.to_string(), year.to_string()),
        RunId::Merged { run, year } => (run.clone(), year.clone()),
    }
}

/// Digit concatenation of the run numbers and years, in the given order.
pub fn concatenated_id(runs: &[&RunRecord]) -> RunId {
    let (run, year) = runs
        .iter()
        .map(|record| id_parts(record.id()))
        .fold((String::new(), String::new()), |(mut run, mut year), (r, y)| {
            run.push_str(&r);
            year.push_str(&y);
            (run, year)
        });
    RunId::Merged { run, year }
}

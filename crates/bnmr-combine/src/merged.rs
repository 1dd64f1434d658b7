//! Full statistical merge of several runs into one synthetic record.

use std::collections::BTreeSet;

use bnmr_core::{BnmrError, InstrumentVar, RunData, RunHeader, RunRecord};
use tracing::{debug, info_span};

use crate::consistency::{check_timing, common_mode_area, concatenated_id};
use crate::histograms::combine_histograms;

/// Smallest variance used when weighting instrument variables.
pub const VARIANCE_FLOOR: f64 = 1e-12;

/// Merges runs into a record that behaves like a single run.
///
/// Runs are ordered by run number first. Mode and area must agree, and
/// time-resolved runs must also share their PPG timing. Text fields collapse
/// to the common value or a `non-matching ("<first>" + others)` marker;
/// instrument variables present in every run become inverse-variance
/// weighted means; histograms are concatenated for scans and summed otherwise.
pub fn merge_runs(runs: &[RunRecord]) -> Result<RunRecord, BnmrError> {
    let _span = info_span!("merge_runs", runs = runs.len()).entered();
    let mut sorted: Vec<&RunRecord> = runs.iter().collect();
    sorted.sort_by_key(|run| run.run_number());

    let (mode, area) = common_mode_area(&sorted)?;
    if mode.is_time_resolved() {
        check_timing(&sorted)?;
    }

    let headers: Vec<&RunHeader> = sorted.iter().map(|run| run.header()).collect();
    let text = |field: fn(&RunHeader) -> &str| common_text(headers.iter().map(|h| field(h)));

    let header = RunHeader {
        id: concatenated_id(&sorted),
        mode: mode.clone(),
        area,
        exp: headers
            .first()
            .and_then(|first| first.exp)
            .filter(|exp| headers.iter().all(|h| h.exp == Some(*exp))),
        duration: headers.iter().map(|h| h.duration).sum(),
        start_time: headers.first().map(|h| h.start_time).unwrap_or_default(),
        end_time: headers.last().map(|h| h.end_time).unwrap_or_default(),
        title: text(|h| h.title.as_str()),
        lab: text(|h| h.lab.as_str()),
        method: text(|h| h.method.as_str()),
        sample: text(|h| h.sample.as_str()),
        orientation: text(|h| h.orientation.as_str()),
        das: text(|h| h.das.as_str()),
        experimenter: merge_experimenters(headers.iter().map(|h| h.experimenter.as_str())),
        apparatus: text(|h| h.apparatus.as_str()),
        description: text(|h| h.description.as_str()),
    };

    let variables = merge_variables(&sorted);
    let histograms = combine_histograms(&sorted, mode.is_scan())?;
    debug!(
        id = %header.id,
        variables = variables.len(),
        histograms = histograms.len(),
        "merged runs"
    );
    Ok(RunRecord::new(header, histograms, variables))
}

/// Common value, or a marker naming the first value when they differ.
pub fn common_text<'a>(mut values: impl Iterator<Item = &'a str>) -> String {
    let Some(first) = values.next() else {
        return String::new();
    };
    if values.all(|value| value == first) {
        first.to_string()
    } else {
        format!("non-matching (\"{first}\" + others)")
    }
}

/// Splits names on `:`, `,` and spaces, then deduplicates and sorts them.
pub fn merge_experimenters<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let names: BTreeSet<&str> = values
        .flat_map(|value| value.split([':', ',', ' ']))
        .filter(|name| !name.is_empty())
        .collect();
    names.into_iter().collect::<Vec<_>>().join(", ")
}

fn merge_variables(runs: &[&RunRecord]) -> Vec<InstrumentVar> {
    let Some(first) = runs.first() else {
        return Vec::new();
    };
    first
        .variables()
        .iter()
        .filter_map(|var| {
            let parts: Option<Vec<&InstrumentVar>> = runs
                .iter()
                .map(|run| run.variables().iter().find(|v| v.title() == var.title()))
                .collect();
            parts.map(|parts| weighted_variable(&parts))
        })
        .collect()
}

/// Inverse-variance weighted combination of one variable across runs.
///
/// Variances are floored at [`VARIANCE_FLOOR`]. When no run logged a spread
/// the plain mean is kept with zero spread.
fn weighted_variable(parts: &[&InstrumentVar]) -> InstrumentVar {
    let first = parts[0];
    let n = parts.len() as f64;
    let (mean, std) = if parts.iter().all(|var| var.std() == 0.0) {
        (parts.iter().map(|var| var.mean()).sum::<f64>() / n, 0.0)
    } else {
        let weights: Vec<f64> = parts
            .iter()
            .map(|var| 1.0 / (var.std() * var.std()).max(VARIANCE_FLOOR))
            .collect();
        let total: f64 = weights.iter().sum();
        let mean = parts
            .iter()
            .zip(&weights)
            .map(|(var, w)| var.mean() * w)
            .sum::<f64>()
            / total;
        (mean, 1.0 / total.sqrt())
    };
    let low = parts.iter().map(|var| var.low()).fold(f64::INFINITY, f64::min);
    let high = parts
        .iter()
        .map(|var| var.high())
        .fold(f64::NEG_INFINITY, f64::max);
    let id = if parts.iter().all(|var| var.id_number() == first.id_number()) {
        first.id_number()
    } else {
        0
    };

    InstrumentVar::new(first.title(), mean, std)
        .with_range(low, high)
        .with_skew(f64::NAN)
        .with_description(
            common_text(parts.iter().map(|var| var.description())),
            common_text(parts.iter().map(|var| var.units())),
        )
        .with_id(id)
}

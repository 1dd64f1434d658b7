//! Inverse-variance weighted mean of per-run asymmetries.

use std::collections::{BTreeMap, BTreeSet};

use bnmr_asym::{asym, AsymOutcome, AsymRequest, AsymResult, Asymmetry, AxisKey};
use bnmr_core::{BnmrError, ErrorInfo, Measured, RunData};
use rayon::prelude::*;
use tracing::{debug, info_span};

fn shape_error(result: &AsymResult, expected: &str) -> BnmrError {
    let found = match result {
        AsymResult::Series { axis_key, .. } => format!("series over {axis_key}"),
        AsymResult::Named { axis_key, .. } => format!("named over {axis_key}"),
        AsymResult::Grid { .. } => "grid".to_string(),
        AsymResult::RandomFrequency(_) => "random-frequency bundle".to_string(),
    };
    BnmrError::InvalidInput(
        ErrorInfo::new("mean-shape", "asymmetries of this shape cannot be averaged")
            .with_context("expected", expected)
            .with_context("found", found)
            .with_hint("request a series or named option"),
    )
}

/// Aligns series by exact axis value and averages the overlaps.
///
/// Points seen once pass through. Elsewhere each point is weighted by
/// `1/error^2`; zero-error points are ignored unless every point at that
/// axis value has zero error, in which case the plain mean is taken. NaN
/// axis values are dropped. The output axis is ascending.
pub fn weighted_mean<'a>(
    contributions: impl IntoIterator<Item = (&'a [f64], &'a Measured)>,
) -> (Vec<f64>, Measured) {
    let mut points: BTreeMap<AxisKey, Vec<(f64, f64)>> = BTreeMap::new();
    for (axis, series) in contributions {
        for (&x, point) in axis.iter().zip(series.iter()) {
            if let Some(key) = AxisKey::new(x) {
                points.entry(key).or_default().push(point);
            }
        }
    }

    let axis = points.keys().map(|key| key.value()).collect();
    let series = points.values().map(|group| reduce(group)).collect();
    (axis, series)
}

fn reduce(group: &[(f64, f64)]) -> (f64, f64) {
    if let [single] = group {
        return *single;
    }
    let (sum, weights) = group
        .iter()
        .filter(|(_, error)| *error > 0.0)
        .fold((0.0, 0.0), |(sum, weights), (value, error)| {
            let w = 1.0 / (error * error);
            (sum + w * value, weights + w)
        });
    if weights > 0.0 {
        (sum / weights, 1.0 / weights.sqrt())
    } else {
        let mean = group.iter().map(|(value, _)| value).sum::<f64>() / group.len() as f64;
        (mean, 0.0)
    }
}

/// Computes every run's asymmetry and combines them by weighted mean.
///
/// The per-run calls run in parallel and are reassembled in input order.
/// The result has the shape of the per-run results; any unsupported run
/// makes the whole outcome unsupported. Warnings of all runs are kept.
pub fn asym_mean<R: RunData>(runs: &[R], request: &AsymRequest) -> Result<AsymOutcome, BnmrError> {
    let _span = info_span!("asym_mean", runs = runs.len()).entered();
    if runs.is_empty() {
        return Err(BnmrError::invalid_input("no-runs", "at least one run is required"));
    }

    let outcomes: Vec<AsymOutcome> = runs
        .par_iter()
        .map(|run| asym(run, request))
        .collect::<Result<_, _>>()?;

    let mut computed = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            AsymOutcome::Computed(asymmetry) => computed.push(asymmetry),
            AsymOutcome::Unsupported { mode } => return Ok(AsymOutcome::Unsupported { mode }),
        }
    }

    let results: Vec<&AsymResult> = computed.iter().map(|a| &a.result).collect();
    let result = mean_of_results(&results)?;
    debug!(runs = runs.len(), points = result.axis().len(), "averaged asymmetries");
    let warnings = computed.into_iter().flat_map(|a| a.warnings).collect();
    Ok(AsymOutcome::Computed(Asymmetry { result, warnings }))
}

fn mean_of_results(results: &[&AsymResult]) -> Result<AsymResult, BnmrError> {
    match results[0] {
        AsymResult::Series { axis_key, .. } => {
            let parts = results
                .iter()
                .map(|result| match result {
                    AsymResult::Series {
                        axis_key: key,
                        axis,
                        series,
                    } if key == axis_key => Ok((axis.as_slice(), series)),
                    other => Err(shape_error(other, "series")),
                })
                .collect::<Result<Vec<_>, _>>()?;
            let (axis, series) = weighted_mean(parts);
            Ok(AsymResult::Series {
                axis_key: axis_key.clone(),
                axis,
                series,
            })
        }
        AsymResult::Named {
            axis_key, aux_axes, ..
        } => {
            let parts = results
                .iter()
                .map(|result| match result {
                    AsymResult::Named {
                        axis_key: key,
                        axis,
                        series,
                        ..
                    } if key == axis_key => Ok((axis.as_slice(), series)),
                    other => Err(shape_error(other, "named")),
                })
                .collect::<Result<Vec<_>, _>>()?;

            let keys: BTreeSet<&String> = parts.iter().flat_map(|(_, series)| series.keys()).collect();
            let mut axis = Vec::new();
            let mut series = BTreeMap::new();
            for key in keys {
                let (key_axis, mean) = weighted_mean(
                    parts
                        .iter()
                        .filter_map(|(axis, named)| named.get(key).map(|m| (*axis, m))),
                );
                if axis.is_empty() {
                    axis = key_axis;
                }
                series.insert(key.clone(), mean);
            }
            // every series of a named result shares the primary axis
            let aux_axes = aux_axes
                .keys()
                .map(|key| (key.clone(), axis.clone()))
                .collect();
            Ok(AsymResult::Named {
                axis_key: axis_key.clone(),
                axis,
                series,
                aux_axes,
            })
        }
        other => Err(shape_error(other, "series or named")),
    }
}

//! Histogram combination: concatenation for scans, element-wise sums otherwise.

use bnmr_core::{BnmrError, ErrorInfo, Histogram, HistogramMeta, RunData, RunRecord};
use tracing::debug;

fn common<T: PartialEq + Copy>(mut values: impl Iterator<Item = Option<T>>) -> Option<T> {
    let first = values.next()??;
    values.all(|value| value == Some(first)).then_some(first)
}

fn combine_meta<'a>(metas: impl Iterator<Item = &'a HistogramMeta> + Clone) -> HistogramMeta {
    HistogramMeta {
        id_number: common(metas.clone().map(|m| m.id_number)),
        htype: common(metas.clone().map(|m| m.htype)),
        n_bytes: metas.clone().map(|m| m.n_bytes).sum(),
        n_events: metas.clone().map(|m| m.n_events).sum(),
        s_per_bin: common(metas.clone().map(|m| m.s_per_bin)),
        fs_per_bin: common(metas.clone().map(|m| m.fs_per_bin)),
        t0_ps: common(metas.clone().map(|m| m.t0_ps)),
        t0_bin: common(metas.clone().map(|m| m.t0_bin)),
        good_bin1: common(metas.clone().map(|m| m.good_bin1)),
        good_bin2: common(metas.clone().map(|m| m.good_bin2)),
        background1: metas.clone().map(|m| m.background1).sum(),
        background2: metas.map(|m| m.background2).sum(),
    }
}

/// Combines every histogram title present in all runs.
///
/// With `concatenate` the bins of each run are appended in run order
/// (scan channels and their x axis alike); otherwise bins are summed and
/// all runs must have the same number of bins. Counts, events, bytes and
/// background windows are summed; other metadata survives only when common.
pub fn combine_histograms(
    runs: &[&RunRecord],
    concatenate: bool,
) -> Result<Vec<Histogram>, BnmrError> {
    let Some(first) = runs.first() else {
        return Ok(Vec::new());
    };

    let mut combined = Vec::new();
    for hist in first.histograms() {
        let title = hist.title();
        let parts: Option<Vec<&Histogram>> = runs
            .iter()
            .map(|run| run.histograms().iter().find(|h| h.title() == title))
            .collect();
        let Some(parts) = parts else {
            debug!(histogram = title, "histogram missing from some runs, not combined");
            continue;
        };

        let data = if concatenate {
            parts.iter().flat_map(|h| h.data().iter().copied()).collect()
        } else {
            sum_bins(runs, &parts, title)?
        };
        let meta = combine_meta(parts.iter().map(|h| h.meta()));
        combined.push(Histogram::new(title, data).with_meta(meta));
    }
    Ok(combined)
}

fn sum_bins(runs: &[&RunRecord], parts: &[&Histogram], title: &str) -> Result<Vec<f64>, BnmrError> {
    let n = parts[0].n_bins();
    if let Some(index) = parts.iter().position(|h| h.n_bins() != n) {
        return Err(BnmrError::Consistency(
            ErrorInfo::new("histogram-length", "summed histograms must have equal lengths")
                .with_context("histogram", title)
                .with_context("run", runs[index].id().to_string())
                .with_context("bins", parts[index].n_bins().to_string())
                .with_context("expected", n.to_string()),
        ));
    }
    let mut data = vec![0.0; n];
    for hist in parts {
        for (total, count) in data.iter_mut().zip(hist.data()) {
            *total += count;
        }
    }
    Ok(data)
}

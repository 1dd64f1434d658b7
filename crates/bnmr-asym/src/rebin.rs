//! Inverse-variance weighted rebinning.

use bnmr_core::Measured;

/// Merges groups of `k` adjacent points (the last group may be short).
///
/// Each group becomes the weighted mean with weights `1/err^2` and error
/// `1/sqrt(sum w)`. Points with zero error carry no weight; a group without
/// any weight falls back to the plain mean and population standard deviation
/// of its values. `k <= 1` returns the series unchanged.
pub fn rebin(series: &Measured, k: usize) -> Measured {
    if k <= 1 {
        return series.clone();
    }
    series
        .value()
        .chunks(k)
        .zip(series.error().chunks(k))
        .map(|(values, errors)| weighted_group(values, errors))
        .collect()
}

fn weighted_group(values: &[f64], errors: &[f64]) -> (f64, f64) {
    let weights: Vec<f64> = errors
        .iter()
        .map(|&e| if e == 0.0 { 0.0 } else { 1.0 / (e * e) })
        .collect();
    let wsum: f64 = weights.iter().sum();

    if wsum == 0.0 {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        return (mean, variance.sqrt());
    }

    let mean = values.iter().zip(&weights).map(|(v, w)| v * w).sum::<f64>() / wsum;
    (mean, 1.0 / wsum.sqrt())
}

/// Averages an axis over the same partition used by [`rebin`].
pub fn rebin_axis(axis: &[f64], k: usize) -> Vec<f64> {
    if k <= 1 {
        return axis.to_vec();
    }
    axis.chunks(k)
        .map(|group| group.iter().sum::<f64>() / group.len() as f64)
        .collect()
}

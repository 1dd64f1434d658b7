//! Random-frequency (`2e`) scans.
//!
//! Each frequency step is recorded as `ndwell` consecutive dwell bins centred
//! on an RF pulse. The one-dimensional histograms are cut into a
//! `[frequency][dwell]` grid, from which the raw per-bin asymmetries, a
//! difference about the midpoint and (for `ndwell >= 5`) a slope
//! extrapolation to the midpoint are derived.

use bnmr_core::{BnmrError, ErrorInfo, Measured, RunData};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::formulas::{combined, pair_asymmetry, Quad};
use crate::result::MeasuredGrid;

fn rf_error(code: &str, message: impl Into<String>) -> BnmrError {
    BnmrError::Data(ErrorInfo::new(code, message))
}

/// Pulse layout read from the PPG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomFrequencyLayout {
    /// Frequencies in Hz.
    pub freq: Vec<f64>,
    /// Dwell bins per frequency, always odd.
    pub ndwell: usize,
    /// Leading bins discarded before the first frequency.
    pub start_bin: usize,
    /// Dwell-bin centre times in ms, relative to the RF midpoint.
    pub time_ms: Vec<f64>,
    /// Index of the midpoint dwell bin.
    pub mid: usize,
}

impl RandomFrequencyLayout {
    /// Reads the layout from the run's PPG variables.
    ///
    /// `n_bins` is the histogram length. More frequencies or dwell bins per
    /// frequency than histogram bins is a `freq-range` data error.
    pub fn from_run<R: RunData + ?Sized>(run: &R, n_bins: usize) -> Result<Self, BnmrError> {
        let ppg = |key: &str| -> Result<f64, BnmrError> {
            run.ppg_mean(key)?.ok_or_else(|| {
                rf_error("missing-ppg", "random-frequency layout variable not logged")
                    .map_info(|info| {
                        info.with_context("variable", key)
                            .with_context("run", run.id().to_string())
                    })
            })
        };

        let start = ppg("freq_start")?;
        let stop = ppg("freq_stop")?;
        let incr = ppg("freq_incr")?;
        let ndwell_per_f = ppg("ndwell_per_f")?;
        let rf_on_delay = ppg("rf_on_delay")?;
        let rf_on_ms = ppg("rf_on_ms")?;

        if incr == 0.0 || !incr.is_finite() {
            return Err(rf_error("freq-incr", "frequency increment must be non-zero"));
        }
        let ndwell_per_f = if ndwell_per_f > 0.0 { ndwell_per_f } else { 0.0 };
        if ndwell_per_f < 2.0 {
            return Err(BnmrError::Data(
                ErrorInfo::new("ndwell", "at least three dwell bins per frequency are required")
                    .with_context("ndwell_per_f", ndwell_per_f.to_string()),
            ));
        }
        // float-to-int casts saturate, so compare as floats before narrowing
        let steps = ((stop + incr - start) / incr).ceil();
        if steps.is_nan() || steps > n_bins as f64 || ndwell_per_f > n_bins as f64 {
            return Err(BnmrError::Data(
                ErrorInfo::new("freq-range", "frequency layout exceeds the histogram length")
                    .with_context("freq_start", start.to_string())
                    .with_context("freq_stop", stop.to_string())
                    .with_context("freq_incr", incr.to_string())
                    .with_context("bins", n_bins.to_string()),
            ));
        }
        let n_freq = if steps > 0.0 { steps as usize } else { 0 };
        let ndwell = 2 * ndwell_per_f as usize - 1;
        let start_bin = if rf_on_delay > 0.0 { rf_on_delay as usize } else { 0 };

        let freq = (0..n_freq).map(|i| start + i as f64 * incr).collect();
        let time_ms = (0..ndwell)
            .map(|i| rf_on_ms * (i as f64 + 0.5 - ndwell as f64 / 2.0))
            .collect();

        Ok(Self {
            freq,
            ndwell,
            start_bin,
            time_ms,
            mid: ndwell / 2,
        })
    }

    /// Time of the midpoint bin in ms.
    pub fn mid_time(&self) -> f64 {
        self.time_ms[self.mid]
    }

    fn reshape(&self, channel: &[f64], title: &str) -> Result<Vec<Vec<f64>>, BnmrError> {
        let needed = self
            .freq
            .len()
            .saturating_mul(self.ndwell)
            .saturating_add(self.start_bin);
        if channel.len() < needed {
            return Err(BnmrError::Data(
                ErrorInfo::new("short-histogram", "histogram shorter than the frequency layout")
                    .with_context("histogram", title)
                    .with_context("bins", channel.len().to_string())
                    .with_context("needed", needed.to_string()),
            ));
        }
        Ok(channel[self.start_bin..needed]
            .chunks(self.ndwell)
            .map(<[f64]>::to_vec)
            .collect())
    }
}

/// Positive, negative and combined series, in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelicityTriple {
    /// Positive helicity.
    pub p: Measured,
    /// Negative helicity.
    pub n: Measured,
    /// Four-counter combination.
    pub c: Measured,
}

/// Every product of a random-frequency calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomFrequencyAsym {
    /// Frequencies in Hz.
    pub freq: Vec<f64>,
    /// Dwell-bin centre times in ms.
    pub time_ms: Vec<f64>,
    /// Positive helicity two-counter asymmetry per dwell bin.
    pub raw_p: MeasuredGrid,
    /// Negative helicity two-counter asymmetry per dwell bin.
    pub raw_n: MeasuredGrid,
    /// Four-counter asymmetry per dwell bin.
    pub raw_c: MeasuredGrid,
    /// Slope extrapolation to the midpoint; absent below five dwell bins.
    pub slope: Option<HelicityTriple>,
    /// Difference of the bins adjacent to the midpoint.
    pub difference: HelicityTriple,
}

/// Computes the random-frequency products from `[F+, F-, B+, B-]` style channels.
pub fn compute(
    layout: &RandomFrequencyLayout,
    channels: Quad<'_>,
    titles: &[String],
) -> Result<RandomFrequencyAsym, BnmrError> {
    let title = |i: usize| titles.get(i).map(String::as_str).unwrap_or_default();
    let fp = layout.reshape(channels[0], title(0))?;
    let fm = layout.reshape(channels[1], title(1))?;
    let bp = layout.reshape(channels[2], title(2))?;
    let bm = layout.reshape(channels[3], title(3))?;
    debug!(
        n_freq = layout.freq.len(),
        ndwell = layout.ndwell,
        "reshaped random-frequency histograms"
    );

    let rows = 0..layout.freq.len();
    let raw_p = MeasuredGrid::from_rows(rows.clone().map(|f| pair_asymmetry(&bp[f], &fp[f])));
    let raw_n = MeasuredGrid::from_rows(rows.clone().map(|f| pair_asymmetry(&bm[f], &fm[f])));
    let raw_c =
        MeasuredGrid::from_rows(rows.map(|f| combined([&fp[f], &fm[f], &bp[f], &bm[f]])));

    let slope = (layout.ndwell >= 5).then(|| HelicityTriple {
        p: slope_series(layout, &raw_p),
        n: slope_series(layout, &raw_n),
        c: slope_series(layout, &raw_c),
    });
    let difference = HelicityTriple {
        p: difference_series(layout, &raw_p),
        n: difference_series(layout, &raw_n),
        c: difference_series(layout, &raw_c),
    };

    Ok(RandomFrequencyAsym {
        freq: layout.freq.clone(),
        time_ms: layout.time_ms.clone(),
        raw_p,
        raw_n,
        raw_c,
        slope,
        difference,
    })
}

#[derive(Debug, Clone, Copy, Default)]
struct LineFit {
    intercept: f64,
    intercept_var: f64,
    slope: f64,
    slope_var: f64,
}

/// Weighted least-squares line; points with zero error are skipped.
fn fit_line(x: &[f64], y: &[f64], err: &[f64]) -> LineFit {
    let (mut w, mut wx, mut wy, mut wxy, mut wxx) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for ((&x, &y), &e) in x.iter().zip(y).zip(err) {
        if e == 0.0 {
            continue;
        }
        let wi = 1.0 / (e * e);
        w += wi;
        wx += wi * x;
        wy += wi * y;
        wxy += wi * x * y;
        wxx += wi * x * x;
    }
    let delta = w * wxx - wx * wx;
    LineFit {
        intercept: (wy * wxx - wx * wxy) / delta,
        intercept_var: wxx / delta,
        slope: (w * wxy - wx * wy) / delta,
        slope_var: w / delta,
    }
}

fn slope_series(layout: &RandomFrequencyLayout, grid: &MeasuredGrid) -> Measured {
    let t = &layout.time_ms;
    let mid = layout.mid;
    let post = layout.ndwell - mid;
    let t_mid = layout.mid_time();

    grid.value
        .iter()
        .zip(&grid.error)
        .map(|(value, error)| {
            let pre = fit_line(&t[..mid], &value[..mid], &error[..mid]);
            let pst = fit_line(&t[post..], &value[post..], &error[post..]);
            let asym = pst.intercept - pre.intercept + (pst.slope - pre.slope) * t_mid;
            let err = (pre.intercept_var
                + pst.intercept_var
                + (pre.slope_var + pst.slope_var) * t_mid * t_mid)
                .sqrt();
            (finite_or_zero(asym), finite_or_zero(err))
        })
        .collect()
}

fn difference_series(layout: &RandomFrequencyLayout, grid: &MeasuredGrid) -> Measured {
    let (before, after) = (layout.mid - 1, layout.mid + 1);
    let low = grid.column(before);
    let high = grid.column(after);
    high.iter()
        .zip(low.iter())
        .map(|((a, da), (b, db))| (a - b, (da * da + db * db).sqrt()))
        .collect()
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

//! Reshaping of raw channels before the asymmetry formulas are applied.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use bnmr_core::{DataWarning, Diagnostics, RunId};
use tracing::debug;

use crate::channels::ChannelSet;
use crate::formulas::Quad;
use crate::options::KillList;

/// Counts below which the first post-prebeam bin is considered still prebeam.
///
/// Empirical: between 2018 and 2020 some β-NQR `20` and `2e` runs were
/// recorded with the PPG prebeam setting one bin short.
pub const PREBEAM_SANITY_COUNTS: f64 = 20.0;

/// Clamps negative counts and strips prebeam bins from every channel.
///
/// When the first remaining bin of any beta channel is below
/// [`PREBEAM_SANITY_COUNTS`] while other beta bins reach it, one more bin is
/// removed from all channels and a warning is recorded. Without a logged
/// prebeam count only the clamp is applied.
pub fn strip_prebeam(
    channels: &mut ChannelSet,
    prebeam: Option<usize>,
    run: &RunId,
    diagnostics: &mut Diagnostics,
) {
    for channel in channels.all_mut() {
        for count in channel.iter_mut() {
            if *count < 0.0 {
                *count = 0.0;
            }
        }
    }

    let Some(prebeam) = prebeam else {
        return;
    };
    drop_leading(channels, prebeam);

    let beta = channels.beta();
    let low_start = beta
        .iter()
        .any(|c| c.first().is_some_and(|&first| first < PREBEAM_SANITY_COUNTS));
    let populated = beta
        .iter()
        .any(|c| c.iter().any(|&count| count >= PREBEAM_SANITY_COUNTS));

    if low_start && populated {
        diagnostics.warn(DataWarning::PrebeamOffByOne {
            run: run.to_string(),
            prebeam,
        });
        drop_leading(channels, 1);
    }
    debug!(run = %run, prebeam, bins = channels.n_bins(), "stripped prebeam");
}

fn drop_leading(channels: &mut ChannelSet, n: usize) {
    for channel in channels.all_mut() {
        channel.drain(..n.min(channel.len()));
    }
}

/// Bin-centre times in seconds for a dwell time in milliseconds.
pub fn time_axis(n_bins: usize, dwelltime_ms: f64) -> Vec<f64> {
    (0..n_bins)
        .map(|i| (i as f64 + 0.5) * dwelltime_ms / 1000.0)
        .collect()
}

/// Zeroes the killed bins in every channel; indices past the end are ignored.
pub fn kill_bins(channels: &mut ChannelSet, kill: &KillList) {
    for channel in channels.all_mut() {
        for bin in kill.bins_below(channel.len()) {
            channel[bin] = 0.0;
        }
    }
}

/// Axis value usable as an ordered map key.
///
/// Ordering is IEEE total order with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, Copy)]
pub struct AxisKey(f64);

impl AxisKey {
    /// Wraps a value; NaN is rejected.
    pub fn new(value: f64) -> Option<Self> {
        if value.is_nan() {
            None
        } else {
            Some(Self(value + 0.0))
        }
    }

    /// Wrapped value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for AxisKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AxisKey {}

impl PartialOrd for AxisKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AxisKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// How scan repetitions at the same x value are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Sum of all counts.
    Sum,
    /// Mean of the strictly positive counts, 0 when there are none.
    MeanOfNonzero,
}

/// Channels reduced to one row per distinct x value.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated {
    /// Distinct x values, ascending.
    pub x: Vec<f64>,
    /// Aggregated channels in `[c0+, c0-, c1+, c1-]` order.
    pub channels: [Vec<f64>; 4],
}

impl Aggregated {
    /// Borrowed channels.
    pub fn quad(&self) -> Quad<'_> {
        [
            &self.channels[0],
            &self.channels[1],
            &self.channels[2],
            &self.channels[3],
        ]
    }
}

/// Groups bins by identical x value. Bins with a NaN x are dropped.
pub fn aggregate(x: &[f64], channels: Quad<'_>, strategy: Aggregation) -> Aggregated {
    let mut groups: BTreeMap<AxisKey, Vec<usize>> = BTreeMap::new();
    let n = channels.iter().map(|c| c.len()).fold(x.len(), usize::min);
    for (i, &value) in x.iter().enumerate().take(n) {
        if let Some(key) = AxisKey::new(value) {
            groups.entry(key).or_default().push(i);
        }
    }

    let reduce = |channel: &[f64], bins: &[usize]| -> f64 {
        match strategy {
            Aggregation::Sum => bins.iter().map(|&i| channel[i]).sum(),
            Aggregation::MeanOfNonzero => {
                let (sum, count) = bins
                    .iter()
                    .map(|&i| channel[i])
                    .filter(|&c| c > 0.0)
                    .fold((0.0, 0usize), |(s, n), c| (s + c, n + 1));
                if count == 0 {
                    0.0
                } else {
                    sum / count as f64
                }
            }
        }
    };

    let x_out = groups.keys().map(|key| key.value()).collect();
    let channels = channels.map(|channel| {
        groups
            .values()
            .map(|bins| reduce(channel, bins))
            .collect::<Vec<f64>>()
    });
    Aggregated {
        x: x_out,
        channels,
    }
}

//! Count-rate deadtime correction.

use bnmr_core::{BnmrError, DataWarning, Diagnostics, ErrorInfo, RunData};
use tracing::debug;

use crate::channels::ChannelSet;

/// Real time spanned by one histogram bin, or the timing variables that are missing.
#[derive(Debug, Clone, PartialEq)]
pub enum BinTime {
    /// Seconds per bin.
    Seconds(f64),
    /// Names of the PPG variables needed but not logged (or unusable).
    Unknown(Vec<String>),
}

/// Derives the real time per bin from the run's PPG timing.
///
/// Time-resolved runs accumulate `duration / t_scan` scans into every bin,
/// with `t_scan = dwell * (beam_on + beam_off + prebeam) + hel_sleep`. In
/// scan modes each bin is one dwell time.
pub fn bin_time<R: RunData + ?Sized>(run: &R) -> Result<BinTime, BnmrError> {
    let timing = run.timing()?;
    let Some(dwell_ms) = timing.dwelltime_ms else {
        return Ok(BinTime::Unknown(vec!["dwelltime".into()]));
    };
    let dwell_s = dwell_ms / 1000.0;

    if !run.mode().is_time_resolved() {
        return Ok(checked(dwell_s, "dwelltime"));
    }

    let mut missing = Vec::new();
    let mut require = |value: Option<f64>, name: &str| {
        value.unwrap_or_else(|| {
            missing.push(name.to_string());
            0.0
        })
    };
    let beam_on = require(timing.beam_on, "beam_on");
    let beam_off = require(timing.beam_off, "beam_off");
    let prebeam = require(timing.prebeam, "prebeam");
    if !missing.is_empty() {
        return Ok(BinTime::Unknown(missing));
    }

    let hel_sleep_s = timing.hel_sleep_ms.unwrap_or(0.0) / 1000.0;
    let t_scan = dwell_s * (beam_on + beam_off + prebeam) + hel_sleep_s;
    if t_scan <= 0.0 {
        return Ok(BinTime::Unknown(vec!["scan time".into()]));
    }
    let n_scans = run.duration() / t_scan;
    Ok(checked(dwell_s * n_scans, "duration"))
}

fn checked(t_bin: f64, culprit: &str) -> BinTime {
    if t_bin.is_finite() && t_bin > 0.0 {
        BinTime::Seconds(t_bin)
    } else {
        BinTime::Unknown(vec![culprit.to_string()])
    }
}

/// Corrects one channel in place, returning the number of saturated bins.
///
/// Bins where `(d / t_bin) * tau >= 1` are outside the model and kept as is.
pub fn correct_counts(counts: &mut [f64], t_bin: f64, tau: f64) -> usize {
    let mut saturated = 0;
    for count in counts.iter_mut() {
        let loss = *count / t_bin * tau;
        if loss >= 1.0 {
            saturated += 1;
        } else {
            *count /= 1.0 - loss;
        }
    }
    saturated
}

/// Rejects negative or non-finite deadtimes.
pub fn validate_deadtime(tau: f64) -> Result<(), BnmrError> {
    if tau.is_finite() && tau >= 0.0 {
        Ok(())
    } else {
        Err(BnmrError::InvalidInput(
            ErrorInfo::new("deadtime", "deadtime must be a non-negative number of seconds")
                .with_context("deadtime", tau.to_string()),
        ))
    }
}

/// Applies the deadtime correction to every selected channel.
///
/// Missing timing leaves the counts untouched and records a warning.
pub fn apply<R: RunData + ?Sized>(
    run: &R,
    channels: &mut ChannelSet,
    tau: f64,
    diagnostics: &mut Diagnostics,
) -> Result<(), BnmrError> {
    validate_deadtime(tau)?;
    if tau == 0.0 {
        return Ok(());
    }

    let t_bin = match bin_time(run)? {
        BinTime::Seconds(t_bin) => t_bin,
        BinTime::Unknown(missing) => {
            diagnostics.warn(DataWarning::DeadtimeSkipped {
                run: run.id().to_string(),
                missing,
            });
            return Ok(());
        }
    };
    debug!(run = %run.id(), t_bin, tau, "correcting deadtime");

    let saturated: usize = channels
        .all_mut()
        .map(|channel| correct_counts(channel, t_bin, tau))
        .sum();
    if saturated > 0 {
        diagnostics.warn(DataWarning::DeadtimeSaturated {
            run: run.id().to_string(),
            bins: saturated,
        });
    }
    Ok(())
}

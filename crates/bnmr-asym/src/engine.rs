//! Mode dispatch for asymmetry calculations.

use bnmr_core::{
    AcquisitionMode, BnmrError, DataWarning, Diagnostics, ErrorInfo, Measured, RunData,
};
use tracing::{debug, warn};

use crate::channels::{select_channels, ChannelSet, ScanAxis};
use crate::deadtime;
use crate::formulas::{alpha_diffusion, alpha_tagged, combined, counter, helicity};
use crate::options::{AsymOption, AsymRequest, ResolvedRequest};
use crate::random_freq::{self, RandomFrequencyLayout};
use crate::rebin::{rebin, rebin_axis};
use crate::result::{AsymOutcome, AsymResult, Asymmetry};
use crate::scan::{aggregate, kill_bins, strip_prebeam, time_axis, Aggregation};

/// Axis key of time-resolved results.
pub const TIME_AXIS_KEY: &str = "time_s";

fn engine_error(code: &str, message: impl Into<String>) -> BnmrError {
    BnmrError::Data(ErrorInfo::new(code, message))
}

#[derive(Debug, Clone, Copy)]
enum Strategy {
    TimeResolved,
    Scan(ScanAxis),
    RandomFrequency,
}

impl Strategy {
    fn for_mode(mode: &AcquisitionMode) -> Option<Self> {
        if mode.is_time_resolved() {
            Some(Strategy::TimeResolved)
        } else if let Some(axis) = ScanAxis::for_mode(mode) {
            Some(Strategy::Scan(axis))
        } else if matches!(mode, AcquisitionMode::RandomFrequency) {
            Some(Strategy::RandomFrequency)
        } else {
            None
        }
    }
}

/// Computes the asymmetry of a run.
///
/// The request is validated first; runs in a mode without a strategy then
/// produce [`AsymOutcome::Unsupported`]. The run is only read.
pub fn asym<R: RunData + ?Sized>(run: &R, request: &AsymRequest) -> Result<AsymOutcome, BnmrError> {
    let request = request.resolve()?;
    let mode = run.mode();
    let Some(strategy) = Strategy::for_mode(mode) else {
        warn!(run = %run.id(), mode = %mode, "no asymmetry strategy for acquisition mode");
        return Ok(AsymOutcome::Unsupported {
            mode: mode.code().to_string(),
        });
    };

    if request.option.needs_alpha() && !mode.has_alpha() {
        return Err(BnmrError::Data(
            ErrorInfo::new("alpha-mode", "alpha asymmetries need a run with alpha detectors")
                .with_context("option", request.option.to_string())
                .with_context("mode", mode.code()),
        ));
    }
    debug!(run = %run.id(), mode = %mode, option = %request.option, rebin = request.rebin, "computing asymmetry");

    let mut diagnostics = Diagnostics::new();
    let result = match strategy {
        Strategy::TimeResolved => time_resolved(run, &request, &mut diagnostics)?,
        Strategy::Scan(axis) => frequency_scan(run, axis, &request, &mut diagnostics)?,
        Strategy::RandomFrequency => random_frequency(run, &request, &mut diagnostics)?,
    };

    Ok(AsymOutcome::Computed(Asymmetry {
        result,
        warnings: diagnostics.into_vec(),
    }))
}

fn channels_for<R: RunData + ?Sized>(
    run: &R,
    request: &ResolvedRequest,
) -> Result<ChannelSet, BnmrError> {
    select_channels(run, request.selection.as_deref(), request.neutral_beam)
}

fn time_resolved<R: RunData + ?Sized>(
    run: &R,
    request: &ResolvedRequest,
    diagnostics: &mut Diagnostics,
) -> Result<AsymResult, BnmrError> {
    let mut channels = channels_for(run, request)?;
    let timing = run.timing()?;
    let dwelltime = timing.dwelltime_ms.ok_or_else(|| {
        engine_error("missing-dwelltime", "dwell time is not logged")
            .map_info(|info| info.with_context("run", run.id().to_string()))
    })?;

    let prebeam = timing.prebeam.map(|p| p.max(0.0) as usize);
    strip_prebeam(&mut channels, prebeam, run.id(), diagnostics);
    deadtime::apply(run, &mut channels, request.deadtime, diagnostics)?;

    let k = request.rebin;
    let time = rebin_axis(&time_axis(channels.n_bins(), dwelltime), k);
    let beta = channels.beta();
    let rb = |series: Measured| rebin(&series, k);

    let result = match request.option {
        AsymOption::Positive | AsymOption::Negative => {
            let [p, n] = helicity(beta);
            let series = if request.option == AsymOption::Positive { p } else { n };
            AsymResult::series(TIME_AXIS_KEY, time, rb(series))
        }
        AsymOption::ForwardCounter | AsymOption::BackwardCounter => {
            let [fwd, bck] = counter(beta);
            let series = if request.option == AsymOption::ForwardCounter {
                fwd
            } else {
                bck
            };
            AsymResult::series(TIME_AXIS_KEY, time, rb(series))
        }
        AsymOption::Combined => AsymResult::series(TIME_AXIS_KEY, time, rb(combined(beta))),
        AsymOption::Helicity => {
            let [p, n] = helicity(beta);
            AsymResult::named(TIME_AXIS_KEY, time, [("p", rb(p)), ("n", rb(n))])
        }
        AsymOption::Counter => {
            let [fwd, bck] = counter(beta);
            AsymResult::named(TIME_AXIS_KEY, time, [("fwd", rb(fwd)), ("bck", rb(bck))])
        }
        AsymOption::AlphaDiffusion => {
            let alpha = channels.alpha();
            if alpha.len() < 2 {
                return Err(missing_alpha(run, 2, alpha.len()));
            }
            AsymResult::series(TIME_AXIS_KEY, time, rb(alpha_diffusion(&alpha, beta)))
        }
        AsymOption::AlphaTagged => {
            let alpha = channels.alpha();
            let tagged =
                alpha_tagged(&alpha, beta).ok_or_else(|| missing_alpha(run, 8, alpha.len()))?;
            let [p_wi, n_wi] = tagged.helicity_coincident;
            let [p_no, n_no] = tagged.helicity_anticoincident;
            let [p_nt, n_nt] = tagged.helicity_untagged;
            AsymResult::named(
                TIME_AXIS_KEY,
                time,
                [
                    ("p_wiA", rb(p_wi)),
                    ("n_wiA", rb(n_wi)),
                    ("p_noA", rb(p_no)),
                    ("n_noA", rb(n_no)),
                    ("p_noT", rb(p_nt)),
                    ("n_noT", rb(n_nt)),
                    ("c_wiA", rb(tagged.combined_coincident)),
                    ("c_noA", rb(tagged.combined_anticoincident)),
                    ("c_noT", rb(tagged.combined_untagged)),
                ],
            )
        }
        _ => {
            let [p, n] = helicity(beta);
            let [fwd, bck] = counter(beta);
            AsymResult::named(
                TIME_AXIS_KEY,
                time,
                [
                    ("p", rb(p)),
                    ("n", rb(n)),
                    ("fwd", rb(fwd)),
                    ("bck", rb(bck)),
                    ("c", rb(combined(beta))),
                ],
            )
        }
    };
    Ok(result)
}

fn missing_alpha<R: RunData + ?Sized>(run: &R, needed: usize, found: usize) -> BnmrError {
    BnmrError::Data(
        ErrorInfo::new("missing-alpha", "not enough alpha channels selected")
            .with_context("run", run.id().to_string())
            .with_context("needed", needed.to_string())
            .with_context("found", found.to_string()),
    )
}

fn frequency_scan<R: RunData + ?Sized>(
    run: &R,
    axis: ScanAxis,
    request: &ResolvedRequest,
    diagnostics: &mut Diagnostics,
) -> Result<AsymResult, BnmrError> {
    let mut channels = channels_for(run, request)?;
    kill_bins(&mut channels, &request.kill);
    deadtime::apply(run, &mut channels, request.deadtime, diagnostics)?;

    let x = axis.values(run)?;
    let key = axis.key();
    let beta = channels.beta();

    if request.option == AsymOption::Raw {
        let [p, n] = helicity(beta);
        return Ok(AsymResult::named(key, x, [("p", p), ("n", n)]));
    }

    let k = request.rebin;
    let rb = |series: Measured| rebin(&series, k);

    let result = match request.option {
        AsymOption::Positive | AsymOption::Negative | AsymOption::Helicity => {
            let summed = aggregate(&x, beta, Aggregation::Sum);
            let [p, n] = helicity(summed.quad());
            let axis = rebin_axis(&summed.x, k);
            match request.option {
                AsymOption::Positive => AsymResult::series(key, axis, rb(p)),
                AsymOption::Negative => AsymResult::series(key, axis, rb(n)),
                _ => AsymResult::named(key, axis, [("p", rb(p)), ("n", rb(n))]),
            }
        }
        AsymOption::Combined => {
            let summed = aggregate(&x, beta, Aggregation::Sum);
            let c = combined(summed.quad());
            AsymResult::series(key, rebin_axis(&summed.x, k), rb(c))
        }
        AsymOption::ForwardCounter | AsymOption::BackwardCounter | AsymOption::Counter => {
            let mean = aggregate(&x, beta, Aggregation::MeanOfNonzero);
            let [fwd, bck] = counter(mean.quad());
            let axis = rebin_axis(&mean.x, k);
            match request.option {
                AsymOption::ForwardCounter => AsymResult::series(key, axis, rb(fwd)),
                AsymOption::BackwardCounter => AsymResult::series(key, axis, rb(bck)),
                _ => AsymResult::named(key, axis, [("fwd", rb(fwd)), ("bck", rb(bck))]),
            }
        }
        _ => {
            let summed = aggregate(&x, beta, Aggregation::Sum);
            let mean = aggregate(&x, beta, Aggregation::MeanOfNonzero);
            let [p, n] = helicity(summed.quad());
            let [fwd, bck] = counter(mean.quad());
            let mut result = AsymResult::named(
                key,
                rebin_axis(&summed.x, k),
                [
                    ("p", rb(p)),
                    ("n", rb(n)),
                    ("fwd", rb(fwd)),
                    ("bck", rb(bck)),
                    ("c", rb(combined(summed.quad()))),
                ],
            );
            if let AsymResult::Named { aux_axes, .. } = &mut result {
                aux_axes.insert(format!("{key}_cntr"), rebin_axis(&mean.x, k));
            }
            result
        }
    };
    Ok(result)
}

fn random_frequency<R: RunData + ?Sized>(
    run: &R,
    request: &ResolvedRequest,
    diagnostics: &mut Diagnostics,
) -> Result<AsymResult, BnmrError> {
    if request.deadtime > 0.0 {
        diagnostics.warn(DataWarning::DeadtimeUnsupported {
            run: run.id().to_string(),
            mode: run.mode().code().to_string(),
        });
    }

    let channels = channels_for(run, request)?;
    let layout = RandomFrequencyLayout::from_run(run, channels.n_bins())?;
    let bundle = random_freq::compute(&layout, channels.beta(), channels.names())?;

    let slope = || {
        bundle.slope.clone().ok_or_else(|| {
            BnmrError::Data(
                ErrorInfo::new("ndwell", "slope asymmetries need at least five dwell bins")
                    .with_context("ndwell", layout.ndwell.to_string())
                    .with_context("run", run.id().to_string()),
            )
        })
    };
    let freq = bundle.freq.clone();

    let result = match request.option {
        AsymOption::SlopeCombined => AsymResult::series("freq", freq, slope()?.c),
        AsymOption::SlopeHelicity => {
            let slope = slope()?;
            AsymResult::named("freq", freq, [("p", slope.p), ("n", slope.n)])
        }
        AsymOption::DifferenceCombined => {
            AsymResult::series("freq", freq, bundle.difference.c.clone())
        }
        AsymOption::DifferenceHelicity => AsymResult::named(
            "freq",
            freq,
            [
                ("p", bundle.difference.p.clone()),
                ("n", bundle.difference.n.clone()),
            ],
        ),
        AsymOption::RawCombined => AsymResult::Grid {
            freq,
            time_ms: bundle.time_ms.clone(),
            grids: [("c".to_string(), bundle.raw_c.clone())].into_iter().collect(),
        },
        AsymOption::RawHelicity => AsymResult::Grid {
            freq,
            time_ms: bundle.time_ms.clone(),
            grids: [
                ("p".to_string(), bundle.raw_p.clone()),
                ("n".to_string(), bundle.raw_n.clone()),
            ]
            .into_iter()
            .collect(),
        },
        _ => AsymResult::RandomFrequency(bundle.clone()),
    };
    Ok(result)
}

//! Deadtime estimation from a calibration run.
//!
//! With the right deadtime the positive and negative helicity asymmetries of
//! a run are mirror images up to a scale `c`, so `p + c*n` vanishes. The
//! objective measures the departure from that as a reduced chi-squared.

use bnmr_core::{BnmrError, ErrorInfo, Measured, RunData};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::asym;
use crate::options::AsymRequest;
use crate::result::AsymOutcome;

fn fit_error(code: &str, message: impl Into<String>) -> BnmrError {
    BnmrError::InvalidInput(ErrorInfo::new(code, message))
}

fn default_tolerance() -> f64 {
    1e-9
}

fn default_max_iters() -> usize {
    200
}

/// Reduced chi-squared of `p + c*n` as a function of the deadtime.
pub struct DeadtimeObjective<'a, R: RunData + ?Sized> {
    run: &'a R,
    base: AsymRequest,
    scale: f64,
}

impl<'a, R: RunData + ?Sized> DeadtimeObjective<'a, R> {
    /// Objective over the helicity asymmetries of `run`.
    ///
    /// `base` supplies rebinning and channel selection; its option and
    /// deadtime are replaced on every evaluation.
    pub fn new(run: &'a R, base: AsymRequest, scale: f64) -> Self {
        Self { run, base, scale }
    }

    /// Evaluates the objective at deadtime `tau` (seconds).
    pub fn evaluate(&self, tau: f64) -> Result<f64, BnmrError> {
        let request = AsymRequest {
            option: "helicity".into(),
            deadtime: tau,
            ..self.base.clone()
        };
        let result = match asym(self.run, &request)? {
            AsymOutcome::Computed(asymmetry) => asymmetry.result,
            AsymOutcome::Unsupported { mode } => {
                return Err(fit_error("unsupported-mode", "no helicity asymmetry for mode")
                    .map_info(|info| info.with_context("mode", mode)))
            }
        };
        match (result.get("p"), result.get("n")) {
            (Some(p), Some(n)) => Ok(helicity_chi2(p, n, self.scale)),
            _ => Err(fit_error("helicity-shape", "helicity result lacks p or n")),
        }
    }
}

/// `sum (p + c*n)^2 / (dp^2 + c^2*dn^2) / (N - 1)` over bins with non-zero variance.
pub fn helicity_chi2(p: &Measured, n: &Measured, scale: f64) -> f64 {
    let (sum, count) = p
        .iter()
        .zip(n.iter())
        .filter_map(|((p, dp), (n, dn))| {
            let variance = dp * dp + scale * scale * dn * dn;
            (variance > 0.0).then(|| (p + scale * n).powi(2) / variance)
        })
        .fold((0.0, 0usize), |(s, k), term| (s + term, k + 1));
    if count < 2 {
        return f64::NAN;
    }
    sum / (count - 1) as f64
}

/// Location and value of a one-dimensional minimum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Minimum {
    /// Argument at the minimum.
    pub x: f64,
    /// Objective value at the minimum.
    pub value: f64,
    /// Objective evaluations spent.
    pub evaluations: usize,
}

/// Bounded one-dimensional minimiser.
pub trait Minimizer {
    /// Minimises `objective` over `[lower, upper]`.
    fn minimize(
        &self,
        objective: &mut dyn FnMut(f64) -> Result<f64, BnmrError>,
        lower: f64,
        upper: f64,
    ) -> Result<Minimum, BnmrError>;
}

/// Golden-section search for unimodal objectives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenSection {
    /// Stop once the bracket is narrower than this.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Maximum bracket reductions.
    #[serde(default = "default_max_iters")]
    pub max_iters: usize,
}

impl Default for GoldenSection {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iters: default_max_iters(),
        }
    }
}

impl Minimizer for GoldenSection {
    fn minimize(
        &self,
        objective: &mut dyn FnMut(f64) -> Result<f64, BnmrError>,
        lower: f64,
        upper: f64,
    ) -> Result<Minimum, BnmrError> {
        if !(lower.is_finite() && upper.is_finite() && lower < upper) {
            return Err(BnmrError::InvalidInput(
                ErrorInfo::new("bounds", "minimiser bounds must be finite and increasing")
                    .with_context("lower", lower.to_string())
                    .with_context("upper", upper.to_string()),
            ));
        }
        let ratio = (5f64.sqrt() - 1.0) / 2.0;
        let (mut a, mut b) = (lower, upper);
        let mut c = b - ratio * (b - a);
        let mut d = a + ratio * (b - a);
        let mut fc = objective(c)?;
        let mut fd = objective(d)?;
        let mut evaluations = 2;

        for _ in 0..self.max_iters {
            if (b - a).abs() < self.tolerance {
                break;
            }
            // NaN compares false and moves the bracket down
            if fc < fd {
                b = d;
                d = c;
                fd = fc;
                c = b - ratio * (b - a);
                fc = objective(c)?;
            } else {
                a = c;
                c = d;
                fc = fd;
                d = a + ratio * (b - a);
                fd = objective(d)?;
            }
            evaluations += 1;
        }

        let (x, value) = if fc < fd { (c, fc) } else { (d, fd) };
        Ok(Minimum {
            x,
            value,
            evaluations,
        })
    }
}

/// Best deadtime for a calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeadtimeEstimate {
    /// Deadtime in seconds.
    pub deadtime: f64,
    /// Reduced chi-squared at that deadtime.
    pub chi2: f64,
    /// Objective evaluations spent.
    pub evaluations: usize,
}

/// Searches `bounds` for the deadtime that best mirrors the helicities.
pub fn estimate_deadtime<R: RunData + ?Sized>(
    run: &R,
    minimizer: &dyn Minimizer,
    bounds: (f64, f64),
    scale: f64,
) -> Result<DeadtimeEstimate, BnmrError> {
    let objective = DeadtimeObjective::new(run, AsymRequest::default(), scale);
    let minimum = minimizer.minimize(&mut |tau| objective.evaluate(tau), bounds.0, bounds.1)?;
    debug!(
        run = %run.id(),
        deadtime = minimum.x,
        chi2 = minimum.value,
        evaluations = minimum.evaluations,
        "deadtime estimate"
    );
    Ok(DeadtimeEstimate {
        deadtime: minimum.x,
        chi2: minimum.value,
        evaluations: minimum.evaluations,
    })
}

//! Closed-form asymmetries and their propagated errors.
//!
//! Channels are always ordered `[c0+, c0-, c1+, c1-]` where `c0`/`c1` are
//! the two opposing counters (F/B, R/L or the neutral beam monitors). Zero
//! denominators yield 0 for both value and error, never NaN. Channels of
//! different lengths are evaluated over their common prefix.

use bnmr_core::Measured;
use serde::{Deserialize, Serialize};

/// Borrowed view of four counter channels in `[c0+, c0-, c1+, c1-]` order.
pub type Quad<'a> = [&'a [f64]; 4];

fn nan_to_zero(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

fn nan_if_zero(value: f64) -> f64 {
    if value == 0.0 {
        f64::NAN
    } else {
        value
    }
}

/// Two-counter asymmetry `(a-b)/(a+b)` with error `2*sqrt(a*b/(a+b)^3)`.
pub fn pair_asymmetry(a: &[f64], b: &[f64]) -> Measured {
    a.iter()
        .zip(b)
        .map(|(&a, &b)| {
            let denom = nan_if_zero(a + b);
            let value = (a - b) / denom;
            let error = 2.0 * (a * b / denom.powi(3)).sqrt();
            (nan_to_zero(value), nan_to_zero(error))
        })
        .collect()
}

/// Split-helicity asymmetries `[+, -]`, pairing the counters within each helicity.
pub fn helicity(channels: Quad<'_>) -> [Measured; 2] {
    [
        pair_asymmetry(channels[0], channels[2]),
        pair_asymmetry(channels[1], channels[3]),
    ]
}

/// Split-counter asymmetries `[c0, c1]`, pairing the helicities within each counter.
pub fn counter(channels: Quad<'_>) -> [Measured; 2] {
    [
        pair_asymmetry(channels[0], channels[1]),
        pair_asymmetry(channels[2], channels[3]),
    ]
}

/// Four-counter combined asymmetry.
///
/// `r = sqrt(c0- * c1+ / (c0+ * c1-))`, value `(r-1)/(r+1)` and error
/// `r * sqrt(sum 1/c) / (r+1)^2`.
pub fn combined(channels: Quad<'_>) -> Measured {
    let [c0p, c0m, c1p, c1m] = channels;
    let n = c0p.len().min(c0m.len()).min(c1p.len()).min(c1m.len());

    (0..n)
        .map(|i| {
            let (a, b, c, d) = (c0p[i], c1p[i], c0m[i], c1m[i]);
            let r = (b * c / nan_if_zero(a * d)).sqrt();
            let value = (r - 1.0) / (r + 1.0);
            let inverse_sum = 1.0 / nan_if_zero(a)
                + 1.0 / nan_if_zero(b)
                + 1.0 / nan_if_zero(c)
                + 1.0 / nan_if_zero(d);
            let error = r * inverse_sum.sqrt() / (r + 1.0).powi(2);
            (nan_to_zero(value), nan_to_zero(error))
        })
        .collect()
}

fn channel_sum(channels: &[&[f64]]) -> Vec<f64> {
    let n = channels.iter().map(|c| c.len()).min().unwrap_or(0);
    (0..n).map(|i| channels.iter().map(|c| c[i]).sum()).collect()
}

/// Alpha diffusion ratio `sum(alpha) / sum(beta)` with error
/// `ratio * sqrt(1/sum(alpha) + 1/sum(beta))`.
///
/// With four or more alpha channels only the third and fourth (the `AL0`
/// pair in the default layout) are used; otherwise the first two.
pub fn alpha_diffusion(alpha: &[&[f64]], beta: Quad<'_>) -> Measured {
    let selected = if alpha.len() >= 4 {
        &alpha[2..4]
    } else {
        &alpha[..alpha.len().min(2)]
    };
    let asum = channel_sum(selected);
    let bsum = channel_sum(&beta);

    asum.iter()
        .zip(&bsum)
        .map(|(&a, &b)| {
            let (a, b) = (nan_if_zero(a), nan_if_zero(b));
            let ratio = a / b;
            let error = ratio * (1.0 / a + 1.0 / b).sqrt();
            (nan_to_zero(ratio), nan_to_zero(error))
        })
        .collect()
}

/// Asymmetries of beta counts tagged by alpha coincidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaTagged {
    /// Split-helicity asymmetries of betas coincident with an alpha.
    pub helicity_coincident: [Measured; 2],
    /// Split-helicity asymmetries of betas with no coincident alpha.
    pub helicity_anticoincident: [Measured; 2],
    /// Split-helicity asymmetries of all betas.
    pub helicity_untagged: [Measured; 2],
    /// Combined asymmetry of coincident betas.
    pub combined_coincident: Measured,
    /// Combined asymmetry of anti-coincident betas.
    pub combined_anticoincident: Measured,
    /// Combined asymmetry of all betas.
    pub combined_untagged: Measured,
}

/// Computes the tagged asymmetries from eight alpha-tagged channels.
///
/// Returns `None` when fewer than eight tagged channels are supplied.
pub fn alpha_tagged(alpha: &[&[f64]], beta: Quad<'_>) -> Option<AlphaTagged> {
    if alpha.len() < 8 {
        return None;
    }
    let coincident: Quad<'_> = [alpha[0], alpha[1], alpha[2], alpha[3]];
    let anticoincident: Quad<'_> = [alpha[4], alpha[5], alpha[6], alpha[7]];

    Some(AlphaTagged {
        helicity_coincident: helicity(coincident),
        helicity_anticoincident: helicity(anticoincident),
        helicity_untagged: helicity(beta),
        combined_coincident: combined(coincident),
        combined_anticoincident: combined(anticoincident),
        combined_untagged: combined(beta),
    })
}

use bnmr_asym::formulas::{combined, helicity, pair_asymmetry};
use bnmr_asym::{rebin, rebin_axis};
use bnmr_core::Measured;
use proptest::prelude::*;

proptest! {
    #[test]
    fn helicity_asymmetry_is_bounded(
        counts in prop::collection::vec((0.0f64..1e6, 0.0f64..1e6), 1..64)
    ) {
        let (a, b): (Vec<f64>, Vec<f64>) = counts.into_iter().unzip();
        let asym = pair_asymmetry(&a, &b);
        for (i, (value, error)) in asym.iter().enumerate() {
            prop_assert!(!value.is_nan() && !error.is_nan());
            if a[i] + b[i] > 0.0 {
                prop_assert!((-1.0..=1.0).contains(&value));
            } else {
                prop_assert_eq!(value, 0.0);
                prop_assert_eq!(error, 0.0);
            }
        }
    }

    #[test]
    fn rebin_by_one_is_identity(
        points in prop::collection::vec((-1.0f64..1.0, 0.0f64..0.5), 0..64)
    ) {
        let series: Measured = points.into_iter().collect();
        prop_assert_eq!(rebin(&series, 1), series);
    }

    #[test]
    fn rebin_preserves_constant_series(
        v in -1.0f64..1.0,
        e in 0.001f64..0.5,
        k in 2usize..8,
        groups in 1usize..10,
    ) {
        let n = k * groups;
        let series = Measured::new(vec![v; n], vec![e; n]);
        let rebinned = rebin(&series, k);
        prop_assert_eq!(rebinned.len(), groups);
        for (value, error) in rebinned.iter() {
            prop_assert!((value - v).abs() < 1e-12);
            prop_assert!((error - e / (k as f64).sqrt()).abs() < 1e-12);
        }
    }
}

#[test]
fn equal_channels_give_zero_combined_asymmetry() {
    let c = [250.0; 6];
    let asym = combined([&c, &c, &c, &c]);
    for (value, error) in asym.iter() {
        assert_eq!(value, 0.0);
        assert!(error.is_finite() && error > 0.0);
    }
}

#[test]
fn helicity_pairs_counters_within_each_helicity() {
    let [p, n] = helicity([&[30.0], &[10.0], &[10.0], &[30.0]]);
    assert_eq!(p.value(), &[0.5]);
    assert_eq!(n.value(), &[-0.5]);
}

#[test]
fn rebin_keeps_short_last_group() {
    let series = Measured::new(vec![1.0, 3.0, 5.0], vec![1.0, 1.0, 2.0]);
    let rebinned = rebin(&series, 2);
    assert_eq!(rebinned.value(), &[2.0, 5.0]);
    assert!((rebinned.error()[0] - 0.5f64.sqrt()).abs() < 1e-15);
    assert_eq!(rebinned.error()[1], 2.0);
    assert_eq!(rebin_axis(&[0.5, 1.5, 2.5], 2), vec![1.0, 2.5]);
}

#[test]
fn rebin_without_weights_uses_plain_statistics() {
    let series = Measured::new(vec![1.0, 3.0], vec![0.0, 0.0]);
    let rebinned = rebin(&series, 2);
    assert_eq!(rebinned.value(), &[2.0]);
    assert_eq!(rebinned.error(), &[1.0]);
}

#[test]
fn zero_error_points_carry_no_weight() {
    let series = Measured::new(vec![1.0, 7.0], vec![0.5, 0.0]);
    let rebinned = rebin(&series, 2);
    assert_eq!(rebinned.value(), &[1.0]);
    assert_eq!(rebinned.error(), &[0.5]);
}

mod common;

use bnmr_asym::{asym, AsymRequest, AsymResult, RandomFrequencyLayout};
use bnmr_core::{BnmrError, DataWarning, RunRecord};
use common::{assert_close, computed, RunBuilder, BNMR};

fn layout_builder(ndwell_per_f: f64, incr: f64) -> RunBuilder {
    RunBuilder::new("2e", "BNMR")
        .ppg("freq_start", 1000.0)
        .ppg("freq_stop", 1002.0)
        .ppg("freq_incr", incr)
        .ppg("ndwell_per_f", ndwell_per_f)
        .ppg("rf_on_delay", 1.0)
        .ppg("rf_on_ms", 2.0)
}

/// One leading bin, then three frequencies of `row` each.
fn stepped_run(ndwell_per_f: f64, row: &[f64]) -> RunRecord {
    let mut back = vec![0.0];
    for _ in 0..3 {
        back.extend_from_slice(row);
    }
    let front = vec![100.0; back.len()];
    layout_builder(ndwell_per_f, 1.0)
        .channels(BNMR, [&front, &front, &back, &back])
        .build()
}

fn five_dwell_run() -> RunRecord {
    stepped_run(3.0, &[100.0, 100.0, 100.0, 300.0, 300.0])
}

#[test]
fn layout_follows_the_ppg() {
    let run = five_dwell_run();
    let layout = RandomFrequencyLayout::from_run(&run, 16).unwrap();
    assert_eq!(layout.freq, vec![1000.0, 1001.0, 1002.0]);
    assert_eq!(layout.ndwell, 5);
    assert_eq!(layout.mid, 2);
    assert_eq!(layout.start_bin, 1);
    assert_close(&layout.time_ms, &[-4.0, -2.0, 0.0, 2.0, 4.0], 1e-12);
    assert_eq!(layout.mid_time(), 0.0);
}

#[test]
fn default_returns_the_full_bundle() {
    let run = five_dwell_run();
    let result = computed(asym(&run, &AsymRequest::default()).unwrap()).result;
    let AsymResult::RandomFrequency(bundle) = result else {
        panic!("expected the random-frequency bundle");
    };
    assert_eq!(bundle.raw_p.n_rows(), 3);
    assert_close(&bundle.raw_p.value[0], &[0.0, 0.0, 0.0, 0.5, 0.5], 1e-12);
    assert_close(bundle.difference.p.value(), &[0.5; 3], 1e-12);
    assert_close(bundle.difference.c.value(), &[0.0; 3], 1e-12);
    let slope = bundle.slope.expect("five dwell bins allow a slope fit");
    assert_close(slope.p.value(), &[0.5; 3], 1e-9);
    assert_close(slope.n.value(), &[0.5; 3], 1e-9);
    assert!(slope.p.error().iter().all(|e| e.is_finite() && *e > 0.0));
}

#[test]
fn named_options_pick_products() {
    let run = five_dwell_run();
    let dh = computed(asym(&run, &AsymRequest::new("dh")).unwrap()).result;
    assert_eq!(dh.keys(), vec!["n", "p"]);
    assert_eq!(dh.axis(), &[1000.0, 1001.0, 1002.0]);

    let sc = computed(asym(&run, &AsymRequest::new("sc")).unwrap()).result;
    assert_close(sc.get("c").unwrap().value(), &[0.0; 3], 1e-9);

    let rh = computed(asym(&run, &AsymRequest::new("rh")).unwrap()).result;
    match rh {
        AsymResult::Grid { grids, time_ms, .. } => {
            assert_eq!(grids.keys().collect::<Vec<_>>(), vec!["n", "p"]);
            assert_eq!(time_ms.len(), 5);
        }
        other => panic!("unexpected shape {other:?}"),
    }
}

#[test]
fn rebin_is_ignored() {
    let run = five_dwell_run();
    let plain = computed(asym(&run, &AsymRequest::new("dc")).unwrap()).result;
    let rebinned = computed(asym(&run, &AsymRequest::new("dc").with_rebin(3)).unwrap()).result;
    assert_eq!(plain, rebinned);
}

#[test]
fn three_dwell_bins_have_no_slope() {
    let run = stepped_run(2.0, &[100.0, 100.0, 300.0]);
    let difference = computed(asym(&run, &AsymRequest::new("dh")).unwrap()).result;
    assert_close(difference.get("p").unwrap().value(), &[0.5; 3], 1e-12);

    let err = asym(&run, &AsymRequest::new("sh")).unwrap_err();
    assert!(matches!(err, BnmrError::Data(ref info) if info.code == "ndwell"));
}

#[test]
fn layout_errors_are_data_errors() {
    let zero_incr = layout_builder(3.0, 0.0)
        .channels(BNMR, [&[1.0], &[1.0], &[1.0], &[1.0]])
        .build();
    let err = asym(&zero_incr, &AsymRequest::default()).unwrap_err();
    assert!(matches!(err, BnmrError::Data(ref info) if info.code == "freq-incr"));

    let too_few = layout_builder(1.0, 1.0)
        .channels(BNMR, [&[1.0], &[1.0], &[1.0], &[1.0]])
        .build();
    let err = asym(&too_few, &AsymRequest::default()).unwrap_err();
    assert!(matches!(err, BnmrError::Data(ref info) if info.code == "ndwell"));

    let short = layout_builder(3.0, 1.0)
        .channels(BNMR, [&[1.0; 10], &[1.0; 10], &[1.0; 10], &[1.0; 10]])
        .build();
    let err = asym(&short, &AsymRequest::default()).unwrap_err();
    assert!(matches!(err, BnmrError::Data(ref info) if info.code == "short-histogram"));

    let tiny_incr = layout_builder(3.0, 1e-300)
        .channels(BNMR, [&[1.0; 10], &[1.0; 10], &[1.0; 10], &[1.0; 10]])
        .build();
    let err = asym(&tiny_incr, &AsymRequest::default()).unwrap_err();
    assert!(matches!(err, BnmrError::Data(ref info) if info.code == "freq-range"));

    let huge_ndwell = layout_builder(1e18, 1.0)
        .channels(BNMR, [&[1.0; 10], &[1.0; 10], &[1.0; 10], &[1.0; 10]])
        .build();
    let err = asym(&huge_ndwell, &AsymRequest::default()).unwrap_err();
    assert!(matches!(err, BnmrError::Data(ref info) if info.code == "freq-range"));

    let huge_delay = RunBuilder::new("2e", "BNMR")
        .ppg("freq_start", 1000.0)
        .ppg("freq_stop", 1002.0)
        .ppg("freq_incr", 1.0)
        .ppg("ndwell_per_f", 3.0)
        .ppg("rf_on_delay", 1e30)
        .ppg("rf_on_ms", 2.0)
        .channels(BNMR, [&[1.0; 16], &[1.0; 16], &[1.0; 16], &[1.0; 16]])
        .build();
    let err = asym(&huge_delay, &AsymRequest::default()).unwrap_err();
    assert!(matches!(err, BnmrError::Data(ref info) if info.code == "short-histogram"));

    let unlogged = RunBuilder::new("2e", "BNMR")
        .channels(BNMR, [&[1.0], &[1.0], &[1.0], &[1.0]])
        .build();
    let err = asym(&unlogged, &AsymRequest::default()).unwrap_err();
    assert!(matches!(err, BnmrError::Data(ref info) if info.code == "missing-ppg"));
}

#[test]
fn deadtime_is_not_applied() {
    let run = five_dwell_run();
    let request = AsymRequest::new("dc").with_deadtime(1e-6);
    let corrected = computed(asym(&run, &request).unwrap());
    assert_eq!(
        corrected.warnings,
        vec![DataWarning::DeadtimeUnsupported {
            run: "2020.40001".into(),
            mode: "2e".into(),
        }]
    );
    let plain = computed(asym(&run, &AsymRequest::new("dc")).unwrap());
    assert_eq!(corrected.result, plain.result);
}

mod common;

use bnmr_asym::{asym, AsymRequest};
use bnmr_combine::{merge_runs, JoinedRuns};
use bnmr_core::{BnmrError, HistogramMeta, InstrumentVar, RunData, RunId};
use common::{assert_close, slr, RunBuilder};

fn field(mean: f64, std: f64) -> InstrumentVar {
    InstrumentVar::new("/magnet/mag_field", mean, std).with_description("field", "T")
}

#[test]
fn equal_variables_merge_to_the_same_mean_with_smaller_spread() {
    let a = RunBuilder::new(40001, "20").var(field(10.0, 1.0).with_range(9.0, 11.0));
    let b = RunBuilder::new(40002, "20").var(field(10.0, 1.0).with_range(8.5, 10.5));
    let merged = merge_runs(&[a.build(), b.build()]).unwrap();

    let var = merged.camp("b_field").unwrap();
    assert!((var.mean() - 10.0).abs() < 1e-12);
    assert!((var.std() - 1.0 / 2f64.sqrt()).abs() < 1e-12);
    assert_eq!(var.low(), 8.5);
    assert_eq!(var.high(), 11.0);
    assert!(var.skew().is_nan());
    assert_eq!(var.units(), "T");
}

#[test]
fn variables_are_inverse_variance_weighted() {
    let a = RunBuilder::new(40001, "20").var(field(1.0, 1.0)).build();
    let b = RunBuilder::new(40002, "20").var(field(4.0, 2.0)).build();
    let merged = merge_runs(&[a, b]).unwrap();
    let var = merged.camp("b_field").unwrap();
    // weights 1 and 1/4
    assert!((var.mean() - 1.6).abs() < 1e-12);
    assert!((var.std() - (1.0f64 / 1.25).sqrt()).abs() < 1e-12);
}

#[test]
fn variables_missing_from_a_run_are_dropped() {
    let a = RunBuilder::new(40001, "20").var(field(1.0, 1.0)).build();
    let b = RunBuilder::new(40002, "20").build();
    let merged = merge_runs(&[a, b]).unwrap();
    assert!(merged.camp("b_field").is_none());
}

#[test]
fn header_fields_follow_the_merge_rules() {
    let a = RunBuilder::new(40002, "20")
        .header(|h| {
            h.title = "second".into();
            h.sample = "Pt".into();
            h.experimenter = "rmlm:ak".into();
            h.exp = Some(1714);
            h.duration = 300.0;
            h.start_time = 2_000;
            h.end_time = 2_300;
        })
        .build();
    let b = RunBuilder::new(40001, "20")
        .header(|h| {
            h.title = "first".into();
            h.sample = "Pt".into();
            h.experimenter = "ak, dlc".into();
            h.exp = Some(1714);
            h.duration = 200.0;
            h.start_time = 1_000;
            h.end_time = 1_200;
        })
        .build();

    let merged = merge_runs(&[a, b]).unwrap();
    let header = merged.header();
    assert_eq!(
        header.id,
        RunId::Merged {
            run: "4000140002".into(),
            year: "20212021".into(),
        }
    );
    assert_eq!(merged.id().to_string(), "20212021.4000140002");
    assert_eq!(merged.run_number(), None);
    assert_eq!(header.title, "non-matching (\"first\" + others)");
    assert_eq!(header.sample, "Pt");
    assert_eq!(header.experimenter, "ak, dlc, rmlm");
    assert_eq!(header.exp, Some(1714));
    assert_eq!(header.duration, 500.0);
    assert_eq!(header.start_time, 1_000);
    assert_eq!(header.end_time, 2_300);
}

#[test]
fn time_resolved_histograms_are_summed() {
    let meta = |t0_bin, n_events| HistogramMeta {
        t0_bin: Some(t0_bin),
        n_events,
        s_per_bin: Some(0.01),
        ..HistogramMeta::default()
    };
    let a = RunBuilder::new(40001, "20")
        .hist_with_meta("F+", &[1.0, 2.0], meta(0, 3))
        .hist("B+", &[5.0, 5.0])
        .build();
    let b = RunBuilder::new(40002, "20")
        .hist_with_meta("F+", &[10.0, 20.0], meta(1, 30))
        .hist("B+", &[1.0, 1.0])
        .hist("L+", &[7.0])
        .build();

    let merged = merge_runs(&[a, b]).unwrap();
    let hist = merged.histogram("F+").unwrap();
    assert_eq!(hist.data(), &[11.0, 22.0]);
    assert_eq!(hist.meta().n_events, 33);
    assert_eq!(hist.meta().t0_bin, None);
    assert_eq!(hist.meta().s_per_bin, Some(0.01));
    assert!(merged.histogram("L+").is_none());
}

#[test]
fn summed_histograms_need_equal_lengths() {
    let a = slr(40001, &[1.0, 2.0], &[1.0, 2.0]);
    let b = slr(40002, &[1.0], &[1.0]);
    let err = merge_runs(&[a, b]).unwrap_err();
    assert!(matches!(err, BnmrError::Consistency(ref info) if info.code == "histogram-length"));
}

#[test]
fn time_resolved_runs_must_share_timing() {
    let a = slr(40001, &[1.0], &[1.0]);
    let b = RunBuilder::new(40002, "20")
        .channels([&[1.0], &[1.0], &[1.0], &[1.0]])
        .dwell(20.0)
        .build();
    let err = merge_runs(&[a, b]).unwrap_err();
    assert!(matches!(err, BnmrError::Consistency(ref info) if info.code == "timing-mismatch"));
}

#[test]
fn mode_and_area_must_agree() {
    let slr_run = slr(40001, &[1.0], &[1.0]);
    let scan = RunBuilder::new(40002, "1f").build();
    let err = merge_runs(&[slr_run.clone(), scan]).unwrap_err();
    assert!(matches!(err, BnmrError::Consistency(ref info) if info.code == "mode-mismatch"));

    let bnqr = RunBuilder::new(40003, "20")
        .header(|h| h.area = bnmr_core::Area::Bnqr)
        .build();
    let err = merge_runs(&[slr_run, bnqr]).unwrap_err();
    assert!(matches!(err, BnmrError::Consistency(ref info) if info.code == "area-mismatch"));

    let err = merge_runs(&[]).unwrap_err();
    assert!(matches!(err, BnmrError::InvalidInput(ref info) if info.code == "no-runs"));
}

fn scan(run: u32, x: &[f64], forward: &[f64]) -> bnmr_core::RunRecord {
    let flat = vec![10.0; x.len()];
    RunBuilder::new(run, "1f")
        .hist("Frequency", x)
        .channels([forward, &flat, &flat, &flat])
        .build()
}

#[test]
fn scans_are_concatenated_in_run_order() {
    let a = scan(40002, &[300.0], &[40.0]);
    let b = scan(40001, &[100.0, 200.0], &[30.0, 10.0]);
    let merged = merge_runs(&[a, b]).unwrap();
    assert_eq!(merged.histogram("Frequency").unwrap().data(), &[100.0, 200.0, 300.0]);
    assert_eq!(merged.histogram("F+").unwrap().data(), &[30.0, 10.0, 40.0]);

    let result = asym(&merged, &AsymRequest::new("p")).unwrap().into_result().unwrap();
    assert_eq!(result.axis(), &[100.0, 200.0, 300.0]);
    assert_close(result.get("p").unwrap().value(), &[0.5, 0.0, 0.6], 1e-12);
}

#[test]
fn merged_and_joined_scans_agree() {
    let runs = vec![
        scan(40001, &[100.0, 200.0], &[30.0, 10.0]),
        scan(40002, &[100.0, 200.0], &[50.0, 20.0]),
    ];
    let merged = merge_runs(&runs).unwrap();
    let joined = JoinedRuns::new(runs).unwrap();
    let request = AsymRequest::default();
    assert_eq!(asym(&merged, &request).unwrap(), asym(&joined, &request).unwrap());
}

use bnmr_core::{
    lifetime, AcquisitionMode, Area, BnmrError, DataWarning, Histogram, InstrumentVar, Measured,
    RunData, RunHeader, RunId, RunRecord, VariableGroup,
};

fn fixture() -> RunRecord {
    RunRecord::from_json(include_str!("fixtures/slr_run.json")).expect("fixture decodes")
}

#[test]
fn fixture_sorts_variables_into_groups() {
    let record = fixture();
    assert_eq!(record.mode(), &AcquisitionMode::Slr);
    assert_eq!(record.area(), &Area::Bnmr);
    assert_eq!(record.run_number(), Some(40123));
    assert_eq!(record.year(), Some(2019));

    assert_eq!(record.ppg("dwelltime").map(InstrumentVar::mean), Some(10.0));
    assert_eq!(record.ppg("PREBEAM").map(InstrumentVar::mean), Some(2.0));
    assert_eq!(record.camp("b_field").map(InstrumentVar::units), Some("T"));
    assert_eq!(record.epics("target_bias").map(InstrumentVar::std), Some(3.0));
    assert!(record.ppg("b_field").is_none());
    assert_eq!(record.var("b_field").map(InstrumentVar::mean), Some(6.55));

    assert_eq!(
        record.keys(VariableGroup::Ppg),
        vec!["beam_off", "beam_on", "dwelltime", "prebeam"]
    );
    assert_eq!(record.variables().len(), 9);
}

#[test]
fn unknown_titles_are_kept_and_warned() {
    let record = fixture();
    assert_eq!(
        record.load_warnings(),
        &[DataWarning::UnknownVariableTitle {
            title: "/unlisted/thermometer".into(),
            description: "spare".into(),
            units: "K".into(),
        }]
    );
    assert!(record
        .variables()
        .iter()
        .any(|var| var.title() == "/unlisted/thermometer"));
}

#[test]
fn run_data_view_of_a_record() {
    let record = fixture();
    assert_eq!(record.id(), &RunId::Single { run: 40123, year: 2019 });
    assert_eq!(record.duration(), 600.0);
    assert_eq!(record.histogram_titles(), vec!["F+", "F-", "B+", "B-"]);
    assert_eq!(record.histogram("B-").map(Histogram::n_bins), Some(5));
    assert!(record.histogram("L+").is_none());

    let timing = record.timing().unwrap();
    assert_eq!(timing.dwelltime_ms, Some(10.0));
    assert_eq!(timing.prebeam, Some(2.0));
    assert_eq!(timing.beam_on, Some(3.0));
    assert_eq!(timing.beam_off, Some(0.0));
    assert_eq!(timing.hel_sleep_ms, None);
}

#[test]
fn derived_beam_quantities() {
    let record = fixture();
    assert!((record.beam_kev().unwrap() - 25.0).abs() < 1e-12);
    assert!((record.beam_kev_error().unwrap() - 0.005).abs() < 1e-12);
    assert!((record.pulse_s().unwrap() - 0.03).abs() < 1e-12);
}

#[test]
fn beam_energy_needs_a_known_area() {
    let header = RunHeader::new(1, 2020, AcquisitionMode::Slr, Area::parse("OTHER"));
    let vars = vec![
        InstrumentVar::new("ITE:BIAS:RDVOL", 1.0, 0.0),
        InstrumentVar::new("ILE2:BIAS15:RDVOL", 1.0, 0.0),
    ];
    let record = RunRecord::new(header, Vec::new(), vars);
    assert!(matches!(record.beam_kev(), Err(BnmrError::InvalidInput(_))));
}

#[test]
fn dates_render_in_utc() {
    let record = fixture();
    assert_eq!(record.header().start_date(), "Sat Jun  8 13:20:00 2019");
    assert_eq!(record.header().end_date(), "Sat Jun  8 13:30:00 2019");
}

#[test]
fn legacy_2003_runs_are_normalised() {
    let mut header = RunHeader::new(45100, 2003, AcquisitionMode::parse(""), Area::parse("ISAC"));
    header.method = "TI-bNMR".into();
    let histograms = vec![
        Histogram::new("FREQ", vec![1.0, 2.0]),
        Histogram::new("Bp", vec![3.0, 4.0]),
        Histogram::new("PolLm", vec![5.0, 6.0]),
    ];
    let record = RunRecord::new(header, histograms, Vec::new());

    assert_eq!(record.mode(), &AcquisitionMode::Frequency);
    assert_eq!(record.area(), &Area::Bnqr);
    assert_eq!(record.histogram_titles(), vec!["Frequency", "B+", "L-"]);

    let header = RunHeader::new(40001, 2003, AcquisitionMode::Slr, Area::parse("ISAC"));
    let record = RunRecord::new(header, Vec::new(), Vec::new());
    assert_eq!(record.area(), &Area::Bnmr);
    assert_eq!(record.mode(), &AcquisitionMode::Slr);
}

#[test]
fn record_json_round_trip_preserves_parts() {
    let record = fixture();
    let json = serde_json::to_string(&record).unwrap();
    let back = RunRecord::from_json(&json).unwrap();
    assert_eq!(back, record);
}

#[test]
fn malformed_json_is_a_config_error() {
    let err = RunRecord::from_json("{\"header\": 3}").unwrap_err();
    assert!(matches!(err, BnmrError::Config(_)));
}

#[test]
fn lifetime_table_lookup() {
    let li8 = lifetime("li8").unwrap();
    assert_eq!(li8.seconds, 1.2096);
    assert_eq!(li8.error, Some(0.0005));
    assert_eq!(lifetime("Ac232").unwrap().error, None);
    assert!(lifetime("U238").is_none());
}

#[test]
fn measured_rejects_mismatched_lengths() {
    assert!(Measured::try_new(vec![1.0, 2.0], vec![0.1]).is_err());
    let series: Measured = vec![(1.0, 0.1), (2.0, 0.2)].into_iter().collect();
    assert_eq!(series.value(), &[1.0, 2.0]);
    assert_eq!(series.error(), &[0.1, 0.2]);
}

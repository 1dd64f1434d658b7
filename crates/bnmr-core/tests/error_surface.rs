use bnmr_core::errors::{BnmrError, ErrorInfo};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("run", "2019.40123")
        .with_context("reason", "example")
}

#[test]
fn invalid_input_surface() {
    let err = BnmrError::InvalidInput(sample_info("option", "unknown option 'zz'"));
    assert_eq!(err.info().code, "option");
    assert!(err.info().context.contains_key("run"));
}

#[test]
fn data_surface() {
    let err = BnmrError::Data(sample_info("missing-ppg", "freq_start not logged"));
    assert_eq!(err.info().code, "missing-ppg");
    assert!(err.info().context.contains_key("reason"));
}

#[test]
fn consistency_surface() {
    let err = BnmrError::consistency("mode-mismatch", "runs disagree on mode");
    assert_eq!(err.info().code, "mode-mismatch");
    assert!(err.info().context.is_empty());
}

#[test]
fn display_includes_context_and_hint() {
    let err = BnmrError::Config(
        sample_info("yaml", "bad request").with_hint("check the option field"),
    );
    let rendered = err.to_string();
    assert!(rendered.starts_with("config error: bad request (code: yaml)"));
    assert!(rendered.contains("run=2019.40123"));
    assert!(rendered.ends_with("hint: check the option field"));
}

#[test]
fn map_info_keeps_family() {
    let err = BnmrError::data("short", "histogram too short")
        .map_info(|info| info.with_context("bins", "3"));
    assert!(matches!(err, BnmrError::Data(_)));
    assert_eq!(err.info().context.get("bins").map(String::as_str), Some("3"));
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = BnmrError::invalid_input("rebin", "rebin must be positive");
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["family"], "InvalidInput");
    assert_eq!(json["detail"]["code"], "rebin");
    let back: BnmrError = serde_json::from_value(json).unwrap();
    assert_eq!(back, err);
}

use bench_prep::error::PrepError;
use bench_prep::table::Table;
use polars::prelude::PolarsError;
use series_math::MathError;
use std::io;

#[test]
fn test_error_conversion() {
    // Test IO error conversion
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let prep_error = PrepError::from(io_error);
    assert!(matches!(prep_error, PrepError::IoError(_)));

    // Math errors become data errors
    let prep_error = PrepError::from(MathError::InsufficientData("empty".to_string()));
    match prep_error {
        PrepError::DataError(msg) => assert!(msg.contains("empty")),
        other => panic!("Expected DataError variant, got {:?}", other),
    }

    // TOML errors become configuration errors
    let toml_error = toml::from_str::<toml::Value>("a = ").unwrap_err();
    assert!(matches!(
        PrepError::from(toml_error),
        PrepError::ConfigError(_)
    ));
}

#[test]
fn test_polars_error_conversion() {
    let err = PrepError::from(PolarsError::ColumnNotFound("dt".into()));
    match err {
        PrepError::PolarsError(msg) => assert!(msg.contains("dt")),
        other => panic!("Expected PolarsError variant, got {:?}", other),
    }

    // Duplicate column names are rejected by the frame itself
    let err = Table::from_strs(&["a", "a"], &[vec!["1", "2"]]).unwrap_err();
    assert!(matches!(err, PrepError::PolarsError(_)));
    assert!(err.to_string().starts_with("Polars error"));
}

#[test]
fn test_error_display() {
    let error = PrepError::schema("m4", "expected exactly one target field, found 0");
    let error_string = format!("{}", error);
    assert!(error_string.contains("m4"));
    assert!(error_string.contains("exactly one target"));

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let error_string = format!("{}", PrepError::from(io_error));
    assert!(error_string.contains("IO error"));
    assert!(error_string.contains("permission denied"));
}

#[test]
fn test_located_fills_missing_context() {
    let error = PrepError::scaling("s1", "zero variance").located("m4_fcst_len_10_fold_2", "ignored");

    if let PrepError::ScalingError {
        dataset,
        series,
        message,
    } = error
    {
        assert_eq!(dataset, "m4_fcst_len_10_fold_2");
        // Series set at construction wins
        assert_eq!(series, "s1");
        assert_eq!(message, "zero variance");
    } else {
        panic!("Wrong error variant");
    }
}

#[test]
fn test_insufficient_data_message() {
    let error = PrepError::InsufficientData {
        dataset: String::new(),
        series: String::new(),
        length: 12,
        train_end: -3,
        forecast_length: 5,
    }
    .located("tiny_fcst_len_5_fold_1", "s9");

    let message = error.to_string();
    assert!(message.contains("tiny_fcst_len_5_fold_1"));
    assert!(message.contains("s9"));
    assert!(message.contains("-3"));
}

#[test]
fn test_located_leaves_other_variants() {
    let error = PrepError::DataError("bad".to_string()).located("d", "s");
    assert!(matches!(error, PrepError::DataError(ref m) if m == "bad"));
}

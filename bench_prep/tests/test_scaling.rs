use approx::assert_abs_diff_eq;
use bench_prep::error::PrepError;
use bench_prep::scaling::{format_value, PerSeriesScaler, ZeroVariancePolicy};
use rstest::rstest;

fn observed(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

#[test]
fn test_fit_ignores_test_window() {
    let scaler = PerSeriesScaler::default();
    let train = observed(&[3.0, 5.0, 7.0, 9.0]);

    let base = scaler.scale("s", &train, &observed(&[11.0, 13.0])).unwrap();
    let perturbed = scaler
        .scale("s", &train, &observed(&[1e6, -42.0]))
        .unwrap();

    assert_eq!(base.scaler, perturbed.scaler);
    assert_eq!(base.train, perturbed.train);
    assert_abs_diff_eq!(base.scaler.mean(), 6.0, epsilon = 1e-12);
}

#[test]
fn test_population_standard_deviation() {
    let scaler = PerSeriesScaler::default();
    let out = scaler
        .scale("s", &observed(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), &[])
        .unwrap();
    assert_abs_diff_eq!(out.scaler.mean(), 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(out.scaler.scale(), 2.0, epsilon = 1e-12);
    assert_eq!(out.train[0], Some(-1.5));
}

#[test]
fn test_values_rounded_to_five_places() {
    let scaler = PerSeriesScaler::default();
    let out = scaler
        .scale("s", &observed(&[0.0, 1.0, 2.0]), &observed(&[0.5]))
        .unwrap();
    // std = sqrt(2/3)
    let expected = (0.5f64 - 1.0) / (2.0f64 / 3.0).sqrt();
    let rounded = out.test[0].unwrap();
    assert_abs_diff_eq!(rounded, expected, epsilon = 5e-6);
    assert_eq!(rounded, (rounded * 1e5).round() / 1e5);
}

#[rstest]
#[case(vec![4.0, 4.0, 4.0])]
#[case(vec![-1.5])]
fn test_zero_variance_fails_by_default(#[case] train: Vec<f64>) {
    let err = PerSeriesScaler::default()
        .scale("flat", &observed(&train), &observed(&[4.0]))
        .unwrap_err();
    match err {
        PrepError::ScalingError { series, .. } => assert_eq!(series, "flat"),
        other => panic!("Expected ScalingError, got {:?}", other),
    }
}

#[test]
fn test_zero_variance_center_policy() {
    let scaler = PerSeriesScaler::new(ZeroVariancePolicy::Center);
    let out = scaler
        .scale("flat", &observed(&[4.0, 4.0, 4.0]), &observed(&[5.5, 4.0]))
        .unwrap();

    assert!(out.centered_only);
    assert_eq!(out.train, vec![Some(0.0); 3]);
    assert_eq!(out.test, vec![Some(1.5), Some(0.0)]);
    assert!(out.test.iter().flatten().all(|v| v.is_finite()));
}

#[test]
fn test_empty_train_window_rejected() {
    let scaler = PerSeriesScaler::new(ZeroVariancePolicy::Center);
    assert!(matches!(
        scaler.scale("s", &[], &observed(&[1.0])),
        Err(PrepError::ScalingError { .. })
    ));
    assert!(matches!(
        scaler.scale("s", &[None, None], &observed(&[1.0])),
        Err(PrepError::ScalingError { .. })
    ));
}

#[rstest]
#[case(Some(0.00001), "0.00001")]
#[case(Some(-0.00004), "-0.00004")]
#[case(Some(0.0001), "0.0001")]
#[case(Some(-2.0), "-2.0")]
#[case(Some(0.0), "0.0")]
#[case(Some(12345.6789), "12345.6789")]
#[case(None, "")]
fn test_small_values_written_without_exponent(#[case] value: Option<f64>, #[case] expected: &str) {
    assert_eq!(format_value(value), expected);
}

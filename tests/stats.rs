use approx::assert_relative_eq;
use kira_neuroqc::math::stats::{describe, mean, quantile_sorted, sample_std};

#[test]
fn describe_matches_linear_quartiles() {
    let d = describe(&[4.0, 1.0, 3.0, 2.0, 5.0]);
    assert_eq!(d.count, 5);
    assert_relative_eq!(d.mean, 3.0);
    assert_relative_eq!(d.std, 2.5f64.sqrt(), epsilon = 1e-12);
    assert_eq!(d.min, 1.0);
    assert_eq!(d.q25, 2.0);
    assert_eq!(d.median, 3.0);
    assert_eq!(d.q75, 4.0);
    assert_eq!(d.max, 5.0);
}

#[test]
fn describe_skips_missing_values() {
    let d = describe(&[1.0, f64::NAN, 3.0]);
    assert_eq!(d.count, 2);
    assert_relative_eq!(d.mean, 2.0);
    assert_eq!(d.min, 1.0);
    assert_eq!(d.max, 3.0);
}

#[test]
fn describe_all_missing_is_nan() {
    let d = describe(&[f64::NAN, f64::NAN]);
    assert_eq!(d.count, 0);
    assert!(d.mean.is_nan());
    assert!(d.q75.is_nan());
}

#[test]
fn sample_std_needs_two_values() {
    assert!(sample_std(&[1.0]).is_nan());
    assert_relative_eq!(sample_std(&[1.0, 3.0]), 2.0f64.sqrt());
    assert!(mean(&[]).is_nan());
}

#[test]
fn quantile_interpolates_between_ranks() {
    let v = [10.0, 20.0, 30.0, 40.0];
    assert_relative_eq!(quantile_sorted(&v, 0.25), 17.5);
    assert_relative_eq!(quantile_sorted(&v, 0.5), 25.0);
    assert_relative_eq!(quantile_sorted(&v, 1.0), 40.0);
}

use approx::assert_abs_diff_eq;
use kira_neuroqc::atlas::{
    Atlas, AtlasKind, RoiOutcome, RoiTimeSeries, extract_roi_timeseries, parse_labels, reduce,
};
use kira_neuroqc::math::affine::Affine;
use kira_neuroqc::signal::ConditionedScan;
use ndarray::{Array2, Array3};
use tempfile::TempDir;

/// 2x2x1 grid, all voxels in mask, 6 volumes.
fn scan() -> ConditionedScan {
    let voxels = vec![[0, 0, 0], [1, 0, 0], [0, 1, 0], [1, 1, 0]];
    let rows: [[f64; 6]; 4] = [
        [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        [3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        [6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
        [0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
    ];
    let mut signals = Array2::<f64>::zeros((4, 6));
    for (r, row) in rows.iter().enumerate() {
        for (t, v) in row.iter().enumerate() {
            signals[[r, t]] = *v;
        }
    }
    ConditionedScan {
        shape: [2, 2, 1],
        affine: Affine::identity(),
        tr: 2.0,
        voxels,
        signals,
    }
}

fn atlas(values: Vec<i32>, labels: &[&str], grid: Array3<i32>) -> Atlas {
    Atlas {
        kind: AtlasKind::Aal,
        values,
        labels: labels.iter().map(|s| s.to_string()).collect(),
        grid,
        affine: Affine::identity(),
    }
}

/// 4x1x1 line of voxels at 2 mm: two rising ramps then two falling ramps.
fn line_scan_2mm() -> ConditionedScan {
    let mut signals = Array2::<f64>::zeros((4, 6));
    for t in 0..6 {
        signals[[0, t]] = t as f64;
        signals[[1, t]] = t as f64 + 2.0;
        signals[[2, t]] = 6.0 - t as f64;
        signals[[3, t]] = 9.0 - t as f64;
    }
    ConditionedScan {
        shape: [4, 1, 1],
        affine: Affine::scaled([2.0, 2.0, 2.0], [0.0, 0.0, 0.0]),
        tr: 2.0,
        voxels: vec![[0, 0, 0], [1, 0, 0], [2, 0, 0], [3, 0, 0]],
        signals,
    }
}

#[test]
fn parses_indexed_and_bare_labels() {
    let (values, labels) = parse_labels("0\tBackground\n3\tC\n1\tA\n", "labels.txt").unwrap();
    assert_eq!(values, vec![1, 3]);
    assert_eq!(labels, vec!["A", "C"]);

    let (values, labels) = parse_labels("# comment\nPrecentral_L\nPrecentral_R\n", "l").unwrap();
    assert_eq!(values, vec![1, 2]);
    assert_eq!(labels, vec!["Precentral_L", "Precentral_R"]);
}

#[test]
fn rejects_duplicate_or_empty_labels() {
    assert!(parse_labels("1\tA\n1\tB\n", "l").is_err());
    assert!(parse_labels("\n\n", "l").is_err());
    assert!(parse_labels("x\tA\n", "l").is_err());
}

#[test]
fn reduces_to_one_standardized_column_per_region() {
    let mut grid = Array3::<i32>::zeros((2, 2, 1));
    grid[[0, 0, 0]] = 1;
    grid[[1, 0, 0]] = 1;
    grid[[0, 1, 0]] = 2;
    let atlas = atlas(vec![1, 2, 5], &["left", "right", "empty"], grid);

    let (ts, warnings) = reduce(&scan(), &atlas).unwrap();
    assert_eq!(ts.data().dim(), (6, 3));
    assert_eq!(ts.n_regions(), ts.labels().len());
    assert_eq!(ts.n_timepoints(), 6);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("empty"));

    let left = ts.data().column(0);
    let right = ts.data().column(1);
    assert_abs_diff_eq!(left.sum(), 0.0, epsilon = 1e-12);
    // Region 1 averages two rising ramps; region 2 is a falling ramp.
    for (l, r) in left.iter().zip(right.iter()) {
        assert_abs_diff_eq!(*l, -*r, epsilon = 1e-12);
    }
    assert!(ts.data().column(2).iter().all(|v| *v == 0.0));
}

#[test]
fn finer_atlas_is_resampled_onto_scan_grid() {
    // 8x2x2 at 1 mm over the same field of view; label 1 on the lower half of x.
    let grid = Array3::from_shape_fn((8, 2, 2), |(i, _, _)| if i < 4 { 1 } else { 2 });
    let mut fine = atlas(vec![1, 2], &["low", "high"], grid);
    fine.affine = Affine::scaled([1.0, 1.0, 1.0], [-0.5, -0.5, -0.5]);

    let (ts, warnings) = reduce(&line_scan_2mm(), &fine).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(ts.data().dim(), (6, 2));
    for (l, r) in ts.data().column(0).iter().zip(ts.data().column(1).iter()) {
        assert_abs_diff_eq!(*l, -*r, epsilon = 1e-12);
    }
    assert!(ts.data()[[5, 0]] > ts.data()[[0, 0]]);
}

#[test]
fn same_shape_atlas_with_shifted_origin_is_realigned() {
    let mut grid = Array3::<i32>::zeros((2, 2, 1));
    grid[[0, 0, 0]] = 1;
    grid[[1, 0, 0]] = 1;
    grid[[0, 1, 0]] = 2;
    grid[[1, 1, 0]] = 2;
    let mut shifted = atlas(vec![1, 2], &["a", "b"], grid);
    // Atlas voxel 0 sits over scan voxel x=1; scan column x=0 is unlabelled.
    shifted.affine = Affine::scaled([1.0, 1.0, 1.0], [1.0, 0.0, 0.0]);

    let (ts, warnings) = reduce(&scan(), &shifted).unwrap();
    assert!(warnings.is_empty());
    // Region "b" is only scan voxel [1, 1, 0], the 0/1 square wave.
    let b = ts.data().column(1).to_vec();
    for pair in b.windows(2) {
        assert!(pair[0] * pair[1] < 0.0);
    }
}

#[test]
fn atlas_outside_the_scan_is_an_error() {
    let mut far = atlas(vec![1], &["a"], Array3::<i32>::ones((3, 3, 3)));
    far.affine = Affine::scaled([1.0, 1.0, 1.0], [100.0, 100.0, 100.0]);
    let err = reduce(&scan(), &far).unwrap_err();
    assert!(format!("{err:#}").contains("aal atlas does not overlap"));
}

#[test]
fn coarser_atlas_on_identity_grid_still_reduces() {
    let (ts, _) = reduce(&scan(), &atlas(vec![1], &["all"], Array3::<i32>::ones((3, 3, 3)))).unwrap();
    assert_eq!(ts.data().dim(), (6, 1));
}

#[test]
fn unknown_atlas_is_unsupported() {
    let tmp = TempDir::new().unwrap();
    let (outcome, warnings) = extract_roi_timeseries(&scan(), "unknown_atlas", tmp.path());
    assert!(matches!(outcome, RoiOutcome::Unsupported { ref atlas } if atlas == "unknown_atlas"));
    assert!(outcome.timeseries().is_none());
    assert!(warnings[0].contains("not implemented"));
}

#[test]
fn missing_atlas_files_fail_without_panicking() {
    let tmp = TempDir::new().unwrap();
    let (outcome, warnings) = extract_roi_timeseries(&scan(), "harvard_oxford", tmp.path());
    assert!(matches!(outcome, RoiOutcome::Failed { .. }));
    assert_eq!(warnings.len(), 1);
}

#[test]
fn atlas_names_are_case_insensitive() {
    assert_eq!(AtlasKind::parse("AAL"), Some(AtlasKind::Aal));
    assert_eq!(AtlasKind::parse("harvard-oxford"), Some(AtlasKind::HarvardOxford));
    assert_eq!(AtlasKind::parse("schaefer"), None);
}

#[test]
fn timeseries_rejects_label_count_mismatch() {
    assert!(RoiTimeSeries::new(Array2::zeros((4, 2)), vec!["a".to_string()]).is_err());
}

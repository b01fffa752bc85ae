use std::path::PathBuf;

use kira_neuroqc::config::MaskParams;
use kira_neuroqc::io::nifti::Volume;
use kira_neuroqc::math::affine::Affine;
use kira_neuroqc::signal::mask::{derive_epi_mask, gap_threshold, largest_component};
use kira_neuroqc::signal::{BoldImage, MaskSource, resolve_mask};
use ndarray::{Array3, Array4};

/// 8x8x8 volume: a bright 6x6x6 cube, a single bright voxel far from it, dim background.
fn phantom() -> Array4<f32> {
    let mut data = Array4::<f32>::from_elem((8, 8, 8, 5), 10.0);
    for i in 1..7 {
        for j in 1..7 {
            for k in 1..7 {
                for t in 0..5 {
                    data[[i, j, k, t]] = 1000.0 + t as f32;
                }
            }
        }
    }
    for t in 0..5 {
        data[[7, 7, 7, t]] = 1000.0;
    }
    data
}

fn bold_2mm() -> BoldImage {
    BoldImage {
        path: PathBuf::from("bold.nii.gz"),
        data: phantom(),
        tr: 2.0,
        affine: Affine::scaled([2.0, 2.0, 2.0], [0.0, 0.0, 0.0]),
    }
}

fn no_opening() -> MaskParams {
    MaskParams {
        opening: 0,
        ..MaskParams::default()
    }
}

#[test]
fn gap_threshold_splits_at_widest_gap() {
    let sorted = [1.0f32, 1.1, 1.2, 1.3, 9.0, 9.1, 9.2, 9.3, 9.4, 9.5];
    let t = gap_threshold(&sorted, 0.2, 0.85);
    assert!(t > 1.3 && t < 9.0);
}

#[test]
fn derived_mask_keeps_largest_bright_component() {
    let mask = derive_epi_mask(&phantom(), &no_opening()).unwrap();
    assert_eq!(mask.iter().filter(|&&v| v).count(), 216);
    assert!(mask[[3, 3, 3]]);
    assert!(!mask[[7, 7, 7]]);
    assert!(!mask[[0, 0, 0]]);
}

#[test]
fn derived_mask_without_component_filter_keeps_islands() {
    let params = MaskParams {
        largest_component: false,
        ..no_opening()
    };
    let mask = derive_epi_mask(&phantom(), &params).unwrap();
    assert_eq!(mask.iter().filter(|&&v| v).count(), 217);
}

#[test]
fn default_opening_trims_the_cube_and_drops_islands() {
    let data = phantom();
    let mask = derive_epi_mask(&data, &MaskParams::default()).unwrap();
    assert_eq!(mask.iter().filter(|&&v| v).count(), 56);
    assert!(mask[[3, 3, 3]] && mask[[4, 4, 4]]);
    assert!(!mask[[7, 7, 7]]);
    assert!(!mask[[1, 1, 1]]);
    // Never reaches outside the bright cube.
    for ((i, j, k), &inside) in mask.indexed_iter() {
        if inside {
            assert!(data[[i, j, k, 0]] > 100.0);
        }
    }
}

#[test]
fn opening_cuts_thin_bridges() {
    // 5x5x5 bright block at x=0..5 with a one-voxel-thick bridge out to x=11.
    let mut data = Array4::<f32>::from_elem((12, 5, 5, 3), 10.0);
    for ((i, j, k, _), v) in data.indexed_iter_mut() {
        if i < 5 || (j == 2 && k == 2) {
            *v = 1000.0;
        }
    }

    let kept = derive_epi_mask(&data, &no_opening()).unwrap();
    assert!(kept[[8, 2, 2]] && kept[[11, 2, 2]]);

    let params = MaskParams {
        opening: 1,
        ..MaskParams::default()
    };
    let opened = derive_epi_mask(&data, &params).unwrap();
    assert!(opened[[2, 2, 2]]);
    for i in 6..12 {
        assert!(!opened[[i, 2, 2]], "bridge voxel x={i} survived");
    }
}

#[test]
fn largest_component_uses_face_connectivity() {
    let mut mask = Array3::from_elem((3, 3, 3), false);
    mask[[0, 0, 0]] = true;
    mask[[1, 1, 1]] = true;
    mask[[1, 1, 2]] = true;
    let kept = largest_component(&mask);
    assert!(!kept[[0, 0, 0]]);
    assert!(kept[[1, 1, 1]] && kept[[1, 1, 2]]);
}

#[test]
fn absent_mask_is_derived_from_data() {
    let (mask, source, warnings) = resolve_mask(&bold_2mm(), None, &MaskParams::default()).unwrap();
    assert_eq!(source, MaskSource::Derived);
    assert_eq!(mask.dim(), (8, 8, 8));
    assert!(mask[[3, 3, 3]]);
    assert!(warnings.is_empty());
}

#[test]
fn coarser_mask_is_resampled_onto_bold_grid() {
    // 4x4x4 at 4 mm covers the 8x8x8 2 mm grid up to world 14 mm (index 6).
    let coarse = Volume {
        data: Array3::from_elem((4, 4, 4), true),
        affine: Affine::scaled([4.0, 4.0, 4.0], [0.0, 0.0, 0.0]),
    };
    let (mask, source, warnings) = resolve_mask(
        &bold_2mm(),
        Some((PathBuf::from("mask.nii.gz"), coarse)),
        &MaskParams::default(),
    )
    .unwrap();
    assert_eq!(source, MaskSource::Provided(PathBuf::from("mask.nii.gz")));
    assert_eq!(mask.dim(), (8, 8, 8));
    assert!(mask[[0, 0, 0]] && mask[[6, 6, 6]]);
    assert!(!mask[[7, 0, 0]]);
    assert_eq!(mask.iter().filter(|&&v| v).count(), 7 * 7 * 7);
    assert!(warnings.is_empty());
}

#[test]
fn shifted_mask_on_same_shape_is_realigned() {
    // Same 8x8x8 shape, but voxel 0 of the mask sits at world x = 4 mm.
    let mut data = Array3::from_elem((8, 8, 8), false);
    data[[0, 0, 0]] = true;
    let shifted = Volume {
        data,
        affine: Affine::scaled([2.0, 2.0, 2.0], [4.0, 0.0, 0.0]),
    };
    let (mask, source, _) = resolve_mask(
        &bold_2mm(),
        Some((PathBuf::from("mask.nii.gz"), shifted)),
        &MaskParams::default(),
    )
    .unwrap();
    assert!(matches!(source, MaskSource::Provided(_)));
    assert!(mask[[2, 0, 0]]);
    assert_eq!(mask.iter().filter(|&&v| v).count(), 1);
}

#[test]
fn disjoint_mask_falls_back_to_derived() {
    let far = Volume {
        data: Array3::from_elem((4, 4, 4), true),
        affine: Affine::scaled([2.0, 2.0, 2.0], [500.0, 500.0, 500.0]),
    };
    let (mask, source, warnings) = resolve_mask(
        &bold_2mm(),
        Some((PathBuf::from("mask.nii.gz"), far)),
        &MaskParams::default(),
    )
    .unwrap();
    assert_eq!(source, MaskSource::Derived);
    assert_eq!(mask.dim(), (8, 8, 8));
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("does not overlap"));
}

#[test]
fn matching_mask_is_used_as_is() {
    let provided = Volume {
        data: Array3::from_elem((8, 8, 8), true),
        affine: Affine::scaled([2.0, 2.0, 2.0], [0.0, 0.0, 0.0]),
    };
    let (mask, source, warnings) = resolve_mask(
        &bold_2mm(),
        Some((PathBuf::from("mask.nii.gz"), provided)),
        &MaskParams::default(),
    )
    .unwrap();
    assert_eq!(source, MaskSource::Provided(PathBuf::from("mask.nii.gz")));
    assert!(mask.iter().all(|&v| v));
    assert!(warnings.is_empty());
}

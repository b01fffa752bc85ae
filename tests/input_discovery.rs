use std::fs;
use std::path::Path;

use kira_neuroqc::error::NeuroQcError;
use kira_neuroqc::input::{discover_qc_files, func_dir, locate_subject};
use kira_neuroqc::qc::Modality;
use tempfile::TempDir;

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "x").unwrap();
}

#[test]
fn locates_bold_confounds_and_mask() {
    let tmp = TempDir::new().unwrap();
    let dir = func_dir(tmp.path(), "sub-01", "ses-01");
    touch(&dir.join("sub-01_ses-01_task-rest_space-MNI152NLin2009cAsym_desc-preproc_bold.nii.gz"));
    touch(&dir.join("sub-01_ses-01_task-rest_desc-confounds_timeseries.tsv"));
    touch(&dir.join("sub-01_ses-01_task-rest_space-MNI152NLin2009cAsym_desc-brain_mask.nii.gz"));
    touch(&dir.join("sub-01_ses-01_task-rest_space-T1w_desc-preproc_bold.nii.gz"));

    let set = locate_subject(tmp.path(), "sub-01", "ses-01").unwrap();
    assert!(set.bold.to_string_lossy().contains("space-MNI152"));
    assert!(set.confounds.ends_with("sub-01_ses-01_task-rest_desc-confounds_timeseries.tsv"));
    assert!(set.mask.is_some());
    assert_eq!(set.func_dir, dir);
}

#[test]
fn first_sorted_match_wins() {
    let tmp = TempDir::new().unwrap();
    let dir = func_dir(tmp.path(), "sub-01", "ses-01");
    touch(&dir.join("sub-01_task-rest_run-2_space-MNI_desc-preproc_bold.nii.gz"));
    touch(&dir.join("sub-01_task-rest_run-1_space-MNI_desc-preproc_bold.nii.gz"));
    touch(&dir.join("sub-01_task-rest_run-1_desc-confounds_timeseries.tsv"));

    let set = locate_subject(tmp.path(), "sub-01", "ses-01").unwrap();
    assert!(set.bold.to_string_lossy().contains("run-1"));
    assert!(set.mask.is_none());
}

#[test]
fn missing_bold_is_missing_input() {
    let tmp = TempDir::new().unwrap();
    let dir = func_dir(tmp.path(), "sub-02", "ses-01");
    touch(&dir.join("sub-02_desc-confounds_timeseries.tsv"));

    let err = locate_subject(tmp.path(), "sub-02", "ses-01").unwrap_err();
    match err {
        NeuroQcError::MissingInput { role, searched } => {
            assert!(role.contains("BOLD"));
            assert_eq!(searched, dir);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_confounds_is_missing_input() {
    let tmp = TempDir::new().unwrap();
    let dir = func_dir(tmp.path(), "sub-01", "ses-01");
    touch(&dir.join("sub-01_space-MNI_desc-preproc_bold.nii"));

    let err = locate_subject(tmp.path(), "sub-01", "ses-01").unwrap_err();
    assert!(matches!(
        err,
        NeuroQcError::MissingInput { role: "confounds file", .. }
    ));
}

#[test]
fn discovers_mriqc_files_per_modality() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    touch(&root.join("sub-01/ses-01/func/sub-01_ses-01_task-rest_bold.json"));
    touch(&root.join("sub-02/func/sub-02_task-rest_bold.json"));
    touch(&root.join("sub-01/ses-01/anat/sub-01_ses-01_T1w.json"));
    touch(&root.join("group_bold.tsv"));

    let bold = discover_qc_files(root, Modality::Bold).unwrap();
    assert_eq!(bold.len(), 2);
    assert!(bold[0] < bold[1]);
    let t1w = discover_qc_files(root, Modality::T1w).unwrap();
    assert_eq!(t1w.len(), 1);
}

#[test]
fn discovery_in_missing_dir_is_empty() {
    let tmp = TempDir::new().unwrap();
    let files = discover_qc_files(&tmp.path().join("mriqc"), Modality::Bold).unwrap();
    assert!(files.is_empty());
}

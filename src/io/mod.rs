use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Result;
use flate2::read::GzDecoder;

pub mod artifacts;
pub mod confounds_tsv;
pub mod mriqc_json;
pub mod nifti;
pub mod qc_csv;
pub mod summary;

pub(crate) fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)?;
    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let decoder = GzDecoder::new(file);
        Ok(Box::new(decoder))
    } else {
        Ok(Box::new(file))
    }
}

/// CSV cell for a metric; missing values are left empty.
pub(crate) fn format_value(v: f64) -> String {
    if v.is_nan() { String::new() } else { v.to_string() }
}

use std::path::Path;

use anyhow::{Context, Result};

use crate::io::format_value;
use crate::qc::exclusion::ExclusionEntry;
use crate::qc::{QcRecord, QcTable};

/// Full per-scan table: identifier columns, then every metric.
pub fn write_qc_table<R: QcRecord>(path: &Path, table: &QcTable<R>) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let header: Vec<&str> = R::ID_COLUMNS.iter().chain(R::METRICS).copied().collect();
    w.write_record(&header)?;
    for record in &table.records {
        let mut row: Vec<String> = record.id_values().into_iter().map(str::to_string).collect();
        row.extend(record.metric_values().into_iter().map(format_value));
        w.write_record(&row)?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_exclusions(path: &Path, entries: &[ExclusionEntry]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for entry in entries {
        w.serialize(entry)?;
    }
    w.flush()?;
    Ok(())
}

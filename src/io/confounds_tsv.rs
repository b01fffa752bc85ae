use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::confounds::ConfoundTable;
use crate::io::open_maybe_gz;

pub fn read_confounds(path: &Path) -> Result<ConfoundTable> {
    let mut content = String::new();
    open_maybe_gz(path)
        .with_context(|| format!("failed to open confounds {}", path.display()))?
        .read_to_string(&mut content)
        .with_context(|| format!("failed to read confounds {}", path.display()))?;
    parse_confounds_tsv(&content, &path.display().to_string())
}

/// Header row of names, then one numeric row per volume. `n/a`, `nan` and
/// empty cells are kept as NaN.
pub fn parse_confounds_tsv(content: &str, source: &str) -> Result<ConfoundTable> {
    let mut lines = content.lines().enumerate();
    let names: Vec<String> = match lines.next() {
        Some((_, header)) if !header.trim().is_empty() => header
            .trim_end_matches('\r')
            .split('\t')
            .map(|s| s.trim().to_string())
            .collect(),
        _ => bail!("{}: missing header row", source),
    };

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    let mut n_rows = 0usize;
    for (idx, line) in lines {
        let line_no = idx + 1;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() != names.len() {
            bail!(
                "{}:{} expected {} columns, found {}",
                source,
                line_no,
                names.len(),
                parts.len()
            );
        }
        for (col, raw) in columns.iter_mut().zip(parts) {
            col.push(parse_cell(raw).with_context(|| format!("{}:{}", source, line_no))?);
        }
        n_rows += 1;
    }

    Ok(ConfoundTable {
        names,
        columns,
        n_rows,
    })
}

fn parse_cell(raw: &str) -> Result<f64> {
    let t = raw.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("n/a") || t.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    t.parse::<f64>()
        .with_context(|| format!("non-numeric confound value '{}'", t))
}

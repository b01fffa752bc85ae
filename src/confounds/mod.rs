//! Nuisance regressor selection.

use ndarray::Array2;

/// Confound table as read from fMRIPrep: one column per signal, one row per volume.
/// Missing cells are held as NaN until selection.
#[derive(Debug, Clone)]
pub struct ConfoundTable {
    pub names: Vec<String>,
    pub columns: Vec<Vec<f64>>,
    pub n_rows: usize,
}

impl ConfoundTable {
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }
}

#[derive(Debug, Clone)]
pub enum ConfoundSelection {
    /// `matrix` is time x confound, columns in `names` order, no NaN cells.
    Selected { names: Vec<String>, matrix: Array2<f64> },
    /// Nothing requested was present; regression is skipped.
    NoConfounds,
}

impl ConfoundSelection {
    pub fn names(&self) -> &[String] {
        match self {
            Self::Selected { names, .. } => names,
            Self::NoConfounds => &[],
        }
    }

    pub fn matrix(&self) -> Option<&Array2<f64>> {
        match self {
            Self::Selected { matrix, .. } => Some(matrix),
            Self::NoConfounds => None,
        }
    }
}

/// Keeps the requested columns that exist, in request order, zero-filling gaps
/// (the first framewise displacement sample is undefined by construction).
pub fn select_confounds<S: AsRef<str>>(table: &ConfoundTable, requested: &[S]) -> ConfoundSelection {
    let mut names: Vec<String> = Vec::new();
    for req in requested {
        let req = req.as_ref();
        if table.column(req).is_some() && !names.iter().any(|n| n == req) {
            names.push(req.to_string());
        }
    }
    if names.is_empty() {
        return ConfoundSelection::NoConfounds;
    }

    let mut matrix = Array2::<f64>::zeros((table.n_rows, names.len()));
    for (j, name) in names.iter().enumerate() {
        if let Some(col) = table.column(name) {
            for (i, &v) in col.iter().enumerate().take(table.n_rows) {
                matrix[[i, j]] = if v.is_nan() { 0.0 } else { v };
            }
        }
    }

    ConfoundSelection::Selected { names, matrix }
}

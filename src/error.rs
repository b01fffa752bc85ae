//! Typed failure taxonomy shared by both pipelines.
//!
//! Fatal variants travel inside `anyhow::Error` so `main` can downcast them to
//! pick a remediation hint. Recoverable situations are modelled as explicit
//! outcome enums in the owning module instead of errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NeuroQcError {
    /// A mandatory input has no matching file.
    #[error("no {role} found in {}", searched.display())]
    MissingInput { role: &'static str, searched: PathBuf },

    /// An optional input is absent; callers fall back (derive mask, skip regression).
    #[error("no {role} found in {} (falling back)", searched.display())]
    MissingOptionalInput { role: &'static str, searched: PathBuf },

    #[error("{option} '{value}' not implemented")]
    UnsupportedOption { option: &'static str, value: String },

    /// Failure inside a delegated numerical or image routine.
    #[error("{operation} failed: {reason}")]
    Upstream {
        operation: &'static str,
        reason: String,
    },
}

impl NeuroQcError {
    pub fn upstream(operation: &'static str, reason: impl ToString) -> Self {
        Self::Upstream {
            operation,
            reason: reason.to_string(),
        }
    }
}

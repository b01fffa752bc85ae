use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::io::open_maybe_gz;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BidsMeta {
    #[serde(default)]
    pub subject_id: Option<Value>,
    #[serde(default)]
    pub session_id: Option<Value>,
    #[serde(default)]
    pub task_id: Option<Value>,
}

/// One MRIQC image-quality-metrics document. Only `bids_meta` is typed; the
/// metric keys stay in `fields` until a modality record picks what it needs.
#[derive(Debug, Clone, Deserialize)]
pub struct MriqcDocument {
    #[serde(default)]
    pub bids_meta: BidsMeta,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl MriqcDocument {
    pub fn subject_id(&self) -> String {
        id_string(self.bids_meta.subject_id.as_ref())
    }

    pub fn session_id(&self) -> String {
        id_string(self.bids_meta.session_id.as_ref())
    }

    pub fn task_id(&self) -> String {
        id_string(self.bids_meta.task_id.as_ref())
    }

    /// Numeric value of `key`, NaN when absent, null or non-numeric.
    pub fn metric(&self, key: &str) -> f64 {
        match self.fields.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
            Some(Value::Null) | None => f64::NAN,
            Some(other) => {
                debug!(key, value = %other, "non-numeric metric treated as missing");
                f64::NAN
            }
        }
    }
}

fn id_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

pub fn read_mriqc_json(path: &Path) -> Result<MriqcDocument> {
    let mut content = String::new();
    open_maybe_gz(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .read_to_string(&mut content)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_mriqc_json(&content).with_context(|| format!("malformed MRIQC JSON {}", path.display()))
}

pub fn parse_mriqc_json(content: &str) -> Result<MriqcDocument> {
    Ok(serde_json::from_str(content)?)
}

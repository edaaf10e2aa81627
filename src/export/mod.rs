//! Result export.
//!
//! A harvest run produces one [`HarvestResults`] document. JSON output is
//! the document pretty-printed; CSV output flattens each instance into a
//! row, with nested keys joined by `_`, arrays joined by `; `, and the
//! header being the sorted union of keys across every row.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::record::InstanceRecord;

/// One scraped instance, or the failure stub that stands in for it so a
/// single broken page never loses the rest of the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScrapeOutcome {
    Record(Box<InstanceRecord>),
    Failure {
        #[serde(rename = "instanceId")]
        instance_id: String,
        error: String,
    },
}

impl From<InstanceRecord> for ScrapeOutcome {
    fn from(record: InstanceRecord) -> Self {
        ScrapeOutcome::Record(Box::new(record))
    }
}

/// Everything one run harvested, plus when and where
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestResults {
    /// RFC 3339 timestamp taken when the run started
    pub fetched_at: String,
    pub region: String,
    pub ec2: Vec<ScrapeOutcome>,
    pub lightsail: Vec<ScrapeOutcome>,
}

impl HarvestResults {
    pub fn new(region: Option<&str>) -> Self {
        Self {
            fetched_at: Utc::now().to_rfc3339(),
            region: region.unwrap_or("default").to_string(),
            ec2: Vec::new(),
            lightsail: Vec::new(),
        }
    }

    /// Count of successfully scraped records (failure stubs excluded)
    pub fn record_count(&self) -> usize {
        self.ec2
            .iter()
            .chain(self.lightsail.iter())
            .filter(|o| matches!(o, ScrapeOutcome::Record(_)))
            .count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Flatten every instance into one CSV table
    pub fn to_csv(&self) -> Result<String> {
        let mut headers: BTreeSet<String> = BTreeSet::new();
        let mut rows: Vec<BTreeMap<String, String>> = Vec::new();

        for outcome in self.ec2.iter().chain(self.lightsail.iter()) {
            let value = serde_json::to_value(outcome)?;
            let mut flat = BTreeMap::new();
            flatten(&value, "", &mut flat);
            headers.extend(flat.keys().cloned());
            rows.push(flat);
        }

        let headers: Vec<&String> = headers.iter().collect();
        let mut out = String::new();
        out.push_str(
            &headers
                .iter()
                .map(|h| escape_cell(h))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push('\n');
        for row in &rows {
            let line = headers
                .iter()
                .map(|h| escape_cell(row.get(*h).map(String::as_str).unwrap_or("")))
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    /// Write to `path`; a `.csv` extension selects CSV, anything else JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        let body = if is_csv { self.to_csv()? } else { self.to_json()? };
        fs::write(path, body)?;
        Ok(())
    }
}

/// Recursively flatten a JSON value into `prefix_key` columns
fn flatten(value: &Value, prefix: &str, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let new_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}_{key}")
                };
                flatten(child, &new_key, out);
            }
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(element_text)
                .collect::<Vec<_>>()
                .join("; ");
            out.insert(prefix.to_string(), joined);
        }
        other => {
            out.insert(prefix.to_string(), scalar_text(other));
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Array elements render as scalars where possible, compact JSON otherwise
fn element_text(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string(value).unwrap_or_default()
        }
        other => scalar_text(other),
    }
}

fn escape_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

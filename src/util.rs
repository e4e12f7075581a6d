use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::warn;

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Rounds to five decimal places so repeated runs serialize identically.
pub fn round5(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    (value * 100_000.0).round() / 100_000.0
}

/// Calendar date (`YYYY-MM-DD`) prefix of an ISO-8601 timestamp.
pub fn calendar_date(timestamp: &str) -> Option<String> {
    let prefix = timestamp.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let data = serde_json::to_vec(value).context("failed to serialize value for hashing")?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Deserializes one element of a record array. A record that does not fit
/// the expected shape is logged and dropped so it cannot sink its siblings.
pub fn parse_record<T: DeserializeOwned>(
    value: &Value,
    kind: &str,
    position: impl fmt::Display,
) -> Option<T> {
    match T::deserialize(value) {
        Ok(record) => Some(record),
        Err(error) => {
            warn!(kind, position = %position, %error, "skipping malformed record");
            None
        }
    }
}

/// Reads a JSON array of records; returns the parsed records and the number
/// of elements that were skipped as malformed.
pub fn read_json_records<T: DeserializeOwned>(
    path: &Path,
    kind: &str,
) -> Result<(Vec<T>, usize)> {
    let values: Vec<Value> = read_json(path)?;
    let records = values
        .iter()
        .enumerate()
        .filter_map(|(position, value)| parse_record(value, kind, position))
        .collect::<Vec<T>>();
    let skipped = values.len() - records.len();
    Ok((records, skipped))
}

/// Object counterpart of [`read_json_records`]: keeps the entries whose
/// values parse and counts the rest.
pub fn read_json_record_map<T: DeserializeOwned>(
    path: &Path,
    kind: &str,
) -> Result<(BTreeMap<String, T>, usize)> {
    let values: BTreeMap<String, Value> = read_json(path)?;
    let records = values
        .iter()
        .filter_map(|(key, value)| {
            parse_record(value, kind, key).map(|record| (key.clone(), record))
        })
        .collect::<BTreeMap<String, T>>();
    let skipped = values.len() - records.len();
    Ok((records, skipped))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

pub fn write_json_stdout<T: Serialize>(value: &T) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, value).context("failed to serialize json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

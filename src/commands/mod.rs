use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::util::{write_json_pretty, write_json_stdout};

pub mod aggregate;
pub mod combine;
pub mod match_records;
pub mod search;

/// Writes pretty JSON to `output` when given, otherwise to stdout.
fn emit_json<T: Serialize>(output: Option<&Path>, value: &T) -> Result<()> {
    match output {
        Some(path) => {
            write_json_pretty(path, value)?;
            info!(path = %path.display(), "wrote report");
            Ok(())
        }
        None => write_json_stdout(value),
    }
}

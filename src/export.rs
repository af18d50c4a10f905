//! Export of prediction results and formatting of the session history

use crate::record::Value;
use crate::session::{HistoryEntry, Submission};
use anyhow::Context;
use chrono::{DateTime, Local};
use polars::prelude::*;
use serde_json::{Map, Value as JsonValue};
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Column holding the predicted label in exported records
pub const PREDICTION_COLUMN: &str = "Prediction";
/// Column holding the churn probability in exported records
pub const PROBABILITY_COLUMN: &str = "Churn_Probability";

const MAX_NAME_ATTEMPTS: usize = 100;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => anyhow::bail!("Unsupported export format '{}': expected csv or json", other),
        }
    }
}

/// File name for an export: `prediction_<YYYYMMDD_HHMMSS>.<ext>`
pub fn export_filename(timestamp: &DateTime<Local>, format: ExportFormat) -> String {
    format!(
        "prediction_{}.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Flatten a submission into a single-row frame: the 19 input fields plus
/// the prediction and churn probability columns
pub fn to_dataframe(submission: &Submission) -> crate::Result<DataFrame> {
    let mut columns: Vec<Series> = submission
        .record
        .iter()
        .map(|(field, value)| match value {
            Value::Category(label) => Series::new(field.name(), &[label]),
            Value::Integer(n) => Series::new(field.name(), &[i64::from(n)]),
            Value::Real(x) => Series::new(field.name(), &[x]),
        })
        .collect();

    columns.push(Series::new(
        PREDICTION_COLUMN,
        &[submission.result.predicted_label.as_str()],
    ));
    columns.push(Series::new(
        PROBABILITY_COLUMN,
        &[submission.result.churn_probability],
    ));

    Ok(DataFrame::new(columns)?)
}

/// Write the flat record as comma-separated text with a header row
pub fn write_csv<W: Write>(submission: &Submission, writer: &mut W) -> crate::Result<()> {
    let mut df = to_dataframe(submission)?;
    CsvWriter::new(writer).include_header(true).finish(&mut df)?;
    Ok(())
}

/// The flat record as a JSON object, keys in column order
pub fn to_json(submission: &Submission) -> JsonValue {
    let mut object = Map::new();
    for (field, value) in submission.record.iter() {
        let json = match value {
            Value::Category(label) => JsonValue::from(label),
            Value::Integer(n) => JsonValue::from(n),
            Value::Real(x) => JsonValue::from(x),
        };
        object.insert(field.name().to_string(), json);
    }
    object.insert(
        PREDICTION_COLUMN.to_string(),
        JsonValue::from(submission.result.predicted_label.as_str()),
    );
    object.insert(
        PROBABILITY_COLUMN.to_string(),
        JsonValue::from(submission.result.churn_probability),
    );
    JsonValue::Object(object)
}

/// Write a submission into `dir` using the timestamped file name convention
pub fn export_submission(
    submission: &Submission,
    dir: &Path,
    format: ExportFormat,
) -> crate::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let (path, mut file) = create_export_file(dir, &submission.timestamp, format)?;

    match format {
        ExportFormat::Csv => write_csv(submission, &mut file)?,
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut file, &to_json(submission))?;
            writeln!(file)?;
        }
    }

    info!(path = %path.display(), "Exported prediction");
    Ok(path)
}

/// Create a fresh export file, never truncating an existing one.
/// Exports within the same second get a `_2`, `_3`, ... suffix.
fn create_export_file(
    dir: &Path,
    timestamp: &DateTime<Local>,
    format: ExportFormat,
) -> crate::Result<(PathBuf, File)> {
    let base = export_filename(timestamp, format);
    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let name = if attempt == 1 {
            base.clone()
        } else {
            let stem = base.trim_end_matches(&format!(".{}", format.extension()));
            format!("{}_{}.{}", stem, attempt, format.extension())
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to create {}", path.display()))
            }
        }
    }
    anyhow::bail!(
        "Too many exports named {} in {}",
        base,
        dir.display()
    )
}

/// Render the session history as a plain-text table
pub fn format_history(entries: &[HistoryEntry]) -> String {
    let mut table = format!(
        "{:<10} {:<10} {:>11} {:>7} {:>15}\n",
        "timestamp", "prediction", "probability", "tenure", "monthly_charges"
    );
    for entry in entries {
        let _ = writeln!(
            table,
            "{:<10} {:<10} {:>11} {:>7} {:>15.2}",
            entry.timestamp.format("%H:%M:%S"),
            entry.predicted_label.as_str(),
            format!("{:.1}%", entry.churn_probability * 100.0),
            entry.tenure,
            entry.monthly_charge
        );
    }
    table
}

//! CSV rendering and export files.
//!
//! # Responsibility
//! - Render records as quoted CSV rows in store order.
//! - Build the timestamped export file name.
//! - Write the export file without leaving partial output behind.
//!
//! # Invariants
//! - Every field is wrapped in double quotes; embedded quotes are doubled.
//! - Display strings are recomputed from meters at render time.
//! - Lines end with `\n`; the document ends with a trailing newline.

use crate::model::record::MeasurementRecord;
use chrono::{DateTime, TimeZone};
use log::{error, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = "Timestamp,Height_CM,Height_Feet_Inches,Image_Filename,Notes";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_NAME_PREFIX: &str = "height_measurements_";
const FILE_NAME_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Wraps one value as a quoted CSV field.
pub fn escape_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Renders one record as a CSV row (no line terminator).
pub fn render_row<Tz: TimeZone>(record: &MeasurementRecord, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let timestamp = record
        .created_at()
        .with_timezone(tz)
        .format(TIMESTAMP_FORMAT)
        .to_string();
    let centimeters = format!("{:.1}", record.centimeters());
    let feet_inches = record.feet_inches_label();
    let fields = [
        timestamp.as_str(),
        centimeters.as_str(),
        feet_inches.as_str(),
        record.image_ref().unwrap_or_default(),
        record.note().unwrap_or_default(),
    ];

    fields
        .iter()
        .map(|field| escape_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders header plus one row per record, timestamps shown in `tz`.
pub fn render_csv<Tz: TimeZone>(records: &[MeasurementRecord], tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut csv = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 64);
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    for record in records {
        csv.push_str(&render_row(record, tz));
        csv.push('\n');
    }
    csv
}

/// `height_measurements_<yyyy-MM-dd_HH-mm-ss>.csv` for the given instant.
pub fn export_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{FILE_NAME_PREFIX}{}.csv",
        now.format(FILE_NAME_TIMESTAMP_FORMAT)
    )
}

/// Writes `content` to `dir/file_name` via a temporary sibling and rename.
///
/// # Errors
/// - Returns the underlying I/O error; a failed write leaves no final file.
pub fn write_csv_file(dir: &Path, file_name: &str, content: &str) -> io::Result<PathBuf> {
    let final_path = dir.join(file_name);
    let temp_path = dir.join(format!(".{file_name}.partial"));

    let result = fs::create_dir_all(dir)
        .and_then(|()| fs::write(&temp_path, content.as_bytes()))
        .and_then(|()| fs::rename(&temp_path, &final_path));

    match result {
        Ok(()) => {
            info!(
                "event=csv_write module=export status=ok bytes={} path={}",
                content.len(),
                final_path.display()
            );
            Ok(final_path)
        }
        Err(err) => {
            let _ = fs::remove_file(&temp_path);
            error!(
                "event=csv_write module=export status=error path={} error={err}",
                final_path.display()
            );
            Err(err)
        }
    }
}

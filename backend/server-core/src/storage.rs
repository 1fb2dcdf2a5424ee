//! Line-oriented files the data and log handlers persist into.
//!
//! Each writer takes the directory it owns; file names are fixed.

use crate::error::storage::StorageError;

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use log::{debug, error};

pub const HEADER_FILE: &str = "header.csv";
pub const DATA_FILE: &str = "data.csv";
pub const LOG_FILE: &str = "data.log";

fn logged(error: StorageError) -> StorageError {
    error!("{error}");
    error
}

/// Create `dir` and any missing parents.
#[track_caller]
pub fn ensure_dir(dir: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(|e| logged(StorageError::io(dir, "creating directory", e)))
}

/// Read the CSV header, creating an empty header file first when none exists.
#[track_caller]
pub fn read_header(dir: &Path) -> Result<Vec<String>, StorageError> {
    let path = dir.join(HEADER_FILE);
    if !path.exists() {
        write_header(dir, &[])?;
    }

    let file = fs::File::open(&path)
        .map_err(|e| logged(StorageError::io(&path, "opening header file", e)))?;
    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .map_err(|e| logged(StorageError::io(&path, "reading header file", e)))?;

    let line = first_line.trim_end();
    if line.is_empty() {
        return Ok(Vec::new());
    }
    Ok(line.split(',').map(str::to_string).collect())
}

/// Overwrite the CSV header with `columns`.
#[track_caller]
pub fn write_header(dir: &Path, columns: &[String]) -> Result<(), StorageError> {
    let path = dir.join(HEADER_FILE);
    fs::write(&path, format!("{}\n", columns.join(",")))
        .map_err(|e| logged(StorageError::io(&path, "writing header file", e)))?;
    debug!("Header written to {}: {columns:?}", path.display());
    Ok(())
}

/// Append one CSV row.
#[track_caller]
pub fn append_row(dir: &Path, values: &[String]) -> Result<(), StorageError> {
    append_line(dir.join(DATA_FILE), &values.join(","))
}

/// Append one line of log text.
#[track_caller]
pub fn append_log_line(dir: &Path, line: &str) -> Result<(), StorageError> {
    append_line(dir.join(LOG_FILE), line)
}

#[track_caller]
fn append_line(path: PathBuf, line: &str) -> Result<(), StorageError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| logged(StorageError::io(&path, "opening file for append", e)))?;
    file.write_all(format!("{line}\n").as_bytes())
        .map_err(|e| logged(StorageError::io(&path, "appending line", e)))?;
    debug!("Appended line to {}", path.display());
    Ok(())
}

//! Read the tab-separated course roster.

use crate::StudentRecord;
use anyhow::{Context, Result};
use log::warn;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Number of positional columns: first name, last name, placeholder, email.
const ROSTER_COLUMNS: usize = 4;

/// Parse a single roster line. Returns `None` if the line has fewer than four columns.
#[must_use]
pub fn parse_roster_line(line: &str) -> Option<StudentRecord> {
    let mut columns = line.split('\t');
    let first_name = columns.next()?;
    let last_name = columns.next()?;
    let _placeholder = columns.next()?;
    let email = columns.next()?;

    Some(StudentRecord {
        first_name: first_name.trim().to_string(),
        last_name: last_name.trim().to_string(),
        email: email.trim().to_lowercase(),
    })
}

/// Read student records from any buffered reader.
/// Blank lines are skipped, short lines are logged and skipped.
///
/// # Errors
/// Returns an error if the reader fails or yields invalid UTF-8.
pub fn read_roster<R: BufRead>(reader: R) -> Result<Vec<StudentRecord>> {
    let mut students = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.with_context(|| format!("Failed to read roster line {line_number}"))?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_roster_line(&line) {
            Some(student) => students.push(student),
            None => warn!(
                "Skipping roster line {line_number}: expected {ROSTER_COLUMNS} tab-separated columns"
            ),
        }
    }
    Ok(students)
}

/// Read student records from a roster file on disk.
///
/// # Errors
/// Returns an error if the file does not exist or cannot be read.
pub fn read_roster_file(path: &Path) -> Result<Vec<StudentRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Could not open roster file {}", path.display()))?;
    read_roster(BufReader::new(file))
        .with_context(|| format!("Failed to read roster file {}", path.display()))
}

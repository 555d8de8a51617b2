//! Loading of validation coordinate files.
//!
//! A validation file is a plain-text list of `(input, output)` pairs, one per
//! line, formatted `(<input> <output>)`. The surrounding parentheses are
//! optional. These coordinates are only consulted after a run, never during
//! evolution.

use crate::error::DatasetError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Load every coordinate pair from the given file.
///
/// Blank lines are skipped. A malformed line fails the whole load, with the
/// offending line identified by its 1-based number.
pub fn load_coordinates<P>(path: P) -> Result<Vec<(f64, f64)>, DatasetError>
where
    P: AsRef<Path>,
{
    let file = File::open(path)?;
    let mut coordinates = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        coordinates.push(parse_line(trimmed).ok_or_else(|| DatasetError::MalformedLine {
            line: index + 1,
            text: line.clone(),
        })?);
    }
    Ok(coordinates)
}

fn parse_line(line: &str) -> Option<(f64, f64)> {
    let stripped = line
        .trim_start_matches('(')
        .trim_end_matches(')');
    let (input, output) = stripped.split_once(' ')?;
    let input = input.trim().parse().ok()?;
    let output = output.trim().parse().ok()?;
    Some((input, output))
}

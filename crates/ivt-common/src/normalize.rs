//! CSV intake
//!
//! Decodes uploaded, comma-separated text with a header row into an ordered
//! header list and a sequence of typed [`Record`]s.
//!
//! Cell typing follows a small set of rules applied to the trimmed cell text:
//!
//! | Cell text                                | Value                  |
//! |------------------------------------------|------------------------|
//! | empty or whitespace                      | `Null`                 |
//! | `true` / `TRUE` / `True` (and `false`)   | `Boolean`              |
//! | decimal literal within ±(2^53 - 1)       | `Number`               |
//! | anything else                            | `String` (as written)  |
//!
//! A file that cannot be decoded, or that holds no data rows, is rejected as a
//! whole: malformed input is never surfaced as a partial record set.

use crate::error::{IvtError, Result};
use crate::record::{FieldValue, Record, MAX_SAFE_INTEGER};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Normalized contents of one uploaded file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    /// Field names in first-seen order
    pub headers: Vec<String>,
    /// One record per data row, in file order
    pub records: Vec<Record>,
    /// Non-fatal problems, e.g. rows wider than the header
    pub warnings: Vec<String>,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read and normalize a CSV file from disk
pub fn normalize_file(path: impl AsRef<Path>) -> Result<NormalizedTable> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        IvtError::parse(format!("could not read '{}': {}", path.display(), e))
    })?;
    normalize_bytes(&bytes)
}

/// Normalize CSV text from any reader
pub fn normalize_reader(mut reader: impl Read) -> Result<NormalizedTable> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| IvtError::parse(format!("could not read input: {}", e)))?;
    normalize_bytes(&bytes)
}

/// Normalize raw CSV bytes
pub fn normalize_bytes(input: &[u8]) -> Result<NormalizedTable> {
    let text = std::str::from_utf8(input)
        .map_err(|e| IvtError::parse(format!("file is not valid UTF-8 text: {}", e)))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let raw_headers = reader.headers().map_err(csv_error)?.clone();
    if raw_headers.iter().all(|h| h.trim().is_empty()) {
        return Err(IvtError::parse("the file has no header row"));
    }
    let headers = unique_headers(raw_headers.iter());

    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(csv_error)?;

        let mut record = Record::with_capacity(headers.len());
        for (name, cell) in headers.iter().zip(row.iter()) {
            record.insert(name.clone(), infer_value(cell));
        }

        if row.len() > headers.len() {
            let extra = row.len() - headers.len();
            warn!(row = index + 1, extra, "Ignoring cells beyond the header width");
            warnings.push(format!(
                "row {}: {} extra cell(s) beyond the header were ignored",
                index + 1,
                extra
            ));
        }

        records.push(record);
    }

    if records.is_empty() {
        return Err(IvtError::parse("the file contains no data rows"));
    }

    debug!(
        rows = records.len(),
        columns = headers.len(),
        warnings = warnings.len(),
        "Normalized CSV input"
    );

    Ok(NormalizedTable {
        headers,
        records,
        warnings,
    })
}

/// Infer the typed value of a single cell
pub fn infer_value(raw: &str) -> FieldValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FieldValue::Null;
    }

    match trimmed {
        "true" | "TRUE" | "True" => return FieldValue::Boolean(true),
        "false" | "FALSE" | "False" => return FieldValue::Boolean(false),
        _ => {},
    }

    if is_decimal_literal(trimmed) {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() && n.abs() <= MAX_SAFE_INTEGER as f64 {
                return FieldValue::Number(n);
            }
        }
    }

    FieldValue::String(raw.to_string())
}

/// `-?(\d+\.?|\.\d+|\d+\.\d+)([eE][-+]?\d+)?`
fn is_decimal_literal(s: &str) -> bool {
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
        None => (unsigned, None),
    };

    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => digits(int) && digits(frac) && !(int.is_empty() && frac.is_empty()),
        None => !mantissa.is_empty() && digits(mantissa),
    };

    let exponent_ok = match exponent {
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && digits(exp)
        },
        None => true,
    };

    mantissa_ok && exponent_ok
}

/// Trim header cells, name blank ones by position, and suffix duplicates
fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::new();

    for (position, header) in raw.enumerate() {
        let base = match header.trim() {
            "" => format!("column_{}", position + 1),
            trimmed => trimmed.to_string(),
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while !seen.insert(name.clone()) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        headers.push(name);
    }

    headers
}

fn csv_error(err: csv::Error) -> IvtError {
    let location = err
        .position()
        .map(|pos| format!(" (line {})", pos.line()))
        .unwrap_or_default();
    IvtError::parse(format!("could not read CSV{}: {}", location, err))
}

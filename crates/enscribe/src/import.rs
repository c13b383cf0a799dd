//! Two column CSV import of naming requests.
//!
//! Each row is `address,name`, where `name` is a bare label or a full name. The first row is a
//! header only when its first column is one of [`ADDRESS_HEADERS`]; any other row must carry a
//! valid address.

use crate::request::NamingRequest;
use alloy_primitives::Address;
use std::{fs::File, io, path::Path};

/// Accepted names of the address column in a header row, compared case-insensitively.
pub const ADDRESS_HEADERS: &[&str] = &["address", "contract", "contract address", "contract_address"];

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("line {line}: expected 2 columns, found {found}")]
    ColumnCount { line: usize, found: usize },
    #[error("line {line}: invalid address `{value}`")]
    InvalidAddress { line: usize, value: String },
    #[error(transparent)]
    Csv(csv::Error),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::UnequalLengths { pos, len, .. } => Self::ColumnCount {
                line: pos.as_ref().map_or(0, |pos| pos.line() as usize),
                found: *len as usize,
            },
            _ => Self::Csv(err),
        }
    }
}

/// Reads naming requests from the CSV file at `path`.
pub fn read_csv(path: &Path) -> Result<Vec<NamingRequest>, ImportError> {
    let file =
        File::open(path).map_err(|source| ImportError::Io { path: path.display().to_string(), source })?;
    parse_reader(file)
}

/// Parses CSV content into naming requests. Blank lines are ignored.
pub fn parse_csv(content: &str) -> Result<Vec<NamingRequest>, ImportError> {
    parse_reader(content.as_bytes())
}

fn parse_reader(rdr: impl io::Read) -> Result<Vec<NamingRequest>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(rdr);

    let mut requests = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(idx + 1, |pos| pos.line() as usize);
        if record.len() != 2 {
            return Err(ImportError::ColumnCount { line, found: record.len() });
        }

        let (address, label) = (&record[0], &record[1]);
        if idx == 0 && is_header(address) {
            trace!(target: "enscribe::import", line, "skipping header row");
            continue;
        }
        let address = address
            .parse::<Address>()
            .map_err(|_| ImportError::InvalidAddress { line, value: address.to_string() })?;
        requests.push(NamingRequest::new(address, label));
    }
    debug!(target: "enscribe::import", requests = requests.len(), "imported csv");
    Ok(requests)
}

fn is_header(column: &str) -> bool {
    ADDRESS_HEADERS.iter().any(|header| column.eq_ignore_ascii_case(header))
}

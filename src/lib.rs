pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod product;
pub mod store;

use crate::error::ImportError;
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

/// An uploaded table before any column checks.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-based line of the source file, header included.
    pub line: u64,
    pub fields: Vec<String>,
}

impl RawTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Whether a file name carries a `.csv` extension, in any case.
pub fn has_csv_extension(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Reads a whole CSV upload into memory. Any malformed record fails the
/// read; rows are never skipped here.
pub fn read_table<R: Read>(reader: R) -> Result<RawTable, ImportError> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::Parse("no columns to parse from file".to_string()));
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        rows.push(RawRow {
            line,
            fields: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(RawTable { headers, rows })
}

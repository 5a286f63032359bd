//! Reading comment files: optional zstd decompression, UTF-8/GBK decoding,
//! and CSV parsing into header-keyed raw rows.

use crate::error::{EngineError, Result};
use crate::model::REQUIRED_COLUMNS;
use crate::util::open_with_backoff;
use std::io::{BufReader, Read};
use std::path::Path;
use zstd::stream::read::Decoder;

const UTF8_BOM: &str = "\u{feff}";

/// Parsed CSV content: header names plus one positional record per data row.
#[derive(Clone, Debug, Default)]
pub struct RawTable {
    pub source_name: String,
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl RawTable {
    /// Required columns absent from the header, in canonical order.
    pub fn missing_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|c| !self.headers.iter().any(|h| h == *c))
            .map(|c| c.to_string())
            .collect()
    }

    /// Position of each required column, or a `Schema` error naming every missing one.
    pub fn column_index(&self) -> Result<[usize; 10]> {
        let missing = self.missing_columns();
        if !missing.is_empty() {
            return Err(EngineError::Schema { source_name: self.source_name.clone(), missing });
        }
        let mut idx = [0usize; 10];
        for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS.iter()) {
            // presence checked above
            *slot = self.headers.iter().position(|h| h == name).unwrap_or_default();
        }
        Ok(idx)
    }
}

/// Read `path` fully, transparently decompressing `*.zst`.
pub fn read_file_bytes(path: &Path, read_buf: usize) -> Result<Vec<u8>> {
    let f = open_with_backoff(path, 16, 50).map_err(|e| EngineError::io(path, e))?;
    let r = BufReader::with_capacity(read_buf.max(8 * 1024), f);
    let mut bytes = Vec::new();
    let is_zst = path.extension().map_or(false, |e| e.eq_ignore_ascii_case("zst"));
    if is_zst {
        let mut dec = Decoder::with_buffer(r).map_err(|e| EngineError::io(path, e))?;
        dec.read_to_end(&mut bytes).map_err(|e| EngineError::io(path, e))?;
    } else {
        let mut r = r;
        r.read_to_end(&mut bytes).map_err(|e| EngineError::io(path, e))?;
    }
    Ok(bytes)
}

/// Decode as UTF-8, falling back to GBK. A leading BOM is dropped.
pub fn decode_text(bytes: Vec<u8>, source_name: &str) -> Result<String> {
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, had_errors) = encoding_rs::GBK.decode_without_bom_handling(&bytes);
            if had_errors {
                return Err(EngineError::Encoding { source_name: source_name.to_string() });
            }
            tracing::debug!(source = source_name, "decoded input as GBK");
            decoded.into_owned()
        }
    };
    Ok(match text.strip_prefix(UTF8_BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Parse CSV text. Short rows are padded with empty cells; a row with more
/// cells than the header is malformed and fails the parse.
pub fn parse_csv(text: &str, source_name: &str) -> Result<RawTable> {
    let malformed = |line: u64, detail: String| EngineError::Csv { source_name: source_name.to_string(), line, detail };
    let from_csv = |e: csv::Error| {
        let line = e.position().map_or(0, |p| p.line());
        malformed(line, e.to_string())
    };
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr.headers().map_err(from_csv)?.iter().map(|h| h.trim().to_string()).collect();
    let mut records = Vec::new();
    for rec in rdr.records() {
        let rec = rec.map_err(from_csv)?;
        if rec.len() > headers.len() {
            let line = rec.position().map_or(0, |p| p.line());
            return Err(malformed(line, format!("expected {} fields, saw {}", headers.len(), rec.len())));
        }
        let mut row: Vec<String> = rec.iter().map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        records.push(row);
    }
    Ok(RawTable { source_name: source_name.to_string(), headers, records })
}

/// Read, decode and parse a comment file.
pub fn read_table(path: &Path, read_buf: usize) -> Result<RawTable> {
    let name = path.display().to_string();
    let bytes = read_file_bytes(path, read_buf)?;
    let text = decode_text(bytes, &name)?;
    parse_csv(&text, &name)
}

//! CSV source handling: delimiter and encoding resolution, record decoding.
//!
//! Inference reads its input twice, so a [`CsvSource`] is a recipe for
//! opening a fresh reader rather than a reader itself. It can point at a file
//! on disk or hold the bytes in memory.

use std::{
    fs::File,
    io::{BufReader, Cursor, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::anyhow;
use encoding_rs::{Encoding, UTF_8};

use crate::error::{LoaderError, Result};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn resolve_encoding(label: Option<&str>) -> anyhow::Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

#[derive(Debug, Clone)]
enum Origin {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

#[derive(Debug, Clone)]
pub struct CsvSource {
    origin: Origin,
    delimiter: u8,
    encoding: &'static Encoding,
}

impl CsvSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let delimiter = resolve_input_delimiter(&path, None);
        Self {
            origin: Origin::File(path),
            delimiter,
            encoding: UTF_8,
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            origin: Origin::Memory(Arc::from(bytes)),
            delimiter: DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn describe(&self) -> String {
        match &self.origin {
            Origin::File(path) => path.display().to_string(),
            Origin::Memory(bytes) => format!("<memory: {} byte(s)>", bytes.len()),
        }
    }

    /// Opens a reader positioned at the first record (the header row).
    pub fn open(&self) -> Result<RecordReader> {
        let inner: Box<dyn Read> = match &self.origin {
            Origin::File(path) => Box::new(BufReader::new(File::open(path)?)),
            Origin::Memory(bytes) => Box::new(Cursor::new(Arc::clone(bytes))),
        };
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .quote(b'"')
            .double_quote(true)
            .flexible(true)
            .from_reader(inner);
        Ok(RecordReader {
            reader,
            record: csv::ByteRecord::new(),
            encoding: self.encoding,
        })
    }
}

/// Decoded view over a CSV reader. Field counts are not enforced here;
/// callers apply their own row policy.
pub struct RecordReader {
    reader: csv::Reader<Box<dyn Read>>,
    record: csv::ByteRecord,
    encoding: &'static Encoding,
}

impl RecordReader {
    /// Returns the next record with its 1-based starting line number.
    pub fn next_record(&mut self) -> Result<Option<(u64, Vec<String>)>> {
        if !self.reader.read_byte_record(&mut self.record)? {
            return Ok(None);
        }
        let line = self.record.position().map(|pos| pos.line()).unwrap_or(0);
        let decoded = decode_record(&self.record, self.encoding).ok_or(LoaderError::Decode {
            line,
            encoding: self.encoding.name(),
        })?;
        Ok(Some((line, decoded)))
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Option<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

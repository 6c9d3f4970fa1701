use csv::{ByteRecord, ReaderBuilder};
use std::io::{Cursor, Read};
use tracing::warn;
use zip::ZipArchive;

use crate::error::Result;
use crate::tools::field_cleaner::normalise_header;

/// Delimiter and quoting rules for a published file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvDialect {
    pub delimiter: u8,
    pub quoting: bool,
}

impl CsvDialect {
    pub fn comma() -> Self {
        Self {
            delimiter: b',',
            quoting: true,
        }
    }

    /// Tab-separated text with no quoting, as used by the Charity Commission extracts
    pub fn tab() -> Self {
        Self {
            delimiter: b'\t',
            quoting: false,
        }
    }
}

/// A data row with its zero-based position in the file
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub index: usize,
    pub values: Vec<String>,
}

/// Streaming reader over the rows of one CSV file.
///
/// Bytes are decoded as UTF-8, replacing invalid sequences. A malformed row
/// is logged and skipped; IO errors end iteration with an error.
pub struct CsvRows<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    record: ByteRecord,
    index: usize,
    skipped: usize,
}

impl<R: Read> CsvRows<R> {
    pub fn new(source: R, dialect: CsvDialect) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(dialect.delimiter)
            .quoting(dialect.quoting)
            .flexible(true)
            .from_reader(source);

        let headers = reader
            .byte_headers()?
            .iter()
            .map(|h| normalise_header(&String::from_utf8_lossy(h)))
            .collect();

        Ok(Self {
            reader,
            headers,
            record: ByteRecord::new(),
            index: 0,
            skipped: 0,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Apply a further renaming to every normalised header
    pub fn rename_headers(&mut self, rename: impl Fn(&str) -> String) {
        self.headers = self.headers.iter().map(|h| rename(h)).collect();
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: Read> Iterator for CsvRows<R> {
    type Item = Result<CsvRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read_byte_record(&mut self.record) {
                Ok(false) => return None,
                Ok(true) => {
                    let values = self
                        .record
                        .iter()
                        .map(|v| String::from_utf8_lossy(v).into_owned())
                        .collect();
                    let row = CsvRow {
                        index: self.index,
                        values,
                    };
                    self.index += 1;
                    return Some(Ok(row));
                }
                Err(e) if e.is_io_error() => return Some(Err(e.into())),
                Err(e) => {
                    warn!("Skipping malformed row after row {}: {}", self.index, e);
                    self.skipped += 1;
                }
            }
        }
    }
}

/// Open an in-memory ZIP archive
pub fn open_zip(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

/// Names of the file (non-directory) members of an in-memory ZIP archive
pub fn zip_members(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = open_zip(bytes)?;
    let mut members = Vec::new();
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        if !file.is_dir() {
            members.push(file.name().to_string());
        }
    }
    Ok(members)
}

/// Find the member whose file name (ignoring directories and case) is `file_name`
pub fn find_member(bytes: &[u8], file_name: &str) -> Result<Option<String>> {
    let wanted = file_name.to_lowercase();
    Ok(zip_members(bytes)?.into_iter().find(|member| {
        member
            .rsplit(['/', '\\'])
            .next()
            .map(|name| name.to_lowercase() == wanted)
            .unwrap_or(false)
    }))
}

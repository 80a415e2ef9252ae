// src/process/mod.rs
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::{
    fs::File,
    io::{BufReader, Cursor, Read, Seek},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};
use zip::ZipArchive;

use crate::config::Decoder;
use crate::error::JodiError;

pub mod date_parser;
pub mod minimal;
pub mod structured;
pub mod utils;

pub use minimal::MinimalReader;
pub use structured::StructuredReader;

/// Fixed first segment of every series ID.
pub const SERIES_ID_PREFIX: &str = "joi-gas-data";
const SERIES_ID_SEPARATOR: char = '\\';

/// The five categorical columns that identify a series.
/// Field order is the grouping order, so the derived `Ord` sorts groups
/// lexicographically over the tuple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey {
    pub area: String,
    pub energy_product: String,
    pub flow: String,
    pub unit: String,
    pub assessment_code: u32,
}

impl SeriesKey {
    /// `joi-gas-data\AREA\PRODUCT\FLOW\UNIT\CODE`
    pub fn series_id(&self) -> String {
        let code = self.assessment_code.to_string();
        [
            SERIES_ID_PREFIX,
            self.area.as_str(),
            self.energy_product.as_str(),
            self.flow.as_str(),
            self.unit.as_str(),
            code.as_str(),
        ]
        .join(&SERIES_ID_SEPARATOR.to_string())
    }
}

/// One decoded observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: SeriesKey,
    pub time_period: NaiveDateTime,
    /// `None` when OBS_VALUE was empty or not a finite number.
    pub value: Option<f64>,
}

/// Borrowed, cleaned cells of one CSV record, named by column.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawRow<'a> {
    pub area: &'a str,
    pub time_period: &'a str,
    pub energy_product: &'a str,
    pub flow: &'a str,
    pub unit: &'a str,
    pub value: &'a str,
    pub assessment_code: &'a str,
}

impl RawRow<'_> {
    pub(crate) fn decode(&self) -> Result<Row, JodiError> {
        let time_period = date_parser::parse_time_period(self.time_period).ok_or_else(|| {
            JodiError::TimePeriod {
                value: self.time_period.to_string(),
            }
        })?;
        let assessment_code = utils::parse_assessment_code(self.assessment_code)?;
        Ok(Row {
            key: SeriesKey {
                area: self.area.to_string(),
                energy_product: self.energy_product.to_string(),
                flow: self.flow.to_string(),
                unit: self.unit.to_string(),
                assessment_code,
            },
            time_period,
            value: utils::parse_observation(self.value),
        })
    }
}

/// The single tabular entry pulled out of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A stream of decoded rows borrowing from a [`DataFile`].
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

/// Decoding strategy for the data file. Every reader yields the same `Row`
/// type so the series builder has a single implementation.
pub trait TableReader {
    fn rows<'a>(&self, table: &'a DataFile) -> Result<RowIter<'a>>;
}

/// Reader selected by the configured decoder.
pub fn reader_for(decoder: Decoder) -> Box<dyn TableReader> {
    match decoder {
        Decoder::Structured => Box::new(StructuredReader),
        Decoder::Minimal => Box::new(MinimalReader),
    }
}

/// Where the archive bytes live.
#[derive(Debug, Clone)]
pub enum ArchiveSource {
    Memory(Vec<u8>),
    Path(PathBuf),
}

impl ArchiveSource {
    /// Open the archive and pull out its data file.
    pub fn data_file(self) -> Result<DataFile> {
        match self {
            ArchiveSource::Memory(bytes) => read_data_file(Cursor::new(bytes)),
            ArchiveSource::Path(path) => read_data_file_from_path(path),
        }
    }
}

#[instrument(level = "info", skip(zip_path), fields(path = %zip_path.as_ref().display()))]
pub fn read_data_file_from_path<P: AsRef<Path>>(zip_path: P) -> Result<DataFile> {
    let file = File::open(&zip_path)
        .with_context(|| format!("Failed to open ZIP file: {:?}", zip_path.as_ref()))?;
    read_data_file(BufReader::new(file))
        .with_context(|| format!("Failed to extract data file from {:?}", zip_path.as_ref()))
}

/// Buffer the first file entry of the archive. Directories are skipped and any
/// further file entries are ignored with a warning. The archive (and the
/// handle it owns) is dropped before returning, on success or error.
pub fn read_data_file<R: Read + Seek>(reader: R) -> Result<DataFile> {
    let mut archive = ZipArchive::new(reader).context("Failed to read ZIP archive")?;

    let mut data: Option<DataFile> = None;
    let mut ignored: Vec<String> = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to access ZIP entry #{}", i))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if data.is_some() {
            ignored.push(name);
            continue;
        }

        let mut buf = Vec::with_capacity(utils::capped_capacity(entry.size()));
        entry
            .read_to_end(&mut buf)
            .with_context(|| format!("Failed to read {} into memory", name))?;
        debug!(entry = %name, bytes = buf.len(), "buffered data file");
        data = Some(DataFile { name, bytes: buf });
    }
    drop(archive);

    if !ignored.is_empty() {
        warn!(
            ignored = ?ignored,
            "archive holds more than one data file; only the first is read"
        );
    }
    data.ok_or_else(|| JodiError::NoDataFile.into())
}

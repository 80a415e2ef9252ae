// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_URL: &str =
    "https://www.jodidata.org/_resources/files/downloads/gas-data/jodi_gas_csv_beta.zip";
pub const DEFAULT_COUNTRIES_PATH: &str = "country_abbreviations.json";
pub const DEFAULT_ARCHIVE_PATH: &str = "jodi_gas_csv_beta.zip";
pub const DEFAULT_OUTPUT_PATH: &str = "jodi_gas_series.json";

/// How the archive body is pulled off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transfer {
    /// Stream the body chunk by chunk, reporting progress.
    #[default]
    Chunked,
    /// Read the whole body in one call.
    SingleShot,
}

/// Which table reader decodes the CSV entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decoder {
    /// Header-indexed, date-typed and ordered by series key then date.
    #[default]
    Structured,
    /// Positional columns, encounter order.
    Minimal,
}

/// Rendering of a point's time period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// `2021-01`
    #[default]
    Month,
    /// `2021-01-01`
    Day,
    /// `2021-01-01T00:00:00`
    Timestamp,
}

/// Every toggle of a pipeline run. Read once and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub url: String,
    pub countries_path: PathBuf,
    pub download_to_disk: bool,
    pub archive_path: PathBuf,
    /// Read this archive instead of fetching one.
    pub local_archive: Option<PathBuf>,
    pub transfer: Transfer,
    pub decoder: Decoder,
    pub time_format: TimeFormat,
    pub print_series: bool,
    pub write_json: bool,
    pub output_path: PathBuf,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            countries_path: PathBuf::from(DEFAULT_COUNTRIES_PATH),
            download_to_disk: false,
            archive_path: PathBuf::from(DEFAULT_ARCHIVE_PATH),
            local_archive: None,
            transfer: Transfer::default(),
            decoder: Decoder::default(),
            time_format: TimeFormat::default(),
            print_series: true,
            write_json: false,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            timeout_secs: 300,
            connect_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load a YAML config file. Keys that are absent keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("opening config file {:?}", path))?;
        serde_yaml::from_reader(file).with_context(|| format!("parsing config file {:?}", path))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "decoder: minimal")?;
        writeln!(tmp, "time_format: day")?;
        writeln!(tmp, "write_json: true")?;

        let cfg = Config::from_yaml_file(tmp.path())?;
        assert_eq!(cfg.decoder, Decoder::Minimal);
        assert_eq!(cfg.time_format, TimeFormat::Day);
        assert!(cfg.write_json);
        assert_eq!(cfg.url, DEFAULT_URL);
        assert_eq!(cfg.transfer, Transfer::Chunked);
        assert!(cfg.print_series);
        Ok(())
    }

    #[test]
    fn unknown_enum_value_is_rejected() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "time_format: week")?;
        assert!(Config::from_yaml_file(tmp.path()).is_err());
        Ok(())
    }
}

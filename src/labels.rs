// src/labels.rs

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{collections::HashMap, fs::File, io::BufReader, path::Path};
use tracing::{debug, instrument};

use crate::error::JodiError;

static ENERGY_PRODUCTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([("NATGAS", "Natural Gas"), ("LNG", "Liquid Natural Gas")])
});

static FLOW_BREAKDOWNS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("EXPLNG", "Export Liquid Natural Gas"),
        ("IMPLNG", "Import Liquid Natural Gas"),
        ("INDPROD", "Industrial Production"),
        ("TOTDEMC", "TOTDEMC"),
        ("TOTIMPSB", "TOTIMPSB"),
        ("TOTDEMO", "TOTDEMO"),
        ("MAINTOT", "MAINTOT"),
        ("TOTEXPSB", "TOTEXPSB"),
        ("IMPPIP", "Import Pipeline"),
        ("STOCKCH", "Stock Change"),
        ("EXPPIP", "Export Pipeline"),
        ("STATDIFF", "Statistical Difference"),
        ("CLOSTLV", "CLOSTLV"),
        ("CONVER", "CONVER"),
        ("OSOURCES", "OSOURCES"),
    ])
});

static UNIT_MEASURES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("M3", "Cubic Meters"),
        ("TJ", "Terajoule"),
        ("KTONS", "Kilotons"),
        ("M3_T", "Metric Tons"),
        ("KT", "Kiloton"),
    ])
});

fn lookup(
    table: &HashMap<&'static str, &'static str>,
    vocabulary: &'static str,
    code: &str,
) -> Result<&'static str, JodiError> {
    table
        .get(code)
        .copied()
        .ok_or_else(|| JodiError::UnknownCode {
            vocabulary,
            code: code.to_string(),
        })
}

/// Label for an ENERGY_PRODUCT code. The vocabulary is closed.
pub fn energy_product_label(code: &str) -> Result<&'static str, JodiError> {
    lookup(&ENERGY_PRODUCTS, "energy product", code)
}

/// Label for a FLOW_BREAKDOWN code. The vocabulary is closed.
pub fn flow_breakdown_label(code: &str) -> Result<&'static str, JodiError> {
    lookup(&FLOW_BREAKDOWNS, "flow breakdown", code)
}

/// Label for a UNIT_MEASURE code. The vocabulary is closed.
pub fn unit_measure_label(code: &str) -> Result<&'static str, JodiError> {
    lookup(&UNIT_MEASURES, "unit measure", code)
}

/// One entry of the country reference file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountryEntry {
    pub abbreviation: String,
    pub country: String,
}

/// Country abbreviation → name, built once from the reference file.
#[derive(Debug, Clone, Default)]
pub struct CountryTable {
    names: HashMap<String, String>,
}

impl CountryTable {
    /// Build from entries. On duplicate abbreviations the first one wins.
    pub fn from_entries<I: IntoIterator<Item = CountryEntry>>(entries: I) -> Self {
        let mut names = HashMap::new();
        for entry in entries {
            names.entry(entry.abbreviation).or_insert(entry.country);
        }
        Self { names }
    }

    /// Load the JSON reference file. A missing or malformed file is fatal.
    #[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("opening country reference file {:?}", path))?;
        let entries: Vec<CountryEntry> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing country reference file {:?}", path))?;
        let table = Self::from_entries(entries);
        debug!(countries = table.len(), "loaded country table");
        Ok(table)
    }

    /// Country name for an abbreviation, `None` when unrecognized.
    pub fn country(&self, abbreviation: &str) -> Option<&str> {
        self.names.get(abbreviation).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn entry(abbreviation: &str, country: &str) -> CountryEntry {
        CountryEntry {
            abbreviation: abbreviation.into(),
            country: country.into(),
        }
    }

    #[test]
    fn closed_vocabularies_resolve() {
        assert_eq!(energy_product_label("NATGAS"), Ok("Natural Gas"));
        assert_eq!(flow_breakdown_label("STOCKCH"), Ok("Stock Change"));
        assert_eq!(unit_measure_label("M3"), Ok("Cubic Meters"));
    }

    #[test]
    fn unknown_unit_is_an_error() {
        let err = unit_measure_label("XYZ").unwrap_err();
        assert_eq!(
            err,
            JodiError::UnknownCode {
                vocabulary: "unit measure",
                code: "XYZ".into()
            }
        );
        assert!(flow_breakdown_label("nope").is_err());
        assert!(energy_product_label("COAL").is_err());
    }

    #[test]
    fn country_lookup_degrades_to_none() {
        let table = CountryTable::from_entries(vec![entry("FR", "France")]);
        assert_eq!(table.country("FR"), Some("France"));
        assert_eq!(table.country("ZZ"), None);
    }

    #[test]
    fn first_duplicate_wins() {
        let table =
            CountryTable::from_entries(vec![entry("DE", "Germany"), entry("DE", "Deutschland")]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.country("DE"), Some("Germany"));
    }

    #[test]
    fn load_from_file() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(
            tmp,
            r#"[{{"abbreviation": "FR", "country": "France"}}, {{"abbreviation": "NO", "country": "Norway"}}]"#
        )?;
        let table = CountryTable::load(tmp.path())?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.country("NO"), Some("Norway"));
        Ok(())
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CountryTable::load(dir.path().join("absent.json")).is_err());
    }
}

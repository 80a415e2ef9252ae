// src/process/structured.rs
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{DataFile, RawRow, Row, RowIter, TableReader};
use crate::error::JodiError;

const REQUIRED_COLUMNS: [&str; 7] = [
    "REF_AREA",
    "ENERGY_PRODUCT",
    "FLOW_BREAKDOWN",
    "UNIT_MEASURE",
    "ASSESSMENT_CODE",
    "TIME_PERIOD",
    "OBS_VALUE",
];

#[derive(Debug, Deserialize)]
struct JodiRecord {
    #[serde(rename = "REF_AREA")]
    ref_area: String,
    #[serde(rename = "TIME_PERIOD")]
    time_period: String,
    #[serde(rename = "ENERGY_PRODUCT")]
    energy_product: String,
    #[serde(rename = "FLOW_BREAKDOWN")]
    flow_breakdown: String,
    #[serde(rename = "UNIT_MEASURE")]
    unit_measure: String,
    #[serde(rename = "OBS_VALUE")]
    obs_value: String,
    #[serde(rename = "ASSESSMENT_CODE")]
    assessment_code: String,
}

impl JodiRecord {
    fn raw(&self) -> RawRow<'_> {
        RawRow {
            area: &self.ref_area,
            time_period: &self.time_period,
            energy_product: &self.energy_product,
            flow: &self.flow_breakdown,
            unit: &self.unit_measure,
            value: &self.obs_value,
            assessment_code: &self.assessment_code,
        }
    }
}

/// Columns addressed by header name. The whole table is decoded up front and
/// handed out grouped by series key, each group in date order. Rows with the
/// same key and date keep their file order.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredReader;

impl TableReader for StructuredReader {
    #[instrument(level = "info", skip(self, table), fields(file = %table.name))]
    fn rows<'a>(&self, table: &'a DataFile) -> Result<RowIter<'a>> {
        let mut rdr = ReaderBuilder::new()
            .trim(Trim::All)
            .from_reader(table.bytes.as_slice());

        let headers = rdr
            .headers()
            .with_context(|| format!("reading header of {}", table.name))?;
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .collect();
        if !missing.is_empty() {
            return Err(JodiError::ColumnLayout {
                file: table.name.clone(),
                reason: format!("missing columns {}", missing.join(", ")),
            }
            .into());
        }

        let mut rows: Vec<Row> = Vec::new();
        for (idx, result) in rdr.deserialize::<JodiRecord>().enumerate() {
            let record = result
                .with_context(|| format!("CSV parse error in {} at record {}", table.name, idx))?;
            let row = record
                .raw()
                .decode()
                .with_context(|| format!("decoding {} record {}", table.name, idx))?;
            rows.push(row);
        }

        rows.sort_by(|a, b| {
            a.key
                .cmp(&b.key)
                .then_with(|| a.time_period.cmp(&b.time_period))
        });
        debug!(rows = rows.len(), "decoded structured table");

        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}

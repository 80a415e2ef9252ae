// src/process/minimal.rs
use anyhow::{Context, Result};
use csv::ReaderBuilder;

use super::{utils::clean_str, DataFile, RawRow, Row, RowIter, TableReader};
use crate::error::JodiError;

/// Column order the minimal reader relies on. It differs from the grouping
/// order, so every cell is mapped by position below.
pub const POSITIONAL_COLUMNS: [&str; 7] = [
    "REF_AREA",
    "TIME_PERIOD",
    "ENERGY_PRODUCT",
    "FLOW_BREAKDOWN",
    "UNIT_MEASURE",
    "OBS_VALUE",
    "ASSESSMENT_CODE",
];

/// Plain delimited text read by position, yielded lazily in file order.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalReader;

fn layout_error(table: &DataFile, reason: String) -> anyhow::Error {
    JodiError::ColumnLayout {
        file: table.name.clone(),
        reason,
    }
    .into()
}

impl TableReader for MinimalReader {
    fn rows<'a>(&self, table: &'a DataFile) -> Result<RowIter<'a>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(table.bytes.as_slice());

        let headers = rdr
            .headers()
            .with_context(|| format!("reading header of {}", table.name))?;
        for (pos, expected) in POSITIONAL_COLUMNS.iter().enumerate() {
            let found = headers.get(pos).map(clean_str);
            if found.as_deref() != Some(*expected) {
                return Err(layout_error(
                    table,
                    format!(
                        "column {} is {:?}, expected {}",
                        pos,
                        found.unwrap_or_default(),
                        expected
                    ),
                ));
            }
        }

        let records = rdr
            .into_records()
            .enumerate()
            .map(move |(idx, result)| -> Result<Row> {
                let record = result
                    .with_context(|| format!("CSV parse error in {} at record {}", table.name, idx))?;
                if record.len() < POSITIONAL_COLUMNS.len() {
                    return Err(layout_error(
                        table,
                        format!(
                            "record {} has {} fields, expected {}",
                            idx,
                            record.len(),
                            POSITIONAL_COLUMNS.len()
                        ),
                    ));
                }
                let cells: Vec<String> = record
                    .iter()
                    .take(POSITIONAL_COLUMNS.len())
                    .map(clean_str)
                    .collect();
                let raw = RawRow {
                    area: &cells[0],
                    time_period: &cells[1],
                    energy_product: &cells[2],
                    flow: &cells[3],
                    unit: &cells[4],
                    value: &cells[5],
                    assessment_code: &cells[6],
                };
                raw.decode()
                    .with_context(|| format!("decoding {} record {}", table.name, idx))
            });

        Ok(Box::new(records))
    }
}

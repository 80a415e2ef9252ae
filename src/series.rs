// src/series.rs

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

use crate::config::TimeFormat;
use crate::error::JodiError;
use crate::labels::{energy_product_label, flow_breakdown_label, unit_measure_label, CountryTable};
use crate::process::{date_parser::format_time_period, Row, SeriesKey};

/// `[time_period, value]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point(pub String, pub f64);

/// Human-readable labels attached to a series when it is first created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesFields {
    pub country: Option<String>,
    #[serde(rename = "measurement unit")]
    pub measurement_unit: String,
    #[serde(rename = "assessment code")]
    pub assessment_code: u32,
    #[serde(rename = "flow breakdown")]
    pub flow_breakdown: String,
    #[serde(rename = "energy product")]
    pub energy_product: String,
}

impl SeriesFields {
    /// Resolve labels for `key`. Product, flow and unit are closed
    /// vocabularies and fail on unknown codes; the country may be absent.
    pub fn resolve(key: &SeriesKey, countries: &CountryTable) -> Result<Self, JodiError> {
        Ok(Self {
            country: countries.country(&key.area).map(str::to_string),
            measurement_unit: unit_measure_label(&key.unit)?.to_string(),
            assessment_code: key.assessment_code,
            flow_breakdown: flow_breakdown_label(&key.flow)?.to_string(),
            energy_product: energy_product_label(&key.energy_product)?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub series_id: String,
    pub points: Vec<Point>,
    pub fields: SeriesFields,
}

/// Accumulates rows into series, one series per series ID, in order of first
/// appearance. Points are appended in the order rows arrive, so a reader that
/// hands out rows grouped and date-sorted yields date-ordered points.
pub struct SeriesBuilder<'a> {
    countries: &'a CountryTable,
    time_format: TimeFormat,
    series: Vec<Series>,
    index: HashMap<String, usize>,
    skipped: usize,
}

impl<'a> SeriesBuilder<'a> {
    pub fn new(countries: &'a CountryTable, time_format: TimeFormat) -> Self {
        Self {
            countries,
            time_format,
            series: Vec::new(),
            index: HashMap::new(),
            skipped: 0,
        }
    }

    /// Add one row. Rows without an observation value are skipped and never
    /// create a series, but their codes are still checked, so an unknown
    /// product, flow or unit fails the build whether or not a value is present.
    pub fn push(&mut self, row: Row) -> Result<(), JodiError> {
        let series_id = row.key.series_id();
        let existing = self.index.get(&series_id).copied();
        let fields = match existing {
            Some(_) => None,
            None => Some(SeriesFields::resolve(&row.key, self.countries)?),
        };

        let Some(value) = row.value else {
            warn!(
                series_id = %series_id,
                time_period = %row.time_period,
                "skipping row without OBS_VALUE"
            );
            self.skipped += 1;
            return Ok(());
        };
        let point = Point(format_time_period(&row.time_period, self.time_format), value);

        if let Some(idx) = existing {
            self.series[idx].points.push(point);
        } else if let Some(fields) = fields {
            self.index.insert(series_id.clone(), self.series.len());
            self.series.push(Series {
                series_id,
                points: vec![point],
                fields,
            });
        }
        Ok(())
    }

    /// Rows dropped so far for lacking a value.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn finish(self) -> Vec<Series> {
        self.series
    }
}

/// Drain a row stream into finished series. The first decode or lookup
/// failure aborts the whole build.
#[instrument(level = "info", skip(rows, countries))]
pub fn build_series<I>(
    rows: I,
    countries: &CountryTable,
    time_format: TimeFormat,
) -> Result<Vec<Series>>
where
    I: IntoIterator<Item = Result<Row>>,
{
    let mut builder = SeriesBuilder::new(countries, time_format);
    let mut count = 0usize;
    for row in rows {
        builder.push(row?)?;
        count += 1;
    }
    info!(
        rows = count,
        skipped = builder.skipped(),
        series = builder.len(),
        "built series"
    );
    Ok(builder.finish())
}

// src/emit.rs

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
};
use tracing::{info, instrument};

use crate::config::Config;
use crate::series::Series;

/// Print one compact JSON document per series.
pub fn print_series<W: Write>(out: &mut W, series: &[Series]) -> Result<()> {
    for s in series {
        serde_json::to_writer(&mut *out, s).context("serializing series")?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// Persist the whole list as a single pretty-printed JSON array.
#[instrument(level = "info", skip(path, series), fields(path = %path.as_ref().display()))]
pub fn write_json<P: AsRef<Path>>(path: P, series: &[Series]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let file = File::create(path).with_context(|| format!("creating output file {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, series)
        .with_context(|| format!("writing series to {:?}", path))?;
    writer.flush()?;
    info!(series = series.len(), "wrote JSON output");
    Ok(())
}

/// Apply the configured output side effects. The series list itself is
/// untouched.
pub fn emit(config: &Config, series: &[Series]) -> Result<()> {
    if config.print_series {
        let stdout = io::stdout();
        print_series(&mut stdout.lock(), series)?;
    }
    if config.write_json {
        write_json(&config.output_path, series)?;
    }
    Ok(())
}

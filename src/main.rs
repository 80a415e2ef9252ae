use anyhow::Result;
use clap::{Parser, ValueEnum};
use jodiscraper::config::{Config, Decoder, TimeFormat, Transfer};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Granularity {
    Month,
    Day,
}

/// Fetch the JODI gas dataset and regroup it into per-series JSON records.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// YAML config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Archive URL to fetch
    #[arg(long)]
    url: Option<String>,

    /// Country reference file
    #[arg(long)]
    countries: Option<PathBuf>,

    /// Download the archive to disk before extracting it
    #[arg(long)]
    download_file: bool,

    /// Where --download-file stores the archive
    #[arg(long)]
    archive_path: Option<PathBuf>,

    /// Read an existing archive instead of fetching one
    #[arg(long, conflicts_with = "download_file")]
    archive: Option<PathBuf>,

    /// Read the response body in one call instead of streaming it
    #[arg(long)]
    single_shot: bool,

    /// Positional CSV decoding, rows kept in file order
    #[arg(long)]
    minimal: bool,

    /// Emit full timestamps for time periods
    #[arg(long)]
    timestamp: bool,

    /// Time period resolution in the output
    #[arg(long, value_enum, conflicts_with = "timestamp")]
    granularity: Option<Granularity>,

    /// Write the series array to --output
    #[arg(long)]
    write_json: bool,

    /// Destination of the JSON array
    #[arg(long)]
    output: Option<PathBuf>,

    /// Don't print series to stdout
    #[arg(long)]
    quiet: bool,

    /// Whole-request HTTP timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config::default(),
        };

        if let Some(url) = self.url {
            cfg.url = url;
        }
        if let Some(path) = self.countries {
            cfg.countries_path = path;
        }
        if self.download_file {
            cfg.download_to_disk = true;
        }
        if let Some(path) = self.archive_path {
            cfg.archive_path = path;
        }
        if self.archive.is_some() {
            cfg.local_archive = self.archive;
        }
        if self.single_shot {
            cfg.transfer = Transfer::SingleShot;
        }
        if self.minimal {
            cfg.decoder = Decoder::Minimal;
        }
        if self.timestamp {
            cfg.time_format = TimeFormat::Timestamp;
        }
        match self.granularity {
            Some(Granularity::Month) => cfg.time_format = TimeFormat::Month,
            Some(Granularity::Day) => cfg.time_format = TimeFormat::Day,
            None => {}
        }
        if self.write_json {
            cfg.write_json = true;
        }
        if let Some(path) = self.output {
            cfg.output_path = path;
        }
        if self.quiet {
            cfg.print_series = false;
        }
        if let Some(secs) = self.timeout_secs {
            cfg.timeout_secs = secs;
        }
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // logs go to stderr; stdout carries the series
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config()?;
    info!(
        decoder = ?config.decoder,
        transfer = ?config.transfer,
        time_format = ?config.time_format,
        download_to_disk = config.download_to_disk,
        "startup"
    );

    tokio::select! {
        res = jodiscraper::run(&config) => match res? {
            Some(series) => {
                info!(series = series.len(), "all done");
                Ok(ExitCode::SUCCESS)
            }
            None => {
                error!("no archive to process; halting");
                Ok(ExitCode::FAILURE)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; cancelling");
            Ok(ExitCode::from(130))
        }
    }
}

// src/lib.rs

use anyhow::{Context, Result};
use tracing::{error, info, instrument};
use url::Url;

pub mod config;
pub mod emit;
pub mod error;
pub mod fetch;
pub mod labels;
pub mod process;
pub mod series;

use config::{Config, Decoder, TimeFormat, Transfer};
use error::JodiError;
use labels::CountryTable;
use process::ArchiveSource;
use series::Series;

/// Run the whole pipeline: load references, obtain the archive, extract,
/// group, emit.
///
/// Returns `Ok(None)` when the download-to-disk transfer fails; that failure
/// is logged and the run halts without an error. Every other failure is
/// returned.
#[instrument(level = "info", skip(config))]
pub async fn run(config: &Config) -> Result<Option<Vec<Series>>> {
    // before any network activity
    let countries = CountryTable::load(&config.countries_path)?;
    info!(countries = countries.len(), "reference tables loaded");

    let source = match acquire(config).await? {
        Some(source) => source,
        None => return Ok(None),
    };

    let decoder = config.decoder;
    let time_format = config.time_format;
    let series = tokio::task::spawn_blocking(move || {
        process_archive(source, decoder, &countries, time_format)
    })
    .await
    .context("archive processing task failed")??;

    emit::emit(config, &series)?;
    Ok(Some(series))
}

/// Extract, decode and group one archive.
pub fn process_archive(
    source: ArchiveSource,
    decoder: Decoder,
    countries: &CountryTable,
    time_format: TimeFormat,
) -> Result<Vec<Series>> {
    let data = source.data_file()?;
    info!(entry = %data.name, bytes = data.bytes.len(), ?decoder, "decoding data file");
    let reader = process::reader_for(decoder);
    let rows = reader.rows(&data)?;
    series::build_series(rows, countries, time_format)
}

async fn acquire(config: &Config) -> Result<Option<ArchiveSource>> {
    if let Some(path) = &config.local_archive {
        info!(path = %path.display(), "using local archive");
        return Ok(Some(ArchiveSource::Path(path.clone())));
    }

    let url = Url::parse(&config.url).with_context(|| format!("parsing URL {}", config.url))?;
    let client = fetch::client(config)?;

    if config.download_to_disk {
        return match fetch::zips::download_zip(&client, &url, &config.archive_path).await {
            Ok(path) => Ok(Some(ArchiveSource::Path(path))),
            Err(e) => {
                let err = JodiError::Download {
                    url: url.to_string(),
                    reason: format!("{:#}", e),
                };
                error!("There was an error: {}", err);
                Ok(None)
            }
        };
    }

    let bytes = match config.transfer {
        Transfer::Chunked => fetch::zips::stream_zip(&client, &url).await?,
        Transfer::SingleShot => fetch::zips::fetch_zip(&client, &url).await?,
    };
    Ok(Some(ArchiveSource::Memory(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fixtures::{csv, zip_bytes};
    use std::{fs, path::Path};
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,jodiscraper=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn write_fixtures(dir: &Path, rows: &[&str]) -> Result<Config> {
        let countries = dir.join("country_abbreviations.json");
        fs::write(
            &countries,
            r#"[{"abbreviation": "FR", "country": "France"}, {"abbreviation": "NO", "country": "Norway"}]"#,
        )?;
        let archive = dir.join("jodi_gas_csv_beta.zip");
        let content = csv(rows);
        fs::write(&archive, zip_bytes(&[("jodi_gas.csv", content.as_str())])?)?;

        Ok(Config {
            countries_path: countries,
            local_archive: Some(archive),
            print_series: false,
            write_json: true,
            output_path: dir.join("jodi_gas_series.json"),
            ..Config::default()
        })
    }

    #[tokio::test]
    async fn local_archive_end_to_end() -> Result<()> {
        init_test_logging();
        let dir = tempfile::tempdir()?;
        let config = write_fixtures(
            dir.path(),
            &[
                "FR,2021-02,NATGAS,EXPLNG,M3,120,1",
                "FR,2021-01,NATGAS,EXPLNG,M3,100,1",
                "NO,2021-01,NATGAS,INDPROD,TJ,7,2",
            ],
        )?;

        let series = run(&config).await?.expect("series");
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].series_id, r"joi-gas-data\FR\NATGAS\EXPLNG\M3\1");
        assert_eq!(
            series[0].points,
            vec![
                series::Point("2021-01".into(), 100.0),
                series::Point("2021-02".into(), 120.0)
            ]
        );

        let written: Vec<Series> = serde_json::from_slice(&fs::read(&config.output_path)?)?;
        assert_eq!(written, series);
        Ok(())
    }

    #[tokio::test]
    async fn minimal_decoder_with_timestamps() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config {
            decoder: Decoder::Minimal,
            time_format: TimeFormat::Timestamp,
            write_json: false,
            ..write_fixtures(dir.path(), &["NO,2021-01,NATGAS,INDPROD,TJ,7,2"])?
        };

        let series = run(&config).await?.expect("series");
        assert_eq!(series[0].points[0].0, "2021-01-01T00:00:00");
        assert_eq!(series[0].fields.country.as_deref(), Some("Norway"));
        assert!(!config.output_path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn missing_reference_file_fails_first() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config {
            countries_path: dir.path().join("absent.json"),
            // unroutable if reached
            url: "http://127.0.0.1:9/never.zip".into(),
            ..Config::default()
        };
        let err = run(&config).await.unwrap_err();
        assert!(format!("{:#}", err).contains("country reference file"));
        Ok(())
    }

    #[tokio::test]
    async fn disk_download_failure_halts_gracefully() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let config = Config {
            url: format!("http://{}/jodi_gas_csv_beta.zip", addr),
            download_to_disk: true,
            archive_path: dir.path().join("jodi_gas_csv_beta.zip"),
            local_archive: None,
            ..write_fixtures(dir.path(), &[])?
        };
        fs::remove_file(&config.archive_path)?;

        assert!(run(&config).await?.is_none());
        assert!(!config.archive_path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn memory_fetch_failure_propagates() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let config = Config {
            url: format!("http://{}/jodi_gas_csv_beta.zip", addr),
            local_archive: None,
            ..write_fixtures(dir.path(), &[])?
        };
        assert!(run(&config).await.is_err());
        Ok(())
    }

    #[test]
    fn unknown_flow_code_aborts_processing() -> Result<()> {
        let content = csv(&["FR,2021-01,NATGAS,PIPEDREAM,M3,1,1"]);
        let bytes = zip_bytes(&[("jodi_gas.csv", content.as_str())])?;
        let err = process_archive(
            ArchiveSource::Memory(bytes),
            Decoder::Structured,
            &CountryTable::default(),
            TimeFormat::Month,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JodiError>(),
            Some(JodiError::UnknownCode {
                vocabulary: "flow breakdown",
                ..
            })
        ));
        Ok(())
    }
}

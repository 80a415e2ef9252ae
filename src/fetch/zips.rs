// src/fetch/zips.rs

use anyhow::{Context, Result};
use futures_util::StreamExt;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info, instrument};
use url::Url;

use super::progress_bar;
use crate::process::utils::capped_capacity;

async fn get(client: &Client, url: &Url) -> Result<Response> {
    client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))
}

/// Fetch the whole archive into memory with a single body read.
#[instrument(level = "info", skip(client, url), fields(url = %url))]
pub async fn fetch_zip(client: &Client, url: &Url) -> Result<Vec<u8>> {
    let resp = get(client, url).await?;
    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("reading body from {}", url))?;
    info!(bytes = bytes.len(), "Download completed");
    Ok(bytes.to_vec())
}

/// Stream the archive into memory chunk by chunk, reporting progress against
/// the response's `Content-Length`.
#[instrument(level = "info", skip(client, url), fields(url = %url))]
pub async fn stream_zip(client: &Client, url: &Url) -> Result<Vec<u8>> {
    let resp = get(client, url).await?;
    let total = resp.content_length();
    debug!(?total, "response size");

    let pb = progress_bar(total);
    let mut zip_data = Vec::with_capacity(capped_capacity(total.unwrap_or(0)));
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Failed to read chunk from response")?;
        zip_data.extend_from_slice(&chunk);
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("done");

    info!(bytes = zip_data.len(), "Download completed");
    Ok(zip_data)
}

/// Stream the archive to `dest`, reporting progress. A partially written file
/// is removed when the transfer fails.
#[instrument(level = "info", skip(client, url, dest), fields(url = %url, dest = %dest.as_ref().display()))]
pub async fn download_zip(client: &Client, url: &Url, dest: impl AsRef<Path>) -> Result<PathBuf> {
    let dest = dest.as_ref().to_path_buf();
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {:?}", parent))?;
    }

    match stream_to_file(client, url, &dest).await {
        Ok(written) => {
            info!(bytes = written, "Download completed");
            Ok(dest)
        }
        Err(e) => {
            let _ = fs::remove_file(&dest).await;
            Err(e)
        }
    }
}

async fn stream_to_file(client: &Client, url: &Url, dest: &Path) -> Result<u64> {
    let resp = get(client, url).await?;
    let pb = progress_bar(resp.content_length());

    let mut file = fs::File::create(dest)
        .await
        .with_context(|| format!("creating {:?}", dest))?;
    let mut written = 0u64;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Failed to read chunk from response")?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("writing {:?}", dest))?;
        written += chunk.len() as u64;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;
    pb.finish_with_message("done");
    Ok(written)
}

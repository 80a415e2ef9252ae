// src/fetch/mod.rs

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;

use crate::config::Config;

pub mod zips;

/// HTTP client bounded by the configured request and connect timeouts.
pub fn client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .build()
        .context("building HTTP client")
}

/// Byte progress bar against `Content-Length`, or a spinner when the server
/// does not send one.
fn progress_bar(total: Option<u64>) -> ProgressBar {
    let (pb, template) = match total {
        Some(len) => (
            ProgressBar::new(len),
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}",
        ),
        None => (
            ProgressBar::new_spinner(),
            "{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec}) {msg}",
        ),
    };
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

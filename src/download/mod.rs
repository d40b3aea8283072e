use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::config::Config;

/// Why a download stopped.
///
/// A failure after the first chunk leaves the partially written file on disk; there is no
/// temporary file or rename step.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("server answered HTTP {0}")]
    Status(StatusCode),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("no data received for {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a completed download
#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    pub bytes_written: u64,

    /// Content-Length announced by the server, when it announced a non-zero one
    pub total_expected: Option<u64>,

    pub path: PathBuf,
}

impl DownloadOutcome {
    pub fn progress(&self) -> Option<f64> {
        progress_fraction(self.bytes_written, self.total_expected)
    }
}

/// written/total, or `None` when the total is unknown or zero
pub fn progress_fraction(written: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(total) if total > 0 => Some(written as f64 / total as f64),
        _ => None,
    }
}

/// Streams a media URL to a local file
pub struct MediaFetcher {
    client: Client,
    chunk_size: usize,
    idle_timeout: Duration,
    show_progress: bool,
}

impl MediaFetcher {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            chunk_size: config.download.chunk_size,
            idle_timeout: config.http.download_idle_timeout(),
            show_progress: true,
        }
    }

    /// Hide the progress bar
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.show_progress = !quiet;
        self
    }

    /// Stream `url` into `path`. Non-2xx answers fail before the file is created.
    ///
    /// The idle timeout bounds the wait for the response headers and for every chunk after.
    pub async fn fetch(&self, url: &str, path: &Path) -> Result<DownloadOutcome, FetchError> {
        tracing::info!(url, path = %path.display(), "Starting download");

        let response = tokio::time::timeout(self.idle_timeout, self.client.get(url).send())
            .await
            .map_err(|_| FetchError::Timeout(self.idle_timeout))??;
        let status = response.status();

        if !status.is_success() {
            tracing::warn!(url, status = %status, "Download rejected");
            return Err(FetchError::Status(status));
        }

        let total_expected = response.content_length().filter(|len| *len > 0);
        let progress = self.progress_bar(total_expected);

        let file = fs_err::tokio::File::create(path).await?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);
        let mut stream = response.bytes_stream();
        let mut bytes_written = 0u64;

        loop {
            let next = tokio::time::timeout(self.idle_timeout, stream.next())
                .await
                .map_err(|_| FetchError::Timeout(self.idle_timeout))?;

            let Some(chunk) = next else {
                break;
            };

            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            bytes_written += chunk.len() as u64;
            progress.set_position(bytes_written);
        }

        writer.flush().await?;
        progress.finish_with_message("Download complete");

        tracing::info!(
            path = %path.display(),
            bytes_written,
            total_expected = ?total_expected,
            "Download finished"
        );

        Ok(DownloadOutcome {
            bytes_written,
            total_expected,
            path: path.to_path_buf(),
        })
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("#>-"),
                );
                bar
            }
            // Size unknown, progress is indeterminate
            None => {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} [{elapsed_precise}] {bytes} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                spinner
            }
        };

        progress.set_message("Downloading video...");
        progress
    }
}

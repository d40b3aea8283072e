use anyhow::{Context, Result};
use console::style;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::Config;
use crate::resolver::VideoResolver;
use crate::utils::format_duration;

pub mod stages;

pub use stages::PublishOutcome;

/// Files produced by one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Shared by every file of the run, `%Y%m%d-%H%M`
    pub timestamp: String,
    pub audio: PathBuf,
    pub transcript: PathBuf,
    pub summary: PathBuf,
    pub publish: PublishOutcome,
}

/// Download -> audio -> transcript -> summary -> git, each step gating the next
pub struct Pipeline<'c> {
    config: &'c Config,
    quiet: bool,
}

impl<'c> Pipeline<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config, quiet: false }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub async fn run(&self, share_link: &str) -> Result<PipelineReport> {
        let started = Instant::now();
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M").to_string();
        let pipeline = &self.config.pipeline;

        tracing::info!(timestamp = %timestamp, "Starting pipeline");
        self.prepare_directories().await?;

        self.banner(1, "Downloading video");
        let report = VideoResolver::new(self.config)
            .quiet(self.quiet)
            .resolve_and_download(share_link, &self.config.download.output_dir, None)
            .await
            .context("Download step failed")?;
        println!("   {} {}", style("saved").green(), report.outcome.path.display());

        self.banner(2, "Extracting audio");
        let audio = stages::convert_to_mp3(&report.outcome.path)
            .await
            .context("Audio extraction step failed")?;
        println!("   {} {}", style("saved").green(), audio.display());

        self.banner(3, "Transcribing");
        let transcript = pipeline.news_dir.join(format!("{}.txt", timestamp));
        let parts = stages::transcribe(pipeline, &audio, &transcript)
            .await
            .context("Transcription step failed")?;
        println!("   {} {} ({} segments)", style("saved").green(), transcript.display(), parts);

        self.banner(4, "Summarizing");
        let summary = stages::summarize(pipeline, &transcript, &timestamp)
            .await
            .context("Summarization step failed")?;
        println!("   {} {}", style("saved").green(), summary.display());

        self.banner(5, "Publishing");
        let publish = stages::publish(pipeline, &timestamp)
            .await
            .context("Publishing step failed")?;

        tracing::info!(
            timestamp = %timestamp,
            elapsed = %format_duration(started.elapsed().as_secs_f64()),
            "Pipeline finished"
        );

        Ok(PipelineReport {
            timestamp,
            audio,
            transcript,
            summary,
            publish,
        })
    }

    async fn prepare_directories(&self) -> Result<()> {
        for dir in [
            &self.config.download.output_dir,
            &self.config.pipeline.segment_dir,
            &self.config.pipeline.news_dir,
        ] {
            fs_err::tokio::create_dir_all(dir).await?;
        }
        Ok(())
    }

    fn banner(&self, step: u8, title: &str) {
        if !self.quiet {
            println!("\n{} {}", style(format!("[{}/5]", step)).cyan().bold(), style(title).bold());
        }
    }
}

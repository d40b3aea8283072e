//! Douyin Fetch - A Rust CLI tool for resolving Douyin share links into playable media
//!
//! This library turns a share link (full or shortened) into a direct, watermark-free media URL
//! by walking an ordered chain of resolution strategies, and streams the result to disk.

pub mod cli;
pub mod config;
pub mod download;
pub mod extractors;
pub mod output;
pub mod pipeline;
pub mod resolver;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use download::{DownloadOutcome, FetchError, MediaFetcher};
pub use extractors::{ResolutionCandidate, SourceStrategy, StrategyChain, StrategyResult, VideoId};
pub use resolver::{Resolution, ShareLink, VideoResolver};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Failures the resolver reports to its caller.
///
/// Strategy-level problems never show up here; they are logged and swallowed inside the chain.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("Invalid share link: {0}")]
    InvalidShareLink(String),

    #[error("Could not extract a video identifier from: {0}")]
    IdentifierNotFound(String),

    #[error("No strategy could resolve a media URL for video {0}")]
    NotFound(VideoId),

    #[error("Download failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to build HTTP session: {0}")]
    Session(#[from] reqwest::Error),
}

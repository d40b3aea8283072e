use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "douyin-fetch",
    about = "Douyin Fetch - Resolve Douyin share links into direct, watermark-free video downloads",
    version,
    long_about = "A CLI tool that turns a Douyin share link (full or shortened, or the whole pasted share text) into a direct media URL by trying the mobile API, the mobile share page and the desktop page in turn, then downloads the video. The pipeline command continues with audio extraction, transcription, summarization and git publishing."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (defaults to ./douyin-fetch.yaml, then the user config directory)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a share link and download the video
    Download {
        /// Share link or pasted share text (prompted for when absent)
        #[arg(short, long, value_name = "URL", env = "DOUYIN_URL")]
        url: Option<String>,

        /// Output directory (defaults to the configured download directory)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// File name without extension (defaults to "<title>_<id>")
        #[arg(short, long, value_name = "NAME")]
        name: Option<String>,
    },

    /// Resolve a share link and print the media URL without downloading
    Resolve {
        /// Share link or pasted share text (prompted for when absent)
        #[arg(short, long, value_name = "URL", env = "DOUYIN_URL")]
        url: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write the result to a file instead of the console
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Download, transcribe, summarize and publish in one run
    Pipeline {
        /// Share link or pasted share text
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Show or initialize the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write the default configuration to the config path
        #[arg(long, conflicts_with = "show")]
        init: bool,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON document
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

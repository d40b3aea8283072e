use anyhow::{Context, Result};
use clap::Parser;
use console::{style, Term};
use std::io::BufRead;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use douyin_fetch::cli::{Cli, Commands};
use douyin_fetch::config::Config;
use douyin_fetch::output;
use douyin_fetch::pipeline::{Pipeline, PublishOutcome};
use douyin_fetch::resolver::VideoResolver;
use douyin_fetch::utils;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    // Initializing must not require an existing file at the target path
    if let Commands::Config { init: true, .. } = cli.command {
        let path = match cli.config {
            Some(path) => path,
            None => Config::default_path().context("Could not determine config directory")?,
        };
        Config::default().save(&path)?;
        println!("Default configuration written to: {}", path.display());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Download { url, output, name } => {
            let share_link = share_link_or_prompt(url)?;
            let output_dir = output.unwrap_or_else(|| config.download.output_dir.clone());

            println!("Processing: {}", share_link);

            let report = VideoResolver::new(&config)
                .quiet(cli.quiet)
                .resolve_and_download(&share_link, &output_dir, name.as_deref())
                .await?;

            let resolution = &report.resolution;
            println!("Title:  {}", resolution.title());
            println!("Author: {}", resolution.author());
            println!("Source: {} ({})", resolution.candidate.media_url, resolution.strategy);
            println!(
                "{} {} ({})",
                style("Video saved to:").green().bold(),
                report.outcome.path.display(),
                utils::format_file_size(report.outcome.bytes_written)
            );
        }
        Commands::Resolve { url, format, output } => {
            let share_link = share_link_or_prompt(url)?;

            let resolution = VideoResolver::new(&config)
                .quiet(cli.quiet)
                .resolve(&share_link)
                .await?;

            match output {
                Some(path) => {
                    output::save_to_file(&resolution, &path, &format).await?;
                    println!("Resolution saved to: {}", path.display());
                }
                None => output::print_to_console(&resolution, &format)?,
            }
        }
        Commands::Pipeline { url } => {
            // Check for required external tools (non-fatal)
            let missing_deps = utils::check_dependencies(&config.pipeline.transcriber).await;
            if !missing_deps.is_empty() {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in missing_deps {
                    eprintln!("   • {}", dep);
                }
                eprintln!("   (Continuing anyway - tools may be available)");
            }

            let report = Pipeline::new(&config).quiet(cli.quiet).run(&url).await?;

            println!("\n{}", style("All steps complete").green().bold());
            println!("Run timestamp: {}", report.timestamp);
            println!("  • {}", report.audio.display());
            println!("  • {}", report.transcript.display());
            println!("  • {}", report.summary.display());
            match report.publish {
                PublishOutcome::Disabled => println!("Git publishing disabled"),
                PublishOutcome::NothingToCommit => println!("Nothing to commit"),
                PublishOutcome::Committed => println!("Committed (push disabled)"),
                PublishOutcome::Pushed { branch } => println!("Committed and pushed to origin/{}", branch),
            }
        }
        Commands::Config { .. } => config.display(),
    }

    Ok(())
}

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose { "douyin_fetch=debug" } else { "douyin_fetch=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Use the given link, or ask for one on the terminal
fn share_link_or_prompt(url: Option<String>) -> Result<String> {
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
        return Ok(url);
    }

    println!("Please provide a Douyin share link:");
    println!("  1. Argument:    douyin-fetch download --url 'https://v.douyin.com/xxx/'");
    println!("  2. Environment: DOUYIN_URL='https://v.douyin.com/xxx/' douyin-fetch download");
    println!("  3. Interactive: paste it below");

    let term = Term::stdout();
    term.write_str("Share link: ")?;
    term.flush()?;

    // Term only reads from a terminal; piped input goes through stdin directly
    let line = if term.is_term() {
        term.read_line().context("Failed to read share link")?
    } else {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read share link")?;
        line
    };

    let line = line.trim().to_string();
    if line.is_empty() {
        anyhow::bail!("No share link provided");
    }
    Ok(line)
}

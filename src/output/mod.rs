use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::resolver::Resolution;
use crate::utils::extract_domain;

/// Save a resolution to file
pub async fn save_to_file(resolution: &Resolution, path: &Path, format: &OutputFormat) -> Result<()> {
    let content = render(resolution, format)?;
    fs_err::tokio::write(path, content).await?;
    Ok(())
}

/// Print a resolution to console
pub fn print_to_console(resolution: &Resolution, format: &OutputFormat) -> Result<()> {
    println!("{}", render(resolution, format)?);
    Ok(())
}

fn render(resolution: &Resolution, format: &OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => format_as_text(resolution),
        OutputFormat::Json => format_as_json(resolution)?,
    })
}

pub fn format_as_text(resolution: &Resolution) -> String {
    let candidate = &resolution.candidate;
    let mut lines = vec![
        format!("Video ID:  {}", resolution.video_id),
        format!("Title:     {}", resolution.title()),
        format!("Author:    {}", resolution.author()),
        format!("Strategy:  {}", resolution.strategy),
        format!("Media URL: {}", candidate.media_url),
    ];

    if let Some(host) = extract_domain(&candidate.media_url) {
        lines.push(format!("Host:      {}", host));
    }
    if let Some(cover) = &candidate.cover_url {
        lines.push(format!("Cover:     {}", cover));
    }
    if candidate.watermarked {
        lines.push("Watermark: removed (URL rewritten)".to_string());
    }
    if resolution.resolved_link != resolution.share_link {
        lines.push(format!("Redirect:  {} -> {}", resolution.share_link, resolution.resolved_link));
    }

    lines.join("\n")
}

pub fn format_as_json(resolution: &Resolution) -> Result<String> {
    Ok(serde_json::to_string_pretty(resolution)?)
}

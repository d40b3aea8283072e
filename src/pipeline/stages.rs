use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::{PipelineConfig, CONTENT_PLACEHOLDER};

/// Outcome of the publishing step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Disabled,
    NothingToCommit,
    Committed,
    Pushed { branch: String },
}

/// Extract mono 16 kHz audio with ffmpeg and delete the video afterwards
pub async fn convert_to_mp3(video: &Path) -> Result<PathBuf> {
    let audio = video.with_extension("mp3");
    tracing::debug!("Converting {} to MP3", video.display());

    let input = video.to_string_lossy().into_owned();
    let target = audio.to_string_lossy().into_owned();

    let output = Command::new("ffmpeg")
        .args([
            "-i", input.as_str(),
            "-vn",
            "-acodec", "libmp3lame",
            "-ar", "16000",
            "-ac", "1",
            "-q:a", "2",
            "-y",
            target.as_str(),
        ])
        .output()
        .await
        .context("Failed to run ffmpeg")?;

    ensure_success("ffmpeg", &output)?;

    fs_err::tokio::remove_file(video).await?;
    Ok(audio)
}

/// File name prefix of the audio parts cut by [`split_audio`]
const SEGMENT_PREFIX: &str = "part_";

/// Cut the audio into fixed-length parts inside the segment directory.
///
/// Parts left over from an earlier run are removed first.
pub async fn split_audio(config: &PipelineConfig, audio: &Path) -> Result<Vec<PathBuf>> {
    for stale in segment_parts(&config.segment_dir).await? {
        fs_err::tokio::remove_file(stale).await?;
    }

    let input = audio.to_string_lossy().into_owned();
    let pattern = config
        .segment_dir
        .join(format!("{}%03d.mp3", SEGMENT_PREFIX))
        .to_string_lossy()
        .into_owned();
    let segment_time = config.segment_seconds.to_string();

    let output = Command::new("ffmpeg")
        .args([
            "-i", input.as_str(),
            "-f", "segment",
            "-segment_time", segment_time.as_str(),
            "-c", "copy",
            "-y",
            pattern.as_str(),
        ])
        .output()
        .await
        .context("Failed to run ffmpeg")?;

    ensure_success("ffmpeg", &output)?;

    let parts = segment_parts(&config.segment_dir).await?;
    if parts.is_empty() {
        anyhow::bail!("ffmpeg produced no audio segments");
    }
    Ok(parts)
}

/// Audio parts present in `dir`, in playback order
pub async fn segment_parts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs_err::tokio::read_dir(dir).await?;
    let mut parts = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_segment_part(&path) {
            parts.push(path);
        }
    }

    parts.sort();
    Ok(parts)
}

fn is_segment_part(path: &Path) -> bool {
    let named_part = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(SEGMENT_PREFIX));

    named_part && path.extension().is_some_and(|ext| ext == "mp3")
}

/// Split the audio, transcribe the parts in order and write the joined text to `transcript`.
///
/// Returns the number of parts transcribed.
pub async fn transcribe(config: &PipelineConfig, audio: &Path, transcript: &Path) -> Result<usize> {
    let parts = split_audio(config, audio).await?;
    tracing::info!(parts = parts.len(), "Audio split into segments");

    let mut texts = Vec::with_capacity(parts.len());
    for (index, part) in parts.iter().enumerate() {
        tracing::debug!(part = index + 1, total = parts.len(), "Transcribing {}", part.display());
        texts.push(transcribe_part(config, part).await?);
    }

    fs_err::tokio::write(transcript, join_transcripts(&texts)).await?;
    Ok(parts.len())
}

/// Run the transcriber on one part and return the text it wrote
async fn transcribe_part(config: &PipelineConfig, part: &Path) -> Result<String> {
    let output = Command::new(&config.transcriber)
        .arg(part)
        .args(["--model", config.whisper_model.as_str()])
        .args(["--language", config.language.as_str()])
        .args(["--output_format", "txt"])
        .arg("--output_dir")
        .arg(&config.segment_dir)
        .output()
        .await
        .with_context(|| format!("Failed to run {}", config.transcriber))?;

    ensure_success(&config.transcriber, &output)?;

    let mut produced_name = part
        .file_stem()
        .context("Audio segment has no file name")?
        .to_os_string();
    produced_name.push(".txt");
    let produced = config.segment_dir.join(produced_name);

    let text = fs_err::tokio::read_to_string(&produced)
        .await
        .context("Transcriber did not produce the expected text file")?;
    fs_err::tokio::remove_file(&produced).await?;

    Ok(text)
}

/// One line per part, in order, blank parts dropped
pub fn join_transcripts(texts: &[String]) -> String {
    texts
        .iter()
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Substitute the source text into the prompt template
pub fn render_prompt(template: &str, content: &str) -> String {
    template.replace(CONTENT_PLACEHOLDER, content)
}

/// First non-empty line that is not a heading marker or rule, stripped of markdown decoration
pub fn extract_summary_title(summary: &str) -> Option<String> {
    summary
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("---"))
        .map(|line| line.trim_matches(|c| matches!(c, '*' | '#' | ' ' | '`')).to_string())
        .filter(|title| !title.is_empty())
}

/// `<timestamp>_<title>.md`, keeping only characters that are safe in any file name
pub fn summary_file_name(timestamp: &str, title: Option<&str>) -> String {
    let safe_title = title
        .map(|title| {
            title
                .chars()
                .filter(|c| c.is_alphanumeric() || matches!(*c, ' ' | '-' | '_'))
                .collect::<String>()
                .trim()
                .replace(' ', "_")
        })
        .filter(|title| !title.is_empty());

    match safe_title {
        Some(title) => format!("{}_{}.md", timestamp, title),
        None => format!("{}_summary.md", timestamp),
    }
}

/// Feed the rendered prompt to the summarizer and save its answer as markdown
pub async fn summarize(config: &PipelineConfig, transcript: &Path, timestamp: &str) -> Result<PathBuf> {
    let content = fs_err::tokio::read_to_string(transcript).await?;
    let prompt = render_prompt(&config.summary_prompt, &content);

    let (program, args) = config
        .summarizer
        .split_first()
        .context("Summarizer command is empty")?;

    tracing::debug!(program, prompt_len = prompt.len(), "Running summarizer");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start summarizer {}", program))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(prompt.as_bytes()).await?;
    }

    let output = child.wait_with_output().await?;
    ensure_success(program, &output)?;

    let summary = String::from_utf8(output.stdout).context("Summarizer output is not UTF-8")?;
    if summary.trim().is_empty() {
        anyhow::bail!("Summarizer produced no output");
    }

    let title = extract_summary_title(&summary);
    let path = config
        .news_dir
        .join(summary_file_name(timestamp, title.as_deref()));

    fs_err::tokio::write(&path, summary).await?;
    Ok(path)
}

/// `git add`, `git commit`, `git push`; a failing step stops the ones after it
pub async fn publish(config: &PipelineConfig, timestamp: &str) -> Result<PublishOutcome> {
    if !config.git_auto_commit {
        return Ok(PublishOutcome::Disabled);
    }

    let status = run_git(&["status", "--porcelain"]).await?;
    if status.trim().is_empty() {
        return Ok(PublishOutcome::NothingToCommit);
    }

    let publish_dir = config.publish_dir.to_string_lossy();
    let message = commit_message(timestamp);
    run_git(&["add", &*publish_dir]).await?;
    run_git(&["commit", "-m", message.as_str()]).await?;

    if !config.git_auto_push {
        return Ok(PublishOutcome::Committed);
    }

    let branch = run_git(&["branch", "--show-current"]).await?.trim().to_string();
    if branch.is_empty() {
        anyhow::bail!("Cannot push from a detached HEAD");
    }
    run_git(&["push", "origin", branch.as_str()]).await?;

    Ok(PublishOutcome::Pushed { branch })
}

pub fn commit_message(timestamp: &str) -> String {
    format!("news update: {}", timestamp)
}

async fn run_git(args: &[&str]) -> Result<String> {
    tracing::debug!(?args, "Running git");

    let output = Command::new("git")
        .args(args)
        .output()
        .await
        .context("Failed to run git")?;

    ensure_success("git", &output)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn ensure_success(program: &str, output: &Output) -> Result<()> {
    if !output.status.success() {
        let error = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("{} failed: {}", program, error.trim());
    }
    Ok(())
}

use reqwest::Client;
use serde::Serialize;
use std::fmt;
use std::path::Path;

pub mod session;

use crate::config::Config;
use crate::download::{DownloadOutcome, FetchError, MediaFetcher};
use crate::extractors::{patterns, redirect, ChainOutcome, ResolutionCandidate, StrategyChain, VideoId};
use crate::utils;
use crate::ResolveError;

/// User input, narrowed down to the link (or bare identifier) inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink(String);

impl ShareLink {
    /// Accepts a URL, pasted share text containing a URL, or a bare identifier
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ResolveError::InvalidShareLink("empty input".to_string()));
        }

        if let Some(url) = patterns::find_share_url(trimmed) {
            return Ok(Self(url.to_string()));
        }

        if patterns::is_bare_identifier(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }

        Err(ResolveError::InvalidShareLink(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An accepted candidate together with how it was reached
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub share_link: String,

    /// Link after following short-link redirects
    pub resolved_link: String,

    pub video_id: VideoId,

    /// Name of the strategy that produced the candidate
    pub strategy: &'static str,

    pub candidate: ResolutionCandidate,
}

impl Resolution {
    pub fn title(&self) -> String {
        self.candidate.display_title(&self.video_id)
    }

    pub fn author(&self) -> &str {
        self.candidate.display_author()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub resolution: Resolution,
    pub outcome: DownloadOutcome,
}

/// Entry point of the resolution engine
pub struct VideoResolver<'c> {
    config: &'c Config,
    quiet: bool,
}

impl<'c> VideoResolver<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config, quiet: false }
    }

    /// Suppress progress bars
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Resolve a share link to a media URL without downloading anything
    pub async fn resolve(&self, share_link: &str) -> Result<Resolution, ResolveError> {
        let client = session::build_client(&self.config.http)?;
        self.resolve_in_session(&client, share_link).await
    }

    /// Resolve a share link and stream the media into `output_dir`.
    ///
    /// Nothing is written unless a strategy resolved the link.
    pub async fn resolve_and_download(
        &self,
        share_link: &str,
        output_dir: &Path,
        custom_name: Option<&str>,
    ) -> Result<DownloadReport, ResolveError> {
        let client = session::build_client(&self.config.http)?;
        let resolution = self.resolve_in_session(&client, share_link).await?;

        fs_err::tokio::create_dir_all(output_dir)
            .await
            .map_err(FetchError::from)?;

        let filename = utils::media_filename(
            &resolution.title(),
            resolution.video_id.as_str(),
            custom_name,
            &self.config.download.extension,
        );
        let path = output_dir.join(filename);

        let outcome = MediaFetcher::new(client, self.config)
            .quiet(self.quiet)
            .fetch(&resolution.candidate.media_url, &path)
            .await?;

        Ok(DownloadReport { resolution, outcome })
    }

    async fn resolve_in_session(&self, client: &Client, raw: &str) -> Result<Resolution, ResolveError> {
        let link = ShareLink::parse(raw)?;
        tracing::info!(link = %link, "Resolving share link");

        let http = &self.config.http;
        let resolved_link =
            redirect::resolve_short_link(client, link.as_str(), &http.short_link_hosts, http.redirect_timeout())
                .await;

        let video_id = patterns::extract_identifier(&resolved_link)
            .and_then(|found| {
                tracing::debug!(rule = found.rule, "Identifier rule matched");
                VideoId::parse(found.value)
            })
            .ok_or_else(|| ResolveError::IdentifierNotFound(resolved_link.clone()))?;

        tracing::info!(video_id = %video_id, "Extracted video identifier");

        let chain = StrategyChain::standard(client, self.config);
        match chain.run(&video_id).await {
            ChainOutcome::Resolved { strategy, candidate } => Ok(Resolution {
                share_link: link.to_string(),
                resolved_link,
                video_id,
                strategy,
                candidate,
            }),
            ChainOutcome::NotFound => Err(ResolveError::NotFound(video_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_link_from_share_text() {
        let link = ShareLink::parse("  7.43 复制打开抖音，看看【作品】 https://v.douyin.com/iRNBho6u/ 复制此链接 ").unwrap();
        assert_eq!(link.as_str(), "https://v.douyin.com/iRNBho6u/");
    }

    #[test]
    fn test_share_link_bare_identifier() {
        let link = ShareLink::parse("7301234567890123456").unwrap();
        assert_eq!(link.as_str(), "7301234567890123456");
    }

    #[test]
    fn test_share_link_rejects_garbage() {
        assert!(matches!(ShareLink::parse("   "), Err(ResolveError::InvalidShareLink(_))));
        assert!(matches!(ShareLink::parse("hello world"), Err(ResolveError::InvalidShareLink(_))));
        assert!(matches!(ShareLink::parse("foo video/12"), Err(ResolveError::InvalidShareLink(_))));
        assert!(matches!(ShareLink::parse("12345678901234"), Err(ResolveError::InvalidShareLink(_))));
    }
}

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

pub mod desktop_page;
pub mod mobile_api;
pub mod mobile_page;
pub mod patterns;
pub mod redirect;
pub mod tree;

use crate::config::Config;
use crate::Result;

/// Platform-assigned numeric video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Accepts a non-empty run of ASCII digits
    pub fn parse(raw: &str) -> Option<Self> {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Title used when no strategy produced one
    pub fn default_title(&self) -> String {
        format!("douyin_{}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Author shown when no strategy produced one
pub const DEFAULT_AUTHOR: &str = "unknown";

/// A structurally valid media URL plus whatever display metadata came with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionCandidate {
    /// Absolute http(s) URL, already rewritten to the watermark-free variant
    pub media_url: String,

    pub title: Option<String>,

    pub author: Option<String>,

    pub cover_url: Option<String>,

    /// The source handed out the overlay variant and the URL was rewritten
    pub watermarked: bool,
}

impl ResolutionCandidate {
    /// Build a candidate from a URL as the source reported it.
    ///
    /// The watermark rewrite is applied here so that every strategy gets it. Returns `None`
    /// unless the result is an absolute http(s) URL.
    pub fn from_source_url(raw: &str) -> Option<Self> {
        let watermarked = patterns::is_watermarked(raw);
        let media_url = patterns::remove_watermark(raw.trim());

        validate_url(&media_url).ok()?;

        Some(Self {
            media_url,
            title: None,
            author: None,
            cover_url: None,
            watermarked,
        })
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn with_cover(mut self, cover_url: Option<String>) -> Self {
        self.cover_url = cover_url;
        self
    }

    pub fn display_title(&self, id: &VideoId) -> String {
        self.title.clone().unwrap_or_else(|| id.default_title())
    }

    pub fn display_author(&self) -> &str {
        self.author.as_deref().unwrap_or(DEFAULT_AUTHOR)
    }
}

/// What a single strategy attempt produced
#[derive(Debug)]
pub enum StrategyResult {
    Resolved(ResolutionCandidate),

    /// Nothing found here; a later strategy may still succeed
    NotApplicable,

    /// Network or protocol failure; logged, the chain moves on
    TransientError(anyhow::Error),
}

/// One self-contained way of turning an identifier into a media URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceStrategy: Send + Sync {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    /// Try to resolve the identifier. Must not fail; errors become `TransientError`.
    async fn attempt(&self, id: &VideoId) -> StrategyResult;
}

/// Terminal value of a chain run
#[derive(Debug)]
pub enum ChainOutcome {
    Resolved {
        strategy: &'static str,
        candidate: ResolutionCandidate,
    },
    NotFound,
}

/// Ordered list of strategies, tried one at a time until one resolves
pub struct StrategyChain {
    strategies: Vec<Box<dyn SourceStrategy>>,
}

impl StrategyChain {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Mobile API, then mobile page, then desktop page
    pub fn standard(client: &Client, config: &Config) -> Self {
        let mut chain = Self::new();

        chain.register(Box::new(mobile_api::MobileApiStrategy::new(client.clone(), config)));
        chain.register(Box::new(mobile_page::MobilePageStrategy::new(client.clone(), config)));
        chain.register(Box::new(desktop_page::DesktopPageStrategy::new(client.clone(), config)));

        chain
    }

    /// Append a strategy to the end of the chain
    pub fn register(&mut self, strategy: Box<dyn SourceStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the strategies in order and stop at the first resolved candidate
    pub async fn run(&self, id: &VideoId) -> ChainOutcome {
        for strategy in &self.strategies {
            let name = strategy.name();
            tracing::debug!(video_id = %id, strategy = name, "Trying strategy");

            match strategy.attempt(id).await {
                StrategyResult::Resolved(candidate) => {
                    tracing::info!(
                        video_id = %id,
                        strategy = name,
                        url = %candidate.media_url,
                        "Resolved media URL"
                    );
                    return ChainOutcome::Resolved {
                        strategy: name,
                        candidate,
                    };
                }
                StrategyResult::NotApplicable => {
                    tracing::debug!(video_id = %id, strategy = name, "No match, falling through");
                }
                StrategyResult::TransientError(error) => {
                    tracing::warn!(video_id = %id, strategy = name, error = %error, "Strategy failed");
                }
            }
        }

        tracing::warn!(video_id = %id, "All strategies exhausted");
        ChainOutcome::NotFound
    }
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::new()
    }
}

/// GET a page and return its body, or `None` for a non-200 answer
pub(crate) async fn fetch_page(
    client: &Client,
    url: &str,
    accept: &'static str,
    timeout: Duration,
) -> Result<Option<String>> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, accept)
        .timeout(timeout)
        .send()
        .await?;

    let status = response.status();
    tracing::debug!(url, status = %status, "Page response");

    if status != StatusCode::OK {
        return Ok(None);
    }

    let body = response.text().await?;
    tracing::debug!(url, length = body.len(), "Page body received");

    Ok(Some(body))
}

/// Validate and normalize URLs
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed)
}

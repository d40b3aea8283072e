use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::patterns;
use super::{fetch_page, ResolutionCandidate, SourceStrategy, StrategyResult, VideoId};
use crate::config::{render_endpoint, Config};
use crate::Result;

pub(crate) const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Scrapes the mobile share page with the media-URL pattern rules
pub struct MobilePageStrategy {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl MobilePageStrategy {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            endpoint: config.endpoints.mobile_page.clone(),
            timeout: config.http.page_timeout(),
        }
    }

    async fn scrape(&self, id: &VideoId) -> Result<Option<ResolutionCandidate>> {
        let url = render_endpoint(&self.endpoint, id.as_str());

        let Some(body) = fetch_page(&self.client, &url, HTML_ACCEPT, self.timeout).await? else {
            return Ok(None);
        };

        Ok(candidate_from_page(&body))
    }
}

/// Pull a candidate out of a mobile page body
pub fn candidate_from_page(body: &str) -> Option<ResolutionCandidate> {
    let found = patterns::extract_media_url(body)?;
    tracing::debug!(rule = found.rule, raw = found.value, "Media URL pattern matched");

    let url = patterns::normalize_escapes(found.value);

    let candidate = ResolutionCandidate::from_source_url(&url)?
        .with_title(patterns::extract_title(body));

    Some(candidate)
}

#[async_trait]
impl SourceStrategy for MobilePageStrategy {
    fn name(&self) -> &'static str {
        "mobile-page"
    }

    async fn attempt(&self, id: &VideoId) -> StrategyResult {
        match self.scrape(id).await {
            Ok(Some(candidate)) => StrategyResult::Resolved(candidate),
            Ok(None) => StrategyResult::NotApplicable,
            Err(e) => StrategyResult::TransientError(e),
        }
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::mobile_page::HTML_ACCEPT;
use super::patterns::{self, EMBEDDED_JSON_RULES};
use super::tree;
use super::{fetch_page, ResolutionCandidate, SourceStrategy, StrategyResult, VideoId};
use crate::config::{render_endpoint, Config};
use crate::Result;

/// Reads the JSON blob the desktop page embeds for hydration and searches it structurally
pub struct DesktopPageStrategy {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl DesktopPageStrategy {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            endpoint: config.endpoints.desktop_page.clone(),
            timeout: config.http.page_timeout(),
        }
    }

    async fn scrape(&self, id: &VideoId) -> Result<Option<ResolutionCandidate>> {
        let url = render_endpoint(&self.endpoint, id.as_str());

        let Some(body) = fetch_page(&self.client, &url, HTML_ACCEPT, self.timeout).await? else {
            return Ok(None);
        };

        Ok(candidate_from_embedded_json(&body))
    }
}

/// Try each embedded-JSON marker in order; the first blob yielding a URL wins
pub fn candidate_from_embedded_json(body: &str) -> Option<ResolutionCandidate> {
    for rule in EMBEDDED_JSON_RULES.iter() {
        let Some(found) = patterns::first_match(body, std::slice::from_ref(rule)) else {
            continue;
        };

        let Some(data) = parse_blob(found.value) else {
            tracing::debug!(marker = found.rule, "Embedded data is not valid JSON");
            continue;
        };

        if let Some(url) = tree::find_media_url(&data) {
            tracing::debug!(marker = found.rule, url, "Media URL found in embedded data");
            return ResolutionCandidate::from_source_url(url);
        }
    }

    None
}

/// Parse a captured blob, undoing the encodings the site wraps it in
fn parse_blob(raw: &str) -> Option<Value> {
    let decoded = html_escape::decode_html_entities(raw);

    if let Ok(value) = serde_json::from_str(&decoded) {
        return Some(value);
    }

    // RENDER_DATA is served percent-encoded
    if let Ok(unescaped) = urlencoding::decode(&decoded) {
        if let Ok(value) = serde_json::from_str(&unescaped) {
            return Some(value);
        }
    }

    // The SSR blob is a JS literal and may contain `undefined`
    serde_json::from_str(&decoded.replace(":undefined", ":null")).ok()
}

#[async_trait]
impl SourceStrategy for DesktopPageStrategy {
    fn name(&self) -> &'static str {
        "desktop-page"
    }

    async fn attempt(&self, id: &VideoId) -> StrategyResult {
        match self.scrape(id).await {
            Ok(Some(candidate)) => StrategyResult::Resolved(candidate),
            Ok(None) => StrategyResult::NotApplicable,
            Err(e) => StrategyResult::TransientError(e),
        }
    }
}
